// Copyright (C) Parity Technologies (UK) Ltd.
// This file is part of Polkadot.

// Polkadot is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Polkadot is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Polkadot.  If not, see <http://www.gnu.org/licenses/>.

use crate::{
	keys::{NodeIdentity, NodeKey},
	node::{Node, NodeHandle, NODE_HOME, P2P_PORT, PROMETHEUS_PORT, WS_PORT},
	Error, Result, LOG_TARGET,
};
use testnet_docker::{naming, Environment};
use testnet_primitives::ChainConfig;

/// A relay chain validator.
pub struct RelayChainNode {
	handle: NodeHandle,
	identity: NodeIdentity,
	chain_id: String,
	bin: String,
}

impl RelayChainNode {
	pub fn new(env: Environment, config: &ChainConfig, identity: NodeIdentity) -> Result<Self> {
		let image = config
			.relay_chain_image()
			.cloned()
			.ok_or_else(|| Error::ImageMissing(config.name.clone()))?;
		let name = naming::sanitize_container_name(&format!(
			"relaychain-{}-{}-{}",
			identity.index(),
			config.chain_id,
			env.test_name(),
		));
		Ok(Self {
			handle: NodeHandle::new(env, name, image),
			identity,
			chain_id: config.chain_id.clone(),
			bin: config.bin.clone(),
		})
	}

	pub fn identity(&self) -> &NodeIdentity {
		&self.identity
	}

	/// Human readable chain spec, relative to the node home.
	pub fn chain_spec_path(&self) -> String {
		format!("{}.json", self.chain_id)
	}

	/// Generate the default chain spec of the chain and store it in the node volume.
	pub async fn generate_chain_spec(&self) -> Result<()> {
		let output = self
			.handle
			.exec_full_output(vec![
				self.bin.clone(),
				"build-spec".into(),
				format!("--chain={}", self.chain_id),
				"--disable-default-bootnode".into(),
			])
			.await?;
		self.handle.write_file(&self.chain_spec_path(), output.stdout.as_bytes()).await
	}

	/// Compile the chain spec in the node volume into its raw form, next to it.
	pub async fn generate_raw_chain_spec(&self) -> Result<()> {
		log::info!(target: LOG_TARGET, "Generating raw chain spec in {}", self.name());
		let output = self
			.handle
			.exec_full_output(vec![
				self.bin.clone(),
				"build-spec".into(),
				format!("--chain={NODE_HOME}/{}", self.chain_spec_path()),
				"--raw".into(),
			])
			.await?;
		self.handle.write_file(&self.raw_chain_spec_path(), output.stdout.as_bytes()).await
	}

	pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
		self.handle.read_file(path).await
	}

	pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
		self.handle.write_file(path, content).await
	}
}

impl Node for RelayChainNode {
	fn handle(&self) -> &NodeHandle {
		&self.handle
	}

	fn handle_mut(&mut self) -> &mut NodeHandle {
		&mut self.handle
	}

	fn node_key(&self) -> &NodeKey {
		self.identity.node_key()
	}

	fn raw_chain_spec_path(&self) -> String {
		format!("{}-raw.json", self.chain_id)
	}

	fn start_command(&self) -> Vec<String> {
		vec![
			self.bin.clone(),
			format!("--chain={NODE_HOME}/{}", self.raw_chain_spec_path()),
			format!("--ws-port={WS_PORT}"),
			self.identity.dev_flag(),
			format!("--node-key={}", self.node_key().secret_hex()),
			"--beefy".into(),
			"--rpc-cors=all".into(),
			"--unsafe-ws-external".into(),
			"--unsafe-rpc-external".into(),
			"--prometheus-external".into(),
			format!("--prometheus-port={PROMETHEUS_PORT}"),
			format!("--listen-addr=/ip4/0.0.0.0/tcp/{P2P_PORT}"),
			format!("--public-addr={}", self.multi_address()),
			"--base-path".into(),
			NODE_HOME.into(),
		]
	}
}
