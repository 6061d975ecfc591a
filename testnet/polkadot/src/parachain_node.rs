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
	config::ParachainConfig,
	keys::{self, NodeKey},
	node::{Node, NodeHandle, NODE_HOME, PROMETHEUS_PORT, RPC_PORT, WS_PORT},
	Error, Result,
};
use serde_json::Value;
use testnet_docker::{naming, Environment};

/// A collator of one parachain.
///
/// Runs an embedded relay chain node booting from the relay chain raw spec.
pub struct ParachainNode {
	handle: NodeHandle,
	index: usize,
	node_key: NodeKey,
	dev_name: &'static str,
	config: ParachainConfig,
	relay_chain_id: String,
}

impl ParachainNode {
	pub fn new(
		env: Environment,
		config: &ParachainConfig,
		index: usize,
		relay_chain_id: &str,
	) -> Result<Self> {
		let name = naming::sanitize_container_name(&format!(
			"{}-{}-{}-{}",
			config.bin,
			index,
			config.chain_id,
			env.test_name(),
		));
		Ok(Self {
			handle: NodeHandle::new(env, name, config.image.clone()),
			index,
			node_key: NodeKey::generate(),
			dev_name: keys::indexed_name(index)?,
			config: config.clone(),
			relay_chain_id: relay_chain_id.into(),
		})
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn config(&self) -> &ParachainConfig {
		&self.config
	}

	fn command(&self, subcommand: &str) -> Vec<String> {
		vec![
			self.config.bin.clone(),
			subcommand.into(),
			format!("--chain={}", self.config.chain_id),
		]
	}

	async fn run(&self, subcommand: &str) -> Result<String> {
		let output = self.handle.exec_full_output(self.command(subcommand)).await?;
		Ok(output.stdout.trim().to_string())
	}

	/// Parachain id assigned in the parachain chain spec, as found there.
	pub async fn parachain_id(&self) -> Result<Value> {
		let spec = self.run("build-spec").await?;
		let invalid = |reason: String| Error::InvalidOutput {
			command: format!("{} build-spec", self.config.bin),
			reason,
		};

		let spec: Value = serde_json::from_str(&spec).map_err(|e| invalid(e.to_string()))?;
		spec.get("para_id").cloned().ok_or_else(|| invalid("no `para_id` field".into()))
	}

	/// Hex encoded genesis head of the parachain.
	pub async fn export_genesis_state(&self) -> Result<String> {
		self.run("export-genesis-state").await.map_err(|e| Error::Export {
			node: self.name().into(),
			what: "genesis state",
			source: Box::new(e),
		})
	}

	/// Hex encoded validation code of the parachain.
	pub async fn export_genesis_wasm(&self) -> Result<String> {
		self.run("export-genesis-wasm").await.map_err(|e| Error::Export {
			node: self.name().into(),
			what: "genesis wasm",
			source: Box::new(e),
		})
	}

	pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
		self.handle.write_file(path, content).await
	}
}

impl Node for ParachainNode {
	fn handle(&self) -> &NodeHandle {
		&self.handle
	}

	fn handle_mut(&mut self) -> &mut NodeHandle {
		&mut self.handle
	}

	fn node_key(&self) -> &NodeKey {
		&self.node_key
	}

	fn raw_chain_spec_path(&self) -> String {
		format!("{}-raw.json", self.relay_chain_id)
	}

	fn start_command(&self) -> Vec<String> {
		let mut cmd = vec![
			self.config.bin.clone(),
			format!("--ws-port={WS_PORT}"),
			"--collator".into(),
			format!("--node-key={}", self.node_key.secret_hex()),
			format!("--{}", self.dev_name),
			"--unsafe-ws-external".into(),
			"--unsafe-rpc-external".into(),
			"--prometheus-external".into(),
			"--rpc-cors=all".into(),
			format!("--prometheus-port={PROMETHEUS_PORT}"),
			format!("--rpc-port={RPC_PORT}"),
			"--base-path".into(),
			NODE_HOME.into(),
			format!("--chain={}", self.config.chain_id),
		];
		cmd.extend(self.config.flags.iter().cloned());
		cmd.push("--".into());
		cmd.push(format!("--chain={NODE_HOME}/{}", self.raw_chain_spec_path()));
		cmd.extend(self.config.relay_chain_flags.iter().cloned());
		cmd
	}
}
