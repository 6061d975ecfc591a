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

//! Network lifecycle: provisioning, genesis and concurrent node start.

use crate::{
	config::{ParachainConfig, TestModeOptions},
	genesis,
	keys::NodeIdentity,
	node::{Node, RPC_PORT, WS_PORT},
	parachain_node::ParachainNode,
	relay_chain_node::RelayChainNode,
	Error, Result, LOG_TARGET,
};
use futures::{stream::FuturesUnordered, Future, StreamExt};
use serde_json::Value;
use testnet_docker::{Environment, JobOutput};
use testnet_primitives::ChainConfig;

/// Provisioning progress of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NetworkState {
	Unprovisioned,
	IdentitiesDerived,
	VolumesReady,
	SpecGenerated,
	GenesisComposed,
	RawSpecReady,
	ContainersStarting,
	Running,
}

/// A relay chain with its parachains.
pub struct PolkadotChain {
	config: ChainConfig,
	num_relay_chain_nodes: usize,
	parachain_configs: Vec<ParachainConfig>,
	test_mode: TestModeOptions,
	relay_chain_nodes: Vec<RelayChainNode>,
	parachain_nodes: Vec<Vec<ParachainNode>>,
	state: NetworkState,
}

impl PolkadotChain {
	pub fn new(
		config: ChainConfig,
		num_relay_chain_nodes: usize,
		parachain_configs: Vec<ParachainConfig>,
	) -> Self {
		Self {
			config,
			num_relay_chain_nodes,
			parachain_configs,
			test_mode: TestModeOptions::default(),
			relay_chain_nodes: Vec::new(),
			parachain_nodes: Vec::new(),
			state: NetworkState::Unprovisioned,
		}
	}

	pub fn with_test_mode(mut self, test_mode: TestModeOptions) -> Self {
		self.test_mode = test_mode;
		self
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	pub fn test_mode(&self) -> &TestModeOptions {
		&self.test_mode
	}

	/// Endpoint test clients connect to, as chosen by the test mode.
	pub fn rpc_client_address(&self) -> &str {
		&self.test_mode.rpc_client_address
	}

	pub fn state(&self) -> NetworkState {
		self.state
	}

	pub fn relay_chain_nodes(&self) -> &[RelayChainNode] {
		&self.relay_chain_nodes
	}

	pub fn parachain_nodes(&self) -> &[Vec<ParachainNode>] {
		&self.parachain_nodes
	}

	/// Derive node identities and prepare a volume for every node.
	///
	/// Image pulls are best effort. Nothing is started.
	pub async fn initialize(&mut self, env: &Environment) -> Result<()> {
		let mut relay_chain_nodes = Vec::with_capacity(self.num_relay_chain_nodes);
		for index in 0..self.num_relay_chain_nodes {
			let identity = NodeIdentity::derive(index)?;
			relay_chain_nodes.push(RelayChainNode::new(env.clone(), &self.config, identity)?);
		}
		let mut parachain_nodes = Vec::with_capacity(self.parachain_configs.len());
		for parachain in &self.parachain_configs {
			let group = (0..parachain.num_nodes)
				.map(|index| {
					ParachainNode::new(env.clone(), parachain, index, &self.config.chain_id)
				})
				.collect::<Result<Vec<_>>>()?;
			parachain_nodes.push(group);
		}
		self.relay_chain_nodes = relay_chain_nodes;
		self.parachain_nodes = parachain_nodes;
		self.state = NetworkState::IdentitiesDerived;

		env.pull_images(
			self.config.images.iter().chain(self.parachain_configs.iter().map(|p| &p.image)),
		)
		.await;

		for node in &mut self.relay_chain_nodes {
			node.handle_mut().provision_volume().await?;
		}
		for node in self.parachain_nodes.iter_mut().flatten() {
			node.handle_mut().provision_volume().await?;
		}
		self.state = NetworkState::VolumesReady;
		Ok(())
	}

	/// Build the shared genesis, hand it to every node and start all node containers.
	///
	/// Relay chain nodes are started before parachain nodes. Within each group nodes start
	/// concurrently; the first failure is reported once every start attempt has finished.
	///
	/// Can only be called once container creation has not begun: node volumes are never rewritten
	/// under created containers.
	pub async fn start(&mut self) -> Result<()> {
		if self.state < NetworkState::VolumesReady {
			return Err(Error::NotInitialized)
		}
		if self.state >= NetworkState::ContainersStarting {
			return Err(Error::AlreadyStarted)
		}
		log::debug!(target: LOG_TARGET, "Starting {} with {:?}", self.config.chain_id, self.test_mode);
		let (first, others) = self.relay_chain_nodes.split_first().ok_or(Error::NotInitialized)?;

		first.generate_chain_spec().await?;
		self.state = NetworkState::SpecGenerated;

		let spec_bytes = first.read_file(&first.chain_spec_path()).await?;
		let mut spec: Value = serde_json::from_slice(&spec_bytes)?;
		genesis::compose(&mut spec, &self.relay_chain_nodes, &self.parachain_nodes).await?;
		first.write_file(&first.chain_spec_path(), &serde_json::to_vec_pretty(&spec)?).await?;
		self.state = NetworkState::GenesisComposed;

		first.generate_raw_chain_spec().await?;
		let raw_spec = first.read_file(&first.raw_chain_spec_path()).await?;
		self.state = NetworkState::RawSpecReady;

		let raw_spec = &raw_spec[..];
		let targets = others
			.iter()
			.map(|node| (node.handle(), node.raw_chain_spec_path()))
			.chain(
				self.parachain_nodes
					.iter()
					.flatten()
					.map(|node| (node.handle(), node.raw_chain_spec_path())),
			);
		join_fail_fast(targets.map(|(handle, path)| async move {
			log::info!(target: LOG_TARGET, "Copying raw chain spec to {}", handle.name());
			handle.write_file(&path, raw_spec).await
		}))
		.await?;
		self.state = NetworkState::ContainersStarting;

		join_fail_fast(self.relay_chain_nodes.iter_mut().map(create_and_start)).await?;
		join_fail_fast(self.parachain_nodes.iter_mut().flatten().map(create_and_start)).await?;

		self.state = NetworkState::Running;
		log::info!(
			target: LOG_TARGET,
			"Network {} running with {} relay chain nodes and {} parachains",
			self.config.chain_id,
			self.relay_chain_nodes.len(),
			self.parachain_nodes.len(),
		);
		Ok(())
	}

	/// Run `cmd` once in the first relay chain node's image and volume.
	pub async fn exec(&self, cmd: Vec<String>, env: Vec<String>) -> Result<JobOutput> {
		let node = self.relay_chain_nodes.first().ok_or(Error::NotInitialized)?;
		Ok(node.exec(cmd, env).await.into_result()?)
	}

	/// Host of the node clients talk to: the first collator if there is one.
	fn client_host(&self) -> Result<String> {
		match self.parachain_nodes.first().and_then(|group| group.first()) {
			Some(node) => Ok(node.host_name()),
			None => self.relay_host(),
		}
	}

	fn relay_host(&self) -> Result<String> {
		self.relay_chain_nodes.first().map(Node::host_name).ok_or(Error::NotInitialized)
	}

	/// RPC endpoints reachable from the test network: client node first, then relay chain.
	pub fn rpc_address(&self) -> Result<String> {
		Ok(format!(
			"http://{}:{RPC_PORT},http://{}:{RPC_PORT}",
			self.client_host()?,
			self.relay_host()?
		))
	}

	/// Websocket endpoint of the client node, reachable from the test network.
	pub fn grpc_address(&self) -> Result<String> {
		Ok(format!("{}:{WS_PORT}", self.client_host()?))
	}
}

async fn create_and_start<N: Node>(node: &mut N) -> Result<()> {
	node.create_container().await?;
	node.start_container().await
}

/// Drive every task to completion and report the first failure, in completion order.
async fn join_fail_fast<F>(tasks: impl IntoIterator<Item = F>) -> Result<()>
where
	F: Future<Output = Result<()>>,
{
	let mut tasks: FuturesUnordered<F> = tasks.into_iter().collect();
	let mut first_error = None;
	while let Some(result) = tasks.next().await {
		if let Err(e) = result {
			log::error!(target: LOG_TARGET, "Node task failed: {}", e);
			first_error.get_or_insert(e);
		}
	}
	first_error.map_or(Ok(()), Err)
}
