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

use crate::network::NetworkConfig;
use clap::{Parser, Subcommand};
use polkadot_testnet::{
	config::DEFAULT_RPC_CLIENT_ADDRESS, Node, NodeIdentity, PolkadotChain, TestModeOptions,
};
use std::{path::PathBuf, sync::Arc};
use testnet_docker::{DockerRuntime, Environment};
use tokio_util::sync::CancellationToken;

/// Spawn Polkadot test networks in Docker.
#[derive(Debug, Parser)]
#[command(name = "polkadot-testnet", version, rename_all = "kebab-case")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab-case")]
pub enum Command {
	/// Provision and start the network described by a config file.
	Spawn(SpawnCmd),
	/// Print the addresses derived for the first relay chain validators.
	Identities(IdentitiesCmd),
}

#[derive(Debug, Parser)]
#[command(rename_all = "kebab-case")]
pub struct SpawnCmd {
	/// Network description (TOML).
	#[arg(long, short)]
	pub config: PathBuf,
	#[command(flatten)]
	pub test_mode: TestModeArgs,
}

/// Switches forwarded to the network as [`TestModeOptions`].
#[derive(Debug, Clone, clap::Args)]
#[command(rename_all = "kebab-case")]
pub struct TestModeArgs {
	#[arg(long, env = TestModeOptions::BEEFY_TEST_MODE)]
	pub beefy_test_mode: bool,
	#[arg(
		long,
		env = TestModeOptions::RPC_CLIENT_ADDRESS,
		default_value = DEFAULT_RPC_CLIENT_ADDRESS
	)]
	pub rpc_client_address: String,
	#[arg(long, env = TestModeOptions::UPDATE_STATE_MODE)]
	pub update_state_mode: bool,
}

impl From<TestModeArgs> for TestModeOptions {
	fn from(args: TestModeArgs) -> Self {
		TestModeOptions {
			beefy_test_mode: args.beefy_test_mode,
			rpc_client_address: args.rpc_client_address,
			update_state_mode: args.update_state_mode,
		}
	}
}

#[derive(Debug, Parser)]
#[command(rename_all = "kebab-case")]
pub struct IdentitiesCmd {
	/// Number of relay chain validators.
	#[arg(long, short = 'n', default_value_t = 2)]
	pub count: usize,
}

impl SpawnCmd {
	pub async fn run(self) -> anyhow::Result<()> {
		let network = NetworkConfig::load(&self.config)?;
		let runtime = Arc::new(DockerRuntime::connect()?);

		let cancel = CancellationToken::new();
		tokio::spawn({
			let cancel = cancel.clone();
			async move {
				if tokio::signal::ctrl_c().await.is_ok() {
					log::warn!(target: "testnet", "Interrupted, cancelling");
					cancel.cancel();
				}
			}
		});
		let env = Environment::new(runtime, network.network_id.clone(), network.test_name.clone())
			.with_cancellation(cancel);

		let mut chain =
			PolkadotChain::new(network.chain, network.relay_chain_nodes, network.parachains)
				.with_test_mode(self.test_mode.into());
		chain.initialize(&env).await?;
		chain.start().await?;

		println!("rpc: {}", chain.rpc_address()?);
		println!("ws: {}", chain.grpc_address()?);
		println!("client: {}", chain.rpc_client_address());
		for node in chain.relay_chain_nodes() {
			println!("{} {}", node.identity().name(), node.multi_address());
		}
		Ok(())
	}
}

impl IdentitiesCmd {
	pub fn run(self) -> anyhow::Result<()> {
		for index in 0..self.count {
			let identity = NodeIdentity::derive(index)?;
			println!("{}:", identity.name());
			println!("  account: {}", identity.account_address());
			println!("  stash:   {}", identity.stash_address());
			println!("  grandpa: {}", identity.grandpa_address());
			println!("  beefy:   {}", identity.beefy_address());
		}
		Ok(())
	}
}
