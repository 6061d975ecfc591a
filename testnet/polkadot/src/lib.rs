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

//! Polkadot relay chain and parachain test networks.
//!
//! A [`PolkadotChain`] is provisioned in two steps. [`PolkadotChain::initialize`] derives the
//! validator keys from the development account names and prepares one volume per node.
//! [`PolkadotChain::start`] generates the chain spec on the first relay chain node, composes the
//! genesis (validators, endowments, sudo, parachains), compiles it to a raw spec, copies that raw
//! spec to every node and finally starts all node containers.

mod chain;
pub mod config;
pub mod dyn_value;
mod error;
pub mod genesis;
pub mod keys;
pub mod node;
mod parachain_node;
mod relay_chain_node;

pub use chain::{NetworkState, PolkadotChain};
pub use config::{ParachainConfig, TestModeOptions};
pub use error::{DerivationError, Error, Result};
pub use keys::NodeIdentity;
pub use node::Node;
pub use parachain_node::ParachainNode;
pub use relay_chain_node::RelayChainNode;

/// Log target for this crate.
pub const LOG_TARGET: &str = "testnet::polkadot";

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use std::sync::Arc;
	use testnet_docker::{testing::MockRuntime, Environment};
	use testnet_primitives::{ChainConfig, DockerImage};

	pub fn environment(test_name: &str) -> (Arc<MockRuntime>, Environment) {
		let runtime = Arc::new(MockRuntime::new());
		let env = Environment::new(runtime.clone(), "testnet", test_name);
		(runtime, env)
	}

	pub fn chain_config() -> ChainConfig {
		ChainConfig {
			chain_type: "polkadot".into(),
			name: "composable".into(),
			chain_id: "rococo-local".into(),
			images: vec![DockerImage::new("parity/polkadot", "v0.9.19")],
			bin: "polkadot".into(),
			bech32_prefix: "composable".into(),
			denom: "uDOT".into(),
			gas_prices: String::new(),
			gas_adjustment: 0.0,
			trusting_period: String::new(),
			no_host_mount: false,
		}
	}

	pub fn parachain_config(num_nodes: usize) -> ParachainConfig {
		ParachainConfig {
			chain_id: "dev-2000".into(),
			chain_name: "composable".into(),
			bin: "parachain-node".into(),
			image: DockerImage::new("composablefi/composable", "v2.1.9"),
			num_nodes,
			flags: Vec::new(),
			relay_chain_flags: Vec::new(),
			finality_gadget: None,
		}
	}
}
