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

//! Caller supplied configuration of a network.

use serde::{Deserialize, Serialize};
use testnet_primitives::DockerImage;

/// One parachain attached to the relay chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParachainConfig {
	/// Chain spec name passed to `--chain`, e.g. `rococo-local`.
	pub chain_id: String,
	pub chain_name: String,
	/// Collator binary inside `image`.
	pub bin: String,
	pub image: DockerImage,
	pub num_nodes: usize,
	/// Extra collator flags.
	#[serde(default)]
	pub flags: Vec<String>,
	/// Flags of the embedded relay chain node, after `--`.
	#[serde(default)]
	pub relay_chain_flags: Vec<String>,
	#[serde(default)]
	pub finality_gadget: Option<String>,
}

/// RPC endpoint the test client connects to when none is configured.
pub const DEFAULT_RPC_CLIENT_ADDRESS: &str = "ws://127.0.0.1:9944";

/// Switches altering how a test drives the network.
///
/// These used to be read from the process environment wherever needed. They are collected once
/// by the caller and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestModeOptions {
	/// Run the BEEFY light client test flow.
	pub beefy_test_mode: bool,
	/// Address of the node RPC endpoint used by test clients.
	pub rpc_client_address: String,
	/// Refresh recorded state instead of comparing against it.
	pub update_state_mode: bool,
}

impl Default for TestModeOptions {
	fn default() -> Self {
		Self {
			beefy_test_mode: false,
			rpc_client_address: DEFAULT_RPC_CLIENT_ADDRESS.into(),
			update_state_mode: false,
		}
	}
}

impl TestModeOptions {
	pub const BEEFY_TEST_MODE: &'static str = "BEEFY_TEST_MODE";
	pub const RPC_CLIENT_ADDRESS: &'static str = "RPC_CLIENT_ADDRESS";
	pub const UPDATE_STATE_MODE: &'static str = "UPDATE_STATE_MODE";

	/// Read the switches from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build the switches from `lookup`, which maps a variable name to its value.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let flag = |key| lookup(key).map(|v| is_enabled(&v)).unwrap_or(false);
		Self {
			beefy_test_mode: flag(Self::BEEFY_TEST_MODE),
			update_state_mode: flag(Self::UPDATE_STATE_MODE),
			rpc_client_address: lookup(Self::RPC_CLIENT_ADDRESS)
				.filter(|v| !v.trim().is_empty())
				.unwrap_or_else(|| DEFAULT_RPC_CLIENT_ADDRESS.into()),
		}
	}
}

fn is_enabled(value: &str) -> bool {
	matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn defaults_without_variables() {
		assert_eq!(TestModeOptions::from_lookup(|_| None), TestModeOptions::default());
		assert_eq!(TestModeOptions::default().rpc_client_address, "ws://127.0.0.1:9944");
	}

	#[test]
	fn reads_recognized_variables() {
		let vars = HashMap::from([
			("BEEFY_TEST_MODE", "true"),
			("RPC_CLIENT_ADDRESS", "ws://relaychain-0:27451"),
			("UPDATE_STATE_MODE", "0"),
		]);

		let options = TestModeOptions::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

		assert!(options.beefy_test_mode);
		assert!(!options.update_state_mode);
		assert_eq!(options.rpc_client_address, "ws://relaychain-0:27451");
	}

	#[test]
	fn parachain_config_deserializes() {
		let config: ParachainConfig = serde_json::from_value(serde_json::json!({
			"chain-id": "local",
			"chain-name": "parachain",
			"bin": "parachain-node",
			"image": { "repository": "ghcr.io/composablefi/parachain-node", "version": "latest" },
			"num-nodes": 2,
			"flags": ["--execution=wasm"],
		}))
		.unwrap();

		assert_eq!(config.num_nodes, 2);
		assert_eq!(config.image.uid_gid(), "1025:1025");
		assert!(config.relay_chain_flags.is_empty());
		assert_eq!(config.finality_gadget, None);
	}
}
