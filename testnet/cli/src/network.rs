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

//! Description of a network to spawn, loaded from TOML.

use polkadot_testnet::ParachainConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use testnet_primitives::ChainConfig;

fn default_relay_chain_nodes() -> usize {
	2
}

/// A relay chain, its parachains and where to run them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
	/// Labels every resource of the run; also part of every container name.
	pub test_name: String,
	/// Docker network the nodes are attached to. Must exist.
	pub network_id: String,
	#[serde(default = "default_relay_chain_nodes")]
	pub relay_chain_nodes: usize,
	pub chain: ChainConfig,
	#[serde(default)]
	pub parachains: Vec<ParachainConfig>,
}

impl NetworkConfig {
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = std::fs::read_to_string(path)
			.map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
		toml::from_str(&content)
			.map_err(|e| anyhow::anyhow!("Invalid network config {}: {e}", path.display()))
	}
}
