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

//! Records shared between the network orchestrator, the relayer driver and their callers.
//!
//! Nothing in here talks to a container runtime; these are plain values supplied by the test
//! harness (or parsed from relayer output) and read by the other crates.

use serde::{Deserialize, Serialize};

/// Default `uid:gid` that node images run their process as.
pub const DEFAULT_UID_GID: &str = "1025:1025";

/// A container image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DockerImage {
	/// Image repository, e.g. `parity/polkadot`.
	pub repository: String,
	/// Image tag.
	pub version: String,
	/// `uid:gid` the image runs as. Volumes are chowned to it before first use.
	#[serde(default)]
	pub uid_gid: Option<String>,
}

impl DockerImage {
	pub fn new(repository: impl Into<String>, version: impl Into<String>) -> Self {
		Self { repository: repository.into(), version: version.into(), uid_gid: None }
	}

	pub fn with_uid_gid(mut self, uid_gid: impl Into<String>) -> Self {
		self.uid_gid = Some(uid_gid.into());
		self
	}

	/// `repository:version`, as understood by the container runtime.
	pub fn reference(&self) -> String {
		format!("{}:{}", self.repository, self.version)
	}

	/// The `uid:gid` to give volume ownership to.
	pub fn uid_gid(&self) -> &str {
		self.uid_gid.as_deref().unwrap_or(DEFAULT_UID_GID)
	}
}

/// Static, per-network parameters. Read-only to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
	/// Chain family, e.g. `polkadot` or `cosmos`. Forwarded to the relayer as its config `type`.
	#[serde(rename = "type")]
	pub chain_type: String,
	/// Human readable chain name.
	pub name: String,
	/// Chain identifier, e.g. `rococo-local`.
	pub chain_id: String,
	/// Images used for the chain nodes. The first one runs the relay chain.
	pub images: Vec<DockerImage>,
	/// Node binary inside the image.
	pub bin: String,
	/// Account address prefix.
	#[serde(default)]
	pub bech32_prefix: String,
	/// Fee denomination.
	#[serde(default)]
	pub denom: String,
	/// Gas prices, e.g. `0.0uatom`.
	#[serde(default)]
	pub gas_prices: String,
	/// Gas adjustment multiplier.
	#[serde(default = "default_gas_adjustment")]
	pub gas_adjustment: f64,
	/// Light client trusting period.
	#[serde(default)]
	pub trusting_period: String,
	/// Accepted for compatibility with other chain configs. Node homes always live in volumes, so
	/// no host directory is ever mounted.
	#[serde(default)]
	pub no_host_mount: bool,
}

fn default_gas_adjustment() -> f64 {
	1.3
}

impl ChainConfig {
	/// The image the relay chain nodes run, if any was configured.
	pub fn relay_chain_image(&self) -> Option<&DockerImage> {
		self.images.first()
	}
}

/// Counterparty side of a channel as reported by the relayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounterparty {
	pub port_id: String,
	pub channel_id: String,
}

/// One channel record from `q channels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOutput {
	pub state: String,
	pub ordering: String,
	pub counterparty: ChannelCounterparty,
	pub connection_hops: Vec<String>,
	pub version: String,
	pub port_id: String,
	pub channel_id: String,
}

/// Wallet created by the relayer for one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayerWallet {
	pub mnemonic: String,
	pub address: String,
}
