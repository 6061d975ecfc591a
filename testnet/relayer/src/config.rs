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

//! Per-chain configuration file consumed by `rly chains add`.

use serde::{Deserialize, Serialize};
use testnet_primitives::ChainConfig;

/// Keyring the relayer stores its keys in.
pub const KEYRING_BACKEND: &str = "test";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayerChainConfigValue {
	pub key: String,
	pub chain_id: String,
	pub rpc_addr: String,
	pub grpc_addr: String,
	pub account_prefix: String,
	pub keyring_backend: String,
	pub gas_adjustment: f64,
	pub gas_prices: String,
	pub debug: bool,
	pub timeout: String,
	pub output_format: String,
	pub sign_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayerChainConfig {
	#[serde(rename = "type")]
	pub chain_type: String,
	pub value: RelayerChainConfigValue,
}

impl RelayerChainConfig {
	/// Relayer view of `config`, signing with `key_name`.
	pub fn new(config: &ChainConfig, key_name: &str, rpc_addr: &str, grpc_addr: &str) -> Self {
		Self {
			chain_type: config.chain_type.clone(),
			value: RelayerChainConfigValue {
				key: key_name.into(),
				chain_id: config.chain_id.clone(),
				rpc_addr: rpc_addr.into(),
				grpc_addr: grpc_addr.into(),
				account_prefix: config.bech32_prefix.clone(),
				keyring_backend: KEYRING_BACKEND.into(),
				gas_adjustment: config.gas_adjustment,
				gas_prices: config.gas_prices.clone(),
				debug: true,
				timeout: "10s".into(),
				output_format: "json".into(),
				sign_mode: "direct".into(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use testnet_primitives::DockerImage;

	#[test]
	fn serializes_with_fixed_defaults() {
		let config = ChainConfig {
			chain_type: "cosmos".into(),
			name: "gaia".into(),
			chain_id: "gaia-1".into(),
			images: vec![DockerImage::new("ghcr.io/strangelove-ventures/heighliner/gaia", "v7.0.1")],
			bin: "gaiad".into(),
			bech32_prefix: "cosmos".into(),
			denom: "uatom".into(),
			gas_prices: "0.01uatom".into(),
			gas_adjustment: 1.3,
			trusting_period: "504h".into(),
			no_host_mount: false,
		};

		let file = RelayerChainConfig::new(&config, "relayer", "http://gaia:26657", "gaia:9090");

		assert_eq!(
			serde_json::to_value(&file).unwrap(),
			json!({
				"type": "cosmos",
				"value": {
					"key": "relayer",
					"chain-id": "gaia-1",
					"rpc-addr": "http://gaia:26657",
					"grpc-addr": "gaia:9090",
					"account-prefix": "cosmos",
					"keyring-backend": "test",
					"gas-adjustment": 1.3,
					"gas-prices": "0.01uatom",
					"debug": true,
					"timeout": "10s",
					"output-format": "json",
					"sign-mode": "direct",
				}
			})
		);
	}
}
