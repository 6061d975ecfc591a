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

//! Genesis composition: writes the validator set, endowments and parachains into a chain spec.

use crate::{
	dyn_value::{self, PathSegment},
	node::Node,
	parachain_node::ParachainNode,
	relay_chain_node::RelayChainNode,
	Error, Result, LOG_TARGET,
};
use serde_json::{json, Value};

/// Endowment of every validator stash and account.
pub const GENESIS_BALANCE: u64 = 1_000_000_000_000_000_000;

/// `validation_upgrade_delay` of the parachains host configuration, in blocks.
pub const VALIDATION_UPGRADE_DELAY: u64 = 2;

/// Path below the runtime genesis config of a (non raw) chain spec.
pub fn runtime_genesis_path(path: &[&str]) -> Vec<PathSegment> {
	["genesis", "runtime", "runtime_genesis_config"]
		.iter()
		.chain(path)
		.map(|segment| PathSegment::from(*segment))
		.collect()
}

/// Genesis relevant addresses of one relay chain validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorGenesis {
	pub boot_node: String,
	pub stash: String,
	pub account: String,
	pub grandpa: String,
	pub beefy: String,
}

impl ValidatorGenesis {
	pub fn of(node: &RelayChainNode) -> Self {
		let identity = node.identity();
		Self {
			boot_node: node.multi_address(),
			stash: identity.stash_address(),
			account: identity.account_address(),
			grandpa: identity.grandpa_address(),
			beefy: identity.beefy_address(),
		}
	}

	/// `[stash, stash, session keys]` entry of `session.keys`.
	fn session_keys(&self) -> Value {
		json!([
			self.stash,
			self.stash,
			{
				"grandpa": self.grandpa,
				"babe": self.account,
				"im_online": self.account,
				"parachain_validator": self.account,
				"authority_discovery": self.account,
				"para_validator": self.account,
				"para_assignment": self.account,
				"beefy": self.beefy,
			}
		])
	}
}

/// Genesis registration of one parachain.
#[derive(Debug, Clone, PartialEq)]
pub struct ParachainGenesis {
	/// Passed through as found in the parachain spec.
	pub para_id: Value,
	pub genesis_head: String,
	pub validation_code: String,
}

impl ParachainGenesis {
	/// Query the parachain served by `node` for its registration.
	pub async fn of(node: &ParachainNode) -> Result<Self> {
		let para_id = node.parachain_id().await.map_err(|e| Error::Export {
			node: node.name().into(),
			what: "parachain id",
			source: Box::new(e),
		})?;
		Ok(Self {
			para_id,
			genesis_head: node.export_genesis_state().await?,
			validation_code: node.export_genesis_wasm().await?,
		})
	}

	fn entry(&self) -> Value {
		json!([
			self.para_id,
			{
				"genesis_head": self.genesis_head,
				"validation_code": self.validation_code,
				"parachain": true,
			}
		])
	}
}

/// Compose the genesis of `relay_nodes` and the parachains collated by `parachains` into `spec`.
///
/// The first node of every parachain group is queried for the parachain registration.
pub async fn compose(
	spec: &mut Value,
	relay_nodes: &[RelayChainNode],
	parachains: &[Vec<ParachainNode>],
) -> Result<()> {
	let validators: Vec<_> = relay_nodes.iter().map(ValidatorGenesis::of).collect();

	let mut registrations = Vec::with_capacity(parachains.len());
	for first in parachains.iter().filter_map(|group| group.first()) {
		registrations.push(ParachainGenesis::of(first).await?);
	}

	write_genesis(spec, &validators, &registrations)
}

/// Write the network genesis into `spec`.
///
/// The first validator's account becomes the sudo key. Any failed write aborts, naming the field.
pub fn write_genesis(
	spec: &mut Value,
	validators: &[ValidatorGenesis],
	parachains: &[ParachainGenesis],
) -> Result<()> {
	let set = |spec: &mut Value, field: &'static str, value: Value, path: &[PathSegment]| {
		dyn_value::set(spec, value, path).map_err(|source| Error::Genesis { field, source })
	};

	let boot_nodes: Vec<_> = validators.iter().map(|v| json!(v.boot_node)).collect();
	let authorities: Vec<_> = validators.iter().map(ValidatorGenesis::session_keys).collect();
	let balances: Vec<_> = validators
		.iter()
		.flat_map(|v| [json!([v.stash, GENESIS_BALANCE]), json!([v.account, GENESIS_BALANCE])])
		.collect();

	set(spec, "boot nodes", Value::Array(boot_nodes), &[PathSegment::from("bootNodes")])?;
	set(spec, "authorities", Value::Array(authorities), &runtime_genesis_path(&["session", "keys"]))?;
	set(spec, "balances", Value::Array(balances), &runtime_genesis_path(&["balances", "balances"]))?;
	if let Some(sudo) = validators.first() {
		set(spec, "sudo key", json!(sudo.account), &runtime_genesis_path(&["sudo", "key"]))?;
	}
	set(
		spec,
		"validation upgrade delay",
		json!(VALIDATION_UPGRADE_DELAY),
		&runtime_genesis_path(&["configuration", "config", "validation_upgrade_delay"]),
	)?;
	set(
		spec,
		"parachains",
		Value::Array(parachains.iter().map(ParachainGenesis::entry).collect()),
		&runtime_genesis_path(&["paras", "paras"]),
	)?;

	log::debug!(
		target: LOG_TARGET,
		"Composed genesis with {} validators and {} parachains",
		validators.len(),
		parachains.len(),
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{dyn_value::PathError, path};
	use assert_matches::assert_matches;

	fn validator(n: usize) -> ValidatorGenesis {
		ValidatorGenesis {
			boot_node: format!("/dns4/relaychain-{n}/tcp/27452/p2p/P{n}"),
			stash: format!("S{n}"),
			account: format!("A{n}"),
			grandpa: format!("G{n}"),
			beefy: format!("B{n}"),
		}
	}

	fn base_spec() -> Value {
		json!({
			"name": "Rococo Local Testnet",
			"bootNodes": [],
			"genesis": { "runtime": { "runtime_genesis_config": {
				"balances": { "balances": [["5Old", 1]] },
				"sudo": { "key": "5Old" },
			} } },
		})
	}

	fn runtime<'a>(spec: &'a Value, path: &[&str]) -> &'a Value {
		dyn_value::get(spec, &runtime_genesis_path(path)).unwrap()
	}

	#[test]
	fn two_validators_fund_stash_then_account() {
		let mut spec = base_spec();

		write_genesis(&mut spec, &[validator(1), validator(2)], &[]).unwrap();

		assert_eq!(
			runtime(&spec, &["balances", "balances"]),
			&json!([
				["S1", 1_000_000_000_000_000_000u64],
				["A1", 1_000_000_000_000_000_000u64],
				["S2", 1_000_000_000_000_000_000u64],
				["A2", 1_000_000_000_000_000_000u64],
			])
		);
		assert_eq!(runtime(&spec, &["sudo", "key"]), &json!("A1"));
		assert_eq!(
			spec["bootNodes"],
			json!(["/dns4/relaychain-1/tcp/27452/p2p/P1", "/dns4/relaychain-2/tcp/27452/p2p/P2"])
		);
		assert_eq!(runtime(&spec, &["configuration", "config", "validation_upgrade_delay"]), &json!(2));
		assert_eq!(spec["name"], json!("Rococo Local Testnet"));
	}

	#[test]
	fn authorities_cover_every_stash_once() {
		let validators: Vec<_> = (1..=3).map(validator).collect();
		let mut spec = base_spec();

		write_genesis(&mut spec, &validators, &[]).unwrap();

		let authorities = runtime(&spec, &["session", "keys"]).as_array().unwrap().clone();
		assert_eq!(authorities.len(), validators.len());
		for v in &validators {
			let owned: Vec<_> = authorities.iter().filter(|a| a[0] == json!(v.stash)).collect();
			assert_eq!(owned.len(), 1);
			assert_eq!(owned[0][1], json!(v.stash));
		}

		let keys = &authorities[0][2];
		assert_eq!(keys["grandpa"], json!("G1"));
		assert_eq!(keys["beefy"], json!("B1"));
		for role in
			["babe", "im_online", "parachain_validator", "authority_discovery", "para_validator", "para_assignment"]
		{
			assert_eq!(keys[role], json!("A1"), "{role}");
		}
	}

	#[test]
	fn parachains_are_registered() {
		let mut spec = base_spec();
		let para = ParachainGenesis {
			para_id: json!(2000),
			genesis_head: "0x00aa".into(),
			validation_code: "0x0061736d".into(),
		};

		write_genesis(&mut spec, &[validator(1)], &[para]).unwrap();

		assert_eq!(
			runtime(&spec, &["paras", "paras"]),
			&json!([[2000, { "genesis_head": "0x00aa", "validation_code": "0x0061736d", "parachain": true }]])
		);
	}

	#[test]
	fn write_failure_names_field() {
		let mut spec = json!({ "genesis": { "runtime": { "runtime_genesis_config": { "sudo": "none" } } } });

		let err = write_genesis(&mut spec, &[validator(1)], &[]).unwrap_err();

		assert_matches!(err, Error::Genesis { field: "sudo key", source: PathError::TypeMismatch { .. } });
		assert!(err.to_string().starts_with("Error setting sudo key"));
	}

	#[test]
	fn runtime_path_prefix() {
		assert_eq!(
			runtime_genesis_path(&["sudo", "key"]),
			path!["genesis", "runtime", "runtime_genesis_config", "sudo", "key"]
		);
	}
}
