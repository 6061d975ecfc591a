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

//! Per-node key material, derived from the well-known development account names.

use crate::{error::DerivationError, LOG_TARGET};
use libp2p_identity::{ed25519 as libp2p_ed25519, PeerId};
use sp_core::{crypto::Ss58Codec, ecdsa, ed25519, sr25519, Pair};

/// Names the relay chain validators are derived from, in node order.
pub const NAME_TABLE: [&str; 5] = ["alice", "bob", "charlie", "dave", "ferdie"];

/// Canonical form of a table name, as used in derivation paths: `alice` -> `Alice`.
pub fn name_case(name: &str) -> String {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new(),
	}
}

/// Table name of node `index`.
pub fn indexed_name(index: usize) -> Result<&'static str, DerivationError> {
	NAME_TABLE
		.get(index)
		.copied()
		.ok_or(DerivationError::NameTableExhausted { index, capacity: NAME_TABLE.len() })
}

/// Libp2p transport key of a node.
///
/// Fresh on every run; nothing in genesis depends on it except the boot node addresses.
#[derive(Clone)]
pub struct NodeKey(libp2p_ed25519::Keypair);

impl NodeKey {
	pub fn generate() -> Self {
		Self(libp2p_ed25519::Keypair::generate())
	}

	/// Hex encoded secret, in the form expected by `--node-key`.
	pub fn secret_hex(&self) -> String {
		hex::encode(self.0.secret().as_ref())
	}

	pub fn peer_id(&self) -> PeerId {
		libp2p_identity::PublicKey::from(self.0.public()).to_peer_id()
	}

	/// Address other nodes use to reach this node through `host`.
	pub fn multi_address(&self, host: &str, p2p_port: u16) -> String {
		format!("/dns4/{host}/tcp/{p2p_port}/p2p/{}", self.peer_id())
	}
}

/// Keys of a relay chain validator.
#[derive(Clone)]
pub struct NodeIdentity {
	index: usize,
	name: String,
	node_key: NodeKey,
	grandpa: ed25519::Pair,
	account: sr25519::Pair,
	stash: sr25519::Pair,
	beefy: ecdsa::Pair,
}

impl NodeIdentity {
	/// Derive the identity of relay chain node `index`.
	///
	/// Account keys only depend on `index`. Fails once the name table is exhausted.
	pub fn derive(index: usize) -> Result<Self, DerivationError> {
		let name = name_case(indexed_name(index)?);
		let uri = format!("//{name}");
		let stash_uri = format!("//{name}//stash");

		let identity = NodeIdentity {
			index,
			node_key: NodeKey::generate(),
			grandpa: from_uri::<ed25519::Pair>("ed25519", &uri)?,
			account: from_uri::<sr25519::Pair>("sr25519", &uri)?,
			stash: from_uri::<sr25519::Pair>("sr25519", &stash_uri)?,
			beefy: from_uri::<ecdsa::Pair>("ecdsa", &uri)?,
			name,
		};
		log::debug!(
			target: LOG_TARGET,
			"Derived identity {} for node {}: account {}",
			identity.name,
			index,
			identity.account_address(),
		);
		Ok(identity)
	}

	pub fn index(&self) -> usize {
		self.index
	}

	/// Name-cased table name, e.g. `Alice`.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Development flag selecting the node's keystore, e.g. `--alice`.
	pub fn dev_flag(&self) -> String {
		format!("--{}", self.name.to_lowercase())
	}

	pub fn node_key(&self) -> &NodeKey {
		&self.node_key
	}

	pub fn account_address(&self) -> String {
		self.account.public().to_ss58check()
	}

	pub fn stash_address(&self) -> String {
		self.stash.public().to_ss58check()
	}

	pub fn grandpa_address(&self) -> String {
		self.grandpa.public().to_ss58check()
	}

	pub fn beefy_address(&self) -> String {
		self.beefy.public().to_ss58check()
	}
}

fn from_uri<P: Pair>(scheme: &'static str, uri: &str) -> Result<P, DerivationError> {
	P::from_string(uri, None).map_err(|e| DerivationError::InvalidSeed {
		scheme,
		uri: uri.into(),
		reason: format!("{e:?}"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;

	#[test]
	fn names_are_name_cased() {
		assert_eq!(name_case("alice"), "Alice");
		assert_eq!(name_case("FERDIE"), "Ferdie");
		assert_eq!(name_case(""), "");
	}

	#[test]
	fn derivation_is_deterministic() {
		for index in 0..NAME_TABLE.len() {
			let first = NodeIdentity::derive(index).unwrap();
			let second = NodeIdentity::derive(index).unwrap();

			assert_eq!(first.account_address(), second.account_address());
			assert_eq!(first.stash_address(), second.stash_address());
			assert_eq!(first.grandpa_address(), second.grandpa_address());
			assert_eq!(first.beefy_address(), second.beefy_address());
		}
	}

	#[test]
	fn transport_key_is_fresh() {
		let first = NodeIdentity::derive(0).unwrap();
		let second = NodeIdentity::derive(0).unwrap();

		assert_ne!(first.node_key().peer_id(), second.node_key().peer_id());
	}

	#[test]
	fn alice_matches_well_known_accounts() {
		let alice = NodeIdentity::derive(0).unwrap();

		assert_eq!(alice.name(), "Alice");
		assert_eq!(alice.dev_flag(), "--alice");
		assert_eq!(alice.account_address(), "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");
		assert_eq!(alice.stash_address(), "5GNJqTPyNqANBkUVMN1LPPrxXnFouWXoe2wNSmmEoLctxiZY");
		assert_eq!(alice.grandpa_address(), "5FA9nQDVg267DEd8m1ZypXLBnvN7SFxYwV7ndqSYGiN9TTpu");
	}

	#[test]
	fn keys_differ_between_nodes_and_roles() {
		let alice = NodeIdentity::derive(0).unwrap();
		let bob = NodeIdentity::derive(1).unwrap();

		assert_ne!(alice.account_address(), bob.account_address());
		assert_ne!(alice.account_address(), alice.stash_address());
		assert_ne!(alice.account_address(), alice.grandpa_address());
	}

	#[test]
	fn sixth_node_exhausts_name_table() {
		assert_matches!(
			NodeIdentity::derive(5).map(|_| ()),
			Err(DerivationError::NameTableExhausted { index: 5, capacity: 5 })
		);
	}

	#[test]
	fn node_key_formats() {
		let key = NodeKey::generate();

		assert_eq!(key.secret_hex().len(), 64);
		assert_eq!(
			key.multi_address("relay-0", 27452),
			format!("/dns4/relay-0/tcp/27452/p2p/{}", key.peer_id()),
		);
	}
}
