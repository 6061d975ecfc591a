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

//! Container and host naming rules.

use rand::Rng;

/// Longest hostname the container runtime accepts.
const MAX_HOST_NAME_LEN: usize = 63;
/// Characters kept from each end of a condensed hostname.
const CONDENSED_PART_LEN: usize = 30;

/// Replace every character the runtime rejects in container names with `_`.
pub fn sanitize_container_name(name: &str) -> String {
	name.chars()
		.map(|c| match c {
			'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | '-' => c,
			_ => '_',
		})
		.collect()
}

/// Shorten `name` so it fits a hostname, keeping both ends.
pub fn condense_host_name(name: &str) -> String {
	let chars: Vec<char> = name.chars().collect();
	if chars.len() <= MAX_HOST_NAME_LEN {
		return name.to_string()
	}

	let head: String = chars[..CONDENSED_PART_LEN].iter().collect();
	let tail: String = chars[chars.len() - CONDENSED_PART_LEN..].iter().collect();
	format!("{head}_._{tail}")
}

/// `len` random lowercase ASCII letters.
pub fn random_suffix(len: usize) -> String {
	let mut rng = rand::thread_rng();
	(0..len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sanitize_replaces_rejected_characters() {
		assert_eq!(
			sanitize_container_name("TestPolkadot/sub test:1"),
			"TestPolkadot_sub_test_1"
		);
		assert_eq!(sanitize_container_name("relaychain-0.rococo_local"), "relaychain-0.rococo_local");
	}

	#[test]
	fn condense_keeps_short_names() {
		assert_eq!(condense_host_name("relaychain-0-rococo-local"), "relaychain-0-rococo-local");
	}

	#[test]
	fn condense_shortens_long_names() {
		let name = format!("{}{}", "a".repeat(40), "b".repeat(40));
		let condensed = condense_host_name(&name);

		assert_eq!(condensed.len(), 63);
		assert_eq!(condensed, format!("{}_._{}", "a".repeat(30), "b".repeat(30)));
	}

	#[test]
	fn random_suffix_is_lowercase() {
		let suffix = random_suffix(12);
		assert_eq!(suffix.len(), 12);
		assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
	}
}
