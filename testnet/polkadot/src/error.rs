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

//! Errors raised while provisioning a network.

use crate::dyn_value::PathError;

/// Result of network provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Key derivation failure.
#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
	#[error("No identity name for node {index}, at most {capacity} relay chain nodes are supported")]
	NameTableExhausted { index: usize, capacity: usize },
	#[error("Failed to derive {scheme} key from `{uri}`: {reason}")]
	InvalidSeed { scheme: &'static str, uri: String, reason: String },
}

/// Errors of the network provisioning pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Derivation(#[from] DerivationError),
	#[error("Failed to prepare volume of {node}: {source}")]
	Volume {
		node: String,
		#[source]
		source: testnet_docker::Error,
	},
	#[error("Error setting {field}: {source}")]
	Genesis {
		field: &'static str,
		#[source]
		source: PathError,
	},
	#[error("Error exporting {what} of {node}: {source}")]
	Export {
		node: String,
		what: &'static str,
		#[source]
		source: Box<Error>,
	},
	#[error("Container lifecycle of {node} failed: {source}")]
	ContainerLifecycle {
		node: String,
		#[source]
		source: testnet_docker::Error,
	},
	#[error("Invalid chain spec: {0}")]
	ChainSpec(#[from] serde_json::Error),
	#[error("Chain config `{0}` lists no image")]
	ImageMissing(String),
	#[error("Network is not initialized")]
	NotInitialized,
	#[error("Network nodes are already started")]
	AlreadyStarted,
	#[error("Unexpected output from {command}: {reason}")]
	InvalidOutput { command: String, reason: String },
	#[error(transparent)]
	Docker(#[from] testnet_docker::Error),
}

impl Error {
	/// Whether the failure stems from the caller cancelling the operation.
	pub fn is_cancelled(&self) -> bool {
		match self {
			Error::Volume { source, .. } |
			Error::ContainerLifecycle { source, .. } |
			Error::Docker(source) => source.is_cancelled(),
			Error::Export { source, .. } => source.is_cancelled(),
			_ => false,
		}
	}
}
