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

/// Result of relayer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Relayer driver errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A relayer command failed. Carries the captured output.
	#[error("Relayer command failed: {0}")]
	JobExecution(#[source] testnet_docker::Error),
	#[error("Failed to (de)serialize relayer data: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("Container runtime failure: {0}")]
	Runtime(#[source] testnet_docker::Error),
	#[error("Relayer is not running")]
	NotStarted,
	#[error("Relayer is already running in {0}")]
	AlreadyStarted(String),
}
