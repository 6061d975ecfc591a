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

//! Error type of the container runtime boundary.

/// Result of container runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the container runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Docker engine request failed: {0}")]
	Docker(#[from] bollard::errors::Error),
	#[error("Container runtime failure: {0}")]
	Runtime(String),
	#[error("Operation cancelled")]
	Cancelled,
	#[error("File `{path}` not found in volume `{volume}`")]
	FileNotFound { volume: String, path: String },
	#[error("Failed to pack or unpack volume archive: {0}")]
	Archive(#[from] std::io::Error),
	#[error(
		"Job `{job}` exited with code {exit_code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
	)]
	JobFailed { job: String, exit_code: i64, stdout: String, stderr: String },
	#[error("Job `{job}` failed: {source}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
	JobTransport {
		job: String,
		stdout: String,
		stderr: String,
		#[source]
		source: Box<Error>,
	},
}

impl Error {
	/// Whether the error was caused by the caller cancelling the operation.
	pub fn is_cancelled(&self) -> bool {
		match self {
			Error::Cancelled => true,
			Error::JobTransport { source, .. } => source.is_cancelled(),
			_ => false,
		}
	}
}
