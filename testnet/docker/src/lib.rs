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

//! Container plumbing shared by the relay chain provisioner and the relayer driver.
//!
//! Everything that talks to a container engine goes through [`ContainerRuntime`]. The
//! production implementation is [`DockerRuntime`]; tests of dependent crates use the in-memory
//! runtime from the `testing` module (behind the `test-helpers` feature).

mod docker;
mod environment;
mod error;
pub mod job;
pub mod naming;
mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use docker::DockerRuntime;
pub use environment::Environment;
pub use error::{Error, Result};
pub use job::{run_job, run_job_full_output, set_volume_owner, JobOutput, JobResult};
pub use runtime::{ContainerLogs, ContainerRuntime, ContainerSpec, ContainerSummary};

/// Log target for this crate.
pub const LOG_TARGET: &str = "testnet::docker";

/// Label put on every volume and container so leftovers can be found and cleaned up.
pub const CLEANUP_LABEL: &str = "polkadot-testnet";

/// Label naming the node (or relayer) that owns a volume.
pub const NODE_OWNER_LABEL: &str = "polkadot-testnet-node";
