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

//! The generic container runtime interface consumed by the orchestrator and the relayer driver.

use crate::Result;
use std::{collections::BTreeMap, time::Duration};
use testnet_primitives::DockerImage;

/// Everything needed to create one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
	/// Unique container name.
	pub name: String,
	/// Hostname on the test network. Empty lets the runtime choose.
	pub hostname: String,
	/// Image reference, `repository:tag`.
	pub image: String,
	pub cmd: Vec<String>,
	/// `KEY=value` pairs.
	pub env: Vec<String>,
	/// `uid:gid` to run the process as; the image default if `None`.
	pub user: Option<String>,
	/// `volume:path` bind mounts.
	pub binds: Vec<String>,
	/// Network to attach the container to.
	pub network_id: Option<String>,
	pub labels: BTreeMap<String, String>,
	/// Ports to expose, e.g. `9933/tcp`.
	pub exposed_ports: Vec<String>,
	/// Reset the image entrypoint so that `cmd` is run as is.
	pub reset_entrypoint: bool,
}

/// Trailing output of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLogs {
	pub stdout: String,
	pub stderr: String,
}

/// A container known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
	pub id: String,
	pub name: String,
	pub running: bool,
}

/// Primitives of an isolated compute runtime.
///
/// Every method is a suspension point. Implementations must be usable from many tasks at once.
#[async_trait::async_trait]
pub trait ContainerRuntime: Send + Sync {
	/// Pull `image`, consuming the progress stream to completion.
	async fn pull_image(&self, image: &DockerImage) -> Result<()>;

	/// Create an anonymous volume carrying `labels` and return its name.
	async fn create_volume(&self, labels: BTreeMap<String, String>) -> Result<String>;

	/// Create (but do not start) a container and return its id.
	async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

	async fn start_container(&self, id: &str) -> Result<()>;

	/// Block until the container is no longer running and return its exit code.
	async fn wait_container(&self, id: &str) -> Result<i64>;

	/// Ask the container to stop, killing it once `timeout` elapses.
	async fn stop_container(&self, id: &str, timeout: Duration) -> Result<()>;

	/// The last `tail` lines of the container output, or all of it for `None`.
	async fn container_logs(&self, id: &str, tail: Option<usize>) -> Result<ContainerLogs>;

	async fn remove_container(&self, id: &str) -> Result<()>;

	/// All containers, running or not, carrying the `key=value` label.
	async fn list_containers(&self, key: &str, value: &str) -> Result<Vec<ContainerSummary>>;

	/// Read the file at `path`, relative to the root of `volume`.
	async fn read_volume_file(&self, volume: &str, path: &str) -> Result<Vec<u8>>;

	/// Write `content` to `path`, relative to the root of `volume`, replacing any previous file.
	async fn write_volume_file(&self, volume: &str, path: &str, content: &[u8]) -> Result<()>;
}
