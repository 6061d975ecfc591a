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

//! Capabilities shared by relay chain and parachain nodes.

use crate::{keys::NodeKey, Error, Result, LOG_TARGET};
use testnet_docker::{
	naming, run_job, run_job_full_output, set_volume_owner, ContainerSpec, Environment, JobOutput,
	JobResult,
};
use testnet_primitives::DockerImage;

/// Home directory of the node process; the node volume is mounted here.
pub const NODE_HOME: &str = "/home/heighliner";

pub const WS_PORT: u16 = 27451;
pub const P2P_PORT: u16 = 27452;
pub const PROMETHEUS_PORT: u16 = 27453;
pub const RPC_PORT: u16 = 9933;

/// Ports exposed on every node container.
pub fn exposed_ports() -> Vec<String> {
	[WS_PORT, P2P_PORT, PROMETHEUS_PORT, RPC_PORT]
		.iter()
		.map(|port| format!("{port}/tcp"))
		.collect()
}

/// Container resources owned by one node: its volume and, once created, its container.
pub struct NodeHandle {
	env: Environment,
	name: String,
	image: DockerImage,
	volume: Option<String>,
	container_id: Option<String>,
}

impl NodeHandle {
	pub fn new(env: Environment, name: String, image: DockerImage) -> Self {
		Self { env, name, image, volume: None, container_id: None }
	}

	pub fn env(&self) -> &Environment {
		&self.env
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn host_name(&self) -> String {
		naming::condense_host_name(&self.name)
	}

	pub fn image(&self) -> &DockerImage {
		&self.image
	}

	pub fn volume(&self) -> Option<&str> {
		self.volume.as_deref()
	}

	pub fn container_id(&self) -> Option<&str> {
		self.container_id.as_deref()
	}

	fn require_volume(&self) -> Result<&str> {
		self.volume.as_deref().ok_or(Error::NotInitialized)
	}

	/// Create the node volume and hand it to the image user.
	pub async fn provision_volume(&mut self) -> Result<()> {
		let volume_error = |source| Error::Volume { node: self.name.clone(), source };

		let volume = self.env.create_volume(&self.name).await.map_err(volume_error)?;
		set_volume_owner(&self.env, &volume, &self.image, &self.name)
			.await
			.map_err(volume_error)?;
		self.volume = Some(volume);
		Ok(())
	}

	/// Container spec running `cmd` in the node image with the volume mounted at [`NODE_HOME`].
	fn spec(&self, name: String, cmd: Vec<String>, env: Vec<String>) -> Result<ContainerSpec> {
		Ok(ContainerSpec {
			hostname: naming::condense_host_name(&name),
			name,
			image: self.image.reference(),
			cmd,
			env,
			user: Some(self.image.uid_gid().into()),
			binds: vec![format!("{}:{NODE_HOME}", self.require_volume()?)],
			network_id: Some(self.env.network_id().into()),
			labels: self.env.labels(&self.name),
			..Default::default()
		})
	}

	fn job_name(&self) -> String {
		naming::sanitize_container_name(&format!(
			"{}-exec-{}",
			self.name,
			naming::random_suffix(5)
		))
	}

	/// Run `cmd` once in the node image.
	pub async fn exec(&self, cmd: Vec<String>, env: Vec<String>) -> JobResult {
		let name = self.job_name();
		match self.spec(name.clone(), cmd, env) {
			Ok(spec) => run_job(&self.env, spec).await,
			Err(e) => JobResult {
				job: name,
				exit_code: testnet_docker::job::NO_EXIT_CODE,
				stdout: String::new(),
				stderr: String::new(),
				error: Some(testnet_docker::Error::Runtime(e.to_string())),
			},
		}
	}

	/// Run `cmd` once in the node image and return its complete output.
	pub async fn exec_full_output(&self, cmd: Vec<String>) -> Result<JobOutput> {
		let spec = self.spec(self.job_name(), cmd, Vec::new())?;
		Ok(run_job_full_output(&self.env, spec).await.into_result()?)
	}

	/// Read `path`, relative to [`NODE_HOME`].
	pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
		let volume = self.require_volume()?;
		Ok(self.env.guard(self.env.runtime().read_volume_file(volume, path)).await?)
	}

	/// Write `path`, relative to [`NODE_HOME`].
	pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
		let volume = self.require_volume()?;
		Ok(self.env.guard(self.env.runtime().write_volume_file(volume, path, content)).await?)
	}

	/// Create the long running node container.
	pub async fn create_container(&mut self, cmd: Vec<String>) -> Result<()> {
		let lifecycle_error = |source| Error::ContainerLifecycle { node: self.name.clone(), source };

		let mut spec = self.spec(self.name.clone(), cmd, Vec::new())?;
		spec.exposed_ports = exposed_ports();

		if self.env.cancellation().is_cancelled() {
			return Err(lifecycle_error(testnet_docker::Error::Cancelled))
		}
		log::info!(target: LOG_TARGET, "Creating container {}", self.name);
		// Not guarded, so that the id of a created container is always recorded.
		let id = self.env.runtime().create_container(&spec).await.map_err(lifecycle_error)?;
		self.container_id = Some(id);
		Ok(())
	}

	pub async fn start_container(&self) -> Result<()> {
		let id = self.container_id.as_deref().ok_or(Error::NotInitialized)?;

		log::info!(target: LOG_TARGET, "Starting container {}", self.name);
		self.env
			.guard(self.env.runtime().start_container(id))
			.await
			.map_err(|source| Error::ContainerLifecycle { node: self.name.clone(), source })
	}
}

/// A relay chain or parachain node.
#[async_trait::async_trait]
pub trait Node: Send + Sync {
	fn handle(&self) -> &NodeHandle;

	fn handle_mut(&mut self) -> &mut NodeHandle;

	fn node_key(&self) -> &NodeKey;

	/// Command line of the long running node process.
	fn start_command(&self) -> Vec<String>;

	/// Raw chain spec the node boots from, relative to [`NODE_HOME`].
	fn raw_chain_spec_path(&self) -> String;

	fn name(&self) -> &str {
		self.handle().name()
	}

	fn host_name(&self) -> String {
		self.handle().host_name()
	}

	fn volume_name(&self) -> Option<&str> {
		self.handle().volume()
	}

	/// Boot node address of this node.
	fn multi_address(&self) -> String {
		self.node_key().multi_address(&self.host_name(), P2P_PORT)
	}

	async fn create_container(&mut self) -> Result<()> {
		let cmd = self.start_command();
		self.handle_mut().create_container(cmd).await
	}

	async fn start_container(&self) -> Result<()> {
		self.handle().start_container().await
	}

	async fn exec(&self, cmd: Vec<String>, env: Vec<String>) -> JobResult {
		self.handle().exec(cmd, env).await
	}
}
