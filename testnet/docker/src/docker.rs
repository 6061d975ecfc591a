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

//! [`ContainerRuntime`] backed by a Docker engine.

use crate::{
	job::VOLUME_MOUNT_PATH, naming, ContainerLogs, ContainerRuntime, ContainerSpec,
	ContainerSummary, Error, Result, LOG_TARGET,
};
use bollard::{
	container::{
		Config, CreateContainerOptions, DownloadFromContainerOptions, ListContainersOptions,
		LogOutput, LogsOptions, NetworkingConfig, RemoveContainerOptions, StartContainerOptions,
		StopContainerOptions, UploadToContainerOptions, WaitContainerOptions,
	},
	errors::Error as DockerError,
	image::CreateImageOptions,
	models::{EndpointSettings, HostConfig},
	volume::CreateVolumeOptions,
	Docker,
};
use futures::StreamExt;
use std::{
	collections::{BTreeMap, HashMap},
	future::Future,
	io::Read,
	time::Duration,
};
use testnet_primitives::DockerImage;
use tokio::sync::OnceCell;

/// Image of the short-lived containers used to move files in and out of volumes.
const VOLUME_IO_IMAGE: &str = "busybox";
const VOLUME_IO_TAG: &str = "stable";

/// Docker engine client.
pub struct DockerRuntime {
	docker: Docker,
	volume_io_image: OnceCell<()>,
}

impl DockerRuntime {
	/// Connect to the local engine (unix socket or `DOCKER_HOST`).
	pub fn connect() -> Result<Self> {
		Ok(Self::from_client(Docker::connect_with_local_defaults()?))
	}

	pub fn from_client(docker: Docker) -> Self {
		Self { docker, volume_io_image: OnceCell::new() }
	}

	async fn ensure_volume_io_image(&self) {
		self.volume_io_image
			.get_or_init(|| async {
				let image = DockerImage::new(VOLUME_IO_IMAGE, VOLUME_IO_TAG);
				if let Err(e) = self.pull_image(&image).await {
					log::warn!(target: LOG_TARGET, "Failed to pull {}: {}", image.reference(), e);
				}
			})
			.await;
	}
}

/// Run `transfer` on its own task, so that it runs to completion (helper removal included) even
/// if the caller stops polling.
async fn detached<T: Send + 'static>(
	transfer: impl Future<Output = Result<T>> + Send + 'static,
) -> Result<T> {
	tokio::spawn(transfer)
		.await
		.map_err(|e| Error::Runtime(format!("volume transfer task failed: {e}")))?
}

/// Config of a stopped helper container with `volume` mounted at [`VOLUME_MOUNT_PATH`].
///
/// The helper carries the labels of the volume it serves.
fn volume_io_config(volume: &str, labels: HashMap<String, String>) -> Config<String> {
	Config {
		image: Some(format!("{VOLUME_IO_IMAGE}:{VOLUME_IO_TAG}")),
		cmd: Some(vec!["true".to_string()]),
		user: Some("0:0".to_string()),
		labels: Some(labels),
		host_config: Some(HostConfig {
			binds: Some(vec![format!("{volume}:{VOLUME_MOUNT_PATH}")]),
			auto_remove: Some(false),
			..Default::default()
		}),
		..Default::default()
	}
}

async fn volume_io_container(docker: &Docker, volume: &str) -> Result<String> {
	let labels = docker.inspect_volume(volume).await?.labels;
	let name = format!("volume-io-{}", naming::random_suffix(8));
	let created = docker
		.create_container(
			Some(CreateContainerOptions { name, platform: None }),
			volume_io_config(volume, labels),
		)
		.await?;
	Ok(created.id)
}

async fn remove_volume_io_container(docker: &Docker, id: &str) {
	let options = RemoveContainerOptions { force: true, ..Default::default() };
	if let Err(e) = docker.remove_container(id, Some(options)).await {
		log::warn!(target: LOG_TARGET, "Failed to remove volume helper {}: {}", id, e);
	}
}

async fn download(docker: &Docker, id: &str, volume: &str, path: &str) -> Result<Vec<u8>> {
	let options = DownloadFromContainerOptions { path: format!("{VOLUME_MOUNT_PATH}/{path}") };
	let mut stream = docker.download_from_container(id, Some(options));
	let mut tarball = Vec::new();
	while let Some(chunk) = stream.next().await {
		match chunk {
			Ok(bytes) => tarball.extend_from_slice(&bytes),
			Err(DockerError::DockerResponseServerError { status_code: 404, .. }) =>
				return Err(Error::FileNotFound { volume: volume.into(), path: path.into() }),
			Err(e) => return Err(e.into()),
		}
	}

	let mut archive = tar::Archive::new(&tarball[..]);
	for entry in archive.entries()? {
		let mut entry = entry?;
		if entry.header().entry_type().is_file() {
			let mut content = Vec::with_capacity(entry.size() as usize);
			entry.read_to_end(&mut content)?;
			return Ok(content)
		}
	}
	Err(Error::FileNotFound { volume: volume.into(), path: path.into() })
}

async fn upload(docker: &Docker, id: &str, path: &str, content: &[u8]) -> Result<()> {
	let mut header = tar::Header::new_gnu();
	header.set_size(content.len() as u64);
	header.set_mode(0o644);
	let mut archive = tar::Builder::new(Vec::new());
	archive.append_data(&mut header, path, content)?;
	let tarball = archive.into_inner()?;

	let options =
		UploadToContainerOptions { path: VOLUME_MOUNT_PATH.to_string(), ..Default::default() };
	docker.upload_to_container(id, Some(options), bytes::Bytes::from(tarball)).await?;
	Ok(())
}

#[async_trait::async_trait]
impl ContainerRuntime for DockerRuntime {
	async fn pull_image(&self, image: &DockerImage) -> Result<()> {
		let options = CreateImageOptions {
			from_image: image.repository.clone(),
			tag: image.version.clone(),
			..Default::default()
		};
		let mut progress = self.docker.create_image(Some(options), None, None);
		while let Some(step) = progress.next().await {
			step?;
		}
		Ok(())
	}

	async fn create_volume(&self, labels: BTreeMap<String, String>) -> Result<String> {
		let options =
			CreateVolumeOptions { labels: labels.into_iter().collect(), ..Default::default() };
		Ok(self.docker.create_volume(options).await?.name)
	}

	async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
		let networking_config = spec.network_id.as_ref().map(|network| NetworkingConfig {
			endpoints_config: HashMap::from([(network.clone(), EndpointSettings::default())]),
		});
		let config = Config {
			hostname: (!spec.hostname.is_empty()).then(|| spec.hostname.clone()),
			image: Some(spec.image.clone()),
			cmd: Some(spec.cmd.clone()),
			env: Some(spec.env.clone()),
			user: spec.user.clone(),
			entrypoint: spec.reset_entrypoint.then(|| vec![String::new()]),
			labels: Some(spec.labels.clone().into_iter().collect()),
			exposed_ports: Some(
				spec.exposed_ports.iter().map(|port| (port.clone(), HashMap::new())).collect(),
			),
			host_config: Some(HostConfig {
				binds: Some(spec.binds.clone()),
				auto_remove: Some(false),
				publish_all_ports: Some(!spec.exposed_ports.is_empty()),
				..Default::default()
			}),
			networking_config,
			..Default::default()
		};

		let options = CreateContainerOptions { name: spec.name.clone(), platform: None };
		Ok(self.docker.create_container(Some(options), config).await?.id)
	}

	async fn start_container(&self, id: &str) -> Result<()> {
		Ok(self.docker.start_container(id, None::<StartContainerOptions<String>>).await?)
	}

	async fn wait_container(&self, id: &str) -> Result<i64> {
		let options = WaitContainerOptions { condition: "not-running" };
		let mut stream = self.docker.wait_container(id, Some(options));
		match stream.next().await {
			Some(Ok(response)) => Ok(response.status_code),
			// Non-zero exits are reported as errors by the client.
			Some(Err(DockerError::DockerContainerWaitError { code, .. })) => Ok(code),
			Some(Err(e)) => Err(e.into()),
			None => Err(Error::Runtime(format!("wait on container {id} returned no status"))),
		}
	}

	async fn stop_container(&self, id: &str, timeout: Duration) -> Result<()> {
		let options = StopContainerOptions { t: timeout.as_secs() as i64 };
		Ok(self.docker.stop_container(id, Some(options)).await?)
	}

	async fn container_logs(&self, id: &str, tail: Option<usize>) -> Result<ContainerLogs> {
		let options = LogsOptions::<String> {
			stdout: true,
			stderr: true,
			tail: tail.map_or_else(|| "all".to_string(), |n| n.to_string()),
			..Default::default()
		};
		let mut stream = self.docker.logs(id, Some(options));
		let mut logs = ContainerLogs::default();
		while let Some(chunk) = stream.next().await {
			match chunk? {
				LogOutput::StdOut { message } | LogOutput::Console { message } =>
					logs.stdout.push_str(&String::from_utf8_lossy(&message)),
				LogOutput::StdErr { message } =>
					logs.stderr.push_str(&String::from_utf8_lossy(&message)),
				LogOutput::StdIn { .. } => {},
			}
		}
		Ok(logs)
	}

	async fn remove_container(&self, id: &str) -> Result<()> {
		let options = RemoveContainerOptions { force: true, ..Default::default() };
		Ok(self.docker.remove_container(id, Some(options)).await?)
	}

	async fn list_containers(&self, key: &str, value: &str) -> Result<Vec<ContainerSummary>> {
		let options = ListContainersOptions {
			all: true,
			filters: HashMap::from([("label".to_string(), vec![format!("{key}={value}")])]),
			..Default::default()
		};
		let containers = self.docker.list_containers(Some(options)).await?;
		Ok(containers
			.into_iter()
			.map(|c| ContainerSummary {
				id: c.id.unwrap_or_default(),
				name: c
					.names
					.and_then(|names| names.into_iter().next())
					.map(|name| name.trim_start_matches('/').to_string())
					.unwrap_or_default(),
				running: c.state.as_deref() == Some("running"),
			})
			.collect())
	}

	async fn read_volume_file(&self, volume: &str, path: &str) -> Result<Vec<u8>> {
		self.ensure_volume_io_image().await;
		let (docker, volume, path) = (self.docker.clone(), volume.to_string(), path.to_string());
		detached(async move {
			let id = volume_io_container(&docker, &volume).await?;
			let content = download(&docker, &id, &volume, &path).await;
			remove_volume_io_container(&docker, &id).await;
			content
		})
		.await
	}

	async fn write_volume_file(&self, volume: &str, path: &str, content: &[u8]) -> Result<()> {
		self.ensure_volume_io_image().await;
		let (docker, volume, path) = (self.docker.clone(), volume.to_string(), path.to_string());
		let content = content.to_vec();
		detached(async move {
			let id = volume_io_container(&docker, &volume).await?;
			let written = upload(&docker, &id, &path, &content).await;
			remove_volume_io_container(&docker, &id).await;
			written
		})
		.await
	}
}
