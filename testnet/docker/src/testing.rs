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

//! In-memory container runtime for tests.
//!
//! Volumes are maps of files, containers are records with a status. A container whose command
//! matches a registered response behaves like a job: it exits with the scripted code and output as
//! soon as it is started. Any other container keeps running until stopped (or, for waits, exits
//! with code 0). Failures can be injected per container name fragment.

use crate::{ContainerLogs, ContainerRuntime, ContainerSpec, ContainerSummary, Error, Result};
use parking_lot::Mutex;
use std::{
	collections::{BTreeMap, HashSet},
	time::Duration,
};
use testnet_primitives::DockerImage;

/// Scripted outcome of a job container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockExit {
	pub exit_code: i64,
	pub stdout: String,
	pub stderr: String,
}

impl MockExit {
	pub fn success(stdout: impl Into<String>) -> Self {
		Self { exit_code: 0, stdout: stdout.into(), stderr: String::new() }
	}

	pub fn failure(exit_code: i64, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
		Self { exit_code, stdout: stdout.into(), stderr: stderr.into() }
	}
}

/// Calls observed by the runtime, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
	PullImage(String),
	CreateVolume(String),
	WriteFile { volume: String, path: String },
	ReadFile { volume: String, path: String },
	Create(String),
	Start(String),
	Stop(String),
	Remove(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStatus {
	Created,
	Running,
	Exited(i64),
}

#[derive(Debug, Clone)]
pub struct MockContainer {
	pub id: String,
	pub spec: ContainerSpec,
	pub status: MockStatus,
	pub removed: bool,
	logs: ContainerLogs,
}

#[derive(Debug, Default)]
struct MockVolume {
	labels: BTreeMap<String, String>,
	files: BTreeMap<String, Vec<u8>>,
}

#[derive(Default)]
struct State {
	next_id: u64,
	pull_attempts: Vec<String>,
	failing_pulls: HashSet<String>,
	volumes: BTreeMap<String, MockVolume>,
	containers: Vec<MockContainer>,
	responses: Vec<(String, MockExit)>,
	failing_creates: Vec<String>,
	failing_starts: Vec<String>,
	failing_removes: Vec<String>,
	hanging_starts: Vec<String>,
	start_delays: Vec<(String, Duration)>,
	create_delays: Vec<(String, Duration)>,
	events: Vec<MockEvent>,
}

impl State {
	fn container(&self, id: &str) -> Result<&MockContainer> {
		self.containers
			.iter()
			.find(|c| c.id == id && !c.removed)
			.ok_or_else(|| Error::Runtime(format!("no such container: {id}")))
	}

	fn container_mut(&mut self, id: &str) -> Result<&mut MockContainer> {
		self.containers
			.iter_mut()
			.find(|c| c.id == id && !c.removed)
			.ok_or_else(|| Error::Runtime(format!("no such container: {id}")))
	}

	fn delay_for(delays: &[(String, Duration)], name: &str) -> Option<Duration> {
		delays
			.iter()
			.find(|(fragment, _)| name.contains(fragment.as_str()))
			.map(|(_, delay)| *delay)
	}

	fn response_for(&self, cmd: &[String]) -> Option<MockExit> {
		let cmd = cmd.join(" ");
		self.responses
			.iter()
			.find(|(fragment, _)| cmd.contains(fragment.as_str()))
			.map(|(_, exit)| exit.clone())
	}
}

fn last_lines(text: &str, n: usize) -> String {
	let lines: Vec<&str> = text.split_inclusive('\n').collect();
	lines[lines.len().saturating_sub(n)..].concat()
}

fn name_matches(fragments: &[String], name: &str) -> bool {
	fragments.iter().any(|fragment| name.contains(fragment.as_str()))
}

/// See the module documentation.
#[derive(Default)]
pub struct MockRuntime {
	state: Mutex<State>,
}

impl MockRuntime {
	pub fn new() -> Self {
		Self::default()
	}

	/// Containers whose command contains `fragment` exit with `exit` when started.
	///
	/// The first registered matching fragment wins.
	pub fn respond(&self, fragment: &str, exit: MockExit) {
		self.state.lock().responses.push((fragment.into(), exit));
	}

	/// Pulling `reference` fails.
	pub fn fail_pull(&self, reference: &str) {
		self.state.lock().failing_pulls.insert(reference.into());
	}

	/// Creating containers whose name contains `fragment` fails.
	pub fn fail_create(&self, fragment: &str) {
		self.state.lock().failing_creates.push(fragment.into());
	}

	/// Starting containers whose name contains `fragment` fails.
	pub fn fail_start(&self, fragment: &str) {
		self.state.lock().failing_starts.push(fragment.into());
	}

	/// Removing containers whose name contains `fragment` fails.
	pub fn fail_remove(&self, fragment: &str) {
		self.state.lock().failing_removes.push(fragment.into());
	}

	/// Starting containers whose name contains `fragment` never completes.
	pub fn hang_on_start(&self, fragment: &str) {
		self.state.lock().hanging_starts.push(fragment.into());
	}

	/// Starting containers whose name contains `fragment` takes `delay`.
	pub fn delay_start(&self, fragment: &str, delay: Duration) {
		self.state.lock().start_delays.push((fragment.into(), delay));
	}

	/// Creating containers whose name contains `fragment` takes `delay`. The container exists as
	/// soon as the call begins.
	pub fn delay_create(&self, fragment: &str, delay: Duration) {
		self.state.lock().create_delays.push((fragment.into(), delay));
	}

	pub fn pull_attempts(&self) -> Vec<String> {
		self.state.lock().pull_attempts.clone()
	}

	pub fn events(&self) -> Vec<MockEvent> {
		self.state.lock().events.clone()
	}

	/// Names of all volumes.
	pub fn volumes(&self) -> Vec<String> {
		self.state.lock().volumes.keys().cloned().collect()
	}

	pub fn volume_labels(&self, volume: &str) -> Option<BTreeMap<String, String>> {
		self.state.lock().volumes.get(volume).map(|v| v.labels.clone())
	}

	pub fn volume_file(&self, volume: &str, path: &str) -> Option<Vec<u8>> {
		self.state.lock().volumes.get(volume).and_then(|v| v.files.get(path).cloned())
	}

	/// Put a file into a volume without recording an event.
	pub fn seed_file(&self, volume: &str, path: &str, content: &[u8]) {
		self.state
			.lock()
			.volumes
			.entry(volume.into())
			.or_default()
			.files
			.insert(path.into(), content.to_vec());
	}

	/// Specs of every container ever created, in creation order.
	pub fn invocations(&self) -> Vec<ContainerSpec> {
		self.state.lock().containers.iter().map(|c| c.spec.clone()).collect()
	}

	/// Containers that have not been removed.
	pub fn live_containers(&self) -> Vec<MockContainer> {
		self.state.lock().containers.iter().filter(|c| !c.removed).cloned().collect()
	}

	/// Names of containers currently running.
	pub fn running_containers(&self) -> Vec<String> {
		self.state
			.lock()
			.containers
			.iter()
			.filter(|c| !c.removed && c.status == MockStatus::Running)
			.map(|c| c.spec.name.clone())
			.collect()
	}
}

#[async_trait::async_trait]
impl ContainerRuntime for MockRuntime {
	async fn pull_image(&self, image: &DockerImage) -> Result<()> {
		let mut state = self.state.lock();
		let reference = image.reference();
		state.pull_attempts.push(reference.clone());
		state.events.push(MockEvent::PullImage(reference.clone()));
		if state.failing_pulls.contains(&reference) {
			return Err(Error::Runtime(format!("manifest for {reference} not found")))
		}
		Ok(())
	}

	async fn create_volume(&self, labels: BTreeMap<String, String>) -> Result<String> {
		let mut state = self.state.lock();
		state.next_id += 1;
		let name = format!("volume-{}", state.next_id);
		state.volumes.insert(name.clone(), MockVolume { labels, files: Default::default() });
		state.events.push(MockEvent::CreateVolume(name.clone()));
		Ok(name)
	}

	async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
		let (id, delay) = {
			let mut state = self.state.lock();
			if name_matches(&state.failing_creates, &spec.name) {
				return Err(Error::Runtime(format!("injected create failure for {}", spec.name)))
			}
			if state.containers.iter().any(|c| !c.removed && c.spec.name == spec.name) {
				return Err(Error::Runtime(format!("container name {} already in use", spec.name)))
			}
			state.next_id += 1;
			let id = format!("container-{}", state.next_id);
			state.containers.push(MockContainer {
				id: id.clone(),
				spec: spec.clone(),
				status: MockStatus::Created,
				removed: false,
				logs: Default::default(),
			});
			state.events.push(MockEvent::Create(spec.name.clone()));
			(id, State::delay_for(&state.create_delays, &spec.name))
		};

		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		Ok(id)
	}

	async fn start_container(&self, id: &str) -> Result<()> {
		let (name, delay, hang) = {
			let state = self.state.lock();
			let name = state.container(id)?.spec.name.clone();
			let delay = State::delay_for(&state.start_delays, &name);
			let hang = name_matches(&state.hanging_starts, &name);
			(name, delay, hang)
		};

		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if hang {
			futures::future::pending::<()>().await;
		}

		let mut state = self.state.lock();
		state.events.push(MockEvent::Start(name.clone()));
		if name_matches(&state.failing_starts, &name) {
			return Err(Error::Runtime(format!("injected start failure for {name}")))
		}
		let response = state.response_for(&state.container(id)?.spec.cmd);
		let container = state.container_mut(id)?;
		match response {
			Some(exit) => {
				container.status = MockStatus::Exited(exit.exit_code);
				container.logs = ContainerLogs { stdout: exit.stdout, stderr: exit.stderr };
			},
			None => container.status = MockStatus::Running,
		}
		Ok(())
	}

	async fn wait_container(&self, id: &str) -> Result<i64> {
		let mut state = self.state.lock();
		let container = state.container_mut(id)?;
		match container.status {
			MockStatus::Exited(code) => Ok(code),
			MockStatus::Running => {
				container.status = MockStatus::Exited(0);
				Ok(0)
			},
			MockStatus::Created =>
				Err(Error::Runtime(format!("container {} is not started", container.spec.name))),
		}
	}

	async fn stop_container(&self, id: &str, _timeout: Duration) -> Result<()> {
		let mut state = self.state.lock();
		let container = state.container_mut(id)?;
		if container.status == MockStatus::Running {
			container.status = MockStatus::Exited(0);
		}
		let name = container.spec.name.clone();
		state.events.push(MockEvent::Stop(name));
		Ok(())
	}

	async fn container_logs(&self, id: &str, tail: Option<usize>) -> Result<ContainerLogs> {
		let logs = self.state.lock().container(id)?.logs.clone();
		Ok(match tail {
			Some(n) => ContainerLogs {
				stdout: last_lines(&logs.stdout, n),
				stderr: last_lines(&logs.stderr, n),
			},
			None => logs,
		})
	}

	async fn remove_container(&self, id: &str) -> Result<()> {
		let mut state = self.state.lock();
		let name = state.container(id)?.spec.name.clone();
		if name_matches(&state.failing_removes, &name) {
			return Err(Error::Runtime(format!("injected remove failure for {name}")))
		}
		state.container_mut(id)?.removed = true;
		state.events.push(MockEvent::Remove(name));
		Ok(())
	}

	async fn list_containers(&self, key: &str, value: &str) -> Result<Vec<ContainerSummary>> {
		Ok(self
			.state
			.lock()
			.containers
			.iter()
			.filter(|c| !c.removed && c.spec.labels.get(key).map(String::as_str) == Some(value))
			.map(|c| ContainerSummary {
				id: c.id.clone(),
				name: c.spec.name.clone(),
				running: c.status == MockStatus::Running,
			})
			.collect())
	}

	async fn read_volume_file(&self, volume: &str, path: &str) -> Result<Vec<u8>> {
		let mut state = self.state.lock();
		state.events.push(MockEvent::ReadFile { volume: volume.into(), path: path.into() });
		state
			.volumes
			.get(volume)
			.and_then(|v| v.files.get(path).cloned())
			.ok_or_else(|| Error::FileNotFound { volume: volume.into(), path: path.into() })
	}

	async fn write_volume_file(&self, volume: &str, path: &str, content: &[u8]) -> Result<()> {
		let mut state = self.state.lock();
		let Some(target) = state.volumes.get_mut(volume) else {
			return Err(Error::Runtime(format!("no such volume: {volume}")))
		};
		target.files.insert(path.into(), content.to_vec());
		state.events.push(MockEvent::WriteFile { volume: volume.into(), path: path.into() });
		Ok(())
	}
}
