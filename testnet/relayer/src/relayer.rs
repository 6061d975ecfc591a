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

use crate::{config::RelayerChainConfig, Error, Result, LOG_TARGET};
use std::time::Duration;
use testnet_docker::{
	naming, run_job, set_volume_owner, ContainerSpec, ContainerSummary, Environment, JobOutput,
	NODE_OWNER_LABEL,
};
use testnet_primitives::{ChainConfig, ChannelOutput, DockerImage, RelayerWallet};

pub const RELAYER_REPOSITORY: &str = "ghcr.io/cosmos/relayer";
pub const RELAYER_VERSION: &str = "v2.0.0-beta4";

/// Relayer home inside its containers; the relayer volume is mounted here.
pub const RELAYER_HOME: &str = "/home/relayer";

/// Grace period given to the relay process before it is killed.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Log lines of the relay process kept for diagnostics when it is stopped.
const STOP_LOG_TAIL: usize = 50;

/// Written by `rly config init`; its presence means the home is initialized.
const CONFIG_FILE: &str = "config/config.yaml";

/// The `rly` binary, run in containers sharing one home volume.
pub struct Relayer {
	env: Environment,
	image: DockerImage,
	volume: String,
	/// Id and name of the long running relay container.
	container: Option<(String, String)>,
}

impl Relayer {
	/// Relayer running the default image.
	pub async fn new(env: Environment) -> Result<Self> {
		Self::with_image(env, DockerImage::new(RELAYER_REPOSITORY, RELAYER_VERSION)).await
	}

	/// Create the relayer home volume and make it writable for `image`.
	pub async fn with_image(env: Environment, image: DockerImage) -> Result<Self> {
		let name = relayer_name(env.test_name());
		env.pull_images([&image]).await;

		let volume = env.create_volume(&name).await.map_err(Error::Runtime)?;
		set_volume_owner(&env, &volume, &image, &name).await.map_err(Error::Runtime)?;
		Ok(Self { env, image, volume, container: None })
	}

	/// Container name prefix of everything this relayer runs.
	pub fn name(&self) -> String {
		relayer_name(self.env.test_name())
	}

	/// Hostname of the relay process for `path`.
	pub fn host_name(&self, path: &str) -> String {
		naming::condense_host_name(&format!("{}-{path}", self.name()))
	}

	pub fn node_home(&self) -> &'static str {
		RELAYER_HOME
	}

	pub fn volume_name(&self) -> &str {
		&self.volume
	}

	pub fn image(&self) -> &DockerImage {
		&self.image
	}

	fn container_spec(&self, name: String, hostname: String, cmd: Vec<String>) -> ContainerSpec {
		ContainerSpec {
			name,
			hostname,
			image: self.image.reference(),
			cmd,
			user: Some(self.image.uid_gid().into()),
			binds: vec![format!("{}:{RELAYER_HOME}", self.volume)],
			network_id: Some(self.env.network_id().into()),
			labels: self.env.labels(&self.name()),
			reset_entrypoint: true,
			..Default::default()
		}
	}

	/// `rly <args> --home <home>`.
	fn command(&self, args: &[&str]) -> Vec<String> {
		std::iter::once("rly")
			.chain(args.iter().copied())
			.chain(["--home", RELAYER_HOME])
			.map(String::from)
			.collect()
	}

	/// Run `rly <args>` in a one-shot container named after `op`.
	async fn job(&self, op: &str, args: &[&str]) -> Result<JobOutput> {
		let name = naming::sanitize_container_name(&format!(
			"{}-{op}-{}",
			self.name(),
			naming::random_suffix(3)
		));
		let hostname = naming::condense_host_name(&name);
		let spec = self.container_spec(name, hostname, self.command(args));
		run_job(&self.env, spec).await.into_result().map_err(Error::JobExecution)
	}

	/// Register `config` with the relayer, initializing the relayer home on first use.
	pub async fn add_chain_configuration(
		&self,
		config: &ChainConfig,
		key_name: &str,
		rpc_addr: &str,
		grpc_addr: &str,
	) -> Result<()> {
		if !self.is_initialized().await? {
			self.job("config-init", &["config", "init"]).await?;
		}

		let file = format!("{}.json", config.chain_id);
		let content =
			serde_json::to_vec(&RelayerChainConfig::new(config, key_name, rpc_addr, grpc_addr))?;
		self.env
			.guard(self.env.runtime().write_volume_file(&self.volume, &file, &content))
			.await
			.map_err(Error::Runtime)?;

		let path = format!("{RELAYER_HOME}/{file}");
		self.job("chains-add", &["chains", "add", "-f", &path]).await.map(|_| ())
	}

	async fn is_initialized(&self) -> Result<bool> {
		match self.env.guard(self.env.runtime().read_volume_file(&self.volume, CONFIG_FILE)).await {
			Ok(_) => Ok(true),
			Err(testnet_docker::Error::FileNotFound { .. }) => Ok(false),
			Err(e) => Err(Error::Runtime(e)),
		}
	}

	pub async fn generate_path(
		&self,
		src_chain_id: &str,
		dst_chain_id: &str,
		path: &str,
	) -> Result<()> {
		self.job("paths-new", &["paths", "new", src_chain_id, dst_chain_id, path]).await.map(|_| ())
	}

	/// Create clients, connection and channel for `path`.
	pub async fn link_path(&self, path: &str) -> Result<()> {
		self.job("link", &["tx", "link", path]).await.map(|_| ())
	}

	pub async fn update_clients(&self, path: &str) -> Result<()> {
		self.job("update-clients", &["tx", "update-clients", path]).await.map(|_| ())
	}

	/// Relay the packets pending on `channel_id` of `path`.
	pub async fn clear_queue(&self, path: &str, channel_id: &str) -> Result<()> {
		self.job("relay-pkts", &["tx", "relay-pkts", path, channel_id]).await.map(|_| ())
	}

	/// Channels of `chain_id`. Lines of output that are not channel records are skipped.
	pub async fn get_channels(&self, chain_id: &str) -> Result<Vec<ChannelOutput>> {
		let output = self.job("channels", &["q", "channels", chain_id]).await?;
		Ok(parse_channels(&output.stdout))
	}

	/// Generate a key for `chain_id`.
	pub async fn add_key(&self, chain_id: &str, key_name: &str) -> Result<RelayerWallet> {
		let output = self.job("keys-add", &["keys", "add", chain_id, key_name]).await?;
		Ok(serde_json::from_str(output.stdout.trim())?)
	}

	pub async fn restore_key(&self, chain_id: &str, key_name: &str, mnemonic: &str) -> Result<()> {
		self.job("keys-restore", &["keys", "restore", chain_id, key_name, mnemonic])
			.await
			.map(|_| ())
	}

	/// Start relaying on `path` in a long running container.
	pub async fn start_relayer(&mut self, path: &str) -> Result<()> {
		if let Some((_, name)) = &self.container {
			return Err(Error::AlreadyStarted(name.clone()))
		}

		let name = naming::sanitize_container_name(&format!("{}-{path}", self.name()));
		let mut cmd = self.command(&["start", path]);
		cmd.push("--debug".into());
		let spec = self.container_spec(name.clone(), self.host_name(path), cmd);

		log::info!(
			target: LOG_TARGET,
			"Running command `{}` in container {}",
			spec.cmd.join(" "),
			name,
		);
		if self.env.cancellation().is_cancelled() {
			return Err(Error::Runtime(testnet_docker::Error::Cancelled))
		}
		let runtime = self.env.runtime();
		let id = runtime.create_container(&spec).await.map_err(Error::Runtime)?;
		let Err(e) = self.env.guard(runtime.start_container(&id)).await else {
			self.container = Some((id, name));
			return Ok(())
		};

		// A container that never started is removed; it is only tracked if that fails too.
		if let Err(remove) = runtime.remove_container(&id).await {
			log::error!(target: LOG_TARGET, "Failed to remove container {}: {}", name, remove);
			self.container = Some((id, name));
		}
		Err(Error::Runtime(e))
	}

	/// Stop the relay process, log its last output and remove its container.
	pub async fn stop_relayer(&mut self) -> Result<()> {
		let (id, name) = self.container.take().ok_or(Error::NotStarted)?;
		let runtime = self.env.runtime();

		if let Err(e) = self.env.guard(runtime.stop_container(&id, STOP_TIMEOUT)).await {
			self.container = Some((id, name));
			return Err(Error::Runtime(e))
		}
		match runtime.container_logs(&id, Some(STOP_LOG_TAIL)).await {
			Ok(logs) => log::debug!(
				target: LOG_TARGET,
				"Stopped container {}\nstdout:\n{}\nstderr:\n{}",
				name,
				logs.stdout,
				logs.stderr,
			),
			Err(e) => log::warn!(target: LOG_TARGET, "Failed to collect logs of {}: {}", name, e),
		}
		if let Err(e) = runtime.remove_container(&id).await {
			self.container = Some((id, name));
			return Err(Error::Runtime(e))
		}
		Ok(())
	}

	/// One-shot job containers of this relayer that still exist.
	pub async fn active_jobs(&self) -> Result<Vec<ContainerSummary>> {
		let owned = self
			.env
			.guard(self.env.runtime().list_containers(NODE_OWNER_LABEL, &self.name()))
			.await
			.map_err(Error::Runtime)?;
		let relay = self.container.as_ref().map(|(id, _)| id.as_str());
		Ok(owned.into_iter().filter(|c| Some(c.id.as_str()) != relay).collect())
	}
}

fn relayer_name(test_name: &str) -> String {
	format!("rly-{}", naming::sanitize_container_name(test_name))
}

/// Parse newline delimited channel records.
fn parse_channels(stdout: &str) -> Vec<ChannelOutput> {
	stdout
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.filter_map(|line| match serde_json::from_str(line) {
			Ok(channel) => Some(channel),
			Err(e) => {
				log::error!(target: LOG_TARGET, "Failed to parse channel record `{}`: {}", line, e);
				None
			},
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use std::sync::Arc;
	use testnet_docker::testing::{MockEvent, MockExit, MockRuntime};

	const CHANNEL: &str = r#"{"state":"STATE_OPEN","ordering":"ORDER_UNORDERED","counterparty":{"port_id":"transfer","channel_id":"channel-0"},"connection_hops":["connection-0"],"version":"ics20-1","port_id":"transfer","channel_id":"channel-0"}"#;

	async fn relayer(test_name: &str) -> (Arc<MockRuntime>, Relayer) {
		let runtime = Arc::new(MockRuntime::new());
		let env = Environment::new(runtime.clone(), "testnet", test_name);
		let relayer = Relayer::new(env).await.unwrap();
		(runtime, relayer)
	}

	fn chain_config(chain_id: &str) -> ChainConfig {
		ChainConfig {
			chain_type: "polkadot".into(),
			name: "composable".into(),
			chain_id: chain_id.into(),
			images: vec![DockerImage::new("parity/polkadot", "v0.9.19")],
			bin: "polkadot".into(),
			bech32_prefix: "composable".into(),
			denom: "uDOT".into(),
			gas_prices: String::new(),
			gas_adjustment: 0.0,
			trusting_period: String::new(),
			no_host_mount: false,
		}
	}

	fn commands(runtime: &MockRuntime) -> Vec<String> {
		runtime.invocations().iter().map(|spec| spec.cmd.join(" ")).collect()
	}

	#[tokio::test]
	async fn home_is_initialized_once() {
		let (runtime, relayer) = relayer("init").await;

		relayer
			.add_chain_configuration(&chain_config("rococo-local"), "relayer", "http://a:9933", "a:27451")
			.await
			.unwrap();
		runtime.seed_file(relayer.volume_name(), "config/config.yaml", b"global: {}");
		relayer
			.add_chain_configuration(&chain_config("gaia-1"), "relayer", "http://b:26657", "b:9090")
			.await
			.unwrap();

		let commands = commands(&runtime);
		assert_eq!(commands.iter().filter(|cmd| cmd.contains("config init")).count(), 1);
		assert!(commands.contains(&"rly chains add -f /home/relayer/rococo-local.json --home /home/relayer".to_string()));
		assert!(commands.contains(&"rly chains add -f /home/relayer/gaia-1.json --home /home/relayer".to_string()));

		let file = runtime.volume_file(relayer.volume_name(), "rococo-local.json").unwrap();
		let file: RelayerChainConfig = serde_json::from_slice(&file).unwrap();
		assert_eq!(file.value.rpc_addr, "http://a:9933");
		assert_eq!(file.value.key, "relayer");
	}

	#[tokio::test]
	async fn jobs_are_named_and_mount_home() {
		let (runtime, relayer) = relayer("naming").await;

		relayer.link_path("rococo-gaia").await.unwrap();

		let job = runtime.invocations().pop().unwrap();
		assert!(job.name.starts_with("rly-naming-link-"));
		assert_eq!(job.name.len(), "rly-naming-link-".len() + 3);
		assert_eq!(job.cmd, ["rly", "tx", "link", "rococo-gaia", "--home", "/home/relayer"]);
		assert_eq!(job.binds, vec![format!("{}:/home/relayer", relayer.volume_name())]);
		assert_eq!(job.image, "ghcr.io/cosmos/relayer:v2.0.0-beta4");
		assert_eq!(job.network_id.as_deref(), Some("testnet"));
		assert!(job.reset_entrypoint);
	}

	#[tokio::test]
	async fn failed_job_keeps_output_and_leaves_no_container() {
		let (runtime, relayer) = relayer("failure").await;
		runtime.respond("update-clients", MockExit::failure(1, "querying", "client expired"));

		let result = relayer.update_clients("rococo-gaia").await;

		assert_matches!(
			result,
			Err(Error::JobExecution(testnet_docker::Error::JobFailed { exit_code: 1, ref stdout, ref stderr, .. }))
				if stdout == "querying" && stderr == "client expired"
		);
		assert!(relayer.active_jobs().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn no_job_outlives_its_call() {
		let (runtime, relayer) = relayer("cleanup").await;
		runtime.respond("keys add", MockExit::success(r#"{"mnemonic":"abandon","address":"cosmos1xyz"}"#));
		runtime.respond("relay-pkts", MockExit::failure(1, "", "no packets"));

		relayer.generate_path("rococo-local", "gaia-1", "rococo-gaia").await.unwrap();
		relayer.add_key("gaia-1", "relayer").await.unwrap();
		relayer.restore_key("rococo-local", "relayer", "abandon abandon").await.unwrap();
		let _ = relayer.clear_queue("rococo-gaia", "channel-0").await;

		assert!(relayer.active_jobs().await.unwrap().is_empty());
		assert!(runtime.live_containers().is_empty());
	}

	#[tokio::test]
	async fn channels_skip_malformed_records() {
		let (runtime, relayer) = relayer("channels").await;
		runtime.respond("q channels", MockExit::success(format!("{CHANNEL}\nnot json\n\n{CHANNEL}\n")));

		let channels = relayer.get_channels("rococo-local").await.unwrap();

		assert_eq!(channels.len(), 2);
		assert_eq!(channels[0].channel_id, "channel-0");
		assert_eq!(channels[0].counterparty.port_id, "transfer");
	}

	#[tokio::test]
	async fn no_channels_before_linking() {
		let (runtime, relayer) = relayer("unlinked").await;
		runtime.respond("q channels", MockExit::success(""));

		assert!(relayer.get_channels("rococo-local").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn add_key_returns_wallet() {
		let (runtime, relayer) = relayer("keys").await;
		runtime.respond(
			"keys add",
			MockExit::success("{\"mnemonic\":\"abandon ability\",\"address\":\"cosmos1abc\"}\n"),
		);

		let wallet = relayer.add_key("gaia-1", "relayer").await.unwrap();

		assert_eq!(wallet, RelayerWallet { mnemonic: "abandon ability".into(), address: "cosmos1abc".into() });
	}

	#[tokio::test]
	async fn relay_process_lifecycle() {
		let (runtime, mut relayer) = relayer("relay").await;

		relayer.start_relayer("rococo-gaia").await.unwrap();

		assert_eq!(runtime.running_containers(), vec!["rly-relay-rococo-gaia"]);
		let process = runtime.invocations().pop().unwrap();
		assert_eq!(process.hostname, "rly-relay-rococo-gaia");
		assert_eq!(process.cmd.last().map(String::as_str), Some("--debug"));
		assert!(relayer.active_jobs().await.unwrap().is_empty());
		assert_matches!(relayer.start_relayer("rococo-gaia").await, Err(Error::AlreadyStarted(_)));

		relayer.stop_relayer().await.unwrap();

		let events = runtime.events();
		let stop = events.iter().position(|e| *e == MockEvent::Stop("rly-relay-rococo-gaia".into()));
		let remove = events.iter().position(|e| *e == MockEvent::Remove("rly-relay-rococo-gaia".into()));
		assert!(stop.is_some() && stop < remove);
		assert!(runtime.live_containers().is_empty());
		assert_matches!(relayer.stop_relayer().await, Err(Error::NotStarted));
	}

	#[tokio::test]
	async fn relay_container_that_fails_to_start_is_removed() {
		let (runtime, mut relayer) = relayer("flaky").await;
		runtime.fail_start("rly-flaky-rococo-gaia");

		assert_matches!(relayer.start_relayer("rococo-gaia").await, Err(Error::Runtime(_)));

		assert!(runtime.live_containers().is_empty());
		assert_matches!(relayer.stop_relayer().await, Err(Error::NotStarted));
		relayer.start_relayer("rococo-picasso").await.unwrap();
		assert_eq!(runtime.running_containers(), vec!["rly-flaky-rococo-picasso"]);
	}

	#[tokio::test]
	async fn relay_container_is_tracked_until_removed() {
		let (runtime, mut relayer) = relayer("sticky").await;
		runtime.fail_remove("rly-sticky-rococo-gaia");
		relayer.start_relayer("rococo-gaia").await.unwrap();

		assert_matches!(relayer.stop_relayer().await, Err(Error::Runtime(_)));
		assert_matches!(relayer.start_relayer("rococo-gaia").await, Err(Error::AlreadyStarted(_)));
		assert_matches!(relayer.stop_relayer().await, Err(Error::Runtime(_)));
		assert_eq!(runtime.live_containers().len(), 1);
	}

	#[test]
	fn parse_channels_ignores_blank_lines() {
		assert!(parse_channels("\n  \n").is_empty());
		assert_eq!(parse_channels(CHANNEL).len(), 1);
	}
}
