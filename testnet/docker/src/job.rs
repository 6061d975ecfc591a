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

//! One-shot jobs: containers created to run a single command to completion and then removed.

use crate::{naming, ContainerSpec, Environment, Error, Result, LOG_TARGET};
use testnet_primitives::DockerImage;

/// Number of trailing log lines collected from a job.
pub const JOB_LOG_TAIL: usize = 50;

/// Where helper jobs mount the volume they operate on.
pub const VOLUME_MOUNT_PATH: &str = "/mnt/dockervolume";

/// Exit code reported when a job never produced an exit status.
pub const NO_EXIT_CODE: i64 = -1;

/// Outcome of a one-shot job. Only lives as long as the call that produced it.
#[derive(Debug)]
pub struct JobResult {
	/// Name of the job container.
	pub job: String,
	pub exit_code: i64,
	pub stdout: String,
	pub stderr: String,
	/// Transport or runtime failure while running the job.
	pub error: Option<Error>,
}

/// Output of a job that ran successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
	pub stdout: String,
	pub stderr: String,
}

impl JobResult {
	/// Fold the exit code and any transport error into a single result.
	///
	/// Captured stdout/stderr are carried verbatim in the error.
	pub fn into_result(self) -> Result<JobOutput> {
		let JobResult { job, exit_code, stdout, stderr, error } = self;
		if let Some(source) = error {
			return Err(Error::JobTransport { job, stdout, stderr, source: Box::new(source) })
		}
		if exit_code != 0 {
			return Err(Error::JobFailed { job, exit_code, stdout, stderr })
		}
		Ok(JobOutput { stdout, stderr })
	}

	fn failed_before_start(job: String, error: Error) -> Self {
		JobResult {
			job,
			exit_code: NO_EXIT_CODE,
			stdout: String::new(),
			stderr: String::new(),
			error: Some(error),
		}
	}
}

/// Run `spec` as a one-shot job, keeping the last [`JOB_LOG_TAIL`] lines of its output.
///
/// The container is removed whatever the outcome, including cancellation, so job containers never
/// outlive the call.
pub async fn run_job(env: &Environment, spec: ContainerSpec) -> JobResult {
	run(env, spec, Some(JOB_LOG_TAIL)).await
}

/// Like [`run_job`], but keeps the whole output. For commands whose stdout is their product.
pub async fn run_job_full_output(env: &Environment, spec: ContainerSpec) -> JobResult {
	run(env, spec, None).await
}

async fn run(env: &Environment, spec: ContainerSpec, tail: Option<usize>) -> JobResult {
	let job = spec.name.clone();
	let runtime = env.runtime();

	log::info!(
		target: LOG_TARGET,
		"Running command `{}` in container {}",
		spec.cmd.join(" "),
		job,
	);

	if env.cancellation().is_cancelled() {
		return JobResult::failed_before_start(job, Error::Cancelled)
	}
	// Not guarded: a create dropped halfway would leave a container whose id is never learnt.
	let id = match runtime.create_container(&spec).await {
		Ok(id) => id,
		Err(e) => return JobResult::failed_before_start(job, e),
	};

	let outcome = async {
		env.guard(runtime.start_container(&id)).await?;
		env.guard(runtime.wait_container(&id)).await
	}
	.await;

	// Log collection and removal are not guarded: they must run after a cancellation too.
	let logs = match runtime.container_logs(&id, tail).await {
		Ok(logs) => logs,
		Err(e) => {
			log::warn!(target: LOG_TARGET, "Failed to collect logs of job {}: {}", job, e);
			Default::default()
		},
	};
	if let Err(e) = runtime.remove_container(&id).await {
		log::error!(target: LOG_TARGET, "Failed to remove job container {}: {}", job, e);
	}

	log::debug!(target: LOG_TARGET, "Job {}\nstdout:\n{}\nstderr:\n{}", job, logs.stdout, logs.stderr);

	let (exit_code, error) = match outcome {
		Ok(exit_code) => (exit_code, None),
		Err(e) => (NO_EXIT_CODE, Some(e)),
	};
	JobResult { job, exit_code, stdout: logs.stdout, stderr: logs.stderr, error }
}

/// Give ownership of `volume` to the `uid:gid` that `image` runs as.
///
/// Runs `chown` as root in a job container of `image` with the volume mounted.
pub async fn set_volume_owner(
	env: &Environment,
	volume: &str,
	image: &DockerImage,
	owner: &str,
) -> Result<()> {
	let spec = ContainerSpec {
		name: format!(
			"{}-volumeowner-{}",
			naming::sanitize_container_name(env.test_name()),
			naming::random_suffix(5),
		),
		image: image.reference(),
		cmd: vec![
			"chown".into(),
			"-R".into(),
			image.uid_gid().into(),
			VOLUME_MOUNT_PATH.into(),
		],
		user: Some("0:0".into()),
		binds: vec![format!("{volume}:{VOLUME_MOUNT_PATH}")],
		labels: env.labels(owner),
		reset_entrypoint: true,
		..Default::default()
	};

	run_job(env, spec).await.into_result().map(|_| ())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockExit, MockRuntime};
	use crate::CLEANUP_LABEL;
	use assert_matches::assert_matches;
	use std::sync::Arc;
	use tokio_util::sync::CancellationToken;

	fn job_spec(env: &Environment, name: &str, cmd: &[&str]) -> ContainerSpec {
		ContainerSpec {
			name: name.into(),
			image: "ghcr.io/cosmos/relayer:v2.0.0-beta4".into(),
			cmd: cmd.iter().map(|s| s.to_string()).collect(),
			labels: env.labels("rly"),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn successful_job_is_removed() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.respond("config init", MockExit::success("initialized"));
		let env = Environment::new(runtime.clone(), "net", "jobs");

		let output = run_job(&env, job_spec(&env, "rly-init-abc", &["rly", "config", "init"]))
			.await
			.into_result()
			.unwrap();

		assert_eq!(output.stdout, "initialized");
		assert!(env.runtime().list_containers(CLEANUP_LABEL, "jobs").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn failed_job_is_removed_and_keeps_output() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.respond("tx link", MockExit::failure(1, "partial", "no path"));
		let env = Environment::new(runtime.clone(), "net", "jobs");

		let result = run_job(&env, job_spec(&env, "rly-link-abc", &["rly", "tx", "link", "p"]))
			.await
			.into_result();

		assert_matches!(
			result,
			Err(Error::JobFailed { exit_code: 1, ref stdout, ref stderr, .. })
				if stdout == "partial" && stderr == "no path"
		);
		assert!(runtime.live_containers().is_empty());
	}

	#[tokio::test]
	async fn output_is_tailed_unless_requested_in_full() {
		let runtime = Arc::new(MockRuntime::new());
		let spec_lines: String = (0..120).map(|i| format!("line {i}\n")).collect();
		runtime.respond("build-spec", MockExit::success(&spec_lines));
		let env = Environment::new(runtime.clone(), "net", "jobs");
		let cmd = ["polkadot", "build-spec"];

		let tailed = run_job(&env, job_spec(&env, "spec-a", &cmd)).await.into_result().unwrap();
		let full =
			run_job_full_output(&env, job_spec(&env, "spec-b", &cmd)).await.into_result().unwrap();

		assert_eq!(tailed.stdout.lines().count(), JOB_LOG_TAIL);
		assert!(tailed.stdout.starts_with("line 70\n"));
		assert_eq!(full.stdout, spec_lines);
	}

	#[tokio::test]
	async fn start_failure_is_a_transport_error_and_cleans_up() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.fail_start("rly-broken");
		let env = Environment::new(runtime.clone(), "net", "jobs");

		let result = run_job(&env, job_spec(&env, "rly-broken-abc", &["rly", "version"]))
			.await
			.into_result();

		assert_matches!(result, Err(Error::JobTransport { .. }));
		assert!(runtime.live_containers().is_empty());
	}

	#[tokio::test]
	async fn cancelled_job_is_removed() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.hang_on_start("rly-slow");
		let cancel = CancellationToken::new();
		let env = Environment::new(runtime.clone(), "net", "jobs").with_cancellation(cancel.clone());

		let job = tokio::spawn({
			let env = env.clone();
			async move { run_job(&env, job_spec(&env, "rly-slow-abc", &["rly", "start"])).await }
		});
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		cancel.cancel();

		let result = job.await.unwrap();
		assert!(result.error.as_ref().map_or(false, Error::is_cancelled));
		assert!(runtime.live_containers().is_empty());
	}

	#[tokio::test]
	async fn job_cancelled_while_being_created_is_removed() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.delay_create("rly-link", std::time::Duration::from_millis(100));
		let cancel = CancellationToken::new();
		let env = Environment::new(runtime.clone(), "net", "jobs").with_cancellation(cancel.clone());

		let job = tokio::spawn({
			let env = env.clone();
			async move { run_job(&env, job_spec(&env, "rly-link-abc", &["rly", "tx", "link"])).await }
		});
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		cancel.cancel();

		let result = job.await.unwrap();
		assert!(result.error.as_ref().map_or(false, Error::is_cancelled));
		assert!(runtime.live_containers().is_empty());
		assert_eq!(runtime.invocations().len(), 1);
	}

	#[tokio::test]
	async fn job_is_not_created_after_cancellation() {
		let runtime = Arc::new(MockRuntime::new());
		let cancel = CancellationToken::new();
		cancel.cancel();
		let env = Environment::new(runtime.clone(), "net", "jobs").with_cancellation(cancel);

		let result = run_job(&env, job_spec(&env, "rly-late-abc", &["rly", "version"])).await;

		assert_matches!(result.error, Some(Error::Cancelled));
		assert!(runtime.invocations().is_empty());
	}

	#[tokio::test]
	async fn volume_owner_runs_chown_as_root() {
		let runtime = Arc::new(MockRuntime::new());
		let env = Environment::new(runtime.clone(), "net", "owner");
		let image = DockerImage::new("parity/polkadot", "v0.9.19").with_uid_gid("1000:1000");

		set_volume_owner(&env, "vol-1", &image, "relaychain-0").await.unwrap();

		let invocation = runtime.invocations().pop().unwrap();
		assert_eq!(invocation.cmd, vec!["chown", "-R", "1000:1000", VOLUME_MOUNT_PATH]);
		assert_eq!(invocation.user.as_deref(), Some("0:0"));
		assert_eq!(invocation.binds, vec![format!("vol-1:{VOLUME_MOUNT_PATH}")]);
	}

	#[tokio::test]
	async fn volume_owner_failure_is_reported() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.respond("chown", MockExit::failure(1, "", "Operation not permitted"));
		let env = Environment::new(runtime.clone(), "net", "owner");
		let image = DockerImage::new("parity/polkadot", "v0.9.19");

		assert_matches!(
			set_volume_owner(&env, "vol-1", &image, "relaychain-0").await,
			Err(Error::JobFailed { .. })
		);
	}
}
