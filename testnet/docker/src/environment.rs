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

//! The runtime handle shared by everything that belongs to one test run.

use crate::{ContainerRuntime, Error, Result, CLEANUP_LABEL, LOG_TARGET, NODE_OWNER_LABEL};
use std::{collections::BTreeMap, future::Future, sync::Arc};
use testnet_primitives::DockerImage;
use tokio_util::sync::CancellationToken;

/// Container runtime, network and test identity, plus the caller's cancellation token.
///
/// Cheap to clone: every node and job holds its own copy.
#[derive(Clone)]
pub struct Environment {
	runtime: Arc<dyn ContainerRuntime>,
	network_id: String,
	test_name: String,
	cancel: CancellationToken,
}

impl Environment {
	pub fn new(
		runtime: Arc<dyn ContainerRuntime>,
		network_id: impl Into<String>,
		test_name: impl Into<String>,
	) -> Self {
		Self {
			runtime,
			network_id: network_id.into(),
			test_name: test_name.into(),
			cancel: CancellationToken::new(),
		}
	}

	/// Use `cancel` for every call issued through this environment.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn runtime(&self) -> &dyn ContainerRuntime {
		&*self.runtime
	}

	pub fn network_id(&self) -> &str {
		&self.network_id
	}

	pub fn test_name(&self) -> &str {
		&self.test_name
	}

	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancel
	}

	/// Drive `call` unless the environment is cancelled first.
	pub async fn guard<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			res = call => res,
		}
	}

	/// Labels identifying a resource owned by `owner` within this test run.
	pub fn labels(&self, owner: &str) -> BTreeMap<String, String> {
		BTreeMap::from([
			(CLEANUP_LABEL.to_string(), self.test_name.clone()),
			(NODE_OWNER_LABEL.to_string(), owner.to_string()),
		])
	}

	/// Create a volume labelled for `owner`.
	pub async fn create_volume(&self, owner: &str) -> Result<String> {
		log::info!(target: LOG_TARGET, "Creating volume for {}", owner);
		self.guard(self.runtime.create_volume(self.labels(owner))).await
	}

	/// Pull every distinct image once.
	///
	/// Failures are only logged: a locally cached image still satisfies container creation.
	pub async fn pull_images<'a>(&self, images: impl IntoIterator<Item = &'a DockerImage>) {
		let mut pulled = Vec::<&DockerImage>::new();
		for image in images {
			if pulled.contains(&image) {
				continue
			}
			pulled.push(image);

			log::info!(target: LOG_TARGET, "Pulling image {}", image.reference());
			if let Err(e) = self.guard(self.runtime.pull_image(image)).await {
				log::error!(
					target: LOG_TARGET,
					"Failed to pull image {} (tag {}): {}",
					image.repository,
					image.version,
					e,
				);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockRuntime;
	use assert_matches::assert_matches;

	#[tokio::test]
	async fn pulls_each_image_once_and_ignores_failures() {
		let runtime = Arc::new(MockRuntime::new());
		runtime.fail_pull("parity/polkadot:broken");
		let env = Environment::new(runtime.clone(), "net", "pulls");

		let good = DockerImage::new("parity/polkadot", "v0.9.19");
		let broken = DockerImage::new("parity/polkadot", "broken");
		env.pull_images([&good, &broken, &good]).await;

		assert_eq!(runtime.pull_attempts(), vec![good.reference(), broken.reference()]);
	}

	#[tokio::test]
	async fn volumes_carry_cleanup_and_owner_labels() {
		let runtime = Arc::new(MockRuntime::new());
		let env = Environment::new(runtime.clone(), "net", "labels");

		let volume = env.create_volume("relaychain-0").await.unwrap();

		let labels = runtime.volume_labels(&volume).unwrap();
		assert_eq!(labels.get(CLEANUP_LABEL).map(String::as_str), Some("labels"));
		assert_eq!(labels.get(NODE_OWNER_LABEL).map(String::as_str), Some("relaychain-0"));
	}

	#[tokio::test]
	async fn cancelled_environment_rejects_calls() {
		let runtime = Arc::new(MockRuntime::new());
		let cancel = CancellationToken::new();
		let env = Environment::new(runtime.clone(), "net", "cancel").with_cancellation(cancel.clone());

		cancel.cancel();

		assert_matches!(env.create_volume("node").await, Err(Error::Cancelled));
		assert!(runtime.volumes().is_empty());
	}
}
