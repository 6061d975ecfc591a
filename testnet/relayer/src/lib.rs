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

//! Drives the `rly` IBC relayer against networks running on the test network.
//!
//! Configuration, key management, linking and packet clearing each run as a one-shot job
//! container sharing the relayer home volume. Relaying itself runs in one long lived container
//! per [`Relayer`].

pub mod config;
mod error;
mod relayer;

pub use config::{RelayerChainConfig, RelayerChainConfigValue};
pub use error::{Error, Result};
pub use relayer::{Relayer, RELAYER_HOME, RELAYER_REPOSITORY, RELAYER_VERSION, STOP_TIMEOUT};

/// Log target for this crate.
pub const LOG_TARGET: &str = "testnet::relayer";
