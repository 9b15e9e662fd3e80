//! # NinjaZZZ
//!
//! Wallet plugin core: the permission manifest the host installs, and a
//! typed, asynchronous bridge for reaching host-owned state.
//!
//! The plugin never touches the wallet's store directly. Every read and
//! write is a request sent over a [`bridge::Transport`] and answered by the
//! host, which checks it against the permissions granted at install time.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ninjazzz::bridge::{BridgeClient, channel};
//! use ninjazzz::host::MemoryHost;
//! use ninjazzz::manifest::{EXTENSION_ID, PluginManifest};
//! use ninjazzz::services::CatchStorage;
//!
//! let host = Arc::new(MemoryHost::install(EXTENSION_ID, &PluginManifest::ninjazzz())?);
//! let (transport, endpoint) = channel(16);
//! endpoint.spawn(host);
//!
//! let bridge = Arc::new(BridgeClient::new(EXTENSION_ID, transport));
//! let catches = CatchStorage::new(bridge).list(Some("TATNE7...")).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the `ninjazzz` binary's command module.

pub mod bridge;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod manifest;
pub mod services;
pub mod types;
