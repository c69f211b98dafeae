//! Persistence for the hikka userbot runtime.
//!
//! Two stores live here:
//!
//! - [`ConfigStore`]: owner → key → JSON value, mirrored to
//!   `<root>/config-<id>.json` on every write.
//! - [`AssetChannelManager`]: blob storage on a private
//!   `hikka-<id>-assets` channel, addressed by message id.
//!
//! [`Database`] wires both together for one authenticated account.

pub mod assets;
pub mod client;
pub mod database;
pub mod error;
pub mod memory;
pub mod store;

pub use {
    assets::{AssetChannelManager, asset_channel_title},
    client::MessagingClient,
    database::Database,
    error::{Error, Result},
    store::{ConfigStore, Owners, config_path},
};
