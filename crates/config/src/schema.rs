//! Config schema types for the persistence layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Telegram's archive folder.
pub const ARCHIVE_FOLDER_ID: i32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HikkaConfig {
    /// Installation root holding `config-<id>.json`. Platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub assets: AssetsConfig,
}

/// Settings for the remote asset channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Description set on the channel when it is created.
    pub description: String,
    /// Dialog folder the freshly created channel is moved into.
    pub folder_id: i32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            description: "🌆 Your Hikka assets will be stored here".into(),
            folder_id: ARCHIVE_FOLDER_ID,
        }
    }
}
