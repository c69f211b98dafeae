//! Configuration loading for the hikka runtime.
//!
//! Config files: `hikka.toml`, `hikka.yaml`, `hikka.yml` or `hikka.json`,
//! searched in `./` then `~/.config/hikka/`.
//!
//! `HIKKA_DATA_DIR` overrides the installation root that holds the
//! per-identity `config-<id>.json` files.

pub mod loader;
pub mod schema;

pub use {
    loader::{DATA_DIR_ENV, config_dir, discover_and_load, load_config, resolve_data_dir},
    schema::{ARCHIVE_FOLDER_ID, AssetsConfig, HikkaConfig},
};
