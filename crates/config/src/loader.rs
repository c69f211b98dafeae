use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::HikkaConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["hikka.toml", "hikka.yaml", "hikka.yml", "hikka.json"];

/// Environment variable overriding the installation root.
pub const DATA_DIR_ENV: &str = "HIKKA_DATA_DIR";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<HikkaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hikka.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/hikka/hikka.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HikkaConfig::default()` if no file is found or it fails to parse.
pub fn discover_and_load() -> HikkaConfig {
    let mut roots = vec![PathBuf::from(".")];
    roots.extend(config_dir());
    discover_and_load_from(&roots)
}

/// Load the first config file found under `roots`, searched in order.
fn discover_and_load_from(roots: &[PathBuf]) -> HikkaConfig {
    let Some(path) = find_config_file(roots) else {
        debug!("no config file found, using defaults");
        return HikkaConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            HikkaConfig::default()
        },
    }
}

fn find_config_file(roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().find_map(|root| {
        CONFIG_FILENAMES
            .iter()
            .map(|name| root.join(name))
            .find(|p| p.exists())
    })
}

/// Returns the user-global config directory (`~/.config/hikka/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hikka").map(|d| d.config_dir().to_path_buf())
}

/// Installation root for per-identity config files.
///
/// `HIKKA_DATA_DIR` wins over `config.data_dir`, which wins over the
/// platform data directory. Falls back to the working directory.
pub fn resolve_data_dir(config: &HikkaConfig) -> PathBuf {
    resolve_data_dir_with(config, |name| std::env::var(name).ok())
}

fn resolve_data_dir_with(config: &HikkaConfig, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    directories::ProjectDirs::from("", "", "hikka")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<HikkaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::ARCHIVE_FOLDER_ID, rstest::rstest};

    #[test]
    fn local_config_wins_over_global() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        std::fs::write(local.path().join("hikka.toml"), "data_dir = \"/local\"\n").unwrap();
        std::fs::write(global.path().join("hikka.toml"), "data_dir = \"/global\"\n").unwrap();

        let roots = [local.path().to_path_buf(), global.path().to_path_buf()];
        let cfg = discover_and_load_from(&roots);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/local")));
    }

    #[test]
    fn global_config_used_when_no_local() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        std::fs::write(global.path().join("hikka.yaml"), "data_dir: /global\n").unwrap();

        let roots = [local.path().to_path_buf(), global.path().to_path_buf()];
        let cfg = discover_and_load_from(&roots);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/global")));
    }

    #[test]
    fn file_names_checked_in_order() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("hikka.json"), r#"{"data_dir": "/json"}"#).unwrap();
        std::fs::write(root.path().join("hikka.toml"), "data_dir = \"/toml\"\n").unwrap();

        let cfg = discover_and_load_from(&[root.path().to_path_buf()]);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/toml")));
    }

    #[test]
    fn no_config_file_gives_defaults() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();

        let roots = [local.path().to_path_buf(), global.path().to_path_buf()];
        assert_eq!(discover_and_load_from(&roots), HikkaConfig::default());
    }

    #[test]
    fn unparsable_config_gives_defaults() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        std::fs::write(local.path().join("hikka.toml"), "data_dir = [unclosed").unwrap();
        // The broken local file is still the one picked; global is not consulted.
        std::fs::write(global.path().join("hikka.toml"), "data_dir = \"/global\"\n").unwrap();

        let roots = [local.path().to_path_buf(), global.path().to_path_buf()];
        assert_eq!(discover_and_load_from(&roots), HikkaConfig::default());
    }

    #[rstest]
    #[case("hikka.toml", "data_dir = \"/srv/hikka\"\n[assets]\nfolder_id = 0\n")]
    #[case("hikka.yaml", "data_dir: /srv/hikka\nassets:\n  folder_id: 0\n")]
    #[case("hikka.json", r#"{"data_dir": "/srv/hikka", "assets": {"folder_id": 0}}"#)]
    fn loads_every_format(#[case] name: &str, #[case] body: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/srv/hikka")));
        assert_eq!(cfg.assets.folder_id, 0);
        // Unspecified fields keep their defaults.
        assert!(cfg.assets.description.contains("assets"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hikka.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("hikka.toml")).is_err());
    }

    #[test]
    fn default_moves_channel_to_archive() {
        assert_eq!(HikkaConfig::default().assets.folder_id, ARCHIVE_FOLDER_ID);
    }

    #[test]
    fn env_override_wins() {
        let cfg = HikkaConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let dir = resolve_data_dir_with(&cfg, |name| {
            (name == DATA_DIR_ENV).then(|| "/from/env".to_string())
        });
        assert_eq!(dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn configured_dir_used_without_env() {
        let cfg = HikkaConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        assert_eq!(
            resolve_data_dir_with(&cfg, |_| None),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn blank_env_is_ignored() {
        let cfg = HikkaConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        assert_eq!(
            resolve_data_dir_with(&cfg, |_| Some("  ".into())),
            PathBuf::from("/from/config")
        );
    }
}
