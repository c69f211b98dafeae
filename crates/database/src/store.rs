use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use {
    hikka_common::types::SelfIdentity,
    serde::de::DeserializeOwned,
    serde_json::{Map, Value},
    tracing::{debug, error, warn},
};

use crate::Result;

/// owner → key → value.
pub type Owners = BTreeMap<String, Map<String, Value>>;

/// Path of the config file for an account under `root`.
pub fn config_path(root: &Path, identity_id: i64) -> PathBuf {
    root.join(format!("config-{identity_id}.json"))
}

/// JSON file-backed key-value store, namespaced by owner.
///
/// Every [`set`](Self::set) rewrites the whole file synchronously. Read and
/// write failures are logged and never surface as errors: a missing or
/// corrupt file simply means "no configuration yet".
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<Owners>,
}

impl ConfigStore {
    /// Open the store for `identity` under the installation root and load it.
    pub fn init(root: impl AsRef<Path>, identity: &SelfIdentity) -> Self {
        Self::open(config_path(root.as_ref(), identity.id))
    }

    /// Open a store at an explicit path and load it.
    pub fn open(path: PathBuf) -> Self {
        let store = Self {
            path,
            data: RwLock::new(Owners::new()),
        };
        store.read();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload from disk.
    ///
    /// Owners present in the file replace their in-memory counterparts;
    /// owners only present in memory are kept. Returns what was parsed,
    /// or an empty map if the file is missing or malformed.
    pub fn read(&self) -> Owners {
        match load_file(&self.path) {
            Ok(parsed) => {
                let mut data = self.write_data();
                for (owner, values) in &parsed {
                    data.insert(owner.clone(), values.clone());
                }
                debug!(path = %self.path.display(), owners = parsed.len(), "config loaded");
                parsed
            },
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "config read failed, starting with an empty store"
                );
                Owners::new()
            },
        }
    }

    /// Write the whole store to disk. Returns `false` (and logs) on failure.
    pub fn save(&self) -> bool {
        let data = self.read_data();
        match write_file(&self.path, &data) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "config save failed");
                false
            },
        }
    }

    pub fn get(&self, owner: &str, key: &str) -> Option<Value> {
        self.read_data()
            .get(owner)
            .and_then(|values| values.get(key))
            .cloned()
    }

    pub fn get_or(&self, owner: &str, key: &str, default: impl Into<Value>) -> Value {
        self.get(owner, key).unwrap_or_else(|| default.into())
    }

    /// Typed lookup. `None` when absent or when the value has another shape.
    pub fn get_as<T: DeserializeOwned>(&self, owner: &str, key: &str) -> Option<T> {
        let value = self.get(owner, key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(owner, key, error = %e, "config value has unexpected type");
                None
            },
        }
    }

    /// Assign `value` and persist. The return value is the result of [`save`](Self::save).
    pub fn set(&self, owner: &str, key: &str, value: impl Into<Value>) -> bool {
        self.write_data()
            .entry(owner.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self.save()
    }

    pub fn owners(&self) -> Vec<String> {
        self.read_data().keys().cloned().collect()
    }

    /// Copy of the full in-memory state.
    pub fn snapshot(&self) -> Owners {
        self.read_data().clone()
    }

    fn read_data(&self) -> RwLockReadGuard<'_, Owners> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_data(&self) -> RwLockWriteGuard<'_, Owners> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("owners", &self.read_data().len())
            .finish()
    }
}

fn load_file(path: &Path) -> Result<Owners> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_file(path: &Path, data: &Owners) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::init(dir.path(), &SelfIdentity::new(42))
    }

    #[test]
    fn path_is_scoped_by_identity() {
        let root = Path::new("/opt/hikka");
        assert_eq!(
            config_path(root, 42),
            PathBuf::from("/opt/hikka/config-42.json")
        );
        assert_ne!(config_path(root, 42), config_path(root, 43));
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.set("weather", "city", "Paris"));
        assert_eq!(store.get("weather", "city"), Some(json!("Paris")));
        assert_eq!(store.get_or("weather", "country", "N/A"), json!("N/A"));
    }

    #[test]
    fn set_writes_nested_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "city", "Paris");

        let raw = fs::read_to_string(dir.path().join("config-42.json")).unwrap();
        let on_disk: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, json!({"weather": {"city": "Paris"}}));
    }

    #[rstest]
    #[case("ghost", "key")]
    #[case("weather", "ghost")]
    fn get_missing_returns_default(#[case] owner: &str, #[case] key: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "city", "Paris");

        assert_eq!(store.get(owner, key), None);
        assert_eq!(store.get_or(owner, key, Value::Null), Value::Null);
        assert_eq!(store.get_or(owner, key, 7), json!(7));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let expected = {
            let store = store_in(&dir);
            store.set("weather", "city", "Paris");
            store.set("weather", "units", json!({"temp": "C", "precision": 1}));
            store.set("loader", "modules", json!(["a.py", "b.py"]));
            store.set("loader", "enabled", true);
            store.snapshot()
        };

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.snapshot(), expected);
    }

    #[test]
    fn missing_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.snapshot().is_empty());
        assert!(store.read().is_empty());
    }

    #[rstest]
    #[case(b"not json at all".as_slice())]
    #[case(b"{\"weather\": ".as_slice())]
    #[case(b"[1, 2, 3]".as_slice())]
    #[case(b"{\"weather\": 5}".as_slice())]
    #[case(b"\xff\xfe\x00".as_slice())]
    fn corrupt_file_gives_empty_store(#[case] contents: &[u8]) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config-42.json"), contents).unwrap();

        let store = store_in(&dir);
        assert!(store.snapshot().is_empty());
        // The store stays usable and a write repairs the file.
        assert!(store.set("weather", "city", "Paris"));
        assert_eq!(store_in(&dir).get("weather", "city"), Some(json!("Paris")));
    }

    #[test]
    fn read_overwrites_owners_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "city", "Paris");

        fs::write(
            store.path(),
            r#"{"weather": {"country": "FR"}, "notes": {"x": 1}}"#,
        )
        .unwrap();
        let parsed = store.read();

        assert_eq!(parsed.len(), 2);
        // Owner replaced wholesale, not merged key by key.
        assert_eq!(store.get("weather", "city"), None);
        assert_eq!(store.get("weather", "country"), Some(json!("FR")));
        assert_eq!(store.get("notes", "x"), Some(json!(1)));
    }

    #[test]
    fn failed_read_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "city", "Paris");

        fs::write(store.path(), "garbage").unwrap();
        assert!(store.read().is_empty());
        assert_eq!(store.get("weather", "city"), Some(json!("Paris")));
    }

    #[test]
    fn save_failure_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("config-42.json");
        fs::create_dir(&path).unwrap();

        let store = ConfigStore::open(path);
        assert!(!store.set("weather", "city", "Paris"));
        // Memory stays authoritative.
        assert_eq!(store.get("weather", "city"), Some(json!("Paris")));
    }

    #[test]
    fn get_as_typed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "days", 3);
        store.set("weather", "city", "Paris");

        assert_eq!(store.get_as::<u32>("weather", "days"), Some(3));
        assert_eq!(store.get_as::<u32>("weather", "city"), None);
        assert_eq!(store.get_as::<String>("weather", "nope"), None);
    }

    #[test]
    fn returned_values_are_copies() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("loader", "modules", json!(["a.py"]));

        let mut modules = store.get("loader", "modules").unwrap();
        modules.as_array_mut().unwrap().push(json!("b.py"));

        assert_eq!(store.get("loader", "modules"), Some(json!(["a.py"])));
    }

    #[test]
    fn owners_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("weather", "city", "Paris");
        store.set("loader", "enabled", true);
        assert_eq!(store.owners(), vec!["loader", "weather"]);
    }

    #[test]
    fn debug_hides_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("secrets", "token", "hunter2");
        let rendered = format!("{store:?}");
        assert!(rendered.contains("config-42.json"));
        assert!(!rendered.contains("hunter2"));
    }
}
