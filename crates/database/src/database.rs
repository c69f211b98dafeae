use std::{path::Path, sync::Arc};

use {
    hikka_common::types::SelfIdentity,
    hikka_config::{AssetsConfig, HikkaConfig},
    tracing::info,
};

use crate::{Result, assets::AssetChannelManager, client::MessagingClient, store::ConfigStore};

/// Persistence for one logged-in account: the config store plus the
/// remote asset channel.
pub struct Database {
    identity: SelfIdentity,
    store: ConfigStore,
    assets: AssetChannelManager,
}

impl Database {
    /// Ask the client who we are, then open the store under the configured
    /// installation root.
    pub async fn init(client: Arc<dyn MessagingClient>, config: &HikkaConfig) -> Result<Self> {
        let root = hikka_config::resolve_data_dir(config);
        Self::init_in(client, &root, config.assets.clone()).await
    }

    /// Like [`init`](Self::init) with an explicit installation root.
    pub async fn init_in(
        client: Arc<dyn MessagingClient>,
        root: &Path,
        assets: AssetsConfig,
    ) -> Result<Self> {
        let identity = client.get_me().await?;
        let store = ConfigStore::init(root, &identity);
        info!(
            identity = identity.id,
            path = %store.path().display(),
            "database initialised"
        );
        let assets = AssetChannelManager::new(client, &identity, assets);
        Ok(Self {
            identity,
            store,
            assets,
        })
    }

    pub fn identity(&self) -> &SelfIdentity {
        &self.identity
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn assets(&self) -> &AssetChannelManager {
        &self.assets
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("identity", &self.identity.id)
            .field("store", &self.store)
            .field("assets", &self.assets)
            .finish()
    }
}
