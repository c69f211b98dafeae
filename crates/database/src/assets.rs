//! Blob storage on a private messaging-platform channel.
//!
//! Payloads are sent to a dedicated `hikka-<id>-assets` supergroup and
//! addressed afterwards by the message id the platform assigns. The
//! channel is resolved lazily and created at most once per process.

use std::sync::{Arc, RwLock};

use {
    futures::StreamExt,
    hikka_common::types::{AssetPayload, ChannelEntity, Message, OutgoingMessage, SelfIdentity},
    hikka_config::AssetsConfig,
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{Error, Result, client::MessagingClient, error::Context};

/// Name of the asset channel for an account.
pub fn asset_channel_title(identity_id: i64) -> String {
    format!("hikka-{identity_id}-assets")
}

pub struct AssetChannelManager {
    client: Arc<dyn MessagingClient>,
    title: String,
    config: AssetsConfig,
    channel: RwLock<Option<ChannelEntity>>,
    /// Gate for resolve-or-create. The flag records that a creation request
    /// has been issued.
    creation: Mutex<bool>,
}

impl AssetChannelManager {
    pub fn new(
        client: Arc<dyn MessagingClient>,
        identity: &SelfIdentity,
        config: AssetsConfig,
    ) -> Self {
        Self {
            client,
            title: asset_channel_title(identity.id),
            config,
            channel: RwLock::new(None),
            creation: Mutex::new(false),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The resolved channel, if any call has resolved it yet.
    pub fn cached(&self) -> Option<ChannelEntity> {
        self.channel
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn remember(&self, channel: &ChannelEntity) {
        *self.channel.write().unwrap_or_else(|e| e.into_inner()) = Some(channel.clone());
    }

    /// Scan the dialog list for our asset channel.
    ///
    /// Only a channel whose sole participant is the account itself counts;
    /// same-named channels shared with others are skipped. First match wins.
    pub async fn find_existing(&self) -> Result<Option<ChannelEntity>> {
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await {
            let dialog = dialog?;
            if !dialog.is_channel || dialog.name != self.title {
                continue;
            }
            if dialog.entity.participants_count != Some(1) {
                debug!(
                    channel_id = dialog.id,
                    participants = ?dialog.entity.participants_count,
                    "skipping shared channel with asset channel name"
                );
                continue;
            }
            debug!(channel_id = dialog.id, "found asset channel");
            return Ok(Some(dialog.entity));
        }
        Ok(None)
    }

    /// Return the asset channel, creating it if no creation was attempted yet.
    ///
    /// Callers queue on the gate, so one that arrives while another is
    /// creating the channel gets the freshly cached channel once the
    /// creator is done. If the single creation attempt failed, later calls
    /// fall back to a dialog scan.
    pub async fn resolve_or_create(&self) -> Result<ChannelEntity> {
        let mut attempted = self.creation.lock().await;

        if let Some(channel) = self.cached() {
            return Ok(channel);
        }

        if *attempted {
            let channel = self
                .find_existing()
                .await?
                .ok_or_else(|| Error::AssetChannelUnavailable {
                    title: self.title.clone(),
                })?;
            self.remember(&channel);
            return Ok(channel);
        }

        *attempted = true;
        info!(title = %self.title, "creating asset channel");
        let channel = self
            .client
            .create_channel(&self.title, &self.config.description, true)
            .await?
            .chats
            .into_iter()
            .next()
            .context("channel creation returned no chats")?;
        self.remember(&channel);

        self.client.edit_folder(&channel, self.config.folder_id).await?;
        debug!(
            channel_id = channel.id,
            folder_id = self.config.folder_id,
            "asset channel created"
        );
        Ok(channel)
    }

    /// Cache, then dialog scan, then (if allowed) creation.
    async fn resolve(&self, create: bool) -> Result<Option<ChannelEntity>> {
        if let Some(channel) = self.cached() {
            return Ok(Some(channel));
        }
        if let Some(channel) = self.find_existing().await? {
            self.remember(&channel);
            return Ok(Some(channel));
        }
        if !create {
            return Ok(None);
        }
        self.resolve_or_create().await.map(Some)
    }

    /// Upload an asset and return its id.
    ///
    /// Messages are re-sent as-is, raw files go up as documents. The id is
    /// not recorded anywhere; keep it (e.g. in the config store) to fetch
    /// the asset later.
    pub async fn store_asset(&self, payload: impl Into<AssetPayload>) -> Result<i32> {
        let channel = self
            .resolve(true)
            .await?
            .context("asset channel resolution returned nothing")?;

        let outgoing = match payload.into() {
            AssetPayload::Message(message) => OutgoingMessage::Forward(message),
            AssetPayload::File(file) => OutgoingMessage::Document {
                file,
                force_document: true,
            },
        };
        let sent = self.client.send_message(&channel, outgoing).await?;
        debug!(asset_id = sent.id, channel_id = channel.id, "asset stored");
        Ok(sent.id)
    }

    /// Fetch an asset by id. Never creates the channel.
    pub async fn fetch_asset(&self, asset_id: i32) -> Result<Option<Message>> {
        let Some(channel) = self.resolve(false).await? else {
            debug!(asset_id, "no asset channel, nothing to fetch");
            return Ok(None);
        };
        let messages = self.client.get_messages(&channel, &[asset_id]).await?;
        Ok(messages.into_iter().next().flatten())
    }
}

impl std::fmt::Debug for AssetChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetChannelManager")
            .field("title", &self.title)
            .field("channel", &self.cached().map(|c| c.id))
            .finish_non_exhaustive()
    }
}
