use {async_trait::async_trait, futures::stream::BoxStream};

use hikka_common::types::{
    ChannelEntity, CreatedChats, Dialog, Message, OutgoingMessage, SelfIdentity, SentMessage,
};

use crate::Result;

/// The subset of the messaging platform client the persistence layer needs.
///
/// Implementations own connection, auth and rate limiting. Transport
/// failures should be wrapped with [`crate::Error::client`]; they are
/// surfaced to callers unchanged.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// The account the client is logged in as.
    async fn get_me(&self) -> Result<SelfIdentity>;

    /// Lazily walk the account's dialogs. Consumers may stop early.
    fn iter_dialogs(&self) -> BoxStream<'_, Result<Dialog>>;

    /// Create a channel. `megagroup = true` asks for a supergroup rather
    /// than a broadcast channel.
    async fn create_channel(
        &self,
        title: &str,
        about: &str,
        megagroup: bool,
    ) -> Result<CreatedChats>;

    /// Move a dialog into a folder (`1` is the archive).
    async fn edit_folder(&self, channel: &ChannelEntity, folder_id: i32) -> Result<()>;

    async fn send_message(
        &self,
        to: &ChannelEntity,
        message: OutgoingMessage,
    ) -> Result<SentMessage>;

    /// Fetch messages by id. Ids that do not resolve yield `None` in place.
    async fn get_messages(
        &self,
        from: &ChannelEntity,
        ids: &[i32],
    ) -> Result<Vec<Option<Message>>>;
}
