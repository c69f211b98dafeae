use {
    bytes::Bytes,
    serde::{Deserialize, Serialize},
};

/// The authenticated account the bot runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIdentity {
    /// Stable numeric account id. Scopes the config file and asset channel.
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SelfIdentity {
    pub fn new(id: i64) -> Self {
        Self { id, username: None }
    }
}

/// A channel or group entity as seen by the messaging client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntity {
    pub id: i64,
    pub title: String,
    /// `None` when the platform did not report a count.
    #[serde(default)]
    pub participants_count: Option<u32>,
}

/// One entry of the account's dialog list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: i64,
    pub name: String,
    pub is_channel: bool,
    pub entity: ChannelEntity,
}

/// Result of a channel creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedChats {
    pub chats: Vec<ChannelEntity>,
}

/// A raw file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl FilePayload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            name: None,
            mime_type: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A message stored on (or fetched from) the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FilePayload>,
}

/// Something the bot wants to keep as an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPayload {
    /// An existing message, re-sent as-is.
    Message(Message),
    /// Raw bytes, uploaded as a document.
    File(FilePayload),
}

impl From<Message> for AssetPayload {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<FilePayload> for AssetPayload {
    fn from(file: FilePayload) -> Self {
        Self::File(file)
    }
}

/// Content handed to the client's send call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    Forward(Message),
    Document {
        file: FilePayload,
        /// Send as a generic document even if the platform could render it
        /// inline (photo, voice, ...).
        force_document: bool,
    },
}

/// Acknowledgement of a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i32,
}
