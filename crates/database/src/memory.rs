//! In-memory messaging client for testing.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    futures::{StreamExt, stream::BoxStream},
    hikka_common::types::{
        ChannelEntity, CreatedChats, Dialog, Message, OutgoingMessage, SelfIdentity, SentMessage,
    },
};

use crate::{Error, Result, client::MessagingClient};

/// First id handed out to channels created through this client.
const FIRST_CHANNEL_ID: i64 = 1_000_000;

/// A `create_channel` call as the client received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub title: String,
    pub about: String,
    pub megagroup: bool,
}

#[derive(Default)]
struct State {
    dialogs: Vec<Dialog>,
    messages: HashMap<i64, BTreeMap<i32, Message>>,
    folders: HashMap<i64, i32>,
    created: Vec<CreateRequest>,
    sent: Vec<OutgoingMessage>,
    next_channel_id: i64,
}

/// Messaging client backed by `HashMap`s. No network, for tests only.
///
/// Created channels show up in the dialog list with the account as their
/// only participant, like a freshly created private supergroup.
pub struct InMemoryClient {
    me: SelfIdentity,
    state: Mutex<State>,
    create_delay: Option<Duration>,
    fail_create: AtomicBool,
    fail_folder: AtomicBool,
    dialogs_yielded: Arc<AtomicUsize>,
}

impl InMemoryClient {
    pub fn new(me: SelfIdentity) -> Self {
        Self {
            me,
            state: Mutex::new(State {
                next_channel_id: FIRST_CHANNEL_ID,
                ..Default::default()
            }),
            create_delay: None,
            fail_create: AtomicBool::new(false),
            fail_folder: AtomicBool::new(false),
            dialogs_yielded: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make `create_channel` take this long, to widen race windows.
    #[must_use]
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn add_dialog(&self, dialog: Dialog) {
        self.state().dialogs.push(dialog);
    }

    /// Make the next `create_channel` call fail with a client error.
    pub fn fail_next_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Make the next `edit_folder` call fail with a client error.
    pub fn fail_next_folder_move(&self) {
        self.fail_folder.store(true, Ordering::SeqCst);
    }

    pub fn create_requests(&self) -> usize {
        self.state().created.len()
    }

    pub fn created_channels(&self) -> Vec<CreateRequest> {
        self.state().created.clone()
    }

    pub fn folder_of(&self, channel_id: i64) -> Option<i32> {
        self.state().folders.get(&channel_id).copied()
    }

    pub fn messages_in(&self, channel_id: i64) -> Vec<Message> {
        self.state()
            .messages
            .get(&channel_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every payload passed to `send_message`, in order.
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.state().sent.clone()
    }

    /// Total dialogs handed out by `iter_dialogs` across all scans.
    pub fn dialogs_yielded(&self) -> usize {
        self.dialogs_yielded.load(Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn unknown_chat(chat_id: i64) -> Error {
    Error::client(
        "in-memory client",
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("CHANNEL_INVALID: {chat_id}"),
        ),
    )
}

#[async_trait]
impl MessagingClient for InMemoryClient {
    async fn get_me(&self) -> Result<SelfIdentity> {
        Ok(self.me.clone())
    }

    fn iter_dialogs(&self) -> BoxStream<'_, Result<Dialog>> {
        let dialogs = self.state().dialogs.clone();
        let yielded = Arc::clone(&self.dialogs_yielded);
        futures::stream::iter(dialogs)
            .inspect(move |_| {
                yielded.fetch_add(1, Ordering::SeqCst);
            })
            .map(Ok)
            .boxed()
    }

    async fn create_channel(
        &self,
        title: &str,
        about: &str,
        megagroup: bool,
    ) -> Result<CreatedChats> {
        self.state().created.push(CreateRequest {
            title: title.to_string(),
            about: about.to_string(),
            megagroup,
        });

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create.swap(false, Ordering::SeqCst) {
            return Err(Error::client(
                "create_channel",
                std::io::Error::other("FLOOD_WAIT_30"),
            ));
        }

        let mut state = self.state();
        let id = state.next_channel_id;
        state.next_channel_id += 1;
        let entity = ChannelEntity {
            id,
            title: title.to_string(),
            participants_count: Some(1),
        };
        state.dialogs.push(Dialog {
            id,
            name: title.to_string(),
            is_channel: true,
            entity: entity.clone(),
        });
        state.messages.insert(id, BTreeMap::new());
        Ok(CreatedChats {
            chats: vec![entity],
        })
    }

    async fn edit_folder(&self, channel: &ChannelEntity, folder_id: i32) -> Result<()> {
        if self.fail_folder.swap(false, Ordering::SeqCst) {
            return Err(Error::client(
                "edit_folder",
                std::io::Error::other("FOLDER_ID_INVALID"),
            ));
        }
        self.state().folders.insert(channel.id, folder_id);
        Ok(())
    }

    async fn send_message(
        &self,
        to: &ChannelEntity,
        message: OutgoingMessage,
    ) -> Result<SentMessage> {
        let mut state = self.state();
        if !state.dialogs.iter().any(|d| d.id == to.id) {
            return Err(unknown_chat(to.id));
        }
        state.sent.push(message.clone());

        let chat = state.messages.entry(to.id).or_default();
        let id = chat.keys().next_back().map_or(1, |last| last + 1);
        let stored = match message {
            OutgoingMessage::Forward(original) => Message {
                id,
                chat_id: to.id,
                text: original.text,
                file: original.file,
            },
            OutgoingMessage::Document { file, .. } => Message {
                id,
                chat_id: to.id,
                text: String::new(),
                file: Some(file),
            },
        };
        chat.insert(id, stored);
        Ok(SentMessage { id })
    }

    async fn get_messages(
        &self,
        from: &ChannelEntity,
        ids: &[i32],
    ) -> Result<Vec<Option<Message>>> {
        let state = self.state();
        if !state.dialogs.iter().any(|d| d.id == from.id) {
            return Err(unknown_chat(from.id));
        }
        let chat = state.messages.get(&from.id);
        Ok(ids
            .iter()
            .map(|id| chat.and_then(|c| c.get(id)).cloned())
            .collect())
    }
}
