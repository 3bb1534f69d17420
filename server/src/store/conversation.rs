use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use haggle_common::conversation::{ConversationId, ConversationRecord};
use haggle_common::listing::ListingId;
use haggle_common::message::{Message, MessageKind, MessageType, Sender};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{blocking, csv_file};
use crate::error::StoreError;

/// Column order of every conversation log.
pub const MESSAGE_COLUMNS: &[&str] = &["dateTime", "content", "sender", "type", "price"];

/// Column order of the conversation index.
pub const INDEX_COLUMNS: &[&str] = &["conversationId", "listingId", "createdAt"];

const INDEX_FILE: &str = "index.csv";

/// One row of a conversation log. `content` is blank for offers and
/// acceptances, `price` is blank for text.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    date_time: DateTime<Utc>,
    content: String,
    sender: Sender,
    #[serde(rename = "type")]
    kind: String,
    price: Option<f64>,
}

impl From<&Message> for MessageRecord {
    fn from(msg: &Message) -> Self {
        MessageRecord {
            date_time: msg.date_time,
            content: msg.kind.content().to_string(),
            sender: msg.sender(),
            kind: msg.kind.message_type().as_str().to_string(),
            price: msg.kind.price(),
        }
    }
}

impl MessageRecord {
    /// Rebuild the message a row stands for. Older logs were written without
    /// any checks, so the row's type and price decide the variant even when
    /// the sender disagrees, and anything that is not a priced offer or
    /// acceptance reads as text.
    fn into_message(self, id: ConversationId) -> Message {
        let priced = match (self.kind.as_str(), self.price) {
            ("offer", Some(price)) => MessageKind::offer(price).ok(),
            ("accepted", Some(price)) => MessageKind::accepted(price).ok(),
            _ => None,
        };
        let kind = match priced {
            Some(kind) => {
                if kind.sender() != self.sender {
                    warn!(
                        conversation = %id,
                        "{} row sent by {}; reading it as sent by {}",
                        self.kind,
                        self.sender.as_str(),
                        kind.sender().as_str()
                    );
                }
                kind
            }
            None => {
                if self.kind != MessageType::Text.as_str() {
                    warn!(conversation = %id, kind = %self.kind, "reading unrecognised row as text");
                }
                MessageKind::Text {
                    sender: self.sender,
                    content: self.content,
                }
            }
        };
        Message::new(self.date_time, kind)
    }
}

/// Conversation logs, one append-only CSV file per conversation plus an
/// index recording which listing each conversation is about.
///
/// Appends to the same conversation are serialised by a per-conversation
/// mutex, so concurrent senders never overwrite each other and log order
/// matches timestamp order.
pub struct ConversationStore {
    dir: PathBuf,
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
    index_lock: Mutex<()>,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: DashMap::new(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn log_path(&self, id: ConversationId) -> PathBuf {
        self.dir.join(format!("{id}.csv"))
    }

    fn lock_for(&self, id: ConversationId) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().clone()
    }

    /// Forget a conversation's lock once no append holds or awaits it.
    fn release(&self, id: ConversationId) {
        self.locks.remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Start an empty conversation about `listing_id` and return its id.
    pub async fn create(&self, listing_id: ListingId) -> Result<ConversationId, StoreError> {
        let record = ConversationRecord {
            conversation_id: ConversationId::generate(),
            listing_id,
            created_at: Utc::now(),
        };
        let id = record.conversation_id;
        let dir = self.dir.clone();
        let log = self.log_path(id);

        let _guard = self.index_lock.lock().await;
        let listing_id = record.listing_id.clone();
        blocking(move || {
            std::fs::create_dir_all(&dir)?;
            csv_file::create_with_header(&log, MESSAGE_COLUMNS)?;
            let mut index = csv_file::open_for_append(&dir.join(INDEX_FILE), true)?;
            csv_file::append(&mut index, INDEX_COLUMNS, &[record])
        })
        .await?;

        info!(conversation = %id, listing = %listing_id, "conversation created");
        Ok(id)
    }

    /// Messages of a conversation in append order. A conversation with no
    /// log yet has no messages; a log that cannot be parsed is an error.
    pub async fn messages(&self, id: ConversationId) -> Result<Vec<Message>, StoreError> {
        let path = self.log_path(id);
        blocking(move || {
            let records: Vec<MessageRecord> = csv_file::read_all(&path)?.unwrap_or_default();
            Ok(records.into_iter().map(|r| r.into_message(id)).collect())
        })
        .await
    }

    /// Messages of a conversation, or an empty list if the log cannot be read.
    pub async fn read(&self, id: ConversationId) -> Vec<Message> {
        self.messages(id).await.unwrap_or_else(|e| {
            error!("Error reading conversation {id}: {e}");
            Vec::new()
        })
    }

    /// Stamp `kind` with the current time and append it to the conversation's
    /// log, starting the log if this is its first message. Only one record is
    /// written; earlier messages are never rewritten.
    pub async fn append(&self, id: ConversationId, kind: MessageKind) -> Result<Message, StoreError> {
        let lock = self.lock_for(id);
        let guard = lock.lock().await;

        let message = Message::new(Utc::now(), kind);
        let record = MessageRecord::from(&message);
        let dir = self.dir.clone();
        let path = self.log_path(id);
        let written = blocking(move || {
            std::fs::create_dir_all(&dir)?;
            let mut file = csv_file::open_for_append(&path, true)?;
            csv_file::append(&mut file, MESSAGE_COLUMNS, &[record])
        })
        .await;

        drop(guard);
        drop(lock);
        self.release(id);
        written?;

        debug!(conversation = %id, kind = ?message.kind.message_type(), "message appended");
        Ok(message)
    }

    /// Which listing a conversation was opened about.
    pub async fn record(&self, id: ConversationId) -> Result<Option<ConversationRecord>, StoreError> {
        let records = self.index().await?;
        Ok(records.into_iter().find(|r| r.conversation_id == id))
    }

    /// Conversations opened about a listing, oldest first.
    pub async fn for_listing(&self, listing_id: &ListingId) -> Result<Vec<ConversationRecord>, StoreError> {
        let records = self.index().await?;
        Ok(records
            .into_iter()
            .filter(|r| &r.listing_id == listing_id)
            .collect())
    }

    async fn index(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        let path = self.dir.join(INDEX_FILE);
        blocking(move || Ok(csv_file::read_all(&path)?.unwrap_or_default())).await
    }
}
