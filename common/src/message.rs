use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the negotiation wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Buyer,
    Seller,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::Buyer => "buyer",
            Sender::Seller => "seller",
        }
    }
}

/// Discriminator stored alongside each message in a conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Offer,
    Accepted,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Offer => "offer",
            MessageType::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    #[error("offers can only be made by the buyer")]
    OfferFromSeller,
    #[error("offers can only be accepted by the seller")]
    AcceptanceFromBuyer,
    #[error("price must be a positive amount (got {0})")]
    InvalidPrice(f64),
    #[error("{0} message is missing its price")]
    MissingPrice(&'static str),
}

/// What a message says. Offers always come from the buyer and acceptances
/// from the seller, so only text carries an explicit sender.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Text { sender: Sender, content: String },
    Offer { price: f64 },
    Accepted { price: f64 },
}

fn check_price(price: f64) -> Result<f64, MessageError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(MessageError::InvalidPrice(price))
    }
}

impl MessageKind {
    pub fn text(sender: Sender, content: impl Into<String>) -> Self {
        MessageKind::Text {
            sender,
            content: content.into(),
        }
    }

    pub fn offer(price: f64) -> Result<Self, MessageError> {
        Ok(MessageKind::Offer {
            price: check_price(price)?,
        })
    }

    pub fn accepted(price: f64) -> Result<Self, MessageError> {
        Ok(MessageKind::Accepted {
            price: check_price(price)?,
        })
    }

    /// Rebuild a message from its flat parts, checking the sender agrees
    /// with the variant.
    pub fn from_parts(
        kind: MessageType,
        sender: Sender,
        content: String,
        price: Option<f64>,
    ) -> Result<Self, MessageError> {
        match kind {
            MessageType::Text => Ok(MessageKind::Text { sender, content }),
            MessageType::Offer => {
                if sender != Sender::Buyer {
                    return Err(MessageError::OfferFromSeller);
                }
                MessageKind::offer(price.ok_or(MessageError::MissingPrice("offer"))?)
            }
            MessageType::Accepted => {
                if sender != Sender::Seller {
                    return Err(MessageError::AcceptanceFromBuyer);
                }
                MessageKind::accepted(price.ok_or(MessageError::MissingPrice("accepted"))?)
            }
        }
    }

    pub fn sender(&self) -> Sender {
        match self {
            MessageKind::Text { sender, .. } => *sender,
            MessageKind::Offer { .. } => Sender::Buyer,
            MessageKind::Accepted { .. } => Sender::Seller,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            MessageKind::Text { .. } => MessageType::Text,
            MessageKind::Offer { .. } => MessageType::Offer,
            MessageKind::Accepted { .. } => MessageType::Accepted,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            MessageKind::Text { .. } => None,
            MessageKind::Offer { price } | MessageKind::Accepted { price } => Some(*price),
        }
    }

    /// Free-form text, empty for offers and acceptances.
    pub fn content(&self) -> &str {
        match self {
            MessageKind::Text { content, .. } => content,
            _ => "",
        }
    }
}

/// A message in a conversation, stamped with the time it was written.
///
/// Serializes to the JSON shape clients already speak:
/// `{"dateTime": ..., "content": "hi" | {"type": "offer", "price": 50}, "sender": "buyer"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageWire", into = "MessageWire")]
pub struct Message {
    pub date_time: DateTime<Utc>,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(date_time: DateTime<Utc>, kind: MessageKind) -> Self {
        Self { date_time, kind }
    }

    pub fn sender(&self) -> Sender {
        self.kind.sender()
    }
}

/// Message content as it travels over JSON: a bare string for text, an
/// object tagged by `type` for offers and acceptances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(StructuredContent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructuredContent {
    Offer { price: f64 },
    Accepted { price: f64 },
}

/// Body of a send-message request: a message without its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: Content,
    pub sender: Sender,
}

impl TryFrom<NewMessage> for MessageKind {
    type Error = MessageError;

    fn try_from(msg: NewMessage) -> Result<Self, Self::Error> {
        let (kind, content, price) = match msg.content {
            Content::Text(text) => (MessageType::Text, text, None),
            Content::Structured(StructuredContent::Offer { price }) => {
                (MessageType::Offer, String::new(), Some(price))
            }
            Content::Structured(StructuredContent::Accepted { price }) => {
                (MessageType::Accepted, String::new(), Some(price))
            }
        };
        MessageKind::from_parts(kind, msg.sender, content, price)
    }
}

impl From<&MessageKind> for Content {
    fn from(kind: &MessageKind) -> Self {
        match kind {
            MessageKind::Text { content, .. } => Content::Text(content.clone()),
            MessageKind::Offer { price } => {
                Content::Structured(StructuredContent::Offer { price: *price })
            }
            MessageKind::Accepted { price } => {
                Content::Structured(StructuredContent::Accepted { price: *price })
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageWire {
    date_time: DateTime<Utc>,
    content: Content,
    sender: Sender,
}

impl TryFrom<MessageWire> for Message {
    type Error = MessageError;

    fn try_from(wire: MessageWire) -> Result<Self, Self::Error> {
        let kind = MessageKind::try_from(NewMessage {
            content: wire.content,
            sender: wire.sender,
        })?;
        Ok(Message::new(wire.date_time, kind))
    }
}

impl From<Message> for MessageWire {
    fn from(msg: Message) -> Self {
        MessageWire {
            date_time: msg.date_time,
            content: Content::from(&msg.kind),
            sender: msg.kind.sender(),
        }
    }
}

/// Price of the most recent offer that has not been followed by an
/// acceptance, if any.
pub fn outstanding_offer(messages: &[Message]) -> Option<f64> {
    for msg in messages.iter().rev() {
        match msg.kind {
            MessageKind::Offer { price } => return Some(price),
            MessageKind::Accepted { .. } => return None,
            MessageKind::Text { .. } => {}
        }
    }
    None
}
