//! Conversation log for the chat transcript
//!
//! The log is append-only: messages are never edited or removed once added,
//! and insertion order is display order. The only way to start over is to
//! replace the whole log, which is what a language switch does.

use crate::i18n::{OptionKey, Translations};
use crate::types::MessageId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the visitor
    User,
    /// Scripted reply from the widget
    Assistant,
}

/// How a message is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    #[default]
    Text,
    /// Full-width option buttons
    Menu,
    /// Compact follow-up buttons
    QuickReplies,
    TicketBooking,
    /// Booking card with the booking details
    BookingConfirmation,
}

/// Summary of a confirmed booking, shown on the confirmation card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub date: NaiveDate,
    pub ticket_count: u32,
    pub full_name: String,
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Buttons attached to the message, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionKey>>,
    #[serde(
        default,
        rename = "bookingDetails",
        skip_serializing_if = "Option::is_none"
    )]
    pub booking_details: Option<BookingDetails>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Plain text from the visitor
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, MessageKind::Text)
    }

    /// Plain text from the widget
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content, MessageKind::Text)
    }

    /// Assistant message rendered as a menu
    pub fn menu(content: impl Into<String>, options: &[OptionKey]) -> Self {
        Self::new(MessageRole::Assistant, content, MessageKind::Menu).with_options(options)
    }

    /// Assistant message followed by quick-reply buttons
    pub fn quick_replies(content: impl Into<String>, options: &[OptionKey]) -> Self {
        Self::new(MessageRole::Assistant, content, MessageKind::QuickReplies)
            .with_options(options)
    }

    /// Booking confirmation card
    pub fn booking_confirmation(content: impl Into<String>, details: BookingDetails) -> Self {
        let mut message = Self::new(
            MessageRole::Assistant,
            content,
            MessageKind::BookingConfirmation,
        )
        .with_options(&OptionKey::BOOKING_CONFIRMATION);
        message.booking_details = Some(details);
        message
    }

    /// The welcome menu in the given language
    pub fn welcome(t: &Translations) -> Self {
        Self::menu(t.welcome, &OptionKey::WELCOME_MENU)
    }

    fn new(role: MessageRole, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            kind,
            options: None,
            booking_details: None,
            created_at: Utc::now(),
        }
    }

    fn with_options(mut self, options: &[OptionKey]) -> Self {
        self.options = Some(options.to_vec());
        self
    }

    /// Options attached to the message (empty for plain text)
    pub fn option_keys(&self) -> &[OptionKey] {
        self.options.as_deref().unwrap_or(&[])
    }
}

/// Ordered, append-only message log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh log holding only the welcome menu
    pub fn with_welcome(t: &Translations) -> Self {
        Self {
            messages: vec![Message::welcome(t)],
        }
    }

    /// Append a message and return its id
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages sent by the given role, in order
    pub fn by_role(&self, role: MessageRole) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(move |m| m.role == role)
    }
}
