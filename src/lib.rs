//! # Museum Chat - An Embeddable Museum Chatbot Widget Engine
//!
//! Museum Chat drives a scripted museum assistant: a floating chat that answers
//! fixed questions (hours, prices, exhibitions, directions, facilities, about)
//! and walks visitors through two guided flows, ticket booking and booking
//! cancellation. Everything that needs authority (OTPs, bookings, payment
//! orders and signatures, ticket images) lives in a separate booking backend
//! reached over HTTP; this crate is the client-side orchestration.
//!
//! ## Features
//!
//! - 💬 **Scripted Conversation**: Append-only log with menus and quick replies
//! - 🎟️ **Ticket Booking**: Personal info, OTP, date and passengers, payment, ticket download
//! - ↩️ **Cancellation**: Email, OTP and date selection against the backend
//! - 🔁 **Transition Tables**: Every step change is a declared `{state, event} → state` edge
//! - 💳 **Payment Bridge**: Host-driven checkout overlays exposed as futures
//! - 🌐 **Localized**: English and Hindi string tables behind exhaustive enums
//!
//! ## Quick Start
//!
//! ```no_run
//! use museum_chat::{ChannelCheckout, ChatWidget, OptionKey, WidgetConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (checkout, _overlays) = ChannelCheckout::new();
//! let widget = ChatWidget::builder()
//!     .config(WidgetConfig::from_env()?)
//!     .checkout(Box::new(checkout))
//!     .build()?;
//!
//! widget.open().await;
//! if let Some(reply) = widget.select_menu_option(OptionKey::OpeningHours).await? {
//!     reply.await?;
//! }
//!
//! for message in widget.messages().await {
//!     println!("{:?}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Booking a Ticket
//!
//! ```no_run
//! use museum_chat::{ChannelCheckout, ChatWidget, Country, Gender, OptionKey};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (checkout, mut overlays) = ChannelCheckout::new();
//! let widget = ChatWidget::builder().checkout(Box::new(checkout)).build()?;
//!
//! // The host page answers checkout overlays
//! tokio::spawn(async move {
//!     while let Some(pending) = overlays.next().await {
//!         pending.dismiss();
//!     }
//! });
//!
//! widget.select_menu_option(OptionKey::BookTicket).await?;
//! let mut flow = widget.ticket_flow().await?;
//! let form = flow.form_mut();
//! form.full_name = "Asha Rao".to_string();
//! form.age = "34".to_string();
//! form.gender = Some(Gender::Female);
//! form.set_country(Country::Japan);
//! form.phone_number = "9876543210".to_string();
//! form.email = "asha@example.com".to_string();
//! flow.submit_personal_info().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   ChatWidget                     │
//! │  ┌──────────────┐  ┌───────────────────────────┐ │
//! │  │ Conversation │  │      Active flow slot     │ │
//! │  │  + menus     │  │  TicketBooking | Cancel   │ │
//! │  └──────────────┘  └───────────────────────────┘ │
//! │         ▲ completions (mpsc)     │               │
//! │         └────────────────────────┤               │
//! │  ┌───────────────┐  ┌────────────▼────────────┐  │
//! │  │ MuseumBackend │  │    PaymentProcessor     │  │
//! │  │  HttpBackend  │  │  CheckoutGateway        │  │
//! │  └───────────────┘  └─────────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`widget`]: Chat shell, active flow slot and builder
//! - [`menu`]: Menu and quick-reply dispatch
//! - [`flow`]: Ticket booking and cancellation flows
//! - [`payment`]: Payment round-trip and checkout bridge
//! - [`backend`]: Booking backend trait and HTTP client
//! - [`ticket`]: Ticket image sinks
//! - [`conversation`]: Message log
//! - [`i18n`]: Languages, option keys and string tables
//! - [`embed`]: Mounting widgets into host containers
//! - [`config`]: Widget configuration
//! - [`error`]: Error types and result aliases
//!
//! ## License
//!
//! Licensed under either of Apache License 2.0 or MIT license at your option.

// Core type definitions
pub mod types;

// Error types
pub mod error;

// Configuration
pub mod config;

// Localization
pub mod i18n;

// Conversation log
pub mod conversation;

// Menu dispatch
pub mod menu;

// Booking backend
pub mod backend;

// Payment sub-protocol
pub mod payment;

// Ticket delivery
pub mod ticket;

// Guided flows
pub mod flow;

// Widget shell
pub mod widget;

// Host page embedding
pub mod embed;

pub use backend::{BackendReply, HttpBackend, MuseumBackend};
pub use config::WidgetConfig;
pub use conversation::{BookingDetails, Conversation, Message, MessageKind, MessageRole};
pub use embed::{EmbedHost, WidgetHandle};
pub use error::{
    BackendError, FieldErrors, FlowError, FlowResult, PaymentError, Result, WidgetError,
};
pub use flow::{
    BookingForm, CancelBookingFlow, CancelStep, Country, Field, FlowCompletion, Gender,
    TicketBookingFlow, TicketStep,
};
pub use i18n::{InfoTopic, Language, OptionKey, Translations};
pub use payment::{
    ChannelCheckout, CheckoutGateway, CheckoutOutcome, CheckoutSuccess, PaymentProcessor,
    PendingCheckout,
};
pub use ticket::{DirectoryTicketSink, MemoryTicketSink, TicketSink};
pub use types::*;
pub use widget::{ActiveFlow, ChatWidget, ChatWidgetBuilder};
