//! Guided multi-step flows
//!
//! Ticket booking and booking cancellation each run their own transition
//! table ([`machine`]) over a private form state. Flows never touch the
//! conversation log; when they finish they send a [`FlowCompletion`] to the
//! widget that opened them.

use crate::backend::MuseumBackend;
use crate::config::WidgetConfig;
use crate::conversation::BookingDetails;
use crate::error::{BackendError, FieldErrors};
use crate::i18n::{Language, Translations};
use crate::payment::PaymentProcessor;
use crate::ticket::TicketSink;
use crate::types::FlowId;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

pub mod cancel;
pub mod machine;
pub mod ticket;

pub use cancel::{CancelBookingFlow, CancelForm, CancelStep};
pub use ticket::{BookingForm, Country, Gender, TicketBookingFlow, TicketStep};

/// Form fields that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FullName,
    Age,
    Gender,
    Country,
    State,
    Pincode,
    PhoneNumber,
    Email,
    Otp,
    Date,
    TicketCount,
    AdditionalPassengers,
}

impl Field {
    /// Map a backend error key onto a form field
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "name" | "fullName" => Some(Self::FullName),
            "age" => Some(Self::Age),
            "gender" => Some(Self::Gender),
            "country" => Some(Self::Country),
            "state" => Some(Self::State),
            "pincode" => Some(Self::Pincode),
            "phone" | "phoneNumber" => Some(Self::PhoneNumber),
            "email" => Some(Self::Email),
            "otp" => Some(Self::Otp),
            "date" => Some(Self::Date),
            "tickets" => Some(Self::TicketCount),
            "additionalPassengers" => Some(Self::AdditionalPassengers),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FullName => "full name",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Country => "country",
            Self::State => "state",
            Self::Pincode => "pincode",
            Self::PhoneNumber => "phone number",
            Self::Email => "email",
            Self::Otp => "OTP",
            Self::Date => "date",
            Self::TicketCount => "number of tickets",
            Self::AdditionalPassengers => "additional passengers",
        };
        write!(f, "{}", name)
    }
}

/// Result a finished flow reports to the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCompletion {
    /// Payment verified for this booking
    Booked(BookingDetails),
    /// Backend confirmed the cancellation
    Cancelled { message: Option<String> },
}

/// Completions are tagged with the flow instance that produced them
pub type CompletionSender = mpsc::UnboundedSender<(FlowId, FlowCompletion)>;

/// Collaborators shared by both flows
#[derive(Clone)]
pub struct FlowContext {
    pub config: Arc<WidgetConfig>,
    pub backend: Arc<dyn MuseumBackend>,
    pub payments: Arc<PaymentProcessor>,
    pub tickets: Arc<dyn TicketSink>,
    id: FlowId,
    language: watch::Receiver<Language>,
    completions: Option<CompletionSender>,
    today: Option<NaiveDate>,
}

impl fmt::Debug for FlowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowContext")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("language", &self.language())
            .field("today", &self.today)
            .finish()
    }
}

impl FlowContext {
    pub fn new(
        config: Arc<WidgetConfig>,
        backend: Arc<dyn MuseumBackend>,
        payments: Arc<PaymentProcessor>,
        tickets: Arc<dyn TicketSink>,
    ) -> Self {
        let (_, language) = watch::channel(config.default_language);
        Self {
            config,
            backend,
            payments,
            tickets,
            id: FlowId::new(),
            language,
            completions: None,
            today: None,
        }
    }

    /// Fix the language for this flow
    pub fn with_language(mut self, language: Language) -> Self {
        self.set_language(language);
        self
    }

    /// Track a language that the owner may change while a step is in flight
    pub fn follow_language(mut self, language: watch::Receiver<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = watch::channel(language).1;
    }

    pub fn language(&self) -> Language {
        *self.language.borrow()
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    /// Report completions on this channel
    pub fn with_completions(mut self, sender: CompletionSender) -> Self {
        self.completions = Some(sender);
        self
    }

    /// Pin the calendar to a fixed day
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn translations(&self) -> &'static Translations {
        self.language().translations()
    }

    pub(crate) fn complete(&self, completion: FlowCompletion) {
        match &self.completions {
            Some(sender) => {
                if sender.send((self.id, completion)).is_err() {
                    debug!("Completion dropped, widget no longer listening");
                }
            }
            None => debug!(?completion, "Flow completed without a listener"),
        }
    }
}

/// `dd-mm-yyyy`, the format the ticket and cancellation endpoints expect
pub fn format_dmy(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// `yyyy-mm-dd`, the format the booking endpoint expects
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Visible message for a backend failure
///
/// Prefers the backend's own message; a rejection without one falls back to
/// `rejected`, an unreachable backend to `unreachable`.
pub(crate) fn backend_message(
    error: &BackendError,
    rejected: &str,
    unreachable: &str,
) -> String {
    match error {
        BackendError::Rejected { message, .. } => {
            message.clone().unwrap_or_else(|| rejected.to_string())
        }
        BackendError::Transport { .. } | BackendError::Decode { .. } => unreachable.to_string(),
    }
}

/// Field errors the backend attached to a rejection
pub(crate) fn backend_field_errors(error: &BackendError) -> FieldErrors {
    match error {
        BackendError::Rejected { field_errors, .. } => wire_field_errors(field_errors),
        _ => FieldErrors::new(),
    }
}

fn wire_field_errors(errors: &BTreeMap<String, String>) -> FieldErrors {
    errors
        .iter()
        .filter_map(|(name, message)| Field::from_wire(name).map(|f| (f, message.clone())))
        .collect()
}
