//! Error types for the museum chat widget
//!
//! This module provides the error taxonomy using thiserror for all widget operations.
//! Flow-level errors always carry a message that can be shown to the visitor as-is.

use crate::flow::Field;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Main error type for widget operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WidgetError {
    /// Flow step rejected the action
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Payment sub-protocol failed
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while storing a ticket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Host page has no container with this id
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Host container already holds a widget
    #[error("Container already has a mounted widget: {0}")]
    AlreadyMounted(String),

    /// Action requires an open flow of the given kind
    #[error("No active {0} flow")]
    NoActiveFlow(&'static str),

    /// Free-text input is disabled while a flow is on screen
    #[error("Input is disabled while the booking flow is open")]
    InputDisabled,

    /// Widget has been unmounted
    #[error("Widget has been unmounted")]
    Unmounted,
}

/// Per-field validation messages, ordered by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<(Field, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Errors raised by a flow step
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FlowError {
    /// One or more required fields are missing or malformed
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Visitor (or an additional passenger) is 12 or younger
    #[error("{field}: {message}")]
    Age { field: Field, message: String },

    /// Backend refused the step or could not be reached
    #[error("{0}")]
    Backend(String),

    /// Payment did not complete
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The transition table has no edge for this event
    #[error("No transition for {event} from {state}")]
    InvalidTransition { state: String, event: String },
}

impl FlowError {
    /// Single-field validation failure
    pub fn required(field: Field, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, message);
        Self::Validation(errors)
    }

    /// Field errors carried by this error, if any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Backend HTTP errors
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BackendError {
    /// Request never produced a response
    #[error("Backend unreachable at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Backend answered with a non-success status
    #[error("Backend rejected {endpoint} ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        endpoint: String,
        status: u16,
        message: Option<String>,
        field_errors: BTreeMap<String, String>,
    },

    /// Response body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl BackendError {
    /// Message supplied by the backend, if it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Payment sub-protocol errors
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PaymentError {
    /// Backend could not create the order
    #[error("Payment order could not be created: {0}")]
    OrderCreation(String),

    /// Checkout script failed to load
    #[error("Checkout could not be loaded: {0}")]
    ScriptLoad(String),

    /// Overlay reported an error
    #[error("Checkout failed: {0}")]
    Checkout(String),

    /// Backend did not verify the payment signature
    #[error("Payment verification failed: {0}")]
    Verification(String),

    /// Visitor closed the overlay without paying
    #[error("Payment was cancelled before completion")]
    Abandoned,
}

/// Type alias for widget Result
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Type alias for flow step Result
pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// Type alias for backend Result
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Type alias for payment Result
pub type PaymentResult<T> = std::result::Result<T, PaymentError>;
