//! Booking backend abstraction
//!
//! This module provides a trait-based abstraction over the museum's booking
//! service, so the flows can run against the HTTP backend in production and
//! against scripted doubles in tests. The wire types mirror the JSON bodies
//! the service expects.

use crate::error::BackendResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod http;

pub use http::HttpBackend;

/// Endpoint names, relative to the backend base URL
pub mod endpoints {
    pub const VALIDATE_USER_INFO: &str = "validate-user-info";
    pub const VERIFY_OTP: &str = "verify-otp";
    pub const BOOK_TICKETS: &str = "book-tickets";
    pub const CREATE_ORDER: &str = "create-order";
    pub const VERIFY_PAYMENT: &str = "verify-payment";
    pub const GENERATE_TICKET: &str = "generate-ticket";
    pub const SEND_OTP: &str = "send-otp";
    pub const VERIFY_CANCELLATION_OTP: &str = "verify-cancellation-otp";
    pub const CANCEL_BOOKING: &str = "cancel-booking";
}

/// Generic JSON reply: `{status?, message?, errors?}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-field validation errors keyed by form field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl BackendReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Some("success".to_string()),
            message: Some(message.into()),
            errors: BTreeMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Some("error".to_string()),
            message: Some(message.into()),
            errors: BTreeMap::new(),
        }
    }

    /// True when the body carries `status: "success"`
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Personal details submitted to trigger the booking OTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfoRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

/// Email + code pair for either OTP check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainPassenger {
    pub name: String,
    pub age: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalPassenger {
    pub full_name: String,
    pub age: String,
}

/// Booking persisted before payment; `date` is `yyyy-mm-dd`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub email: String,
    pub date: String,
    pub tickets: u32,
    pub main_passenger: MainPassenger,
    pub additional_passengers: Vec<AdditionalPassenger>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub name: String,
    pub age: String,
}

/// Booking data carried through payment to ticket generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingData {
    pub name: String,
    pub mail: String,
    pub phone: String,
    pub ticket: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub passengers: Vec<PassengerRecord>,
}

/// Payment order request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInfo {
    /// Minor currency units
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub booking_data: BookingData,
}

/// Order descriptor returned by `create-order`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub currency: String,
}

impl PaymentOrder {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Booking summary echoed back with payment verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ticket_count: String,
    pub date: String,
    pub time: String,
    pub location: String,
}

/// Gateway identifiers plus booking summary, checked by `verify-payment`
///
/// Retained after a successful payment so the ticket can be downloaded again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "bookingInfo")]
    pub booking_info: BookingSummary,
}

/// Ticket rendering request; `date` is `dd-mm-yyyy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub payment_id: String,
    pub date: String,
    pub name: String,
    pub ticket: String,
    pub valid_status: u8,
    pub email: String,
}

/// Cancellation request; `date` is `dd-mm-yyyy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub email: String,
    pub date: String,
}

/// Rendered ticket image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Trait for booking backend implementations
#[async_trait]
pub trait MuseumBackend: Send + Sync {
    /// Validate personal info and send the booking OTP
    async fn validate_user_info(&self, request: &UserInfoRequest) -> BackendResult<BackendReply>;

    /// Verify the booking OTP
    async fn verify_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply>;

    /// Persist a booking ahead of payment
    async fn book_tickets(&self, request: &BookingRequest) -> BackendResult<BackendReply>;

    /// Create a payment order
    async fn create_order(&self, request: &BookingInfo) -> BackendResult<PaymentOrder>;

    /// Verify a payment signature
    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
        booking: &BookingInfo,
    ) -> BackendResult<BackendReply>;

    /// Render the ticket image
    async fn generate_ticket(&self, request: &TicketRequest) -> BackendResult<TicketImage>;

    /// Send the cancellation OTP
    async fn send_cancellation_otp(&self, email: &str) -> BackendResult<BackendReply>;

    /// Verify the cancellation OTP
    async fn verify_cancellation_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply>;

    /// Cancel the booking on a given date
    async fn cancel_booking(&self, request: &CancelBookingRequest) -> BackendResult<BackendReply>;

    /// Name used in logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_reply_success_signal() {
        assert!(BackendReply::success("ok").is_success());
        assert!(!BackendReply::failure("nope").is_success());
        assert!(!BackendReply::default().is_success());
    }

    #[test]
    fn test_reply_deserializes_errors_map() {
        let reply: BackendReply = serde_json::from_str(
            r#"{"message": "Invalid data", "errors": {"email": "Email is invalid"}}"#,
        )
        .unwrap();
        assert_eq!(reply.status, None);
        assert_eq!(reply.errors.get("email").unwrap(), "Email is invalid");
    }

    #[test]
    fn test_booking_request_wire_shape() {
        let request = BookingRequest {
            email: "a@b.test".to_string(),
            date: "2026-10-20".to_string(),
            tickets: 2,
            main_passenger: MainPassenger {
                name: "Asha".to_string(),
                age: "30".to_string(),
            },
            additional_passengers: vec![AdditionalPassenger {
                full_name: "Ravi".to_string(),
                age: "28".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mainPassenger"]["name"], "Asha");
        assert_eq!(json["additionalPassengers"][0]["fullName"], "Ravi");
    }

    #[test]
    fn test_user_info_contact_only_skips_missing_fields() {
        let request = UserInfoRequest {
            name: "Asha".to_string(),
            phone: "9999999999".to_string(),
            email: "a@b.test".to_string(),
            age: None,
            gender: None,
            country: None,
            state: None,
            pincode: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("age").is_none());
        assert_eq!(json["email"], "a@b.test");
    }

    #[test]
    fn test_payment_order_deserializes_camel_case() {
        let order: PaymentOrder = serde_json::from_str(
            r#"{"status": "success", "orderId": "order_1", "amount": 20000, "currency": "INR"}"#,
        )
        .unwrap();
        assert!(order.is_success());
        assert_eq!(order.order_id, "order_1");
        assert_eq!(order.amount, 20000);
    }
}
