//! Shared doubles for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use museum_chat::backend::{
    endpoints, BookingInfo, BookingRequest, CancelBookingRequest, OtpRequest, PaymentOrder,
    PaymentVerification, TicketImage, TicketRequest, UserInfoRequest,
};
use museum_chat::error::{BackendError, BackendResult, PaymentResult};
use museum_chat::payment::{CheckoutOptions, CheckoutOutcome, CheckoutSuccess};
use museum_chat::{BackendReply, ChatWidget, CheckoutGateway, MemoryTicketSink, MuseumBackend};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Route library logs to the test output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed "today" so bookable dates are stable
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + chrono::Duration::days(days)
}

/// Backend whose replies are scripted per endpoint; unscripted endpoints succeed
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<&'static str, BackendResult<BackendReply>>>,
    order: Mutex<Option<PaymentOrder>>,
    ticket: Mutex<Option<BackendResult<TicketImage>>>,
    calls: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: &'static str, reply: BackendResult<BackendReply>) {
        self.replies.lock().unwrap().insert(endpoint, reply);
    }

    pub fn reject(&self, endpoint: &'static str, status: u16, message: &str) {
        self.reply(
            endpoint,
            Err(BackendError::Rejected {
                endpoint: endpoint.to_string(),
                status,
                message: Some(message.to_string()),
                field_errors: Default::default(),
            }),
        );
    }

    pub fn unreachable(&self, endpoint: &'static str) {
        self.reply(
            endpoint,
            Err(BackendError::Transport {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            }),
        );
    }

    pub fn order(&self, order: PaymentOrder) {
        *self.order.lock().unwrap() = Some(order);
    }

    pub fn ticket(&self, ticket: BackendResult<TicketImage>) {
        *self.ticket.lock().unwrap() = Some(ticket);
    }

    /// Endpoints called so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    /// Body of the last call to `endpoint`
    pub fn last_body(&self, endpoint: &str) -> Option<serde_json::Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, body)| body.clone())
    }

    fn record(&self, endpoint: &'static str, body: serde_json::Value) {
        self.calls.lock().unwrap().push((endpoint, body));
    }

    fn scripted(&self, endpoint: &'static str) -> BackendResult<BackendReply> {
        self.replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Ok(BackendReply::success(format!("{} ok", endpoint))))
    }
}

#[async_trait]
impl MuseumBackend for ScriptedBackend {
    async fn validate_user_info(&self, request: &UserInfoRequest) -> BackendResult<BackendReply> {
        self.record(endpoints::VALIDATE_USER_INFO, serde_json::to_value(request).unwrap());
        self.scripted(endpoints::VALIDATE_USER_INFO)
    }

    async fn verify_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply> {
        self.record(endpoints::VERIFY_OTP, serde_json::to_value(request).unwrap());
        self.scripted(endpoints::VERIFY_OTP)
    }

    async fn book_tickets(&self, request: &BookingRequest) -> BackendResult<BackendReply> {
        self.record(endpoints::BOOK_TICKETS, serde_json::to_value(request).unwrap());
        self.scripted(endpoints::BOOK_TICKETS)
    }

    async fn create_order(&self, request: &BookingInfo) -> BackendResult<PaymentOrder> {
        self.record(endpoints::CREATE_ORDER, serde_json::to_value(request).unwrap());
        let order = self.order.lock().unwrap().clone();
        Ok(order.unwrap_or_else(|| PaymentOrder {
            status: Some("success".to_string()),
            message: None,
            order_id: "order_test".to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
        }))
    }

    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
        _booking: &BookingInfo,
    ) -> BackendResult<BackendReply> {
        self.record(endpoints::VERIFY_PAYMENT, serde_json::to_value(verification).unwrap());
        self.scripted(endpoints::VERIFY_PAYMENT)
    }

    async fn generate_ticket(&self, request: &TicketRequest) -> BackendResult<TicketImage> {
        self.record(endpoints::GENERATE_TICKET, serde_json::to_value(request).unwrap());
        self.ticket.lock().unwrap().clone().unwrap_or_else(|| {
            Ok(TicketImage {
                bytes: b"\x89PNG ticket".to_vec(),
                content_type: Some("image/png".to_string()),
            })
        })
    }

    async fn send_cancellation_otp(&self, email: &str) -> BackendResult<BackendReply> {
        self.record(endpoints::SEND_OTP, serde_json::json!({ "email": email }));
        self.scripted(endpoints::SEND_OTP)
    }

    async fn verify_cancellation_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply> {
        self.record(
            endpoints::VERIFY_CANCELLATION_OTP,
            serde_json::to_value(request).unwrap(),
        );
        self.scripted(endpoints::VERIFY_CANCELLATION_OTP)
    }

    async fn cancel_booking(&self, request: &CancelBookingRequest) -> BackendResult<BackendReply> {
        self.record(endpoints::CANCEL_BOOKING, serde_json::to_value(request).unwrap());
        self.scripted(endpoints::CANCEL_BOOKING)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Checkout overlay that answers immediately
pub struct InstantCheckout {
    outcome: CheckoutOutcome,
    pub opened: Arc<Mutex<Vec<CheckoutOptions>>>,
}

impl InstantCheckout {
    pub fn paying() -> Self {
        Self {
            outcome: CheckoutOutcome::Completed(CheckoutSuccess {
                razorpay_order_id: "order_test".to_string(),
                razorpay_payment_id: "pay_test".to_string(),
                razorpay_signature: "sig_test".to_string(),
            }),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn dismissing() -> Self {
        Self {
            outcome: CheckoutOutcome::Dismissed,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CheckoutGateway for InstantCheckout {
    async fn load_script(&self) -> PaymentResult<()> {
        Ok(())
    }

    async fn open(&self, options: CheckoutOptions) -> PaymentResult<CheckoutOutcome> {
        self.opened.lock().unwrap().push(options);
        Ok(self.outcome.clone())
    }
}

/// Widget wired to scripted collaborators
pub fn widget(
    backend: Arc<ScriptedBackend>,
    checkout: InstantCheckout,
    tickets: Arc<MemoryTicketSink>,
) -> ChatWidget {
    widget_with_gateway(backend, Box::new(checkout), tickets)
}

/// Same, with any checkout gateway
pub fn widget_with_gateway(
    backend: Arc<ScriptedBackend>,
    checkout: Box<dyn CheckoutGateway>,
    tickets: Arc<MemoryTicketSink>,
) -> ChatWidget {
    init_tracing();
    ChatWidget::builder()
        .backend(backend)
        .checkout(checkout)
        .tickets(tickets)
        .today(today())
        .build()
        .expect("widget builds")
}
