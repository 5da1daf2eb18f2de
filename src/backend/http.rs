//! HTTP implementation of the booking backend
//!
//! Every endpoint is a JSON `POST`. A 2xx status with a JSON body is decoded
//! into the endpoint's reply type; any other status becomes
//! [`BackendError::Rejected`] carrying whatever message and field errors the
//! body held.

use crate::backend::{
    endpoints, BackendReply, BookingInfo, BookingRequest, CancelBookingRequest, MuseumBackend,
    OtpRequest, PaymentOrder, PaymentVerification, TicketImage, TicketRequest, UserInfoRequest,
};
use crate::config::WidgetConfig;
use crate::error::{BackendError, BackendResult, Result, WidgetError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Booking backend reached over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// `verify-payment` body: the verification payload merged with the booking info
#[derive(Serialize)]
struct VerifyPaymentBody<'a> {
    #[serde(flatten)]
    verification: &'a PaymentVerification,
    #[serde(flatten)]
    booking: &'a BookingInfo,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

impl HttpBackend {
    /// Create a backend client from the widget configuration
    pub fn new(config: &WidgetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WidgetError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a backend client for an explicit base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = WidgetConfig {
            backend_url: base_url.into(),
            ..WidgetConfig::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> BackendResult<reqwest::Response> {
        debug!(endpoint, "Sending backend request");

        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies use the same {message, errors} shape as success bodies
        let reply: BackendReply = response.json().await.unwrap_or_default();
        warn!(
            endpoint,
            status = status.as_u16(),
            message = reply.message.as_deref().unwrap_or(""),
            "Backend rejected request"
        );

        Err(BackendError::Rejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: reply.message,
            field_errors: reply.errors,
        })
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> BackendResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(endpoint, body).await?;
        response.json::<R>().await.map_err(|e| BackendError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl MuseumBackend for HttpBackend {
    async fn validate_user_info(&self, request: &UserInfoRequest) -> BackendResult<BackendReply> {
        self.post_json(endpoints::VALIDATE_USER_INFO, request).await
    }

    async fn verify_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply> {
        self.post_json(endpoints::VERIFY_OTP, request).await
    }

    async fn book_tickets(&self, request: &BookingRequest) -> BackendResult<BackendReply> {
        self.post_json(endpoints::BOOK_TICKETS, request).await
    }

    async fn create_order(&self, request: &BookingInfo) -> BackendResult<PaymentOrder> {
        self.post_json(endpoints::CREATE_ORDER, request).await
    }

    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
        booking: &BookingInfo,
    ) -> BackendResult<BackendReply> {
        let body = VerifyPaymentBody {
            verification,
            booking,
        };
        self.post_json(endpoints::VERIFY_PAYMENT, &body).await
    }

    async fn generate_ticket(&self, request: &TicketRequest) -> BackendResult<TicketImage> {
        let response = self.send(endpoints::GENERATE_TICKET, request).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| BackendError::Decode {
            endpoint: endpoints::GENERATE_TICKET.to_string(),
            message: e.to_string(),
        })?;

        Ok(TicketImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn send_cancellation_otp(&self, email: &str) -> BackendResult<BackendReply> {
        self.post_json(endpoints::SEND_OTP, &EmailBody { email }).await
    }

    async fn verify_cancellation_otp(&self, request: &OtpRequest) -> BackendResult<BackendReply> {
        self.post_json(endpoints::VERIFY_CANCELLATION_OTP, request)
            .await
    }

    async fn cancel_booking(&self, request: &CancelBookingRequest) -> BackendResult<BackendReply> {
        self.post_json(endpoints::CANCEL_BOOKING, request).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
