//! Payment sub-protocol
//!
//! Runs one payment round-trip for a booking:
//!
//! 1. ask the backend for an order descriptor,
//! 2. load the checkout script (once per processor),
//! 3. open the checkout overlay prefilled with the payer's details,
//! 4. on overlay success, send the gateway identifiers and booking summary
//!    back to the backend for signature verification.
//!
//! Every failure is reported as a [`PaymentError`]; nothing is retried.

use crate::backend::{BookingInfo, BookingSummary, MuseumBackend, PaymentOrder, PaymentVerification};
use crate::config::WidgetConfig;
use crate::error::{PaymentError, PaymentResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub mod checkout;

pub use checkout::{ChannelCheckout, CheckoutRequests, PendingCheckout};

/// Payer details shown prefilled in the overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub color: String,
}

/// Options the checkout overlay is opened with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: Prefill,
    pub theme: Theme,
}

/// Identifiers the overlay hands back on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSuccess {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// How the overlay was left
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed(CheckoutSuccess),
    /// Overlay closed without paying
    Dismissed,
}

/// Third-party checkout integration
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Load the checkout script into the host page
    async fn load_script(&self) -> PaymentResult<()>;

    /// Open the overlay and wait until the visitor pays or leaves
    async fn open(&self, options: CheckoutOptions) -> PaymentResult<CheckoutOutcome>;
}

/// Drives the payment round-trip against a backend and a checkout gateway
pub struct PaymentProcessor {
    gateway: Box<dyn CheckoutGateway>,
    script: OnceCell<()>,
    checkout_key: String,
    merchant_name: String,
    theme_color: String,
}

impl std::fmt::Debug for PaymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProcessor")
            .field("script_loaded", &self.script_loaded())
            .field("merchant_name", &self.merchant_name)
            .finish()
    }
}

impl PaymentProcessor {
    pub fn new(gateway: Box<dyn CheckoutGateway>, config: &WidgetConfig) -> Self {
        Self {
            gateway,
            script: OnceCell::new(),
            checkout_key: config.checkout_key.clone(),
            merchant_name: config.merchant_name.clone(),
            theme_color: config.theme_color.clone(),
        }
    }

    /// Whether the checkout script is already in the page
    pub fn script_loaded(&self) -> bool {
        self.script.initialized()
    }

    /// Run the whole round-trip and return the verified payload
    pub async fn pay(
        &self,
        backend: &dyn MuseumBackend,
        booking: &BookingInfo,
    ) -> PaymentResult<PaymentVerification> {
        let order = self.create_order(backend, booking).await?;

        self.script
            .get_or_try_init(|| async {
                debug!("Loading checkout script");
                self.gateway.load_script().await
            })
            .await?;

        let options = self.checkout_options(&order, booking);
        let success = match self.gateway.open(options).await? {
            CheckoutOutcome::Completed(success) => success,
            CheckoutOutcome::Dismissed => {
                info!(order_id = %order.order_id, "Checkout dismissed");
                return Err(PaymentError::Abandoned);
            }
        };

        let verification = verification_payload(success, booking);
        let reply = backend
            .verify_payment(&verification, booking)
            .await
            .map_err(|e| PaymentError::Verification(e.to_string()))?;

        if !reply.is_success() {
            warn!(
                payment_id = %verification.razorpay_payment_id,
                message = reply.message.as_deref().unwrap_or(""),
                "Payment verification rejected"
            );
            return Err(PaymentError::Verification(
                reply
                    .message
                    .unwrap_or_else(|| "signature not verified".to_string()),
            ));
        }

        info!(
            payment_id = %verification.razorpay_payment_id,
            order_id = %verification.razorpay_order_id,
            "Payment verified"
        );
        Ok(verification)
    }

    async fn create_order(
        &self,
        backend: &dyn MuseumBackend,
        booking: &BookingInfo,
    ) -> PaymentResult<PaymentOrder> {
        let order = backend
            .create_order(booking)
            .await
            .map_err(|e| PaymentError::OrderCreation(e.to_string()))?;

        if !order.is_success() || order.order_id.is_empty() {
            return Err(PaymentError::OrderCreation(
                order
                    .message
                    .unwrap_or_else(|| "backend did not return an order".to_string()),
            ));
        }

        debug!(
            order_id = %order.order_id,
            amount = order.amount,
            currency = %order.currency,
            "Payment order created"
        );
        Ok(order)
    }

    fn checkout_options(&self, order: &PaymentOrder, booking: &BookingInfo) -> CheckoutOptions {
        let data = &booking.booking_data;
        CheckoutOptions {
            key: self.checkout_key.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            name: self.merchant_name.clone(),
            description: format!("Booking {} ticket(s)", data.ticket),
            order_id: order.order_id.clone(),
            prefill: Prefill {
                name: data.name.clone(),
                email: data.mail.clone(),
                contact: data.phone.clone(),
            },
            theme: Theme {
                color: self.theme_color.clone(),
            },
        }
    }
}

/// Pair the gateway identifiers with the booking summary
pub fn verification_payload(success: CheckoutSuccess, booking: &BookingInfo) -> PaymentVerification {
    let data = &booking.booking_data;
    PaymentVerification {
        razorpay_order_id: success.razorpay_order_id,
        razorpay_payment_id: success.razorpay_payment_id,
        razorpay_signature: success.razorpay_signature,
        booking_info: BookingSummary {
            name: data.name.clone(),
            email: data.mail.clone(),
            phone: data.phone.clone(),
            ticket_count: data.ticket.clone(),
            date: data.date.clone(),
            time: data.time.clone(),
            location: data.location.clone(),
        },
    }
}
