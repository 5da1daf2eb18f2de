//! Callback bridge for host-driven checkout overlays
//!
//! The overlay itself lives in the host page. [`ChannelCheckout`] turns the
//! overlay's callback style into a future: `open` hands the host a
//! [`PendingCheckout`] and waits until the host reports success or
//! dismissal. Dropping a pending checkout without answering counts as a
//! dismissal.

use crate::error::{PaymentError, PaymentResult};
use crate::payment::{CheckoutGateway, CheckoutOptions, CheckoutOutcome, CheckoutSuccess};
use async_trait::async_trait;
use futures::channel::oneshot;
use tokio::sync::mpsc;
use tracing::debug;

/// An overlay the host should show
#[derive(Debug)]
pub struct PendingCheckout {
    pub options: CheckoutOptions,
    responder: oneshot::Sender<CheckoutOutcome>,
}

impl PendingCheckout {
    /// Report the overlay's success callback
    pub fn succeed(self, success: CheckoutSuccess) {
        // Receiver gone means the flow was closed mid-payment
        let _ = self.responder.send(CheckoutOutcome::Completed(success));
    }

    /// Report that the visitor closed the overlay
    pub fn dismiss(self) {
        let _ = self.responder.send(CheckoutOutcome::Dismissed);
    }
}

/// Host side of the bridge: overlays waiting to be shown
#[derive(Debug)]
pub struct CheckoutRequests {
    script_loaded: mpsc::UnboundedReceiver<()>,
    pending: mpsc::UnboundedReceiver<PendingCheckout>,
}

impl CheckoutRequests {
    /// Wait for the next overlay request
    pub async fn next(&mut self) -> Option<PendingCheckout> {
        self.pending.recv().await
    }

    /// Wait for the widget to ask for the checkout script
    pub async fn script_requested(&mut self) -> Option<()> {
        self.script_loaded.recv().await
    }
}

/// Checkout gateway answered by the host page
#[derive(Debug, Clone)]
pub struct ChannelCheckout {
    script_loaded: mpsc::UnboundedSender<()>,
    pending: mpsc::UnboundedSender<PendingCheckout>,
}

impl ChannelCheckout {
    pub fn new() -> (Self, CheckoutRequests) {
        let (script_tx, script_rx) = mpsc::unbounded_channel();
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        (
            Self {
                script_loaded: script_tx,
                pending: pending_tx,
            },
            CheckoutRequests {
                script_loaded: script_rx,
                pending: pending_rx,
            },
        )
    }
}

#[async_trait]
impl CheckoutGateway for ChannelCheckout {
    async fn load_script(&self) -> PaymentResult<()> {
        self.script_loaded
            .send(())
            .map_err(|_| PaymentError::ScriptLoad("host page is not listening".to_string()))
    }

    async fn open(&self, options: CheckoutOptions) -> PaymentResult<CheckoutOutcome> {
        let (tx, rx) = oneshot::channel();
        debug!(order_id = %options.order_id, "Requesting checkout overlay");

        self.pending
            .send(PendingCheckout {
                options,
                responder: tx,
            })
            .map_err(|_| PaymentError::Checkout("host page is not listening".to_string()))?;

        // A dropped responder is the overlay closing without a callback
        Ok(rx.await.unwrap_or(CheckoutOutcome::Dismissed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{Prefill, Theme};

    fn options() -> CheckoutOptions {
        CheckoutOptions {
            key: "rzp_test_key".to_string(),
            amount: 10_000,
            currency: "INR".to_string(),
            name: "Museum".to_string(),
            description: "Booking 1 ticket(s)".to_string(),
            order_id: "order_1".to_string(),
            prefill: Prefill {
                name: "Asha".to_string(),
                email: "a@b.test".to_string(),
                contact: "999".to_string(),
            },
            theme: Theme {
                color: "#8B5CF6".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_host_success_resolves_open() {
        let (gateway, mut requests) = ChannelCheckout::new();

        let host = tokio::spawn(async move {
            let pending = requests.next().await.unwrap();
            assert_eq!(pending.options.order_id, "order_1");
            pending.succeed(CheckoutSuccess {
                razorpay_order_id: "order_1".to_string(),
                razorpay_payment_id: "pay_1".to_string(),
                razorpay_signature: "sig".to_string(),
            });
        });

        let outcome = gateway.open(options()).await.unwrap();
        host.await.unwrap();
        assert!(matches!(outcome, CheckoutOutcome::Completed(s) if s.razorpay_payment_id == "pay_1"));
    }

    #[tokio::test]
    async fn test_dropped_pending_is_dismissal() {
        let (gateway, mut requests) = ChannelCheckout::new();

        let host = tokio::spawn(async move {
            let pending = requests.next().await.unwrap();
            drop(pending);
        });

        let outcome = gateway.open(options()).await.unwrap();
        host.await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::Dismissed);
    }

    #[tokio::test]
    async fn test_no_host_listener_fails() {
        let (gateway, requests) = ChannelCheckout::new();
        drop(requests);

        assert!(matches!(
            gateway.load_script().await,
            Err(PaymentError::ScriptLoad(_))
        ));
        assert!(matches!(
            gateway.open(options()).await,
            Err(PaymentError::Checkout(_))
        ));
    }
}
