// Chat widget shell
//
// This module implements the top-level ChatWidget that owns the conversation
// log, the visible language, the open/closed state and the single active flow
// slot, and applies flow completions to the log.
//
// The slot lock is only ever held for a lookup or a swap. Each flow sits behind
// its own mutex, so a step waiting on the backend or the checkout overlay never
// blocks closing the flow, switching language or reading the log.

use crate::backend::MuseumBackend;
use crate::config::WidgetConfig;
use crate::conversation::{Conversation, Message};
use crate::error::{Result, WidgetError};
use crate::flow::{
    CancelBookingFlow, CompletionSender, FlowCompletion, FlowContext, TicketBookingFlow,
};
use crate::i18n::{Language, OptionKey};
use crate::menu::{self, MenuAction};
use crate::payment::{CheckoutGateway, PaymentProcessor};
use crate::ticket::{MemoryTicketSink, TicketSink};
use crate::types::{BookingRef, FlowId, WidgetId};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Flow currently shown on top of the chat
#[derive(Debug, Clone)]
pub enum ActiveFlow {
    Ticket {
        id: FlowId,
        flow: Arc<Mutex<TicketBookingFlow>>,
    },
    Cancel {
        id: FlowId,
        flow: Arc<Mutex<CancelBookingFlow>>,
    },
}

impl ActiveFlow {
    fn ticket(flow: TicketBookingFlow) -> Self {
        Self::Ticket {
            id: flow.id(),
            flow: Arc::new(Mutex::new(flow)),
        }
    }

    fn cancel(flow: CancelBookingFlow) -> Self {
        Self::Cancel {
            id: flow.id(),
            flow: Arc::new(Mutex::new(flow)),
        }
    }

    pub fn id(&self) -> FlowId {
        match self {
            Self::Ticket { id, .. } | Self::Cancel { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ticket { .. } => "ticket",
            Self::Cancel { .. } => "cancel",
        }
    }
}

#[derive(Debug)]
struct WidgetState {
    conversation: Conversation,
    language: Language,
    is_open: bool,
    last_booking: Option<BookingRef>,
}

/// Shared between the widget, its delayed replies and its completion listener
#[derive(Debug)]
struct Shared {
    state: RwLock<WidgetState>,
    /// Never held across an await
    flow: Mutex<Option<ActiveFlow>>,
    /// Open flows read their language from here
    language: watch::Sender<Language>,
    /// One-shot guard: set while a cancel flow is pending
    cancel_pending: AtomicBool,
    unmounted: AtomicBool,
    reply_delay: Duration,
}

impl Shared {
    async fn append_later(self: Arc<Self>, message: Message) {
        tokio::time::sleep(self.reply_delay).await;
        if self.unmounted.load(Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.write().await;
        debug!(kind = ?message.kind, "Appending delayed reply");
        state.conversation.push(message);
    }

    async fn is_active(&self, id: FlowId) -> bool {
        self.flow.lock().await.as_ref().map(ActiveFlow::id) == Some(id)
    }

    async fn apply_completion(self: Arc<Self>, id: FlowId, completion: FlowCompletion) {
        match completion {
            FlowCompletion::Booked(details) => {
                if !self.is_active(id).await {
                    debug!(flow_id = %id, "Booking from a closed flow dropped");
                    return;
                }
                info!(
                    date = %details.date,
                    tickets = details.ticket_count,
                    "Booking confirmed"
                );
                tokio::time::sleep(self.reply_delay).await;
                let mut state = self.state.write().await;
                let t = state.language.translations();
                let card = state
                    .conversation
                    .push(Message::booking_confirmation(t.booking_confirmation, details));
                state.last_booking = Some(BookingRef::from(card));
            }
            FlowCompletion::Cancelled { message } => {
                info!(message = message.as_deref().unwrap_or(""), "Booking cancelled");
                {
                    let mut slot = self.flow.lock().await;
                    if slot.as_ref().map(ActiveFlow::id) != Some(id) {
                        debug!(flow_id = %id, "Cancellation from a closed flow dropped");
                        return;
                    }
                    *slot = None;
                }
                self.cancel_pending.store(false, Ordering::SeqCst);

                tokio::time::sleep(self.reply_delay).await;
                let mut state = self.state.write().await;
                let t = state.language.translations();
                state
                    .conversation
                    .push(Message::quick_replies(t.cancel_confirmation, &OptionKey::QUICK_REPLIES));
                state.last_booking = None;
            }
        }
    }
}

/// The embeddable museum chat widget
///
/// Every visitor action appends to the conversation log immediately; scripted
/// replies land after the configured reply delay on a spawned task, whose
/// handle is returned so callers can wait for it.
pub struct ChatWidget {
    id: WidgetId,
    config: Arc<WidgetConfig>,
    backend: Arc<dyn MuseumBackend>,
    payments: Arc<PaymentProcessor>,
    tickets: Arc<dyn TicketSink>,
    today: Option<NaiveDate>,
    shared: Arc<Shared>,
    completions: CompletionSender,
    listener: JoinHandle<()>,
}

impl std::fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ChatWidget {
    /// Create a new widget builder
    pub fn builder() -> ChatWidgetBuilder {
        ChatWidgetBuilder::new()
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn payments(&self) -> &PaymentProcessor {
        &self.payments
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.shared.unmounted.load(Ordering::SeqCst) {
            return Err(WidgetError::Unmounted);
        }
        Ok(())
    }

    fn reply_later(&self, message: Message) -> JoinHandle<()> {
        tokio::spawn(self.shared.clone().append_later(message))
    }

    async fn push(&self, message: Message) {
        self.shared.state.write().await.conversation.push(message);
    }

    /// Snapshot of the conversation log
    pub async fn messages(&self) -> Vec<Message> {
        self.shared.state.read().await.conversation.messages().to_vec()
    }

    pub async fn language(&self) -> Language {
        self.shared.state.read().await.language
    }

    pub async fn is_open(&self) -> bool {
        self.shared.state.read().await.is_open
    }

    /// Confirmation card of the most recent booking, if not cancelled since
    pub async fn last_booking(&self) -> Option<BookingRef> {
        self.shared.state.read().await.last_booking
    }

    /// Show or hide the chat window
    pub async fn toggle(&self) -> bool {
        let mut state = self.shared.state.write().await;
        state.is_open = !state.is_open;
        debug!(widget_id = %self.id, open = state.is_open, "Chat toggled");
        state.is_open
    }

    pub async fn open(&self) {
        self.shared.state.write().await.is_open = true;
    }

    /// Hide the chat; pending replies still land in the log
    pub async fn close(&self) {
        self.shared.state.write().await.is_open = false;
    }

    /// Switch language and restart the conversation with the welcome menu
    pub async fn set_language(&self, code: &str) -> Result<Language> {
        self.ensure_mounted()?;
        let language = Language::from_code(code);
        {
            let mut state = self.shared.state.write().await;
            state.language = language;
            state.conversation = Conversation::with_welcome(language.translations());
        }
        self.shared.language.send_replace(language);
        info!(widget_id = %self.id, language = language.code(), "Language changed");
        Ok(language)
    }

    /// Handle a button on a menu message
    pub async fn select_menu_option(&self, key: OptionKey) -> Result<Option<JoinHandle<()>>> {
        self.ensure_mounted()?;
        let t = self.language().await.translations();
        self.push(menu::echo(t, key)).await;

        let action = menu::dispatch(key);
        debug!(widget_id = %self.id, option = ?key, action = ?action, "Menu option selected");

        match action {
            MenuAction::OpenTicketFlow => {
                self.open_ticket_flow().await?;
                Ok(None)
            }
            MenuAction::OpenCancelFlow => {
                self.open_cancel_flow().await?;
                Ok(None)
            }
            MenuAction::Respond(_) | MenuAction::ShowMenu => {
                Ok(menu::reply(t, action).map(|message| self.reply_later(message)))
            }
        }
    }

    /// Handle a quick-reply button; every quick reply leads back to the menu
    pub async fn select_quick_reply(&self, key: OptionKey) -> Result<JoinHandle<()>> {
        self.ensure_mounted()?;
        let t = self.language().await.translations();
        self.push(menu::echo(t, key)).await;
        Ok(self.reply_later(Message::welcome(t)))
    }

    /// Free text from the input box; answered with the fallback menu
    ///
    /// Blank input is ignored and returns `Ok(None)`.
    pub async fn send_message(&self, text: &str) -> Result<Option<JoinHandle<()>>> {
        self.ensure_mounted()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        if matches!(
            self.shared.flow.lock().await.as_ref(),
            Some(ActiveFlow::Ticket { .. })
        ) {
            return Err(WidgetError::InputDisabled);
        }

        let t = self.language().await.translations();
        self.push(Message::user(text.trim())).await;
        Ok(Some(self.reply_later(menu::fallback(t))))
    }

    /// Confirmation card's reschedule button
    pub async fn reschedule_booking(&self) -> Result<bool> {
        self.ensure_mounted()?;
        let t = self.language().await.translations();
        self.push(menu::echo(t, OptionKey::RescheduleBooking)).await;
        self.open_ticket_flow().await
    }

    fn flow_context(&self) -> FlowContext {
        let mut ctx = FlowContext::new(
            self.config.clone(),
            self.backend.clone(),
            self.payments.clone(),
            self.tickets.clone(),
        )
        .follow_language(self.shared.language.subscribe())
        .with_completions(self.completions.clone());
        if let Some(today) = self.today {
            ctx = ctx.with_today(today);
        }
        ctx
    }

    /// Open the ticket booking flow; `false` if a flow is already open
    pub async fn open_ticket_flow(&self) -> Result<bool> {
        self.ensure_mounted()?;
        let mut slot = self.shared.flow.lock().await;
        if let Some(active) = slot.as_ref() {
            debug!(widget_id = %self.id, active = active.kind(), "Flow already open");
            return Ok(false);
        }
        let flow = TicketBookingFlow::new(self.flow_context())?;
        info!(widget_id = %self.id, flow_id = %flow.id(), "Ticket flow opened");
        *slot = Some(ActiveFlow::ticket(flow));
        Ok(true)
    }

    /// Open the cancellation flow
    ///
    /// Ignored (returns `false`) while a cancellation is already pending or
    /// another flow is open.
    pub async fn open_cancel_flow(&self) -> Result<bool> {
        self.ensure_mounted()?;
        if self
            .shared
            .cancel_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(widget_id = %self.id, "Cancel flow already pending");
            return Ok(false);
        }

        let mut slot = self.shared.flow.lock().await;
        if slot.is_some() {
            self.shared.cancel_pending.store(false, Ordering::SeqCst);
            return Ok(false);
        }
        match CancelBookingFlow::new(self.flow_context()) {
            Ok(flow) => {
                info!(widget_id = %self.id, flow_id = %flow.id(), "Cancel flow opened");
                *slot = Some(ActiveFlow::cancel(flow));
                Ok(true)
            }
            Err(e) => {
                self.shared.cancel_pending.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Close whichever flow is open (its cancel control)
    ///
    /// Works while a step is still waiting on the backend or the checkout
    /// overlay; whatever that step completes afterwards is not applied.
    pub async fn close_flow(&self) -> Option<&'static str> {
        let closed = self.shared.flow.lock().await.take();
        let kind = closed.as_ref().map(ActiveFlow::kind);
        if matches!(closed, Some(ActiveFlow::Cancel { .. })) {
            self.shared.cancel_pending.store(false, Ordering::SeqCst);
        }
        if let Some(kind) = kind {
            info!(widget_id = %self.id, flow = kind, "Flow closed");
        }
        kind
    }

    /// Kind of the open flow, if any
    pub async fn active_flow(&self) -> Option<&'static str> {
        self.shared.flow.lock().await.as_ref().map(ActiveFlow::kind)
    }

    /// Exclusive access to the open ticket flow
    ///
    /// Holding the guard blocks other actions on this flow, so only one
    /// backend call per flow is in flight at a time. The rest of the widget
    /// stays usable. The guard is owned and may be moved into a task.
    pub async fn ticket_flow(&self) -> Result<OwnedMutexGuard<TicketBookingFlow>> {
        let flow = match self.shared.flow.lock().await.as_ref() {
            Some(ActiveFlow::Ticket { flow, .. }) => flow.clone(),
            _ => return Err(WidgetError::NoActiveFlow("ticket")),
        };
        Ok(flow.lock_owned().await)
    }

    /// Exclusive access to the open cancellation flow
    pub async fn cancel_flow(&self) -> Result<OwnedMutexGuard<CancelBookingFlow>> {
        let flow = match self.shared.flow.lock().await.as_ref() {
            Some(ActiveFlow::Cancel { flow, .. }) => flow.clone(),
            _ => return Err(WidgetError::NoActiveFlow("cancel")),
        };
        Ok(flow.lock_owned().await)
    }

    /// Stop the completion listener and refuse further actions
    ///
    /// Replies already scheduled are dropped when they wake up.
    pub fn shutdown(&self) {
        if !self.shared.unmounted.swap(true, Ordering::SeqCst) {
            self.listener.abort();
            info!(widget_id = %self.id, "Widget shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.unmounted.load(Ordering::SeqCst)
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Builder for ChatWidget
pub struct ChatWidgetBuilder {
    config: WidgetConfig,
    backend: Option<Arc<dyn MuseumBackend>>,
    checkout: Option<Box<dyn CheckoutGateway>>,
    tickets: Option<Arc<dyn TicketSink>>,
    today: Option<NaiveDate>,
}

impl ChatWidgetBuilder {
    pub fn new() -> Self {
        Self {
            config: WidgetConfig::default(),
            backend: None,
            checkout: None,
            tickets: None,
            today: None,
        }
    }

    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to an [`HttpBackend`](crate::backend::HttpBackend) on the configured URL
    pub fn backend(mut self, backend: Arc<dyn MuseumBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn checkout(mut self, gateway: Box<dyn CheckoutGateway>) -> Self {
        self.checkout = Some(gateway);
        self
    }

    /// Defaults to an in-memory sink
    pub fn tickets(mut self, sink: Arc<dyn TicketSink>) -> Self {
        self.tickets = Some(sink);
        self
    }

    /// Pin the flows' calendar to a fixed day
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Build the widget and start its completion listener
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<ChatWidget> {
        self.config.validate()?;

        let checkout = self
            .checkout
            .ok_or_else(|| WidgetError::Configuration("Checkout gateway is required".to_string()))?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(crate::backend::HttpBackend::new(&self.config)?),
        };

        let tickets = self
            .tickets
            .unwrap_or_else(|| Arc::new(MemoryTicketSink::new()));

        let language = self.config.default_language;
        let shared = Arc::new(Shared {
            state: RwLock::new(WidgetState {
                conversation: Conversation::with_welcome(language.translations()),
                language,
                is_open: false,
                last_booking: None,
            }),
            flow: Mutex::new(None),
            language: watch::channel(language).0,
            cancel_pending: AtomicBool::new(false),
            unmounted: AtomicBool::new(false),
            reply_delay: self.config.reply_delay,
        });

        let (completions, mut receiver) = mpsc::unbounded_channel();
        let listener_shared = shared.clone();
        let listener = tokio::spawn(async move {
            while let Some((id, completion)) = receiver.recv().await {
                listener_shared.clone().apply_completion(id, completion).await;
            }
        });

        let payments = Arc::new(PaymentProcessor::new(checkout, &self.config));
        let id = WidgetId::new();
        info!(widget_id = %id, backend = backend.name(), "Widget created");

        Ok(ChatWidget {
            id,
            config: Arc::new(self.config),
            backend,
            payments,
            tickets,
            today: self.today,
            shared,
            completions,
            listener,
        })
    }
}

impl Default for ChatWidgetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{MessageKind, MessageRole};
    use crate::payment::ChannelCheckout;

    fn widget() -> ChatWidget {
        let (gateway, _requests) = ChannelCheckout::new();
        ChatWidget::builder()
            .checkout(Box::new(gateway))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_builder_requires_checkout() {
        let result = ChatWidget::builder().build();
        assert!(matches!(result, Err(WidgetError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_starts_with_welcome_menu() {
        let widget = widget();
        let messages = widget.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Menu);
        assert_eq!(messages[0].option_keys().len(), 8);
        assert!(!widget.is_open().await);
    }

    #[tokio::test]
    async fn test_toggle() {
        let widget = widget();
        assert!(widget.toggle().await);
        assert!(!widget.toggle().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_message_ignored() {
        let widget = widget();
        assert!(widget.send_message("   ").await.unwrap().is_none());
        assert_eq!(widget.messages().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_reply_returns_to_menu() {
        let widget = widget();
        widget
            .select_quick_reply(OptionKey::AnythingElse)
            .await
            .unwrap()
            .await
            .unwrap();

        let messages = widget.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[2].kind, MessageKind::Menu);
        assert_eq!(messages[2].option_keys(), &OptionKey::WELCOME_MENU);
    }

    #[tokio::test]
    async fn test_flows_are_exclusive() {
        let widget = widget();
        assert!(widget.open_ticket_flow().await.unwrap());
        assert!(!widget.open_cancel_flow().await.unwrap());
        assert_eq!(widget.active_flow().await, Some("ticket"));

        assert_eq!(widget.close_flow().await, Some("ticket"));
        assert!(widget.open_cancel_flow().await.unwrap());
        assert!(!widget.open_cancel_flow().await.unwrap());
        assert!(widget.ticket_flow().await.is_err());
        assert!(widget.cancel_flow().await.is_ok());
    }

    #[tokio::test]
    async fn test_busy_flow_does_not_block_the_slot() {
        let widget = widget();
        widget.open_ticket_flow().await.unwrap();
        let busy = widget.ticket_flow().await.unwrap();

        assert_eq!(widget.active_flow().await, Some("ticket"));
        assert!(matches!(
            widget.send_message("hi").await,
            Err(WidgetError::InputDisabled)
        ));
        widget.set_language("hi").await.unwrap();
        assert_eq!(busy.step(), crate::flow::TicketStep::PersonalInfo);
        assert_eq!(widget.close_flow().await, Some("ticket"));

        drop(busy);
        assert!(widget.ticket_flow().await.is_err());
    }

    #[tokio::test]
    async fn test_open_flow_follows_language_switch() {
        let widget = widget();
        widget.open_cancel_flow().await.unwrap();
        let flow = widget.cancel_flow().await.unwrap();

        widget.set_language("hi").await.unwrap();
        assert_eq!(flow.language(), Language::Hindi);
    }

    #[tokio::test]
    async fn test_shutdown_refuses_actions() {
        let widget = widget();
        widget.shutdown();
        assert!(matches!(
            widget.select_menu_option(OptionKey::About).await,
            Err(WidgetError::Unmounted)
        ));
    }
}
