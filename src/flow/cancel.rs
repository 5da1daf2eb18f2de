//! Booking cancellation flow
//!
//! Email entry → OTP verification → date selection, then a single
//! cancellation request. Back always moves exactly one step.

use crate::backend::{CancelBookingRequest, OtpRequest};
use crate::error::{FieldErrors, FlowError, FlowResult};
use crate::flow::machine::{StateMachine, Transition};
use crate::flow::{backend_field_errors, backend_message, format_dmy, Field, FlowCompletion, FlowContext};
use crate::i18n::Language;
use crate::types::FlowId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelStep {
    EmailEntry,
    Verification,
    DateSelection,
}

impl CancelStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::EmailEntry => 1,
            Self::Verification => 2,
            Self::DateSelection => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CancelEvent {
    OtpSent,
    OtpVerified,
    Back,
}

fn transitions() -> Vec<Transition<CancelStep, CancelEvent>> {
    use CancelEvent::*;
    use CancelStep::*;
    vec![
        Transition::new(EmailEntry, OtpSent, Verification),
        Transition::new(Verification, OtpVerified, DateSelection),
        Transition::new(Verification, Back, EmailEntry),
        Transition::new(DateSelection, Back, Verification),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelForm {
    pub email: String,
    pub otp: String,
    date: Option<NaiveDate>,
}

impl CancelForm {
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

#[derive(Debug)]
pub struct CancelBookingFlow {
    ctx: FlowContext,
    machine: StateMachine<CancelStep, CancelEvent>,
    form: CancelForm,
    errors: FieldErrors,
    message: Option<String>,
}

impl CancelBookingFlow {
    pub fn new(ctx: FlowContext) -> FlowResult<Self> {
        Ok(Self {
            ctx,
            machine: StateMachine::new("cancel-booking", CancelStep::EmailEntry, transitions())?,
            form: CancelForm::default(),
            errors: FieldErrors::new(),
            message: None,
        })
    }

    pub fn step(&self) -> CancelStep {
        self.machine.current()
    }

    pub fn form(&self) -> &CancelForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut CancelForm {
        &mut self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Switch the language used for messages from now on
    pub fn set_language(&mut self, language: Language) {
        self.ctx.set_language(language);
    }

    /// Language used for this flow's messages
    pub fn language(&self) -> Language {
        self.ctx.language()
    }

    /// Identity of this flow instance
    pub fn id(&self) -> FlowId {
        self.ctx.id()
    }

    /// Submit is only offered once both email and date are filled in
    pub fn is_ready(&self) -> bool {
        !self.form.email.trim().is_empty() && self.form.date.is_some()
    }

    fn begin(&mut self, expected: CancelStep) -> FlowResult<()> {
        if self.step() != expected {
            return Err(FlowError::InvalidTransition {
                state: format!("{:?}", self.step()),
                event: format!("action for {:?}", expected),
            });
        }
        self.errors = FieldErrors::new();
        self.message = None;
        Ok(())
    }

    fn reject(&mut self, errors: FieldErrors, message: String) -> FlowError {
        self.errors = errors;
        self.message = Some(message.clone());
        FlowError::Backend(message)
    }

    /// Step 1: send a cancellation OTP to the email on file
    pub async fn submit_email(&mut self) -> FlowResult<CancelStep> {
        self.begin(CancelStep::EmailEntry)?;
        let t = self.ctx.translations();
        let email = self.form.email.trim().to_string();
        if email.is_empty() {
            let error = FlowError::required(Field::Email, t.email_required);
            self.errors.insert(Field::Email, t.email_required);
            return Err(error);
        }

        match self.ctx.backend.send_cancellation_otp(&email).await {
            Ok(reply) if !reply.is_success() => {
                let message = reply.message.unwrap_or_else(|| t.otp_send_failed.to_string());
                Err(self.reject(FieldErrors::new(), message))
            }
            Ok(reply) => {
                self.message = reply.message;
                Ok(self.machine.fire(CancelEvent::OtpSent)?)
            }
            Err(e) => {
                warn!(error = %e, "Cancellation OTP not sent");
                let message = backend_message(&e, t.otp_send_failed, t.something_went_wrong);
                Err(self.reject(backend_field_errors(&e), message))
            }
        }
    }

    /// Step 2: check the cancellation OTP
    pub async fn verify_otp(&mut self) -> FlowResult<CancelStep> {
        self.begin(CancelStep::Verification)?;
        let t = self.ctx.translations();
        if self.form.otp.trim().is_empty() {
            self.errors.insert(Field::Otp, t.otp_required);
            return Err(FlowError::required(Field::Otp, t.otp_required));
        }

        let request = OtpRequest {
            email: self.form.email.trim().to_string(),
            otp: self.form.otp.trim().to_string(),
        };
        match self.ctx.backend.verify_cancellation_otp(&request).await {
            Ok(reply) if !reply.is_success() => {
                let message = reply.message.unwrap_or_else(|| t.invalid_otp.to_string());
                Err(self.reject(FieldErrors::new(), message))
            }
            Ok(reply) => {
                self.message = reply.message;
                Ok(self.machine.fire(CancelEvent::OtpVerified)?)
            }
            Err(e) => {
                warn!(error = %e, "Cancellation OTP rejected");
                let message = backend_message(&e, t.invalid_otp, t.something_went_wrong);
                Err(self.reject(backend_field_errors(&e), message))
            }
        }
    }

    /// Step 3: pick the booking date to cancel; past days are refused
    pub fn select_date(&mut self, date: NaiveDate) -> FlowResult<()> {
        let t = self.ctx.translations();
        if date < self.ctx.today() {
            self.errors.insert(Field::Date, t.past_date);
            return Err(FlowError::required(Field::Date, t.past_date));
        }
        self.form.date = Some(date);
        self.errors = FieldErrors::new();
        Ok(())
    }

    /// Step 3: cancel the booking and report completion to the widget
    pub async fn submit_cancellation(&mut self) -> FlowResult<Option<String>> {
        self.begin(CancelStep::DateSelection)?;
        let t = self.ctx.translations();
        let date = match self.form.date {
            Some(date) => date,
            None => {
                self.errors.insert(Field::Date, t.date_required);
                return Err(FlowError::required(Field::Date, t.date_required));
            }
        };
        if date < self.ctx.today() {
            self.errors.insert(Field::Date, t.past_date);
            return Err(FlowError::required(Field::Date, t.past_date));
        }

        let request = CancelBookingRequest {
            email: self.form.email.trim().to_string(),
            date: format_dmy(date),
        };
        match self.ctx.backend.cancel_booking(&request).await {
            Ok(reply) if !reply.is_success() => {
                warn!(date = %request.date, "Cancellation not confirmed");
                let message = reply
                    .message
                    .unwrap_or_else(|| t.cancellation_failed.to_string());
                Err(self.reject(FieldErrors::new(), message))
            }
            Ok(reply) => {
                info!(date = %request.date, "Booking cancelled");
                self.message = reply.message.clone();
                self.ctx.complete(FlowCompletion::Cancelled {
                    message: reply.message.clone(),
                });
                Ok(reply.message)
            }
            Err(e) => {
                warn!(error = %e, "Cancellation failed");
                let message = backend_message(&e, t.cancellation_failed, t.something_went_wrong);
                Err(self.reject(backend_field_errors(&e), message))
            }
        }
    }

    /// Go back exactly one step
    pub fn back(&mut self) -> FlowResult<CancelStep> {
        let step = self.machine.fire(CancelEvent::Back)?;
        self.errors = FieldErrors::new();
        self.message = None;
        Ok(step)
    }
}
