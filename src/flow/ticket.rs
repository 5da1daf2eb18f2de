//! Ticket booking flow
//!
//! ```text
//!  PersonalInfo(1) --InfoAccepted--> Verification(2) --OtpVerified--> TicketDetails(3)
//!        ^  ^                             |                              |   |
//!        |  +------------Back-------------+                              |   |
//!        +----------------------EditPersonalInfo-------------------------+   |
//!        |                                                  PaymentVerified  |
//!        +--BookAnother-- Confirmation(4) <----------------------------------+
//! ```
//!
//! Step 3 submits the booking and then runs the payment sub-protocol; the
//! flow only reaches Confirmation through a verified payment.

use crate::backend::{
    AdditionalPassenger, BookingData, BookingInfo, BookingRequest, MainPassenger,
    PassengerRecord, PaymentVerification, TicketRequest, UserInfoRequest,
};
use crate::conversation::BookingDetails;
use crate::error::{FieldErrors, FlowError, FlowResult, PaymentError};
use crate::flow::machine::{StateMachine, Transition};
use crate::flow::{
    backend_field_errors, backend_message, format_dmy, format_iso, Field, FlowCompletion,
    FlowContext,
};
use crate::i18n::Language;
use crate::ticket::TICKET_FILE_NAME;
use crate::types::FlowId;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Value stored for state and pincode outside India
pub const NOT_APPLICABLE: &str = "NA";

/// Youngest age that may book; anyone at or below is rejected
pub const MIN_AGE_EXCLUSIVE: u32 = 12;

/// Steps of the booking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStep {
    PersonalInfo,
    Verification,
    TicketDetails,
    Confirmation,
}

impl TicketStep {
    /// 1-based position shown in the step indicator
    pub fn number(&self) -> u8 {
        match self {
            Self::PersonalInfo => 1,
            Self::Verification => 2,
            Self::TicketDetails => 3,
            Self::Confirmation => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TicketEvent {
    InfoAccepted,
    OtpVerified,
    PaymentVerified,
    Back,
    /// Step 3 back control: edit details, which re-sends the OTP on continue
    EditPersonalInfo,
    BookAnother,
}

fn transitions() -> Vec<Transition<TicketStep, TicketEvent>> {
    use TicketEvent::*;
    use TicketStep::*;
    vec![
        Transition::new(PersonalInfo, InfoAccepted, Verification),
        Transition::new(Verification, OtpVerified, TicketDetails),
        Transition::new(Verification, Back, PersonalInfo),
        Transition::new(TicketDetails, PaymentVerified, Confirmation),
        Transition::new(TicketDetails, EditPersonalInfo, PersonalInfo),
        Transition::new(Confirmation, BookAnother, PersonalInfo),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer-not-to-say",
        }
    }
}

/// Countries offered in the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    India,
    UnitedStates,
    UnitedKingdom,
    Canada,
    Australia,
    Germany,
    France,
    Japan,
    Other,
}

impl Country {
    pub const ALL: [Country; 9] = [
        Country::India,
        Country::UnitedStates,
        Country::UnitedKingdom,
        Country::Canada,
        Country::Australia,
        Country::Germany,
        Country::France,
        Country::Japan,
        Country::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::India => "India",
            Self::UnitedStates => "United States",
            Self::UnitedKingdom => "United Kingdom",
            Self::Canada => "Canada",
            Self::Australia => "Australia",
            Self::Germany => "Germany",
            Self::France => "France",
            Self::Japan => "Japan",
            Self::Other => "Other",
        }
    }

    /// Only India asks for state and pincode
    pub fn requires_region(&self) -> bool {
        matches!(self, Self::India)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the visitor enters across the booking steps
///
/// Text fields hold raw input. The additional passenger list always has
/// `ticket_count - 1` entries; the count is changed through
/// [`TicketBookingFlow::set_ticket_count`], which only accepts counts the
/// picker offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingForm {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub age: String,
    pub gender: Option<Gender>,
    country: Option<Country>,
    pub state: String,
    pub pincode: String,
    pub otp: String,
    pub date: Option<NaiveDate>,
    ticket_count: u32,
    additional_passengers: Vec<AdditionalPassenger>,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone_number: String::new(),
            email: String::new(),
            age: String::new(),
            gender: None,
            country: None,
            state: String::new(),
            pincode: String::new(),
            otp: String::new(),
            date: None,
            ticket_count: 1,
            additional_passengers: Vec::new(),
        }
    }
}

impl BookingForm {
    pub fn country(&self) -> Option<Country> {
        self.country
    }

    /// Pick a country; outside India state and pincode become `NA`
    pub fn set_country(&mut self, country: Country) {
        self.country = Some(country);
        if country.requires_region() {
            self.state.clear();
            self.pincode.clear();
        } else {
            self.state = NOT_APPLICABLE.to_string();
            self.pincode = NOT_APPLICABLE.to_string();
        }
    }

    pub fn ticket_count(&self) -> u32 {
        self.ticket_count
    }

    /// Resize the passenger list, keeping entries by index
    ///
    /// Callers bound `count` first; see [`TicketBookingFlow::set_ticket_count`].
    pub(crate) fn set_ticket_count(&mut self, count: u32) {
        self.ticket_count = count;
        let additional = count.saturating_sub(1) as usize;
        self.additional_passengers
            .resize_with(additional, AdditionalPassenger::default);
    }

    pub fn additional_passengers(&self) -> &[AdditionalPassenger] {
        &self.additional_passengers
    }

    /// Passenger `index` (0 is the second traveller)
    pub fn passenger_mut(&mut self, index: usize) -> Option<&mut AdditionalPassenger> {
        self.additional_passengers.get_mut(index)
    }

    pub fn set_passenger(&mut self, index: usize, full_name: impl Into<String>, age: impl Into<String>) -> bool {
        match self.additional_passengers.get_mut(index) {
            Some(passenger) => {
                passenger.full_name = full_name.into();
                passenger.age = age.into();
                true
            }
            None => false,
        }
    }

    fn user_info(&self) -> UserInfoRequest {
        UserInfoRequest {
            name: self.full_name.trim().to_string(),
            phone: self.phone_number.trim().to_string(),
            email: self.email.trim().to_string(),
            age: Some(self.age.trim().to_string()),
            gender: self.gender.map(|g| g.as_str().to_string()),
            country: self.country.map(|c| c.as_str().to_string()),
            state: Some(self.state.trim().to_string()),
            pincode: Some(self.pincode.trim().to_string()),
        }
    }

    fn contact_info(&self) -> UserInfoRequest {
        UserInfoRequest {
            name: self.full_name.trim().to_string(),
            phone: self.phone_number.trim().to_string(),
            email: self.email.trim().to_string(),
            age: None,
            gender: None,
            country: None,
            state: None,
            pincode: None,
        }
    }
}

/// Parse an age field; `None` when it is not a whole number
fn parse_age(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Ticket booking state machine over a [`BookingForm`]
#[derive(Debug)]
pub struct TicketBookingFlow {
    ctx: FlowContext,
    machine: StateMachine<TicketStep, TicketEvent>,
    form: BookingForm,
    errors: FieldErrors,
    message: Option<String>,
    /// Last ticket download problem, shown next to the step message
    download_error: Option<String>,
    paid: bool,
    ticket_payload: Option<PaymentVerification>,
}

impl TicketBookingFlow {
    pub fn new(ctx: FlowContext) -> FlowResult<Self> {
        Ok(Self {
            ctx,
            machine: StateMachine::new("ticket-booking", TicketStep::PersonalInfo, transitions())?,
            form: BookingForm::default(),
            errors: FieldErrors::new(),
            message: None,
            download_error: None,
            paid: false,
            ticket_payload: None,
        })
    }

    pub fn step(&self) -> TicketStep {
        self.machine.current()
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut BookingForm {
        &mut self.form
    }

    /// Inline field errors from the last action
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Flow-level message from the last action
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Why the last ticket download failed, if it did
    pub fn download_error(&self) -> Option<&str> {
        self.download_error.as_deref()
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    /// Verified payment kept for ticket re-download
    pub fn ticket_payload(&self) -> Option<&PaymentVerification> {
        self.ticket_payload.as_ref()
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

    /// Days that can be picked: tomorrow onwards, for `bookable_days` days
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        let today = self.ctx.today();
        (1..=i64::from(self.ctx.config.bookable_days))
            .map(|offset| today + Duration::days(offset))
            .collect()
    }

    /// Ticket counts offered in the picker
    pub fn ticket_choices(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.ctx.config.max_tickets
    }

    /// Pick the number of tickets and resize the passenger list to match
    ///
    /// Counts outside [`ticket_choices`](Self::ticket_choices) are refused
    /// and leave the form unchanged.
    pub fn set_ticket_count(&mut self, count: u32) -> FlowResult<()> {
        if !self.ticket_choices().contains(&count) {
            let t = self.ctx.translations();
            return Err(self.fail(FlowError::required(Field::TicketCount, t.tickets_required)));
        }
        self.form.set_ticket_count(count);
        Ok(())
    }

    fn begin(&mut self, expected: TicketStep) -> FlowResult<()> {
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

    fn fail(&mut self, error: FlowError) -> FlowError {
        match &error {
            FlowError::Validation(errors) => self.errors = errors.clone(),
            FlowError::Age { field, message } => self.errors.insert(*field, message.clone()),
            FlowError::Backend(message) => self.message = Some(message.clone()),
            FlowError::Payment(_) | FlowError::InvalidTransition { .. } => {}
        }
        error
    }

    /// Check step 1 without contacting the backend
    pub fn validate_personal_info(&self) -> FlowResult<()> {
        let t = self.ctx.translations();
        let form = &self.form;
        let mut errors = FieldErrors::new();

        let required = [
            (Field::FullName, form.full_name.as_str()),
            (Field::Age, form.age.as_str()),
            (Field::PhoneNumber, form.phone_number.as_str()),
            (Field::Email, form.email.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.insert(field, t.field_required);
            }
        }
        if form.gender.is_none() {
            errors.insert(Field::Gender, t.field_required);
        }
        match form.country {
            None => errors.insert(Field::Country, t.field_required),
            Some(country) if country.requires_region() => {
                if form.state.trim().is_empty() {
                    errors.insert(Field::State, t.field_required);
                }
                if form.pincode.trim().is_empty() {
                    errors.insert(Field::Pincode, t.field_required);
                }
            }
            Some(_) => {}
        }

        if !errors.is_empty() {
            return Err(FlowError::Validation(errors));
        }

        match parse_age(&form.age) {
            Some(age) if age > MIN_AGE_EXCLUSIVE => Ok(()),
            _ => Err(FlowError::Age {
                field: Field::Age,
                message: t.age_above_12.to_string(),
            }),
        }
    }

    /// Step 1: validate, send details to the backend and move to OTP entry
    pub async fn submit_personal_info(&mut self) -> FlowResult<TicketStep> {
        self.begin(TicketStep::PersonalInfo)?;
        if let Err(e) = self.validate_personal_info() {
            return Err(self.fail(e));
        }

        let t = self.ctx.translations();
        let request = self.form.user_info();
        match self.ctx.backend.validate_user_info(&request).await {
            Ok(reply) => {
                self.message = reply.message;
                Ok(self.machine.fire(TicketEvent::InfoAccepted)?)
            }
            Err(e) => {
                warn!(error = %e, "Personal info rejected");
                self.errors = backend_field_errors(&e);
                let message = backend_message(&e, t.something_went_wrong, t.something_went_wrong);
                Err(self.fail(FlowError::Backend(message)))
            }
        }
    }

    /// Step 2: ask the backend to send the OTP again
    pub async fn resend_otp(&mut self) -> FlowResult<()> {
        self.begin(TicketStep::Verification)?;
        let t = self.ctx.translations();
        let request = self.form.contact_info();

        match self.ctx.backend.validate_user_info(&request).await {
            Ok(reply) => {
                self.message = reply.message;
                Ok(())
            }
            Err(e) => {
                self.errors = backend_field_errors(&e);
                let message = backend_message(&e, t.something_went_wrong, t.something_went_wrong);
                Err(self.fail(FlowError::Backend(message)))
            }
        }
    }

    /// Step 2: verify the OTP and move to ticket selection
    pub async fn verify_otp(&mut self) -> FlowResult<TicketStep> {
        self.begin(TicketStep::Verification)?;
        let t = self.ctx.translations();
        if self.form.otp.trim().is_empty() {
            return Err(self.fail(FlowError::required(Field::Otp, t.otp_required)));
        }

        let request = crate::backend::OtpRequest {
            email: self.form.email.trim().to_string(),
            otp: self.form.otp.trim().to_string(),
        };
        match self.ctx.backend.verify_otp(&request).await {
            Ok(reply) => {
                self.message = reply.message;
                Ok(self.machine.fire(TicketEvent::OtpVerified)?)
            }
            Err(e) => {
                warn!(error = %e, "OTP verification failed");
                self.errors = backend_field_errors(&e);
                let message = backend_message(&e, t.invalid_otp, t.invalid_otp);
                Err(self.fail(FlowError::Backend(message)))
            }
        }
    }

    /// Check step 3 without contacting the backend
    pub fn validate_ticket_details(&self) -> FlowResult<()> {
        let t = self.ctx.translations();
        let form = &self.form;

        match form.date {
            None => return Err(FlowError::required(Field::Date, t.date_required)),
            Some(date) if !self.available_dates().contains(&date) => {
                return Err(FlowError::required(Field::Date, t.date_unavailable))
            }
            Some(_) => {}
        }

        if !self.ticket_choices().contains(&form.ticket_count) {
            return Err(FlowError::required(Field::TicketCount, t.tickets_required));
        }

        if form.ticket_count > 1 {
            let incomplete = form
                .additional_passengers
                .iter()
                .any(|p| p.full_name.trim().is_empty() || p.age.trim().is_empty());
            if incomplete {
                return Err(FlowError::required(
                    Field::AdditionalPassengers,
                    t.fill_all_passenger_details,
                ));
            }

            let underage = form
                .additional_passengers
                .iter()
                .any(|p| !matches!(parse_age(&p.age), Some(age) if age > MIN_AGE_EXCLUSIVE));
            if underage {
                return Err(FlowError::Age {
                    field: Field::AdditionalPassengers,
                    message: t.all_passengers_above_12.to_string(),
                });
            }
        }

        Ok(())
    }

    fn booking_request(&self, date: NaiveDate) -> BookingRequest {
        BookingRequest {
            email: self.form.email.trim().to_string(),
            date: format_iso(date),
            tickets: self.form.ticket_count,
            main_passenger: MainPassenger {
                name: self.form.full_name.trim().to_string(),
                age: self.form.age.trim().to_string(),
            },
            additional_passengers: self.form.additional_passengers.clone(),
        }
    }

    /// Payment order for the current form
    pub fn booking_info(&self, date: NaiveDate) -> BookingInfo {
        let config = &self.ctx.config;
        let receipt_id = Uuid::new_v4().simple().to_string();

        let mut passengers = vec![PassengerRecord {
            name: self.form.full_name.trim().to_string(),
            age: self.form.age.trim().to_string(),
        }];
        passengers.extend(self.form.additional_passengers.iter().map(|p| PassengerRecord {
            name: p.full_name.trim().to_string(),
            age: p.age.trim().to_string(),
        }));

        BookingInfo {
            amount: u64::from(self.form.ticket_count) * config.ticket_unit_price,
            currency: config.currency.clone(),
            receipt: format!("receipt#{}", &receipt_id[..8]),
            booking_data: BookingData {
                name: self.form.full_name.trim().to_string(),
                mail: self.form.email.trim().to_string(),
                phone: self.form.phone_number.trim().to_string(),
                ticket: self.form.ticket_count.to_string(),
                date: format_iso(date),
                time: Local::now().format("%H:%M").to_string(),
                location: config.museum_location.clone(),
                passengers,
            },
        }
    }

    /// Step 3: persist the booking, take payment and download the ticket
    ///
    /// Reaches [`TicketStep::Confirmation`] only when the backend verifies
    /// the payment. Any failure leaves the flow on step 3.
    pub async fn book_and_pay(&mut self) -> FlowResult<TicketStep> {
        self.begin(TicketStep::TicketDetails)?;
        if let Err(e) = self.validate_ticket_details() {
            return Err(self.fail(e));
        }
        let t = self.ctx.translations();
        let date = match self.form.date {
            Some(date) => date,
            None => return Err(self.fail(FlowError::required(Field::Date, t.date_required))),
        };

        match self.ctx.backend.book_tickets(&self.booking_request(date)).await {
            Ok(reply) if !reply.is_success() => {
                // Payment still goes ahead; the backend reconciles on verification
                warn!(
                    message = reply.message.as_deref().unwrap_or(""),
                    "Booking not confirmed before payment"
                );
                self.message = reply.message;
            }
            Ok(reply) => self.message = reply.message,
            Err(e) => {
                warn!(error = %e, "Booking request failed");
                let message = backend_message(&e, t.something_went_wrong, t.something_went_wrong);
                return Err(self.fail(FlowError::Backend(message)));
            }
        }

        let booking = self.booking_info(date);
        let verification = match self.ctx.payments.pay(self.ctx.backend.as_ref(), &booking).await {
            Ok(verification) => verification,
            Err(e) => {
                warn!(error = %e, "Payment failed");
                self.paid = false;
                self.message = Some(
                    match e {
                        PaymentError::Abandoned => t.payment_cancelled,
                        PaymentError::Verification(_) => t.payment_verification_failed,
                        _ => t.payment_error,
                    }
                    .to_string(),
                );
                return Err(FlowError::Payment(e));
            }
        };

        self.paid = true;
        self.message = Some(t.payment_success.to_string());
        let step = self.machine.fire(TicketEvent::PaymentVerified)?;
        self.ticket_payload = Some(verification);

        info!(
            tickets = self.form.ticket_count,
            date = %date,
            "Booking paid"
        );

        // Download problems are shown but never undo the booking
        if let Err(e) = self.download_ticket().await {
            warn!(error = %e, "Automatic ticket download failed");
        }

        self.ctx.complete(FlowCompletion::Booked(BookingDetails {
            date,
            ticket_count: self.form.ticket_count,
            full_name: self.form.full_name.trim().to_string(),
        }));

        Ok(step)
    }

    /// Step 4: render the ticket again and hand it to the ticket sink
    pub async fn download_ticket(&mut self) -> FlowResult<()> {
        let t = self.ctx.translations();
        let payload = match &self.ticket_payload {
            Some(payload) => payload,
            None => {
                return Err(FlowError::InvalidTransition {
                    state: format!("{:?}", self.step()),
                    event: "download_ticket without a verified payment".to_string(),
                })
            }
        };

        let request = TicketRequest {
            payment_id: payload.razorpay_payment_id.clone(),
            date: self.form.date.map(format_dmy).unwrap_or_default(),
            name: payload.booking_info.name.clone(),
            ticket: payload.booking_info.ticket_count.clone(),
            valid_status: 1,
            email: self.form.email.trim().to_string(),
        };

        let image = match self.ctx.backend.generate_ticket(&request).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Ticket generation failed");
                return Err(self.download_failed(t.download_failed));
            }
        };

        if let Err(e) = self.ctx.tickets.save(TICKET_FILE_NAME, &image).await {
            warn!(error = %e, "Ticket could not be saved");
            return Err(self.download_failed(t.download_failed));
        }
        self.download_error = None;
        Ok(())
    }

    // Kept apart from `message` so a failed download never hides the payment result
    fn download_failed(&mut self, message: &str) -> FlowError {
        self.download_error = Some(message.to_string());
        FlowError::Backend(message.to_string())
    }

    /// Back control: step 2 → 1, step 3 → 1 (edit details)
    pub fn back(&mut self) -> FlowResult<TicketStep> {
        let event = match self.step() {
            TicketStep::Verification => TicketEvent::Back,
            TicketStep::TicketDetails => TicketEvent::EditPersonalInfo,
            TicketStep::PersonalInfo | TicketStep::Confirmation => TicketEvent::Back,
        };
        let step = self.machine.fire(event)?;
        self.errors = FieldErrors::new();
        self.message = None;
        Ok(step)
    }

    /// Step 4: start a new booking in the same flow
    ///
    /// Personal details are kept; OTP, date, tickets and payment are cleared.
    pub fn book_another(&mut self) -> FlowResult<TicketStep> {
        let step = self.machine.fire(TicketEvent::BookAnother)?;
        self.form.otp.clear();
        self.form.date = None;
        self.form.set_ticket_count(1);
        self.paid = false;
        self.ticket_payload = None;
        self.download_error = None;
        self.errors = FieldErrors::new();
        self.message = None;
        Ok(step)
    }
}
