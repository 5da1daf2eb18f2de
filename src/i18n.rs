//! Localized strings for the widget
//!
//! Option keys and information topics are closed enums, so every label and
//! canned response lookup is an exhaustive `match` checked at compile time.
//! Unknown language codes resolve to English.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported widget languages
///
/// Only English (`en`) and Hindi (`hi`) have string tables. Any other code,
/// including the regional ones the language picker used to list (`bn`, `gu`,
/// `ta`, `te`, `kn`, `pa`, `mr`), resolves to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    /// Resolve a language code, falling back to English
    ///
    /// Codes without a string table are logged at debug level.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "hi" | "hi-in" => Self::Hindi,
            "en" | "en-us" | "en-gb" | "en-in" => Self::English,
            other => {
                tracing::debug!(code = other, "No translations for language, using English");
                Self::English
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
        }
    }

    /// Name of the language in its own script, for the language picker
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "हिन्दी",
        }
    }

    pub fn translations(&self) -> &'static Translations {
        match self {
            Self::English => &EN,
            Self::Hindi => &HI,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every selectable option in menus, quick replies and booking cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionKey {
    OpeningHours,
    TicketPrices,
    Exhibitions,
    Directions,
    Facilities,
    About,
    BookTicket,
    CancelBooking,
    AnythingElse,
    ReturnToMenu,
    RescheduleBooking,
}

impl OptionKey {
    /// Options of the welcome menu, in display order
    pub const WELCOME_MENU: [OptionKey; 8] = [
        OptionKey::OpeningHours,
        OptionKey::TicketPrices,
        OptionKey::Exhibitions,
        OptionKey::Directions,
        OptionKey::Facilities,
        OptionKey::About,
        OptionKey::BookTicket,
        OptionKey::CancelBooking,
    ];

    /// Options offered after unrecognised free text
    pub const FALLBACK_MENU: [OptionKey; 7] = [
        OptionKey::OpeningHours,
        OptionKey::TicketPrices,
        OptionKey::Exhibitions,
        OptionKey::Directions,
        OptionKey::Facilities,
        OptionKey::About,
        OptionKey::BookTicket,
    ];

    /// Follow-ups attached to every canned response
    pub const QUICK_REPLIES: [OptionKey; 2] = [OptionKey::AnythingElse, OptionKey::ReturnToMenu];

    /// Actions offered on a booking confirmation card
    pub const BOOKING_CONFIRMATION: [OptionKey; 4] = [
        OptionKey::CancelBooking,
        OptionKey::RescheduleBooking,
        OptionKey::AnythingElse,
        OptionKey::ReturnToMenu,
    ];

    /// The information topic this option answers, if it is one
    pub fn info_topic(&self) -> Option<InfoTopic> {
        match self {
            Self::OpeningHours => Some(InfoTopic::OpeningHours),
            Self::TicketPrices => Some(InfoTopic::TicketPrices),
            Self::Exhibitions => Some(InfoTopic::Exhibitions),
            Self::Directions => Some(InfoTopic::Directions),
            Self::Facilities => Some(InfoTopic::Facilities),
            Self::About => Some(InfoTopic::About),
            Self::BookTicket
            | Self::CancelBooking
            | Self::AnythingElse
            | Self::ReturnToMenu
            | Self::RescheduleBooking => None,
        }
    }
}

/// Topics with a canned informational response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InfoTopic {
    OpeningHours,
    TicketPrices,
    Exhibitions,
    Directions,
    Facilities,
    About,
}

/// Canned responses for the information topics
#[derive(Debug)]
pub struct Responses {
    pub opening_hours: &'static str,
    pub ticket_prices: &'static str,
    pub exhibitions: &'static str,
    pub directions: &'static str,
    pub facilities: &'static str,
    pub about: &'static str,
}

/// String table for one language
#[derive(Debug)]
pub struct Translations {
    pub welcome: &'static str,
    pub fallback: &'static str,
    pub type_message: &'static str,
    pub greeting_bubble: &'static str,

    pub opening_hours: &'static str,
    pub ticket_prices: &'static str,
    pub exhibitions: &'static str,
    pub directions: &'static str,
    pub facilities: &'static str,
    pub about: &'static str,
    pub book_ticket: &'static str,
    pub cancel_booking: &'static str,
    pub anything_else: &'static str,
    pub return_to_menu: &'static str,
    pub reschedule_booking: &'static str,

    pub booking_confirmation: &'static str,
    pub cancel_confirmation: &'static str,
    pub booking_details: &'static str,
    pub full_name: &'static str,
    pub date: &'static str,
    pub tickets: &'static str,

    pub field_required: &'static str,
    pub age_above_12: &'static str,
    pub date_required: &'static str,
    pub date_unavailable: &'static str,
    pub tickets_required: &'static str,
    pub fill_all_passenger_details: &'static str,
    pub all_passengers_above_12: &'static str,
    pub email_required: &'static str,
    pub otp_required: &'static str,
    pub past_date: &'static str,

    pub something_went_wrong: &'static str,
    pub invalid_otp: &'static str,
    pub otp_send_failed: &'static str,
    pub cancellation_failed: &'static str,
    pub payment_success: &'static str,
    pub payment_verification_failed: &'static str,
    pub payment_error: &'static str,
    pub payment_cancelled: &'static str,
    pub download_failed: &'static str,

    pub responses: Responses,
}

impl Translations {
    /// Localized button label for an option
    pub fn label(&self, key: OptionKey) -> &'static str {
        match key {
            OptionKey::OpeningHours => self.opening_hours,
            OptionKey::TicketPrices => self.ticket_prices,
            OptionKey::Exhibitions => self.exhibitions,
            OptionKey::Directions => self.directions,
            OptionKey::Facilities => self.facilities,
            OptionKey::About => self.about,
            OptionKey::BookTicket => self.book_ticket,
            OptionKey::CancelBooking => self.cancel_booking,
            OptionKey::AnythingElse => self.anything_else,
            OptionKey::ReturnToMenu => self.return_to_menu,
            OptionKey::RescheduleBooking => self.reschedule_booking,
        }
    }

    /// Canned response body for a topic
    pub fn response(&self, topic: InfoTopic) -> &'static str {
        match topic {
            InfoTopic::OpeningHours => self.responses.opening_hours,
            InfoTopic::TicketPrices => self.responses.ticket_prices,
            InfoTopic::Exhibitions => self.responses.exhibitions,
            InfoTopic::Directions => self.responses.directions,
            InfoTopic::Facilities => self.responses.facilities,
            InfoTopic::About => self.responses.about,
        }
    }
}

/// Resolve a language code to its string table
pub fn translations_for(code: &str) -> &'static Translations {
    Language::from_code(code).translations()
}

static EN: Translations = Translations {
    welcome: "Welcome to the Museum of Natural History! I'm your virtual assistant. How can I help you today?",
    fallback: "I'm not sure I understood that. Please choose one of the options below.",
    type_message: "Type a message...",
    greeting_bubble: "Hello there, how can I assist you?",

    opening_hours: "Opening Hours",
    ticket_prices: "Ticket Prices",
    exhibitions: "Current Exhibitions",
    directions: "Directions",
    facilities: "Facilities",
    about: "About the Museum",
    book_ticket: "Book Tickets",
    cancel_booking: "Cancel Booking",
    anything_else: "Anything else?",
    return_to_menu: "Return to Menu",
    reschedule_booking: "Reschedule Booking",

    booking_confirmation: "Your booking is confirmed! Here are your booking details.",
    cancel_confirmation: "Your booking has been cancelled. Is there anything else I can help you with?",
    booking_details: "Booking Details",
    full_name: "Full Name",
    date: "Date",
    tickets: "Tickets",

    field_required: "This field is required",
    age_above_12: "Age must be above 12 years",
    date_required: "Please select a date",
    date_unavailable: "Please select one of the available dates",
    tickets_required: "Please select the number of tickets",
    fill_all_passenger_details: "Please fill in the details of all passengers",
    all_passengers_above_12: "All passengers must be above 12 years of age",
    email_required: "Please enter your email.",
    otp_required: "Please enter the OTP.",
    past_date: "Please choose today or a later date",

    something_went_wrong: "Something went wrong. Please try again.",
    invalid_otp: "Invalid OTP. Please try again.",
    otp_send_failed: "Failed to send OTP.",
    cancellation_failed: "Cancellation failed.",
    payment_success: "Payment successful and verified! Your tickets have been booked.",
    payment_verification_failed: "Payment verification failed. Please contact support.",
    payment_error: "Error verifying payment.",
    payment_cancelled: "Payment was cancelled. You can try again when you are ready.",
    download_failed: "Ticket download failed. Please try again.",

    responses: Responses {
        opening_hours: "The museum is open Tuesday to Sunday, 10:00 AM to 6:00 PM. We are closed on Mondays and national holidays.",
        ticket_prices: "Adults: ₹100\nStudents (with ID): ₹50\nChildren under 12: Free\nGuided tours: ₹200 per person",
        exhibitions: "Current exhibitions:\n• Dinosaurs: Giants of the Past\n• Gems and Minerals\n• Ocean Life\n• Human Origins",
        directions: "We are located in the city centre. The nearest metro station is a 5-minute walk away, and paid parking is available on site.",
        facilities: "Facilities include a café, gift shop, cloakroom, wheelchair access, baby-care room and free Wi-Fi.",
        about: "The Museum of Natural History houses over a million specimens and welcomes visitors of all ages to explore the natural world.",
    },
};

static HI: Translations = Translations {
    welcome: "प्राकृतिक इतिहास संग्रहालय में आपका स्वागत है! मैं आपका वर्चुअल सहायक हूँ। आज मैं आपकी कैसे मदद कर सकता हूँ?",
    fallback: "मुझे यह समझ नहीं आया। कृपया नीचे दिए गए विकल्पों में से एक चुनें।",
    type_message: "संदेश लिखें...",
    greeting_bubble: "नमस्ते, मैं आपकी कैसे मदद कर सकता हूँ?",

    opening_hours: "खुलने का समय",
    ticket_prices: "टिकट की कीमतें",
    exhibitions: "वर्तमान प्रदर्शनियाँ",
    directions: "दिशा-निर्देश",
    facilities: "सुविधाएँ",
    about: "संग्रहालय के बारे में",
    book_ticket: "टिकट बुक करें",
    cancel_booking: "बुकिंग रद्द करें",
    anything_else: "और कुछ?",
    return_to_menu: "मेनू पर लौटें",
    reschedule_booking: "बुकिंग का समय बदलें",

    booking_confirmation: "आपकी बुकिंग की पुष्टि हो गई है! यह रहे आपकी बुकिंग के विवरण।",
    cancel_confirmation: "आपकी बुकिंग रद्द कर दी गई है। क्या मैं आपकी और कोई मदद कर सकता हूँ?",
    booking_details: "बुकिंग विवरण",
    full_name: "पूरा नाम",
    date: "तारीख",
    tickets: "टिकट",

    field_required: "यह फ़ील्ड आवश्यक है",
    age_above_12: "आयु 12 वर्ष से अधिक होनी चाहिए",
    date_required: "कृपया एक तारीख चुनें",
    date_unavailable: "कृपया उपलब्ध तारीखों में से एक चुनें",
    tickets_required: "कृपया टिकटों की संख्या चुनें",
    fill_all_passenger_details: "कृपया सभी यात्रियों का विवरण भरें",
    all_passengers_above_12: "सभी यात्रियों की आयु 12 वर्ष से अधिक होनी चाहिए",
    email_required: "कृपया अपना ईमेल दर्ज करें।",
    otp_required: "कृपया OTP दर्ज करें।",
    past_date: "कृपया आज या उसके बाद की तारीख चुनें",

    something_went_wrong: "कुछ गलत हो गया। कृपया पुनः प्रयास करें।",
    invalid_otp: "अमान्य OTP। कृपया पुनः प्रयास करें।",
    otp_send_failed: "OTP भेजने में विफल।",
    cancellation_failed: "रद्दीकरण विफल रहा।",
    payment_success: "भुगतान सफल और सत्यापित! आपके टिकट बुक हो गए हैं।",
    payment_verification_failed: "भुगतान सत्यापन विफल। कृपया सहायता से संपर्क करें।",
    payment_error: "भुगतान सत्यापित करने में त्रुटि।",
    payment_cancelled: "भुगतान रद्द कर दिया गया। आप तैयार होने पर फिर से प्रयास कर सकते हैं।",
    download_failed: "टिकट डाउनलोड विफल। कृपया पुनः प्रयास करें।",

    responses: Responses {
        opening_hours: "संग्रहालय मंगलवार से रविवार, सुबह 10:00 से शाम 6:00 बजे तक खुला रहता है। सोमवार और राष्ट्रीय अवकाश पर बंद रहता है।",
        ticket_prices: "वयस्क: ₹100\nछात्र (आईडी के साथ): ₹50\n12 वर्ष से कम बच्चे: निःशुल्क\nगाइडेड टूर: ₹200 प्रति व्यक्ति",
        exhibitions: "वर्तमान प्रदर्शनियाँ:\n• डायनासोर: अतीत के दिग्गज\n• रत्न और खनिज\n• समुद्री जीवन\n• मानव उत्पत्ति",
        directions: "हम शहर के केंद्र में स्थित हैं। निकटतम मेट्रो स्टेशन 5 मिनट की पैदल दूरी पर है, और परिसर में सशुल्क पार्किंग उपलब्ध है।",
        facilities: "सुविधाओं में कैफ़े, उपहार की दुकान, क्लोकरूम, व्हीलचेयर पहुँच, शिशु-देखभाल कक्ष और मुफ़्त वाई-फ़ाई शामिल हैं।",
        about: "प्राकृतिक इतिहास संग्रहालय में दस लाख से अधिक नमूने हैं और यह सभी उम्र के आगंतुकों का प्राकृतिक दुनिया को जानने के लिए स्वागत करता है।",
    },
};
