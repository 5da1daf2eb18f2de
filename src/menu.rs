//! Menu and quick-reply dispatch
//!
//! Maps a selected option to what the widget does next. The widget applies
//! the result; this module never touches the conversation log itself.

use crate::conversation::Message;
use crate::i18n::{InfoTopic, OptionKey, Translations};

/// What selecting an option leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Delayed canned response with quick replies
    Respond(InfoTopic),
    /// Delayed welcome menu
    ShowMenu,
    OpenTicketFlow,
    OpenCancelFlow,
}

/// Resolve a menu selection
///
/// `anythingElse` and `returnToMenu` produce the same result; they are kept
/// as separate keys only because they render differently.
pub fn dispatch(key: OptionKey) -> MenuAction {
    match (key, key.info_topic()) {
        (_, Some(topic)) => MenuAction::Respond(topic),
        (OptionKey::BookTicket | OptionKey::RescheduleBooking, None) => MenuAction::OpenTicketFlow,
        (OptionKey::CancelBooking, None) => MenuAction::OpenCancelFlow,
        (_, None) => MenuAction::ShowMenu,
    }
}

/// The user-side echo of a selection
pub fn echo(t: &Translations, key: OptionKey) -> Message {
    Message::user(t.label(key))
}

/// The delayed assistant reply for an action, if the action has one
pub fn reply(t: &Translations, action: MenuAction) -> Option<Message> {
    match action {
        MenuAction::Respond(topic) => Some(Message::quick_replies(
            t.response(topic),
            &OptionKey::QUICK_REPLIES,
        )),
        MenuAction::ShowMenu => Some(Message::welcome(t)),
        MenuAction::OpenTicketFlow | MenuAction::OpenCancelFlow => None,
    }
}

/// The delayed reply to uninterpreted free text
pub fn fallback(t: &Translations) -> Message {
    Message::menu(t.fallback, &OptionKey::FALLBACK_MENU)
}
