//! Change notification for rendering layers.
//!
//! The core never talks to a screen. Anything that wants to draw the
//! conversation registers a [`ChatObserver`] and is called back after every
//! state transition and after every streaming overwrite of the trailing
//! message.

use crate::oracle::app::RequestState;
use crate::oracle::conversation::Conversation;

/// Receives a snapshot of the observable state after each change.
pub trait ChatObserver: Send {
    fn on_change(&self, conversation: &Conversation, state: RequestState);
}

/// A no-op observer following the Null Object Pattern.
///
/// Used as the default so client code needs no conditional checks.
pub struct NullObserver;

impl ChatObserver for NullObserver {
    fn on_change(&self, _conversation: &Conversation, _state: RequestState) {
        // Do nothing
    }
}
