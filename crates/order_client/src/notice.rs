//! Transient user-facing notifications.

use tokio::sync::broadcast;

use crate::submission::FieldErrors;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
pub const ORDER_ADDED_MESSAGE: &str = "Order details added!";
pub const LISTING_LOAD_ERROR_MESSAGE: &str =
    "An error occurred loading the existing purchase orders.";

const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    /// A submit attempt stopped before the network because fields were missing.
    Validation(FieldErrors),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Success(_))
    }

    pub fn text(&self) -> String {
        match self {
            Notice::Success(text) | Notice::Error(text) => text.clone(),
            Notice::Validation(errors) => errors.to_string(),
        }
    }
}

/// Fan-out of notices. Nothing is retained: a receiver only sees notices
/// published after it subscribed.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notice: Notice) {
        // No subscribers is fine; the notice simply fades.
        let _ = self.tx.send(notice);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
