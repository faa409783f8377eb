//! User Notices
//!
//! Failures the hosting UI should surface as a toast, plus show/hide events
//! for the global loading indicator. Published on a crossbeam channel so any
//! frontend can drain them at its own pace.

use crate::constants::LOADING_MESSAGE;
use crossbeam_channel::{Receiver, Sender};

/// Severity of a notice
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Danger,
    /// Show the blocking loading indicator with the notice message
    ShowLoading,
    /// Hide the loading indicator
    HideLoading,
}

/// A user-facing notice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Danger,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn show_loading() -> Self {
        Self {
            level: NoticeLevel::ShowLoading,
            message: LOADING_MESSAGE.to_string(),
        }
    }

    pub fn hide_loading() -> Self {
        Self {
            level: NoticeLevel::HideLoading,
            message: String::new(),
        }
    }

    /// Whether this drives the loading indicator rather than a toast
    pub fn is_loading_event(&self) -> bool {
        matches!(self.level, NoticeLevel::ShowLoading | NoticeLevel::HideLoading)
    }
}

/// Create an unbounded notice channel
pub fn notice_channel() -> (Sender<Notice>, Receiver<Notice>) {
    crossbeam_channel::unbounded()
}
