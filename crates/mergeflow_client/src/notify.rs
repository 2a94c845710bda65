//! Fire-and-forget user notifications.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Default,
    Success,
    Info,
    Warning,
    Error,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub variant: Variant,
}

/// Notification sink used by the orchestrator.
pub trait Notifier: Send + Sync {
    fn enqueue_message(&self, text: &str, variant: Variant);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn enqueue_message(&self, text: &str, variant: Variant) {
        match variant {
            Variant::Error => error!(variant = %variant, "{}", text),
            Variant::Warning => warn!(variant = %variant, "{}", text),
            _ => info!(variant = %variant, "{}", text),
        }
    }
}

/// Oldest entries are dropped past this many recorded notifications.
pub const RECORDING_LIMIT: usize = 256;

/// Keeps notifications in memory for tests and CLI output.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<VecDeque<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn messages(&self) -> Vec<Notification> {
        match self.messages.lock() {
            Ok(messages) => messages.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        match self.messages.lock() {
            Ok(mut messages) => messages.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }

    /// Texts only, in order.
    pub fn texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|notification| notification.text)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn enqueue_message(&self, text: &str, variant: Variant) {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push_back(Notification {
            text: text.to_string(),
            variant,
        });
        while messages.len() > RECORDING_LIMIT {
            messages.pop_front();
        }
    }
}
