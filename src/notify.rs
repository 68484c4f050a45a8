use tracing::{error, info};

use std::fmt::Display;

/// The kind of outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Info,
    Error,
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        })
    }
}

/// Receives the result of every user-invoked action.
///
/// Implementations must return promptly; actions never wait on a reply.
pub trait Notifier {
    fn notify(&mut self, notice: Notice, title: &str, message: &str);
}

/// Sends notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: Notice, title: &str, message: &str) {
        match notice {
            Notice::Success | Notice::Info => info!(%notice, "{title}: {message}"),
            Notice::Error => error!("{title}: {message}"),
        }
    }
}

/// Keeps every notification, in order.
impl Notifier for Vec<(Notice, String, String)> {
    fn notify(&mut self, notice: Notice, title: &str, message: &str) {
        self.push((notice, title.to_string(), message.to_string()));
    }
}
