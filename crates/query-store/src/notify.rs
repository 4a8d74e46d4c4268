//! User-facing alerts for failures nobody intercepted.

use tracing::error;

pub trait UserNotifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Default notifier: the alert becomes an `error`-level log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn alert(&self, title: &str, message: &str) {
        error!(title, body = message, "user alert");
    }
}
