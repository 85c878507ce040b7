//! User-facing alerts.

use tokio::sync::mpsc;
use tracing::debug;

/// A modal message with a single acknowledgment action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
  pub title: String,
  pub message: String,
  /// Label of the dismiss action
  pub action: &'static str,
}

impl Alert {
  pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      action: "OK",
    }
  }
}

/// Somewhere to deliver alerts.
pub trait Notifier: Send + Sync {
  fn notify(&self, alert: Alert);
}

impl Notifier for mpsc::UnboundedSender<Alert> {
  fn notify(&self, alert: Alert) {
    if self.send(alert).is_err() {
      debug!("alert dropped, receiver gone");
    }
  }
}
