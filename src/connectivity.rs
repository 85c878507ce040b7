//! One-shot network reachability check.

use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::notify::{Alert, Notifier};

/// Reports whether the network is reachable.
///
/// Implementations must fold every failure into `false`.
pub trait ConnectivityProbe: Send + Sync {
  fn is_connected(&self) -> impl Future<Output = bool> + Send;
}

/// Probe that dials a TCP address.
#[derive(Debug, Clone)]
pub struct TcpProbe {
  addr: String,
  timeout: Duration,
}

impl TcpProbe {
  pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
    Self {
      addr: addr.into(),
      timeout,
    }
  }
}

impl ConnectivityProbe for TcpProbe {
  async fn is_connected(&self) -> bool {
    match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
      Ok(Ok(_)) => true,
      Ok(Err(e)) => {
        debug!(addr = %self.addr, error = %e, "probe connect failed");
        false
      }
      Err(_) => {
        debug!(addr = %self.addr, "probe timed out");
        false
      }
    }
  }
}

/// Run the probe once and alert the user when offline.
pub async fn check_connectivity<P, N>(probe: &P, notifier: &N) -> bool
where
  P: ConnectivityProbe,
  N: Notifier,
{
  let connected = probe.is_connected().await;
  if !connected {
    warn!("no network connection");
    notifier.notify(Alert::new(
      "No Internet",
      "Please check your internet connection and try again.",
    ));
  }
  connected
}
