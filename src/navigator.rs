//! Full-page navigation requested by the client (login / logout redirects)

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Performs a full navigation of the host UI
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

/// Forwards navigation requests to the host UI over a channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, path: &str) {
        info!(path = %path, "Navigating");
        if self.tx.send(path.to_string()).is_err() {
            warn!(path = %path, "Navigation receiver dropped");
        }
    }
}

/// Logs navigation requests and does nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, path: &str) {
        info!(path = %path, "Navigation requested with no host attached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_navigator() {
        let (nav, mut rx) = ChannelNavigator::new();
        nav.navigate("/auth/login/");
        nav.navigate("/");

        assert_eq!(rx.try_recv().unwrap(), "/auth/login/");
        assert_eq!(rx.try_recv().unwrap(), "/");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_not_fatal() {
        let (nav, rx) = ChannelNavigator::new();
        drop(rx);
        nav.navigate("/");
    }
}
