//! Network reachability signal.

use tokio::sync::watch;

/// Reports whether the ledger service is reachable.
pub trait Connectivity: Send + Sync {
    /// Point-in-time reachability.
    fn is_available(&self) -> bool;

    /// Subscribes to reachability changes.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// A connectivity oracle driven by the host's network callbacks.
///
/// # Example
///
/// ```
/// use moneysync_engine::{Connectivity, NetworkMonitor};
///
/// let monitor = NetworkMonitor::new(true);
/// let mut changes = monitor.watch();
/// monitor.set_available(false);
/// assert!(changes.has_changed().unwrap());
/// assert!(!*changes.borrow_and_update());
/// ```
#[derive(Debug)]
pub struct NetworkMonitor {
    sender: watch::Sender<bool>,
}

impl NetworkMonitor {
    /// Creates a monitor with an initial state.
    pub fn new(available: bool) -> Self {
        let (sender, _) = watch::channel(available);
        Self { sender }
    }

    /// Publishes a reachability change. Repeating the current value does not
    /// wake subscribers.
    pub fn set_available(&self, available: bool) {
        self.sender.send_if_modified(|current| {
            let changed = *current != available;
            *current = available;
            changed
        });
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for NetworkMonitor {
    fn is_available(&self) -> bool {
        *self.sender.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_state() {
        let monitor = NetworkMonitor::new(false);
        assert!(!monitor.is_available());
        monitor.set_available(true);
        assert!(monitor.is_available());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.watch();

        monitor.set_available(true);
        assert!(!rx.has_changed().unwrap());

        monitor.set_available(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }
}
