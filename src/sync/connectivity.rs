//! Network connectivity signal.
//!
//! The host application owns a [`ConnectivityMonitor`] and reports online and
//! offline edges to it. The sync engine subscribes and reacts.

use tokio::sync::watch;
use tracing::info;

/// Publishes online/offline transitions.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx }
    }

    /// Current state.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Report a state. Repeating the current state publishes nothing.
    ///
    /// Returns whether this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(online, "connectivity changed");
        }
        changed
    }

    /// Receiver handed to a [`SyncEngine`](super::SyncEngine).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
