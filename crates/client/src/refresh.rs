//! Refresh notifications from the movement form to the stock listing.

use std::sync::Arc;

use tokio::sync::watch;

/// Counter bumped on every successful movement.
///
/// Subscribers see the latest generation and re-read everything on change;
/// there is no delta contract. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Bump the counter and wake subscribers. Returns the new generation.
    pub fn raise(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|n| {
            *n += 1;
            generation = *n;
        });
        tracing::debug!(generation, "refresh raised");
        generation
    }

    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }

    /// A receiver whose `changed()` resolves on the next raise.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}
