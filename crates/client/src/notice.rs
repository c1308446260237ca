//! Self-expiring notices.
//!
//! A `TransientStatus` shows at most one notice at a time. Showing another
//! replaces the current one and restarts the clock; dropping the status
//! cancels any pending expiry.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientNotice {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Slot {
    notice: Option<TransientNotice>,
    /// Bumped on every show/clear so a stale timer never clears a newer notice.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug)]
pub struct TransientStatus {
    kind: NoticeKind,
    lifetime: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl TransientStatus {
    pub fn new(kind: NoticeKind, lifetime: Duration) -> Self {
        Self {
            kind,
            lifetime,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Show `message`, replacing any current notice and restarting the delay.
    ///
    /// Expiry is scheduled on the ambient tokio runtime. Without one the
    /// notice stays until replaced or cleared.
    pub fn show(&self, message: impl Into<String>) -> TransientNotice {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.lifetime)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let notice = TransientNotice {
            kind: self.kind,
            message: message.into(),
            expires_at,
        };

        let mut slot = self.lock();
        slot.cancel_timer();
        slot.generation += 1;
        slot.notice = Some(notice.clone());
        slot.timer = self.schedule_expiry(slot.generation);

        tracing::debug!(
            kind = self.kind.as_str(),
            lifetime_ms = self.lifetime.as_millis() as u64,
            "notice shown"
        );

        notice
    }

    /// Remove the current notice, if any. Idempotent.
    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.cancel_timer();
        if slot.notice.take().is_some() {
            slot.generation += 1;
            tracing::debug!(kind = self.kind.as_str(), "notice cleared");
        }
    }

    pub fn current(&self) -> Option<TransientNotice> {
        self.lock().notice.clone()
    }

    pub fn is_showing(&self) -> bool {
        self.lock().notice.is_some()
    }

    fn schedule_expiry(&self, generation: u64) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(
                    kind = self.kind.as_str(),
                    "no async runtime; notice will not expire on its own"
                );
                return None;
            }
        };

        let weak: Weak<Mutex<Slot>> = Arc::downgrade(&self.slot);
        let deadline = tokio::time::Instant::now() + self.lifetime;
        let kind = self.kind;

        Some(handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            // Gone means the owner was torn down; nothing left to update.
            let Some(slot) = weak.upgrade() else {
                return;
            };
            let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
            if slot.generation == generation {
                slot.notice = None;
                slot.timer = None;
                tracing::debug!(kind = kind.as_str(), "notice expired");
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TransientStatus {
    fn drop(&mut self) {
        self.lock().cancel_timer();
    }
}
