// ── Notification queue ──
//
// Transient user-facing messages. Each notification schedules its own
// expiry; dismissal or queue teardown cancels the timer, so no timer
// ever fires against a disposed queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::model::NOTIFICATION_TTL;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// One transient message. Ids are monotonic per queue instance, never
/// shared across instances (no module-level counter).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Fire-and-forget notification queue. Cheaply cloneable.
#[derive(Clone)]
pub struct Notifications {
    inner: Arc<NotifyInner>,
}

struct NotifyInner {
    entries: DashMap<u64, Notification>,
    next_id: AtomicU64,
    snapshot: watch::Sender<Arc<Vec<Notification>>>,
    cancel: CancellationToken,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifications {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(NotifyInner {
                entries: DashMap::new(),
                next_id: AtomicU64::new(0),
                snapshot,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Append a notification and arm its expiry timer. Callers never need
    /// the id back — dismissal is user-driven, expiry is automatic.
    pub fn push(&self, severity: Severity, message: impl Into<String>) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.entries.insert(
            id,
            Notification {
                id,
                severity,
                message: message.into(),
                created_at: Utc::now(),
            },
        );
        self.rebuild_snapshot();

        // Expiry races teardown; a Weak upgrade guards against a queue
        // dropped mid-sleep.
        let weak = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(NOTIFICATION_TTL) => {
                    if let Some(inner) = weak.upgrade() {
                        Self { inner }.dismiss(id);
                    }
                }
            }
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    /// Remove a notification. No-op when absent: already expired and
    /// already dismissed are both valid, race-free outcomes.
    pub fn dismiss(&self, id: u64) {
        if self.inner.entries.remove(&id).is_some() {
            self.rebuild_snapshot();
        }
    }

    /// Cancel every pending expiry timer. Entries stay readable but no
    /// longer auto-expire; used when the consuming surface goes away.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Current notifications in creation order (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Notification>>> {
        self.inner.snapshot.subscribe()
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Notification> = self
            .inner
            .entries
            .iter()
            .map(|r| r.value().clone())
            .collect();
        values.sort_by_key(|n| n.id);
        self.inner.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

impl Drop for NotifyInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
