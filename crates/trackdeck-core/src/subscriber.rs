// ── Enabled-gated change feed subscription ──
//
// Holds exactly one broadcast subscription while enabled and exactly
// zero while disabled. Toggling tears down and re-establishes the
// subscription; cancellation tears down everything.

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use trackdeck_api::{ChangeEvent, ChangeKind, FeedHandle};

pub type ChangeCallback = Box<dyn Fn(ChangeEvent) + Send + Sync>;

/// Optional per-kind handlers invoked for each delivered event.
#[derive(Default)]
pub struct FeedHandlers {
    pub on_insert: Option<ChangeCallback>,
    pub on_update: Option<ChangeCallback>,
    pub on_delete: Option<ChangeCallback>,
}

impl FeedHandlers {
    fn dispatch(&self, event: ChangeEvent) {
        let handler = match event.kind {
            ChangeKind::Insert => self.on_insert.as_ref(),
            ChangeKind::Update => self.on_update.as_ref(),
            ChangeKind::Delete => self.on_delete.as_ref(),
        };
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

/// Supervises the feed subscription lifecycle against an enabled flag.
///
/// Owns the [`FeedHandle`]; dropping the subscriber (or cancelling its
/// token) shuts the feed down with it.
pub struct FeedSubscriber {
    enabled: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl FeedSubscriber {
    pub fn spawn(
        feed: FeedHandle,
        handlers: FeedHandlers,
        enabled: bool,
        cancel: CancellationToken,
    ) -> Self {
        let (enabled_tx, enabled_rx) = watch::channel(enabled);
        tokio::spawn(supervise(feed, handlers, enabled_rx, cancel.clone()));
        Self {
            enabled: enabled_tx,
            cancel,
        }
    }

    /// Toggle the subscription. Idempotent: setting the current value
    /// does not churn the subscription.
    pub fn set_enabled(&self, on: bool) {
        self.enabled.send_if_modified(|current| {
            if *current == on {
                false
            } else {
                *current = on;
                true
            }
        });
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn supervise(
    feed: FeedHandle,
    handlers: FeedHandlers,
    mut enabled: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    loop {
        // Disabled: hold no receiver at all.
        while !*enabled.borrow() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = enabled.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let mut rx = feed.subscribe();
        debug!("change feed subscription established");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = enabled.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*enabled.borrow() {
                        debug!("change feed subscription torn down");
                        break;
                    }
                }
                result = rx.recv() => match result {
                    Ok(event) => handlers.dispatch(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Events are refetch hints; a lost one is caught up
                        // by the next.
                        warn!(skipped, "change feed receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
        // rx dropped here — zero subscriptions while disabled.
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_handlers(count: &Arc<AtomicUsize>) -> FeedHandlers {
        let counter = |count: Arc<AtomicUsize>| -> ChangeCallback {
            Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        FeedHandlers {
            on_insert: Some(counter(Arc::clone(count))),
            on_update: Some(counter(Arc::clone(count))),
            on_delete: Some(counter(Arc::clone(count))),
        }
    }

    fn event(kind: ChangeKind) -> ChangeEvent {
        ChangeEvent { kind, id: None }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn enabled_subscriber_delivers_events() {
        let (feed, tx) = FeedHandle::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = FeedSubscriber::spawn(
            feed,
            counting_handlers(&count),
            true,
            CancellationToken::new(),
        );
        settle().await;

        tx.send(event(ChangeKind::Insert)).unwrap();
        tx.send(event(ChangeKind::Delete)).unwrap();
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        sub.shutdown();
    }

    #[tokio::test]
    async fn disabled_subscriber_holds_no_subscription() {
        let (feed, tx) = FeedHandle::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = FeedSubscriber::spawn(
            feed,
            counting_handlers(&count),
            false,
            CancellationToken::new(),
        );
        settle().await;

        // No receiver exists, so the send itself has nowhere to go.
        assert!(tx.send(event(ChangeKind::Update)).is_err());
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        sub.shutdown();
    }

    #[tokio::test]
    async fn toggling_tears_down_and_resubscribes() {
        let (feed, tx) = FeedHandle::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = FeedSubscriber::spawn(
            feed,
            counting_handlers(&count),
            true,
            CancellationToken::new(),
        );
        settle().await;

        tx.send(event(ChangeKind::Insert)).unwrap();
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sub.set_enabled(false);
        settle().await;
        assert!(tx.send(event(ChangeKind::Insert)).is_err());
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sub.set_enabled(true);
        settle().await;
        tx.send(event(ChangeKind::Update)).unwrap();
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        sub.shutdown();
    }

    #[tokio::test]
    async fn cancellation_tears_down_a_live_subscription() {
        let (feed, tx) = FeedHandle::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let _sub = FeedSubscriber::spawn(feed, counting_handlers(&count), true, cancel.clone());
        settle().await;

        cancel.cancel();
        settle().await;

        assert!(tx.send(event(ChangeKind::Insert)).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_handler_is_skipped() {
        let (feed, tx) = FeedHandle::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let handlers = FeedHandlers {
            on_insert: Some(Box::new(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            })),
            ..FeedHandlers::default()
        };
        let sub = FeedSubscriber::spawn(feed, handlers, true, CancellationToken::new());
        settle().await;

        tx.send(event(ChangeKind::Delete)).unwrap();
        tx.send(event(ChangeKind::Insert)).unwrap();
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        sub.shutdown();
    }
}
