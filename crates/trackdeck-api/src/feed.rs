// ── Change feed transport ──
//
// Websocket subscription to the project collection's change feed.
// Frames are JSON: {"event": "insert" | "update" | "delete", "id": …}.
// Events fan out through a broadcast channel; consumers treat them as
// refetch hints, so a dropped or lagged event is harmless.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::types::ChangeEvent;

const FEED_CHANNEL_SIZE: usize = 64;

/// Reconnect backoff policy for a dropped feed connection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max)
    }
}

/// Handle to a live change feed.
///
/// [`connect`](Self::connect) spawns a read loop that survives connection
/// drops (exponential backoff) until the cancellation token fires.
/// [`channel`](Self::channel) builds an in-process feed for tests and
/// embedded setups.
pub struct FeedHandle {
    tx: broadcast::Sender<ChangeEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Connect to the feed endpoint and start the read loop.
    pub fn connect(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (tx, _) = broadcast::channel(FEED_CHANNEL_SIZE);
        let task = tokio::spawn(read_loop(url, reconnect, tx.clone(), cancel.clone()));

        Self {
            tx,
            cancel,
            task: Some(task),
        }
    }

    /// In-process feed: the returned sender half injects events directly.
    pub fn channel() -> (Self, broadcast::Sender<ChangeEvent>) {
        let (tx, _) = broadcast::channel(FEED_CHANNEL_SIZE);
        let handle = Self {
            tx: tx.clone(),
            cancel: CancellationToken::new(),
            task: None,
        };
        (handle, tx)
    }

    /// Subscribe to the event fan-out.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Stop the read loop. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Connect, read frames, broadcast events; back off and reconnect on
/// drop; exit on cancellation.
async fn read_loop(
    url: Url,
    reconnect: ReconnectConfig,
    tx: broadcast::Sender<ChangeEvent>,
    cancel: CancellationToken,
) {
    let mut delay = reconnect.initial;

    loop {
        if cancel.is_cancelled() {
            return;
        }

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((mut stream, _)) => {
                debug!(url = %url, "change feed connected");
                delay = reconnect.initial;

                loop {
                    let frame = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return,
                        frame = stream.next() => frame,
                    };

                    match frame {
                        Some(Ok(Message::Text(text))) => match serde_json::from_str(&text) {
                            Ok(event) => {
                                let _ = tx.send(event);
                            }
                            Err(e) => {
                                warn!(error = %e, "unparseable change feed frame");
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "change feed read error");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, delay = ?delay, "change feed connect failed, retrying");
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
        delay = reconnect.next_delay(delay);
    }
}
