use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::remote::DEFAULT_LOG_LIMIT;
use crate::service::DigestService;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Fixed-cadence driver for the history fetch. One interval covers the
/// initial load and every later tick; explicit refresh requests reuse the
/// same fetch path without resetting the timer.
pub struct PollingLoop {
    ct: CancellationToken,
    refresh_tx: mpsc::UnboundedSender<()>,
    handle: JoinHandle<()>,
}

impl PollingLoop {
    pub fn spawn(service: Arc<DigestService>, period: Duration) -> Self {
        let ct = CancellationToken::new();
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();
        let loop_ct = ct.clone();
        let handle = tokio::spawn(async move {
            // first tick fires immediately: that is the initial load
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = loop_ct.cancelled() => break,
                    _ = ticker.tick() => spawn_fetch(&service, &loop_ct),
                    recv = refresh_rx.recv() => match recv {
                        Some(()) => spawn_fetch(&service, &loop_ct),
                        // all handles gone; nothing left to drive
                        None => break,
                    },
                }
            }
            debug!("polling loop stopped");
        });
        Self { ct, refresh_tx, handle }
    }

    /// Out-of-band refresh over the same fetch path; the interval keeps its
    /// cadence.
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    pub async fn shutdown(self) {
        self.ct.cancel();
        let _ = self.handle.await;
    }
}

// Each fetch runs as its own task so a slow round trip never holds up the
// next tick. Overlap is tolerated, not coalesced: merge_scheduled replaces
// the whole scheduled snapshot, so completion order does not matter.
fn spawn_fetch(service: &Arc<DigestService>, ct: &CancellationToken) {
    let service = Arc::clone(service);
    let ct = ct.clone();
    tokio::spawn(async move {
        if ct.is_cancelled() {
            return;
        }
        match service.fetch_snapshot(DEFAULT_LOG_LIMIT).await {
            Ok(snapshot) => {
                if ct.is_cancelled() {
                    debug!("discarding snapshot fetched after teardown");
                    return;
                }
                let merged = snapshot.len();
                let total = service.apply_snapshot(snapshot);
                info!(merged, total, "🔄 merged scheduled digests");
            }
            Err(err) => {
                if !ct.is_cancelled() {
                    warn!(error = %err, "history poll failed");
                }
            }
        }
    });
}
