//! Bridges refresh progress onto the server-sent event stream.

use std::sync::atomic::{AtomicU64, Ordering};

use actix_web::web::Bytes;
use dengue_watch_risk::ProgressCallback;
use dengue_watch_server_models::{ApiDistrictRisks, RefreshEvent};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinError;

/// [`ProgressCallback`] that forwards every position change as a
/// [`RefreshEvent::Progress`].
///
/// Sends never block; if the client has disconnected the events are
/// dropped.
pub struct ChannelProgress {
    tx: UnboundedSender<RefreshEvent>,
    resolved: AtomicU64,
    total: AtomicU64,
}

impl ChannelProgress {
    pub const fn new(tx: UnboundedSender<RefreshEvent>) -> Self {
        Self {
            tx,
            resolved: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    fn emit(&self, resolved: u64) {
        let _ = self.tx.send(RefreshEvent::Progress {
            resolved,
            total: self.total.load(Ordering::SeqCst),
        });
    }
}

impl ProgressCallback for ChannelProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        self.emit(self.resolved.load(Ordering::SeqCst));
    }

    fn set_position(&self, pos: u64) {
        self.resolved.store(pos, Ordering::SeqCst);
        self.emit(pos);
    }

    fn inc(&self, delta: u64) {
        let resolved = self.resolved.fetch_add(delta, Ordering::SeqCst) + delta;
        self.emit(resolved);
    }

    fn set_message(&self, _msg: String) {}

    fn finish(&self, _msg: String) {}

    fn finish_and_clear(&self) {}
}

/// Final event of a stream: `complete` with the payload, or `error` when
/// the refresh task panicked or was cancelled.
pub fn completion_event(result: Result<ApiDistrictRisks, JoinError>) -> RefreshEvent {
    match result {
        Ok(payload) => RefreshEvent::Complete {
            payload: Box::new(payload),
        },
        Err(e) => {
            log::error!("District risk refresh task failed: {e}");
            RefreshEvent::Error {
                message: "District risk refresh failed".to_string(),
            }
        }
    }
}

/// Encodes an event as an SSE frame (`event:` line plus JSON `data:` line).
pub fn encode_event(event: &RefreshEvent) -> Option<Bytes> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Bytes::from(format!(
            "event: {}\ndata: {json}\n\n",
            event.name()
        ))),
        Err(e) => {
            log::error!("Failed to serialize refresh event: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dengue_watch_district_models::sri_lanka_districts;
    use dengue_watch_risk::{DashboardSummary, RefreshStatus};
    use tokio::sync::mpsc;

    fn resolved_values(rx: &mut mpsc::UnboundedReceiver<RefreshEvent>) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RefreshEvent::Progress { resolved, total } = event {
                out.push((resolved, total));
            }
        }
        out
    }

    #[test]
    fn forwards_progress_with_total() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ChannelProgress::new(tx);

        progress.set_total(3);
        progress.inc(1);
        progress.inc(2);

        assert_eq!(resolved_values(&mut rx), [(0, 3), (1, 3), (3, 3)]);
    }

    #[test]
    fn set_position_jumps_to_complete() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ChannelProgress::new(tx);

        progress.set_total(25);
        progress.set_position(25);

        assert_eq!(resolved_values(&mut rx), [(0, 25), (25, 25)]);
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelProgress::new(tx).inc(1);
    }

    #[tokio::test]
    async fn failed_refresh_task_ends_with_error_event() {
        let handle = tokio::spawn(async { panic!("refresh blew up") });

        match completion_event(handle.await) {
            RefreshEvent::Error { message } => {
                assert_eq!(message, "District risk refresh failed");
            }
            other => panic!("expected error event, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn finished_refresh_task_ends_with_complete_event() {
        let handle = tokio::spawn(async {
            ApiDistrictRisks::new(
                RefreshStatus::NotConfigured,
                Vec::new(),
                DashboardSummary::build(&sri_lanka_districts(), &[], 5),
            )
        });

        let event = completion_event(handle.await);

        assert_eq!(event.name(), "complete");
        let frame = encode_event(&event).unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("event: complete\n"));
        assert!(text.contains(r#""status":"notConfigured""#));
    }

    #[test]
    fn encodes_named_frame() {
        let frame = encode_event(&RefreshEvent::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        let text = std::str::from_utf8(&frame).unwrap();

        assert!(text.starts_with("event: error\ndata: {"));
        assert!(text.contains(r#""message":"boom""#));
        assert!(text.ends_with("\n\n"));
    }
}
