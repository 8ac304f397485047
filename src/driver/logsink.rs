//! Side channel that mirrors raw session output into the logger.
//!
//! The transport's reader thread tees every chunk it sees into this sink;
//! the sink reassembles lines and emits them at debug level. It is pure
//! observation: expect matching never depends on it, and a slow or dead
//! sink never stalls the session.

use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long `close` waits for the drain task before giving up on it.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Line-oriented session transcript logger.
pub struct SideLogSink {
    task: JoinHandle<()>,
}

impl SideLogSink {
    /// Start the sink. The returned sender is handed to the transport as
    /// the tee; when every sender is dropped the sink drains and stops.
    pub fn spawn() -> (Self, mpsc::UnboundedSender<Vec<u8>>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let task = tokio::spawn(async move {
            let mut pending: Vec<u8> = Vec::new();
            while let Some(chunk) = rx.recv().await {
                pending.extend_from_slice(&chunk);
                while let Some(pos) = memchr::memchr(b'\n', &pending) {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    log_line(&line);
                }
            }
            // Trailing partial line, typically the final prompt.
            if !pending.is_empty() {
                log_line(&pending);
            }
        });
        (Self { task }, tx)
    }

    /// Wait for the sink to flush everything it was fed and stop.
    ///
    /// Callers close the transport first so the tee sender is gone by the
    /// time this runs; the grace period only guards against a wedged task.
    pub async fn close(mut self) {
        if tokio::time::timeout(CLOSE_GRACE, &mut self.task)
            .await
            .is_err()
        {
            warn!("session log sink did not drain in time, aborting it");
            self.task.abort();
        }
    }
}

fn log_line(raw: &[u8]) {
    let line = String::from_utf8_lossy(raw);
    debug!(target: "ratcom::session", "{}", line.trim_end_matches(['\r', '\n']));
}
