//! Terminal geometry forwarding.
//!
//! When the local terminal is resized (SIGWINCH) the active session, if
//! any, is told the new geometry with vendor commands such as
//! `terminal length <rows>`. This is pure convenience for interactive
//! use: every failure in here is swallowed, a resize must never take a
//! session down. The registry holds a weak reference so it can never
//! keep a disconnected session alive.

use std::sync::{Arc, Mutex, Weak};

use log::{debug, warn};
use once_cell::sync::Lazy;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use crate::platform::VendorProfile;

static ACTIVE: Lazy<Mutex<Weak<ResizeTarget>>> = Lazy::new(|| Mutex::new(Weak::new()));

/// Serializes tests that touch the process-wide registry.
#[cfg(test)]
pub(super) static REGISTRY_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Where geometry announcements for the current session go.
///
/// Writes are injected through the transport's out-of-band input channel,
/// so no borrow of the session itself is needed.
pub struct ResizeTarget {
    write_tx: mpsc::UnboundedSender<Vec<u8>>,
    profile: &'static VendorProfile,
}

impl ResizeTarget {
    pub fn new(write_tx: mpsc::UnboundedSender<Vec<u8>>, profile: &'static VendorProfile) -> Self {
        Self { write_tx, profile }
    }

    /// Send the vendor's geometry commands, best effort.
    pub fn push_geometry(&self, rows: u16, cols: u16) {
        let Some(resize) = &self.profile.resize else {
            return;
        };
        for command in resize.render(rows, cols) {
            let mut data = command.into_bytes();
            data.push(b'\n');
            if self.write_tx.send(data).is_err() {
                debug!("resize write skipped, session input channel is gone");
                return;
            }
        }
    }
}

/// Make `target` the recipient of geometry changes.
pub(super) fn register(target: &Arc<ResizeTarget>) {
    if let Ok(mut active) = ACTIVE.lock() {
        *active = Arc::downgrade(target);
    }
}

/// Detach `target` if it is the one registered. A target registered by a
/// newer session is left alone.
pub(super) fn deregister(target: &Arc<ResizeTarget>) {
    if let Ok(mut active) = ACTIVE.lock() {
        let ours = match active.upgrade() {
            Some(current) => Arc::ptr_eq(&current, target),
            None => true,
        };
        if ours {
            *active = Weak::new();
        }
    }
}

/// The currently registered target, if any session still holds it.
pub(super) fn current() -> Option<Arc<ResizeTarget>> {
    ACTIVE.lock().ok().and_then(|active| active.upgrade())
}

/// Install the SIGWINCH watcher. Call once per process; calling it when
/// no session is active is harmless.
pub fn spawn_winch_watcher() {
    tokio::spawn(async {
        let mut winch = match signal(SignalKind::window_change()) {
            Ok(s) => s,
            Err(e) => {
                warn!("cannot watch for terminal resize: {}", e);
                return;
            }
        };
        while winch.recv().await.is_some() {
            announce_current_geometry();
        }
    });
}

/// Push the controlling terminal's current geometry to the active
/// session, if both exist.
pub fn announce_current_geometry() {
    let Some((rows, cols)) = terminal_geometry() else {
        return;
    };
    if let Some(target) = current() {
        debug!("terminal resized to {}x{}", rows, cols);
        target.push_geometry(rows, cols);
    }
}

/// Geometry of the controlling terminal, when stdout is one.
pub fn terminal_geometry() -> Option<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    (rc == 0 && ws.ws_row > 0 && ws.ws_col > 0).then_some((ws.ws_row, ws.ws_col))
}
