//! Interactive passthrough between the local terminal and the device.
//!
//! The automated session hands its transport to the user: device output
//! is relayed to stdout and local keystrokes to the device until either
//! side ends. The expect engine keeps ownership of the transport, so the
//! session can resume pattern-driven work afterwards.

use std::io::Read;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::channel::ExpectEngine;
use crate::error::{ExpectError, Result};
use crate::transport::Transport;

/// How long one remote read may block before local input is re-checked.
const RELAY_POLL: Duration = Duration::from_millis(200);

enum Relay {
    Remote(std::result::Result<Vec<u8>, ExpectError>),
    Local(Option<Vec<u8>>),
}

/// Relay until the remote stream ends or local input is exhausted.
///
/// Bytes still buffered from the last pattern match (typically the tail
/// after the prompt) are written out first so the user sees where the
/// session stands.
pub(super) async fn passthrough<T, W>(
    engine: &mut ExpectEngine<T>,
    input: &mut mpsc::Receiver<Vec<u8>>,
    output: &mut W,
) -> Result<()>
where
    T: Transport,
    W: AsyncWrite + Unpin,
{
    let pending = engine.drain_buffer();
    if !pending.is_empty() {
        output.write_all(&pending).await.map_err(ExpectError::Io)?;
        output.flush().await.map_err(ExpectError::Io)?;
    }

    loop {
        // Keystrokes are rare and small; checking them first keeps a
        // chatty device from delaying their delivery.
        let event = tokio::select! {
            biased;
            data = input.recv() => Relay::Local(data),
            chunk = engine.transport_mut().recv(RELAY_POLL) => Relay::Remote(chunk),
        };
        match event {
            Relay::Local(Some(data)) => engine.send(&data)?,
            Relay::Local(None) => {
                debug!("local input ended, leaving passthrough");
                return Ok(());
            }
            Relay::Remote(Ok(chunk)) => {
                output.write_all(&chunk).await.map_err(ExpectError::Io)?;
                output.flush().await.map_err(ExpectError::Io)?;
            }
            Relay::Remote(Err(ExpectError::Timeout(_))) => {}
            Relay::Remote(Err(ExpectError::Eof | ExpectError::Closed)) => {
                debug!("remote stream ended, leaving passthrough");
                return Ok(());
            }
            Relay::Remote(Err(e)) => return Err(e.into()),
        }
    }
}

/// Forward stdin into a channel from a dedicated thread. A blocking read
/// cannot be cancelled, so the thread lives until stdin ends or the
/// receiver side is gone.
pub(super) fn spawn_stdin_pump() -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = thread::Builder::new()
        .name("ratcom-stdin".into())
        .spawn(move || {
            let mut stdin = std::io::stdin();
            let mut buf = [0u8; 1024];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("cannot read local input: {}", e);
    }
    rx
}

/// Raw-mode guard for the controlling terminal. Restores the saved
/// attributes on drop; does nothing when stdin is not a terminal.
pub(super) struct RawMode {
    saved: Option<libc::termios>,
}

impl RawMode {
    pub(super) fn enable() -> Self {
        let fd = libc::STDIN_FILENO;
        unsafe {
            if libc::isatty(fd) == 0 {
                return Self { saved: None };
            }
            let mut term: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut term) != 0 {
                return Self { saved: None };
            }
            let saved = term;
            libc::cfmakeraw(&mut term);
            if libc::tcsetattr(fd, libc::TCSANOW, &term) != 0 {
                return Self { saved: None };
            }
            Self { saved: Some(saved) }
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Some(saved) = self.saved {
            unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &saved);
            }
        }
    }
}
