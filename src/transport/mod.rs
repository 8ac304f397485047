//! Transport layer: the byte stream to a device's interactive shell.
//!
//! The secure transport itself (key exchange, encryption) is delegated to
//! an external ssh client spawned under a pseudo-terminal; this module only
//! builds its argument vector and moves bytes. Everything above it talks to
//! the [`Transport`] trait, which is what the test suite scripts against.

mod ssh;

pub use ssh::{PtyTransport, SshCommand, DEFAULT_SSH_BINARY};

use std::future::Future;
use std::time::Duration;

use crate::error::ExpectError;

/// A bidirectional byte stream to an interactive remote shell.
pub trait Transport: Send {
    /// Receive the next chunk of raw output, waiting at most `timeout`.
    ///
    /// Fails with [`ExpectError::Timeout`] when nothing arrives in time,
    /// [`ExpectError::Eof`] when the stream has ended, and
    /// [`ExpectError::Closed`] when called after [`close`](Self::close).
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>, ExpectError>> + Send;

    /// Write raw bytes to the remote shell.
    fn send(&mut self, data: &[u8]) -> Result<(), ExpectError>;

    /// Whether the transport has been closed locally.
    fn is_closed(&self) -> bool;

    /// Close the transport. Idempotent; never fails.
    fn close(&mut self);
}
