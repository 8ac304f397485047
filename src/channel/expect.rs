//! Timeout-bounded pattern scanner over a transport byte stream.
//!
//! The engine is a small interpreter: pattern list -> scan -> first match
//! wins -> consume. Every call is bounded by an explicit deadline; there is
//! no unbounded wait anywhere in it.

use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::buffer::ExpectBuffer;
use crate::error::ExpectError;
use crate::transport::Transport;

/// A successful pattern match.
///
/// `before` is the text that preceded the match and `matched` the matched
/// text itself; both are exposed for capture and diagnostics. The bytes
/// covered by both have already been discarded from the engine's buffer.
#[derive(Debug, Clone)]
pub struct ExpectMatch {
    /// Index of the winning pattern in the list passed to `expect`.
    pub index: usize,

    /// Text preceding the match (lossy UTF-8).
    pub before: String,

    /// The matched text itself (lossy UTF-8).
    pub matched: String,
}

/// Blocking, timeout-bounded expect engine over a [`Transport`].
pub struct ExpectEngine<T: Transport> {
    transport: T,
    buffer: ExpectBuffer,
}

impl<T: Transport> ExpectEngine<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buffer: ExpectBuffer::new(),
        }
    }

    /// Consume bytes until one of `patterns` matches or `timeout` elapses.
    ///
    /// The winner is the match found earliest in the buffer; on ties at the
    /// same position the first pattern in list order wins. Consumed bytes
    /// are irreversibly discarded.
    pub async fn expect(
        &mut self,
        patterns: &[&Regex],
        timeout: Duration,
    ) -> Result<ExpectMatch, ExpectError> {
        if self.transport.is_closed() {
            return Err(ExpectError::Closed);
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(m) = self.scan(patterns) {
                trace!("pattern {} matched ({} bytes before)", m.index, m.before.len());
                return Ok(m);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ExpectError::Timeout(timeout));
            }

            let chunk = match self.transport.recv(remaining).await {
                Ok(chunk) => chunk,
                // Report the caller's overall budget, not the residue.
                Err(ExpectError::Timeout(_)) => return Err(ExpectError::Timeout(timeout)),
                Err(e) => return Err(e),
            };
            self.buffer.extend(&chunk);
        }
    }

    /// Scan the unconsumed buffer; on a win, consume through the match end.
    fn scan(&mut self, patterns: &[&Regex]) -> Option<ExpectMatch> {
        let data = self.buffer.unconsumed();

        let mut best: Option<(usize, usize, usize)> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            if let Some(m) = pattern.find(data) {
                let earlier = match best {
                    None => true,
                    Some((_, start, _)) => m.start() < start,
                };
                if earlier {
                    best = Some((index, m.start(), m.end()));
                }
            }
        }

        let (index, start, end) = best?;
        let consumed = self.buffer.consume(end);
        Some(ExpectMatch {
            index,
            before: String::from_utf8_lossy(&consumed[..start]).into_owned(),
            matched: String::from_utf8_lossy(&consumed[start..]).into_owned(),
        })
    }

    /// Send raw bytes (e.g. a pagination continuation keystroke).
    pub fn send(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        trace!("send {} bytes", data.len());
        self.transport.send(data)
    }

    /// Send a line terminated by a line break.
    pub fn send_line(&mut self, line: &str) -> Result<(), ExpectError> {
        debug!("sending line {:?}", line);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.transport.send(&data)
    }

    /// Send a secret line. The content is never logged anywhere.
    pub fn send_secret_line(&mut self, secret: &SecretString) -> Result<(), ExpectError> {
        debug!("sending secret input");
        let mut data = Vec::new();
        data.extend_from_slice(secret.expose_secret().as_bytes());
        data.push(b'\n');
        self.transport.send(&data)
    }

    /// Drop buffered bytes, e.g. a login banner before the first command.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Take everything buffered but not yet consumed, emptying the buffer.
    ///
    /// Used by the interactive passthrough so the tail of the last expect
    /// (typically the prompt) reaches the local terminal.
    pub fn drain_buffer(&mut self) -> Vec<u8> {
        let n = self.buffer.len();
        self.buffer.consume(n).to_vec()
    }

    /// Whether the underlying transport is closed.
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Close the underlying transport.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport, for callers that relay
    /// raw chunks instead of matching patterns.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
