//! External-ssh-client transport over a pseudo-terminal.

use std::io;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;

use super::Transport;
use crate::error::ExpectError;

/// System-specific ssh client path. Usually /usr/bin/ssh.
pub const DEFAULT_SSH_BINARY: &str = "/usr/bin/ssh";

/// Read chunk size for the PTY reader thread.
const READ_CHUNK: usize = 4096;

/// Argument construction for the external secure-shell client.
///
/// This is the only protocol-boundary artifact the crate depends on; the
/// client binary owns key exchange and encryption.
#[derive(Debug, Clone)]
pub struct SshCommand {
    /// Path to the ssh client binary.
    pub binary: PathBuf,

    /// Target host (hostname or IP address).
    pub host: String,

    /// Remote port.
    pub port: u16,

    /// Login user.
    pub user: String,
}

impl SshCommand {
    /// Build a command for the default client binary.
    pub fn new(host: impl Into<String>, user: impl Into<String>, port: u16) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_SSH_BINARY),
            host: host.into(),
            port,
            user: user.into(),
        }
    }

    /// Override the client binary path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Client arguments: `-p<port> user@host`.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("-p{}", self.port),
            format!("{}@{}", self.user, self.host),
        ]
    }

    /// The command handed to the PTY spawner.
    pub fn to_command(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.binary);
        for arg in self.args() {
            cmd.arg(arg);
        }
        cmd
    }
}

/// Transport that spawns the external ssh client under a PTY.
///
/// A reader thread forwards every output chunk into a bounded channel (and
/// tees it to the side log sink when one was requested). A writer thread
/// drains an unbounded input channel into the PTY, so out-of-band producers
/// such as the resize controller can inject writes without borrowing the
/// session.
pub struct PtyTransport {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send>,
    read_rx: mpsc::Receiver<Vec<u8>>,
    write_tx: mpsc::UnboundedSender<Vec<u8>>,
    closed: bool,
}

impl PtyTransport {
    /// Spawn the client and wire up the reader/writer threads.
    ///
    /// `tee` receives a copy of every chunk the reader sees; it is dropped
    /// when the stream ends, which lets the side log sink flush and stop.
    pub fn spawn(
        command: &SshCommand,
        size: PtySize,
        tee: Option<mpsc::UnboundedSender<Vec<u8>>>,
    ) -> Result<Self, ExpectError> {
        debug!(
            "spawning {} -p{} {}@{}",
            command.binary.display(),
            command.port,
            command.user,
            command.host
        );

        let pty = native_pty_system()
            .openpty(size)
            .map_err(|e| ExpectError::Io(io::Error::other(e.to_string())))?;

        let child = pty
            .slave
            .spawn_command(command.to_command())
            .map_err(|e| ExpectError::Io(io::Error::other(e.to_string())))?;

        let reader = pty
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::Io(io::Error::other(e.to_string())))?;

        let writer = pty
            .master
            .take_writer()
            .map_err(|e| ExpectError::Io(io::Error::other(e.to_string())))?;

        let (read_tx, read_rx) = mpsc::channel::<Vec<u8>>(64);
        let (write_tx, write_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        thread::Builder::new()
            .name("ratcom-pty-read".into())
            .spawn(move || reader_loop(reader, read_tx, tee))
            .map_err(ExpectError::Io)?;

        thread::Builder::new()
            .name("ratcom-pty-write".into())
            .spawn(move || writer_loop(writer, write_rx))
            .map_err(ExpectError::Io)?;

        Ok(Self {
            master: pty.master,
            child,
            read_rx,
            write_tx,
            closed: false,
        })
    }

    /// Clone of the input channel, for out-of-band best-effort writers.
    pub fn write_channel(&self) -> mpsc::UnboundedSender<Vec<u8>> {
        self.write_tx.clone()
    }

    /// Re-announce terminal geometry on the PTY itself.
    pub fn set_window_size(&self, rows: u16, cols: u16) {
        let size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        if let Err(e) = self.master.resize(size) {
            warn!("pty resize failed: {}", e);
        }
    }
}

impl Transport for PtyTransport {
    async fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>, ExpectError> {
        if self.closed {
            return Err(ExpectError::Closed);
        }
        match tokio::time::timeout(timeout, self.read_rx.recv()).await {
            Err(_) => Err(ExpectError::Timeout(timeout)),
            Ok(None) => Err(ExpectError::Eof),
            Ok(Some(chunk)) => {
                trace!("recv {} bytes", chunk.len());
                Ok(chunk)
            }
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        if self.closed {
            return Err(ExpectError::Closed);
        }
        self.write_tx
            .send(data.to_vec())
            .map_err(|_| ExpectError::Closed)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.child.kill() {
            debug!("child kill on close: {}", e);
        }
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn reader_loop(
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::Sender<Vec<u8>>,
    tee: Option<mpsc::UnboundedSender<Vec<u8>>>,
) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let chunk = buf[..n].to_vec();
                if let Some(t) = &tee {
                    // Sink gone is fine; the main path never depends on it.
                    let _ = t.send(chunk.clone());
                }
                if tx.blocking_send(chunk).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("pty reader stopped: {}", e);
                break;
            }
        }
    }
}

fn writer_loop(mut writer: Box<dyn Write + Send>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(data) = rx.blocking_recv() {
        if writer.write_all(&data).and_then(|_| writer.flush()).is_err() {
            break;
        }
    }
}
