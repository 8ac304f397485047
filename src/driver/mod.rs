//! Session automaton: login, escalation, commands, logout.
//!
//! [`Session`] owns the expect engine and drives one device conversation
//! from connect to disconnect. All vendor differences come from the
//! attached [`VendorProfile`]; the automaton itself is the same for every
//! family.

mod command;
mod interact;
mod login;
mod logsink;
mod resize;

pub use command::{CommandReport, HandlerError};
pub use logsink::SideLogSink;
pub use resize::{
    announce_current_geometry, spawn_winch_watcher, terminal_geometry, ResizeTarget,
};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use portable_pty::PtySize;

use crate::channel::ExpectEngine;
use crate::error::{ExpectError, ProtocolError, Result};
use crate::host::HostSpec;
use crate::platform::VendorProfile;
use crate::transport::{PtyTransport, SshCommand, Transport};

/// Upper bound on logout prompt exchanges before declaring the device
/// unwilling to let go.
const LOGOUT_ATTEMPT_LIMIT: usize = 10;

/// PTY geometry used when stdout is not a terminal.
const FALLBACK_GEOMETRY: (u16, u16) = (24, 80);

/// Where the automaton currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Login negotiation with the ssh client is in progress.
    Authenticating,
    /// Privilege escalation is in progress.
    Enabling,
    /// At the prompt, ready for a command.
    Ready,
    /// A command is running.
    Executing,
    /// A pagination continuation was just sent.
    Paginating,
    /// The logout handshake is in progress.
    LoggingOut,
    /// The session is torn down. Terminal.
    Closed,
}

/// One interactive device session.
pub struct Session<T: Transport> {
    engine: ExpectEngine<T>,
    profile: &'static VendorProfile,
    host: HostSpec,
    state: SessionState,
    sink: Option<SideLogSink>,
    resize_target: Option<Arc<ResizeTarget>>,
    timeout: Duration,
}

impl Session<PtyTransport> {
    /// Spawn the external ssh client and log in.
    ///
    /// With `verbose` set, every byte of session output is mirrored to the
    /// logger through a [`SideLogSink`]. The sink is torn down on every
    /// exit path, including login failure.
    pub async fn connect(host: &HostSpec, verbose: bool) -> Result<Self> {
        host.validate()?;
        let profile = host.vendor.profile();
        info!("connecting to {} ({})", host.hostname, profile.name);

        let (sink, tee) = match verbose {
            true => {
                let (sink, tee) = SideLogSink::spawn();
                (Some(sink), Some(tee))
            }
            false => (None, None),
        };

        let command = SshCommand::new(&host.hostname, &host.user, host.port);
        let (rows, cols) = terminal_geometry().unwrap_or(FALLBACK_GEOMETRY);
        let size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };

        let transport = match PtyTransport::spawn(&command, size, tee) {
            Ok(transport) => transport,
            Err(e) => {
                if let Some(sink) = sink {
                    sink.close().await;
                }
                return Err(e.into());
            }
        };

        let resize_target = Arc::new(ResizeTarget::new(transport.write_channel(), profile));
        Session::establish(transport, host, sink, Some(resize_target)).await
    }
}

impl<T: Transport> Session<T> {
    /// Log in over an already-open transport.
    ///
    /// This is the seam the test suite scripts against; `connect` is the
    /// same thing with the ssh client spawned first. When a sink is given
    /// its tee must already be wired into the transport.
    pub async fn attach(transport: T, host: &HostSpec, sink: Option<SideLogSink>) -> Result<Self> {
        host.validate()?;
        Self::establish(transport, host, sink, None).await
    }

    /// Shared connect/attach tail: build the session and log in.
    ///
    /// The resize target is registered only once login has succeeded; a
    /// geometry command injected mid-authentication would be consumed by
    /// the ssh client as password or confirmation input.
    async fn establish(
        transport: T,
        host: &HostSpec,
        sink: Option<SideLogSink>,
        resize_target: Option<Arc<ResizeTarget>>,
    ) -> Result<Self> {
        let mut session = Session {
            engine: ExpectEngine::new(transport),
            profile: host.vendor.profile(),
            host: host.clone(),
            state: SessionState::Authenticating,
            sink,
            resize_target,
            timeout: host.timeout,
        };
        if let Err(e) = session.initialize().await {
            session.teardown().await;
            return Err(e);
        }
        if let Some(target) = &session.resize_target {
            resize::register(target);
        }
        Ok(session)
    }

    /// Current automaton state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The profile this session runs under.
    pub fn profile(&self) -> &'static VendorProfile {
        self.profile
    }

    /// The device this session talks to.
    pub fn host(&self) -> &HostSpec {
        &self.host
    }

    /// Login, banner, escalation, one-shot paging setup.
    async fn initialize(&mut self) -> Result<()> {
        self.state = SessionState::Authenticating;
        let password = self.host.resolved_password()?;

        // The first device-side pattern after the client chatter.
        let next_stage = match &self.profile.banner {
            Some(banner) => &banner.pattern,
            None => &self.profile.prompt,
        };
        login::negotiate(
            &mut self.engine,
            self.profile,
            &password,
            next_stage,
            self.timeout,
        )
        .await?;

        if let Some(banner) = &self.profile.banner {
            debug!("dismissing banner");
            self.engine.send(banner.response.as_bytes())?;
            self.engine.expect(&[&self.profile.prompt], self.timeout).await?;
        }

        if self.profile.enable.is_some() && self.host.enable_password.is_some() {
            self.escalate().await?;
        }

        if let Some(suppress) = &self.profile.suppress_paging {
            if !suppress.every_command {
                for line in suppress.commands {
                    self.setup_command(line).await?;
                }
            }
        }

        self.state = SessionState::Ready;
        info!("session to {} ready", self.host.hostname);
        Ok(())
    }

    /// Privilege escalation. Requires both profile support and a
    /// configured enable password; the caller checked both.
    async fn escalate(&mut self) -> Result<()> {
        let Some(enable) = &self.profile.enable else {
            return Ok(());
        };
        let Some(enable_password) = &self.host.enable_password else {
            return Ok(());
        };

        self.state = SessionState::Enabling;
        debug!("escalating privileges");
        self.engine.send_line(enable.command)?;

        let m = self
            .engine
            .expect(&[&enable.password_prompt, &self.profile.prompt], self.timeout)
            .await?;
        if m.index == 0 {
            self.engine.send_secret_line(enable_password)?;
            self.engine
                .expect(&[&self.profile.prompt], self.timeout)
                .await
                .map_err(|e| {
                    debug!("no prompt after enable password: {}", e);
                    ProtocolError::EnableFailed {
                        host: self.host.hostname.clone(),
                    }
                })?;
        }
        Ok(())
    }

    /// Send a setup line and wait for the prompt, discarding the output.
    async fn setup_command(&mut self, line: &str) -> Result<()> {
        self.engine.send_line(line)?;
        self.engine.expect(&[&self.profile.prompt], self.timeout).await?;
        Ok(())
    }

    /// Run `command`, delivering each completed output line (terminator
    /// stripped) to `handler` as `(command, line)`.
    ///
    /// Handler failures are logged and counted in the report; they never
    /// abort the command or the session.
    pub async fn command<F>(&mut self, command: &str, handler: F) -> Result<CommandReport>
    where
        F: FnMut(&str, &str) -> std::result::Result<(), HandlerError>,
    {
        if self.state == SessionState::Closed {
            return Err(ExpectError::Closed.into());
        }

        if let Some(suppress) = &self.profile.suppress_paging {
            if suppress.every_command {
                for line in suppress.commands {
                    self.setup_command(line).await?;
                }
            }
        }

        let report = command::run(
            &mut self.engine,
            self.profile,
            &mut self.state,
            command,
            handler,
            self.timeout,
        )
        .await?;
        Ok(report)
    }

    /// Hand the session over to the local terminal.
    ///
    /// Device output is relayed to stdout and local keystrokes to the
    /// device until either side ends. The current terminal geometry is
    /// announced first so full-screen output is sized correctly, and the
    /// terminal runs in raw mode for the duration. Afterwards the session
    /// is back at Ready, so scripted commands and the logout handshake
    /// still work.
    pub async fn interact(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(ExpectError::Closed.into());
        }
        info!("interactive passthrough to {}", self.host.hostname);
        if let (Some(target), Some((rows, cols))) = (&self.resize_target, terminal_geometry()) {
            target.push_geometry(rows, cols);
        }

        self.state = SessionState::Executing;
        let raw = interact::RawMode::enable();
        let mut input = interact::spawn_stdin_pump();
        let mut stdout = tokio::io::stdout();
        let outcome = interact::passthrough(&mut self.engine, &mut input, &mut stdout).await;
        drop(raw);
        self.state = SessionState::Ready;
        outcome
    }

    /// Log out and tear the session down.
    ///
    /// Teardown (transport close, sink flush, resize deregistration) runs
    /// on every path, including the logout loop exceeding its bound.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let outcome = self.logout().await;
        self.teardown().await;
        outcome
    }

    /// The logout handshake, bounded at [`LOGOUT_ATTEMPT_LIMIT`] prompt
    /// exchanges. Stream end is the success signal: the device closing
    /// on us is exactly what logout is for.
    async fn logout(&mut self) -> Result<()> {
        self.state = SessionState::LoggingOut;
        debug!("sending logout");
        self.engine.send_line(self.profile.logout.command)?;

        let confirm = self.profile.logout.confirm.as_ref();
        let mut patterns = Vec::with_capacity(2);
        if let Some(confirm) = confirm {
            patterns.push(&confirm.pattern);
        }
        patterns.push(&self.profile.prompt);
        let prompt_index = patterns.len() - 1;

        for _ in 0..LOGOUT_ATTEMPT_LIMIT {
            match self.engine.expect(&patterns, self.timeout).await {
                Err(ExpectError::Eof | ExpectError::Closed | ExpectError::Timeout(_)) => {
                    debug!("session ended after logout");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
                Ok(m) if m.index == prompt_index => {
                    // Still at a prompt; some families need another nudge.
                    debug!("prompt during logout, resending");
                    self.engine.send_line(self.profile.logout.command)?;
                }
                Ok(_) => {
                    if let Some(confirm) = confirm {
                        debug!("confirming logout");
                        self.engine.send_line(confirm.response)?;
                    }
                }
            }
        }
        Err(ProtocolError::LogoutFailed {
            limit: LOGOUT_ATTEMPT_LIMIT,
        }
        .into())
    }

    /// Release everything. Safe to call more than once.
    async fn teardown(&mut self) {
        if let Some(target) = self.resize_target.take() {
            resize::deregister(&target);
        }
        self.engine.close();
        if let Some(sink) = self.sink.take() {
            sink.close().await;
        }
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};
    use crate::platform::VendorKind;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio_test::assert_ok;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Transport that replays a scripted device conversation.
    ///
    /// Chunks are returned in order, one per `recv` call, independent of
    /// what was sent; an empty chunk stands for a read timeout and an
    /// exhausted script for stream end. Everything sent is recorded.
    struct ScriptedTransport {
        chunks: VecDeque<Vec<u8>>,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        tee: Option<mpsc::UnboundedSender<Vec<u8>>>,
        closed: bool,
    }

    impl ScriptedTransport {
        fn new(chunks: &[&[u8]]) -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let transport = Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                sent: sent.clone(),
                tee: None,
                closed: false,
            };
            (transport, sent)
        }

        fn with_tee(mut self, tee: mpsc::UnboundedSender<Vec<u8>>) -> Self {
            self.tee = Some(tee);
            self
        }
    }

    impl Transport for ScriptedTransport {
        async fn recv(&mut self, timeout: Duration) -> std::result::Result<Vec<u8>, ExpectError> {
            if self.closed {
                return Err(ExpectError::Closed);
            }
            match self.chunks.pop_front() {
                Some(chunk) if chunk.is_empty() => Err(ExpectError::Timeout(timeout)),
                Some(chunk) => {
                    if let Some(tee) = &self.tee {
                        let _ = tee.send(chunk.clone());
                    }
                    Ok(chunk)
                }
                None => Err(ExpectError::Eof),
            }
        }

        fn send(&mut self, data: &[u8]) -> std::result::Result<(), ExpectError> {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed
        }

        fn close(&mut self) {
            self.closed = true;
            self.tee = None;
        }
    }

    fn ios_host() -> HostSpec {
        HostSpec::new("rtr1.example.net", VendorKind::CiscoIos)
            .with_user("admin")
            .with_password("sekrit")
            .with_timeout(Duration::from_secs(1))
    }

    fn junos_host() -> HostSpec {
        HostSpec::new("core1.example.net", VendorKind::Junos)
            .with_user("admin")
            .with_password("sekrit")
            .with_timeout(Duration::from_secs(1))
    }

    fn count_sent(sent: &Arc<Mutex<Vec<Vec<u8>>>>, needle: &[u8]) -> usize {
        sent.lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_slice() == needle)
            .count()
    }

    #[tokio::test]
    async fn test_login_answers_each_challenge_once() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"The authenticity of host 'rtr1' can't be established.\r\n\
              Are you sure you want to continue connecting (yes/no)? ",
            b"\r\nPassword: ",
            b"\r\nrtr1# ",
        ]);
        let session = Session::attach(transport, &ios_host(), None).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(count_sent(&sent, b"yes\n"), 1);
        assert_eq!(count_sent(&sent, b"sekrit\n"), 1);
    }

    #[tokio::test]
    async fn test_second_host_key_prompt_is_fatal() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"Are you sure you want to continue connecting (yes/no)? ",
            b"\r\nAre you sure you want to continue connecting (yes/no)? ",
        ]);
        let err = Session::attach(transport, &ios_host(), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::HostKeyRejected)
        ));
        // Only the first challenge got an answer.
        assert_eq!(count_sent(&sent, b"yes\n"), 1);
    }

    #[tokio::test]
    async fn test_second_password_prompt_is_fatal() {
        init_logs();
        let (transport, sent) =
            ScriptedTransport::new(&[b"Password: ", b"\r\nPassword: "]);
        let err = Session::attach(transport, &ios_host(), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::PasswordRejected)
        ));
        assert_eq!(count_sent(&sent, b"sekrit\n"), 1);
    }

    #[tokio::test]
    async fn test_command_delivers_lines_without_terminators() {
        init_logs();
        let (transport, _sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nrtr1# ",
            // Paging suppression runs before the command on this family.
            b"terminal length 0\r\nrtr1# ",
            b"terminal width 0\r\nrtr1# ",
            b"show version\r\n12.1(3)\r\nrtr1# ",
        ]);
        let mut session = Session::attach(transport, &ios_host(), None).await.unwrap();

        let mut lines = Vec::new();
        let report = session
            .command("show version", |command, line| {
                assert_eq!(command, "show version");
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();

        // The echoed command line is dropped, the output line arrives
        // stripped of its terminator.
        assert_eq!(lines, vec!["12.1(3)"]);
        assert_eq!(report.lines, 1);
        assert_eq!(report.handler_errors, 0);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_pagination_is_answered_and_counted() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nadmin@core1>",
            // One-shot paging setup at session start on this family.
            b"set cli screen-length 0\r\nadmin@core1>",
            b"show interfaces\r\nline one\r\nMORE",
            b"line two\r\nadmin@core1> ",
        ]);
        let mut session = Session::attach(transport, &junos_host(), None)
            .await
            .unwrap();

        let mut lines = Vec::new();
        let report = session
            .command("show interfaces", |_, line| {
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();

        // No echo suppression on this family: the echoed command line is
        // ordinary output.
        assert_eq!(lines, vec!["show interfaces", "line one", "line two"]);
        assert_eq!(report.pagination_events, 1);
        assert_eq!(count_sent(&sent, b" "), 1);
    }

    #[tokio::test]
    async fn test_every_pagination_marker_gets_one_continuation() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nadmin@core1>",
            b"set cli screen-length 0\r\nadmin@core1>",
            b"show configuration\r\npart one\r\nMORE",
            b"part two\r\nMORE",
            b"part three\r\nadmin@core1> ",
        ]);
        let mut session = Session::attach(transport, &junos_host(), None)
            .await
            .unwrap();

        let mut lines = Vec::new();
        let report = session
            .command("show configuration", |_, line| {
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();

        // The run ends at the prompt after the last marker, not at the
        // first one, and each marker is answered exactly once.
        assert_eq!(
            lines,
            vec!["show configuration", "part one", "part two", "part three"]
        );
        assert_eq!(report.pagination_events, 2);
        assert_eq!(count_sent(&sent, b" "), 2);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_handler_failure_never_aborts_the_command() {
        init_logs();
        let (transport, _sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nrtr1# ",
            b"terminal length 0\r\nrtr1# ",
            b"terminal width 0\r\nrtr1# ",
            b"show clock\r\nbad line\r\ngood line\r\nrtr1# ",
        ]);
        let mut session = Session::attach(transport, &ios_host(), None).await.unwrap();

        let report = session
            .command("show clock", |_, line| {
                if line.starts_with("bad") {
                    return Err("parse failure".into());
                }
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(report.lines, 2);
        assert_eq!(report.handler_errors, 1);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_enable_escalation_sends_secret() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nrtr1> ",
            b"enable\r\nPassword: ",
            b"\r\nrtr1# ",
        ]);
        let host = ios_host().with_enable_password("enab");
        let session = Session::attach(transport, &host, None).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(count_sent(&sent, b"enable\n"), 1);
        assert_eq!(count_sent(&sent, b"enab\n"), 1);
    }

    #[tokio::test]
    async fn test_enable_without_prompt_is_fatal() {
        init_logs();
        let (transport, _sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nrtr1> ",
            b"enable\r\nPassword: ",
            // Stream ends before the prompt comes back.
        ]);
        let host = ios_host().with_enable_password("enab");
        let err = Session::attach(transport, &host, None).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::EnableFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_treats_stream_end_as_success() {
        init_logs();
        let (transport, sent) =
            ScriptedTransport::new(&[b"Password: ", b"\r\nrtr1# "]);
        let mut session = Session::attach(transport, &ios_host(), None).await.unwrap();

        assert_ok!(session.disconnect().await);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(count_sent(&sent, b"logout\n"), 1);

        // Disconnecting again is a no-op.
        assert_ok!(session.disconnect().await);
    }

    #[tokio::test]
    async fn test_logout_confirmation_loop_is_bounded() {
        init_logs();
        // The device keeps asking for confirmation forever.
        let mut script: Vec<&[u8]> = vec![b"Password: ", b"\r\nadmin@core1> "];
        script.push(b"set cli screen-length 0\r\nadmin@core1> ");
        for _ in 0..12 {
            script.push(b"Do you really want to log out? [y/n] ");
        }
        let (transport, sent) = ScriptedTransport::new(&script);
        let mut session = Session::attach(transport, &junos_host(), None)
            .await
            .unwrap();

        let err = session.disconnect().await.err().unwrap();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::LogoutFailed { limit: 10 })
        ));
        assert_eq!(count_sent(&sent, b"y\n"), 10);
        // Teardown ran anyway.
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_disconnect_closes_the_log_sink_on_failure_too() {
        init_logs();
        let mut script: Vec<&[u8]> = vec![b"Password: ", b"\r\nadmin@core1> "];
        script.push(b"set cli screen-length 0\r\nadmin@core1> ");
        for _ in 0..12 {
            script.push(b"Do you really want to log out? [y/n] ");
        }
        let (sink, tee) = SideLogSink::spawn();
        let (transport, _sent) = ScriptedTransport::new(&script);
        let transport = transport.with_tee(tee);
        let mut session = Session::attach(transport, &junos_host(), Some(sink))
            .await
            .unwrap();

        // Logout fails, but disconnect still returns with the sink
        // flushed and the transport closed.
        let err = session.disconnect().await.err().unwrap();
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_attach_rejects_incomplete_identity() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[b"Password: "]);
        let host = HostSpec::new("rtr1", VendorKind::ProCurve).with_password("pw");
        let err = Session::attach(transport, &host, None).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "user" })
        ));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resize_target_registered_only_once_ready() {
        init_logs();
        let _guard = resize::REGISTRY_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        // A failed login must never leave the target registered: a
        // geometry command injected during the password exchange would
        // be consumed as challenge input.
        let (tx, _rx) = mpsc::unbounded_channel();
        let target = Arc::new(ResizeTarget::new(tx, VendorKind::CiscoIos.profile()));
        let (transport, _sent) = ScriptedTransport::new(&[b"Password: ", b"\r\nPassword: "]);
        let err = Session::establish(transport, &ios_host(), None, Some(target.clone()))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::PasswordRejected)
        ));
        assert!(resize::current().map_or(true, |t| !Arc::ptr_eq(&t, &target)));

        // A successful login registers it; disconnect clears it again.
        let (tx, _rx) = mpsc::unbounded_channel();
        let target = Arc::new(ResizeTarget::new(tx, VendorKind::CiscoIos.profile()));
        let (transport, _sent) = ScriptedTransport::new(&[b"Password: ", b"\r\nrtr1# "]);
        let mut session = Session::establish(transport, &ios_host(), None, Some(target.clone()))
            .await
            .unwrap();
        assert!(resize::current().is_some_and(|t| Arc::ptr_eq(&t, &target)));

        session.disconnect().await.unwrap();
        assert!(resize::current().map_or(true, |t| !Arc::ptr_eq(&t, &target)));
    }

    #[tokio::test]
    async fn test_interact_relays_device_output_until_stream_end() {
        init_logs();
        let (transport, _sent) = ScriptedTransport::new(&[b"motd line\r\n", b"rtr1# "]);
        let mut engine = ExpectEngine::new(transport);
        // Keep the sender alive so local input stays pending.
        let (_tx, mut input) = mpsc::channel(4);
        let mut output = std::io::Cursor::new(Vec::new());

        interact::passthrough(&mut engine, &mut input, &mut output)
            .await
            .unwrap();
        assert_eq!(output.into_inner(), b"motd line\r\nrtr1# ");
    }

    #[tokio::test]
    async fn test_interact_flushes_pending_bytes_and_forwards_keystrokes() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[b"rtr1# tail", b"", b""]);
        let mut engine = ExpectEngine::new(transport);
        // A previous expect leaves the bytes after the prompt buffered.
        let prompt = regex::bytes::Regex::new(r"rtr1#").unwrap();
        engine
            .expect(&[&prompt], Duration::from_secs(1))
            .await
            .unwrap();

        let (tx, mut input) = mpsc::channel(4);
        tx.send(b"exit\r".to_vec()).await.unwrap();
        drop(tx);
        let mut output = std::io::Cursor::new(Vec::new());

        interact::passthrough(&mut engine, &mut input, &mut output)
            .await
            .unwrap();
        assert_eq!(output.into_inner(), b" tail");
        assert_eq!(count_sent(&sent, b"exit\r"), 1);
    }

    #[tokio::test]
    async fn test_banner_is_dismissed_before_the_prompt() {
        init_logs();
        let (transport, sent) = ScriptedTransport::new(&[
            b"Password: ",
            b"\r\nPress any key to continue",
            b"\r\nsw1#",
            b"terminal length 1000\r\nsw1#",
            b"terminal width 1920\r\nsw1#",
            b"show system\r\nuptime 4 days\r\nsw1# ",
        ]);
        let host = HostSpec::new("sw1.example.net", VendorKind::ProCurve)
            .with_user("admin")
            .with_password("sekrit")
            .with_timeout(Duration::from_secs(1));
        let mut session = Session::attach(transport, &host, None).await.unwrap();
        // The banner keystroke is raw, not a full line.
        assert_eq!(count_sent(&sent, b" "), 1);

        let mut lines = Vec::new();
        session
            .command("show system", |_, line| {
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(lines, vec!["show system", "uptime 4 days"]);
    }
}
