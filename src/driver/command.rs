//! Command execution and line-oriented output delivery.

use std::time::{Duration, Instant};

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::SessionState;
use crate::channel::ExpectEngine;
use crate::error::Error;
use crate::platform::VendorProfile;
use crate::transport::Transport;

/// Error type output handlers may fail with. Handler failures are logged
/// and counted, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// What happened while one command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    /// Output lines delivered to the handler.
    pub lines: usize,

    /// Handler invocations that failed.
    pub handler_errors: usize,

    /// Pagination continuations sent.
    pub pagination_events: usize,

    /// Wall-clock duration of the command.
    pub elapsed: Duration,
}

/// Run one command and feed each completed output line to `handler`.
///
/// The loop watches for three events: a completed line (delivered), the
/// pagination marker (answered with the continuation keystroke, the
/// output keeps flowing), and the prompt (the command is done). Line
/// terminators are consumed by the match and never reach the handler.
pub(super) async fn run<T, F>(
    engine: &mut ExpectEngine<T>,
    profile: &VendorProfile,
    state: &mut SessionState,
    command: &str,
    mut handler: F,
    timeout: Duration,
) -> Result<CommandReport, Error>
where
    T: Transport,
    F: FnMut(&str, &str) -> Result<(), HandlerError>,
{
    let started = Instant::now();
    let mut report = CommandReport {
        lines: 0,
        handler_errors: 0,
        pagination_events: 0,
        elapsed: Duration::ZERO,
    };

    debug!("running command {:?}", command);
    *state = SessionState::Executing;
    engine.send_line(command)?;

    let mut patterns: Vec<&Regex> = vec![&profile.prompt, &LINE_BREAK];
    if let Some(pagination) = &profile.pagination {
        patterns.push(&pagination.pattern);
    }

    // The device echoes the command line back on some families; the echo
    // is the first completed line and is not output.
    let mut drop_next_line = profile.suppress_echo;

    loop {
        let m = engine.expect(&patterns, timeout).await?;
        match m.index {
            0 => {
                debug!("prompt after command, {} lines", report.lines);
                *state = SessionState::Ready;
                break;
            }
            1 => {
                let line = m.before.trim_end_matches('\r');
                if drop_next_line {
                    drop_next_line = false;
                    continue;
                }
                report.lines += 1;
                if let Err(e) = handler(command, line) {
                    report.handler_errors += 1;
                    error!("output handler failed for command {:?}: {}", command, e);
                }
            }
            _ => {
                debug!("pagination marker, continuing");
                *state = SessionState::Paginating;
                // Anything on the marker's line was pager chrome, not output.
                if let Some(pagination) = &profile.pagination {
                    engine.send(pagination.response.as_bytes())?;
                }
                report.pagination_events += 1;
                *state = SessionState::Executing;
            }
        }
    }

    report.elapsed = started.elapsed();
    Ok(report)
}
