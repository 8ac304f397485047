//! Login negotiation against the external ssh client.
//!
//! The client owns the cryptography; what reaches us is its interactive
//! chatter. Two challenges can appear in either order before the device
//! itself does: the unknown-host-key confirmation and the password prompt.
//! Each is answered exactly once. Seeing one a second time means the
//! answer was rejected, and retrying would loop forever, so the second
//! occurrence is fatal.

use std::time::Duration;

use log::debug;
use regex::bytes::Regex;
use secrecy::SecretString;

use crate::channel::ExpectEngine;
use crate::error::{Error, ProtocolError};
use crate::platform::VendorProfile;
use crate::transport::Transport;

/// Drive the login phase until `next_stage` (the first device-side
/// pattern: banner or prompt) is reached.
pub(super) async fn negotiate<T: Transport>(
    engine: &mut ExpectEngine<T>,
    profile: &VendorProfile,
    password: &SecretString,
    next_stage: &Regex,
    timeout: Duration,
) -> Result<(), Error> {
    let mut key_accepted = false;
    let mut password_sent = false;

    loop {
        let m = engine
            .expect(
                &[&profile.host_key_prompt, &profile.password_prompt, next_stage],
                timeout,
            )
            .await?;
        match m.index {
            0 => {
                if key_accepted {
                    return Err(ProtocolError::HostKeyRejected.into());
                }
                debug!("unknown host key, accepting");
                engine.send_line("yes")?;
                key_accepted = true;
            }
            1 => {
                if password_sent {
                    return Err(ProtocolError::PasswordRejected.into());
                }
                debug!("password prompt, answering");
                engine.send_secret_line(password)?;
                password_sent = true;
            }
            _ => {
                debug!("login complete");
                return Ok(());
            }
        }
    }
}
