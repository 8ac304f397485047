//! # ratcom
//!
//! Expect-style automation of interactive CLI sessions on network devices.
//!
//! ratcom drives the external ssh client under a pseudo-terminal, logs in,
//! optionally escalates privileges, runs commands while answering
//! pagination prompts, and hands each output line to a caller-supplied
//! handler. A ready session can also be handed to the local terminal with
//! [`Session::interact`](driver::Session::interact). Vendor differences
//! (prompt shape, paging, logout handshake) are plain data in a
//! [`VendorProfile`]; the session automaton is the same for every device
//! family.
//!
//! ## Example
//!
//! ```no_run
//! use ratcom::{HostSpec, Session, VendorKind};
//!
//! # async fn run() -> ratcom::Result<()> {
//! let host = HostSpec::new("rtr1.example.net", VendorKind::CiscoIos)
//!     .with_user("admin")
//!     .with_password("secret");
//!
//! let mut session = Session::connect(&host, false).await?;
//! session
//!     .command("show version", |_, line| {
//!         println!("{line}");
//!         Ok(())
//!     })
//!     .await?;
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod host;
pub mod platform;
pub mod transport;

pub use channel::{ExpectBuffer, ExpectEngine, ExpectMatch};
pub use driver::{
    announce_current_geometry, spawn_winch_watcher, CommandReport, HandlerError, Session,
    SessionState, SideLogSink,
};
pub use error::{ConfigError, Error, ExpectError, ProtocolError, Result};
pub use host::{HostSpec, DEFAULT_SSH_PORT, DEFAULT_TIMEOUT};
pub use platform::{VendorKind, VendorProfile};
pub use transport::{PtyTransport, SshCommand, Transport, DEFAULT_SSH_BINARY};
