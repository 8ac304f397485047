//! Resolved device identity.
//!
//! Inventory parsing and wildcard default inheritance belong to the
//! external inventory collaborator; this type is what arrives here after
//! resolution. It is read-only input: the automaton clones it at connect
//! time and never mutates the caller's copy.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::platform::VendorKind;

/// Default port for the external secure-shell client (22/tcp).
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default timeout for interactive operations (10 sec).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A device entry resolved from the inventory.
#[derive(Debug, Clone)]
pub struct HostSpec {
    /// Short name used in output labelling.
    pub shortname: String,

    /// Hostname or IP address.
    pub hostname: String,

    /// Remote port.
    pub port: u16,

    /// Vendor type tag selecting the profile.
    pub vendor: VendorKind,

    /// Whether the inventory marks this device active.
    pub enabled: bool,

    /// Login user.
    pub user: String,

    /// Login password.
    pub password: Option<SecretString>,

    /// Enable (privilege escalation) password.
    pub enable_password: Option<SecretString>,

    /// Per-device timeout for interactive operations.
    pub timeout: Duration,
}

impl HostSpec {
    /// Create a spec with defaults; the short name is derived from the
    /// first hostname label unless overridden.
    pub fn new(hostname: impl Into<String>, vendor: VendorKind) -> Self {
        let hostname = hostname.into();
        let shortname = hostname
            .split('.')
            .next()
            .unwrap_or(hostname.as_str())
            .to_string();
        Self {
            shortname,
            hostname,
            port: DEFAULT_SSH_PORT,
            vendor,
            enabled: true,
            user: String::new(),
            password: None,
            enable_password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the short name.
    pub fn with_shortname(mut self, shortname: impl Into<String>) -> Self {
        self.shortname = shortname.into();
        self
    }

    /// Set the remote port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the login password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the enable password.
    pub fn with_enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark the device enabled or disabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check that the identity is complete enough to connect.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::MissingField { field: "host" });
        }
        if self.user.is_empty() {
            return Err(ConfigError::MissingField { field: "user" });
        }
        self.resolved_password().map(|_| ())
    }

    /// The password to log in with.
    ///
    /// Cisco-family devices sometimes ignore the password entirely, so a
    /// missing one is treated as blank there; other vendors require it.
    pub fn resolved_password(&self) -> Result<SecretString, ConfigError> {
        match &self.password {
            Some(p) => Ok(p.clone()),
            None if self.vendor.tolerates_blank_password() => {
                Ok(SecretString::from(String::new()))
            }
            None => Err(ConfigError::MissingField { field: "password" }),
        }
    }
}
