//! Vendor behavior as data.
//!
//! Everything that differs between device families lives in a
//! [`VendorProfile`]: prompt shape, pagination marker, paging suppression
//! commands, logout handshake, resize command templates. The session
//! automaton and the command runner are generic over the profile and
//! contain no per-vendor branching.

mod vendors;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Vendor type tag as it appears in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorKind {
    /// Cisco IOS / IOS-XE.
    #[serde(rename = "ios")]
    CiscoIos,
    /// Cisco NX-OS.
    #[serde(rename = "nxos")]
    CiscoNxos,
    /// HP ProCurve.
    #[serde(rename = "procurve")]
    ProCurve,
    /// Brocade/Foundry IronWare.
    #[serde(rename = "ironware")]
    Ironware,
    /// Juniper Junos.
    #[serde(rename = "junos")]
    Junos,
}

impl VendorKind {
    /// The inventory tag for this vendor.
    pub fn as_str(self) -> &'static str {
        match self {
            VendorKind::CiscoIos => "ios",
            VendorKind::CiscoNxos => "nxos",
            VendorKind::ProCurve => "procurve",
            VendorKind::Ironware => "ironware",
            VendorKind::Junos => "junos",
        }
    }

    /// The behavior profile for this vendor.
    pub fn profile(self) -> &'static VendorProfile {
        match self {
            VendorKind::CiscoIos => &IOS,
            VendorKind::CiscoNxos => &NXOS,
            VendorKind::ProCurve => &PROCURVE,
            VendorKind::Ironware => &IRONWARE,
            VendorKind::Junos => &JUNOS,
        }
    }

    /// Cisco-family gear sometimes has no login password at all.
    pub fn tolerates_blank_password(self) -> bool {
        matches!(self, VendorKind::CiscoIos | VendorKind::CiscoNxos)
    }
}

impl FromStr for VendorKind {
    type Err = ConfigError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "ios" => Ok(VendorKind::CiscoIos),
            "nxos" => Ok(VendorKind::CiscoNxos),
            "procurve" => Ok(VendorKind::ProCurve),
            "ironware" => Ok(VendorKind::Ironware),
            "junos" => Ok(VendorKind::Junos),
            _ => Err(ConfigError::UnknownVendor {
                tag: tag.to_string(),
            }),
        }
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static IOS: Lazy<VendorProfile> = Lazy::new(vendors::cisco_ios);
static NXOS: Lazy<VendorProfile> = Lazy::new(vendors::cisco_nxos);
static PROCURVE: Lazy<VendorProfile> = Lazy::new(vendors::procurve);
static IRONWARE: Lazy<VendorProfile> = Lazy::new(vendors::ironware);
static JUNOS: Lazy<VendorProfile> = Lazy::new(vendors::junos);

/// Pre-prompt banner some devices print before accepting input.
#[derive(Debug)]
pub struct Banner {
    /// Pattern announcing the banner ("Press any key to continue").
    pub pattern: Regex,
    /// Keystroke that dismisses it.
    pub response: &'static str,
}

/// Privilege escalation support.
#[derive(Debug)]
pub struct Enable {
    /// Escalation command.
    pub command: &'static str,
    /// Password challenge that may follow it.
    pub password_prompt: Regex,
}

/// Mid-output pagination marker and its continuation keystroke.
#[derive(Debug)]
pub struct Pagination {
    pub pattern: Regex,
    pub response: &'static str,
}

/// Commands that turn pagination off at the source.
#[derive(Debug)]
pub struct SuppressPaging {
    pub commands: &'static [&'static str],
    /// Re-issue before every command, or once at session setup.
    pub every_command: bool,
}

/// Confirmation exchange during logout ("Do you want to log out [y/n]?").
#[derive(Debug)]
pub struct Confirm {
    pub pattern: Regex,
    pub response: &'static str,
}

/// Logout handshake description.
#[derive(Debug)]
pub struct Logout {
    pub command: &'static str,
    pub confirm: Option<Confirm>,
}

/// Command templates for announcing terminal geometry to the device.
///
/// Templates carry `{rows}` and `{cols}` placeholders.
#[derive(Debug)]
pub struct ResizeCommands {
    pub templates: &'static [&'static str],
}

impl ResizeCommands {
    /// Render the templates for a concrete geometry.
    pub fn render(&self, rows: u16, cols: u16) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| {
                t.replace("{rows}", &rows.to_string())
                    .replace("{cols}", &cols.to_string())
            })
            .collect()
    }
}

/// Data-only description of one device family's interactive behavior.
#[derive(Debug)]
pub struct VendorProfile {
    /// Tag, for logging.
    pub name: &'static str,

    /// Command prompt.
    pub prompt: Regex,

    /// Whether the prompt pattern is anchored to a line start. Anchoring
    /// keeps prompt-shaped text inside command output from ending a read
    /// early on chatty platforms.
    pub prompt_anchored: bool,

    /// Login password challenge.
    pub password_prompt: Regex,

    /// Unknown-host-key confirmation from the external ssh client.
    pub host_key_prompt: Regex,

    /// Pre-prompt banner, if the family prints one.
    pub banner: Option<Banner>,

    /// Privilege escalation, if the family supports it.
    pub enable: Option<Enable>,

    /// Pagination marker, if the family paginates.
    pub pagination: Option<Pagination>,

    /// Paging suppression commands.
    pub suppress_paging: Option<SuppressPaging>,

    /// Logout handshake.
    pub logout: Logout,

    /// Geometry announcement templates, for families that honor them.
    pub resize: Option<ResizeCommands>,

    /// Whether the device echoes the command line back; when set the first
    /// output line is dropped.
    pub suppress_echo: bool,
}
