//! The per-vendor profile tables.
//!
//! Patterns here are literals reviewed by hand; construction panicking at
//! first use would mean a typo in this file, so `unwrap` is acceptable.

use regex::bytes::Regex;

use super::{
    Banner, Confirm, Enable, Logout, Pagination, ResizeCommands, SuppressPaging, VendorProfile,
};

/// Unknown-host-key confirmation printed by the openssh client.
const HOST_KEY_PROMPT: &str = "Are you sure you want to continue connecting";

/// Login (and enable) password challenge.
const PASSWORD_PROMPT: &str = "(P|p)assword:";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

/// Anchor a prompt body to the start of a line.
fn anchored(body: &str) -> Regex {
    re(&format!("(?m)^{body}"))
}

pub(super) fn cisco_ios() -> VendorProfile {
    VendorProfile {
        name: "ios",
        prompt: anchored(r"[a-zA-Z0-9\._-]+(>|#)"),
        prompt_anchored: true,
        password_prompt: re(PASSWORD_PROMPT),
        host_key_prompt: re(HOST_KEY_PROMPT),
        banner: None,
        enable: Some(Enable {
            command: "enable",
            password_prompt: re(PASSWORD_PROMPT),
        }),
        // Paging is disabled outright before every command, so no marker.
        pagination: None,
        suppress_paging: Some(SuppressPaging {
            commands: &["terminal length 0", "terminal width 0"],
            every_command: true,
        }),
        logout: Logout {
            command: "logout",
            confirm: None,
        },
        resize: Some(ResizeCommands {
            templates: &["terminal length {rows}", "terminal width {cols}"],
        }),
        suppress_echo: true,
    }
}

pub(super) fn cisco_nxos() -> VendorProfile {
    VendorProfile {
        name: "nxos",
        prompt: anchored(r"[a-zA-Z0-9\._-]+(>|#)"),
        prompt_anchored: true,
        password_prompt: re(PASSWORD_PROMPT),
        host_key_prompt: re(HOST_KEY_PROMPT),
        banner: None,
        enable: Some(Enable {
            command: "enable",
            password_prompt: re(PASSWORD_PROMPT),
        }),
        pagination: None,
        suppress_paging: Some(SuppressPaging {
            commands: &["terminal length 0", "terminal width 0"],
            every_command: true,
        }),
        logout: Logout {
            command: "logout",
            confirm: None,
        },
        resize: Some(ResizeCommands {
            templates: &["terminal length {rows}", "terminal width {cols}"],
        }),
        suppress_echo: true,
    }
}

pub(super) fn procurve() -> VendorProfile {
    VendorProfile {
        name: "procurve",
        prompt: re(r"[a-zA-Z0-9\._-]+(>|#)"),
        prompt_anchored: false,
        password_prompt: re(PASSWORD_PROMPT),
        host_key_prompt: re(HOST_KEY_PROMPT),
        // ProCurve shows a full-screen banner before the first prompt.
        banner: Some(Banner {
            pattern: re(r"(P|p)ress any key to continue"),
            response: " ",
        }),
        enable: Some(Enable {
            command: "enable",
            password_prompt: re(PASSWORD_PROMPT),
        }),
        pagination: Some(Pagination {
            pattern: re(r"MORE"),
            response: " ",
        }),
        suppress_paging: Some(SuppressPaging {
            commands: &["terminal length 1000", "terminal width 1920"],
            every_command: true,
        }),
        logout: Logout {
            command: "logout",
            confirm: Some(Confirm {
                pattern: re(r"y/n"),
                response: "y",
            }),
        },
        resize: Some(ResizeCommands {
            templates: &["terminal length {rows}", "terminal width {cols}"],
        }),
        suppress_echo: false,
    }
}

pub(super) fn ironware() -> VendorProfile {
    VendorProfile {
        name: "ironware",
        prompt: re(r"[a-zA-Z0-9@\._-]+(>|#)"),
        prompt_anchored: false,
        password_prompt: re(PASSWORD_PROMPT),
        host_key_prompt: re(HOST_KEY_PROMPT),
        banner: None,
        enable: Some(Enable {
            command: "enable",
            password_prompt: re(PASSWORD_PROMPT),
        }),
        pagination: None,
        // IronWare has no terminal length knob; this disables paging instead.
        suppress_paging: Some(SuppressPaging {
            commands: &["skip-page-display"],
            every_command: true,
        }),
        logout: Logout {
            command: "logout",
            confirm: None,
        },
        resize: None,
        suppress_echo: false,
    }
}

pub(super) fn junos() -> VendorProfile {
    VendorProfile {
        name: "junos",
        prompt: re(r"[a-zA-Z0-9\._@-]+(>|#)"),
        prompt_anchored: false,
        password_prompt: re(PASSWORD_PROMPT),
        host_key_prompt: re(HOST_KEY_PROMPT),
        banner: None,
        // Junos has no enable concept; privilege comes from the login class.
        enable: None,
        pagination: Some(Pagination {
            pattern: re(r"MORE"),
            response: " ",
        }),
        suppress_paging: Some(SuppressPaging {
            commands: &["set cli screen-length 0"],
            every_command: false,
        }),
        logout: Logout {
            command: "logout",
            confirm: Some(Confirm {
                pattern: re(r"y/n"),
                response: "y",
            }),
        },
        resize: None,
        suppress_echo: false,
    }
}
