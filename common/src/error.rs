use std::fmt;
use std::net::IpAddr;

use pnet::ipnetwork::IpNetwork;
use thiserror::Error;

/// Shown for input the user can correct.
pub const INVALID_URL_MESSAGE: &str = "Enter a valid URL (include http:// or https://).";

/// Shown for every target the server refuses or fails to reach.
///
/// Resolution failures and reserved addresses share this text so a caller cannot
/// map out the internal network by probing hostnames.
pub const UNREACHABLE_MESSAGE: &str = "This site cannot be reached.";

/// Why a target was refused.
///
/// The fields carry operator-facing detail for logs. End users should only ever see
/// [`Rejection::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The scheme is missing or is not `http`/`https`.
    #[error("scheme '{scheme}' is not allowed, expected http or https")]
    InvalidScheme { scheme: String },

    /// The host is malformed, missing, or could not be resolved in time.
    #[error("could not resolve '{host}': {reason}")]
    ResolutionFailed { host: String, reason: String },

    /// At least one resolved address lies inside a denied range.
    #[error("'{host}' resolves to {addr}, inside reserved range {range}")]
    PrivateAddress {
        host: String,
        addr: IpAddr,
        range: IpNetwork,
    },
}

/// Field-less view of [`Rejection`], for matching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    InvalidScheme,
    ResolutionFailed,
    PrivateAddress,
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::InvalidScheme { .. } => RejectionKind::InvalidScheme,
            Rejection::ResolutionFailed { .. } => RejectionKind::ResolutionFailed,
            Rejection::PrivateAddress { .. } => RejectionKind::PrivateAddress,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }

    pub(crate) fn invalid_scheme(scheme: impl Into<String>) -> Self {
        Rejection::InvalidScheme {
            scheme: scheme.into(),
        }
    }

    pub fn resolution_failed(host: impl Into<String>, reason: impl fmt::Display) -> Self {
        Rejection::ResolutionFailed {
            host: host.into(),
            reason: reason.to_string(),
        }
    }
}

impl RejectionKind {
    pub fn user_message(self) -> &'static str {
        match self {
            RejectionKind::InvalidScheme => INVALID_URL_MESSAGE,
            RejectionKind::ResolutionFailed | RejectionKind::PrivateAddress => UNREACHABLE_MESSAGE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RejectionKind::InvalidScheme => "invalid_scheme",
            RejectionKind::ResolutionFailed => "resolution_failed",
            RejectionKind::PrivateAddress => "private_address",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
