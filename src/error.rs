//! Error types for the dashboard core.
//!
//! One enum per boundary: store transport, gateway, configuration and
//! operator input parsing.  The state transition functions themselves are
//! total and never return errors; malformed payloads are normalised in
//! [`gateway::decode`](crate::gateway::decode) instead.

use core::fmt;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`RealtimeStore`](crate::app::ports::RealtimeStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing service cannot be reached at all.
    Unreachable,
    /// The request reached the service but failed (HTTP status, I/O, …).
    Transport(String),
    /// The service answered with a body that is not JSON.
    InvalidResponse(String),
    /// The watcher or request could not be started locally.
    Spawn(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "store unreachable"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// Subscription or command failure surfaced by a sync gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Subscribing to `path` failed; no updates will be delivered.
    Subscribe { path: String, source: StoreError },
    /// A live subscription on `path` reported a transport failure.
    Stream { path: String, source: StoreError },
    /// Writing to `path` failed.  Never retried automatically.
    Command { path: String, source: StoreError },
}

impl GatewayError {
    pub fn path(&self) -> &str {
        match self {
            Self::Subscribe { path, .. } | Self::Stream { path, .. } | Self::Command { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe { path, source } => write!(f, "subscribe {path}: {source}"),
            Self::Stream { path, source } => write!(f, "stream {path}: {source}"),
            Self::Command { path, source } => write!(f, "command {path}: {source}"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Subscribe { source, .. } | Self::Stream { source, .. } | Self::Command { source, .. } => {
                Some(source)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Io(std::io::Error),
    /// The config file is not valid TOML for [`DashboardConfig`](crate::config::DashboardConfig).
    Parse(String),
    /// A field failed validation.  The `&'static str` names the field and why.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config read failed: {e}"),
            Self::Parse(msg) => write!(f, "config parse failed: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Rejected textual input (enum names, console lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    UnknownSensor,
    UnknownActuator,
    UnknownMode,
    UnknownSource,
    UnknownTheme,
    /// `on` / `off` expected.
    BadSwitch,
    UnknownCommand,
    Empty,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSensor => write!(f, "unknown sensor"),
            Self::UnknownActuator => write!(f, "unknown actuator"),
            Self::UnknownMode => write!(f, "unknown mode (expected auto|manual)"),
            Self::UnknownSource => write!(f, "unknown source (expected demo|live)"),
            Self::UnknownTheme => write!(f, "unknown theme (expected dark|light)"),
            Self::BadSwitch => write!(f, "expected on|off"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::Empty => write!(f, "empty input"),
        }
    }
}

impl std::error::Error for ParseError {}
