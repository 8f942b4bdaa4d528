//! Inbound commands to the application service, and the remote requests
//! they turn into.
//!
//! Operator commands come from the console adapter.  The
//! [`DashboardService`](super::service::DashboardService) applies them to
//! the local snapshot first and hands back the [`RemoteRequest`]s that a
//! live session must send through the gateway.

use core::fmt;

use crate::model::{ActuatorKey, Mode};

/// Actions the operator can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Switch between automatic and manual control.  Always honoured.
    SetMode(Mode),

    /// Turn one actuator on or off.  Ignored while the mode is `auto`.
    SetActuator(ActuatorKey, bool),

    /// Turn every actuator on or off.  Ignored while the mode is `auto`.
    SetAll(bool),
}

/// One write the gateway must perform after an optimistic local apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRequest {
    Actuator(ActuatorKey, bool),
    Mode(Mode),
}

impl fmt::Display for RemoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(key, on) => {
                write!(f, "{key} {}", if *on { "on" } else { "off" })
            }
            Self::Mode(mode) => write!(f, "mode {mode}"),
        }
    }
}
