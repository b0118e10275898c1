// ABOUTME: State change requests sent to a container's state endpoint.
// ABOUTME: The five named actions and their timeout/force/stateful options, validated locally.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, InvalidTransitionSnafu, Result};

/// Named state transitions accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateAction {
    Start,
    Stop,
    Restart,
    Freeze,
    Unfreeze,
}

impl StateAction {
    pub const ALL: [StateAction; 5] = [
        StateAction::Start,
        StateAction::Stop,
        StateAction::Restart,
        StateAction::Freeze,
        StateAction::Unfreeze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateAction::Start => "start",
            StateAction::Stop => "stop",
            StateAction::Restart => "restart",
            StateAction::Freeze => "freeze",
            StateAction::Unfreeze => "unfreeze",
        }
    }

    /// `force` kills instead of shutting down; only stop and restart shut down.
    pub fn accepts_force(&self) -> bool {
        matches!(self, StateAction::Stop | StateAction::Restart)
    }

    /// `stateful` checkpoints on stop and restores on start.
    pub fn accepts_stateful(&self) -> bool {
        matches!(self, StateAction::Stop | StateAction::Start)
    }
}

impl fmt::Display for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        StateAction::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| Error::InvalidAction {
                action: s.to_string(),
            })
    }
}

/// Body of a `PUT containers/<name>/state` request.
///
/// Every field is always sent; nothing is left for the server to default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub action: StateAction,
    #[serde(serialize_with = "as_seconds")]
    pub timeout: Duration,
    pub force: bool,
    pub stateful: bool,
}

impl StateChange {
    pub fn new(action: StateAction, timeout: Duration) -> Self {
        Self {
            action,
            timeout,
            force: false,
            stateful: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    /// Reject option combinations the action cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.force && !self.action.accepts_force() {
            return InvalidTransitionSnafu {
                action: self.action.as_str(),
                reason: "force only applies to stop and restart",
            }
            .fail();
        }
        if self.stateful && !self.action.accepts_stateful() {
            return InvalidTransitionSnafu {
                action: self.action.as_str(),
                reason: "stateful only applies to stop and start",
            }
            .fail();
        }
        if self.timeout < Duration::from_secs(1) {
            return InvalidTransitionSnafu {
                action: self.action.as_str(),
                reason: "timeout must be at least one second",
            }
            .fail();
        }
        Ok(())
    }
}

fn as_seconds<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(timeout.as_secs())
}
