// ABOUTME: LXD status code table shared by containers and operations.
// ABOUTME: Classifies codes as settled container states or final operation states.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Numeric status codes reported by LXD for both containers and operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Created,
    Started,
    Stopped,
    Running,
    Cancelling,
    Pending,
    Starting,
    Stopping,
    Aborting,
    Freezing,
    Frozen,
    Thawed,
    Error,
    Success,
    Failure,
    Cancelled,
    Unknown(u16),
}

impl StatusCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            100 => StatusCode::Created,
            101 => StatusCode::Started,
            102 => StatusCode::Stopped,
            103 => StatusCode::Running,
            104 => StatusCode::Cancelling,
            105 => StatusCode::Pending,
            106 => StatusCode::Starting,
            107 => StatusCode::Stopping,
            108 => StatusCode::Aborting,
            109 => StatusCode::Freezing,
            110 => StatusCode::Frozen,
            111 => StatusCode::Thawed,
            112 => StatusCode::Error,
            200 => StatusCode::Success,
            400 => StatusCode::Failure,
            401 => StatusCode::Cancelled,
            other => StatusCode::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Created => 100,
            StatusCode::Started => 101,
            StatusCode::Stopped => 102,
            StatusCode::Running => 103,
            StatusCode::Cancelling => 104,
            StatusCode::Pending => 105,
            StatusCode::Starting => 106,
            StatusCode::Stopping => 107,
            StatusCode::Aborting => 108,
            StatusCode::Freezing => 109,
            StatusCode::Frozen => 110,
            StatusCode::Thawed => 111,
            StatusCode::Error => 112,
            StatusCode::Success => 200,
            StatusCode::Failure => 400,
            StatusCode::Cancelled => 401,
            StatusCode::Unknown(code) => *code,
        }
    }

    /// An operation in this status will not change again.
    pub fn is_operation_final(&self) -> bool {
        matches!(
            self,
            StatusCode::Success | StatusCode::Failure | StatusCode::Cancelled
        )
    }

    /// A container in this status is not in the middle of a transition.
    pub fn is_container_stable(&self) -> bool {
        matches!(
            self,
            StatusCode::Stopped | StatusCode::Running | StatusCode::Frozen | StatusCode::Error
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.code().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u16::deserialize(deserializer).map(StatusCode::from_code)
    }
}

/// Lifecycle status of a container as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Stopped,
    Running,
    Frozen,
    Error,
    Starting,
    Stopping,
    Freezing,
    Thawed,
    Pending,
    Unknown(u16),
}

impl ContainerStatus {
    /// Whether the container has settled in a state a transition can start from.
    pub fn is_stable(&self) -> bool {
        matches!(
            self,
            ContainerStatus::Stopped
                | ContainerStatus::Running
                | ContainerStatus::Frozen
                | ContainerStatus::Error
        )
    }
}

impl From<StatusCode> for ContainerStatus {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::Stopped => ContainerStatus::Stopped,
            StatusCode::Running => ContainerStatus::Running,
            StatusCode::Frozen => ContainerStatus::Frozen,
            StatusCode::Error => ContainerStatus::Error,
            StatusCode::Starting | StatusCode::Started => ContainerStatus::Starting,
            StatusCode::Stopping => ContainerStatus::Stopping,
            StatusCode::Freezing => ContainerStatus::Freezing,
            StatusCode::Thawed => ContainerStatus::Thawed,
            StatusCode::Pending | StatusCode::Created => ContainerStatus::Pending,
            other => ContainerStatus::Unknown(other.code()),
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}
