// ABOUTME: Background operation handles and bounded completion polling.
// ABOUTME: Replaces fixed sleeps with exponential backoff against the operations endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::client::{OPERATIONS, ResourceClient, Response, ResponseType, last_segment};
use crate::error::{
    EncodeSnafu, Error, MalformedResponseSnafu, OperationFailedSnafu, OperationLostSnafu,
    OperationTimeoutSnafu, Result,
};
use crate::types::StatusCode;

/// A server-issued handle to an asynchronous job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    pub status_code: StatusCode,
    #[serde(default)]
    pub resources: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub may_cancel: bool,
    #[serde(default)]
    pub err: String,
}

impl Operation {
    /// Extract the operation from an async envelope or an `operations/<id>` sync body.
    pub fn from_envelope(response: &Response) -> Result<Self> {
        let mut operation: Operation = serde_json::from_value(response.metadata.clone())
            .map_err(|e| {
                MalformedResponseSnafu {
                    message: format!("invalid operation body: {}", e),
                }
                .build()
            })?;

        if operation.id.is_empty() {
            operation.id = last_segment(&response.operation).unwrap_or_default();
        }
        if operation.id.is_empty() {
            return MalformedResponseSnafu {
                message: "operation response carries no operation id",
            }
            .fail();
        }
        Ok(operation)
    }

    pub fn path(&self) -> String {
        format!("{}/{}", OPERATIONS, urlencoding::encode(&self.id))
    }

    pub fn is_final(&self) -> bool {
        self.status_code.is_operation_final()
    }
}

/// Backoff parameters for waiting on background work.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_interval", with = "humantime_serde")]
    pub initial_interval: Duration,

    #[serde(default = "default_max_interval", with = "humantime_serde")]
    pub max_interval: Duration,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_initial_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_max_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            multiplier: default_multiplier(),
            timeout: default_timeout(),
        }
    }
}

impl PollConfig {
    /// Same backoff, different deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_interval,
            max: self.max_interval,
            multiplier: self.multiplier.max(1.0),
        }
    }
}

/// Infinite sequence of growing delays, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next.min(self.max);
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        Some(current)
    }
}

/// Run `probe` until it yields a value or `config.timeout` elapses.
///
/// `subject` names what is being waited on in the timeout error.
pub(crate) async fn poll_until<T, F, Fut>(config: &PollConfig, subject: &str, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let mut delays = config.backoff();

    loop {
        if let Some(done) = probe().await? {
            return Ok(done);
        }

        let elapsed = started.elapsed();
        if elapsed >= config.timeout {
            return OperationTimeoutSnafu {
                operation: subject,
                waited: elapsed,
            }
            .fail();
        }

        let delay = delays
            .next()
            .unwrap_or(config.max_interval)
            .min(config.timeout - elapsed);
        tracing::debug!(subject, ?delay, "not finished, polling again");
        tokio::time::sleep(delay).await;
    }
}

/// Wait for `operation` to reach a final status.
///
/// Success returns the final operation; failure or cancellation is an
/// `OperationFailed` error carrying the server's `err` text. An operation the
/// server no longer knows is `OperationLost`.
pub async fn wait_for_operation(
    client: &dyn ResourceClient,
    operation: Operation,
    config: &PollConfig,
) -> Result<Operation> {
    let finished = if operation.is_final() {
        operation
    } else {
        let path = operation.path();
        let path = path.as_str();
        let id = operation.id.as_str();
        let subject = format!("operation {id}");
        poll_until(config, &subject, move || async move {
            let response = client.get(path).await?;
            if response.is_not_found() {
                return OperationLostSnafu { operation: id }.fail();
            }
            if response.is_error() {
                return Err(Error::from_envelope(&response, path));
            }
            let current = Operation::from_envelope(&response)?;
            Ok(current.is_final().then_some(current))
        })
        .await?
    };

    match finished.status_code {
        StatusCode::Success => {
            tracing::debug!(operation = %finished.id, "operation succeeded");
            Ok(finished)
        }
        status => OperationFailedSnafu {
            operation: finished.id,
            status,
            message: finished.err,
        }
        .fail(),
    }
}

/// Drive a mutating response to completion.
///
/// Error envelopes are classified against `subject`; async envelopes are
/// awaited; sync envelopes are already complete.
pub(crate) async fn complete(
    client: &dyn ResourceClient,
    response: Response,
    config: &PollConfig,
    subject: &str,
) -> Result<Option<Operation>> {
    match response.kind {
        ResponseType::Error => Err(Error::from_envelope(&response, subject)),
        ResponseType::Sync => Ok(None),
        ResponseType::Async => {
            let operation = Operation::from_envelope(&response)?;
            tracing::debug!(operation = %operation.id, subject, "waiting for operation");
            wait_for_operation(client, operation, config).await.map(Some)
        }
    }
}

/// Encode a request body.
pub(crate) fn to_body<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context(EncodeSnafu)
}
