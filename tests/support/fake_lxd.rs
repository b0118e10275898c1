// ABOUTME: In-memory LXD server implementing ResourceClient.
// ABOUTME: Simulates async operations, ETags, transitional statuses and records every call.

use async_trait::async_trait;
use lxdc::client::{ClientError, ResourceClient, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub if_match: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    status: (&'static str, u16),
    config: HashMap<String, String>,
    devices: HashMap<String, HashMap<String, String>>,
    profiles: Vec<String>,
    ephemeral: bool,
    description: String,
    revision: u64,
    /// Status reported for the next `reads` GETs instead of `status`.
    transitional: Option<((&'static str, u16), u32)>,
}

impl Entry {
    fn new(status: (&'static str, u16)) -> Self {
        Entry {
            status,
            config: HashMap::new(),
            devices: HashMap::new(),
            profiles: vec!["default".to_string()],
            ephemeral: false,
            description: String::new(),
            revision: 1,
            transitional: None,
        }
    }

    fn etag(&self) -> String {
        format!("\"rev-{}\"", self.revision)
    }

    fn document(&self, name: &str, status: (&'static str, u16)) -> Value {
        let mut expanded_config: HashMap<String, String> = HashMap::new();
        let mut expanded_devices: HashMap<String, HashMap<String, String>> = HashMap::new();
        if self.profiles.iter().any(|p| p == "default") {
            expanded_config.insert("limits.memory".to_string(), "1GiB".to_string());
            expanded_devices.insert(
                "root".to_string(),
                HashMap::from([
                    ("type".to_string(), "disk".to_string()),
                    ("path".to_string(), "/".to_string()),
                    ("pool".to_string(), "default".to_string()),
                ]),
            );
        }
        expanded_config.extend(self.config.clone());
        expanded_devices.extend(self.devices.clone());

        json!({
            "name": name,
            "status": status.0,
            "status_code": status.1,
            "architecture": "x86_64",
            "config": self.config,
            "expanded_config": expanded_config,
            "devices": self.devices,
            "expanded_devices": expanded_devices,
            "profiles": self.profiles,
            "ephemeral": self.ephemeral,
            "stateful": false,
            "description": self.description,
            "created_at": "2024-03-01T10:00:00Z",
            "last_used_at": "2024-03-01T10:05:00Z",
            "location": "none"
        })
    }
}

#[derive(Debug, Clone)]
enum Effect {
    Create { name: String, body: Value },
    Update { name: String, body: Value },
    State { name: String, action: String },
    Delete { name: String },
}

#[derive(Debug)]
struct PendingOperation {
    polls_left: u32,
    failure: Option<String>,
    effect: Effect,
}

const RUNNING: (&str, u16) = ("Running", 103);
const STOPPED: (&str, u16) = ("Stopped", 102);
const FROZEN: (&str, u16) = ("Frozen", 110);

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    containers: HashMap<String, Entry>,
    operations: HashMap<String, PendingOperation>,
    next_operation: u64,
    calls: Vec<Call>,
    polls_per_operation: u32,
    transitional_reads: u32,
    sync_mutations: bool,
    fail_transport: bool,
    fail_next_operation: Option<String>,
    keep_after_delete: bool,
    lose_operations: bool,
    overrides: HashMap<(Method, String), Response>,
}

/// Fake LXD daemon. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeLxd {
    inner: Arc<Mutex<Inner>>,
}

// =============================================================================
// Setup and inspection
// =============================================================================

impl FakeLxd {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.inner.lock().polls_per_operation = 1;
        fake
    }

    pub fn client(&self) -> Arc<dyn ResourceClient> {
        Arc::new(self.clone())
    }

    pub fn with_running(self, name: &str) -> Self {
        self.insert(name, RUNNING);
        self
    }

    pub fn with_stopped(self, name: &str) -> Self {
        self.insert(name, STOPPED);
        self
    }

    pub fn with_frozen(self, name: &str) -> Self {
        self.insert(name, FROZEN);
        self
    }

    fn insert(&self, name: &str, status: (&'static str, u16)) {
        let mut inner = self.inner.lock();
        inner.order.push(name.to_string());
        inner.containers.insert(name.to_string(), Entry::new(status));
    }

    pub fn set_ephemeral(&self, name: &str) {
        if let Some(entry) = self.inner.lock().containers.get_mut(name) {
            entry.ephemeral = true;
        }
    }

    /// GETs an operation stays unfinished for before completing.
    pub fn polls_per_operation(&self, polls: u32) {
        self.inner.lock().polls_per_operation = polls;
    }

    /// GETs a container reports a transitional status after a state change.
    pub fn transitional_reads(&self, reads: u32) {
        self.inner.lock().transitional_reads = reads;
    }

    /// Answer mutations with sync envelopes instead of operations.
    pub fn sync_mutations(&self) {
        self.inner.lock().sync_mutations = true;
    }

    pub fn fail_transport(&self) {
        self.inner.lock().fail_transport = true;
    }

    /// The next operation finishes as Failure with `message` and no effect.
    pub fn fail_next_operation(&self, message: &str) {
        self.inner.lock().fail_next_operation = Some(message.to_string());
    }

    /// Operations are started but forgotten at once, so polling them is a 404
    /// and their effect never happens.
    pub fn lose_operations(&self) {
        self.inner.lock().lose_operations = true;
    }

    /// Delete operations succeed but the container stays listed.
    pub fn keep_after_delete(&self) {
        self.inner.lock().keep_after_delete = true;
    }

    /// Always answer `method path` with `response`.
    pub fn respond_to(&self, method: Method, path: &str, response: Response) {
        self.inner
            .lock()
            .overrides
            .insert((method, path.to_string()), response);
    }

    /// Simulate a change made by another client.
    pub fn touch(&self, name: &str) {
        if let Some(entry) = self.inner.lock().containers.get_mut(name) {
            entry.revision += 1;
            entry.description = format!("changed elsewhere (rev {})", entry.revision);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().containers.contains_key(name)
    }

    pub fn status_of(&self, name: &str) -> Option<&'static str> {
        self.inner.lock().containers.get(name).map(|e| e.status.0)
    }

    pub fn config_of(&self, name: &str) -> HashMap<String, String> {
        self.inner
            .lock()
            .containers
            .get(name)
            .map(|e| e.config.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Calls other than GETs.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != Method::Get)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

// =============================================================================
// Request handling
// =============================================================================

fn container_name(path: &str) -> Option<String> {
    let rest = path.strip_prefix("containers/")?;
    let name = rest.strip_suffix("/state").unwrap_or(rest);
    urlencoding::decode(name).ok().map(|n| n.into_owned())
}

impl Inner {
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        if_match: Option<&str>,
    ) -> Result<Response, ClientError> {
        self.calls.push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
            if_match: if_match.map(str::to_string),
        });

        if self.fail_transport {
            return Err(ClientError::Connect {
                endpoint: "fake".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        if let Some(response) = self.overrides.get(&(method, path.to_string())) {
            return Ok(response.clone());
        }

        let response = match (method, path) {
            (Method::Get, "containers") => self.list(),
            (Method::Get, p) if p.starts_with("operations/") => self.poll(&p["operations/".len()..]),
            (Method::Get, p) => match container_name(p) {
                Some(name) => self.read(&name),
                None => Response::not_found(),
            },
            (Method::Post, "containers") => self.create(body.cloned().unwrap_or(Value::Null)),
            (Method::Put, p) if p.ends_with("/state") => match container_name(p) {
                Some(name) => self.change_state(&name, body.cloned().unwrap_or(Value::Null)),
                None => Response::not_found(),
            },
            (Method::Put, p) => match container_name(p) {
                Some(name) => self.update(&name, body.cloned().unwrap_or(Value::Null), if_match),
                None => Response::not_found(),
            },
            (Method::Delete, p) => match container_name(p) {
                Some(name) => self.delete(&name),
                None => Response::not_found(),
            },
            _ => Response::error(400, "unsupported request"),
        };
        Ok(response)
    }

    fn list(&self) -> Response {
        let urls: Vec<String> = self
            .order
            .iter()
            .filter(|name| self.containers.contains_key(*name))
            .map(|name| format!("/1.0/containers/{}", urlencoding::encode(name)))
            .collect();
        Response::sync(json!(urls))
    }

    fn read(&mut self, name: &str) -> Response {
        let Some(entry) = self.containers.get_mut(name) else {
            return Response::not_found();
        };
        let status = match entry.transitional.as_mut() {
            Some((status, reads)) if *reads > 0 => {
                *reads -= 1;
                *status
            }
            _ => entry.status,
        };
        Response::sync(entry.document(name, status)).with_etag(entry.etag())
    }

    fn create(&mut self, body: Value) -> Response {
        let Some(name) = body["name"].as_str().map(str::to_string) else {
            return Response::error(400, "No name provided");
        };
        if self.containers.contains_key(&name) {
            return Response::error(409, "This container already exists");
        }
        if body["source"]["type"] != "none" {
            return Response::error(400, "Unsupported source type");
        }
        self.start_operation(Effect::Create { name, body })
    }

    fn update(&mut self, name: &str, body: Value, if_match: Option<&str>) -> Response {
        let Some(entry) = self.containers.get(name) else {
            return Response::not_found();
        };
        if if_match.is_some_and(|tag| tag != entry.etag()) {
            return Response::error(412, "ETag doesn't match");
        }
        self.start_operation(Effect::Update {
            name: name.to_string(),
            body,
        })
    }

    fn change_state(&mut self, name: &str, body: Value) -> Response {
        let Some(entry) = self.containers.get(name) else {
            return Response::not_found();
        };
        let action = body["action"].as_str().unwrap_or_default().to_string();
        let current = entry.status.1;
        let refusal = match action.as_str() {
            "start" if current == RUNNING.1 => Some("The instance is already running"),
            "stop" if current == STOPPED.1 => Some("The instance is already stopped"),
            "freeze" if current != RUNNING.1 => Some("The instance isn't running"),
            "unfreeze" if current != FROZEN.1 => Some("The instance isn't frozen"),
            "restart" if current != RUNNING.1 => Some("The instance isn't running"),
            "start" | "stop" | "freeze" | "unfreeze" | "restart" => None,
            _ => Some("Unknown state action"),
        };
        if let Some(message) = refusal {
            return Response::error(400, message);
        }
        self.start_operation(Effect::State {
            name: name.to_string(),
            action,
        })
    }

    fn delete(&mut self, name: &str) -> Response {
        let Some(entry) = self.containers.get(name) else {
            return Response::not_found();
        };
        if entry.status.1 == RUNNING.1 {
            return Response::error(400, "Instance is running");
        }
        self.start_operation(Effect::Delete {
            name: name.to_string(),
        })
    }

    fn start_operation(&mut self, effect: Effect) -> Response {
        let failure = self.fail_next_operation.take();
        if self.sync_mutations {
            return match failure {
                Some(message) => Response::error(500, message),
                None => {
                    self.apply(effect);
                    Response::sync(Value::Null)
                }
            };
        }

        self.next_operation += 1;
        let id = format!("op-{:04}", self.next_operation);
        if self.lose_operations {
            return Response::operation(
                format!("/1.0/operations/{id}"),
                operation_document(&id, ("Running", 103), ""),
            );
        }
        self.operations.insert(
            id.clone(),
            PendingOperation {
                polls_left: self.polls_per_operation,
                failure,
                effect,
            },
        );
        Response::operation(
            format!("/1.0/operations/{id}"),
            operation_document(&id, ("Running", 103), ""),
        )
    }

    fn poll(&mut self, id: &str) -> Response {
        let Some(pending) = self.operations.get_mut(id) else {
            return Response::not_found();
        };
        if pending.polls_left > 0 {
            pending.polls_left -= 1;
            return Response::sync(operation_document(id, ("Running", 103), ""));
        }

        let Some(finished) = self.operations.remove(id) else {
            return Response::not_found();
        };
        match finished.failure {
            Some(message) => Response::sync(operation_document(id, ("Failure", 400), &message)),
            None => {
                self.apply(finished.effect);
                Response::sync(operation_document(id, ("Success", 200), ""))
            }
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Create { name, body } => {
                let mut entry = Entry::new(STOPPED);
                entry.config = field(&body, "config");
                entry.devices = field(&body, "devices");
                let profiles: Vec<String> = field(&body, "profiles");
                if !profiles.is_empty() {
                    entry.profiles = profiles;
                }
                entry.ephemeral = body["ephemeral"].as_bool().unwrap_or(false);
                entry.description = body["description"].as_str().unwrap_or_default().to_string();
                self.order.push(name.clone());
                self.containers.insert(name, entry);
            }
            Effect::Update { name, body } => {
                if let Some(entry) = self.containers.get_mut(&name) {
                    entry.config = field(&body, "config");
                    entry.devices = field(&body, "devices");
                    entry.profiles = field(&body, "profiles");
                    entry.description =
                        body["description"].as_str().unwrap_or_default().to_string();
                    entry.revision += 1;
                }
            }
            Effect::State { name, action } => {
                let reads = self.transitional_reads;
                let Some(entry) = self.containers.get_mut(&name) else {
                    return;
                };
                let (target, passing) = match action.as_str() {
                    "start" | "restart" => (RUNNING, ("Starting", 106)),
                    "stop" => (STOPPED, ("Stopping", 107)),
                    "freeze" => (FROZEN, ("Freezing", 109)),
                    _ => (RUNNING, ("Thawed", 111)),
                };
                if target == STOPPED && entry.ephemeral {
                    self.containers.remove(&name);
                    return;
                }
                entry.status = target;
                entry.revision += 1;
                entry.transitional = (reads > 0).then_some((passing, reads));
            }
            Effect::Delete { name } => {
                if !self.keep_after_delete {
                    self.containers.remove(&name);
                }
            }
        }
    }
}

fn field<T: serde::de::DeserializeOwned + Default>(body: &Value, key: &str) -> T {
    serde_json::from_value(body[key].clone()).unwrap_or_default()
}

fn operation_document(id: &str, status: (&str, u16), err: &str) -> Value {
    json!({
        "id": id,
        "class": "task",
        "description": "Fake operation",
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:01Z",
        "status": status.0,
        "status_code": status.1,
        "resources": {"containers": []},
        "metadata": null,
        "may_cancel": false,
        "err": err
    })
}

#[async_trait]
impl ResourceClient for FakeLxd {
    async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.inner.lock().handle(Method::Get, path, None, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        self.inner.lock().handle(Method::Post, path, Some(body), None)
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        self.inner.lock().handle(Method::Put, path, Some(body), None)
    }

    async fn put_if_match(
        &self,
        path: &str,
        body: &Value,
        etag: Option<&str>,
    ) -> Result<Response, ClientError> {
        self.inner
            .lock()
            .handle(Method::Put, path, Some(body), etag)
    }

    async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.inner.lock().handle(Method::Delete, path, None, None)
    }
}
