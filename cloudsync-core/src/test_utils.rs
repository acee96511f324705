//! 测试辅助模块
//!
//! `StubTransport` is an in-memory CloudSync service: enough of the REST
//! surface to exercise the session and the onboarding workflow end to end,
//! with scripted failures and a log of every request it received.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cloudsync_client::{
    FailureHandler, GatewayError, GatewayRequest, HttpMethod, RawResponse, RequestGateway,
    ResourceClient, Transport, TransportFailure,
};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::session::ConsoleSession;

pub const STUB_BASE: &str = "http://stub.local/cloudsync/api/rest/";

/// Password the stub DuraCloud instance accepts.
pub const VALID_PASSWORD: &str = "s3cret";

/// Objects every stub store claims to hold.
const STORE_OBJECT_COUNT: u32 = 5;

/// (collection, item key)
const COLLECTIONS: &[(&str, &str)] = &[
    ("users", "user"),
    ("tasks", "task"),
    ("objectsets", "objectset"),
    ("objectstores", "objectstore"),
    ("systemlogs", "systemlog"),
    ("tasklogs", "tasklog"),
];

fn item_key(collection: &str) -> Option<&'static str> {
    COLLECTIONS
        .iter()
        .find(|(c, _)| *c == collection)
        .map(|(_, key)| *key)
}

// ===== StubTransport =====

struct ScriptedFailure {
    method: HttpMethod,
    path: String,
    status: u16,
}

struct StubState {
    collections: HashMap<&'static str, BTreeMap<u64, Value>>,
    last_id: u64,
    configuration: Value,
    accounts: Vec<Value>,
    spaces: HashMap<String, Vec<Value>>,
    failures: Vec<ScriptedFailure>,
}

pub struct StubTransport {
    state: RwLock<StubState>,
    requests: RwLock<Vec<GatewayRequest>>,
}

impl StubTransport {
    /// A service holding only the built-in object set (id 1).
    pub fn new() -> Arc<Self> {
        let mut collections: HashMap<&'static str, BTreeMap<u64, Value>> = COLLECTIONS
            .iter()
            .map(|(c, _)| (*c, BTreeMap::new()))
            .collect();
        collections.entry("objectsets").or_default().insert(
            1,
            json!({"id": 1, "name": "All Objects", "type": "pidPattern", "data": "*"}),
        );

        Arc::new(Self {
            state: RwLock::new(StubState {
                collections,
                last_id: 1,
                configuration: json!({"maxWorkers": 2}),
                accounts: Vec::new(),
                spaces: HashMap::new(),
                failures: Vec::new(),
            }),
            requests: RwLock::new(Vec::new()),
        })
    }

    /// Offer a provider account (and its spaces) to valid credentials.
    pub async fn add_provider(&self, id: &str, provider_type: &str, spaces: &[&str]) {
        let mut state = self.state.write().await;
        state
            .accounts
            .push(json!({"id": id, "type": provider_type}));
        state.spaces.insert(
            id.to_string(),
            spaces.iter().map(|s| json!({"id": s})).collect(),
        );
    }

    /// Insert an item directly; returns its id.
    pub async fn seed(&self, collection: &str, mut item: Value) -> String {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        item["id"] = json!(id);
        if let Some((name, _)) = COLLECTIONS.iter().find(|(c, _)| *c == collection) {
            state.collections.entry(*name).or_default().insert(id, item);
        }
        id.to_string()
    }

    /// The next matching request answers with `status`.
    pub async fn fail_next(&self, method: HttpMethod, path: &str, status: u16) {
        self.state.write().await.failures.push(ScriptedFailure {
            method,
            path: path.to_string(),
            status,
        });
    }

    pub async fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.read().await.clone()
    }

    /// How many requests hit `method path` (path relative to the base, no query).
    pub async fn count(&self, method: HttpMethod, path: &str) -> usize {
        let url = format!("{STUB_BASE}{path}");
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == method && r.url.split('?').next() == Some(url.as_str()))
            .count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: GatewayRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.write().await.push(request.clone());

        let Some(rest) = request.url.strip_prefix(STUB_BASE) else {
            return Err(TransportFailure {
                detail: format!("unknown host: {}", request.url),
            });
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut state = self.state.write().await;
        if let Some(pos) = state
            .failures
            .iter()
            .position(|f| f.method == request.method && f.path == path)
        {
            let failure = state.failures.remove(pos);
            return Ok(RawResponse::new(failure.status, "scripted failure"));
        }

        let body = match request.body.as_deref().map(serde_json::from_str::<Value>) {
            Some(Ok(body)) => body,
            Some(Err(e)) => return Ok(RawResponse::new(400, e.to_string())),
            None => Value::Null,
        };

        Ok(state.route(request.method, path, query, &body))
    }
}

impl StubState {
    fn route(&mut self, method: HttpMethod, path: &str, query: &str, body: &Value) -> RawResponse {
        let segments: Vec<&str> = path.split('/').collect();

        match (method, segments.as_slice()) {
            (HttpMethod::Get, ["configuration"]) => {
                ok(&json!({"configuration": self.configuration}))
            }
            (HttpMethod::Put, ["configuration"]) => {
                self.configuration = body["configuration"].clone();
                RawResponse::new(204, "")
            }
            (HttpMethod::Get, ["users", "current"]) => {
                ok(&json!({"user": {"id": 1, "name": "admin"}}))
            }
            (HttpMethod::Post, ["duracloud", "provideraccounts"]) => {
                if body["password"] != VALID_PASSWORD {
                    return RawResponse::new(401, "Unauthorized");
                }
                ok(&json!({"provideraccounts": self.accounts}))
            }
            (HttpMethod::Post, ["duracloud", "spaces"]) => {
                if body["password"] != VALID_PASSWORD {
                    return RawResponse::new(401, "Unauthorized");
                }
                let provider = body["providerId"].as_str().unwrap_or_default();
                match self.spaces.get(provider) {
                    Some(spaces) => ok(&json!({"spaces": spaces})),
                    None => RawResponse::new(404, "no such provider"),
                }
            }
            (HttpMethod::Get, ["objectstores", id, "objects"]) => {
                if self.item("objectstores", id).is_none() {
                    return RawResponse::new(404, "");
                }
                let param = |name: &str| {
                    query
                        .split('&')
                        .filter_map(|kv| kv.split_once('='))
                        .find(|(k, _)| *k == name)
                        .and_then(|(_, v)| v.parse::<u32>().ok())
                        .unwrap_or(0)
                };
                let (limit, offset) = (param("limit"), param("offset"));
                let end = STORE_OBJECT_COUNT.min(offset.saturating_add(limit));
                let objects: Vec<Value> = (offset..end)
                    .map(|n| json!({"pid": format!("demo:{n}")}))
                    .collect();
                ok(&json!({"objects": objects}))
            }
            (HttpMethod::Get, [collection @ ("systemlogs" | "tasklogs"), id, "content"]) => {
                match self.item(collection, id) {
                    Some(_) => RawResponse::new(200, format!("log {id} line 1\nlog {id} line 2\n")),
                    None => RawResponse::new(404, ""),
                }
            }
            (HttpMethod::Get, [collection]) => match item_key(collection) {
                Some(_) => {
                    let items: Vec<&Value> = self
                        .collections
                        .get(*collection)
                        .map(|c| c.values().collect())
                        .unwrap_or_default();
                    ok(&json!({ *collection: items }))
                }
                None => RawResponse::new(404, ""),
            },
            (HttpMethod::Post, [collection]) => self.create(collection, body),
            (HttpMethod::Get, [collection, id]) => match (item_key(collection), self.item(collection, id)) {
                (Some(key), Some(item)) => ok(&json!({ key: item })),
                _ => RawResponse::new(404, ""),
            },
            (HttpMethod::Put, [collection, id]) => self.replace(collection, id, body),
            (HttpMethod::Delete, [collection, id]) => {
                let removed = id.parse::<u64>().ok().and_then(|id| {
                    self.collections
                        .get_mut(*collection)
                        .and_then(|c| c.remove(&id))
                });
                match removed {
                    Some(_) => RawResponse::new(204, ""),
                    None => RawResponse::new(404, ""),
                }
            }
            _ => RawResponse::new(404, ""),
        }
    }

    fn item(&self, collection: &str, id: &str) -> Option<&Value> {
        let id = id.parse::<u64>().ok()?;
        self.collections.get(collection)?.get(&id)
    }

    fn create(&mut self, collection: &str, body: &Value) -> RawResponse {
        let Some(key) = item_key(collection) else {
            return RawResponse::new(404, "");
        };
        let mut item = body[key].clone();
        if !item.is_object() {
            return RawResponse::new(400, format!("expected {{\"{key}\": {{...}}}}"));
        }

        self.last_id += 1;
        item["id"] = json!(self.last_id);
        let reply = ok(&json!({ key: item }));
        if let Some(items) = self.collections.get_mut(collection) {
            items.insert(self.last_id, item);
        }
        RawResponse::new(201, reply.body)
    }

    fn replace(&mut self, collection: &str, id: &str, body: &Value) -> RawResponse {
        let (Some(key), Ok(id)) = (item_key(collection), id.parse::<u64>()) else {
            return RawResponse::new(404, "");
        };
        let Some(slot) = self
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
        else {
            return RawResponse::new(404, "");
        };

        let mut item = body[key].clone();
        item["id"] = json!(id);
        *slot = item.clone();
        ok(&json!({ key: item }))
    }
}

fn ok(body: &Value) -> RawResponse {
    RawResponse::new(200, body.to_string())
}

// ===== Failure handlers =====

/// Counts failures routed to it.
#[derive(Default)]
pub struct CountingHandler(AtomicUsize);

impl CountingHandler {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FailureHandler for CountingHandler {
    fn on_failure(&self, _error: &GatewayError) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ===== 工厂方法 =====

/// Client over a fresh stub, with a counting default handler.
pub fn stub_client() -> (ResourceClient, Arc<StubTransport>, Arc<CountingHandler>) {
    let stub = StubTransport::new();
    let default_handler = Arc::new(CountingHandler::default());
    let gateway = RequestGateway::with_default_handler(
        STUB_BASE,
        Arc::clone(&stub) as Arc<dyn Transport>,
        Arc::clone(&default_handler) as Arc<dyn FailureHandler>,
    )
    .expect("stub base URL is valid");
    (ResourceClient::new(gateway), stub, default_handler)
}

/// Session over a fresh stub, with a counting default handler.
pub fn stub_session() -> (ConsoleSession, Arc<StubTransport>, Arc<CountingHandler>) {
    let (client, stub, default_handler) = stub_client();
    (ConsoleSession::new(client), stub, default_handler)
}
