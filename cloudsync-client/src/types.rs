use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Id of the built-in object set that matches every object.
pub const DEFAULT_OBJECT_SET_ID: &str = "1";

// ============ Credentials & Discovery ============

/// Login to a remote storage service (`DuraCloud` or Fedora).
///
/// Entered once during onboarding and sent to the validation endpoints as-is.
/// `Debug` never prints the password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Host portion of the URL (third `/`-separated segment, port included).
    ///
    /// `https://dc.example.org:8443/durastore` → `dc.example.org:8443`.
    /// Empty when the URL has no scheme separator.
    pub fn host(&self) -> &str {
        self.url.split('/').nth(2).unwrap_or_default()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body of the space-discovery call: a credential scoped to one provider account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceQuery<'a> {
    #[serde(flatten)]
    pub credential: &'a Credential,
    pub provider_id: &'a str,
}

/// A storage-provider account reachable with a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAccount {
    #[serde(with = "crate::utils::serde_id::required")]
    pub id: String,
    /// Provider type label (e.g. `Amazon S3`); used as the display name.
    #[serde(rename = "type")]
    pub provider_type: String,
}

/// A storage compartment within a provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
}

// ============ Object Stores ============

/// Kind of a registered object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreKind {
    #[serde(rename = "duracloud")]
    DuraCloud,
    #[serde(rename = "fedora")]
    Fedora,
    /// Reported by the service but unknown to this client.
    #[serde(other)]
    Other,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuraCloud => "duracloud",
            Self::Fedora => "fedora",
            Self::Other => "other",
        }
    }

    /// Human label used in prompts and headings.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DuraCloud => "DuraCloud",
            Self::Fedora => "Fedora",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered remote storage endpoint.
///
/// `data` holds the type-specific payload as an encoded JSON string; use
/// [`ObjectStore::new`] and [`ObjectStore::payload`] instead of touching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStore {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StoreKind,
    #[serde(default)]
    pub data: String,
}

/// Payload of a `duracloud` store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuraCloudPayload {
    pub url: String,
    pub username: String,
    pub password: String,
    pub provider_id: String,
    pub provider_name: String,
    pub space: String,
    #[serde(default)]
    pub prefix: String,
}

impl fmt::Debug for DuraCloudPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuraCloudPayload")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("provider_id", &self.provider_id)
            .field("provider_name", &self.provider_name)
            .field("space", &self.space)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Payload of a `fedora` store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FedoraPayload {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for FedoraPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FedoraPayload")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Decoded store payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorePayload {
    DuraCloud(DuraCloudPayload),
    Fedora(FedoraPayload),
}

impl StorePayload {
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::DuraCloud(_) => StoreKind::DuraCloud,
            Self::Fedora(_) => StoreKind::Fedora,
        }
    }
}

impl ObjectStore {
    /// Build a not-yet-persisted store, encoding the payload into `data`.
    pub fn new(name: impl Into<String>, payload: &StorePayload) -> Result<Self, ClientError> {
        let data = match payload {
            StorePayload::DuraCloud(p) => serde_json::to_string(p),
            StorePayload::Fedora(p) => serde_json::to_string(p),
        }
        .map_err(|e| payload_error(payload.kind().as_str(), &e))?;

        Ok(Self {
            id: None,
            name: name.into(),
            kind: payload.kind(),
            data,
        })
    }

    /// Decode `data` according to `kind`.
    pub fn payload(&self) -> Result<StorePayload, ClientError> {
        match self.kind {
            StoreKind::DuraCloud => serde_json::from_str(&self.data)
                .map(StorePayload::DuraCloud)
                .map_err(|e| payload_error("duracloud", &e)),
            StoreKind::Fedora => serde_json::from_str(&self.data)
                .map(StorePayload::Fedora)
                .map_err(|e| payload_error("fedora", &e)),
            StoreKind::Other => Err(ClientError::Payload {
                kind: "other".to_string(),
                detail: "unknown store type".to_string(),
            }),
        }
    }
}

// ============ Object Sets ============

/// Kind of an object set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetKind {
    #[serde(rename = "pidPattern")]
    PidPattern,
    #[serde(rename = "pidList")]
    PidList,
    #[serde(rename = "query")]
    Query,
    #[serde(other)]
    Other,
}

impl SetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PidPattern => "pidPattern",
            Self::PidList => "pidList",
            Self::Query => "query",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named selection of source objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSet {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SetKind,
    #[serde(default)]
    pub data: String,
}

/// Payload of a `query` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPayload {
    pub query_type: String,
    pub query_text: String,
}

/// Decoded set payload. Only queries are JSON-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetPayload {
    PidPattern(String),
    PidList(String),
    Query(QueryPayload),
}

impl SetPayload {
    pub fn kind(&self) -> SetKind {
        match self {
            Self::PidPattern(_) => SetKind::PidPattern,
            Self::PidList(_) => SetKind::PidList,
            Self::Query(_) => SetKind::Query,
        }
    }
}

impl ObjectSet {
    pub fn new(name: impl Into<String>, payload: &SetPayload) -> Result<Self, ClientError> {
        let data = match payload {
            SetPayload::PidPattern(s) | SetPayload::PidList(s) => s.clone(),
            SetPayload::Query(q) => {
                serde_json::to_string(q).map_err(|e| payload_error("query", &e))?
            }
        };

        Ok(Self {
            id: None,
            name: name.into(),
            kind: payload.kind(),
            data,
        })
    }

    pub fn payload(&self) -> Result<SetPayload, ClientError> {
        match self.kind {
            SetKind::PidPattern => Ok(SetPayload::PidPattern(self.data.clone())),
            SetKind::PidList => Ok(SetPayload::PidList(self.data.clone())),
            SetKind::Query => serde_json::from_str(&self.data)
                .map(SetPayload::Query)
                .map_err(|e| payload_error("query", &e)),
            SetKind::Other => Err(ClientError::Payload {
                kind: "other".to_string(),
                detail: "unknown set type".to_string(),
            }),
        }
    }

    /// The built-in set can never be deleted.
    pub fn is_default(&self) -> bool {
        self.id.as_deref() == Some(DEFAULT_OBJECT_SET_ID)
    }
}

fn payload_error(kind: &str, e: &serde_json::Error) -> ClientError {
    ClientError::Payload {
        kind: kind.to_string(),
        detail: e.to_string(),
    }
}

// ============ Tasks, Users, Logs ============

/// A background synchronization job. Lifecycle state is owned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Everything else the service reports (set/store references, schedule...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Task {
    /// A task is idle unless the service reports some other state.
    pub fn is_active(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| !s.is_empty() && !s.eq_ignore_ascii_case("idle"))
    }
}

/// A console user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Service-wide log entry metadata. The content is fetched separately as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLog {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Log of a completed task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        with = "crate::utils::serde_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Service configuration, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(pub Map<String, Value>);

/// Filters for listing the objects held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    pub set_id: String,
    pub limit: u32,
    pub offset: u32,
}

impl ObjectQuery {
    pub fn new(set_id: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self {
            set_id: set_id.into(),
            limit,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn duracloud() -> DuraCloudPayload {
        DuraCloudPayload {
            url: "https://dc.example.org/durastore".into(),
            username: "ops".into(),
            password: "pw".into(),
            provider_id: "0".into(),
            provider_name: "Amazon S3".into(),
            space: "docs".into(),
            prefix: String::new(),
        }
    }

    #[test]
    fn store_data_is_a_string_on_the_wire() {
        let store = ObjectStore::new("n", &StorePayload::DuraCloud(duracloud())).unwrap();
        let wire = serde_json::to_value(&store).unwrap();

        assert_eq!(wire["type"], "duracloud");
        assert!(wire.get("id").is_none());
        let data = wire["data"].as_str().unwrap();
        let inner: Value = serde_json::from_str(data).unwrap();
        assert_eq!(inner["providerName"], "Amazon S3");
        assert_eq!(inner["prefix"], "");
    }

    #[test]
    fn store_payload_decodes_by_kind() {
        let wire = json!({
            "id": 4,
            "name": "Fedora Repository at fc.example.org",
            "type": "fedora",
            "data": "{\"url\":\"http://fc.example.org/fedora\",\"username\":\"fedoraAdmin\",\"password\":\"x\"}"
        });
        let store: ObjectStore = serde_json::from_value(wire).unwrap();
        assert_eq!(store.id.as_deref(), Some("4"));
        match store.payload().unwrap() {
            StorePayload::Fedora(p) => assert_eq!(p.username, "fedoraAdmin"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn unknown_store_type_still_lists() {
        let store: ObjectStore =
            serde_json::from_value(json!({"id": "9", "name": "s3", "type": "s3", "data": ""}))
                .unwrap();
        assert_eq!(store.kind, StoreKind::Other);
        assert!(store.payload().is_err());
    }

    #[test]
    fn pid_sets_carry_plain_strings() {
        let set = ObjectSet::new("all demo", &SetPayload::PidPattern("demo:*".into())).unwrap();
        assert_eq!(set.data, "demo:*");
        assert_eq!(set.kind, SetKind::PidPattern);

        let query = QueryPayload {
            query_type: "sparql".into(),
            query_text: "select ?s".into(),
        };
        let set = ObjectSet::new("q", &SetPayload::Query(query.clone())).unwrap();
        assert_eq!(set.payload().unwrap(), SetPayload::Query(query));
        assert!(set.data.contains("\"queryType\":\"sparql\""));
    }

    #[test]
    fn default_set_detection() {
        let mut set = ObjectSet::new("All Objects", &SetPayload::PidPattern("*".into())).unwrap();
        assert!(!set.is_default());
        set.id = Some(DEFAULT_OBJECT_SET_ID.into());
        assert!(set.is_default());
    }

    #[test]
    fn credential_debug_hides_password() {
        let c = Credential::new("https://x.example.com/api", "u", "topsecret");
        assert!(!format!("{c:?}").contains("topsecret"));
        assert!(!format!("{:?}", duracloud()).contains("\"pw\""));
        assert_eq!(c.host(), "x.example.com");
        assert_eq!(Credential::new("no-scheme", "u", "p").host(), "");
    }

    #[test]
    fn space_query_flattens_credential() {
        let c = Credential::new("https://h/", "u", "p");
        let body = serde_json::to_value(SpaceQuery {
            credential: &c,
            provider_id: "1",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"url": "https://h/", "username": "u", "password": "p", "providerId": "1"})
        );
    }

    #[test]
    fn task_state_reflection() {
        let t: Task = serde_json::from_value(json!({"id": 1, "name": "t", "state": "Running", "setId": 2})).unwrap();
        assert!(t.is_active());
        assert_eq!(t.attributes["setId"], 2);

        let idle: Task = serde_json::from_value(json!({"id": 2, "name": "t", "state": "idle"})).unwrap();
        assert!(!idle.is_active());
        let unknown: Task = serde_json::from_value(json!({"id": 3, "name": "t"})).unwrap();
        assert!(!unknown.is_active());
    }
}
