//! Resource catalog
//!
//! One method per semantic operation of the CloudSync REST API. Every method is
//! a path/verb pair over [`RequestGateway`] plus the `{key: ...}` envelope the
//! service wraps bodies in; nothing is cached and nothing is interpreted.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{HttpMethod, Result};
use crate::http_client::{OnError, RequestGateway};
use crate::types::{
    Configuration, Credential, ObjectQuery, ObjectSet, ObjectStore, ProviderAccount, Space,
    SpaceQuery, SystemLog, Task, TaskLog, User,
};

/// Paths of the provider-discovery endpoints used during onboarding.
const PROVIDER_ACCOUNTS_PATH: &str = "duracloud/provideraccounts";
const SPACES_PATH: &str = "duracloud/spaces";

/// Stateless catalog of CloudSync operations.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    gateway: RequestGateway,
}

impl ResourceClient {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    // ========== Configuration ==========

    pub async fn get_configuration(&self, on_error: OnError<'_>) -> Result<Configuration> {
        self.fetch_item("configuration", "configuration", on_error)
            .await
    }

    pub async fn update_configuration(
        &self,
        configuration: &Configuration,
        on_error: OnError<'_>,
    ) -> Result<Option<Configuration>> {
        self.replace("configuration", "configuration", configuration, on_error)
            .await
    }

    // ========== Users ==========

    pub async fn create_user(&self, user: &User, on_error: OnError<'_>) -> Result<Option<User>> {
        self.create("users", "user", user, on_error).await
    }

    pub async fn list_users(&self, on_error: OnError<'_>) -> Result<Vec<User>> {
        self.fetch_list("users", "users", on_error).await
    }

    pub async fn get_user(&self, id: &str, on_error: OnError<'_>) -> Result<User> {
        self.fetch_item(&item_path("users", id), "user", on_error)
            .await
    }

    /// The user this console session is logged in as.
    pub async fn get_current_user(&self, on_error: OnError<'_>) -> Result<User> {
        self.fetch_item("users/current", "user", on_error).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        user: &User,
        on_error: OnError<'_>,
    ) -> Result<Option<User>> {
        self.replace(&item_path("users", id), "user", user, on_error)
            .await
    }

    pub async fn delete_user(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("users", id), on_error)
            .await
    }

    // ========== Tasks ==========

    pub async fn create_task(&self, task: &Task, on_error: OnError<'_>) -> Result<Option<Task>> {
        self.create("tasks", "task", task, on_error).await
    }

    pub async fn list_tasks(&self, on_error: OnError<'_>) -> Result<Vec<Task>> {
        self.fetch_list("tasks", "tasks", on_error).await
    }

    pub async fn get_task(&self, id: &str, on_error: OnError<'_>) -> Result<Task> {
        self.fetch_item(&item_path("tasks", id), "task", on_error)
            .await
    }

    pub async fn update_task(
        &self,
        id: &str,
        task: &Task,
        on_error: OnError<'_>,
    ) -> Result<Option<Task>> {
        self.replace(&item_path("tasks", id), "task", task, on_error)
            .await
    }

    pub async fn delete_task(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("tasks", id), on_error)
            .await
    }

    // ========== Object Sets ==========

    pub async fn create_object_set(
        &self,
        set: &ObjectSet,
        on_error: OnError<'_>,
    ) -> Result<Option<ObjectSet>> {
        self.create("objectsets", "objectset", set, on_error).await
    }

    pub async fn list_object_sets(&self, on_error: OnError<'_>) -> Result<Vec<ObjectSet>> {
        self.fetch_list("objectsets", "objectsets", on_error).await
    }

    pub async fn get_object_set(&self, id: &str, on_error: OnError<'_>) -> Result<ObjectSet> {
        self.fetch_item(&item_path("objectsets", id), "objectset", on_error)
            .await
    }

    pub async fn update_object_set(
        &self,
        id: &str,
        set: &ObjectSet,
        on_error: OnError<'_>,
    ) -> Result<Option<ObjectSet>> {
        self.replace(&item_path("objectsets", id), "objectset", set, on_error)
            .await
    }

    pub async fn delete_object_set(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("objectsets", id), on_error)
            .await
    }

    // ========== Object Stores ==========

    pub async fn create_object_store(
        &self,
        store: &ObjectStore,
        on_error: OnError<'_>,
    ) -> Result<Option<ObjectStore>> {
        self.create("objectstores", "objectstore", store, on_error)
            .await
    }

    pub async fn list_object_stores(&self, on_error: OnError<'_>) -> Result<Vec<ObjectStore>> {
        self.fetch_list("objectstores", "objectstores", on_error)
            .await
    }

    pub async fn get_object_store(&self, id: &str, on_error: OnError<'_>) -> Result<ObjectStore> {
        self.fetch_item(&item_path("objectstores", id), "objectstore", on_error)
            .await
    }

    /// List the objects a store holds that belong to a set, one page at a time.
    pub async fn query_object_store(
        &self,
        id: &str,
        query: &ObjectQuery,
        on_error: OnError<'_>,
    ) -> Result<Vec<Value>> {
        let path = format!(
            "{}/objects?set={}&limit={}&offset={}",
            item_path("objectstores", id),
            urlencoding::encode(&query.set_id),
            query.limit,
            query.offset
        );
        self.fetch_list(&path, "objects", on_error).await
    }

    pub async fn update_object_store(
        &self,
        id: &str,
        store: &ObjectStore,
        on_error: OnError<'_>,
    ) -> Result<Option<ObjectStore>> {
        self.replace(&item_path("objectstores", id), "objectstore", store, on_error)
            .await
    }

    pub async fn delete_object_store(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("objectstores", id), on_error)
            .await
    }

    // ========== System Logs ==========

    pub async fn list_system_logs(&self, on_error: OnError<'_>) -> Result<Vec<SystemLog>> {
        self.fetch_list("systemlogs", "systemlogs", on_error).await
    }

    pub async fn get_system_log(&self, id: &str, on_error: OnError<'_>) -> Result<SystemLog> {
        self.fetch_item(&item_path("systemlogs", id), "systemlog", on_error)
            .await
    }

    /// Raw text of a system log.
    pub async fn get_system_log_content(&self, id: &str, on_error: OnError<'_>) -> Result<String> {
        let path = format!("{}/content", item_path("systemlogs", id));
        self.gateway.get_text(&path, on_error).await
    }

    pub async fn delete_system_log(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("systemlogs", id), on_error)
            .await
    }

    // ========== Task Logs ==========

    pub async fn list_task_logs(&self, on_error: OnError<'_>) -> Result<Vec<TaskLog>> {
        self.fetch_list("tasklogs", "tasklogs", on_error).await
    }

    pub async fn get_task_log(&self, id: &str, on_error: OnError<'_>) -> Result<TaskLog> {
        self.fetch_item(&item_path("tasklogs", id), "tasklog", on_error)
            .await
    }

    /// Raw text of a task log.
    pub async fn get_task_log_content(&self, id: &str, on_error: OnError<'_>) -> Result<String> {
        let path = format!("{}/content", item_path("tasklogs", id));
        self.gateway.get_text(&path, on_error).await
    }

    pub async fn delete_task_log(&self, id: &str, on_error: OnError<'_>) -> Result<()> {
        self.gateway
            .delete(&item_path("tasklogs", id), on_error)
            .await
    }

    // ========== Provider Discovery ==========

    /// Provider accounts reachable with a candidate credential.
    ///
    /// This is the live validation round-trip of onboarding: a rejected
    /// credential comes back as a failed request.
    pub async fn list_provider_accounts(
        &self,
        credential: &Credential,
        on_error: OnError<'_>,
    ) -> Result<Vec<ProviderAccount>> {
        let reply: Value = self
            .gateway
            .post(PROVIDER_ACCOUNTS_PATH, credential, on_error)
            .await?;
        self.take_list(HttpMethod::Post, PROVIDER_ACCOUNTS_PATH, reply, "provideraccounts", on_error)
    }

    /// Spaces of one provider account.
    pub async fn list_spaces(
        &self,
        credential: &Credential,
        provider_id: &str,
        on_error: OnError<'_>,
    ) -> Result<Vec<Space>> {
        let query = SpaceQuery {
            credential,
            provider_id,
        };
        let reply: Value = self.gateway.post(SPACES_PATH, &query, on_error).await?;
        self.take_list(HttpMethod::Post, SPACES_PATH, reply, "spaces", on_error)
    }

    // ========== Envelope helpers ==========

    async fn fetch_list<T>(&self, path: &str, key: &str, on_error: OnError<'_>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let reply: Value = self.gateway.get_json(path, on_error).await?;
        self.take_list(HttpMethod::Get, path, reply, key, on_error)
    }

    async fn fetch_item<T>(&self, path: &str, key: &str, on_error: OnError<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let reply: Value = self.gateway.get_json(path, on_error).await?;
        match take_field(reply, key) {
            Some(item) => serde_json::from_value(item).map_err(|e| {
                self.gateway
                    .parse_failure(HttpMethod::Get, path, &e, on_error)
            }),
            None => Err(self.gateway.parse_failure(
                HttpMethod::Get,
                path,
                &format!("missing '{key}' in response"),
                on_error,
            )),
        }
    }

    async fn create<B, T>(
        &self,
        path: &str,
        key: &str,
        body: &B,
        on_error: OnError<'_>,
    ) -> Result<Option<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let reply: Option<Value> = self
            .gateway
            .post(path, &wrap(key, body), on_error)
            .await?;
        self.take_optional(HttpMethod::Post, path, reply, key, on_error)
    }

    async fn replace<B, T>(
        &self,
        path: &str,
        key: &str,
        body: &B,
        on_error: OnError<'_>,
    ) -> Result<Option<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let reply: Option<Value> = self
            .gateway
            .put(path, &wrap(key, body), on_error)
            .await?;
        self.take_optional(HttpMethod::Put, path, reply, key, on_error)
    }

    /// A list envelope without its key decodes as an empty list.
    fn take_list<T>(
        &self,
        method: HttpMethod,
        path: &str,
        reply: Value,
        key: &str,
        on_error: OnError<'_>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        match take_field(reply, key) {
            Some(items) => serde_json::from_value(items)
                .map_err(|e| self.gateway.parse_failure(method, path, &e, on_error)),
            None => Ok(Vec::new()),
        }
    }

    /// Write verbs may answer with the stored item, or with nothing at all.
    fn take_optional<T>(
        &self,
        method: HttpMethod,
        path: &str,
        reply: Option<Value>,
        key: &str,
        on_error: OnError<'_>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        reply
            .and_then(|reply| take_field(reply, key))
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| self.gateway.parse_failure(method, path, &e, on_error))
            })
            .transpose()
    }
}

fn item_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

/// `{key: body}` without an intermediate struct per resource.
fn wrap<'a, B: Serialize>(key: &'a str, body: &'a B) -> Envelope<'a, B> {
    Envelope { key, body }
}

struct Envelope<'a, B> {
    key: &'a str,
    body: &'a B,
}

impl<B: Serialize> Serialize for Envelope<'_, B> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, self.body)?;
        map.end()
    }
}

fn take_field(reply: Value, key: &str) -> Option<Value> {
    match reply {
        Value::Object(mut map) => remove_non_null(&mut map, key),
        _ => None,
    }
}

fn remove_non_null(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}
