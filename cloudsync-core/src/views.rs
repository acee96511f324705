//! 控制台视图
//!
//! Each view is rebuilt from a fresh fetch; nothing here is cached between
//! refreshes.

use cloudsync_client::{
    ObjectSet, ObjectStore, SetKind, SetPayload, StoreKind, StorePayload, Task, TaskLog,
};
use serde::Serialize;

/// Shown instead of any stored password.
pub const PASSWORD_MASK: &str = "(Not shown)";

/// Shown for an empty content id prefix.
pub const NO_PREFIX: &str = "(None)";

/// Console tabs that load data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tab {
    Tasks,
    ObjectSets,
    ObjectStores,
}

/// One labelled value in a summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

// ===== Tasks =====

/// Tasks split by the state the service reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TasksView {
    pub active: Vec<Task>,
    pub idle: Vec<Task>,
    /// Logs of finished runs
    pub completed: Vec<TaskLog>,
}

impl TasksView {
    pub fn new(tasks: Vec<Task>, completed: Vec<TaskLog>) -> Self {
        let (active, idle) = tasks.into_iter().partition(Task::is_active);
        Self {
            active,
            idle,
            completed,
        }
    }
}

// ===== Object sets =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSummary {
    pub id: Option<String>,
    pub name: String,
    pub kind: SetKind,
    pub fields: Vec<Field>,
    /// `false` only for the built-in set
    pub deletable: bool,
}

impl SetSummary {
    pub fn new(set: &ObjectSet) -> Self {
        let fields = match set.payload() {
            Ok(SetPayload::PidPattern(pattern)) => vec![Field::new("Pattern", pattern)],
            Ok(SetPayload::PidList(pids)) => vec![Field::new("PIDs", pids)],
            Ok(SetPayload::Query(query)) => vec![
                Field::new("Query Language", query.query_type),
                Field::new("Query Text", query.query_text),
            ],
            Err(e) => {
                log::warn!("Object set {:?} has an unreadable payload: {e}", set.id);
                vec![Field::new("Data", set.data.clone())]
            }
        };

        Self {
            id: set.id.clone(),
            name: set.name.clone(),
            kind: set.kind,
            fields,
            deletable: !set.is_default(),
        }
    }
}

/// Object sets grouped by kind, in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetsView {
    pub pid_patterns: Vec<SetSummary>,
    pub pid_lists: Vec<SetSummary>,
    pub queries: Vec<SetSummary>,
}

impl SetsView {
    pub fn new(sets: &[ObjectSet]) -> Self {
        let mut view = Self::default();
        for set in sets {
            let group = match set.kind {
                SetKind::PidPattern => &mut view.pid_patterns,
                SetKind::PidList => &mut view.pid_lists,
                SetKind::Query => &mut view.queries,
                SetKind::Other => {
                    log::debug!("Skipping object set of unknown type: {}", set.name);
                    continue;
                }
            };
            group.push(SetSummary::new(set));
        }
        view
    }
}

// ===== Object stores =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub id: Option<String>,
    pub name: String,
    pub kind: StoreKind,
    pub fields: Vec<Field>,
}

impl StoreSummary {
    pub fn new(store: &ObjectStore) -> Self {
        let fields = match store.payload() {
            Ok(StorePayload::DuraCloud(p)) => {
                let prefix = if p.prefix.is_empty() {
                    NO_PREFIX.to_string()
                } else {
                    p.prefix
                };
                vec![
                    Field::new("DuraStore URL", p.url),
                    Field::new("Username", p.username),
                    Field::new("Password", PASSWORD_MASK),
                    Field::new("Storage Provider", p.provider_name),
                    Field::new("Space", p.space),
                    Field::new("Content Id Prefix", prefix),
                ]
            }
            Ok(StorePayload::Fedora(p)) => vec![
                Field::new("Base URL", p.url),
                Field::new("Username", p.username),
                Field::new("Password", PASSWORD_MASK),
            ],
            // data 可能含有密码，不直接展示
            Err(e) => {
                log::warn!("Object store {:?} has an unreadable payload: {e}", store.id);
                Vec::new()
            }
        };

        Self {
            id: store.id.clone(),
            name: store.name.clone(),
            kind: store.kind,
            fields,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoresView {
    pub duracloud: Vec<StoreSummary>,
    pub fedora: Vec<StoreSummary>,
}

impl StoresView {
    pub fn new(stores: &[ObjectStore]) -> Self {
        let mut view = Self::default();
        for store in stores {
            match store.kind {
                StoreKind::DuraCloud => view.duracloud.push(StoreSummary::new(store)),
                StoreKind::Fedora => view.fedora.push(StoreSummary::new(store)),
                StoreKind::Other => {
                    log::debug!("Skipping object store of unknown type: {}", store.name);
                }
            }
        }
        view
    }
}

/// Data of one freshly loaded tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tab", content = "data", rename_all = "camelCase")]
pub enum TabView {
    Tasks(TasksView),
    ObjectSets(SetsView),
    ObjectStores(StoresView),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsync_client::{DuraCloudPayload, FedoraPayload, QueryPayload};
    use serde_json::json;

    fn task(id: u32, state: &str) -> Task {
        serde_json::from_value(json!({"id": id, "name": format!("t{id}"), "state": state})).unwrap()
    }

    #[test]
    fn tasks_partition_by_reported_state() {
        let view = TasksView::new(
            vec![task(1, "running"), task(2, "idle"), task(3, "pausing")],
            Vec::new(),
        );
        let ids = |tasks: &[Task]| tasks.iter().filter_map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&view.active), ["1", "3"]);
        assert_eq!(ids(&view.idle), ["2"]);
    }

    #[test]
    fn default_set_is_not_deletable() {
        let mut all = ObjectSet::new("All Objects", &SetPayload::PidPattern("*".into())).unwrap();
        all.id = Some("1".into());
        let mut demo = ObjectSet::new("Demo", &SetPayload::PidPattern("demo:*".into())).unwrap();
        demo.id = Some("2".into());
        let mut query = ObjectSet::new(
            "Q",
            &SetPayload::Query(QueryPayload {
                query_type: "sparql".into(),
                query_text: "select ?s".into(),
            }),
        )
        .unwrap();
        query.id = Some("3".into());

        let view = SetsView::new(&[all, demo, query]);
        assert_eq!(view.pid_patterns.len(), 2);
        assert!(!view.pid_patterns[0].deletable);
        assert!(view.pid_patterns[1].deletable);
        assert_eq!(view.queries[0].fields[0], Field::new("Query Language", "sparql"));
        assert!(view.pid_lists.is_empty());
    }

    #[test]
    fn store_summary_masks_password_and_empty_prefix() {
        let dc = ObjectStore::new(
            "dc",
            &StorePayload::DuraCloud(DuraCloudPayload {
                url: "https://dc/durastore".into(),
                username: "u".into(),
                password: "hunter2".into(),
                provider_id: "0".into(),
                provider_name: "Amazon S3".into(),
                space: "docs".into(),
                prefix: String::new(),
            }),
        )
        .unwrap();
        let fc = ObjectStore::new(
            "fc",
            &StorePayload::Fedora(FedoraPayload {
                url: "http://fc/fedora".into(),
                username: "fedoraAdmin".into(),
                password: "hunter2".into(),
            }),
        )
        .unwrap();

        let view = StoresView::new(&[dc, fc]);
        let dc = &view.duracloud[0];
        assert!(dc.fields.contains(&Field::new("Password", PASSWORD_MASK)));
        assert!(dc.fields.contains(&Field::new("Content Id Prefix", NO_PREFIX)));
        assert!(dc.fields.iter().all(|f| f.value != "hunter2"));
        assert_eq!(view.fedora[0].fields[0], Field::new("Base URL", "http://fc/fedora"));
    }
}
