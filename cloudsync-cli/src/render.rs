//! 文本输出

use std::fmt::Write;

use cloudsync_client::{SystemLog, Task, TaskLog, User};
use cloudsync_core::views::{Field, SetSummary, SetsView, StoreSummary, StoresView, TasksView};
use serde_json::{Map, Value};

const NONE: &str = "  (none)\n";

pub fn tasks(view: &TasksView) -> String {
    let mut out = String::new();
    section(&mut out, "Active Tasks", &view.active, task_line);
    section(&mut out, "Idle Tasks", &view.idle, task_line);
    section(&mut out, "Completed Tasks", &view.completed, task_log_line);
    out
}

pub fn sets(view: &SetsView) -> String {
    let mut out = String::new();
    section(&mut out, "PID Pattern Sets", &view.pid_patterns, set_block);
    section(&mut out, "PID List Sets", &view.pid_lists, set_block);
    section(&mut out, "Query Sets", &view.queries, set_block);
    out
}

pub fn stores(view: &StoresView) -> String {
    let mut out = String::new();
    section(&mut out, "DuraCloud Stores", &view.duracloud, store_block);
    section(&mut out, "Fedora Stores", &view.fedora, store_block);
    out
}

pub fn user(user: &User) -> String {
    format!("Logged in as {}\n", user.name)
}

pub fn system_logs(logs: &[SystemLog]) -> String {
    let mut out = String::new();
    section(&mut out, "System Logs", logs, |log| {
        format!("  [{}] {}\n", id(log.id.as_ref()), attributes(&log.attributes))
    });
    out
}

pub fn task_logs(logs: &[TaskLog]) -> String {
    let mut out = String::new();
    section(&mut out, "Task Logs", logs, task_log_line);
    out
}

pub fn objects(objects: &[Value]) -> String {
    if objects.is_empty() {
        return NONE.to_string();
    }
    objects.iter().map(|o| format!("  {o}\n")).collect()
}

// ===== 辅助函数 =====

fn section<T>(out: &mut String, title: &str, items: &[T], line: impl Fn(&T) -> String) {
    let _ = writeln!(out, "{title}");
    if items.is_empty() {
        out.push_str(NONE);
    }
    for item in items {
        out.push_str(&line(item));
    }
}

fn task_line(task: &Task) -> String {
    format!(
        "  [{}] {} ({})\n",
        id(task.id.as_ref()),
        task.name,
        task.state.as_deref().unwrap_or("idle")
    )
}

fn task_log_line(log: &TaskLog) -> String {
    format!(
        "  [{}] task {} {}\n",
        id(log.id.as_ref()),
        id(log.task_id.as_ref()),
        attributes(&log.attributes)
    )
}

fn set_block(set: &SetSummary) -> String {
    let mut out = format!("  [{}] {}", id(set.id.as_ref()), set.name);
    if !set.deletable {
        out.push_str(" (built-in)");
    }
    out.push('\n');
    fields(&mut out, &set.fields);
    out
}

fn store_block(store: &StoreSummary) -> String {
    let mut out = format!("  [{}] {}\n", id(store.id.as_ref()), store.name);
    fields(&mut out, &store.fields);
    out
}

fn fields(out: &mut String, fields: &[Field]) {
    for field in fields {
        let _ = writeln!(out, "      {}: {}", field.label, field.value);
    }
}

fn id(id: Option<&String>) -> &str {
    id.map_or("-", String::as_str)
}

fn attributes(map: &Map<String, Value>) -> String {
    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
