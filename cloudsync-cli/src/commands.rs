//! 子命令执行

use std::sync::Arc;

use anyhow::{Context, Result};
use cloudsync_client::{
    FailureHandler, GatewayError, HttpTransport, ObjectQuery, QueryPayload, RequestGateway,
    ResourceClient, SetPayload, StoreKind,
};
use cloudsync_core::{ConsoleSession, NewObjectSet, Tab, TabView};
use serde::Serialize;

use crate::cli::{Commands, LogKind, NewSetKind, NewStoreKind, SetCommands, StoreCommands};
use crate::config::ConsoleConfig;
use crate::prompt::{Prompter, onboard_store};
use crate::render;

/// Default failure handler: prints the notice for the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotice;

impl FailureHandler for StderrNotice {
    fn on_failure(&self, error: &GatewayError) {
        if error.is_expected() {
            log::warn!("{error}");
        } else {
            log::error!("{error}");
        }
        eprintln!("{}", error.notice());
    }
}

/// Output mode for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

impl Output {
    fn print<T: Serialize>(self, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
        match self {
            Self::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Self::Text => print!("{}", text(value)),
        }
        Ok(())
    }
}

pub fn open_session(config: &ConsoleConfig) -> Result<ConsoleSession> {
    let transport = HttpTransport::new(config.auth.clone().map(Into::into));
    let gateway = RequestGateway::with_default_handler(
        &config.base_url,
        Arc::new(transport),
        Arc::new(StderrNotice),
    )
    .with_context(|| format!("Invalid base URL: {}", config.base_url))?;
    Ok(ConsoleSession::new(ResourceClient::new(gateway)))
}

pub async fn run(
    session: &mut ConsoleSession,
    command: Commands,
    config: &ConsoleConfig,
    output: Output,
) -> Result<()> {
    match command {
        Commands::Tasks => show(session, Tab::Tasks, output).await,
        Commands::Sets => show(session, Tab::ObjectSets, output).await,
        Commands::Stores => show(session, Tab::ObjectStores, output).await,
        Commands::Whoami => {
            let user = session.current_user().await?;
            output.print(&user, render::user)
        }
        Commands::Logs { kind, id } => logs(session.client(), kind, id.as_deref(), output).await,
        Commands::Set(command) => set(session, command, output).await,
        Commands::Store(command) => store(session, command, config, output).await,
    }
}

async fn show(session: &mut ConsoleSession, tab: Tab, output: Output) -> Result<()> {
    let Some(view) = session.show_tab(tab).await? else {
        return Ok(());
    };
    match &view {
        TabView::Tasks(tasks) => output.print(tasks, render::tasks),
        TabView::ObjectSets(sets) => output.print(sets, render::sets),
        TabView::ObjectStores(stores) => output.print(stores, render::stores),
    }
}

async fn logs(
    client: &ResourceClient,
    kind: LogKind,
    id: Option<&str>,
    output: Output,
) -> Result<()> {
    match (kind, id) {
        (LogKind::System, Some(id)) => print!("{}", client.get_system_log_content(id, None).await?),
        (LogKind::Task, Some(id)) => print!("{}", client.get_task_log_content(id, None).await?),
        (LogKind::System, None) => {
            let logs = client.list_system_logs(None).await?;
            output.print(&logs, |logs| render::system_logs(logs))?;
        }
        (LogKind::Task, None) => {
            let logs = client.list_task_logs(None).await?;
            output.print(&logs, |logs| render::task_logs(logs))?;
        }
    }
    Ok(())
}

async fn set(session: &ConsoleSession, command: SetCommands, output: Output) -> Result<()> {
    let view = match command {
        SetCommands::Add { kind } => session.create_object_set(new_set(kind)).await?,
        SetCommands::Delete { id } => session.delete_object_set(&id).await?,
    };
    output.print(&view, render::sets)
}

fn new_set(kind: NewSetKind) -> NewObjectSet {
    match kind {
        NewSetKind::Pattern { name, pattern } => NewObjectSet {
            name,
            payload: SetPayload::PidPattern(pattern),
        },
        NewSetKind::List { name, pids } => NewObjectSet {
            name,
            payload: SetPayload::PidList(pids.join("\n")),
        },
        NewSetKind::Query {
            name,
            language,
            text,
        } => NewObjectSet {
            name,
            payload: SetPayload::Query(QueryPayload {
                query_type: language,
                query_text: text,
            }),
        },
    }
}

async fn store(
    session: &mut ConsoleSession,
    command: StoreCommands,
    config: &ConsoleConfig,
    output: Output,
) -> Result<()> {
    match command {
        StoreCommands::Add { kind } => {
            let kind = match kind {
                NewStoreKind::Duracloud => StoreKind::DuraCloud,
                NewStoreKind::Fedora => StoreKind::Fedora,
            };
            let mut prompter =
                Prompter::new(tokio::io::BufReader::new(tokio::io::stdin())).masking_on_terminal();
            if let Some(view) = onboard_store(session, kind, &mut prompter).await? {
                output.print(&view, render::stores)?;
            }
            Ok(())
        }
        StoreCommands::Forget { id } => {
            let view = session.forget_object_store(&id).await?;
            output.print(&view, render::stores)
        }
        StoreCommands::Objects {
            id,
            set,
            limit,
            offset,
        } => {
            let query = ObjectQuery::new(set, limit.unwrap_or(config.query_limit), offset);
            let objects = session.query_store_objects(&id, &query).await?;
            output.print(&objects, |objects| render::objects(objects))
        }
    }
}
