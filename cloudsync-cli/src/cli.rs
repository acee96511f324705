//! 命令行定义

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cloudsync",
    version,
    about = "Admin console for a CloudSync service",
    long_about = "Inspect tasks, object sets and object stores of a CloudSync service, \
                  and register new DuraCloud or Fedora object stores"
)]
pub struct Cli {
    /// Configuration file (default: <config dir>/cloudsync-console/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the CloudSync REST API
    #[arg(long, global = true, env = "CLOUDSYNC_BASE_URL")]
    pub base_url: Option<String>,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "CLOUDSYNC_LOG")]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Active and idle tasks, plus completed runs
    Tasks,
    /// Object sets grouped by type
    Sets,
    /// Registered object stores
    Stores,
    /// The logged-in user
    Whoami,
    /// List logs, or print one log's content
    Logs {
        #[arg(value_enum)]
        kind: LogKind,

        /// Print the content of this log instead of listing
        #[arg(long)]
        id: Option<String>,
    },
    /// Manage object sets
    #[command(subcommand)]
    Set(SetCommands),
    /// Manage object stores
    #[command(subcommand)]
    Store(StoreCommands),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    System,
    Task,
}

#[derive(Subcommand, Debug)]
pub enum SetCommands {
    /// Create an object set
    Add {
        #[command(subcommand)]
        kind: NewSetKind,
    },
    /// Delete an object set (the built-in set 1 is refused)
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum NewSetKind {
    /// Objects whose PID matches a pattern
    Pattern { name: String, pattern: String },
    /// An explicit list of PIDs
    List {
        name: String,
        /// PIDs, one per argument
        #[arg(required = true)]
        pids: Vec<String>,
    },
    /// Objects returned by a repository query
    Query {
        name: String,
        /// Query language (e.g. sparql, itql)
        #[arg(long, default_value = "sparql")]
        language: String,
        text: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Register a store interactively
    Add {
        #[arg(value_enum)]
        kind: NewStoreKind,
    },
    /// Remove a store registration
    Forget { id: String },
    /// List objects a store holds
    Objects {
        id: String,

        /// Object set to filter by
        #[arg(long, default_value = "1")]
        set: String,

        /// Page size (default from config)
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewStoreKind {
    Duracloud,
    Fedora,
}
