//! # cloudsync-client
//!
//! Typed client for the CloudSync REST API: the request gateway every call
//! goes through, and a catalog of resource operations on top of it.
//!
//! ## Resources
//!
//! | Collection | Item key | Operations |
//! |------------|----------|------------|
//! | `configuration` | `configuration` | get, update |
//! | `users` | `user` | create, list, get, get current, update, delete |
//! | `tasks` | `task` | create, list, get, update, delete |
//! | `objectsets` | `objectset` | create, list, get, update, delete |
//! | `objectstores` | `objectstore` | create, list, get, query objects, update, delete |
//! | `systemlogs` | `systemlog` | list, get, get content, delete |
//! | `tasklogs` | `tasklog` | list, get, get content, delete |
//! | `duracloud/provideraccounts` | `provideraccounts` | list (credential validation) |
//! | `duracloud/spaces` | `spaces` | list |
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)*: use rustls for HTTPS.
//! - **`native-tls`**: use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cloudsync_client::{HttpTransport, RequestGateway, ResourceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = RequestGateway::new(
//!         "http://localhost:8080/cloudsync/api/rest/",
//!         Arc::new(HttpTransport::default()),
//!     )?;
//!     let client = ResourceClient::new(gateway);
//!
//!     for task in client.list_tasks(None).await? {
//!         println!("{} active={}", task.name, task.is_active());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, GatewayError>`](GatewayError). Before the
//! error reaches the caller it is handed to exactly one [`FailureHandler`]: the
//! one passed to the call, or the gateway's default when the call passed `None`.

mod client;
mod error;
mod http_client;
mod types;
mod utils;

pub use client::ResourceClient;

pub use error::{ClientError, GatewayError, HttpMethod, Result};

pub use http_client::{
    BasicAuth, FailureHandler, GatewayRequest, HttpTransport, LogNoticeHandler, OnError,
    RawResponse, RequestGateway, ResponseKind, Transport, TransportFailure,
};

pub use types::{
    Configuration, Credential, DEFAULT_OBJECT_SET_ID, DuraCloudPayload, FedoraPayload, ObjectQuery,
    ObjectSet, ObjectStore, ProviderAccount, QueryPayload, SetKind, SetPayload, Space, SpaceQuery,
    StoreKind, StorePayload, SystemLog, Task, TaskLog, User,
};

pub use utils::log_sanitizer;
