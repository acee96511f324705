//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cloudsync_client::{
    BasicAuth, FailureHandler, GatewayError, HttpTransport, RequestGateway, ResourceClient,
};
use httpmock::MockServer;

/// REST root as mounted by the service.
pub const API_ROOT: &str = "/cloudsync/api/rest";

/// Records every failure it is handed.
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<GatewayError>>,
}

impl RecordingHandler {
    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn notices(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(GatewayError::notice)
            .collect()
    }
}

impl FailureHandler for RecordingHandler {
    fn on_failure(&self, error: &GatewayError) {
        self.seen.lock().unwrap().push(error.clone());
    }
}

/// A mock service plus a client pointed at it.
pub struct TestContext {
    pub server: MockServer,
    pub client: ResourceClient,
    pub default_handler: Arc<RecordingHandler>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_auth(None)
    }

    pub fn with_auth(auth: Option<BasicAuth>) -> Self {
        let server = MockServer::start();
        let default_handler = Arc::new(RecordingHandler::default());
        let gateway = RequestGateway::with_default_handler(
            &format!("{}{API_ROOT}", server.base_url()),
            Arc::new(HttpTransport::new(auth)),
            Arc::clone(&default_handler) as Arc<dyn FailureHandler>,
        )
        .expect("mock server URL is valid");

        Self {
            server,
            client: ResourceClient::new(gateway),
            default_handler,
        }
    }

    pub fn path(resource: &str) -> String {
        format!("{API_ROOT}/{resource}")
    }
}
