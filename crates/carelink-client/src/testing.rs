//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use carelink_auth::{MemoryVault, SessionConfig, SessionManager, StaticGate};
use carelink_core::{HttpRequest, HttpResponse, Transport, TransportError};
use parking_lot::Mutex;
use tokio::sync::Notify;

struct Scripted {
    result: Result<HttpResponse, TransportError>,
    hold: Option<Arc<Notify>>,
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_raw(&self, status: u16, body: Vec<u8>) {
        self.push(Ok(HttpResponse::new(status, body)), None);
    }

    pub(crate) fn push_json(&self, status: u16, value: serde_json::Value) {
        self.push_raw(status, value.to_string().into_bytes());
    }

    pub(crate) fn push_error(&self, err: TransportError) {
        self.push(Err(err), None);
    }

    /// Queue a response that is only delivered once the returned handle is
    /// notified.
    pub(crate) fn push_held_json(&self, status: u16, value: serde_json::Value) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        let response = HttpResponse::new(status, value.to_string().into_bytes());
        self.push(Ok(response), Some(hold.clone()));
        hold
    }

    fn push(&self, result: Result<HttpResponse, TransportError>, hold: Option<Arc<Notify>>) {
        self.responses.lock().push_back(Scripted { result, hold });
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        let scripted = self.responses.lock().pop_front();
        let Some(scripted) = scripted else {
            return Err(TransportError::Connect("no scripted response".into()));
        };
        if let Some(hold) = scripted.hold {
            hold.notified().await;
        }
        scripted.result
    }
}

pub(crate) fn session_with(transport: Arc<MockTransport>) -> Arc<SessionManager> {
    session_and_vault(transport).0
}

/// Session manager plus the vault it mirrors into.
pub(crate) fn session_and_vault(
    transport: Arc<MockTransport>,
) -> (Arc<SessionManager>, Arc<MemoryVault>) {
    let vault = Arc::new(MemoryVault::new());
    let session = Arc::new(SessionManager::new(
        vault.clone(),
        transport,
        Arc::new(StaticGate::allow()),
        SessionConfig::default(),
    ));
    (session, vault)
}

/// Query parameter value of a recorded request.
pub(crate) fn query_value<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
