//! Scripted transport and clock fixtures shared by gateway and provider tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::gateway::clock::ManualClock;
use crate::gateway::provider::ProviderConfig;
use crate::gateway::transport::{
    HttpTransport, RequestDescriptor, TransportError, TransportResponse,
};
use crate::gateway::Gateway;

#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, String),
    Fail,
    Hang,
}

/// Answers requests by the first registered URL fragment they contain.
/// Unmatched requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, Scripted)>>,
    requests: Mutex<Vec<RequestDescriptor>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, fragment: &str, status: u16, body: impl Into<String>) -> Self {
        self.set(fragment, Scripted::Respond(status, body.into()));
        self
    }

    pub fn fail_on(self, fragment: &str) -> Self {
        self.set(fragment, Scripted::Fail);
        self
    }

    pub fn hang_on(self, fragment: &str) -> Self {
        self.set(fragment, Scripted::Hang);
        self
    }

    /// Replaces (or registers) the script for `fragment`.
    pub fn set(&self, fragment: &str, script: Scripted) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|(f, _)| f == fragment) {
            Some(route) => route.1 = script,
            None => routes.push((fragment.to_string(), script)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RequestDescriptor> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let script = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| request.url.as_str().contains(fragment.as_str()))
            .map(|(_, script)| script.clone());

        match script {
            Some(Scripted::Respond(status, body)) => Ok(TransportResponse { status, body }),
            Some(Scripted::Fail) => Err(TransportError::Connect("dns lookup failed".into())),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Timeout)
            }
            None => Ok(TransportResponse {
                status: 404,
                body: "{}".into(),
            }),
        }
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ))
}

/// A gateway with key `test-key`, a manual clock, and the default deadline.
pub fn test_gateway(
    provider: ProviderConfig,
    transport: Arc<ScriptedTransport>,
) -> (Gateway, Arc<ManualClock>) {
    let clock = manual_clock();
    let gateway = Gateway::new(
        provider,
        Some("test-key".to_string()),
        transport,
        clock.clone(),
        crate::gateway::transport::DEFAULT_TIMEOUT,
    );
    (gateway, clock)
}
