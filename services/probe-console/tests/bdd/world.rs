//! BDD test world for probe-console

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cucumber::World;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use probe_console::api::HttpMonitorApi;
use probe_console::io::{HttpClient, HttpResponse};
use probe_console::{ConsoleError, Dashboard};

pub const BASE_URL: &str = "http://monitor.test";

/// One request seen by the scripted client: method, path and JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// An HTTP client answering from a table of canned responses keyed by
/// `"METHOD /path"`; unknown routes answer 404
///
/// A route can be held back behind a gate until the scenario releases it.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    routes: StdMutex<HashMap<String, Result<HttpResponse, String>>>,
    gates: StdMutex<HashMap<String, Arc<Notify>>>,
    requests: StdMutex<Vec<RecordedRequest>>,
}

impl ScriptedHttpClient {
    pub fn respond(&self, route: &str, status: u16, body: impl Into<String>) {
        self.routes.lock().unwrap().insert(
            route.to_string(),
            Ok(HttpResponse {
                status,
                body: body.into(),
            }),
        );
    }

    pub fn fail(&self, route: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(route.to_string(), Err(message.to_string()));
    }

    pub fn hold(&self, route: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(route.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, route: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(route) {
            gate.notify_one();
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, route: &str) -> bool {
        self.requests()
            .iter()
            .any(|r| format!("{} {}", r.method, r.path) == route)
    }

    async fn answer(
        &self,
        method: &str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> probe_console::Result<HttpResponse> {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        let route = format!("{} {}", method, path);
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            path,
            body,
        });

        let gate = self.gates.lock().unwrap().get(&route).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.routes.lock().unwrap().get(&route) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(ConsoleError::Http(message.clone())),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> probe_console::Result<HttpResponse> {
        self.answer("GET", url, None).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> probe_console::Result<HttpResponse> {
        self.answer("POST", url, Some(body.clone())).await
    }
}

#[derive(Debug, Default, World)]
pub struct ConsoleWorld {
    // Listing payloads served by the scripted API
    pub probes: Vec<serde_json::Value>,
    pub stories: Vec<serde_json::Value>,

    pub http: Option<Arc<ScriptedHttpClient>>,
    pub dashboard: Option<Arc<Dashboard>>,
    pub last_result: Option<probe_console::Result<()>>,
    pub last_flag: Option<bool>,
    pub pending: Option<JoinHandle<probe_console::Result<()>>>,
}

impl ConsoleWorld {
    pub fn http(&mut self) -> Arc<ScriptedHttpClient> {
        Arc::clone(
            self.http
                .get_or_insert_with(|| Arc::new(ScriptedHttpClient::default())),
        )
    }

    /// The dashboard under test, wired to the scripted client on first use
    pub fn dashboard(&mut self) -> Arc<Dashboard> {
        if self.dashboard.is_none() {
            let http: Arc<dyn HttpClient> = self.http();
            let api = HttpMonitorApi::new(BASE_URL, http).expect("valid base url");
            self.dashboard = Some(Arc::new(Dashboard::new(Arc::new(api))));
        }
        Arc::clone(self.dashboard.as_ref().unwrap())
    }
}
