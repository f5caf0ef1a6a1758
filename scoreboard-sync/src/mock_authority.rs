//! A stand-in authority for tests. Every path answers `200 {"status": "ok"}`
//! unless a test mounts its own response for it.

use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{any, path},
};

/// Lower priority than the wiremock default, so per-path responses win
const FALLBACK_PRIORITY: u8 = 10;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
}

pub struct MockAuthority {
    pub url: String,
    server: MockServer,
}

impl MockAuthority {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Self {
            url: server.uri(),
            server,
        }
    }

    /// A URL nothing is listening on
    pub async fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    }

    pub async fn respond(&self, route: &str, status: u16, body: &str) {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn requests(&self) -> Vec<Recorded> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| Recorded {
                method: request.method.to_string(),
                path: request.url.path().to_string(),
                body: serde_json::from_slice(&request.body).unwrap_or(Value::Null),
            })
            .collect()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.requests().await.into_iter().map(|r| r.path).collect()
    }

    pub async fn bodies_for(&self, route: &str) -> Vec<Value> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == route)
            .map(|r| r.body)
            .collect()
    }
}
