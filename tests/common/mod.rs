//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use prerender_gateway::config::GatewayConfig;
use prerender_gateway::lifecycle::Shutdown;
use prerender_gateway::HttpServer;

/// A canned response from a mock upstream.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            headers.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        let status = StatusCode::from_u16(self.status).unwrap();
        (status, headers, self.body).into_response()
    }
}

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub uri: String,
    pub headers: HeaderMap,
}

/// Requests recorded by a mock upstream, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<SeenRequest>>>);

impl Recorder {
    pub fn all(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// Every request is recorded, then answered by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let recorder = Recorder::default();
    let f = Arc::new(f);

    let handler = {
        let f = f.clone();
        move |State(recorder): State<Recorder>, request: Request<Body>| {
            let f = f.clone();
            async move {
                recorder.0.lock().unwrap().push(SeenRequest {
                    uri: request.uri().to_string(),
                    headers: request.headers().clone(),
                });
                f().await
            }
        }
    };

    let app = Router::new().fallback(handler).with_state(recorder.clone());
    let addr = serve(app).await;
    (addr, recorder)
}

/// Start a mock upstream that always answers with the same response.
pub async fn start_mock_backend(response: MockResponse) -> (SocketAddr, Recorder) {
    start_programmable_backend(move || {
        let response = response.clone();
        async move { response }
    })
    .await
}

/// Serve a router on an ephemeral port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Gateway configuration pointing at local mocks, with fast retries.
pub fn gateway_config(origin: SocketAddr, service: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.origin.url = format!("http://{}", origin);
    config.prerender.service_url = format!("http://{}", service);
    config.prerender.timeout_secs = 5;
    config.fallback.base_delay_ms = 10;
    config.fallback.max_delay_ms = 50;
    config
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
