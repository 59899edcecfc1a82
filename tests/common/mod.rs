//! Mock collaborators for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use futures::future::BoxFuture;
use palm_proxy::validator::CredentialValidator;
use serde_json::json;

/// Validator with a fixed outcome that remembers every key it was asked about.
pub struct MockValidator {
    accept: bool,
    seen: Mutex<Vec<String>>,
}

impl MockValidator {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            accept: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            accept: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl CredentialValidator for MockValidator {
    fn validate<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        self.seen.lock().unwrap().push(key.to_string());
        let result: anyhow::Result<()> = if self.accept {
            Ok(())
        } else {
            Err(anyhow::anyhow!("API key not valid"))
        };
        Box::pin(async move { result })
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub key: Option<String>,
    pub body: serde_json::Value,
}

struct MockUpstreamState {
    valid_keys: Vec<String>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// In-process stand-in for the Generative Language API.
pub struct MockUpstream {
    addr: SocketAddr,
    handle: ServerHandle,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockUpstream {
    pub async fn start(valid_keys: &[&str]) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(MockUpstreamState {
            valid_keys: valid_keys.iter().map(|k| k.to_string()).collect(),
            calls: calls.clone(),
        });

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::to(mock_generative_api))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            addr,
            handle,
            calls,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

async fn mock_generative_api(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<MockUpstreamState>,
) -> HttpResponse {
    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default();
    let key = query.get("key").cloned();
    state.calls.lock().unwrap().push(RecordedCall {
        method: req.method().to_string(),
        path: req.path().to_string(),
        key: key.clone(),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let authorized = key.is_some_and(|k| state.valid_keys.contains(&k));
    if !authorized {
        return HttpResponse::BadRequest().json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }));
    }

    if query.get("alt").map(String::as_str) == Some("sse") {
        return HttpResponse::Ok()
            .content_type("text/event-stream")
            .body("data: {\"candidates\":[{\"content\":\"Hi\"}]}\n\n");
    }

    HttpResponse::Ok().json(json!({
        "candidates": [{ "author": "1", "content": "Hi there" }],
        "messages": [{ "author": "0", "content": "Hello" }]
    }))
}
