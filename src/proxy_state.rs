use crate::validator::PalmValidator;
use actix_web::HttpResponse;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Method, StatusCode};
use std::pin::Pin;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub enum ProxyResponseBody {
    Full(Bytes),
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, actix_web::Error>> + Send>>),
}

pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: ProxyResponseBody,
}

impl From<ProxyResponse> for Result<HttpResponse, actix_web::Error> {
    fn from(resp: ProxyResponse) -> Self {
        let status = actix_web::http::StatusCode::from_u16(resp.status.as_u16()).map_err(|e| {
            actix_web::error::ErrorBadGateway(format!("Invalid status code: {}", e))
        })?;
        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = resp.content_type {
            builder.content_type(content_type);
        }
        match resp.body {
            ProxyResponseBody::Full(body) => Ok(builder.body(body)),
            ProxyResponseBody::Stream(body) => Ok(builder.streaming(body)),
        }
    }
}

/// Process-wide, read-only configuration snapshot.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub palm_api_key: Option<String>,
    pub base_url: String,
    pub timeout: u64,
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            palm_api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: 600,
            log_level: "info".to_string(),
        }
    }
}

impl ProxyConfig {
    /// The operator-supplied key, if one is set and non-blank.
    pub fn fallback_key(&self) -> Option<&str> {
        self.palm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn upstream_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub client: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn validator(&self) -> PalmValidator {
        PalmValidator::new(self.client.clone(), self.config.base_url.clone())
    }

    /// Relay one request to the upstream API, attaching `key` as a query
    /// parameter when it is non-empty.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: &str,
        key: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<ProxyResponse, actix_web::Error> {
        let mut url = self.config.upstream_url(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        let mut request = self.client.request(method, url);
        if !key.is_empty() {
            request = request.query(&[("key", key)]);
        }
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        let resp = request
            .body(body)
            .send()
            .await
            .map_err(actix_web::error::ErrorBadGateway)?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let stream = content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = if stream {
            let resp_stream = resp
                .bytes_stream()
                .map(|r| r.map_err(actix_web::error::ErrorBadGateway));
            ProxyResponseBody::Stream(Box::pin(resp_stream))
        } else {
            let body = resp
                .bytes()
                .await
                .map_err(actix_web::error::ErrorBadGateway)?;
            ProxyResponseBody::Full(body)
        };
        Ok(ProxyResponse {
            status,
            content_type,
            body,
        })
    }
}
