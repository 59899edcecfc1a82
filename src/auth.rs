//! Request authentication for the chat-proxy routes.
//!
//! Picks the effective credential (caller's PaLM key or the operator's
//! fallback key), probes caller-supplied keys against the upstream, and
//! produces a pass/fail [`AuthDecision`]. A request without any credential
//! is let through; the upstream is left to reject it.

use crate::io_struct::AuthResult;
use crate::proxy_state::ProxyConfig;
use crate::validator::CredentialValidator;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use std::sync::Arc;

pub const PALM_KEY_PREFIX: &str = "AIza";
pub const INVALID_KEY_MESSAGE: &str = "invalid PaLM api key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Rejected { message: String },
}

impl AuthDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthDecision::Allowed)
    }

    pub fn to_result(&self) -> AuthResult {
        match self {
            AuthDecision::Allowed => AuthResult {
                error: false,
                msg: None,
            },
            AuthDecision::Rejected { message } => AuthResult {
                error: true,
                msg: Some(message.clone()),
            },
        }
    }
}

/// Strip every `"Bearer "` occurrence and surrounding whitespace.
pub fn bearer_token(auth_header: &str) -> String {
    auth_header.trim().replace("Bearer ", "").trim().to_string()
}

/// Extract a PaLM key from an `Authorization` value. Anything that does not
/// look like a PaLM key is treated as no key at all.
pub fn parse_api_key(auth_header: &str) -> String {
    let token = bearer_token(auth_header);
    if token.starts_with(PALM_KEY_PREFIX) {
        token
    } else {
        String::new()
    }
}

/// Best-effort client address, for logging only.
pub fn client_ip(headers: &HeaderMap, peer_addr: Option<&str>) -> String {
    if let Some(ip) = peer_addr.filter(|ip| !ip.is_empty()) {
        return ip.to_string();
    }
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };
    if let Some(ip) = header_str("x-real-ip") {
        return ip.to_string();
    }
    header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_default()
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

#[derive(Clone)]
pub struct Authenticator {
    config: Arc<ProxyConfig>,
    validator: Arc<dyn CredentialValidator>,
}

impl Authenticator {
    pub fn new(config: Arc<ProxyConfig>, validator: Arc<dyn CredentialValidator>) -> Self {
        Self { config, validator }
    }

    /// Decide whether a request may proceed. May rewrite `Authorization`
    /// in place with the fallback key.
    pub async fn authenticate(
        &self,
        headers: &mut HeaderMap,
        peer_addr: Option<&str>,
    ) -> AuthDecision {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let token = parse_api_key(auth_header);

        log::info!("[Auth] got PaLM api key: {}", mask_key(&token));
        log::info!("[User IP] {}", client_ip(headers, peer_addr));
        log::info!("[Time] {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

        if token.is_empty() {
            match self.config.fallback_key() {
                Some(api_key) => match HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                    Ok(value) => {
                        log::info!("[Auth] use system api key");
                        headers.insert(header::AUTHORIZATION, value);
                    }
                    Err(e) => {
                        log::error!("[Auth] system api key is not a valid header value: {}", e);
                    }
                },
                None => log::info!("[Auth] admin did not provide an api key"),
            }
            return AuthDecision::Allowed;
        }

        log::info!("[Auth] use user api key");
        match self.validator.validate(&token).await {
            Ok(()) => {
                log::info!("[Auth] PaLM API key is valid");
                AuthDecision::Allowed
            }
            Err(e) => {
                log::info!("[Auth] PaLM API key is invalid: {:#}", e);
                AuthDecision::Rejected {
                    message: INVALID_KEY_MESSAGE.to_string(),
                }
            }
        }
    }
}
