//! Upstream credential probing.
//!
//! A key is considered valid when the provider accepts a minimal
//! `generateMessage` call made with it. Every failure (transport, auth,
//! quota, malformed request) collapses into the same `Err`.

use crate::io_struct::{GenerateMessageRequest, PROBE_MODEL};
use futures::future::BoxFuture;

pub trait CredentialValidator: Send + Sync {
    fn validate<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;
}

#[derive(Debug, Clone)]
pub struct PalmValidator {
    client: reqwest::Client,
    base_url: String,
}

impl PalmValidator {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        PalmValidator {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn probe_url(&self) -> String {
        format!(
            "{}/v1beta2/{}:generateMessage",
            self.base_url.trim_end_matches('/'),
            PROBE_MODEL
        )
    }
}

impl CredentialValidator for PalmValidator {
    fn validate<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(self.probe_url())
                .query(&[("key", key)])
                .json(&GenerateMessageRequest::probe())
                .send()
                .await?;
            resp.error_for_status()?;
            Ok(())
        })
    }
}
