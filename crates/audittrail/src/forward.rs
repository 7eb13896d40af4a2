//! Forwarding signed transactions to the remote ledger.
//!
//! The forwarder is the last step of a submission. It either reports that
//! the remote accepted the transaction or returns an error; the proxy decides
//! what to roll back.

use std::time::Duration;

use async_trait::async_trait;
use audittrail_core::Hash256;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{ProxyError, Result};

/// Header carrying the reserved sequence nonce.
pub const NONCE_HEADER: &str = "X-Audit-Nonce";

/// A signed transaction ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Sequence nonce reserved for this submission.
    pub nonce: u64,
    /// Identifier of the transaction in `body`.
    pub transaction_id: Hash256,
    /// Canonical JSON of the signed transaction.
    pub body: Bytes,
}

/// Delivers submissions to the remote ledger.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Send one submission. `Ok` means the remote durably accepted it.
    async fn forward(&self, submission: &Submission) -> Result<()>;
}

/// Forwards over HTTP: `POST <serverUrl>send`, success is exactly 201.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    url: String,
}

impl HttpForwarder {
    /// Create a forwarder posting to `url` with the given request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Forwarding {
                status: None,
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, submission: &Submission) -> Result<()> {
        debug!(
            url = %self.url,
            nonce = submission.nonce,
            tx_id = %submission.transaction_id,
            "forwarding transaction"
        );

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(NONCE_HEADER, submission.nonce.to_string())
            .body(submission.body.clone())
            .send()
            .await
            .map_err(|e| ProxyError::Forwarding {
                status: e.status().map(|s| s.as_u16()),
                message: format!("error calling server: {}", e),
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(ProxyError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

/// In-process forwarder for tests and dry runs.
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// Records every submission and answers with a configurable status.
    #[derive(Debug)]
    pub struct MemoryForwarder {
        status: Mutex<u16>,
        received: Mutex<Vec<Submission>>,
    }

    impl MemoryForwarder {
        /// A forwarder that accepts everything.
        pub fn accepting() -> Self {
            Self::with_status(201)
        }

        /// A forwarder that answers every request with `status`.
        pub fn with_status(status: u16) -> Self {
            Self {
                status: Mutex::new(status),
                received: Mutex::new(Vec::new()),
            }
        }

        /// Change the status returned from now on.
        pub fn set_status(&self, status: u16) {
            if let Ok(mut current) = self.status.lock() {
                *current = status;
            }
        }

        /// Submissions received so far, accepted or not.
        pub fn received(&self) -> Vec<Submission> {
            self.received
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Forwarder for MemoryForwarder {
        async fn forward(&self, submission: &Submission) -> Result<()> {
            let status = *self.status.lock().map_err(|e| ProxyError::Forwarding {
                status: None,
                message: e.to_string(),
            })?;
            if let Ok(mut received) = self.received.lock() {
                received.push(submission.clone());
            }

            if status == 201 {
                Ok(())
            } else {
                Err(ProxyError::Rejected {
                    status,
                    reason: StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("")
                        .to_string(),
                })
            }
        }
    }
}
