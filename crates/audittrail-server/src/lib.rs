//! HTTP front end for the audit trail proxy.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/audit` | POST | 200 `{"recordHash", "transactionHash"}` or 500 plain text |
//! | `/audit` | other | 405 with `Allow: POST` |
//! | `/` | GET | HTML status page |

use std::sync::Arc;

use audittrail::{AuditProxy, Forwarder};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const HOME_PAGE: &str = "<html><head><title>Audit Trail Client</title></head><body><h1>It works!</h1><p>Audit Trail Client is active.</p></body></html>";

/// Successful `/audit` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub record_hash: String,
    pub transaction_hash: String,
}

/// Build the router around a shared proxy.
pub fn app<F: Forwarder + 'static>(proxy: Arc<AuditProxy<F>>) -> Router {
    Router::new()
        .route("/audit", post(audit::<F>).fallback(method_not_allowed))
        .route("/", get(home))
        .layer(TraceLayer::new_for_http())
        .with_state(proxy)
}

async fn audit<F: Forwarder + 'static>(
    State(proxy): State<Arc<AuditProxy<F>>>,
    body: Bytes,
) -> Response {
    info!(bytes = body.len(), "received audit record");
    // Runs to completion even if the client disconnects mid-forward.
    let submission = tokio::spawn(async move { proxy.submit_json(&body).await });
    let outcome = match submission.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "audit submission task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "submission task failed").into_response();
        }
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Json(AuditResponse {
                record_hash: result.record_hash_hex(),
                transaction_hash: result.transaction_hash(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "audit submission failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")])
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}
