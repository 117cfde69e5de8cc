//! Authenticated backend client.
//!
//! Every request fetches a fresh bearer token from the identity gate, so a
//! stale session fails fast (`Unauthenticated`) without touching the network.
//! The [`BackendApi`] trait is the seam the link and view controllers consume;
//! [`HttpBackendClient`] is the real implementation over reqwest.

pub mod models;

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::identity::IdentityGate;
use crate::types::{Result, TrustCartError};

pub use models::{CartEntry, CatalogItem, ExchangeResponse, NewItem, StoreProfile, UserData};

/// Typed surface of the application backend.
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST /create_link_token` - setup token for the bank-link widget.
    async fn create_link_token(&self) -> Result<String>;

    /// `POST /exchange_public_token` - second phase of the link exchange.
    async fn exchange_public_token(
        &self,
        public_token: &str,
        metadata: Value,
    ) -> Result<ExchangeResponse>;

    /// `POST /login` - record the signed-in user (idempotent upsert-by-email
    /// on the backend side).
    async fn record_login(&self, id: &str, description: &str) -> Result<Value>;

    /// `POST /create_item` - multipart listing upload.
    async fn create_item(&self, item: NewItem) -> Result<Value>;

    /// `POST /add_to_cart`.
    async fn add_to_cart(&self, user_id: &str, title: &str) -> Result<Value>;

    /// `POST /getUserData` - the aggregated load, one round trip for all four
    /// collections.
    async fn user_data(&self, user_id: &str) -> Result<UserData>;

    /// `GET /test` - liveness and auth probe.
    async fn liveness(&self) -> Result<Value>;
}

/// Request body variants. Multipart must not carry a JSON content type; the
/// transport sets the boundary header itself.
enum Payload {
    Empty,
    Json(Value),
    Multipart(NewItem),
}

/// reqwest-backed implementation of [`BackendApi`].
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
    gate: Arc<IdentityGate>,
}

impl HttpBackendClient {
    pub fn new(base_url: &str, gate: Arc<IdentityGate>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            gate,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Core request sequence: token, body, bearer header, parse, status check.
    async fn call(&self, method: reqwest::Method, path: &str, payload: Payload) -> Result<Value> {
        // No session means no network call at all.
        let token = self.gate.session_token().await?;

        let url = self.endpoint(path);
        let mut request = self.http.request(method.clone(), &url).bearer_auth(token);

        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(item) => request.multipart(multipart_form(item)),
        };

        debug!(%method, %url, "backend request");
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: Value = serde_json::from_str(&body).map_err(|_| {
            warn!(%url, status = status.as_u16(), "backend reply was not JSON");
            TrustCartError::MalformedResponse {
                status: status.as_u16(),
                body,
            }
        })?;

        if !status.is_success() {
            return Err(TrustCartError::Backend {
                status: status.as_u16(),
                detail: error_detail(&parsed),
            });
        }

        Ok(parsed)
    }
}

/// Pull a human-readable detail out of a backend error payload, with a
/// generic fallback when the backend supplied none.
fn error_detail(payload: &Value) -> String {
    for key in ["detail", "error", "message"] {
        if let Some(msg) = payload.get(key).and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    "backend request failed".to_string()
}

fn multipart_form(item: NewItem) -> multipart::Form {
    let file_name = item
        .file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("upload")
        .to_string();

    multipart::Form::new()
        .text("user_id", item.user_id)
        .text("title", item.title)
        .text("price", item.price.to_string())
        .text("description", item.description)
        .text("filePath", item.file_path)
        .part("file", multipart::Part::bytes(item.file.to_vec()).file_name(file_name))
}

#[async_trait::async_trait]
impl BackendApi for HttpBackendClient {
    async fn create_link_token(&self) -> Result<String> {
        let payload = self
            .call(reqwest::Method::POST, "create_link_token", Payload::Empty)
            .await?;

        payload
            .get("link_token")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(TrustCartError::SetupTokenMissing)
    }

    async fn exchange_public_token(
        &self,
        public_token: &str,
        metadata: Value,
    ) -> Result<ExchangeResponse> {
        let payload = self
            .call(
                reqwest::Method::POST,
                "exchange_public_token",
                Payload::Json(json!({
                    "public_token": public_token,
                    "metadata": metadata,
                })),
            )
            .await?;

        serde_json::from_value(payload.clone()).map_err(|_| TrustCartError::MalformedResponse {
            status: 200,
            body: payload.to_string(),
        })
    }

    async fn record_login(&self, id: &str, description: &str) -> Result<Value> {
        self.call(
            reqwest::Method::POST,
            "login",
            Payload::Json(json!({ "id": id, "description": description })),
        )
        .await
    }

    async fn create_item(&self, item: NewItem) -> Result<Value> {
        self.call(
            reqwest::Method::POST,
            "create_item",
            Payload::Multipart(item),
        )
        .await
    }

    async fn add_to_cart(&self, user_id: &str, title: &str) -> Result<Value> {
        self.call(
            reqwest::Method::POST,
            "add_to_cart",
            Payload::Json(json!({ "user_id": user_id, "title": title })),
        )
        .await
    }

    async fn user_data(&self, user_id: &str) -> Result<UserData> {
        let payload = self
            .call(
                reqwest::Method::POST,
                "getUserData",
                Payload::Json(json!({ "user_id": user_id })),
            )
            .await?;

        serde_json::from_value(payload.clone()).map_err(|_| TrustCartError::MalformedResponse {
            status: 200,
            body: payload.to_string(),
        })
    }

    async fn liveness(&self) -> Result<Value> {
        self.call(reqwest::Method::GET, "test", Payload::Empty).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            error_detail(&json!({ "detail": "Missing auth token" })),
            "Missing auth token"
        );
        assert_eq!(error_detail(&json!({ "error": "boom" })), "boom");
        assert_eq!(
            error_detail(&json!({ "message": "no such item" })),
            "no such item"
        );
        assert_eq!(error_detail(&json!({ "code": 42 })), "backend request failed");
    }

    #[test]
    fn test_multipart_file_name_from_path() {
        let item = NewItem {
            user_id: "u1".to_string(),
            title: "Widget".to_string(),
            price: 9.5,
            description: "A widget".to_string(),
            file_path: "C:\\photos\\widget.png".to_string(),
            file: bytes::Bytes::from_static(b"\x89PNG"),
        };

        // Form construction must not panic and must keep the basename.
        let _ = multipart_form(item);
    }
}
