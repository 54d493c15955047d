//! JSON request bodies whose parse failures answer 400 instead of axum's plain-text 422.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

/// Drop-in for `axum::Json` on request bodies.
///
/// Undecodable payloads become `400 {"error", "kind": "malformed_input"}`, so
/// clients can tell them apart from 422 rule violations.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

/// Rejection produced by [`JsonBody`].
#[derive(Debug)]
pub struct MalformedInput(JsonRejection);

impl IntoResponse for MalformedInput {
    fn into_response(self) -> Response {
        let detail = self.0.body_text();
        debug!(%detail, "rejected malformed request body");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": detail, "kind": "malformed_input" })),
        )
            .into_response()
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MalformedInput;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(MalformedInput)
    }
}
