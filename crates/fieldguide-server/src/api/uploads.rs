//! Image upload endpoint.
//!
//! Files land in the uploads directory under a generated name and are
//! served back via the static `/uploads` route. The returned URL is built
//! from the request's Host header, honoring `x-forwarded-proto` when the
//! server sits behind a TLS-terminating proxy.

use std::sync::Arc;

use axum::extract::{Host, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::server::KnowledgeServer;

use super::auth::AuthUser;
use super::errors::{api_error_response, message_response};

pub async fn upload_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _user: AuthUser,
    Host(host): Host,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                error!(?err, "Failed to read upload body");
                return message_response(StatusCode::BAD_REQUEST, "No file uploaded");
            }
        };

        return match server
            .save_upload(&original_name, &content_type, &data)
            .await
        {
            Ok(file_name) => {
                let scheme = headers
                    .get("x-forwarded-proto")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("http");
                let url = format!("{}://{}/uploads/{}", scheme, host, file_name);
                Json(json!({ "url": url })).into_response()
            }
            Err(err) => {
                if !err.is_client_error() {
                    error!(?err, "Failed to store upload");
                }
                api_error_response(&err)
            }
        };
    }

    message_response(StatusCode::BAD_REQUEST, "No file uploaded")
}
