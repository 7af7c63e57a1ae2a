use std::sync::Arc;

use axum::{
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::Span;
use uuid::Uuid;

use crate::web::{log, Error, REQUEST_ID_HEADER};

/// Turns the `Error` stored in the response extensions into a JSON error response:
/// `{ "error": <message>, "details": <optional>, "req_id": <request id> }`.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    resp: Response,
) -> Response {
    let req_id = req_headers
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let web_error = resp.extensions().get::<Arc<Error>>().map(|er| er.as_ref());
    if let Some(web_error) = web_error {
        let variant: &str = web_error.as_ref();
        Span::current().record("error", variant);
    }
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let mut client_error_body = json!({
            "error": cl_err.to_string(),
            "req_id": req_id,
        });
        if let Some(details) = cl_err.details() {
            client_error_body["details"] = details.clone();
        }

        (*status, Json(client_error_body)).into_response()
    });

    log::log_request(
        &req_id,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}
