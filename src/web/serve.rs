use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::{field, Span};

use crate::{App, AppState, Result};

use super::{midware, routes::routes, REQUEST_ID_HEADER};

/// Serves the app until the listener fails.
///
/// Current implementation might return an IO error from `axum::serve`
pub async fn serve(app: App) -> Result<()> {
    let App {
        app_state,
        listener,
    } = app;

    axum::serve(listener, app_router(app_state)).await?;

    Ok(())
}

/// The routes wrapped in the request id, tracing and response mapping layers.
///
/// Requests pass the layers top down and responses bottom up: the mapped error response
/// is traced and then receives the `x-request-id` header.
fn app_router(app_state: AppState) -> Router {
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    routes(app_state).layer(
        ServiceBuilder::new()
            // A client supplied id is kept
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(build_trace_layer())
            .layer(middleware::map_response(midware::response_mapper)),
    )
}

/// One `request` span per request carrying the request id, method and path.
/// The `error` field is recorded by the response mapper when a handler fails.
fn build_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let req_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|id| id.to_str().ok())
                .unwrap_or_default();

            tracing::error_span!(
                "request",
                req_id,
                method = %req.method(),
                path = req.uri().path(),
                error = field::Empty,
            )
        })
        .on_request(|_req: &Request<Body>, _s: &Span| tracing::debug!("{:<12} - START", "REQUEST"))
        .on_response(|res: &Response<Body>, latency: Duration, _s: &Span| {
            let status = res.status();

            if status.is_server_error() {
                tracing::error!("{:<12} - {status} in {latency:?}", "RESPONSE")
            } else if status.is_client_error() {
                tracing::warn!("{:<12} - {status} in {latency:?}", "RESPONSE")
            } else {
                tracing::info!("{:<12} - {status} in {latency:?}", "RESPONSE")
            }
        })
}
