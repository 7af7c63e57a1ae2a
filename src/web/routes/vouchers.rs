use axum::{body::Bytes, extract::State, Json};

use crate::{
    issuer::IssueError,
    web::{
        types::{IssuedVoucher, NormalizedEmail, VoucherRequest},
        Error, WebResult,
    },
    AppState,
};

/// Issues a first trip voucher and writes its code to the subscriber's profile.
///
/// The body is read as raw bytes so that a missing or malformed body is reported through
/// `web::Error` instead of an extractor rejection.
#[tracing::instrument(name = "first_trip_voucher", skip_all)]
pub async fn first_trip_voucher(
    State(app_state): State<AppState>,
    body: Bytes,
) -> WebResult<Json<IssuedVoucher>> {
    let request = VoucherRequest::from_body(&body)?;
    let email = NormalizedEmail::try_from(request)?;

    // Incomplete vendor settings fail here, before any network call.
    let issuer = app_state
        .issuer
        .as_ref()
        .map_err(|er| IssueError::Configuration(er.to_string()))?;

    let voucher = issuer.issue_first_trip_voucher(&email).await?;

    Ok(Json(IssuedVoucher { code: voucher.code }))
}

pub async fn method_not_allowed() -> WebResult<()> {
    Err(Error::MethodNotAllowed)
}
