use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::clients;
use crate::issuer::IssueError;
use crate::web::types::DataParsingError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),

    #[error("voucher issuance error: {0}")]
    Issue(#[from] IssueError),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::DataParsing(DataParsingError::MissingEmail) => {
                (StatusCode::BAD_REQUEST, MissingEmail)
            }
            // Only a missing email is a client mistake, anything else about the body is unexpected.
            Error::DataParsing(DataParsingError::InvalidBody(reason)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                InvalidBody(reason.clone()),
            ),
            Error::Issue(IssueError::Configuration(message)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Configuration(message.clone()),
            ),
            // The provider's own status is passed through.
            Error::Issue(IssueError::Provider(clients::Error::Upstream(up))) => (
                up.status,
                VoucherProvider {
                    service: up.service,
                    details: up.body.clone(),
                },
            ),
            Error::Issue(IssueError::Registry(clients::Error::Upstream(up))) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SubscriberRegistry {
                    service: up.service,
                    status: up.status.as_u16(),
                    body: up.body_text(),
                },
            ),
            Error::Issue(IssueError::Provider(er) | IssueError::Registry(er)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ServiceError(er.to_string()),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The error as the client sees it, rendered into the `error` field of the response body.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Missing email")]
    MissingEmail,
    #[display("Invalid request body: {_0}")]
    InvalidBody(String),
    #[display("Method Not Allowed")]
    MethodNotAllowed,
    #[display("{_0}")]
    Configuration(String),
    #[display("{service} error")]
    VoucherProvider {
        service: &'static str,
        details: Value,
    },
    #[display("{service} update failed ({status}): {body}")]
    SubscriberRegistry {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[display("{_0}")]
    ServiceError(String),
}

impl ClientError {
    /// Extra data rendered into the `details` field of the response body.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ClientError::VoucherProvider { details, .. } => Some(details),
            _ => None,
        }
    }
}
