//! HTTP clients for the two vendors this service talks to.
//! The issuer only sees them through the [`VoucherProvider`] and [`SubscriberRegistry`] traits.

pub mod mailchimp;
pub mod voucherify;

// re-exports
pub use mailchimp::MailchimpClient;
pub use voucherify::VoucherifyClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::issuer::{NewVoucher, SubscriberUpdate, Voucher};

/// Issues vouchers.
#[async_trait]
pub trait VoucherProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_voucher(&self, new_voucher: &NewVoucher) -> Result<Voucher>;
}

/// Stores subscriber profiles addressed by their subscriber hash.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    fn name(&self) -> &'static str;

    async fn update_subscriber(&self, update: &SubscriberUpdate) -> Result<()>;
}

/// A non-success response from a vendor, kept as it was received.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub service: &'static str,
    pub status: StatusCode,
    /// The response body, as a JSON string value if it wasn't JSON.
    pub body: Value,
}

impl UpstreamError {
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl core::fmt::Display for UpstreamError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            fmt,
            "{} responded with {}: {}",
            self.service,
            self.status,
            self.body_text()
        )
    }
}

/// Reads the whole response body.
/// Non-JSON bodies are kept as a string value, non-success statuses become `Error::Upstream`.
pub(crate) async fn read_body(service: &'static str, resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let text = resp.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => json,
        Err(_) => Value::String(text),
    };

    if !status.is_success() {
        return Err(Error::Upstream(UpstreamError {
            service,
            status,
            body,
        }));
    }

    Ok(body)
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("{0}")]
    Upstream(UpstreamError),
    #[error("{service} response is missing the voucher code")]
    MissingVoucherCode { service: &'static str },

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
