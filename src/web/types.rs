//! Request structs of the `web` module, their parsing implementations and tests for those.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable voucher request.
/// The email can still be missing or blank, see [`NormalizedEmail`].
#[derive(Debug, Default, Deserialize)]
pub struct VoucherRequest {
    #[serde(default)]
    pub email: Option<String>,
}

impl VoucherRequest {
    /// An empty body is treated as an empty JSON object.
    /// Any JSON value other than an object carries no email.
    pub fn from_body(body: &[u8]) -> Result<Self, DataParsingError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|er| DataParsingError::InvalidBody(er.to_string()))?;
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|er| DataParsingError::InvalidBody(er.to_string())),
            _ => Ok(Self::default()),
        }
    }
}

/// Response of a successfully issued voucher.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssuedVoucher {
    pub code: String,
}

/// Trimmed and lowercased email, the only form used for lookups and the subscriber hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmail(String);

impl AsRef<str> for NormalizedEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl NormalizedEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(DataParsingError::MissingEmail);
        }

        Ok(NormalizedEmail(value.to_lowercase()))
    }
}

impl TryFrom<VoucherRequest> for NormalizedEmail {
    type Error = DataParsingError;

    fn try_from(request: VoucherRequest) -> Result<Self, Self::Error> {
        let email = request.email.ok_or(DataParsingError::MissingEmail)?;
        NormalizedEmail::parse(email)
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("missing email")]
    MissingEmail,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}
