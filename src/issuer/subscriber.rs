use std::collections::BTreeMap;

use serde::Serialize;

use crate::utils;
use crate::web::types::NormalizedEmail;

/// Mailchimp's member id: the MD5 hex digest of the lowercased email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberHash(String);

impl SubscriberHash {
    pub fn from_email(email: &NormalizedEmail) -> Self {
        Self(utils::md5_hex(email.as_ref()))
    }
}

impl AsRef<str> for SubscriberHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Merge fields written on every update.
#[derive(Debug, Clone)]
pub struct MergeFields {
    /// Receives the voucher code.
    pub code_field: String,
    /// Set to an empty string.
    pub cleared_fields: Vec<String>,
}

/// Body of a member PATCH, addressed by `subscriber_hash`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberUpdate {
    #[serde(skip)]
    pub subscriber_hash: SubscriberHash,
    pub merge_fields: BTreeMap<String, String>,
}

impl SubscriberUpdate {
    pub fn new(email: &NormalizedEmail, fields: &MergeFields, code: &str) -> Self {
        let mut merge_fields = fields
            .cleared_fields
            .iter()
            .map(|field| (field.clone(), String::new()))
            .collect::<BTreeMap<_, _>>();
        // The code wins if it is also listed as cleared.
        merge_fields.insert(fields.code_field.clone(), code.to_string());

        SubscriberUpdate {
            subscriber_hash: SubscriberHash::from_email(email),
            merge_fields,
        }
    }
}
