//! The configuration structs used to build the AppConfig, and their impls.
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub voucherify: VoucherifyConfig,
    pub mailchimp: MailchimpConfig,
    pub offer: OfferConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Raw Voucherify section. Credentials usually come from the environment
/// and may be missing, see [`VoucherifyConfig::settings`].
#[derive(Deserialize, Clone, Debug)]
pub struct VoucherifyConfig {
    pub base_url: String,
    pub app_id: Option<SecretString>,
    pub app_token: Option<SecretString>,
    pub campaign_id: Option<String>,
    pub timeout_millis: Option<u64>,
}

/// Raw Mailchimp section.
/// `base_url` overrides the url otherwise derived from `server_prefix`.
#[derive(Deserialize, Clone, Debug)]
pub struct MailchimpConfig {
    pub base_url: Option<String>,
    pub server_prefix: Option<String>,
    pub list_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub auth_username: String,
    pub code_merge_field: String,
    #[serde(default)]
    pub clear_merge_fields: Vec<String>,
    pub timeout_millis: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OfferConfig {
    pub source: String,
    pub audience_tag: String,
    pub offer_tag: String,
    pub validity_days: u32,
}

/// Voucherify settings with every required value present.
#[derive(Clone, Debug)]
pub struct VoucherifySettings {
    pub base_url: String,
    pub app_id: SecretString,
    pub app_token: SecretString,
    pub campaign_id: String,
    pub timeout: Option<Duration>,
}

/// Mailchimp settings with every required value present.
#[derive(Clone, Debug)]
pub struct MailchimpSettings {
    pub base_url: String,
    pub list_id: String,
    pub api_key: SecretString,
    pub auth_username: String,
    pub code_merge_field: String,
    pub clear_merge_fields: Vec<String>,
    pub timeout: Option<Duration>,
}

// ###################################
// ->   IMPLs
// ###################################
impl VoucherifyConfig {
    /// Checks that the credentials and the campaign are present.
    /// Blank values count as missing.
    pub fn settings(&self) -> ConfigResult<VoucherifySettings> {
        let app_id = present_secret(&self.app_id);
        let app_token = present_secret(&self.app_token);
        let campaign_id = present(&self.campaign_id);

        match (app_id, app_token, campaign_id) {
            (Some(app_id), Some(app_token), Some(campaign_id)) => Ok(VoucherifySettings {
                base_url: self.base_url.clone(),
                app_id,
                app_token,
                campaign_id,
                timeout: self.timeout_millis.map(Duration::from_millis),
            }),
            (app_id, app_token, campaign_id) => Err(missing_settings(
                "Voucherify",
                [
                    ("VOUCHERIFY_APP_ID", app_id.is_none()),
                    ("VOUCHERIFY_APP_TOKEN", app_token.is_none()),
                    ("VOUCHERIFY_CAMPAIGN_ID", campaign_id.is_none()),
                ],
            )),
        }
    }
}

impl MailchimpConfig {
    /// Checks that the API key, the list and a way to reach the API are present.
    /// `server_prefix` is not needed when `base_url` is set.
    pub fn settings(&self) -> ConfigResult<MailchimpSettings> {
        let base_url = present(&self.base_url).or_else(|| {
            present(&self.server_prefix).map(|prefix| format!("https://{prefix}.api.mailchimp.com"))
        });
        let list_id = present(&self.list_id);
        let api_key = present_secret(&self.api_key);

        match (base_url, list_id, api_key) {
            (Some(base_url), Some(list_id), Some(api_key)) => Ok(MailchimpSettings {
                base_url,
                list_id,
                api_key,
                auth_username: self.auth_username.clone(),
                code_merge_field: self.code_merge_field.clone(),
                clear_merge_fields: self.clear_merge_fields.clone(),
                timeout: self.timeout_millis.map(Duration::from_millis),
            }),
            (base_url, list_id, api_key) => Err(missing_settings(
                "Mailchimp",
                [
                    ("MAILCHIMP_SERVER_PREFIX", base_url.is_none()),
                    ("MAILCHIMP_LIST_ID", list_id.is_none()),
                    ("MAILCHIMP_API_KEY", api_key.is_none()),
                ],
            )),
        }
    }
}

impl OfferConfig {
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.validity_days))
    }
}

// ###################################
// ->   HELPERS
// ###################################
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn present_secret(value: &Option<SecretString>) -> Option<SecretString> {
    value
        .as_ref()
        .filter(|v| !v.expose_secret().trim().is_empty())
        .cloned()
}

fn missing_settings<const N: usize>(
    service: &'static str,
    checks: [(&'static str, bool); N],
) -> ConfigError {
    let missing = checks
        .iter()
        .filter(|(_, is_missing)| *is_missing)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    ConfigError::MissingSettings { service, missing }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
