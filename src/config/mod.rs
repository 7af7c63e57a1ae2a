//! Builds an `AppConfig` from config files and the environment.
//! Sources are layered with `figment`, later ones override earlier ones:
//! `base.toml`, `{environment}.toml`, `APP_` prefixed env vars and finally the vendor env vars.

mod data;
mod error;

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use data::{
    AppConfig, Environment, MailchimpConfig, MailchimpSettings, NetConfig, OfferConfig,
    VoucherifyConfig, VoucherifySettings,
};
pub use error::{ConfigError, ConfigResult};

/// Vendor env vars and the config keys they are mapped to.
const VENDOR_ENV_VARS: [(&str, &str); 7] = [
    ("VOUCHERIFY_APP_ID", "voucherify.app_id"),
    ("VOUCHERIFY_APP_TOKEN", "voucherify.app_token"),
    ("VOUCHERIFY_CAMPAIGN_ID", "voucherify.campaign_id"),
    ("MAILCHIMP_API_KEY", "mailchimp.api_key"),
    ("MAILCHIMP_SERVER_PREFIX", "mailchimp.server_prefix"),
    ("MAILCHIMP_LIST_ID", "mailchimp.list_id"),
    ("MAILCHIMP_AUDIENCE_TAG", "offer.audience_tag"),
];

/// Loads the configuration from the `config` directory in the current working directory.
/// The environment is picked with the `APP_ENVIRONMENT` env var and defaults to `local`.
pub fn load_config() -> ConfigResult<AppConfig> {
    let config_dir = std::env::current_dir()?.join("config");
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()?;

    load_config_from(&config_dir, environment)
}

pub fn load_config_from(config_dir: &Path, environment: Environment) -> ConfigResult<AppConfig> {
    info!(
        "{:<12} - Loading the {} configuration",
        "load_config",
        environment.as_ref()
    );

    let base_file = config_dir.join("base.toml");
    let env_file = config_dir.join(format!("{}.toml", environment.as_ref().to_lowercase()));
    for file in [&base_file, &env_file] {
        if !file.is_file() {
            return Err(ConfigError::MissingFile(file.to_path_buf()));
        }
    }

    let mut figment = Figment::new()
        .merge(Toml::file(base_file))
        .merge(Toml::file(env_file))
        .merge(Env::prefixed("APP_").split("__"));

    // Vendor values are merged as plain strings so ids made of digits stay strings.
    // Blank values leave the configured default in place.
    for (var, key) in VENDOR_ENV_VARS {
        let value = std::env::var(var)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        if let Some(value) = value {
            figment = figment.merge(Serialized::default(key, value));
        }
    }

    let config = figment.extract()?;

    Ok(config)
}
