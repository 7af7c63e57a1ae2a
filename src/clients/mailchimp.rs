use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{read_body, Error, Result, SubscriberRegistry};
use crate::config::MailchimpSettings;
use crate::issuer::{SubscriberHash, SubscriberUpdate};
use crate::utils;

/// Mailchimp Marketing API client, scoped to a single audience list.
#[derive(Debug)]
pub struct MailchimpClient {
    http_client: Client,
    /// API root, `{base_url}/3.0/`
    pub url: reqwest::Url,
    list_id: String,
    /// Precomputed `Basic` authorization header value.
    authorization: SecretString,
}

impl MailchimpClient {
    pub const NAME: &'static str = "Mailchimp";

    /// Mailchimp accepts any username with the API key as the password.
    pub fn new<S: AsRef<str>>(
        base_url: S,
        list_id: String,
        username: &str,
        api_key: &SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let url = reqwest::Url::parse(base_url.as_ref())
            .and_then(|url| url.join("3.0/"))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let credentials = utils::b64_encode(format!("{username}:{}", api_key.expose_secret()));
        let authorization = SecretString::from(format!("Basic {credentials}"));

        Ok(MailchimpClient {
            http_client,
            url,
            list_id,
            authorization,
        })
    }

    pub fn from_settings(settings: &MailchimpSettings) -> Result<Self> {
        Self::new(
            &settings.base_url,
            settings.list_id.clone(),
            &settings.auth_username,
            &settings.api_key,
            settings.timeout,
        )
    }

    fn member_url(&self, subscriber_hash: &SubscriberHash) -> Result<reqwest::Url> {
        self.url
            .join(&format!(
                "lists/{}/members/{}",
                self.list_id,
                subscriber_hash.as_ref()
            ))
            .map_err(|e| Error::UrlParsing(e.to_string()))
    }
}

#[async_trait]
impl SubscriberRegistry for MailchimpClient {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn update_subscriber(&self, update: &SubscriberUpdate) -> Result<()> {
        let url = self.member_url(&update.subscriber_hash)?;

        let resp = self
            .http_client
            .patch(url)
            .header("Authorization", self.authorization.expose_secret())
            .json(update)
            .send()
            .await?;

        let body = read_body(Self::NAME, resp).await?;
        debug!(
            "{:<12} - member updated: {}",
            "MAILCHIMP",
            body.get("id").unwrap_or(&body)
        );

        Ok(())
    }
}
