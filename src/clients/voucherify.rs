use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_body, Error, Result, VoucherProvider};
use crate::config::VoucherifySettings;
use crate::issuer::{NewVoucher, Voucher, VoucherMetadata};

#[derive(Debug)]
pub struct VoucherifyClient {
    http_client: Client,
    pub url: reqwest::Url,
    app_id: SecretString,
    app_token: SecretString,
}

impl VoucherifyClient {
    pub const NAME: &'static str = "Voucherify";

    /// `timeout` of `None` leaves the requests without a timeout.
    pub fn new<S: AsRef<str>>(
        url: S,
        app_id: SecretString,
        app_token: SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(VoucherifyClient {
            http_client,
            url,
            app_id,
            app_token,
        })
    }

    pub fn from_settings(settings: &VoucherifySettings) -> Result<Self> {
        Self::new(
            &settings.base_url,
            settings.app_id.clone(),
            settings.app_token.clone(),
            settings.timeout,
        )
    }
}

#[async_trait]
impl VoucherProvider for VoucherifyClient {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn create_voucher(&self, new_voucher: &NewVoucher) -> Result<Voucher> {
        let url = self
            .url
            .join("v1/vouchers")
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let content = CreateVoucherContent::from(new_voucher);

        let resp = self
            .http_client
            .post(url)
            .header("X-App-Id", self.app_id.expose_secret())
            .header("X-App-Token", self.app_token.expose_secret())
            .json(&content)
            .send()
            .await?;

        let body = read_body(Self::NAME, resp).await?;
        debug!("{:<12} - voucher created: {body}", "VOUCHERIFY");

        let created: CreatedVoucher = serde_json::from_value(body)?;
        let code = created
            .code
            .filter(|code| !code.is_empty())
            .ok_or(Error::MissingVoucherCode { service: Self::NAME })?;

        Ok(new_voucher.clone().into_voucher(code))
    }
}

#[derive(Serialize)]
pub struct CreateVoucherContent<'a> {
    pub campaign: &'a str,
    pub expiration_date: String,
    pub customer: Customer<'a>,
    pub metadata: &'a VoucherMetadata,
}

#[derive(Serialize)]
pub struct Customer<'a> {
    pub email: &'a str,
}

impl<'a> From<&'a NewVoucher> for CreateVoucherContent<'a> {
    fn from(value: &'a NewVoucher) -> Self {
        CreateVoucherContent {
            campaign: &value.campaign_id,
            expiration_date: value
                .expires_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            customer: Customer {
                email: value.customer_email.as_ref(),
            },
            metadata: &value.metadata,
        }
    }
}

/// The part of Voucherify's response we need.
#[derive(Deserialize)]
struct CreatedVoucher {
    code: Option<String>,
}
