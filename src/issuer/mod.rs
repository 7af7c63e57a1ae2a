//! The first trip voucher workflow.
//!
//! A voucher is created by the [`VoucherProvider`] first, then its code is written to the
//! subscriber's profile in the [`SubscriberRegistry`]. The second call is only made if the first
//! one succeeded. A failed registry update leaves the voucher issued, nothing is rolled back.

mod subscriber;
mod voucher;

// re-exports
pub use subscriber::{MergeFields, SubscriberHash, SubscriberUpdate};
pub use voucher::{NewVoucher, Offer, Voucher, VoucherMetadata};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::{
    clients::{self, MailchimpClient, SubscriberRegistry, VoucherProvider, VoucherifyClient},
    config::{AppConfig, ConfigResult, MailchimpSettings, OfferConfig, VoucherifySettings},
    web::types::NormalizedEmail,
};

/// Everything the issuer needs, checked for completeness.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub voucherify: VoucherifySettings,
    pub mailchimp: MailchimpSettings,
    pub offer: OfferConfig,
}

impl IssuerSettings {
    pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
        Ok(IssuerSettings {
            voucherify: config.voucherify.settings()?,
            mailchimp: config.mailchimp.settings()?,
            offer: config.offer.clone(),
        })
    }
}

pub struct VoucherIssuer {
    provider: Arc<dyn VoucherProvider>,
    registry: Arc<dyn SubscriberRegistry>,
    offer: Offer,
    merge_fields: MergeFields,
}

impl VoucherIssuer {
    pub fn new(
        provider: Arc<dyn VoucherProvider>,
        registry: Arc<dyn SubscriberRegistry>,
        offer: Offer,
        merge_fields: MergeFields,
    ) -> Self {
        VoucherIssuer {
            provider,
            registry,
            offer,
            merge_fields,
        }
    }

    /// Builds the issuer backed by Voucherify and Mailchimp.
    pub fn from_settings(settings: IssuerSettings) -> clients::Result<Self> {
        let IssuerSettings {
            voucherify,
            mailchimp,
            offer,
        } = settings;

        let provider = VoucherifyClient::from_settings(&voucherify)?;
        let registry = MailchimpClient::from_settings(&mailchimp)?;
        let offer = Offer::from_config(voucherify.campaign_id, &offer);
        let merge_fields = MergeFields {
            code_field: mailchimp.code_merge_field,
            cleared_fields: mailchimp.clear_merge_fields,
        };

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(registry),
            offer,
            merge_fields,
        ))
    }

    #[tracing::instrument(
        name = "Issuing a first trip voucher",
        skip(self, email),
        fields(email = %email.as_ref())
    )]
    pub async fn issue_first_trip_voucher(&self, email: &NormalizedEmail) -> IssueResult<Voucher> {
        self.issue_at(email, Utc::now()).await
    }

    /// Issues a voucher as if it was requested at `issued_at`.
    pub async fn issue_at(
        &self,
        email: &NormalizedEmail,
        issued_at: DateTime<Utc>,
    ) -> IssueResult<Voucher> {
        let new_voucher = NewVoucher::new(&self.offer, email, issued_at);

        let voucher = self
            .provider
            .create_voucher(&new_voucher)
            .await
            .map_err(IssueError::Provider)?;
        info!(
            "{:<12} - voucher {} created, expires at {}",
            self.provider.name(),
            voucher.code,
            voucher.expires_at
        );

        let update = SubscriberUpdate::new(email, &self.merge_fields, &voucher.code);
        if let Err(er) = self.registry.update_subscriber(&update).await {
            error!(
                "{:<12} - voucher {} was issued but the subscriber was not updated: {er}",
                self.registry.name(),
                voucher.code
            );
            return Err(IssueError::Registry(er));
        }
        info!(
            "{:<12} - subscriber {} updated",
            self.registry.name(),
            update.subscriber_hash.as_ref()
        );

        Ok(voucher)
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type IssueResult<T> = core::result::Result<T, IssueError>;

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("{0}")]
    Configuration(String),
    #[error("voucher creation failed: {0}")]
    Provider(#[source] clients::Error),
    #[error("voucher created but the subscriber update failed: {0}")]
    Registry(#[source] clients::Error),
}
