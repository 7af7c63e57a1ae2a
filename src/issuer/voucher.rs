use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::OfferConfig;
use crate::web::types::NormalizedEmail;

/// Tags attached to every voucher issued for an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoucherMetadata {
    pub source: String,
    pub audience: String,
    pub offer: String,
}

/// What gets issued: the campaign, the tags and how long a voucher stays valid.
#[derive(Debug, Clone)]
pub struct Offer {
    pub campaign_id: String,
    pub metadata: VoucherMetadata,
    pub validity: chrono::Duration,
}

impl Offer {
    pub fn from_config(campaign_id: String, config: &OfferConfig) -> Self {
        Offer {
            campaign_id,
            metadata: VoucherMetadata {
                source: config.source.clone(),
                audience: config.audience_tag.clone(),
                offer: config.offer_tag.clone(),
            },
            validity: config.validity(),
        }
    }
}

/// A voucher that is about to be requested from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVoucher {
    pub campaign_id: String,
    pub expires_at: DateTime<Utc>,
    pub customer_email: NormalizedEmail,
    pub metadata: VoucherMetadata,
}

impl NewVoucher {
    pub fn new(offer: &Offer, email: &NormalizedEmail, issued_at: DateTime<Utc>) -> Self {
        NewVoucher {
            campaign_id: offer.campaign_id.clone(),
            expires_at: issued_at + offer.validity,
            customer_email: email.clone(),
            metadata: offer.metadata.clone(),
        }
    }

    pub fn into_voucher(self, code: String) -> Voucher {
        Voucher {
            code,
            campaign_id: self.campaign_id,
            expires_at: self.expires_at,
            customer_email: self.customer_email.as_ref().to_string(),
            metadata: self.metadata,
        }
    }
}

/// A voucher issued by the provider. The provider owns it from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct Voucher {
    pub code: String,
    pub campaign_id: String,
    pub expires_at: DateTime<Utc>,
    pub customer_email: String,
    pub metadata: VoucherMetadata,
}
