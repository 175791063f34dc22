use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::ebay::env::EbayEnv;

#[derive(Debug, Error)]
pub enum EbayOfferError {
    #[error("request failed: {0}")]
    Request(String),
}

/// One entry of a `bulk_create_offer` request. Same omission policy as the
/// inventory payload: optional fields vanish from the JSON when unset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    pub sku: String,
    pub marketplace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_summary: Option<PricingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_location_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_start_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_reserve_price: Option<Price>,
}

impl PricingSummary {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.auction_start_price.is_none()
            && self.auction_reserve_price.is_none()
    }
}

/// Monetary amounts go over the wire as strings, exactly as they appeared in
/// the sheet.
#[derive(Debug, Clone, Serialize)]
pub struct Price {
    pub currency: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_tax: Option<bool>,
}

#[derive(Serialize)]
struct BulkEnvelope<'a> {
    requests: &'a [OfferPayload],
}

pub async fn bulk_create_offer(
    http: &Client,
    env: EbayEnv,
    access_token: &str,
    requests: &[OfferPayload],
) -> Result<(), EbayOfferError> {
    let url = format!("{}/sell/inventory/v1/bulk_create_offer", env.api_root());
    let response = http
        .post(url)
        .header("Authorization", format!("IAF {access_token}"))
        .header("Content-Language", "en-US")
        .json(&BulkEnvelope { requests })
        .send()
        .await
        .map_err(|err| EbayOfferError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(EbayOfferError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_serialize_as_currency_and_string_value() {
        let payload = OfferPayload {
            sku: "ABC-1".into(),
            marketplace_id: "EBAY_GB".into(),
            format: Some("AUCTION".into()),
            available_quantity: Some(1),
            category_id: Some(9355),
            listing_description: None,
            listing_start_date: Some("2026-08-13T09:30:00Z".into()),
            pricing_summary: Some(PricingSummary {
                auction_start_price: Some(Price {
                    currency: "GBP".into(),
                    value: "12.5".into(),
                }),
                ..PricingSummary::default()
            }),
            tax: Some(Tax {
                vat_percentage: Some(20),
                apply_tax: Some(true),
            }),
            merchant_location_key: None,
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(
            json["pricingSummary"]["auctionStartPrice"]["currency"],
            "GBP"
        );
        assert_eq!(json["pricingSummary"]["auctionStartPrice"]["value"], "12.5");
        assert_eq!(json["tax"]["vatPercentage"], 20);
        assert_eq!(json["categoryId"], 9355);
        assert!(json.get("merchantLocationKey").is_none());
        assert!(json["pricingSummary"].get("price").is_none());
    }

    #[test]
    fn empty_pricing_summary_reports_empty() {
        assert!(PricingSummary::default().is_empty());
        let priced = PricingSummary {
            price: Some(Price {
                currency: "GBP".into(),
                value: "3".into(),
            }),
            ..PricingSummary::default()
        };
        assert!(!priced.is_empty());
    }
}
