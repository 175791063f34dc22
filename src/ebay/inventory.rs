use std::collections::BTreeMap;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::ebay::env::EbayEnv;

#[derive(Debug, Error)]
pub enum EbayInventoryError {
    #[error("request failed: {0}")]
    Request(String),
}

/// One entry of a `bulk_create_or_replace_inventory_item` request. Absent
/// fields are omitted from the wire format entirely; the API treats absence
/// as "not specified" and rejects nulls and empty strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemPayload {
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    pub product: ProductDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulatory: Option<Regulatory>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipToLocationAvailability {
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Regulatory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<Manufacturer>,
}

/// GPSR manufacturer block. Phone and postcode arrive as whole numbers from
/// the sheet and are forwarded as such.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_or_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Manufacturer {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.address_line1.is_none()
            && self.address_line2.is_none()
            && self.city.is_none()
            && self.state_or_province.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }
}

#[derive(Serialize)]
struct BulkEnvelope<'a> {
    requests: &'a [InventoryItemPayload],
}

pub async fn bulk_create_or_replace(
    http: &Client,
    env: EbayEnv,
    access_token: &str,
    requests: &[InventoryItemPayload],
) -> Result<(), EbayInventoryError> {
    let url = format!(
        "{}/sell/inventory/v1/bulk_create_or_replace_inventory_item",
        env.api_root()
    );
    let response = http
        .post(url)
        .header("Authorization", format!("IAF {access_token}"))
        .header("Content-Language", "en-US")
        .json(&BulkEnvelope { requests })
        .send()
        .await
        .map_err(|err| EbayInventoryError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(EbayInventoryError::Request(format!(
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
    fn absent_fields_leave_no_keys_behind() {
        let payload = InventoryItemPayload {
            sku: "ABC-1".into(),
            condition: None,
            availability: None,
            product: ProductDetails {
                title: Some("Widget".into()),
                ..ProductDetails::default()
            },
            regulatory: None,
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["sku"], "ABC-1");
        assert_eq!(json["product"]["title"], "Widget");
        assert!(json.get("condition").is_none());
        assert!(json.get("availability").is_none());
        assert!(json["product"].get("imageUrls").is_none());
        assert!(json["product"].get("aspects").is_none());
    }

    #[test]
    fn regulatory_manufacturer_serializes_nested_camel_case() {
        let payload = InventoryItemPayload {
            sku: "ABC-2".into(),
            condition: Some("NEW".into()),
            availability: Some(Availability {
                ship_to_location_availability: ShipToLocationAvailability { quantity: 3 },
            }),
            product: ProductDetails::default(),
            regulatory: Some(Regulatory {
                manufacturer: Some(Manufacturer {
                    company_name: Some("Acme Ltd".into()),
                    city: Some("Sheffield".into()),
                    postal_code: Some(114_212),
                    ..Manufacturer::default()
                }),
            }),
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["regulatory"]["manufacturer"]["city"], "Sheffield");
        assert_eq!(json["regulatory"]["manufacturer"]["companyName"], "Acme Ltd");
        assert_eq!(json["regulatory"]["manufacturer"]["postalCode"], 114_212);
        assert_eq!(
            json["availability"]["shipToLocationAvailability"]["quantity"],
            3
        );
    }

    #[test]
    fn bulk_envelope_wraps_requests_array() {
        let envelope = BulkEnvelope { requests: &[] };
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert!(json["requests"].as_array().is_some());
    }
}
