use chrono::{DateTime, Duration, Utc};

use crate::ebay::images::{EbayImageError, ImageResolver};
use crate::ebay::inventory::{
    Availability, InventoryItemPayload, Manufacturer, ProductDetails, Regulatory,
    ShipToLocationAvailability,
};
use crate::ebay::offers::{OfferPayload, Price, PricingSummary, Tax};
use crate::mapping::{self, ColumnMap};
use crate::sheet::ListingRow;

pub const DEFAULT_MARKETPLACE: &str = "EBAY_GB";
pub const DEFAULT_CURRENCY: &str = "GBP";

const LISTING_LEAD_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct RowPayloads {
    pub inventory: InventoryItemPayload,
    pub offer: OfferPayload,
}

/// Result of building one row. A skip is expected input (a spacer row, a
/// half-filled template line), not a failure.
#[derive(Debug)]
pub enum RowOutcome {
    Built(RowPayloads),
    Skipped { reason: &'static str },
}

/// Turns one sheet row into the inventory-item and offer payloads. All field
/// extraction is best-effort: a blank or unparsable cell omits the field,
/// never fails the row. The only hard failure is an unreadable photo
/// directory.
pub struct PayloadBuilder<R> {
    map: &'static ColumnMap,
    images: R,
}

impl<R: ImageResolver> PayloadBuilder<R> {
    pub fn new(images: R) -> Self {
        Self {
            map: ColumnMap::standard(),
            images,
        }
    }

    pub async fn build(&self, row: &ListingRow) -> Result<RowOutcome, EbayImageError> {
        let Some(sku) = self.map.text(row, "sku") else {
            return Ok(RowOutcome::Skipped { reason: "no sku" });
        };
        let image_urls = self.images.hosted_urls(&sku).await?;
        let inventory = self.inventory_payload(row, &sku, image_urls);
        let offer = self.offer_payload(row, &sku, Utc::now());
        Ok(RowOutcome::Built(RowPayloads { inventory, offer }))
    }

    fn inventory_payload(
        &self,
        row: &ListingRow,
        sku: &str,
        image_urls: Vec<String>,
    ) -> InventoryItemPayload {
        let aspects = mapping::extract_aspects(row);
        let product = ProductDetails {
            title: self.map.text(row, "product.title"),
            description: self.map.text(row, "product.description"),
            brand: self.map.text(row, "product.brand"),
            mpn: self.map.text(row, "product.mpn"),
            ean: self.map.text(row, "product.ean").map(|ean| vec![ean]),
            aspects: (!aspects.is_empty()).then_some(aspects),
            image_urls: (!image_urls.is_empty()).then_some(image_urls),
        };

        let condition = self
            .map
            .integer(row, "condition")
            .and_then(mapping::condition_from_code)
            .map(str::to_string);

        let availability = self
            .map
            .integer(row, "availability.quantity")
            .map(|quantity| Availability {
                ship_to_location_availability: ShipToLocationAvailability { quantity },
            });

        let manufacturer = Manufacturer {
            company_name: self.map.text(row, "regulatory.manufacturer.companyName"),
            address_line1: self.map.text(row, "regulatory.manufacturer.addressLine1"),
            address_line2: self.map.text(row, "regulatory.manufacturer.addressLine2"),
            city: self.map.text(row, "regulatory.manufacturer.city"),
            state_or_province: self.map.text(row, "regulatory.manufacturer.stateOrProvince"),
            postal_code: self.map.integer(row, "regulatory.manufacturer.postalCode"),
            country: self.map.text(row, "regulatory.manufacturer.country"),
            phone: self.map.integer(row, "regulatory.manufacturer.phone"),
            email: self.map.text(row, "regulatory.manufacturer.email"),
        };
        let regulatory = (!manufacturer.is_empty()).then(|| Regulatory {
            manufacturer: Some(manufacturer),
        });

        InventoryItemPayload {
            sku: sku.to_string(),
            condition,
            availability,
            product,
            regulatory,
        }
    }

    fn offer_payload(&self, row: &ListingRow, sku: &str, now: DateTime<Utc>) -> OfferPayload {
        let pricing = PricingSummary {
            price: self.price_field(row, "offer.pricingSummary.price"),
            auction_start_price: self.price_field(row, "offer.pricingSummary.auctionStartPrice"),
            auction_reserve_price: self
                .price_field(row, "offer.pricingSummary.auctionReservePrice"),
        };

        let tax = self
            .map
            .integer(row, "offer.tax.vatPercentage")
            .map(|vat| Tax {
                vat_percentage: Some(vat),
                apply_tax: Some(true),
            });

        OfferPayload {
            sku: sku.to_string(),
            marketplace_id: DEFAULT_MARKETPLACE.to_string(),
            format: self.map.text(row, "offer.format"),
            available_quantity: self.map.integer(row, "availability.quantity"),
            category_id: self.map.integer(row, "offer.categoryId"),
            listing_description: self.map.text(row, "offer.listingDescription"),
            listing_start_date: Some(listing_start_date(now)),
            pricing_summary: (!pricing.is_empty()).then_some(pricing),
            tax,
            merchant_location_key: self.map.text(row, "offer.merchantLocationKey"),
        }
    }

    fn price_field(&self, row: &ListingRow, field: &str) -> Option<Price> {
        self.map.text(row, field).map(|value| Price {
            currency: DEFAULT_CURRENCY.to_string(),
            value,
        })
    }
}

/// Offers go live a week out. Downstream tooling expects exactly this
/// rendering: second precision, literal Z.
pub fn listing_start_date(now: DateTime<Utc>) -> String {
    (now + Duration::days(LISTING_LEAD_DAYS))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
