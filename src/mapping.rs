use std::collections::BTreeMap;

use crate::sheet::{CellValue, ListingRow};

/// Columns whose header carries this prefix hold free-form product aspects;
/// the rest of the header is the aspect name.
pub const ASPECT_PREFIX: &str = "C:";

/// Multi-valued aspect cells separate their values with this.
pub const ASPECT_DELIMITER: &str = "||";

/// Declarative map from logical payload field path to the column header that
/// sources it. Paths are unique; an empty header means the field is never
/// sourced from the sheet. Defined once per sheet template revision.
pub struct ColumnMap {
    entries: &'static [(&'static str, &'static str)],
}

const TEMPLATE_COLUMNS: &[(&str, &str)] = &[
    ("sku", "SKU"),
    ("product.title", "Title"),
    ("product.description", "Description"),
    ("product.brand", "Brand"),
    ("product.mpn", "MPN"),
    ("product.ean", "EAN"),
    ("availability.quantity", "Quantity"),
    ("condition", "Condition ID"),
    ("offer.format", "Format"),
    ("offer.categoryId", "Category ID"),
    ("offer.listingDescription", "Description"),
    ("offer.pricingSummary.price", "Buy It Now Price"),
    ("offer.pricingSummary.auctionStartPrice", "Start Price"),
    ("offer.pricingSummary.auctionReservePrice", "Reserve Price"),
    ("offer.tax.vatPercentage", "VAT %"),
    ("offer.merchantLocationKey", ""),
    ("offer.listingPolicies", ""),
    ("regulatory.manufacturer.companyName", "Manufacturer Name"),
    ("regulatory.manufacturer.addressLine1", "Manufacturer Address 1"),
    ("regulatory.manufacturer.addressLine2", "Manufacturer Address 2"),
    ("regulatory.manufacturer.city", "Manufacturer City"),
    ("regulatory.manufacturer.stateOrProvince", "Manufacturer County"),
    ("regulatory.manufacturer.postalCode", "Manufacturer Postcode"),
    ("regulatory.manufacturer.country", "Manufacturer Country"),
    ("regulatory.manufacturer.phone", "Manufacturer Phone"),
    ("regulatory.manufacturer.email", "Manufacturer Email"),
];

static TEMPLATE_MAP: ColumnMap = ColumnMap {
    entries: TEMPLATE_COLUMNS,
};

impl ColumnMap {
    /// The map for the current listings sheet template.
    pub fn standard() -> &'static ColumnMap {
        &TEMPLATE_MAP
    }

    /// Header sourcing a logical field; None when the field is unmapped or
    /// deliberately not sheet-sourced.
    pub fn header_for(&self, field: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(path, _)| *path == field)
            .map(|(_, header)| *header)
            .filter(|header| !header.is_empty())
    }

    /// Non-blank row text for a logical field.
    pub fn text(&self, row: &ListingRow, field: &str) -> Option<String> {
        self.header_for(field).and_then(|header| row.text(header))
    }

    /// Best-effort integer for a logical field; a cell that will not parse
    /// drops the field rather than failing the row.
    pub fn integer(&self, row: &ListingRow, field: &str) -> Option<i64> {
        self.header_for(field)
            .and_then(|header| row.integer(header))
    }
}

/// Numeric condition code from the sheet to the API condition enum. Codes
/// outside the table yield no condition at all.
pub fn condition_from_code(code: i64) -> Option<&'static str> {
    match code {
        1000 => Some("NEW"),
        1500 => Some("NEW_OTHER"),
        1750 => Some("NEW_WITH_DEFECTS"),
        2000 => Some("CERTIFIED_REFURBISHED"),
        2500 => Some("SELLER_REFURBISHED"),
        2750 => Some("LIKE_NEW"),
        3000 => Some("USED_EXCELLENT"),
        4000 => Some("USED_VERY_GOOD"),
        5000 => Some("USED_GOOD"),
        6000 => Some("USED_ACCEPTABLE"),
        7000 => Some("FOR_PARTS_OR_NOT_WORKING"),
        _ => None,
    }
}

/// Collect `C:`-prefixed columns into an aspects map. Text values split on
/// `||`; numeric values become a single-element list.
pub fn extract_aspects(row: &ListingRow) -> BTreeMap<String, Vec<String>> {
    let mut aspects = BTreeMap::new();
    for (header, cell) in row.cells() {
        let Some(name) = header.strip_prefix(ASPECT_PREFIX) else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let values: Vec<String> = match cell {
            CellValue::Text(raw) => raw
                .split(ASPECT_DELIMITER)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
            CellValue::Number(_) => cell.as_text().into_iter().collect(),
            CellValue::Empty => Vec::new(),
        };
        if !values.is_empty() {
            aspects.insert(name.to_string(), values);
        }
    }
    aspects
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn logical_paths_are_unique() {
        let mut seen = HashSet::new();
        for (path, _) in TEMPLATE_COLUMNS {
            assert!(seen.insert(*path), "duplicate logical path {path}");
        }
    }

    #[test]
    fn unmapped_and_unsourced_fields_have_no_header() {
        let map = ColumnMap::standard();
        assert_eq!(map.header_for("sku"), Some("SKU"));
        assert_eq!(
            map.header_for("regulatory.manufacturer.city"),
            Some("Manufacturer City")
        );
        assert_eq!(map.header_for("offer.merchantLocationKey"), None);
        assert_eq!(map.header_for("no.such.field"), None);
    }

    #[test]
    fn mapped_condition_codes_translate() {
        assert_eq!(condition_from_code(1000), Some("NEW"));
        assert_eq!(condition_from_code(3000), Some("USED_EXCELLENT"));
        assert_eq!(condition_from_code(7000), Some("FOR_PARTS_OR_NOT_WORKING"));
    }

    #[test]
    fn unmapped_condition_codes_translate_to_nothing() {
        assert_eq!(condition_from_code(0), None);
        assert_eq!(condition_from_code(1234), None);
        assert_eq!(condition_from_code(8000), None);
    }

    #[test]
    fn aspect_columns_split_on_delimiter() {
        let mut row = ListingRow::new();
        row.set("C:Colour", CellValue::Text("Red||Blue".into()));
        row.set("Title", CellValue::Text("Widget".into()));
        let aspects = extract_aspects(&row);
        assert_eq!(
            aspects.get("Colour"),
            Some(&vec!["Red".to_string(), "Blue".to_string()])
        );
        assert_eq!(aspects.len(), 1);
    }

    #[test]
    fn numeric_aspect_becomes_single_value_list() {
        let mut row = ListingRow::new();
        row.set("C:Wattage", CellValue::Number(60.0));
        let aspects = extract_aspects(&row);
        assert_eq!(aspects.get("Wattage"), Some(&vec!["60".to_string()]));
    }

    #[test]
    fn empty_aspect_cells_are_dropped() {
        let mut row = ListingRow::new();
        row.set("C:Material", CellValue::Empty);
        row.set("C:", CellValue::Text("orphan".into()));
        assert!(extract_aspects(&row).is_empty());
    }
}
