use chrono::{DateTime, Utc};
use serde::Serialize;

/// One product card lifted from a rendered search page.
///
/// Most fields are optional: the markup this comes from changes without
/// notice and partial data is preferred over dropping the card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_slug: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percentage: Option<u8>,
    pub pack_size: Option<String>,
    pub rating: Option<f64>,
    pub is_sponsored: bool,
    pub is_out_of_stock: bool,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

impl ProductRecord {
    /// A record is worth keeping only when at least one of name, current
    /// price or image survived extraction. Everything-absent shells are
    /// discarded by the extractor.
    pub fn has_substance(&self) -> bool {
        self.name.is_some() || self.current_price.is_some() || self.image_url.is_some()
    }
}

/// Discount derived from the two prices, used only when the markup itself
/// carries no discount badge. `original` must be strictly greater than
/// `current` for a discount to exist at all.
pub fn derive_discount_percentage(original: Option<f64>, current: Option<f64>) -> Option<u8> {
    match (original, current) {
        (Some(original), Some(current)) if original > current && original > 0.0 => {
            let percentage = ((original - current) / original * 100.0).round();
            Some(percentage.clamp(0.0, 100.0) as u8)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_discount_percentage, ProductRecord};
    use chrono::Utc;

    fn empty_record() -> ProductRecord {
        ProductRecord {
            product_id: "pos-0".to_string(),
            product_slug: None,
            name: None,
            image_url: None,
            current_price: None,
            original_price: None,
            discount_percentage: None,
            pack_size: None,
            rating: None,
            is_sponsored: false,
            is_out_of_stock: false,
            source_url: "https://blinkit.com/s/?q=milk".to_string(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn record_without_name_price_or_image_has_no_substance() {
        let record = empty_record();
        assert!(!record.has_substance());
    }

    #[test]
    fn record_with_only_a_price_has_substance() {
        let record = ProductRecord {
            current_price: Some(45.0),
            ..empty_record()
        };
        assert!(record.has_substance());
    }

    #[test]
    fn discount_rounds_to_nearest_percent() {
        assert_eq!(derive_discount_percentage(Some(150.0), Some(100.0)), Some(33));
        assert_eq!(derive_discount_percentage(Some(200.0), Some(150.0)), Some(25));
        assert_eq!(derive_discount_percentage(Some(99.0), Some(66.0)), Some(33));
    }

    #[test]
    fn discount_absent_when_original_not_greater() {
        assert_eq!(derive_discount_percentage(Some(100.0), Some(100.0)), None);
        assert_eq!(derive_discount_percentage(Some(90.0), Some(100.0)), None);
    }

    #[test]
    fn discount_absent_when_either_price_missing() {
        assert_eq!(derive_discount_percentage(None, Some(100.0)), None);
        assert_eq!(derive_discount_percentage(Some(100.0), None), None);
        assert_eq!(derive_discount_percentage(None, None), None);
    }
}
