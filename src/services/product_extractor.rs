use chrono::Utc;
use itertools::Itertools;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::product::{derive_discount_percentage, ProductRecord};

/// Card containers, most specific first. Curated against the current
/// blinkit.com search page markup; revisit whenever the site ships a
/// redesign.
pub const CARD_SELECTORS: &[&str] = &[
    "div[data-test-id='plp-product']",
    "div[id='plpContainer'] > div[role='button']",
    "div.plp-product",
];

const NAME_SELECTORS: &[&str] = &[
    "div[class*='Product__UpdatedTitle']",
    "div.plp-product__name",
    "div[class*='ProductName']",
];

const ORIGINAL_PRICE_SELECTOR: &str =
    "span[class*='mrp'], span[class*='Mrp'], span[style*='line-through'], del";

const DISCOUNT_BADGE_SELECTOR: &str =
    "div[class*='Offer'], div[class*='discount'], span[class*='DiscountTag']";

const PACK_SIZE_SELECTOR: &str =
    "div[class*='plp-product__quantity'], div[class*='PackSize'], span[class*='Variant']";

const RATING_SELECTOR: &str = "div[class*='Rating'], span[class*='rating']";

const SPONSORED_SELECTOR: &str =
    "div[data-test-id='sponsored-tag'], span[class*='Sponsored'], div[class*='AdBadge']";

const OUT_OF_STOCK_SELECTOR: &str =
    "div[class*='out-of-stock'], div[class*='OutOfStock'], span[class*='sold-out']";

/// Walks every product card in a page-source snapshot and lifts whatever
/// fields survived rendering. Pure: no browser, no network.
pub fn extract_products(html: &str, page_url: &str) -> Vec<ProductRecord> {
    let document = Html::parse_document(html);

    let anchor_selector = Selector::parse("a[href]").unwrap();
    let span_selector = Selector::parse("span").unwrap();
    let image_selector = Selector::parse("img").unwrap();
    let original_price_selector = Selector::parse(ORIGINAL_PRICE_SELECTOR).unwrap();
    let discount_badge_selector = Selector::parse(DISCOUNT_BADGE_SELECTOR).unwrap();
    let pack_size_selector = Selector::parse(PACK_SIZE_SELECTOR).unwrap();
    let rating_selector = Selector::parse(RATING_SELECTOR).unwrap();
    let sponsored_selector = Selector::parse(SPONSORED_SELECTOR).unwrap();
    let out_of_stock_selector = Selector::parse(OUT_OF_STOCK_SELECTOR).unwrap();

    let cards = select_cards(&document);
    let mut products = Vec::with_capacity(cards.len());

    for (position, card) in cards.into_iter().enumerate() {
        let anchor = card.select(&anchor_selector).next();
        let href = anchor.and_then(|a| a.value().attr("href"));
        let (product_id, product_slug) = derive_identity(href, position);

        let image = card.select(&image_selector).next();
        let image_url = image
            .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .map(|src| src.to_string())
            .filter(|src| !src.is_empty());

        let name = extract_name(&card, anchor, image);

        let current_price = card
            .select(&span_selector)
            .find_map(|span| parse_price(&element_text(&span)));

        let original_price = card
            .select(&original_price_selector)
            .find_map(|span| parse_price(&element_text(&span)))
            .filter(|original| match current_price {
                Some(current) => *original > current,
                None => true,
            });

        let discount_percentage = card
            .select(&discount_badge_selector)
            .find_map(|badge| parse_discount_badge(&element_text(&badge)))
            .or_else(|| derive_discount_percentage(original_price, current_price));

        let pack_size = card
            .select(&pack_size_selector)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty());

        let rating = card
            .select(&rating_selector)
            .next()
            .and_then(|el| parse_rating(&element_text(&el)));

        let is_sponsored = card.select(&sponsored_selector).next().is_some();
        let is_out_of_stock = card.select(&out_of_stock_selector).next().is_some();

        let record = ProductRecord {
            product_id,
            product_slug,
            name,
            image_url,
            current_price,
            original_price,
            discount_percentage,
            pack_size,
            rating,
            is_sponsored,
            is_out_of_stock,
            source_url: resolve_source_url(page_url, href),
            captured_at: Utc::now(),
        };

        if record.has_substance() {
            products.push(record);
        }
    }

    products
        .into_iter()
        .unique_by(|p| p.product_id.clone())
        .collect()
}

/// First card selector that matches anything wins; later entries are
/// fallbacks for older markup revisions.
fn select_cards(document: &Html) -> Vec<ElementRef<'_>> {
    for selector in CARD_SELECTORS {
        let selector = Selector::parse(selector).unwrap();
        let cards: Vec<ElementRef> = document.select(&selector).collect();
        if !cards.is_empty() {
            return cards;
        }
    }
    vec![]
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn extract_name(
    card: &ElementRef,
    anchor: Option<ElementRef>,
    image: Option<ElementRef>,
) -> Option<String> {
    for selector in NAME_SELECTORS {
        let selector = Selector::parse(selector).unwrap();
        if let Some(text) = card
            .select(&selector)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
        {
            return Some(text);
        }
    }

    anchor
        .and_then(|a| a.value().attr("title"))
        .or_else(|| image.and_then(|img| img.value().attr("alt")))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Product id and slug from the card's anchor.
///
/// Pattern A is the current product URL shape `/prn/<slug>/prid/<id>`;
/// pattern B is the older `/<category>/<slug>/<numeric-id>` shape. When
/// neither matches, the card's position in the listing stands in as id.
fn derive_identity(href: Option<&str>, position: usize) -> (String, Option<String>) {
    if let Some(href) = href {
        let path = href.split(['?', '#']).next().unwrap_or(href);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if let Some(prn) = segments.iter().position(|s| *s == "prn") {
            let slug = segments.get(prn + 1);
            let id = segments
                .iter()
                .position(|s| *s == "prid")
                .and_then(|prid| segments.get(prid + 1));
            if let (Some(slug), Some(id)) = (slug, id) {
                return ((*id).to_string(), Some((*slug).to_string()));
            }
        }

        if let [.., slug, id] = segments.as_slice() {
            if id.chars().all(|c| c.is_ascii_digit()) && !id.is_empty() {
                return ((*id).to_string(), Some((*slug).to_string()));
            }
        }
    }

    (format!("pos-{}", position), None)
}

fn resolve_source_url(page_url: &str, href: Option<&str>) -> String {
    href.and_then(|href| {
        Url::parse(page_url)
            .ok()
            .and_then(|base| base.join(href).ok())
            .map(|url| url.to_string())
    })
    .unwrap_or_else(|| page_url.to_string())
}

/// First currency-prefixed numeric token in the text, thousands
/// separators stripped. Text with no currency token has no price.
pub fn parse_price(text: &str) -> Option<f64> {
    let price_pattern = Regex::new(r"(?:₹|Rs\.?)\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap();
    let captures = price_pattern.captures(text)?;
    captures[1].replace(',', "").parse().ok()
}

/// First decimal-looking substring, accepted only inside the 0.0–5.0
/// star scale.
pub fn parse_rating(text: &str) -> Option<f64> {
    let number_pattern = Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap();
    let value: f64 = number_pattern.find(text)?.as_str().parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

fn parse_discount_badge(text: &str) -> Option<u8> {
    let percent_pattern = Regex::new(r"([0-9]{1,3})\s*%").unwrap();
    let value: u8 = percent_pattern.captures(text)?[1].parse().ok()?;
    (value <= 100).then_some(value)
}
