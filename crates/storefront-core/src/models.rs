use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Stable product identifier, the join key for favorites and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ProductId)
            .map_err(|_| Error::InvalidProductId(s.to_string()))
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId(id)
    }
}

/// Product snapshot as received from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
}

impl Product {
    /// Minimal product, handy for tests and fixtures
    pub fn new(id: impl Into<ProductId>, title: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: Price::Number(price),
            description: None,
            category: None,
            image: None,
            rating: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Numeric price used for sorting
    pub fn price_value(&self) -> f64 {
        self.price.value()
    }
}

/// Price as the API delivered it; sometimes a number, sometimes a string
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl Price {
    /// Coerce to a number. Strings are read up to the first character that
    /// can't continue a number; anything unreadable counts as 0.
    pub fn value(&self) -> f64 {
        let raw = match self {
            Price::Number(n) => Some(*n),
            Price::Text(text) => parse_leading_float(text),
            Price::Missing => None,
        };
        match raw {
            Some(n) if !n.is_nan() => n,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(n) => write!(f, "${:.2}", n),
            Price::Text(text) => write!(f, "${}", text.trim()),
            Price::Missing => write!(f, "$0.00"),
        }
    }
}

fn parse_leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // exponent only counts when digits follow it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub count: u64,
}

/// Five-star breakdown of a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl Rating {
    pub fn stars(&self) -> StarRating {
        let rate = if self.rate.is_finite() { self.rate.clamp(0.0, 5.0) } else { 0.0 };
        let full = rate.floor() as u8;
        let half = full < 5 && rate.fract() >= 0.5;
        let empty = 5 - full - u8::from(half);
        StarRating { full, half, empty }
    }
}

impl StarRating {
    /// Render as text, e.g. `★★★½☆`
    pub fn render(&self) -> String {
        let mut out = "★".repeat(self.full as usize);
        if self.half {
            out.push('½');
        }
        out.push_str(&"☆".repeat(self.empty as usize));
        out
    }
}

/// The fixed set of catalog categories offered as filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    MensClothing,
    WomensClothing,
    Jewelery,
    Electronics,
}

impl Category {
    /// Value as the API spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MensClothing => "men's clothing",
            Category::WomensClothing => "women's clothing",
            Category::Jewelery => "jewelery",
            Category::Electronics => "electronics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::MensClothing => "Men's Clothing",
            Category::WomensClothing => "Women's Clothing",
            Category::Jewelery => "Jewelery",
            Category::Electronics => "Electronics",
        }
    }

    pub fn all() -> Vec<Category> {
        vec![
            Category::MensClothing,
            Category::WomensClothing,
            Category::Jewelery,
            Category::Electronics,
        ]
    }

    /// Cycle through the filter options: none -> each category -> none
    pub fn cycle(current: Option<Category>) -> Option<Category> {
        let all = Self::all();
        match current {
            None => all.first().copied(),
            Some(category) => all
                .iter()
                .position(|c| *c == category)
                .and_then(|i| all.get(i + 1).copied()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|c| c.as_str() == wanted || c.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                let options: Vec<_> = Self::all().iter().map(|c| c.as_str()).collect();
                Error::ConfigError(format!(
                    "Unknown category '{}'. Expected one of: {}",
                    s,
                    options.join(", ")
                ))
            })
    }
}

/// Price ordering for the product list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Keep the order the catalog returned
    #[default]
    Unspecified,
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Unspecified => "",
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Unspecified => "Sort by Price",
            SortOrder::Ascending => "Price: Low to High",
            SortOrder::Descending => "Price: High to Low",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortOrder::Unspecified => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Unspecified,
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(SortOrder::Unspecified),
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(Error::ConfigError(format!(
                "Unknown sort order '{}'. Expected asc or desc",
                other
            ))),
        }
    }
}

/// Everything the product list is filtered and ordered by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Already-debounced search text
    pub search: String,
    pub category: Option<Category>,
    pub sort: SortOrder,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_coercion() {
        assert_eq!(Price::Number(19.99).value(), 19.99);
        assert_eq!(Price::Text("15.99".into()).value(), 15.99);
        assert_eq!(Price::Text(" 12.50 USD".into()).value(), 12.5);
        assert_eq!(Price::Text("1e2".into()).value(), 100.0);
        assert_eq!(Price::Text("3e".into()).value(), 3.0);
        assert_eq!(Price::Text("abc".into()).value(), 0.0);
        assert_eq!(Price::Text(".".into()).value(), 0.0);
        assert_eq!(Price::Missing.value(), 0.0);
        assert_eq!(Price::Number(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_product_deserializes_with_gaps() {
        let product: Product =
            serde_json::from_str(r#"{ "id": 9, "title": "Mystery box", "price": null }"#).unwrap();
        assert_eq!(product.id, ProductId(9));
        assert_eq!(product.price, Price::Missing);
        assert_eq!(product.price_value(), 0.0);
        assert!(product.category.is_none());
        assert!(product.rating.is_none());
    }

    #[test]
    fn test_product_id_parsing() {
        assert_eq!("42".parse::<ProductId>().unwrap(), ProductId(42));
        assert_eq!(" 7 ".parse::<ProductId>().unwrap(), ProductId(7));
        assert!("abc".parse::<ProductId>().is_err());
        assert!("-1".parse::<ProductId>().is_err());
        assert!("".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_star_breakdown() {
        let stars = Rating { rate: 3.9, count: 120 }.stars();
        assert_eq!(stars, StarRating { full: 3, half: true, empty: 1 });
        assert_eq!(stars.render(), "★★★½☆");

        let stars = Rating { rate: 4.2, count: 1 }.stars();
        assert_eq!(stars, StarRating { full: 4, half: false, empty: 1 });

        let stars = Rating { rate: 5.0, count: 1 }.stars();
        assert_eq!(stars, StarRating { full: 5, half: false, empty: 0 });

        let stars = Rating { rate: 9.0, count: 1 }.stars();
        assert_eq!(stars.full + stars.empty + u8::from(stars.half), 5);
    }

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("Men's Clothing".parse::<Category>().unwrap(), Category::MensClothing);
        assert_eq!("ELECTRONICS".parse::<Category>().unwrap(), Category::Electronics);
        assert!("garden".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_cycle_wraps_to_none() {
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..5 {
            current = Category::cycle(current);
            seen.push(current);
        }
        assert_eq!(seen[0], Some(Category::MensClothing));
        assert_eq!(seen[3], Some(Category::Electronics));
        assert_eq!(seen[4], None);
    }

    #[test]
    fn test_sort_order_values() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Unspecified);
        assert_eq!(SortOrder::Descending.next(), SortOrder::Unspecified);
        assert_eq!(SortOrder::Ascending.as_str(), "asc");
    }
}
