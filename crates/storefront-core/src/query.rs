// Turns the fetched catalog plus the list controls into the rows to show
use crate::models::{Category, Product, ProductQuery, SortOrder};

/// Derive the exact sequence of products to render.
///
/// Stages run in a fixed order: category, then search, then price sort.
/// `None` means the catalog hasn't arrived yet, which is just an empty list.
pub fn derive<'a>(products: Option<&'a [Product]>, query: &ProductQuery) -> Vec<&'a Product> {
    let Some(products) = products else {
        return Vec::new();
    };

    let filtered = filter_by_category(products.iter(), query.category);
    let searched = filter_by_search(filtered, &query.search);
    sort_by_price(searched, query.sort)
}

/// Owned variant of [`derive`] for callers that outlive the snapshot
pub fn derive_owned(products: Option<&[Product]>, query: &ProductQuery) -> Vec<Product> {
    derive(products, query).into_iter().cloned().collect()
}

pub fn filter_by_category<'a, I>(products: I, category: Option<Category>) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    match category {
        None => products.into_iter().collect(),
        Some(category) => products
            .into_iter()
            .filter(|p| matches_category(p, category.as_str()))
            .collect(),
    }
}

/// Case-insensitive equality; a product without a category never matches
pub fn matches_category(product: &Product, wanted: &str) -> bool {
    product
        .category
        .as_deref()
        .is_some_and(|c| c.to_lowercase() == wanted.to_lowercase())
}

/// Keep products whose title, description or category contains `search`.
///
/// Whitespace-only text means "no search". The needle itself is not trimmed,
/// so a trailing space narrows the match the same way typing it would.
pub fn filter_by_search<'a, I>(products: I, search: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    if search.trim().is_empty() {
        return products.into_iter().collect();
    }

    let needle = search.to_lowercase();
    products
        .into_iter()
        .filter(|p| matches_search(p, &needle))
        .collect()
}

/// `needle` must already be lower-cased
pub fn matches_search(product: &Product, needle: &str) -> bool {
    let contains = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(needle));

    contains(Some(product.title.as_str()))
        || contains(product.description.as_deref())
        || contains(product.category.as_deref())
}

/// Stable sort on the coerced numeric price; `Unspecified` leaves order alone
pub fn sort_by_price(mut products: Vec<&Product>, order: SortOrder) -> Vec<&Product> {
    match order {
        SortOrder::Unspecified => {}
        SortOrder::Ascending => products.sort_by(|a, b| a.price_value().total_cmp(&b.price_value())),
        SortOrder::Descending => products.sort_by(|a, b| b.price_value().total_cmp(&a.price_value())),
    }
    products
}
