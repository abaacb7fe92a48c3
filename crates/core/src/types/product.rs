//! Catalog products as served by the remote catalog API.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Aggregate review score for a product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Average score on a 0-5 scale.
    pub rate: f64,
    /// Number of reviews behind the average.
    pub count: u32,
}

/// A catalog product.
///
/// Products are read-only from the storefront's perspective: they are
/// fetched from the catalog and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Free-text category label (e.g., "electronics").
    pub category: String,
    pub price: Price,
    /// Image URL.
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

impl Product {
    /// Order products by descending rating, keeping catalog order for ties.
    ///
    /// Returns at most `limit` products.
    #[must_use]
    pub fn top_rated(products: &[Self], limit: usize) -> Vec<Self> {
        let mut sorted = products.to_vec();
        // `sort_by` is stable, so equal ratings keep fetch order.
        sorted.sort_by(|a, b| b.rating.rate.total_cmp(&a.rating.rate));
        sorted.truncate(limit);
        sorted
    }
}
