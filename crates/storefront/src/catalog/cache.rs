//! Cache types for catalog API responses.

use swiftcart_core::{Product, ProductId};

/// Cache key, one per distinct request.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Categories,
    Category(String),
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Categories(Vec<String>),
    Product(Box<Product>),
}
