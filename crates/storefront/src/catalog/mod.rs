//! Remote catalog API client.
//!
//! # Architecture
//!
//! - Four read-only `GET` calls against one base endpoint
//! - The catalog is the source of truth: products are never written back
//! - In-memory caching via `moka` for successful responses (configurable TTL)
//! - No retries: a failed call is reported to the caller, which decides
//!   whether to offer a retry
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/products                      - Full catalog
//! GET {base}/products/categories           - Category labels
//! GET {base}/products/category/{category}  - Products in one category
//! GET {base}/products/{id}                 - One product
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use swiftcart_storefront::catalog::{CatalogClient, CatalogSource};
//!
//! let client = CatalogClient::new(&config.catalog)?;
//! let products = client.fetch_products_by_category("electronics").await?;
//! ```

mod cache;
mod client;

pub use client::CatalogClient;

use core::fmt;
use std::future::Future;

use swiftcart_core::{Product, ProductId};
use thiserror::Error;

/// A catalog read, named the way failures are reported to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    AllProducts,
    Categories,
    ProductsByCategory(String),
    ProductById(ProductId),
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllProducts => f.write_str("Failed to fetch products"),
            Self::Categories => f.write_str("Failed to fetch categories"),
            Self::ProductsByCategory(category) => {
                write!(f, "Failed to fetch products for {category}")
            }
            Self::ProductById(id) => write!(f, "Failed to fetch product #{id}"),
        }
    }
}

/// Errors that can occur when reading from the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API answered with a non-success status.
    #[error("{operation} (HTTP {status})")]
    Status {
        operation: CatalogOperation,
        status: u16,
    },

    /// The request never produced a response (connect, timeout, body read).
    #[error("{operation}: {source}")]
    Http {
        operation: CatalogOperation,
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON.
    #[error("{operation}: invalid response body: {source}")]
    Parse {
        operation: CatalogOperation,
        source: serde_json::Error,
    },

    /// The API answered successfully but with no product.
    #[error("Failed to fetch product #{0}: not found")]
    NotFound(ProductId),
}

impl CatalogError {
    /// The operation that failed.
    #[must_use]
    pub fn operation(&self) -> CatalogOperation {
        match self {
            Self::Status { operation, .. }
            | Self::Http { operation, .. }
            | Self::Parse { operation, .. } => operation.clone(),
            Self::NotFound(id) => CatalogOperation::ProductById(*id),
        }
    }
}

/// Read access to a product catalog.
///
/// Implemented by [`CatalogClient`] for the HTTP API; the orchestrator is
/// generic over this trait so it can run against in-memory catalogs.
pub trait CatalogSource: Send + Sync {
    /// Fetch every product in the catalog.
    fn fetch_all_products(&self)
    -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// Fetch the distinct category labels.
    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<String>, CatalogError>> + Send;

    /// Fetch the products whose category equals `category`.
    fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// Fetch a single product.
    fn fetch_product_by_id(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}
