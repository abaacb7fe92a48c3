//! HTTP implementation of the catalog source.
//!
//! Uses `reqwest` 0.13 for HTTP and decodes bodies with `serde_json`.
//! Successful responses are cached using `moka`; failures never are, so a
//! retry always reaches the API.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use swiftcart_core::{Product, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, CatalogOperation, CatalogSource};
use crate::config::CatalogConfig;

/// Maximum number of cached responses.
const CACHE_CAPACITY: u64 = 1000;

/// Number of body characters kept in error logs.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the remote catalog API.
///
/// Cheaply cloneable; clones share the connection pool and response cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Get the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Fetch the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns a non-success status.
    #[instrument(skip(self))]
    pub async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let operation = CatalogOperation::AllProducts;
        let body = self.get("/products", &operation).await?;
        let products: Vec<Product> = decode(&body, &operation)?;

        self.store(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch the distinct category labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns a non-success status.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Vec<String>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cached(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let operation = CatalogOperation::Categories;
        let body = self.get("/products/categories", &operation).await?;
        let categories: Vec<String> = decode(&body, &operation)?;

        self.store(
            CacheKey::Categories,
            CacheValue::Categories(categories.clone()),
        )
        .await;
        Ok(categories)
    }

    /// Fetch the products in one category.
    ///
    /// The label is percent-encoded into the path, so labels such as
    /// "men's clothing" are safe to pass as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns a non-success status.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::Category(category.to_string());
        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(products);
        }

        let operation = CatalogOperation::ProductsByCategory(category.to_string());
        let path = format!("/products/category/{}", urlencoding::encode(category));
        let body = self.get(&path, &operation).await?;
        let products: Vec<Product> = decode(&body, &operation)?;

        self.store(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch a single product.
    ///
    /// The public catalog answers unknown ids with `200` and an empty body;
    /// that is reported as [`CatalogError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, the request fails, or
    /// the API returns a non-success status.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn fetch_product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let operation = CatalogOperation::ProductById(id);
        let body = self.get(&format!("/products/{id}"), &operation).await?;
        let product: Option<Product> = if body.trim().is_empty() {
            None
        } else {
            decode(&body, &operation)?
        };
        let product = product.ok_or(CatalogError::NotFound(id))?;

        self.store(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Issue a `GET` and return the body of a successful response.
    async fn get(&self, path: &str, operation: &CatalogOperation) -> Result<String, CatalogError> {
        let url = format!("{}{path}", self.inner.base_url);

        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                operation: operation.clone(),
                source,
            })?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Http {
                operation: operation.clone(),
                source,
            })?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                operation: operation.clone(),
                status: status.as_u16(),
            });
        }

        Ok(body)
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }
}

/// Decode a JSON body, logging the start of anything that does not parse.
fn decode<T: DeserializeOwned>(body: &str, operation: &CatalogOperation) -> Result<T, CatalogError> {
    serde_json::from_str(body).map_err(|source| {
        tracing::error!(
            error = %source,
            body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
            "Failed to parse catalog response"
        );
        CatalogError::Parse {
            operation: operation.clone(),
            source,
        }
    })
}

impl CatalogSource for CatalogClient {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Self::fetch_all_products(self).await
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, CatalogError> {
        Self::fetch_categories(self).await
    }

    async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        Self::fetch_products_by_category(self, category).await
    }

    async fn fetch_product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        Self::fetch_product_by_id(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base_url: &str, cache_ttl: Duration) -> CatalogConfig {
        CatalogConfig {
            base_url: base_url.to_string(),
            timeout: Some(Duration::from_secs(1)),
            cache_ttl,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            CatalogClient::new(&config("http://localhost:9/", Duration::ZERO)).expect("client");
        assert_eq!(client.base_url(), "http://localhost:9");
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let client =
            CatalogClient::new(&config("http://localhost:9", Duration::ZERO)).expect("client");
        assert!(client.inner.cache.is_none());

        let client = CatalogClient::new(&config("http://localhost:9", Duration::from_secs(60)))
            .expect("client");
        assert!(client.inner.cache.is_some());
    }

    #[test]
    fn test_decode_reports_operation_on_bad_json() {
        let err = decode::<Vec<Product>>("<html>", &CatalogOperation::AllProducts).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to fetch products: invalid response body"));
    }

    #[test]
    fn test_decode_null_product_is_none() {
        let product: Option<Product> =
            decode("null", &CatalogOperation::ProductById(ProductId::new(1))).expect("decode");
        assert!(product.is_none());
    }

    #[test]
    fn test_category_path_is_percent_encoded() {
        assert_eq!(
            urlencoding::encode("men's clothing"),
            "men%27s%20clothing"
        );
    }
}
