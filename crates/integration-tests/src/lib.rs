//! Integration tests for SwiftCart.
//!
//! # Running Tests
//!
//! ```bash
//! # Against a local fake catalog API (no network needed)
//! cargo test -p swiftcart-integration-tests
//!
//! # Including tests against the public catalog API
//! cargo test -p swiftcart-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog_client` - HTTP client behavior: paths, status codes, caching
//! - `storefront_flow` - Full orchestrator runs with HTML rendering and a
//!   file-backed cart
//!
//! [`FakeCatalogApi`] serves the catalog endpoints from memory on a random
//! local port, counts requests per path, and can be told to answer any path
//! with a canned status and body.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use swiftcart_core::{Price, Product, ProductId, Rating};
use swiftcart_storefront::config::CatalogConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned answer for one path.
#[derive(Debug, Clone)]
struct Override {
    status: StatusCode,
    body: String,
    /// Requests left before the override expires; `None` never expires.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct ApiState {
    products: Vec<Product>,
    hits: Mutex<HashMap<String, usize>>,
    overrides: Mutex<HashMap<String, Override>>,
}

impl ApiState {
    /// Count a request and return the override answer, if any.
    fn hit(&self, uri: &Uri) -> Option<Response> {
        let path = uri.path().to_string();
        *lock(&self.hits).entry(path.clone()).or_default() += 1;

        let mut overrides = lock(&self.overrides);
        let answer = overrides.get_mut(&path)?;
        let response = (answer.status, answer.body.clone()).into_response();
        if let Some(remaining) = answer.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                overrides.remove(&path);
            }
        }
        Some(response)
    }

    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for product in &self.products {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        categories
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory catalog API served over HTTP.
pub struct FakeCatalogApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
    server: JoinHandle<()>,
}

impl FakeCatalogApi {
    /// Serve `products` on a random local port.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start(products: Vec<Product>) -> std::io::Result<Self> {
        let state = Arc::new(ApiState {
            products,
            ..ApiState::default()
        });

        let app = Router::new()
            .route("/products", get(all_products))
            .route("/products/categories", get(categories))
            .route("/products/category/{category}", get(products_by_category))
            .route("/products/{id}", get(product_by_id))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        // Serves until aborted on drop
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Serve the standard sample catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn with_sample_catalog() -> std::io::Result<Self> {
        Self::start(sample_products()).await
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn catalog_config(&self, cache_ttl: Duration) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url(),
            timeout: Some(Duration::from_secs(5)),
            cache_ttl,
        }
    }

    /// Number of requests received for `path` (as sent, percent-encoded).
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        lock(&self.state.hits).get(path).copied().unwrap_or_default()
    }

    /// Answer every request for `path` with `status` and `body`.
    pub fn respond_with(&self, path: &str, status: StatusCode, body: &str) {
        self.set_override(path, status, body, None);
    }

    /// Answer the next `times` requests for `path` with a 500.
    pub fn fail_next(&self, path: &str, times: usize) {
        if times == 0 {
            return;
        }
        self.set_override(
            path,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            Some(times),
        );
    }

    /// Serve `path` normally again.
    pub fn recover(&self, path: &str) {
        lock(&self.state.overrides).remove(path);
    }

    fn set_override(&self, path: &str, status: StatusCode, body: &str, remaining: Option<usize>) {
        lock(&self.state.overrides).insert(
            path.to_string(),
            Override {
                status,
                body: body.to_string(),
                remaining,
            },
        );
    }
}

impl Drop for FakeCatalogApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn all_products(State(state): State<Arc<ApiState>>, uri: Uri) -> Response {
    if let Some(response) = state.hit(&uri) {
        return response;
    }
    Json(state.products.clone()).into_response()
}

async fn categories(State(state): State<Arc<ApiState>>, uri: Uri) -> Response {
    if let Some(response) = state.hit(&uri) {
        return response;
    }
    Json(state.categories()).into_response()
}

async fn products_by_category(
    State(state): State<Arc<ApiState>>,
    Path(category): Path<String>,
    uri: Uri,
) -> Response {
    if let Some(response) = state.hit(&uri) {
        return response;
    }
    let products: Vec<Product> = state
        .products
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect();
    Json(products).into_response()
}

/// Unknown ids get a 200 with an empty body, like the public API.
async fn product_by_id(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    if let Some(response) = state.hit(&uri) {
        return response;
    }
    let product = id
        .parse::<ProductId>()
        .ok()
        .and_then(|id| state.products.iter().find(|p| p.id == id));
    match product {
        Some(product) => Json(product.clone()).into_response(),
        None => (StatusCode::OK, String::new()).into_response(),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A small catalog covering every category and a spread of ratings.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        sample(1, "Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops", "men's clothing", 10995, 3.9, 120),
        sample(2, "Mens Casual Premium Slim Fit T-Shirts", "men's clothing", 2230, 4.1, 259),
        sample(5, "John Hardy Women's Legends Naga Gold & Silver Dragon Station Chain Bracelet", "jewelery", 69500, 4.6, 400),
        sample(6, "Solid Gold Petite Micropave", "jewelery", 16800, 3.9, 70),
        sample(9, "WD 2TB Elements Portable External Hard Drive - USB 3.0", "electronics", 6400, 3.3, 203),
        sample(14, "Samsung 49-Inch CHG90 144Hz Curved Gaming Monitor", "electronics", 99999, 2.2, 140),
        sample(18, "MBJ Women's Solid Short Sleeve Boat Neck V", "women's clothing", 985, 4.7, 130),
    ]
}

fn sample(id: u32, title: &str, category: &str, cents: i64, rate: f64, count: u32) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: format!("{title}. Sample description."),
        category: category.to_string(),
        price: Price::from_cents(cents),
        image: format!("https://fakestoreapi.com/img/{id}.jpg"),
        rating: Rating { rate, count },
    }
}
