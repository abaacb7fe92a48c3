//! Storefront orchestration: catalog loads, cart commands, and checkout.
//!
//! # Architecture
//!
//! - Four independently loading regions (categories, catalog, top-rated,
//!   product detail), each moving `Idle -> Loading -> Loaded | Errored`
//! - Last write wins per region: every load takes a generation number and
//!   a response is dropped if a newer load of the same region started
//!   meanwhile (stale responses neither render nor touch the cache)
//! - A session cache of known products resolves cart and detail lookups
//!   without a network call; full-catalog loads replace it, category loads
//!   add to it
//! - Failures stay inside their region and offer a retry [`Command`]
//!
//! All state sits behind short-lived locks that are never held across an
//! `.await`, so every operation takes `&self` and loads can run concurrently.

mod known;

pub use known::KnownProducts;

use core::fmt;
use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use swiftcart_core::{CategoryFilter, Product, ProductId};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cart::CartStore;
use crate::catalog::{CatalogError, CatalogSource};
use crate::error::{StorefrontError, add_breadcrumb};
use crate::render::Presenter;
use crate::view::{
    CartView, CategoryBarView, CheckoutSummary, Notice, ProductDetailView, Region, RegionError,
    product_cards,
};

/// Number of products in the top-rated strip.
pub const TOP_RATED_LIMIT: usize = 3;

const CATEGORIES_FAILED: &str = "Failed to load categories.";
const PRODUCTS_FAILED: &str = "Failed to load products. Please check your connection.";
const TOP_RATED_FAILED: &str = "Failed to load top rated products.";
const DETAILS_FAILED: &str = "Failed to load product details.";
const ADDED_TO_CART: &str = "Added to cart!";
const CART_EMPTY: &str = "Your cart is empty!";

// =============================================================================
// Commands
// =============================================================================

/// Loading state of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// A shopper intent.
///
/// Commands have a compact text form (`add-to-cart:3`,
/// `select-category:jewelery`, `checkout`) used in markup and on the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectCategory(CategoryFilter),
    RetryCategories,
    RetryTopRated,
    AddToCart(ProductId),
    BuyNow(ProductId),
    ShowDetails(ProductId),
    IncreaseQuantity(ProductId),
    DecreaseQuantity(ProductId),
    RemoveFromCart(ProductId),
    Checkout,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectCategory(filter) => write!(f, "select-category:{filter}"),
            Self::RetryCategories => f.write_str("retry-categories"),
            Self::RetryTopRated => f.write_str("retry-top-rated"),
            Self::AddToCart(id) => write!(f, "add-to-cart:{id}"),
            Self::BuyNow(id) => write!(f, "buy-now:{id}"),
            Self::ShowDetails(id) => write!(f, "show-details:{id}"),
            Self::IncreaseQuantity(id) => write!(f, "increase-quantity:{id}"),
            Self::DecreaseQuantity(id) => write!(f, "decrease-quantity:{id}"),
            Self::RemoveFromCart(id) => write!(f, "remove-from-cart:{id}"),
            Self::Checkout => f.write_str("checkout"),
        }
    }
}

/// Error returned when a command string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command: {0:?}")]
pub struct ParseCommandError(String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParseCommandError(s.to_string());
        let (name, arg) = s
            .split_once(':')
            .map_or((s, None), |(name, arg)| (name, Some(arg)));
        let id = || {
            arg.and_then(|raw| raw.parse::<ProductId>().ok())
                .ok_or_else(invalid)
        };

        match (name, arg) {
            ("select-category", Some(label)) if !label.trim().is_empty() => {
                Ok(Self::SelectCategory(CategoryFilter::from(label)))
            }
            ("retry-categories", None) => Ok(Self::RetryCategories),
            ("retry-top-rated", None) => Ok(Self::RetryTopRated),
            ("checkout", None) => Ok(Self::Checkout),
            ("add-to-cart", _) => id().map(Self::AddToCart),
            ("buy-now", _) => id().map(Self::BuyNow),
            ("show-details", _) => id().map(Self::ShowDetails),
            ("increase-quantity", _) => id().map(Self::IncreaseQuantity),
            ("decrease-quantity", _) => id().map(Self::DecreaseQuantity),
            ("remove-from-cart", _) => id().map(Self::RemoveFromCart),
            _ => Err(invalid()),
        }
    }
}

/// Result of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Nothing to order; the cart was left alone.
    EmptyCart,
    /// The shopper declined; the cart was left alone.
    Cancelled,
    /// The order was placed and the cart cleared.
    Placed(CheckoutSummary),
}

// =============================================================================
// Storefront
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct RegionStates {
    categories: LoadState,
    catalog: LoadState,
    top_rated: LoadState,
    detail: LoadState,
}

impl RegionStates {
    const fn get(&self, region: Region) -> LoadState {
        match region {
            Region::Categories => self.categories,
            Region::Catalog => self.catalog,
            Region::TopRated => self.top_rated,
            Region::Detail => self.detail,
        }
    }

    const fn set(&mut self, region: Region, state: LoadState) {
        match region {
            Region::Categories => self.categories = state,
            Region::Catalog => self.catalog = state,
            Region::TopRated => self.top_rated = state,
            Region::Detail => self.detail = state,
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    active_category: CategoryFilter,
    categories: Vec<String>,
    regions: RegionStates,
}

#[derive(Debug, Default)]
struct Generations {
    categories: AtomicU64,
    catalog: AtomicU64,
    top_rated: AtomicU64,
    detail: AtomicU64,
}

impl Generations {
    const fn of(&self, region: Region) -> &AtomicU64 {
        match region {
            Region::Categories => &self.categories,
            Region::Catalog => &self.catalog,
            Region::TopRated => &self.top_rated,
            Region::Detail => &self.detail,
        }
    }
}

/// Drives a storefront UI from a catalog and a persisted cart.
pub struct Storefront<C, P> {
    catalog: C,
    presenter: P,
    cart: CartStore,
    known: KnownProducts,
    view: Mutex<ViewState>,
    generations: Generations,
}

impl<C: CatalogSource, P: Presenter> Storefront<C, P> {
    /// Create a storefront. Nothing is loaded until [`Self::init`].
    pub fn new(catalog: C, presenter: P, cart: CartStore) -> Self {
        Self {
            catalog,
            presenter,
            cart,
            known: KnownProducts::new(),
            view: Mutex::new(ViewState::default()),
            generations: Generations::default(),
        }
    }

    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Products seen so far in this session.
    pub const fn known_products(&self) -> &KnownProducts {
        &self.known
    }

    /// Currently selected category filter.
    pub fn active_category(&self) -> CategoryFilter {
        self.view().active_category.clone()
    }

    /// Category labels from the last successful load.
    pub fn categories(&self) -> Vec<String> {
        self.view().categories.clone()
    }

    pub fn region_state(&self, region: Region) -> LoadState {
        self.view().regions.get(region)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Initial page load.
    ///
    /// Renders the persisted cart, loads categories and top-rated products
    /// concurrently, then loads the full catalog. Each region reports its
    /// own failure; none of them stops the others.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        self.refresh_cart_ui();
        tokio::join!(self.load_categories(), self.load_top_rated());
        self.load_products(CategoryFilter::All).await;
        info!(known_products = self.known.len(), "Storefront initialized");
    }

    /// Load the category bar.
    #[instrument(skip(self))]
    pub async fn load_categories(&self) {
        let generation = self.start_loading(Region::Categories);
        let result = self.catalog.fetch_categories().await;
        if self.is_stale(Region::Categories, generation) {
            return;
        }

        match result {
            Ok(categories) => {
                debug!(count = categories.len(), "Loaded categories");
                let bar = {
                    let mut view = self.view();
                    view.categories = categories;
                    view.regions.set(Region::Categories, LoadState::Loaded);
                    CategoryBarView::new(&view.categories, &view.active_category)
                };
                self.presenter.render_categories(&bar);
            }
            Err(e) => self.fail_region(
                Region::Categories,
                CATEGORIES_FAILED,
                Some(Command::RetryCategories),
                &e.into(),
            ),
        }
    }

    /// Select `category` and load the main grid with its products.
    ///
    /// `All` replaces the known-products cache; a named category adds to it.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn load_products(&self, category: CategoryFilter) {
        let bar = {
            let mut view = self.view();
            view.active_category = category.clone();
            (view.regions.get(Region::Categories) == LoadState::Loaded)
                .then(|| CategoryBarView::new(&view.categories, &view.active_category))
        };
        if let Some(bar) = bar {
            self.presenter.render_categories(&bar);
        }

        let generation = self.start_loading(Region::Catalog);
        let result = match &category {
            CategoryFilter::All => self.catalog.fetch_all_products().await,
            CategoryFilter::Named(name) => self.catalog.fetch_products_by_category(name).await,
        };
        if self.is_stale(Region::Catalog, generation) {
            return;
        }

        match result {
            Ok(products) => {
                match category {
                    CategoryFilter::All => self.known.replace_all(&products),
                    CategoryFilter::Named(_) => self.known.merge(&products),
                }
                debug!(count = products.len(), "Loaded products");
                self.set_state(Region::Catalog, LoadState::Loaded);
                self.presenter
                    .render_products(Region::Catalog, &product_cards(&products));
            }
            Err(e) => self.fail_region(
                Region::Catalog,
                PRODUCTS_FAILED,
                Some(Command::SelectCategory(category)),
                &e.into(),
            ),
        }
    }

    /// Load the top-rated strip from the full catalog.
    #[instrument(skip(self))]
    pub async fn load_top_rated(&self) {
        let generation = self.start_loading(Region::TopRated);
        let result = self.catalog.fetch_all_products().await;
        if self.is_stale(Region::TopRated, generation) {
            return;
        }

        match result {
            Ok(products) => {
                self.known.replace_all(&products);
                let top = Product::top_rated(&products, TOP_RATED_LIMIT);
                self.set_state(Region::TopRated, LoadState::Loaded);
                self.presenter
                    .render_products(Region::TopRated, &product_cards(&top));
            }
            Err(e) => self.fail_region(
                Region::TopRated,
                TOP_RATED_FAILED,
                Some(Command::RetryTopRated),
                &e.into(),
            ),
        }
    }

    // -------------------------------------------------------------------------
    // Product actions
    // -------------------------------------------------------------------------

    /// Add one unit of a product to the cart.
    ///
    /// Resolves the product from the session cache, falling back to a
    /// catalog lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be resolved. The shopper has
    /// already been notified and the cart is unchanged.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn handle_add_to_cart(&self, id: ProductId) -> Result<(), StorefrontError> {
        let product = match self.resolve_product(id).await {
            Ok(product) => product,
            Err(e) => {
                let error = StorefrontError::from(e);
                error.report();
                self.presenter
                    .notify(&Notice::error(error.shopper_message()));
                return Err(error);
            }
        };

        self.cart.add_to_cart(&product);
        let product_id = id.to_string();
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.refresh_cart_ui();
        self.presenter.notify(&Notice::success(ADDED_TO_CART));
        Ok(())
    }

    /// Add a product to the cart and open the cart drawer.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be resolved; the drawer stays
    /// closed.
    pub async fn buy_now(&self, id: ProductId) -> Result<(), StorefrontError> {
        self.handle_add_to_cart(id).await?;
        self.presenter.open_cart();
        Ok(())
    }

    /// Show the product detail dialog.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be resolved. The detail region
    /// shows the failure with a retry.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn handle_details_click(&self, id: ProductId) -> Result<(), StorefrontError> {
        let generation = self.start_loading(Region::Detail);
        let result = self.resolve_product(id).await;
        if self.is_stale(Region::Detail, generation) {
            return Ok(());
        }

        match result {
            Ok(product) => {
                let product_id = id.to_string();
                add_breadcrumb(
                    "navigation",
                    "Viewed product details",
                    Some(&[("product_id", product_id.as_str())]),
                );
                self.set_state(Region::Detail, LoadState::Loaded);
                self.presenter
                    .render_product_detail(&ProductDetailView::from(&product));
                Ok(())
            }
            Err(e) => {
                let error = StorefrontError::from(e);
                self.fail_region(
                    Region::Detail,
                    DETAILS_FAILED,
                    Some(Command::ShowDetails(id)),
                    &error,
                );
                Err(error)
            }
        }
    }

    async fn resolve_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.known.get(id) {
            return Ok(product);
        }
        debug!(product_id = %id, "Product not in session cache, fetching");
        let product = self.catalog.fetch_product_by_id(id).await?;
        self.known.insert(&product);
        Ok(product)
    }

    // -------------------------------------------------------------------------
    // Cart actions
    // -------------------------------------------------------------------------

    /// Add one unit to an existing cart line.
    pub fn increase_quantity(&self, id: ProductId) {
        self.cart.adjust_quantity(id, 1);
        self.refresh_cart_ui();
    }

    /// Remove one unit from a cart line; the last unit removes the line.
    pub fn decrease_quantity(&self, id: ProductId) {
        self.cart.adjust_quantity(id, -1);
        self.refresh_cart_ui();
    }

    /// Remove a cart line.
    pub fn remove_from_cart(&self, id: ProductId) {
        self.cart.remove_from_cart(id);
        let product_id = id.to_string();
        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.refresh_cart_ui();
    }

    /// Re-render the cart from storage.
    pub fn refresh_cart_ui(&self) {
        let view = CartView::from(&self.cart.snapshot());
        self.presenter.render_cart(&view);
    }

    /// Place the order for everything in the cart.
    ///
    /// An empty cart only raises a warning. Otherwise the shopper confirms
    /// the item count and total, and the cart is cleared only once they do.
    #[instrument(skip(self))]
    pub fn checkout(&self) -> CheckoutOutcome {
        let snapshot = self.cart.snapshot();
        if snapshot.cart.is_empty() {
            self.presenter.notify(&Notice::warning(CART_EMPTY));
            return CheckoutOutcome::EmptyCart;
        }

        let summary = CheckoutSummary {
            item_count: snapshot.count,
            total: snapshot.total,
        };
        if !self.presenter.confirm_checkout(&summary) {
            debug!("Checkout cancelled");
            return CheckoutOutcome::Cancelled;
        }

        self.cart.clear_cart();
        self.refresh_cart_ui();

        let total = summary.total.display();
        add_breadcrumb("checkout", "Order placed", Some(&[("total", total.as_str())]));
        info!(items = summary.item_count, total = %total, "Order placed");
        self.presenter.notify(&Notice::success(format!(
            "Order placed successfully! Total: {total}"
        )));
        CheckoutOutcome::Placed(summary)
    }

    /// Run a shopper command.
    ///
    /// # Errors
    ///
    /// Returns the error of a product action that could not resolve its
    /// product. Load failures are shown in their region and are not errors.
    pub async fn dispatch(&self, command: Command) -> Result<(), StorefrontError> {
        debug!(%command, "Dispatching command");
        match command {
            Command::SelectCategory(category) => {
                self.load_products(category).await;
                Ok(())
            }
            Command::RetryCategories => {
                self.load_categories().await;
                Ok(())
            }
            Command::RetryTopRated => {
                self.load_top_rated().await;
                Ok(())
            }
            Command::AddToCart(id) => self.handle_add_to_cart(id).await,
            Command::BuyNow(id) => self.buy_now(id).await,
            Command::ShowDetails(id) => self.handle_details_click(id).await,
            Command::IncreaseQuantity(id) => {
                self.increase_quantity(id);
                Ok(())
            }
            Command::DecreaseQuantity(id) => {
                self.decrease_quantity(id);
                Ok(())
            }
            Command::RemoveFromCart(id) => {
                self.remove_from_cart(id);
                Ok(())
            }
            Command::Checkout => {
                self.checkout();
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Region bookkeeping
    // -------------------------------------------------------------------------

    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, region: Region, state: LoadState) {
        self.view().regions.set(region, state);
    }

    /// Claim a new generation for `region` and show it loading.
    fn start_loading(&self, region: Region) -> u64 {
        let generation = self.generations.of(region).fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(region, LoadState::Loading);
        self.presenter.show_loading(region);
        generation
    }

    fn is_stale(&self, region: Region, generation: u64) -> bool {
        let current = self.generations.of(region).load(Ordering::SeqCst);
        if current != generation {
            debug!(
                region = region.as_str(),
                generation, current, "Discarding stale response"
            );
            return true;
        }
        false
    }

    fn fail_region(
        &self,
        region: Region,
        message: &str,
        retry: Option<Command>,
        error: &StorefrontError,
    ) {
        error.report();
        self.set_state(region, LoadState::Errored);
        self.presenter.show_error(
            region,
            &RegionError {
                message: message.to_string(),
                retry,
            },
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use swiftcart_core::{Price, Rating};
    use tokio::sync::Notify;

    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::catalog::CatalogOperation;
    use crate::view::{ProductCardView, ProductDetailView};

    // -------------------------------------------------------------------------
    // Test doubles
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct FakeCatalog {
        products: Vec<Product>,
        categories: Vec<String>,
        fail_categories: AtomicBool,
        /// Number of upcoming `fetch_all_products` calls that fail.
        failing_all_products: AtomicUsize,
        fail_by_id: AtomicBool,
        /// Fetches that wait for a notification before answering.
        gates: Mutex<HashMap<CatalogOperation, Arc<Notify>>>,
        by_id_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                products: vec![
                    product(1, "Backpack", "men's clothing", 3.9, 10995),
                    product(2, "Slim T-Shirt", "men's clothing", 4.1, 2230),
                    product(5, "Dragon Bracelet", "jewelery", 4.6, 69500),
                    product(6, "Gold Petite", "jewelery", 3.9, 16800),
                    product(9, "Portable Drive", "electronics", 3.3, 6400),
                    product(13, "Acer Monitor", "electronics", 2.9, 59900),
                ],
                categories: vec![
                    "electronics".to_string(),
                    "jewelery".to_string(),
                    "men's clothing".to_string(),
                ],
                ..Self::default()
            }
        }

        fn gate(&self, operation: CatalogOperation) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(operation, Arc::clone(&gate));
            gate
        }

        async fn wait_for(&self, operation: &CatalogOperation) {
            let gate = self.gates.lock().unwrap().get(operation).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    fn server_error(operation: CatalogOperation) -> CatalogError {
        CatalogError::Status {
            operation,
            status: 500,
        }
    }

    impl CatalogSource for FakeCatalog {
        async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
            let failing = self
                .failing_all_products
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(server_error(CatalogOperation::AllProducts));
            }
            Ok(self.products.clone())
        }

        async fn fetch_categories(&self) -> Result<Vec<String>, CatalogError> {
            self.wait_for(&CatalogOperation::Categories).await;
            if self.fail_categories.load(Ordering::SeqCst) {
                return Err(server_error(CatalogOperation::Categories));
            }
            Ok(self.categories.clone())
        }

        async fn fetch_products_by_category(
            &self,
            category: &str,
        ) -> Result<Vec<Product>, CatalogError> {
            self.wait_for(&CatalogOperation::ProductsByCategory(category.to_string()))
                .await;
            Ok(self
                .products
                .iter()
                .filter(|p| p.category == category)
                .cloned()
                .collect())
        }

        async fn fetch_product_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
            self.by_id_calls.fetch_add(1, Ordering::SeqCst);
            self.wait_for(&CatalogOperation::ProductById(id)).await;
            if self.fail_by_id.load(Ordering::SeqCst) {
                return Err(server_error(CatalogOperation::ProductById(id)));
            }
            self.products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(CatalogError::NotFound(id))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Loading(Region),
        Error(Region, RegionError),
        Categories(CategoryBarView),
        Products(Region, Vec<ProductCardView>),
        Detail(ProductDetailView),
        Cart(CartView),
        Notice(Notice),
        Confirm(CheckoutSummary),
        OpenCart,
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Mutex<Vec<Event>>,
        confirm: AtomicBool,
    }

    impl RecordingPresenter {
        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn last_products(&self, region: Region) -> Option<Vec<ProductCardView>> {
            self.events().into_iter().rev().find_map(|event| match event {
                Event::Products(r, cards) if r == region => Some(cards),
                _ => None,
            })
        }

        fn last_error(&self, region: Region) -> Option<RegionError> {
            self.events().into_iter().rev().find_map(|event| match event {
                Event::Error(r, error) if r == region => Some(error),
                _ => None,
            })
        }

        fn last_categories(&self) -> Option<CategoryBarView> {
            self.events().into_iter().rev().find_map(|event| match event {
                Event::Categories(bar) => Some(bar),
                _ => None,
            })
        }

        fn last_cart(&self) -> Option<CartView> {
            self.events().into_iter().rev().find_map(|event| match event {
                Event::Cart(cart) => Some(cart),
                _ => None,
            })
        }

        fn notices(&self) -> Vec<Notice> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    Event::Notice(notice) => Some(notice),
                    _ => None,
                })
                .collect()
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_loading(&self, region: Region) {
            self.record(Event::Loading(region));
        }

        fn show_error(&self, region: Region, error: &RegionError) {
            self.record(Event::Error(region, error.clone()));
        }

        fn render_categories(&self, bar: &CategoryBarView) {
            self.record(Event::Categories(bar.clone()));
        }

        fn render_products(&self, region: Region, products: &[ProductCardView]) {
            self.record(Event::Products(region, products.to_vec()));
        }

        fn render_product_detail(&self, product: &ProductDetailView) {
            self.record(Event::Detail(product.clone()));
        }

        fn render_cart(&self, cart: &CartView) {
            self.record(Event::Cart(cart.clone()));
        }

        fn notify(&self, notice: &Notice) {
            self.record(Event::Notice(notice.clone()));
        }

        fn confirm_checkout(&self, summary: &CheckoutSummary) -> bool {
            self.record(Event::Confirm(*summary));
            self.confirm.load(Ordering::SeqCst)
        }

        fn open_cart(&self) {
            self.record(Event::OpenCart);
        }
    }

    fn product(id: u32, title: &str, category: &str, rate: f64, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: format!("{title} description"),
            category: category.to_string(),
            price: Price::from_cents(cents),
            image: format!("https://img.example/{id}.jpg"),
            rating: Rating { rate, count: 100 },
        }
    }

    fn storefront(catalog: FakeCatalog) -> Storefront<FakeCatalog, RecordingPresenter> {
        Storefront::new(
            catalog,
            RecordingPresenter::default(),
            CartStore::new(MemoryCartStorage::new()),
        )
    }

    fn ids(cards: &[ProductCardView]) -> Vec<u32> {
        cards.iter().map(|card| card.id.as_u32()).collect()
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_init_loads_every_region() {
        let store = storefront(FakeCatalog::new());
        store.init().await;

        for region in [Region::Categories, Region::Catalog, Region::TopRated] {
            assert_eq!(store.region_state(region), LoadState::Loaded, "{region:?}");
        }
        assert_eq!(store.region_state(Region::Detail), LoadState::Idle);
        assert_eq!(store.known_products().len(), 6);
        assert_eq!(store.categories().len(), 3);

        let presenter = store.presenter();
        assert_eq!(
            presenter.last_products(Region::Catalog).map(|c| c.len()),
            Some(6)
        );
        assert_eq!(
            presenter.last_products(Region::TopRated).map(|c| ids(&c)),
            Some(vec![5, 2, 1])
        );
        assert_eq!(presenter.events().first(), Some(&Event::Cart(CartView::empty())));
    }

    #[tokio::test]
    async fn test_top_rated_failure_does_not_block_catalog() {
        let catalog = FakeCatalog::new();
        catalog.failing_all_products.store(1, Ordering::SeqCst);
        let store = storefront(catalog);

        store.init().await;

        assert_eq!(store.region_state(Region::TopRated), LoadState::Errored);
        assert_eq!(store.region_state(Region::Catalog), LoadState::Loaded);
        assert_eq!(
            store.presenter().last_error(Region::TopRated),
            Some(RegionError {
                message: "Failed to load top rated products.".to_string(),
                retry: Some(Command::RetryTopRated),
            })
        );

        store.dispatch(Command::RetryTopRated).await.unwrap();
        assert_eq!(store.region_state(Region::TopRated), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_category_failure_is_isolated() {
        let catalog = FakeCatalog::new();
        catalog.fail_categories.store(true, Ordering::SeqCst);
        let store = storefront(catalog);

        store.init().await;

        assert_eq!(store.region_state(Region::Categories), LoadState::Errored);
        assert_eq!(store.region_state(Region::Catalog), LoadState::Loaded);
        assert_eq!(store.region_state(Region::TopRated), LoadState::Loaded);
        let error = store.presenter().last_error(Region::Categories).unwrap();
        assert_eq!(error.message, "Failed to load categories.");
        assert_eq!(error.retry, Some(Command::RetryCategories));
    }

    #[tokio::test]
    async fn test_catalog_failure_offers_retry_for_same_category() {
        let catalog = FakeCatalog::new();
        catalog.failing_all_products.store(1, Ordering::SeqCst);
        let store = storefront(catalog);

        store.load_products(CategoryFilter::All).await;

        assert_eq!(store.region_state(Region::Catalog), LoadState::Errored);
        let error = store.presenter().last_error(Region::Catalog).unwrap();
        assert_eq!(
            error.message,
            "Failed to load products. Please check your connection."
        );
        assert_eq!(error.retry, Some(Command::SelectCategory(CategoryFilter::All)));
    }

    #[tokio::test]
    async fn test_category_loads_merge_and_all_replaces() {
        let store = storefront(FakeCatalog::new());

        store.load_products(CategoryFilter::from("jewelery")).await;
        assert_eq!(store.known_products().len(), 2);

        store.load_products(CategoryFilter::from("electronics")).await;
        assert_eq!(store.known_products().len(), 4);
        assert!(store.known_products().contains(ProductId::new(5)));
        assert_eq!(
            store.presenter().last_products(Region::Catalog).map(|c| ids(&c)),
            Some(vec![9, 13])
        );

        store.load_products(CategoryFilter::All).await;
        assert_eq!(store.known_products().len(), 6);
    }

    #[tokio::test]
    async fn test_selecting_category_highlights_it() {
        let store = storefront(FakeCatalog::new());
        store.init().await;

        store
            .dispatch(Command::SelectCategory(CategoryFilter::from("electronics")))
            .await
            .unwrap();

        assert_eq!(store.active_category(), CategoryFilter::from("electronics"));
        let bar = store.presenter().last_categories().unwrap();
        assert_eq!(bar.active().map(|o| o.label.as_str()), Some("electronics"));
    }

    #[tokio::test]
    async fn test_stale_catalog_response_is_discarded() {
        let catalog = FakeCatalog::new();
        let gate = catalog.gate(CatalogOperation::ProductsByCategory("jewelery".to_string()));
        let store = storefront(catalog);

        tokio::join!(
            store.load_products(CategoryFilter::from("jewelery")),
            async {
                store.load_products(CategoryFilter::All).await;
                gate.notify_one();
            }
        );

        assert_eq!(store.active_category(), CategoryFilter::All);
        assert_eq!(
            store.presenter().last_products(Region::Catalog).map(|c| c.len()),
            Some(6)
        );
        let catalog_renders = store
            .presenter()
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Products(Region::Catalog, _)))
            .count();
        assert_eq!(catalog_renders, 1);
        assert_eq!(store.region_state(Region::Catalog), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_init_loads_catalog_after_categories_and_top_rated() {
        let catalog = FakeCatalog::new();
        let gate = catalog.gate(CatalogOperation::Categories);
        let store = storefront(catalog);

        tokio::join!(store.init(), async {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            let events = store.presenter().events();
            assert!(
                events
                    .iter()
                    .any(|e| matches!(e, Event::Products(Region::TopRated, _)))
            );
            assert!(!events.contains(&Event::Loading(Region::Catalog)));
            gate.notify_one();
        });

        let events = store.presenter().events();
        let catalog_loading = events
            .iter()
            .position(|e| *e == Event::Loading(Region::Catalog))
            .unwrap();
        let categories = events
            .iter()
            .position(|e| matches!(e, Event::Categories(_)))
            .unwrap();
        let top_rated = events
            .iter()
            .position(|e| matches!(e, Event::Products(Region::TopRated, _)))
            .unwrap();
        assert!(categories < catalog_loading);
        assert!(top_rated < catalog_loading);
        assert_eq!(store.region_state(Region::Catalog), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_superseded_details_click_is_discarded() {
        let catalog = FakeCatalog::new();
        let gate = catalog.gate(CatalogOperation::ProductById(ProductId::new(5)));
        let store = storefront(catalog);

        let (first, second) = tokio::join!(
            store.handle_details_click(ProductId::new(5)),
            async {
                let result = store.handle_details_click(ProductId::new(2)).await;
                gate.notify_one();
                result
            }
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        let shown: Vec<ProductId> = store
            .presenter()
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Detail(detail) => Some(detail.id),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![ProductId::new(2)]);
        assert_eq!(store.region_state(Region::Detail), LoadState::Loaded);
    }

    // -------------------------------------------------------------------------
    // Product actions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_to_cart_uses_known_products() {
        let store = storefront(FakeCatalog::new());
        store.init().await;

        store.handle_add_to_cart(ProductId::new(2)).await.unwrap();
        store.handle_add_to_cart(ProductId::new(2)).await.unwrap();

        assert_eq!(store.catalog().by_id_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.cart().get_cart_count(), 2);
        let cart = store.presenter().last_cart().unwrap();
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.subtotal, "$44.60");
        assert_eq!(
            store.presenter().notices().last(),
            Some(&Notice::success("Added to cart!"))
        );
    }

    #[tokio::test]
    async fn test_add_to_cart_falls_back_to_catalog_lookup() {
        let store = storefront(FakeCatalog::new());

        store.handle_add_to_cart(ProductId::new(9)).await.unwrap();
        store.handle_add_to_cart(ProductId::new(9)).await.unwrap();

        assert_eq!(store.catalog().by_id_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.cart().get_cart_count(), 2);
    }

    #[tokio::test]
    async fn test_add_to_cart_failure_leaves_cart_unchanged() {
        let catalog = FakeCatalog::new();
        catalog.fail_by_id.store(true, Ordering::SeqCst);
        let store = storefront(catalog);

        let result = store.handle_add_to_cart(ProductId::new(1)).await;

        assert!(matches!(result, Err(StorefrontError::Catalog(_))));
        assert!(store.cart().get_cart().is_empty());
        let notice = store.presenter().notices().pop().unwrap();
        assert_eq!(notice, Notice::error("Failed to fetch product #1."));
    }

    #[tokio::test]
    async fn test_buy_now_opens_cart_only_on_success() {
        let store = storefront(FakeCatalog::new());

        store.dispatch(Command::BuyNow(ProductId::new(5))).await.unwrap();
        assert_eq!(store.presenter().events().last(), Some(&Event::OpenCart));

        let missing = store.buy_now(ProductId::new(404)).await;
        assert!(matches!(
            missing,
            Err(StorefrontError::Catalog(CatalogError::NotFound(_)))
        ));
        assert_ne!(store.presenter().events().last(), Some(&Event::OpenCart));
        assert_eq!(store.cart().get_cart_count(), 1);
    }

    #[tokio::test]
    async fn test_details_click_renders_detail() {
        let store = storefront(FakeCatalog::new());
        store.init().await;

        store.handle_details_click(ProductId::new(6)).await.unwrap();

        assert_eq!(store.region_state(Region::Detail), LoadState::Loaded);
        let detail = store
            .presenter()
            .events()
            .into_iter()
            .find_map(|e| match e {
                Event::Detail(detail) => Some(detail),
                _ => None,
            })
            .unwrap();
        assert_eq!(detail.title, "Gold Petite");
        assert_eq!(detail.price, "$168.00");
    }

    #[tokio::test]
    async fn test_details_failure_offers_retry() {
        let catalog = FakeCatalog::new();
        catalog.fail_by_id.store(true, Ordering::SeqCst);
        let store = storefront(catalog);

        assert!(store.handle_details_click(ProductId::new(3)).await.is_err());

        assert_eq!(store.region_state(Region::Detail), LoadState::Errored);
        let error = store.presenter().last_error(Region::Detail).unwrap();
        assert_eq!(error.retry, Some(Command::ShowDetails(ProductId::new(3))));
    }

    // -------------------------------------------------------------------------
    // Cart actions and checkout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_quantity_controls() {
        let store = storefront(FakeCatalog::new());
        store.init().await;
        let id = ProductId::new(1);
        store.handle_add_to_cart(id).await.unwrap();

        store.dispatch(Command::IncreaseQuantity(id)).await.unwrap();
        assert_eq!(store.cart().get_cart_count(), 2);

        store.decrease_quantity(id);
        store.decrease_quantity(id);
        assert!(store.cart().get_cart().is_empty());
        assert_eq!(store.presenter().last_cart(), Some(CartView::empty()));

        store.handle_add_to_cart(id).await.unwrap();
        store.dispatch(Command::RemoveFromCart(id)).await.unwrap();
        assert!(store.cart().get_cart().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_warns() {
        let store = storefront(FakeCatalog::new());

        assert_eq!(store.checkout(), CheckoutOutcome::EmptyCart);
        assert_eq!(
            store.presenter().notices(),
            vec![Notice::warning("Your cart is empty!")]
        );
        assert!(
            !store
                .presenter()
                .events()
                .iter()
                .any(|e| matches!(e, Event::Confirm(_)))
        );
    }

    #[tokio::test]
    async fn test_declined_checkout_keeps_cart() {
        let store = storefront(FakeCatalog::new());
        store.init().await;
        store.handle_add_to_cart(ProductId::new(2)).await.unwrap();

        assert_eq!(store.checkout(), CheckoutOutcome::Cancelled);
        assert_eq!(store.cart().get_cart_count(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_checkout_clears_cart() {
        let store = storefront(FakeCatalog::new());
        store.presenter().confirm.store(true, Ordering::SeqCst);
        store.init().await;
        store.handle_add_to_cart(ProductId::new(2)).await.unwrap();
        store.handle_add_to_cart(ProductId::new(2)).await.unwrap();
        store.handle_add_to_cart(ProductId::new(9)).await.unwrap();

        let outcome = store.checkout();

        let summary = CheckoutSummary {
            item_count: 3,
            total: Price::from_cents(10860),
        };
        assert_eq!(outcome, CheckoutOutcome::Placed(summary));
        assert!(store.presenter().events().contains(&Event::Confirm(summary)));
        assert!(store.cart().get_cart().is_empty());
        assert_eq!(store.presenter().last_cart(), Some(CartView::empty()));
        assert_eq!(
            store.presenter().notices().last(),
            Some(&Notice::success("Order placed successfully! Total: $108.60"))
        );
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    #[test]
    fn test_command_text_form() {
        for command in [
            Command::SelectCategory(CategoryFilter::All),
            Command::SelectCategory(CategoryFilter::from("men's clothing")),
            Command::RetryTopRated,
            Command::AddToCart(ProductId::new(3)),
            Command::DecreaseQuantity(ProductId::new(7)),
            Command::Checkout,
        ] {
            assert_eq!(command.to_string().parse::<Command>(), Ok(command));
        }
    }

    #[test]
    fn test_invalid_commands_are_rejected() {
        for raw in ["", "add-to-cart", "add-to-cart:abc", "checkout:1", "dance"] {
            assert!(raw.parse::<Command>().is_err(), "{raw}");
        }
        assert_eq!(
            "select-category:all".parse::<Command>(),
            Ok(Command::SelectCategory(CategoryFilter::All))
        );
    }
}
