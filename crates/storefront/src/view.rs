//! View models handed to the presenter.
//!
//! Plain data describing what to render. Everything is fully prepared
//! (prices formatted, titles truncated, stars counted) so a presenter only
//! has to lay it out.

use swiftcart_core::{CartLineItem, CategoryFilter, Price, Product, ProductId};

use crate::cart::CartSnapshot;
use crate::orchestrator::Command;

/// Maximum title length on product cards before truncation.
pub const CARD_TITLE_MAX_CHARS: usize = 40;

/// Number of stars in a rating display.
const STAR_SLOTS: u8 = 5;

/// An independently loading area of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Category filter bar.
    Categories,
    /// Main product grid.
    Catalog,
    /// Top-rated products strip.
    TopRated,
    /// Product detail dialog.
    Detail,
}

impl Region {
    /// Stable identifier used in markup and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Catalog => "catalog",
            Self::TopRated => "top-rated",
            Self::Detail => "detail",
        }
    }
}

/// A failed region with an optional way to retry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionError {
    pub message: String,
    pub retry: Option<Command>,
}

// =============================================================================
// Ratings
// =============================================================================

/// Star breakdown for a 0-5 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    /// Whole stars, plus a half star when the remainder is at least 0.5.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        let rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, f64::from(STAR_SLOTS))
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
        let full = rate.floor() as u8;
        let half = rate.fract() >= 0.5;
        let empty = STAR_SLOTS - full - u8::from(half);
        Self { full, half, empty }
    }

    /// CSS classes for each star icon, in display order.
    #[must_use]
    pub fn icons(&self) -> Vec<&'static str> {
        let mut icons = Vec::with_capacity(usize::from(STAR_SLOTS));
        icons.extend(std::iter::repeat_n("fa-solid fa-star", usize::from(self.full)));
        if self.half {
            icons.push("fa-solid fa-star-half-stroke");
        }
        icons.extend(std::iter::repeat_n("fa-regular fa-star", usize::from(self.empty)));
        icons
    }
}

// =============================================================================
// Products
// =============================================================================

/// Product card in a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: ProductId,
    /// Title shortened to [`CARD_TITLE_MAX_CHARS`].
    pub title: String,
    /// Untruncated title, for image alt text.
    pub full_title: String,
    pub category: String,
    pub price: String,
    pub image: String,
    pub stars: StarRating,
    pub rating_count: u32,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: truncate_title(&product.title, CARD_TITLE_MAX_CHARS),
            full_title: product.title.clone(),
            category: product.category.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            stars: StarRating::from_rate(product.rating.rate),
            rating_count: product.rating.count,
        }
    }
}

/// Full product details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub stars: StarRating,
    /// Average score as shown next to the stars (e.g., "3.9").
    pub rating_rate: String,
    pub rating_count: u32,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            stars: StarRating::from_rate(product.rating.rate),
            rating_rate: product.rating.rate.to_string(),
            rating_count: product.rating.count,
        }
    }
}

/// Cards for a list of products, in order.
#[must_use]
pub fn product_cards(products: &[Product]) -> Vec<ProductCardView> {
    products.iter().map(ProductCardView::from).collect()
}

/// Shorten `title` to `max_chars` characters plus an ellipsis.
#[must_use]
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut short: String = title.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

// =============================================================================
// Categories
// =============================================================================

/// One button in the category bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    /// Button text.
    pub label: String,
    /// Filter selected by the button.
    pub filter: CategoryFilter,
    pub active: bool,
}

/// The category bar: "All" followed by each catalog category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBarView {
    pub options: Vec<CategoryOption>,
}

impl CategoryBarView {
    /// Build the bar with `active` highlighted.
    #[must_use]
    pub fn new(categories: &[String], active: &CategoryFilter) -> Self {
        let all = CategoryOption {
            label: "All".to_string(),
            filter: CategoryFilter::All,
            active: *active == CategoryFilter::All,
        };
        let options = std::iter::once(all)
            .chain(categories.iter().map(|category| {
                let filter = CategoryFilter::from(category.as_str());
                CategoryOption {
                    label: category.clone(),
                    active: *active == filter,
                    filter,
                }
            }))
            .collect();
        Self { options }
    }

    /// The highlighted option, if any.
    #[must_use]
    pub fn active(&self) -> Option<&CategoryOption> {
        self.options.iter().find(|option| option.active)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLineItem> for CartItemView {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.id(),
            title: line.product.title.clone(),
            image: line.product.image.clone(),
            quantity: line.quantity,
            price: line.product.price.display(),
            line_price: line.line_total().display(),
        }
    }
}

/// Cart display data: lines, badge count, and total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::ZERO.display(),
            item_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot.cart.items().iter().map(CartItemView::from).collect(),
            subtotal: snapshot.total.display(),
            item_count: snapshot.count,
        }
    }
}

/// What the shopper is asked to confirm at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub item_count: u32,
    pub total: Price,
}

impl CheckoutSummary {
    /// Confirmation prompt text.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Order Details:\n\nItems: {}\nTotal: {}\n\nConfirm your order?",
            self.item_count,
            self.total.display()
        )
    }
}

// =============================================================================
// Notices
// =============================================================================

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A transient message for the shopper (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
