//! Server-side HTML rendering of storefront regions.
//!
//! Each presenter call renders one region with Askama and keeps the markup,
//! so the latest state of every region can be assembled into a full page.

use std::sync::{Mutex, MutexGuard, PoisonError};

use askama::Template;

use super::Presenter;
use crate::error::StorefrontError;
use crate::filters;
use crate::view::{
    CartView, CategoryBarView, CategoryOption, CheckoutSummary, Notice, ProductCardView,
    ProductDetailView, Region, RegionError,
};

/// How [`HtmlRenderer`] answers checkout confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPolicy {
    /// Decline every order.
    #[default]
    Decline,
    /// Accept every order.
    AutoConfirm,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "regions/loading.html")]
struct LoadingTemplate<'a> {
    region: &'a str,
}

#[derive(Template)]
#[template(path = "regions/error.html")]
struct ErrorTemplate<'a> {
    region: &'a str,
    message: &'a str,
    retry: Option<String>,
}

#[derive(Template)]
#[template(path = "regions/categories.html")]
struct CategoriesTemplate<'a> {
    options: &'a [CategoryOption],
}

#[derive(Template)]
#[template(path = "regions/products.html")]
struct ProductsTemplate<'a> {
    region: &'a str,
    products: &'a [ProductCardView],
}

#[derive(Template)]
#[template(path = "regions/product_detail.html")]
struct ProductDetailTemplate<'a> {
    product: &'a ProductDetailView,
}

#[derive(Template)]
#[template(path = "regions/cart.html")]
struct CartTemplate<'a> {
    cart: &'a CartView,
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    categories: &'a str,
    top_rated: &'a str,
    catalog: &'a str,
    detail: &'a str,
    cart: &'a str,
    cart_count: u32,
    cart_open: bool,
    notices: &'a [Notice],
}

// =============================================================================
// HtmlRenderer
// =============================================================================

#[derive(Debug, Default)]
struct RenderedPage {
    categories: String,
    catalog: String,
    top_rated: String,
    detail: String,
    cart: String,
    cart_count: u32,
    cart_open: bool,
    notices: Vec<Notice>,
    /// Notices raised since the page was last rendered.
    unshown_notices: usize,
    prompts: Vec<String>,
}

impl RenderedPage {
    fn region_mut(&mut self, region: Region) -> &mut String {
        match region {
            Region::Categories => &mut self.categories,
            Region::Catalog => &mut self.catalog,
            Region::TopRated => &mut self.top_rated,
            Region::Detail => &mut self.detail,
        }
    }

    fn region(&self, region: Region) -> &str {
        match region {
            Region::Categories => &self.categories,
            Region::Catalog => &self.catalog,
            Region::TopRated => &self.top_rated,
            Region::Detail => &self.detail,
        }
    }
}

/// Presenter that renders every region to HTML.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    page: Mutex<RenderedPage>,
    checkout_policy: CheckoutPolicy,
}

impl HtmlRenderer {
    #[must_use]
    pub fn new(checkout_policy: CheckoutPolicy) -> Self {
        Self {
            page: Mutex::new(RenderedPage::default()),
            checkout_policy,
        }
    }

    /// Latest markup of a region (empty until it first renders).
    #[must_use]
    pub fn region_html(&self, region: Region) -> String {
        self.page().region(region).to_string()
    }

    /// Latest cart drawer markup.
    #[must_use]
    pub fn cart_html(&self) -> String {
        self.page().cart.clone()
    }

    /// Units shown on the cart badge.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.page().cart_count
    }

    #[must_use]
    pub fn is_cart_open(&self) -> bool {
        self.page().cart_open
    }

    /// Notices shown so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.page().notices.clone()
    }

    /// Checkout prompts shown so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.page().prompts.clone()
    }

    /// Assemble the full page from the latest region markup.
    ///
    /// Each notice appears on the first page rendered after it was raised.
    ///
    /// # Errors
    ///
    /// Returns an error if the page template fails to render.
    pub fn render_page(&self, title: &str) -> Result<String, askama::Error> {
        let mut page = self.page();
        let first_unshown = page.notices.len().saturating_sub(page.unshown_notices);
        let html = PageTemplate {
            title,
            categories: &page.categories,
            top_rated: &page.top_rated,
            catalog: &page.catalog,
            detail: &page.detail,
            cart: &page.cart,
            cart_count: page.cart_count,
            cart_open: page.cart_open,
            notices: page.notices.get(first_unshown..).unwrap_or_default(),
        }
        .render()?;
        page.unshown_notices = 0;
        Ok(html)
    }

    fn page(&self) -> MutexGuard<'_, RenderedPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_region(&self, region: Region, template: &impl Template) {
        let html = render_or_report(template);
        *self.page().region_mut(region) = html;
    }
}

/// Render a template; failures are reported and leave the region blank.
fn render_or_report(template: &impl Template) -> String {
    template.render().unwrap_or_else(|e| {
        StorefrontError::from(e).report();
        String::new()
    })
}

impl Presenter for HtmlRenderer {
    fn show_loading(&self, region: Region) {
        self.set_region(
            region,
            &LoadingTemplate {
                region: region.as_str(),
            },
        );
    }

    fn show_error(&self, region: Region, error: &RegionError) {
        self.set_region(
            region,
            &ErrorTemplate {
                region: region.as_str(),
                message: &error.message,
                retry: error.retry.as_ref().map(ToString::to_string),
            },
        );
    }

    fn render_categories(&self, bar: &CategoryBarView) {
        self.set_region(
            Region::Categories,
            &CategoriesTemplate {
                options: &bar.options,
            },
        );
    }

    fn render_products(&self, region: Region, products: &[ProductCardView]) {
        self.set_region(
            region,
            &ProductsTemplate {
                region: region.as_str(),
                products,
            },
        );
    }

    fn render_product_detail(&self, product: &ProductDetailView) {
        self.set_region(Region::Detail, &ProductDetailTemplate { product });
    }

    fn render_cart(&self, cart: &CartView) {
        let html = render_or_report(&CartTemplate { cart });
        let mut page = self.page();
        page.cart = html;
        page.cart_count = cart.item_count;
    }

    fn notify(&self, notice: &Notice) {
        tracing::debug!(level = notice.level.as_str(), message = %notice.message, "Notice");
        let mut page = self.page();
        page.notices.push(notice.clone());
        page.unshown_notices += 1;
    }

    fn confirm_checkout(&self, summary: &CheckoutSummary) -> bool {
        self.page().prompts.push(summary.prompt());
        self.checkout_policy == CheckoutPolicy::AutoConfirm
    }

    fn open_cart(&self) {
        self.page().cart_open = true;
    }
}
