//! Presentation seam between the orchestrator and a UI.
//!
//! The orchestrator never builds markup. It hands fully prepared view models
//! to a [`Presenter`], which decides how they look. [`HtmlRenderer`] renders
//! them with Askama templates.

mod html;

pub use html::{CheckoutPolicy, HtmlRenderer};

use crate::view::{
    CartView, CategoryBarView, CheckoutSummary, Notice, ProductCardView, ProductDetailView,
    Region, RegionError,
};

/// Receives everything the storefront wants to show.
///
/// Calls for one region always arrive in order: `show_loading`, then either
/// a render call or `show_error`.
pub trait Presenter: Send + Sync {
    /// A region started loading.
    fn show_loading(&self, region: Region);

    /// A region failed to load.
    fn show_error(&self, region: Region, error: &RegionError);

    /// Replace the category bar.
    fn render_categories(&self, bar: &CategoryBarView);

    /// Replace the cards of a product grid (`Catalog` or `TopRated`).
    fn render_products(&self, region: Region, products: &[ProductCardView]);

    /// Show the product detail dialog.
    fn render_product_detail(&self, product: &ProductDetailView);

    /// Replace the cart drawer contents, badge count, and total.
    fn render_cart(&self, cart: &CartView);

    /// Show a transient notice.
    fn notify(&self, notice: &Notice);

    /// Ask the shopper to confirm an order. Returns `true` to place it.
    fn confirm_checkout(&self, summary: &CheckoutSummary) -> bool;

    /// Open the cart drawer.
    fn open_cart(&self) {}
}

impl<T: Presenter + ?Sized> Presenter for std::sync::Arc<T> {
    fn show_loading(&self, region: Region) {
        (**self).show_loading(region);
    }

    fn show_error(&self, region: Region, error: &RegionError) {
        (**self).show_error(region, error);
    }

    fn render_categories(&self, bar: &CategoryBarView) {
        (**self).render_categories(bar);
    }

    fn render_products(&self, region: Region, products: &[ProductCardView]) {
        (**self).render_products(region, products);
    }

    fn render_product_detail(&self, product: &ProductDetailView) {
        (**self).render_product_detail(product);
    }

    fn render_cart(&self, cart: &CartView) {
        (**self).render_cart(cart);
    }

    fn notify(&self, notice: &Notice) {
        (**self).notify(notice);
    }

    fn confirm_checkout(&self, summary: &CheckoutSummary) -> bool {
        (**self).confirm_checkout(summary)
    }

    fn open_cart(&self) {
        (**self).open_cart();
    }
}
