//! End-to-end storefront runs: HTTP catalog, HTML rendering, file-backed cart.

use std::path::Path;
use std::time::Duration;

use swiftcart_core::{CategoryFilter, ProductId};
use swiftcart_integration_tests::FakeCatalogApi;
use swiftcart_storefront::cart::{CartStore, FileCartStorage};
use swiftcart_storefront::catalog::{CatalogClient, CatalogError};
use swiftcart_storefront::error::StorefrontError;
use swiftcart_storefront::orchestrator::{CheckoutOutcome, Command, LoadState, Storefront};
use swiftcart_storefront::render::{CheckoutPolicy, HtmlRenderer};
use swiftcart_storefront::view::{NoticeLevel, Region};

type Shop = Storefront<CatalogClient, HtmlRenderer>;

fn shop(api: &FakeCatalogApi, cart_dir: &Path, policy: CheckoutPolicy) -> Shop {
    let catalog = CatalogClient::new(&api.catalog_config(Duration::from_secs(60)))
        .expect("Failed to build client");
    Storefront::new(
        catalog,
        HtmlRenderer::new(policy),
        CartStore::new(FileCartStorage::new(cart_dir)),
    )
}

async fn start_api() -> FakeCatalogApi {
    FakeCatalogApi::with_sample_catalog()
        .await
        .expect("Failed to start fake catalog")
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ============================================================================
// Initial load
// ============================================================================

#[tokio::test]
async fn test_init_renders_every_region() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    shop.init().await;

    let renderer = shop.presenter();
    let top_rated = renderer.region_html(Region::TopRated);
    assert_eq!(count(&top_rated, "<article"), 3);
    let first_card = top_rated.find("data-product-id=\"18\"");
    let second_card = top_rated.find("data-product-id=\"5\"");
    assert!(first_card < second_card);

    let catalog = renderer.region_html(Region::Catalog);
    assert_eq!(count(&catalog, "<article"), 7);

    let categories = renderer.region_html(Region::Categories);
    assert!(categories.contains("data-command=\"select-category:jewelery\""));
    assert!(categories.contains("Women&#39;s Clothing") || categories.contains("Women&#x27;s Clothing"));

    let page = renderer.render_page("SwiftCart").expect("page");
    assert!(page.contains("data-cart-count>0<"));
    assert!(!page.contains("data-region-state=\"loading\""));

    // Top-rated and catalog share one cached `/products` response.
    assert_eq!(api.hits("/products"), 1);
    assert_eq!(shop.known_products().len(), 7);
}

#[tokio::test]
async fn test_top_rated_failure_is_contained() {
    let api = start_api().await;
    api.fail_next("/products", 1);
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    shop.init().await;

    assert_eq!(shop.region_state(Region::TopRated), LoadState::Errored);
    assert_eq!(shop.region_state(Region::Catalog), LoadState::Loaded);
    assert_eq!(shop.region_state(Region::Categories), LoadState::Loaded);
    let top_rated = shop.presenter().region_html(Region::TopRated);
    assert!(top_rated.contains("Failed to load top rated products."));
    assert!(top_rated.contains("data-command=\"retry-top-rated\""));

    shop.dispatch(Command::RetryTopRated).await.expect("retry");
    assert_eq!(shop.region_state(Region::TopRated), LoadState::Loaded);
}

#[tokio::test]
async fn test_category_failure_keeps_products() {
    let api = start_api().await;
    api.fail_next("/products/categories", 5);
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    shop.init().await;

    let categories = shop.presenter().region_html(Region::Categories);
    assert!(categories.contains("Failed to load categories."));
    assert_eq!(
        count(&shop.presenter().region_html(Region::Catalog), "<article"),
        7
    );
}

// ============================================================================
// Browsing and cart
// ============================================================================

#[tokio::test]
async fn test_category_products_resolve_without_extra_fetch() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    shop.dispatch(Command::SelectCategory(CategoryFilter::from("electronics")))
        .await
        .expect("select");
    shop.dispatch(Command::AddToCart(ProductId::new(9)))
        .await
        .expect("add");

    assert_eq!(api.hits("/products/9"), 0);
    assert_eq!(shop.presenter().cart_count(), 1);
    let catalog = shop.presenter().region_html(Region::Catalog);
    assert_eq!(count(&catalog, "<article"), 2);
}

#[tokio::test]
async fn test_cart_survives_reopening() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);
        shop.init().await;
        shop.handle_add_to_cart(ProductId::new(2)).await.expect("add");
        shop.handle_add_to_cart(ProductId::new(2)).await.expect("add");
        shop.buy_now(ProductId::new(18)).await.expect("buy");
        assert!(shop.presenter().is_cart_open());
    }

    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);
    shop.refresh_cart_ui();

    assert_eq!(shop.presenter().cart_count(), 3);
    let cart = shop.presenter().cart_html();
    assert!(cart.contains("$44.60"));
    assert!(cart.contains("$54.45"));
    assert_eq!(shop.cart().get_cart_total().display(), "$54.45");
}

#[tokio::test]
async fn test_unknown_product_leaves_cart_alone() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    let result = shop.handle_add_to_cart(ProductId::new(404)).await;

    assert!(matches!(
        result,
        Err(StorefrontError::Catalog(CatalogError::NotFound(_)))
    ));
    assert_eq!(api.hits("/products/404"), 1);
    assert_eq!(shop.cart().get_cart_count(), 0);
    let notices = shop.presenter().notices();
    assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn test_details_dialog() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);

    shop.handle_details_click(ProductId::new(6)).await.expect("details");

    let detail = shop.presenter().region_html(Region::Detail);
    assert!(detail.contains("Solid Gold Petite Micropave"));
    assert!(detail.contains("data-command=\"buy-now:6\""));
    let page = shop.presenter().render_page("SwiftCart").expect("page");
    assert!(page.contains("id=\"product-detail\""));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_clears_persisted_cart() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::AutoConfirm);
    shop.init().await;
    shop.handle_add_to_cart(ProductId::new(1)).await.expect("add");
    shop.handle_add_to_cart(ProductId::new(6)).await.expect("add");

    let outcome = shop.checkout();

    assert!(matches!(outcome, CheckoutOutcome::Placed(summary) if summary.item_count == 2));
    let prompts = shop.presenter().prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts.iter().all(|p| p.contains("Total: $277.95")));
    assert_eq!(
        shop.presenter().notices().last().map(|n| n.message.clone()),
        Some("Order placed successfully! Total: $277.95".to_string())
    );

    let reopened = self::shop(&api, dir.path(), CheckoutPolicy::Decline);
    assert!(reopened.cart().get_cart().is_empty());
}

#[tokio::test]
async fn test_declined_checkout_keeps_cart() {
    let api = start_api().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let shop = shop(&api, dir.path(), CheckoutPolicy::Decline);
    shop.handle_add_to_cart(ProductId::new(1)).await.expect("add");

    assert_eq!(shop.checkout(), CheckoutOutcome::Cancelled);
    assert_eq!(shop.cart().get_cart_count(), 1);
}
