//! CLI command implementations.
//!
//! Every command opens the storefront over the configured catalog and the
//! cart persisted in the data directory, runs one or more orchestrator
//! operations, and writes the result to `out`.

use std::io::Write;
use std::path::Path;

use swiftcart_core::{CategoryFilter, ProductId};
use swiftcart_storefront::cart::{CartStore, FileCartStorage};
use swiftcart_storefront::catalog::CatalogClient;
use swiftcart_storefront::config::StorefrontConfig;
use swiftcart_storefront::error::Result;
use swiftcart_storefront::orchestrator::{CheckoutOutcome, Command, Storefront};
use swiftcart_storefront::render::{CheckoutPolicy, HtmlRenderer};
use swiftcart_storefront::view::{CartView, Region};
use tracing::{info, warn};

const PAGE_TITLE: &str = "SwiftCart";

/// Storefront wired to the HTTP catalog and the HTML renderer.
pub type Shop = Storefront<CatalogClient, HtmlRenderer>;

/// Build the storefront from configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn open(config: &StorefrontConfig, policy: CheckoutPolicy) -> Result<Shop> {
    let catalog = CatalogClient::new(&config.catalog)?;
    let cart = CartStore::new(FileCartStorage::new(&config.data_dir));
    Ok(Storefront::new(catalog, HtmlRenderer::new(policy), cart))
}

/// Initial page load, optionally switching to `category`, then write the page.
pub async fn render(
    shop: &Shop,
    category: Option<CategoryFilter>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    shop.init().await;
    if let Some(category) = category {
        shop.load_products(category).await;
    }
    write_page(shop, output, out)
}

/// Initial page load, then each command in order, then write the page.
///
/// A failing command is logged and the rest still run.
pub async fn exec(
    shop: &Shop,
    commands: Vec<Command>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    shop.init().await;
    for command in commands {
        if let Err(e) = shop.dispatch(command.clone()).await {
            warn!(%command, error = %e, "Command failed");
        }
    }
    write_page(shop, output, out)
}

pub fn show_cart(shop: &Shop, out: &mut impl Write) -> Result<()> {
    write_cart(&CartView::from(&shop.cart().snapshot()), out)?;
    Ok(())
}

pub async fn add(shop: &Shop, id: ProductId, out: &mut impl Write) -> Result<()> {
    shop.handle_add_to_cart(id).await?;
    write_notices(shop, out)?;
    show_cart(shop, out)
}

pub async fn buy(shop: &Shop, id: ProductId, out: &mut impl Write) -> Result<()> {
    shop.buy_now(id).await?;
    write_notices(shop, out)?;
    if shop.presenter().is_cart_open() {
        show_cart(shop, out)?;
    }
    Ok(())
}

pub fn remove(shop: &Shop, id: ProductId, out: &mut impl Write) -> Result<()> {
    shop.remove_from_cart(id);
    show_cart(shop, out)
}

pub fn set_quantity(
    shop: &Shop,
    id: ProductId,
    quantity: i64,
    out: &mut impl Write,
) -> Result<()> {
    if !shop.cart().get_cart().contains(id) {
        warn!(product_id = %id, "Product is not in the cart");
    }
    shop.cart().update_quantity(id, quantity);
    shop.refresh_cart_ui();
    show_cart(shop, out)
}

/// Write the product detail markup.
pub async fn details(shop: &Shop, id: ProductId, out: &mut impl Write) -> Result<()> {
    shop.handle_details_click(id).await?;
    out.write_all(shop.presenter().region_html(Region::Detail).as_bytes())?;
    Ok(())
}

pub fn checkout(shop: &Shop, out: &mut impl Write) -> Result<()> {
    let outcome = shop.checkout();
    for prompt in shop.presenter().prompts() {
        writeln!(out, "{prompt}")?;
    }
    if outcome == CheckoutOutcome::Cancelled {
        writeln!(out, "Order not placed. Re-run with --yes to confirm.")?;
    }
    write_notices(shop, out)?;
    Ok(())
}

fn write_page(shop: &Shop, output: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let html = shop.presenter().render_page(PAGE_TITLE)?;
    match output {
        Some(path) => {
            std::fs::write(path, html)?;
            info!(path = %path.display(), "Wrote storefront page");
        }
        None => out.write_all(html.as_bytes())?,
    }
    Ok(())
}

fn write_notices(shop: &Shop, out: &mut impl Write) -> std::io::Result<()> {
    for notice in shop.presenter().notices() {
        writeln!(out, "[{}] {}", notice.level.as_str(), notice.message)?;
    }
    Ok(())
}

fn write_cart(cart: &CartView, out: &mut impl Write) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty");
    }
    for item in &cart.items {
        writeln!(
            out,
            "#{:<4} {:<40} {:>3} x {:>9} = {:>10}",
            item.id.to_string(),
            item.title,
            item.quantity,
            item.price,
            item.line_price
        )?;
    }
    writeln!(out, "{} item(s), total {}", cart.item_count, cart.subtotal)
}
