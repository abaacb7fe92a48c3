//! Cart line items and pure cart arithmetic.
//!
//! [`Cart`] holds no I/O. Persistence lives in the storefront's cart store,
//! which loads a `Cart`, applies one of these operations, and writes it back.

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId};

/// A cart entry: a snapshot of the product at add-time plus a quantity.
///
/// Serializes as the product's fields with an extra `quantity` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(flatten)]
    pub product: Product,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
}

impl CartLineItem {
    /// Get the product id this line is keyed by.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// An ordered list of line items with at most one line per product id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Add one unit of a product.
    ///
    /// Bumps the quantity of an existing line, otherwise appends a new line
    /// with quantity 1 holding a snapshot of `product`.
    pub fn add(&mut self, product: &Product) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id() == product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(CartLineItem {
                product: product.clone(),
                quantity: 1,
            });
        }
    }

    /// Remove the line for a product. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    /// Set a line's quantity. Non-positive quantities remove the line.
    ///
    /// Returns whether the cart changed. Unknown ids leave the cart as is.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        if !self.contains(id) {
            return false;
        }
        if quantity <= 0 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.items
            .iter_mut()
            .filter(|item| item.id() == id)
            .for_each(|item| item.quantity = quantity);
        true
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |total, item| total.saturating_add(item.quantity))
    }

    /// Sum of unit price times quantity, at full precision.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Drop lines that break the cart invariants.
    ///
    /// Persisted carts may have been edited by hand; zero-quantity lines are
    /// removed and duplicate ids are folded into their first line.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut cart = Self::new();
        for item in self.items.into_iter().filter(|item| item.quantity > 0) {
            if let Some(existing) = cart.items.iter_mut().find(|line| line.id() == item.id()) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                cart.items.push(item);
            }
        }
        cart
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self { items }.normalized()
    }
}
