//! Persisted shopping cart.
//!
//! The whole cart lives under a single storage key as a JSON array of line
//! items. Every operation is a read-modify-write of that slot, serialized by
//! the store's lock so readers never observe a half-applied change.
//!
//! Cart operations never fail. Missing, unreadable, or corrupt data is
//! treated as an empty cart, and write failures are logged.

mod storage;

pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError};

use std::sync::{Mutex, MutexGuard, PoisonError};

use swiftcart_core::{Cart, Price, Product, ProductId};

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "swiftcart_cart";

/// A cart together with aggregates computed from the same read.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub count: u32,
    pub total: Price,
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self {
            count: cart.count(),
            total: cart.total(),
            cart,
        }
    }
}

/// Cart operations over a durable storage slot.
pub struct CartStore {
    storage: Box<dyn CartStorage>,
    lock: Mutex<()>,
}

impl CartStore {
    /// Create a store over `storage`.
    pub fn new(storage: impl CartStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            lock: Mutex::new(()),
        }
    }

    /// Current line items, or an empty cart if nothing was persisted.
    pub fn get_cart(&self) -> Cart {
        let _guard = self.guard();
        self.load()
    }

    /// Cart plus count and total, all from one read.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from(self.get_cart())
    }

    /// Add one unit of `product`, merging with an existing line.
    pub fn add_to_cart(&self, product: &Product) -> Cart {
        self.mutate(|cart| {
            cart.add(product);
            true
        })
    }

    /// Remove the line for `id`. Unknown ids are a no-op.
    pub fn remove_from_cart(&self, id: ProductId) -> Cart {
        self.mutate(|cart| cart.remove(id))
    }

    /// Set the quantity for `id`; zero or less removes the line.
    /// Unknown ids are a no-op.
    pub fn update_quantity(&self, id: ProductId, quantity: i64) -> Cart {
        self.mutate(|cart| cart.set_quantity(id, quantity))
    }

    /// Change the quantity for `id` by `delta` in one locked step.
    /// Dropping to zero removes the line; unknown ids are a no-op.
    pub fn adjust_quantity(&self, id: ProductId, delta: i64) -> Cart {
        self.mutate(|cart| {
            let Some(current) = cart.get(id).map(|line| line.quantity) else {
                return false;
            };
            cart.set_quantity(id, i64::from(current).saturating_add(delta))
        })
    }

    /// Total units in the cart.
    pub fn get_cart_count(&self) -> u32 {
        self.get_cart().count()
    }

    /// Sum of price times quantity, at full precision.
    pub fn get_cart_total(&self) -> Price {
        self.get_cart().total()
    }

    /// Delete the persisted cart.
    pub fn clear_cart(&self) -> Cart {
        let _guard = self.guard();
        if let Err(e) = self.storage.remove(CART_STORAGE_KEY) {
            tracing::warn!(error = %e, "Failed to clear persisted cart");
        }
        Cart::new()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load, apply `change`, and persist when it reports a modification.
    fn mutate(&self, change: impl FnOnce(&mut Cart) -> bool) -> Cart {
        let _guard = self.guard();
        let mut cart = self.load();
        if change(&mut cart) {
            self.save(&cart);
        }
        cart
    }

    fn load(&self) -> Cart {
        let raw = match self.storage.load(CART_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted cart, using empty cart");
                return Cart::new();
            }
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => cart.normalized(),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted cart is corrupt, using empty cart");
                Cart::new()
            }
        }
    }

    fn save(&self, cart: &Cart) {
        let result = serde_json::to_string(cart)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .save(CART_STORAGE_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            tracing::warn!(%error, "Failed to persist cart");
        }
    }
}
