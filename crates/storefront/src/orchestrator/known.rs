//! Products seen so far in the session, keyed by id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use swiftcart_core::{Product, ProductId};

/// Lookup table filled from catalog responses.
///
/// Full-catalog loads replace the table; category loads add to it. Entries
/// are never pruned, so a product seen once stays resolvable.
#[derive(Debug, Default)]
pub struct KnownProducts {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl KnownProducts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with `products`.
    pub fn replace_all(&self, products: &[Product]) {
        let mut known = self.lock();
        known.clear();
        known.extend(products.iter().map(|p| (p.id, p.clone())));
    }

    /// Insert or overwrite entries for `products`, keeping the rest.
    pub fn merge(&self, products: &[Product]) {
        self.lock()
            .extend(products.iter().map(|p| (p.id, p.clone())));
    }

    /// Insert or overwrite one product.
    pub fn insert(&self, product: &Product) {
        self.lock().insert(product.id, product.clone());
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.lock().get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.lock().contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProductId, Product>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
