//! Core types for SwiftCart.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod category;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartLineItem};
pub use category::CategoryFilter;
pub use id::{ParseProductIdError, ProductId};
pub use price::Price;
pub use product::{Product, Rating};
