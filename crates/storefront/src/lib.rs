//! SwiftCart storefront library.
//!
//! Catalog client, persisted cart, and the orchestrator that ties them to a
//! presenter. Drivers (the CLI, tests) construct a [`orchestrator::Storefront`]
//! and feed it shopper [`orchestrator::Command`]s.
//!
//! ```rust,ignore
//! let config = StorefrontConfig::from_env()?;
//! let storefront = Storefront::new(
//!     CatalogClient::new(&config.catalog)?,
//!     HtmlRenderer::default(),
//!     CartStore::new(FileCartStorage::new(&config.data_dir)),
//! );
//! storefront.init().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod orchestrator;
pub mod render;
pub mod view;
