//! OpenSASE Catalog
//!
//! Catalog back office core for the OpenSASE commerce stack.
//!
//! ## Features
//! - Product media galleries with dense, gap-free ordering
//! - Random product codes with derived UPC-A / EAN-13 barcodes
//! - Check-digit validation for supplied barcodes
//! - PostgreSQL and in-memory stores
//! - JSON HTTP API and optional NATS domain events

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;

pub use config::Config;
pub use domain::aggregates::{ProductMedia, ProductVariant, GALLERY};
pub use domain::barcode::{check_digit, generate_ean13, generate_product_code, generate_upc, CodeSettings};
pub use domain::ordering::{OrderedCollection, OrderingTx, SortScope, SortableMember};
pub use error::{CatalogError, Result};
pub use service::Catalog;
pub use store::{CatalogStore, CatalogTx, MemoryStore, PgStore};
