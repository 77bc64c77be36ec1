//! Aggregates module
pub mod media;
pub mod variant;

pub use media::{ProductMedia, GALLERY};
pub use variant::ProductVariant;
