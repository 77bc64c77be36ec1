//! Catalog domain
pub mod aggregates;
pub mod barcode;
pub mod events;
pub mod ordering;
pub mod value_objects;
