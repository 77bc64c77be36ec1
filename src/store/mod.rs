//! Persistence collaborators
//!
//! A `CatalogTx` is one unit of work. It is released by `commit` or
//! `rollback`; dropping it without committing rolls it back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{ProductMedia, ProductVariant};
use crate::domain::ordering::OrderingTx;
use crate::error::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogTx: OrderingTx {
    async fn insert_media(&mut self, media: &ProductMedia) -> Result<()>;
    async fn get_media(&mut self, id: Uuid) -> Result<Option<ProductMedia>>;
    async fn delete_media(&mut self, id: Uuid) -> Result<bool>;
    /// Gallery in enumeration order.
    async fn list_media(&mut self, product_id: Uuid) -> Result<Vec<ProductMedia>>;

    async fn product_code_exists(&mut self, code: &str) -> Result<bool>;
    async fn upc_code_exists(&mut self, upc: &str) -> Result<bool>;
    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<()>;
    async fn get_variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>>;

    async fn commit(self) -> Result<()>
    where
        Self: Sized;
    async fn rollback(self) -> Result<()>
    where
        Self: Sized;
}

#[async_trait]
pub trait CatalogStore: Clone + Send + Sync + 'static {
    type Tx: CatalogTx;
    async fn begin(&self) -> Result<Self::Tx>;
}
