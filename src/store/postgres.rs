//! PostgreSQL catalog store
//!
//! Writers of one sibling group are serialized with a transaction-scoped
//! advisory lock keyed by the scope. The `(product_id, sort_order)` unique
//! constraint is deferred to commit so compaction can shift rows in place.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{CatalogStore, CatalogTx};
use crate::domain::aggregates::{ProductMedia, ProductVariant};
use crate::domain::ordering::{OrderingTx, SortScope};
use crate::error::Result;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(PgTx { tx: self.pool.begin().await? })
    }
}

fn lock_key(scope: &SortScope) -> String {
    format!("{}:{}", scope.collection, scope.owner)
}

#[async_trait]
impl OrderingTx for PgTx {
    async fn lock_scope(&mut self, scope: &SortScope) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(lock_key(scope))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_max_order(&mut self, scope: &SortScope) -> Result<Option<i32>> {
        // collection and owner_key are compile-time identifiers, never user input
        let sql = format!("SELECT MAX(sort_order) FROM {} WHERE {} = $1", scope.collection, scope.owner_key);
        let max = sqlx::query_scalar::<_, Option<i32>>(&sql).bind(scope.owner).fetch_one(&mut *self.tx).await?;
        Ok(max)
    }

    async fn update_orders_greater_than(&mut self, scope: &SortScope, threshold: i32, delta: i32) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET sort_order = sort_order + $3 WHERE {} = $1 AND sort_order > $2",
            scope.collection, scope.owner_key
        );
        let done = sqlx::query(&sql).bind(scope.owner).bind(threshold).bind(delta).execute(&mut *self.tx).await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl CatalogTx for PgTx {
    async fn insert_media(&mut self, m: &ProductMedia) -> Result<()> {
        sqlx::query("INSERT INTO product_media (id, product_id, sort_order, media_type, url, alt, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(m.id).bind(m.product_id).bind(m.sort_order).bind(&m.media_type).bind(&m.url).bind(&m.alt).bind(m.created_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn get_media(&mut self, id: Uuid) -> Result<Option<ProductMedia>> {
        let m = sqlx::query_as::<_, ProductMedia>("SELECT * FROM product_media WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(m)
    }

    async fn delete_media(&mut self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM product_media WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_media(&mut self, product_id: Uuid) -> Result<Vec<ProductMedia>> {
        let media = sqlx::query_as::<_, ProductMedia>(
            "SELECT * FROM product_media WHERE product_id = $1 ORDER BY sort_order ASC NULLS LAST, created_at ASC, id ASC",
        )
        .bind(product_id).fetch_all(&mut *self.tx).await?;
        Ok(media)
    }

    async fn product_code_exists(&mut self, code: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM product_variants WHERE product_code = $1)")
            .bind(code).fetch_one(&mut *self.tx).await?;
        Ok(exists)
    }

    async fn upc_code_exists(&mut self, upc: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM product_variants WHERE upc_code = $1)")
            .bind(upc).fetch_one(&mut *self.tx).await?;
        Ok(exists)
    }

    async fn insert_variant(&mut self, v: &ProductVariant) -> Result<()> {
        sqlx::query("INSERT INTO product_variants (id, product_id, name, product_code, upc_code, ean13_code, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(v.id).bind(v.product_id).bind(&v.name).bind(&v.product_code).bind(&v.upc_code).bind(&v.ean13_code).bind(v.created_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn get_variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>> {
        let v = sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(v)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
