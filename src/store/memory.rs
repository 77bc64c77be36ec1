//! In-process catalog store
//!
//! Each transaction holds the store's writer lock from `begin` until it is
//! committed or dropped, so writers are serialized. Changes are staged on a
//! copy and only published by `commit`.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{CatalogStore, CatalogTx};
use crate::domain::aggregates::{ProductMedia, ProductVariant, GALLERY};
use crate::domain::ordering::{sort_siblings, OrderingTx, SortScope};
use crate::error::{CatalogError, Result};

#[derive(Clone, Debug, Default)]
struct CatalogState {
    media: Vec<ProductMedia>,
    variants: Vec<ProductVariant>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<CatalogState>>,
    fail_updates: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Make the next `update_orders_greater_than` fail with a storage error.
    #[cfg(test)]
    pub(crate) fn fail_next_update(&self) { self.fail_updates.store(true, Ordering::SeqCst); }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<CatalogState>,
    staged: CatalogState,
    fail_updates: Arc<AtomicBool>,
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx { guard, staged, fail_updates: self.fail_updates.clone() })
    }
}

impl MemoryTx {
    fn siblings_mut<'a>(&'a mut self, scope: &'a SortScope) -> Result<impl Iterator<Item = &'a mut ProductMedia> + 'a> {
        if scope.collection != GALLERY.collection() {
            return Err(CatalogError::Storage(format!("unknown collection {}", scope.collection)));
        }
        Ok(self.staged.media.iter_mut().filter(move |m| m.product_id == Some(scope.owner)))
    }

    fn check_unique_orders(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for m in &self.staged.media {
            if let (Some(owner), Some(order)) = (m.product_id, m.sort_order) {
                if !seen.insert((owner, order)) {
                    return Err(CatalogError::Storage(format!("duplicate sort_order {order} for product {owner}")));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrderingTx for MemoryTx {
    async fn lock_scope(&mut self, _scope: &SortScope) -> Result<()> {
        // the writer lock taken in `begin` already covers every scope
        Ok(())
    }

    async fn find_max_order(&mut self, scope: &SortScope) -> Result<Option<i32>> {
        Ok(self.siblings_mut(scope)?.filter_map(|m| m.sort_order).max())
    }

    async fn update_orders_greater_than(&mut self, scope: &SortScope, threshold: i32, delta: i32) -> Result<u64> {
        if self.fail_updates.swap(false, Ordering::SeqCst) {
            return Err(CatalogError::Storage("injected update failure".into()));
        }
        let mut affected = 0;
        for m in self.siblings_mut(scope)? {
            if let Some(order) = m.sort_order.filter(|o| *o > threshold) {
                m.sort_order = Some(order + delta);
                affected += 1;
            }
        }
        Ok(affected)
    }
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn insert_media(&mut self, media: &ProductMedia) -> Result<()> {
        self.staged.media.push(media.clone());
        Ok(())
    }

    async fn get_media(&mut self, id: Uuid) -> Result<Option<ProductMedia>> {
        Ok(self.staged.media.iter().find(|m| m.id == id).cloned())
    }

    async fn delete_media(&mut self, id: Uuid) -> Result<bool> {
        let before = self.staged.media.len();
        self.staged.media.retain(|m| m.id != id);
        Ok(self.staged.media.len() != before)
    }

    async fn list_media(&mut self, product_id: Uuid) -> Result<Vec<ProductMedia>> {
        let mut media: Vec<ProductMedia> =
            self.staged.media.iter().filter(|m| m.product_id == Some(product_id)).cloned().collect();
        sort_siblings(&mut media);
        Ok(media)
    }

    async fn product_code_exists(&mut self, code: &str) -> Result<bool> {
        Ok(self.staged.variants.iter().any(|v| v.product_code.as_deref() == Some(code)))
    }

    async fn upc_code_exists(&mut self, upc: &str) -> Result<bool> {
        Ok(self.staged.variants.iter().any(|v| v.upc_code.as_deref() == Some(upc)))
    }

    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<()> {
        if let Some(code) = variant.product_code.as_deref() {
            if self.product_code_exists(code).await? {
                return Err(CatalogError::Storage(format!("product_code {code} already exists")));
            }
        }
        if let Some(upc) = variant.upc_code.as_deref() {
            if self.upc_code_exists(upc).await? {
                return Err(CatalogError::Storage(format!("upc_code {upc} already exists")));
            }
        }
        self.staged.variants.push(variant.clone());
        Ok(())
    }

    async fn get_variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>> {
        Ok(self.staged.variants.iter().find(|v| v.id == id).cloned())
    }

    async fn commit(self) -> Result<()> {
        self.check_unique_orders()?;
        let MemoryTx { mut guard, staged, .. } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::MediaType;

    #[tokio::test]
    async fn test_uncommitted_changes_are_discarded() {
        let store = MemoryStore::new();
        let product = Uuid::new_v4();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_media(&ProductMedia::create(Some(product), MediaType::Image, "a", "")).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_media(product).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_duplicate_orders() {
        let store = MemoryStore::new();
        let product = Uuid::new_v4();
        let mut tx = store.begin().await.unwrap();
        for _ in 0..2 {
            let mut m = ProductMedia::create(Some(product), MediaType::Image, "a", "");
            m.sort_order = Some(0);
            tx.insert_media(&m).await.unwrap();
        }
        assert!(matches!(tx.commit().await, Err(CatalogError::Storage(_))));
    }

    #[tokio::test]
    async fn test_duplicate_product_code_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut a = ProductVariant::create(Uuid::new_v4(), "A");
        a.product_code = Some("12345".into());
        tx.insert_variant(&a).await.unwrap();
        let mut b = ProductVariant::create(Uuid::new_v4(), "B");
        b.product_code = Some("12345".into());
        assert!(tx.insert_variant(&b).await.is_err());
        assert!(tx.product_code_exists("12345").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_upc_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut a = ProductVariant::create(Uuid::new_v4(), "A");
        a.upc_code = Some("036000291452".into());
        tx.insert_variant(&a).await.unwrap();
        let mut b = ProductVariant::create(Uuid::new_v4(), "B");
        b.product_code = Some("54321".into());
        b.upc_code = Some("036000291452".into());
        assert!(matches!(tx.insert_variant(&b).await, Err(CatalogError::Storage(_))));
        assert!(tx.upc_code_exists("036000291452").await.unwrap());
        assert!(!tx.product_code_exists("54321").await.unwrap());
    }
}
