//! Catalog service: media galleries and variant codes over a `CatalogStore`

use uuid::Uuid;

use crate::domain::aggregates::{ProductMedia, ProductVariant, GALLERY};
use crate::domain::barcode::{self, CodeSettings};
use crate::domain::events::CatalogEvent;
use crate::domain::ordering::OrderingTx;
use crate::error::{CatalogError, Result};
use crate::store::{CatalogStore, CatalogTx};

#[derive(Clone)]
pub struct Catalog<S> {
    store: S,
    codes: CodeSettings,
    code_attempts: u32,
    nats: Option<async_nats::Client>,
}

impl<S: CatalogStore> Catalog<S> {
    pub fn new(store: S, codes: CodeSettings, code_attempts: u32) -> Self {
        Self { store, codes, code_attempts: code_attempts.max(1), nats: None }
    }

    pub fn with_events(mut self, nats: Option<async_nats::Client>) -> Self {
        self.nats = nats;
        self
    }

    /// Append `media` to the end of its product's gallery.
    pub async fn add_media(&self, mut media: ProductMedia) -> Result<ProductMedia> {
        media.kind()?;
        let mut tx = self.store.begin().await?;
        let order = GALLERY.assign_next_order(&mut tx, &mut media).await?;
        tx.insert_media(&media).await?;
        tx.commit().await?;
        tracing::info!(media_id = %media.id, product_id = ?media.product_id, sort_order = order, "media added");
        self.publish(CatalogEvent::MediaAdded { media_id: media.id, product_id: media.product_id, sort_order: order }).await;
        Ok(media)
    }

    /// Delete a media entry and close the gap it leaves, atomically.
    pub async fn remove_media(&self, id: Uuid) -> Result<u64> {
        let mut tx = self.store.begin().await?;
        let unlocked = tx.get_media(id).await?.ok_or(CatalogError::MediaNotFound)?;
        if let Some(scope) = GALLERY.scope(&unlocked) {
            tx.lock_scope(&scope).await?;
        }
        // a concurrent removal may have deleted or shifted the row while we waited
        let media = tx.get_media(id).await?.ok_or(CatalogError::MediaNotFound)?;
        if !tx.delete_media(id).await? {
            return Err(CatalogError::MediaNotFound);
        }
        let shifted = GALLERY.compact_after_removal(&mut tx, &media).await?;
        tx.commit().await?;
        tracing::info!(media_id = %id, shifted, "media removed");
        self.publish(CatalogEvent::MediaRemoved { media_id: id, product_id: media.product_id, shifted }).await;
        Ok(shifted)
    }

    pub async fn list_media(&self, product_id: Uuid) -> Result<Vec<ProductMedia>> {
        let mut tx = self.store.begin().await?;
        let media = tx.list_media(product_id).await?;
        tx.rollback().await?;
        Ok(media)
    }

    /// Persist a new variant, generating whichever codes it lacks.
    pub async fn create_variant(&self, mut variant: ProductVariant) -> Result<ProductVariant> {
        variant.validate_codes()?;
        let mut tx = self.store.begin().await?;
        match variant.product_code.clone() {
            Some(code) => {
                if tx.product_code_exists(&code).await? {
                    return Err(CatalogError::DuplicateCode { field: "product_code", code });
                }
            }
            None => variant.product_code = Some(self.unused_product_code(&mut tx).await?),
        }
        if let Some(upc) = variant.upc_code.clone() {
            if tx.upc_code_exists(&upc).await? {
                return Err(CatalogError::DuplicateCode { field: "upc_code", code: upc });
            }
        }
        variant.assign_codes_if_missing(&self.codes)?;
        tx.insert_variant(&variant).await?;
        tx.commit().await?;
        tracing::info!(variant_id = %variant.id, product_code = ?variant.product_code, "variant created");
        self.publish(CatalogEvent::VariantCreated {
            variant_id: variant.id,
            product_id: variant.product_id,
            upc_code: variant.upc_code.clone(),
            ean13_code: variant.ean13_code.clone(),
        })
        .await;
        Ok(variant)
    }

    pub async fn get_variant(&self, id: Uuid) -> Result<ProductVariant> {
        let mut tx = self.store.begin().await?;
        let variant = tx.get_variant(id).await?.ok_or(CatalogError::VariantNotFound)?;
        tx.rollback().await?;
        Ok(variant)
    }

    async fn unused_product_code(&self, tx: &mut S::Tx) -> Result<String> {
        for attempt in 1..=self.code_attempts {
            let code = barcode::generate_product_code();
            if !tx.product_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::warn!(code = %code, attempt, "product code collision");
        }
        Err(CatalogError::CodeSpaceExhausted { attempts: self.code_attempts })
    }

    async fn publish(&self, event: CatalogEvent) {
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "event encode failed");
                return;
            }
        };
        if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(subject = event.subject(), error = %e, "event publish failed");
        }
    }
}
