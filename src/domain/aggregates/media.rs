//! Product media gallery entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ordering::{OrderedCollection, SortableMember};
use crate::domain::value_objects::MediaType;
use crate::error::Result;

/// An image or video in a product's gallery. Siblings are the media of the
/// same product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductMedia {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub media_type: String,
    pub url: String,
    pub alt: String,
    pub created_at: DateTime<Utc>,
}

fn media_owner(media: &ProductMedia) -> Option<Uuid> { media.product_id }

pub const GALLERY: OrderedCollection<ProductMedia> = OrderedCollection::new("product_media", "product_id", media_owner);

impl ProductMedia {
    pub fn create(product_id: Option<Uuid>, media_type: MediaType, url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(), product_id, sort_order: None, media_type: media_type.to_string(),
            url: url.into(), alt: alt.into(), created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> Result<MediaType> { self.media_type.parse() }
}

impl SortableMember for ProductMedia {
    fn sort_order(&self) -> Option<i32> { self.sort_order }
    fn set_sort_order(&mut self, order: i32) { self.sort_order = Some(order); }
    fn secondary_key(&self) -> (DateTime<Utc>, Uuid) { (self.created_at, self.id) }
}
