//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    MediaAdded { media_id: Uuid, product_id: Option<Uuid>, sort_order: i32 },
    MediaRemoved { media_id: Uuid, product_id: Option<Uuid>, shifted: u64 },
    VariantCreated { variant_id: Uuid, product_id: Uuid, upc_code: Option<String>, ean13_code: Option<String> },
}

impl CatalogEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::MediaAdded { .. } => "catalog.media.added",
            Self::MediaRemoved { .. } => "catalog.media.removed",
            Self::VariantCreated { .. } => "catalog.variant.created",
        }
    }
}
