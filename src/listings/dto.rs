use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::listings::repo::{Category, Condition, Product, ProductStatus};

/// Listing fields as submitted by a seller. Used for both create and
/// full-replace edit.
#[derive(Debug, Deserialize)]
pub struct ListingFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub category: Category,
    #[serde(default)]
    pub size: String,
    pub condition: Condition,
    pub price: Decimal,
    pub image_b64: Option<String>,
    #[serde(default = "default_image_content_type")]
    pub image_content_type: String,
}

fn default_image_content_type() -> String {
    "image/jpeg".into()
}

/// Moderation outcome. A closed enum, so review can only ever land on
/// approved or rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ProductStatus {
    fn from(d: ReviewDecision) -> Self {
        match d {
            ReviewDecision::Approved => ProductStatus::Approved,
            ReviewDecision::Rejected => ProductStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<Category>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    12
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: Category,
    pub size: String,
    pub condition: Condition,
    pub price: Decimal,
    pub seller_id: Uuid,
    pub status: ProductStatus,
    pub has_image: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Product> for ListingResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            brand: p.brand,
            category: p.category,
            size: p.size,
            condition: p.condition,
            price: p.price,
            seller_id: p.seller_id,
            status: p.status,
            has_image: p.image_key.is_some(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
