use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sneakers,
    Clothing,
    Accessories,
    Electronics,
    Collectibles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

/// Listing state machine: `pending -> {approved, rejected}` by review,
/// `approved -> sold` by purchase, and any state back to `pending` via a
/// seller edit. Review may re-run from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
    Sold,
}

impl ProductStatus {
    pub fn is_purchasable(self) -> bool {
        matches!(self, ProductStatus::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: Category,
    pub size: String,
    pub condition: Condition,
    pub price: Decimal,
    pub seller_id: Uuid,
    pub image_key: Option<String>,
    pub status: ProductStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const PRODUCT_COLUMNS: &str = "id, name, description, brand, category, size, condition, price, \
     seller_id, image_key, status, created_at, updated_at";

pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub brand: &'a str,
    pub category: Category,
    pub size: &'a str,
    pub condition: Condition,
    pub price: Decimal,
    pub seller_id: Uuid,
    pub image_key: Option<&'a str>,
}

pub async fn insert(db: &PgPool, p: NewProduct<'_>) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (name, description, brand, category, size, condition, price,
                              seller_id, image_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(p.name)
    .bind(p.description)
    .bind(p.brand)
    .bind(p.category)
    .bind(p.size)
    .bind(p.condition)
    .bind(p.price)
    .bind(p.seller_id)
    .bind(p.image_key)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

/// Row-locked read; two concurrent purchases of the same single-unit item
/// serialize on this lock.
pub async fn find_by_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(product)
}

pub struct ProductChanges<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub brand: &'a str,
    pub category: Category,
    pub size: &'a str,
    pub condition: Condition,
    pub price: Decimal,
    pub image_key: Option<&'a str>,
    pub status: ProductStatus,
}

pub async fn update(db: &PgPool, id: Uuid, c: ProductChanges<'_>) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET name = $2, description = $3, brand = $4, category = $5, size = $6,
            condition = $7, price = $8, image_key = $9, status = $10, updated_at = now()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(c.name)
    .bind(c.description)
    .bind(c.brand)
    .bind(c.category)
    .bind(c.size)
    .bind(c.condition)
    .bind(c.price)
    .bind(c.image_key)
    .bind(c.status)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn set_status(db: &PgPool, id: Uuid, status: ProductStatus) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET status = $2, updated_at = now() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: ProductStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE products SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn delete(db: &PgPool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Public catalog: approved listings only, optional category filter and
/// name/brand substring search.
pub async fn list_approved(
    db: &PgPool,
    category: Option<Category>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE status = 'approved'
          AND ($1::product_category IS NULL OR category = $1)
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR brand ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(category)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(products)
}

pub async fn list_by_seller(db: &PgPool, seller_id: Uuid) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 ORDER BY created_at DESC"
    ))
    .bind(seller_id)
    .fetch_all(db)
    .await?;
    Ok(products)
}
