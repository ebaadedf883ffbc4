use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;
use crate::orders::repo::OrderStatus;

/// A recent order joined with its product name, the raw material for the
/// derived feed.
#[derive(Debug, FromRow)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub product_name: String,
    pub created_at: OffsetDateTime,
}

const EVENT_QUERY: &str = r#"
    SELECT o.id AS order_id, o.status, p.name AS product_name, o.created_at
    FROM orders o
    JOIN products p ON p.id = o.product_id
"#;

pub async fn recent_for_seller(
    db: &PgPool,
    seller_id: Uuid,
    since: OffsetDateTime,
    limit: i64,
) -> AppResult<Vec<OrderEvent>> {
    let events = sqlx::query_as::<_, OrderEvent>(&format!(
        "{EVENT_QUERY} WHERE p.seller_id = $1 AND o.created_at >= $2 ORDER BY o.created_at DESC LIMIT $3"
    ))
    .bind(seller_id)
    .bind(since)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(events)
}

pub async fn recent_for_buyer(
    db: &PgPool,
    buyer_id: Uuid,
    since: OffsetDateTime,
    limit: i64,
) -> AppResult<Vec<OrderEvent>> {
    let events = sqlx::query_as::<_, OrderEvent>(&format!(
        "{EVENT_QUERY} WHERE o.buyer_id = $1 AND o.created_at >= $2 ORDER BY o.created_at DESC LIMIT $3"
    ))
    .bind(buyer_id)
    .bind(since)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(events)
}

pub async fn count_recent_for_seller(
    db: &PgPool,
    seller_id: Uuid,
    since: OffsetDateTime,
) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM orders o
        JOIN products p ON p.id = o.product_id
        WHERE p.seller_id = $1 AND o.created_at >= $2
        "#,
    )
    .bind(seller_id)
    .bind(since)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn count_recent_progressed_for_buyer(
    db: &PgPool,
    buyer_id: Uuid,
    since: OffsetDateTime,
) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM orders
        WHERE buyer_id = $1
          AND status IN ('shipped', 'delivered')
          AND created_at >= $2
        "#,
    )
    .bind(buyer_id)
    .bind(since)
    .fetch_one(db)
    .await?;
    Ok(count)
}
