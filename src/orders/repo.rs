use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

/// Order state machine. `paid` is written only by the payment-confirmation
/// path; shipping ahead of a recorded payment is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Shipped)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Paid, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const ORDER_COLUMNS: &str = "id, buyer_id, product_id, total_amount, status, payment_intent_id, \
     tracking_number, created_at, updated_at";

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    buyer_id: Uuid,
    product_id: Uuid,
    total_amount: Decimal,
) -> AppResult<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (buyer_id, product_id, total_amount)
        VALUES ($1, $2, $3)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(buyer_id)
    .bind(product_id)
    .bind(total_amount)
    .fetch_one(&mut **tx)
    .await?;
    Ok(order)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(order)
}

pub async fn find_by_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(order)
}

/// Writes the new status; an accompanying tracking number is stored only
/// when one is supplied.
pub async fn update_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: OrderStatus,
    tracking_number: Option<&str>,
) -> AppResult<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET status = $2, tracking_number = COALESCE($3, tracking_number), updated_at = now()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(tracking_number)
    .fetch_one(&mut **tx)
    .await?;
    Ok(order)
}

pub async fn set_payment_intent(db: &PgPool, id: Uuid, intent_id: &str) -> AppResult<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET payment_intent_id = $2, updated_at = now() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(intent_id)
    .fetch_one(db)
    .await?;
    Ok(order)
}

pub async fn list_all(db: &PgPool) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(orders)
}

pub async fn list_for_buyer(db: &PgPool, buyer_id: Uuid) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC"
    ))
    .bind(buyer_id)
    .fetch_all(db)
    .await?;
    Ok(orders)
}

pub async fn list_for_seller(db: &PgPool, seller_id: Uuid) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT o.id, o.buyer_id, o.product_id, o.total_amount, o.status, o.payment_intent_id,
               o.tracking_number, o.created_at, o.updated_at
        FROM orders o
        JOIN products p ON p.id = o.product_id
        WHERE p.seller_id = $1
        ORDER BY o.created_at DESC
        "#
    ))
    .bind(seller_id)
    .fetch_all(db)
    .await?;
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const ALL: [OrderStatus; 5] = [Pending, Paid, Shipped, Delivered, Cancelled];

    #[test]
    fn forward_chain_is_allowed() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn shipping_before_payment_confirmation_is_allowed() {
        assert!(Pending.can_transition_to(Shipped));
    }

    #[test]
    fn cancellation_from_any_active_state() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for next in ALL {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn no_backward_or_skipping_moves() {
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Paid.can_transition_to(Delivered));
        for s in ALL {
            assert!(!s.can_transition_to(s));
        }
    }
}
