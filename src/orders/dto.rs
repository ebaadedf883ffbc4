use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::orders::repo::{Order, OrderStatus};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
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

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            buyer_id: o.buyer_id,
            product_id: o.product_id,
            total_amount: o.total_amount,
            status: o.status,
            payment_intent_id: o.payment_intent_id,
            tracking_number: o.tracking_number,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Returned from the payment step; the client secret goes to the payment
/// form on the client.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub order: OrderResponse,
    pub client_secret: String,
}
