use time::{Duration, OffsetDateTime};

use crate::error::AppResult;
use crate::notifications::dto::Notification;
use crate::notifications::repo::{self, OrderEvent};
use crate::orders::repo::OrderStatus;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

const FEED_LIMIT: i64 = 5;

pub fn window_start(now: OffsetDateTime) -> OffsetDateTime {
    now - Duration::days(7)
}

/// Buyers are only told about orders that have moved.
pub fn buyer_visible(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Shipped | OrderStatus::Delivered)
}

fn seller_notification(e: OrderEvent) -> Notification {
    Notification {
        id: e.order_id,
        title: "New order".into(),
        message: format!("Order {} for {}", e.order_id, e.product_name),
        created_at: e.created_at,
        is_read: false,
    }
}

fn buyer_notification(e: OrderEvent) -> Notification {
    let status = match e.status {
        OrderStatus::Pending => "pending",
        OrderStatus::Paid => "paid",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Cancelled => "cancelled",
    };
    Notification {
        id: e.order_id,
        title: "Order update".into(),
        message: format!("Order {} is now {}", e.order_id, status),
        created_at: e.created_at,
        is_read: false,
    }
}

/// Derived feed over the last seven days of orders. Sellers and admins see
/// new-order events on their products; buyers see their own orders once
/// shipped or delivered (the status filter runs after the fetch cap, so a
/// burst of stale orders can crowd out moved ones — kept as-is).
pub async fn list_notifications(state: &AppState, actor: &User) -> AppResult<Vec<Notification>> {
    let since = window_start(OffsetDateTime::now_utc());
    match actor.role {
        Role::Seller | Role::Admin => {
            let events = repo::recent_for_seller(&state.db, actor.id, since, FEED_LIMIT).await?;
            Ok(events.into_iter().map(seller_notification).collect())
        }
        Role::User => {
            let events = repo::recent_for_buyer(&state.db, actor.id, since, FEED_LIMIT).await?;
            Ok(events
                .into_iter()
                .filter(|e| buyer_visible(e.status))
                .map(buyer_notification)
                .collect())
        }
        _ => Ok(Vec::new()),
    }
}

/// Unread badge count. Deliberately computed with different filters than
/// the list: the seller count ignores order status entirely and neither
/// count is capped. Unifying this with `list_notifications` would change
/// user-visible numbers, so the asymmetry stays.
pub async fn count_unread(state: &AppState, actor: &User) -> AppResult<i64> {
    let since = window_start(OffsetDateTime::now_utc());
    match actor.role {
        Role::Seller | Role::Admin => {
            repo::count_recent_for_seller(&state.db, actor.id, since).await
        }
        Role::User => repo::count_recent_progressed_for_buyer(&state.db, actor.id, since).await,
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn window_is_seven_days() {
        let now = datetime!(2024-03-15 12:00 UTC);
        assert_eq!(window_start(now), datetime!(2024-03-08 12:00 UTC));
    }

    #[test]
    fn buyers_only_see_moved_orders() {
        assert!(buyer_visible(OrderStatus::Shipped));
        assert!(buyer_visible(OrderStatus::Delivered));
        assert!(!buyer_visible(OrderStatus::Pending));
        assert!(!buyer_visible(OrderStatus::Paid));
        assert!(!buyer_visible(OrderStatus::Cancelled));
    }

    #[test]
    fn notifications_are_always_unread() {
        let event = OrderEvent {
            order_id: uuid::Uuid::new_v4(),
            status: OrderStatus::Shipped,
            product_name: "Air Jordan 1".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let n = buyer_notification(event);
        assert!(!n.is_read);
        assert!(n.message.contains("shipped"));
    }
}
