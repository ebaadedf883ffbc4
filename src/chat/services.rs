use tracing::info;
use uuid::Uuid;

use crate::chat::repo::{self, ChatMessage};
use crate::error::{AppError, AppResult};
use crate::listings::repo as products;
use crate::orders::repo as orders;
use crate::state::AppState;
use crate::users::repo::User;

/// The counterpart in a two-party thread. `None` for anyone who is
/// neither buyer nor seller.
pub fn other_party(actor_id: Uuid, buyer_id: Uuid, seller_id: Uuid) -> Option<Uuid> {
    if actor_id == buyer_id {
        Some(seller_id)
    } else if actor_id == seller_id {
        Some(buyer_id)
    } else {
        None
    }
}

pub fn may_view_chat(actor: &User, buyer_id: Uuid, seller_id: Uuid) -> bool {
    actor.id == buyer_id || actor.id == seller_id || actor.role.is_staff()
}

async fn load_thread_parties(
    state: &AppState,
    order_id: Uuid,
) -> AppResult<(Uuid, Uuid)> {
    let order = orders::find_by_id(&state.db, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let product = products::find_by_id(&state.db, order.product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    Ok((order.buyer_id, product.seller_id))
}

/// Sends a message in an order thread. Only the two transacting parties
/// can write; staff oversight is read-only.
pub async fn send_message(
    state: &AppState,
    actor: &User,
    order_id: Uuid,
    body: &str,
) -> AppResult<ChatMessage> {
    let (buyer_id, seller_id) = load_thread_parties(state, order_id).await?;
    if !may_view_chat(actor, buyer_id, seller_id) {
        return Err(AppError::Permission("you may not view this chat".into()));
    }

    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("message cannot be empty".into()));
    }

    let receiver_id = other_party(actor.id, buyer_id, seller_id).ok_or_else(|| {
        AppError::Permission("chat is read-only for staff oversight".into())
    })?;

    let message = repo::insert(&state.db, actor.id, receiver_id, order_id, body).await?;
    info!(message_id = %message.id, order_id = %order_id, sender = %actor.id, "chat message sent");
    Ok(message)
}

/// Returns the thread in creation order and, as a documented side effect,
/// marks every message addressed to the reader as read in the same
/// transaction.
pub async fn list_messages(
    state: &AppState,
    actor: &User,
    order_id: Uuid,
) -> AppResult<Vec<ChatMessage>> {
    let (buyer_id, seller_id) = load_thread_parties(state, order_id).await?;
    if !may_view_chat(actor, buyer_id, seller_id) {
        return Err(AppError::Permission("you may not view this chat".into()));
    }

    let mut tx = state.db.begin().await?;
    repo::mark_read_tx(&mut tx, order_id, actor.id).await?;
    let messages = repo::list_by_order_tx(&mut tx, order_id).await?;
    tx.commit().await?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::role::Role;
    use time::OffsetDateTime;

    fn make_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: "someone@example.com".into(),
            password_hash: "hash".into(),
            role,
            is_active: true,
            avatar_key: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn receiver_is_the_other_party() {
        let buyer = Uuid::new_v4();
        let seller = Uuid::new_v4();
        assert_eq!(other_party(buyer, buyer, seller), Some(seller));
        assert_eq!(other_party(seller, buyer, seller), Some(buyer));
        assert_eq!(other_party(Uuid::new_v4(), buyer, seller), None);
    }

    #[test]
    fn parties_and_staff_may_view() {
        let buyer = make_user(Role::User);
        let seller = make_user(Role::Seller);
        assert!(may_view_chat(&buyer, buyer.id, seller.id));
        assert!(may_view_chat(&seller, buyer.id, seller.id));
        assert!(may_view_chat(&make_user(Role::Moderator), buyer.id, seller.id));
        assert!(may_view_chat(&make_user(Role::Admin), buyer.id, seller.id));
        assert!(!may_view_chat(&make_user(Role::User), buyer.id, seller.id));
        assert!(!may_view_chat(&make_user(Role::Seller), buyer.id, seller.id));
    }
}
