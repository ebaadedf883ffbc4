use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::listings::repo as products;
use crate::listings::repo::{Product, ProductStatus};
use crate::orders::repo::{self, Order, OrderStatus};
use crate::payments::amount_minor_units;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

/// Status values a caller may request through the transition endpoint.
/// `pending` is the creation state and `paid` belongs to the payment
/// confirmation path; requesting either is ignored.
const TRANSITION_TARGETS: &[OrderStatus] = &[
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// Purchase preconditions; the caller holds the product row lock.
pub fn validate_purchase(buyer: &User, product: &Product) -> Result<(), AppError> {
    if product.seller_id == buyer.id {
        return Err(AppError::Conflict("you cannot buy your own product".into()));
    }
    if !product.status.is_purchasable() {
        return Err(AppError::Conflict(
            "product is not available for purchase".into(),
        ));
    }
    Ok(())
}

/// Staff may move any order; a seller only orders on their own products;
/// buyers have no transition rights at all.
pub fn may_transition(actor: &User, product_seller_id: Uuid) -> Result<(), AppError> {
    if actor.role.is_staff() || actor.id == product_seller_id {
        Ok(())
    } else {
        Err(AppError::Permission(
            "you may not update this order".into(),
        ))
    }
}

pub fn may_view_order(actor: &User, order: &Order, product_seller_id: Uuid) -> bool {
    actor.id == order.buyer_id || actor.id == product_seller_id || actor.role.is_staff()
}

/// Creates an order, snapshotting the current price. The product row is
/// locked for the duration, and the single unit is taken off the market,
/// so two concurrent buyers cannot both win.
pub async fn place_order(state: &AppState, actor: &User, product_id: Uuid) -> AppResult<Order> {
    let mut tx = state.db.begin().await?;
    let product = products::find_by_id_for_update(&mut tx, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    validate_purchase(actor, &product)?;

    let order = repo::insert_tx(&mut tx, actor.id, product.id, product.price).await?;
    products::set_status_tx(&mut tx, product.id, ProductStatus::Sold).await?;
    tx.commit().await?;

    info!(order_id = %order.id, product_id = %product.id, buyer = %actor.id, "order placed");
    Ok(order)
}

/// Requests a payment intent for a pending order. On provider failure the
/// order is left untouched in `pending`; the caller re-invokes.
pub async fn request_payment(
    state: &AppState,
    actor: &User,
    order_id: Uuid,
) -> AppResult<(Order, String)> {
    let order = repo::find_by_id(&state.db, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    if order.buyer_id != actor.id {
        return Err(AppError::Permission(
            "only the buyer may pay for this order".into(),
        ));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict("order is not awaiting payment".into()));
    }

    let amount = amount_minor_units(order.total_amount)?;
    let intent = state
        .payments
        .create_payment_intent(amount, &state.config.payment.currency, order.id)
        .await
        .map_err(|e| {
            warn!(order_id = %order.id, error = %e, "payment intent request failed");
            AppError::ExternalService(e.to_string())
        })?;

    let order = repo::set_payment_intent(&state.db, order.id, &intent.id).await?;
    info!(order_id = %order.id, intent = %intent.id, "payment intent created");
    Ok((order, intent.client_secret))
}

/// Role-gated status transition. Unknown targets are ignored (the order is
/// returned unchanged); targets that violate the transition table are a
/// conflict. Cancelling puts the single unit back on the market.
pub async fn transition_status(
    state: &AppState,
    actor: &User,
    order_id: Uuid,
    new_status: OrderStatus,
    tracking_number: Option<String>,
) -> AppResult<Order> {
    let mut tx = state.db.begin().await?;
    let order = repo::find_by_id_for_update(&mut tx, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let product = products::find_by_id_for_update(&mut tx, order.product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    may_transition(actor, product.seller_id)?;

    if !TRANSITION_TARGETS.contains(&new_status) {
        tx.rollback().await?;
        return Ok(order);
    }

    if !order.status.can_transition_to(new_status) {
        return Err(AppError::Conflict(format!(
            "order cannot change from {:?} to {:?}",
            order.status, new_status
        )));
    }

    let tracking = tracking_number.as_deref().filter(|t| !t.is_empty());
    let updated = repo::update_status_tx(&mut tx, order.id, new_status, tracking).await?;

    if new_status == OrderStatus::Cancelled && product.status == ProductStatus::Sold {
        products::set_status_tx(&mut tx, product.id, ProductStatus::Approved).await?;
    }

    tx.commit().await?;
    info!(order_id = %updated.id, status = ?updated.status, actor = %actor.id, "order status updated");
    Ok(updated)
}

pub async fn get_order(state: &AppState, actor: &User, order_id: Uuid) -> AppResult<Order> {
    let order = repo::find_by_id(&state.db, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let product = products::find_by_id(&state.db, order.product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    if !may_view_order(actor, &order, product.seller_id) {
        return Err(AppError::Permission("you may not view this order".into()));
    }
    Ok(order)
}

/// Role-scoped order listing: staff see everything, sellers the orders on
/// their products, everyone else their own purchases.
pub async fn list_orders(state: &AppState, actor: &User) -> AppResult<Vec<Order>> {
    match actor.role {
        Role::Moderator | Role::Admin | Role::Root => repo::list_all(&state.db).await,
        Role::Seller => repo::list_for_seller(&state.db, actor.id).await,
        Role::User => repo::list_for_buyer(&state.db, actor.id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::repo::{Category, Condition};
    use rust_decimal::Decimal;
    use std::str::FromStr;
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

    fn make_product(seller_id: Uuid, status: ProductStatus) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Yeezy Boost 350".into(),
            description: String::new(),
            brand: "Adidas".into(),
            category: Category::Sneakers,
            size: "US 10".into(),
            condition: Condition::LikeNew,
            price: Decimal::from_str("220.00").unwrap(),
            seller_id,
            image_key: None,
            status,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn self_purchase_is_a_conflict() {
        let buyer = make_user(Role::Seller);
        let product = make_product(buyer.id, ProductStatus::Approved);
        assert!(matches!(
            validate_purchase(&buyer, &product),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn only_approved_products_can_be_bought() {
        let buyer = make_user(Role::User);
        for status in [
            ProductStatus::Pending,
            ProductStatus::Rejected,
            ProductStatus::Sold,
        ] {
            let product = make_product(Uuid::new_v4(), status);
            assert!(matches!(
                validate_purchase(&buyer, &product),
                Err(AppError::Conflict(_))
            ));
        }
        let product = make_product(Uuid::new_v4(), ProductStatus::Approved);
        assert!(validate_purchase(&buyer, &product).is_ok());
    }

    #[test]
    fn buyers_never_transition_orders() {
        let buyer = make_user(Role::User);
        assert!(matches!(
            may_transition(&buyer, Uuid::new_v4()),
            Err(AppError::Permission(_))
        ));
    }

    #[test]
    fn owning_seller_and_staff_may_transition() {
        let seller = make_user(Role::Seller);
        assert!(may_transition(&seller, seller.id).is_ok());
        assert!(matches!(
            may_transition(&seller, Uuid::new_v4()),
            Err(AppError::Permission(_))
        ));
        for role in [Role::Moderator, Role::Admin, Role::Root] {
            assert!(may_transition(&make_user(role), Uuid::new_v4()).is_ok());
        }
    }

    #[test]
    fn parties_and_staff_may_view_an_order() {
        let buyer = make_user(Role::User);
        let seller = make_user(Role::Seller);
        let order = Order {
            id: Uuid::new_v4(),
            buyer_id: buyer.id,
            product_id: Uuid::new_v4(),
            total_amount: Decimal::from_str("180.00").unwrap(),
            status: OrderStatus::Pending,
            payment_intent_id: None,
            tracking_number: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        assert!(may_view_order(&buyer, &order, seller.id));
        assert!(may_view_order(&seller, &order, seller.id));
        assert!(may_view_order(&make_user(Role::Moderator), &order, seller.id));
        assert!(!may_view_order(&make_user(Role::User), &order, seller.id));
    }
}
