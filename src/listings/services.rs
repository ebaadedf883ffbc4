use base64::Engine;
use bytes::Bytes;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::listings::dto::{ListingFields, ReviewDecision};
use crate::listings::repo::{self, NewProduct, Product, ProductChanges, ProductStatus};
use crate::state::AppState;
use crate::storage::object_key;
use crate::users::repo::User;
use crate::users::role::{Role, SELLERS, STAFF};

pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be greater than zero".into()));
    }
    Ok(())
}

/// Authorship check: the owning seller, or staff override.
pub fn may_manage(actor: &User, product: &Product) -> Result<(), AppError> {
    if product.seller_id == actor.id || actor.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Permission(
            "only the owning seller or staff may manage this listing".into(),
        ))
    }
}

/// A seller edit sends the listing back to moderation; staff edits keep
/// the current status.
pub fn status_after_edit(actor_role: Role, current: ProductStatus) -> ProductStatus {
    if actor_role.is_staff() {
        current
    } else {
        ProductStatus::Pending
    }
}

async fn store_image(
    state: &AppState,
    seller_id: Uuid,
    b64: &str,
    content_type: &str,
) -> AppResult<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|_| AppError::Validation("invalid base64 image".into()))?;
    let key = object_key("products", seller_id, content_type);
    state
        .storage
        .put_object(&key, Bytes::from(bytes), content_type)
        .await?;
    Ok(key)
}

async fn release_image(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete_object(key).await {
        warn!(error = %e, key = %key, "failed to release stored image");
    }
}

pub async fn create_listing(
    state: &AppState,
    actor: &User,
    fields: ListingFields,
) -> AppResult<Product> {
    actor.role.require(SELLERS)?;
    validate_price(fields.price)?;

    let image_key = match &fields.image_b64 {
        Some(b64) => Some(store_image(state, actor.id, b64, &fields.image_content_type).await?),
        None => None,
    };

    let product = repo::insert(
        &state.db,
        NewProduct {
            name: &fields.name,
            description: &fields.description,
            brand: &fields.brand,
            category: fields.category,
            size: &fields.size,
            condition: fields.condition,
            price: fields.price,
            seller_id: actor.id,
            image_key: image_key.as_deref(),
        },
    )
    .await?;
    info!(product_id = %product.id, seller = %actor.id, "listing created");
    Ok(product)
}

/// Moderation decision. Allowed from any current state so that a listing
/// can be re-reviewed idempotently.
pub async fn review_listing(
    state: &AppState,
    actor: &User,
    product_id: Uuid,
    decision: ReviewDecision,
) -> AppResult<Product> {
    actor.role.require(STAFF)?;
    let product = repo::find_by_id(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    let product = repo::set_status(&state.db, product.id, decision.into()).await?;
    info!(product_id = %product.id, status = ?product.status, actor = %actor.id, "listing reviewed");
    Ok(product)
}

pub async fn edit_listing(
    state: &AppState,
    actor: &User,
    product_id: Uuid,
    fields: ListingFields,
) -> AppResult<Product> {
    let product = repo::find_by_id(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    may_manage(actor, &product)?;
    validate_price(fields.price)?;

    let mut replaced_key = None;
    let image_key = match &fields.image_b64 {
        Some(b64) => {
            let key = store_image(state, product.seller_id, b64, &fields.image_content_type).await?;
            replaced_key = product.image_key.clone();
            Some(key)
        }
        None => product.image_key.clone(),
    };

    let updated = repo::update(
        &state.db,
        product.id,
        ProductChanges {
            name: &fields.name,
            description: &fields.description,
            brand: &fields.brand,
            category: fields.category,
            size: &fields.size,
            condition: fields.condition,
            price: fields.price,
            image_key: image_key.as_deref(),
            status: status_after_edit(actor.role, product.status),
        },
    )
    .await?;

    if let Some(old) = replaced_key {
        release_image(state, &old).await;
    }

    info!(product_id = %updated.id, status = ?updated.status, actor = %actor.id, "listing updated");
    Ok(updated)
}

/// Deletes a listing, releasing the stored image first. A repeated delete
/// reports the listing as missing.
pub async fn delete_listing(state: &AppState, actor: &User, product_id: Uuid) -> AppResult<()> {
    let product = repo::find_by_id(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    may_manage(actor, &product)?;

    if let Some(key) = &product.image_key {
        release_image(state, key).await;
    }
    if !repo::delete(&state.db, product.id).await? {
        return Err(AppError::NotFound("product"));
    }
    info!(product_id = %product.id, actor = %actor.id, "listing deleted");
    Ok(())
}

pub async fn image_url(state: &AppState, product_id: Uuid) -> AppResult<String> {
    let product = repo::find_by_id(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    let key = product.image_key.ok_or(AppError::NotFound("image"))?;
    let url = state.storage.presign_get(&key, 600).await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::repo::{Category, Condition};
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
            name: "Air Jordan 1".into(),
            description: String::new(),
            brand: "Nike".into(),
            category: Category::Sneakers,
            size: "US 9".into(),
            condition: Condition::New,
            price: Decimal::from_str("180.00").unwrap(),
            seller_id,
            image_key: None,
            status,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn price_must_be_positive() {
        assert!(validate_price(Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(matches!(
            validate_price(Decimal::ZERO),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_price(Decimal::from_str("-5").unwrap()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn owner_and_staff_manage_strangers_do_not() {
        let seller = make_user(Role::Seller);
        let product = make_product(seller.id, ProductStatus::Pending);
        assert!(may_manage(&seller, &product).is_ok());
        assert!(may_manage(&make_user(Role::Moderator), &product).is_ok());
        assert!(may_manage(&make_user(Role::Admin), &product).is_ok());
        assert!(matches!(
            may_manage(&make_user(Role::Seller), &product),
            Err(AppError::Permission(_))
        ));
        assert!(matches!(
            may_manage(&make_user(Role::User), &product),
            Err(AppError::Permission(_))
        ));
    }

    #[test]
    fn seller_edit_always_resets_to_pending() {
        for status in [
            ProductStatus::Pending,
            ProductStatus::Approved,
            ProductStatus::Rejected,
            ProductStatus::Sold,
        ] {
            assert_eq!(
                status_after_edit(Role::Seller, status),
                ProductStatus::Pending
            );
        }
    }

    #[test]
    fn staff_edit_never_resets_status() {
        for status in [
            ProductStatus::Pending,
            ProductStatus::Approved,
            ProductStatus::Rejected,
            ProductStatus::Sold,
        ] {
            assert_eq!(status_after_edit(Role::Admin, status), status);
            assert_eq!(status_after_edit(Role::Moderator, status), status);
        }
    }

    #[test]
    fn only_approved_listings_are_purchasable() {
        assert!(ProductStatus::Approved.is_purchasable());
        assert!(!ProductStatus::Pending.is_purchasable());
        assert!(!ProductStatus::Rejected.is_purchasable());
        assert!(!ProductStatus::Sold.is_purchasable());
    }
}
