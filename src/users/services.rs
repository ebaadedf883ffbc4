use base64::Engine;
use bytes::Bytes;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::services::{validate_email, validate_new_account, validate_password, validate_username};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::object_key;
use crate::users::dto::{CreateUserRequest, ProfileStats, UpdateProfileRequest};
use crate::users::repo::User;
use crate::users::role::{Role, STAFF, USER_ADMINS};

/// Provisions the protected root account on first boot.
pub async fn ensure_root_user(state: &AppState) -> anyhow::Result<()> {
    if User::find_by_username(&state.db, "root").await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(&state.config.root_password)?;
    let user = User::insert(&state.db, "root", "root@resalex.com", &hash, Role::Root)
        .await
        .map_err(|e| anyhow::anyhow!("create root user: {e}"))?;
    warn!(user_id = %user.id, "root account created with the configured default password; rotate it");
    Ok(())
}

pub async fn create_staff_user(
    state: &AppState,
    actor: &User,
    req: CreateUserRequest,
) -> AppResult<User> {
    actor.role.require(USER_ADMINS)?;
    validate_new_account(&req.username, &req.email, &req.password)?;
    if req.role == Role::Root {
        return Err(AppError::Validation("role root is reserved".into()));
    }
    let hash = hash_password(&req.password)?;
    let user = User::insert(&state.db, &req.username, &req.email, &hash, req.role).await?;
    info!(user_id = %user.id, role = ?user.role, actor = %actor.id, "user created");
    Ok(user)
}

/// Target-level delete rules, separate from the role gate: the root
/// account stays, and nobody removes themselves.
pub fn may_delete_user(actor: &User, target: &User) -> Result<(), AppError> {
    if target.role == Role::Root {
        return Err(AppError::Permission("the root account cannot be deleted".into()));
    }
    if target.id == actor.id {
        return Err(AppError::Permission("you cannot delete your own account".into()));
    }
    Ok(())
}

pub async fn delete_user(state: &AppState, actor: &User, target_id: Uuid) -> AppResult<()> {
    actor.role.require(STAFF)?;
    let target = User::find_by_id(&state.db, target_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    may_delete_user(actor, &target)?;
    User::delete(&state.db, target.id).await?;
    info!(user_id = %target.id, actor = %actor.id, "user deleted");
    Ok(())
}

pub async fn toggle_user_active(state: &AppState, actor: &User, target_id: Uuid) -> AppResult<User> {
    actor.role.require(STAFF)?;
    let target = User::find_by_id(&state.db, target_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let updated = User::set_active(&state.db, target.id, !target.is_active)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    info!(user_id = %updated.id, is_active = updated.is_active, actor = %actor.id, "user active flag toggled");
    Ok(updated)
}

pub async fn list_users(state: &AppState, actor: &User) -> AppResult<Vec<User>> {
    actor.role.require(STAFF)?;
    User::list_all(&state.db).await
}

pub async fn update_profile(
    state: &AppState,
    actor: &User,
    req: UpdateProfileRequest,
) -> AppResult<User> {
    let username = req.username.unwrap_or_else(|| actor.username.clone());
    let email = req.email.unwrap_or_else(|| actor.email.clone());
    validate_username(&username)?;
    validate_email(&email)?;

    let password_hash = match req.password {
        Some(p) => {
            validate_password(&p)?;
            hash_password(&p)?
        }
        None => actor.password_hash.clone(),
    };

    let mut avatar_key = actor.avatar_key.clone();
    if let Some(b64) = req.avatar_b64 {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|_| AppError::Validation("invalid base64 avatar".into()))?;
        let key = object_key("avatars", actor.id, &req.avatar_content_type);
        state
            .storage
            .put_object(&key, Bytes::from(bytes), &req.avatar_content_type)
            .await?;
        if let Some(old) = avatar_key.replace(key) {
            if let Err(e) = state.storage.delete_object(&old).await {
                warn!(error = %e, key = %old, "failed to release replaced avatar");
            }
        }
    }

    User::update_profile(
        &state.db,
        actor.id,
        &username,
        &email,
        &password_hash,
        avatar_key.as_deref(),
    )
    .await
}

pub async fn profile_stats(state: &AppState, actor: &User) -> AppResult<ProfileStats> {
    let (total_spent, purchases): (Option<Decimal>, i64) = sqlx::query_as(
        "SELECT SUM(total_amount), COUNT(*) FROM orders WHERE buyer_id = $1",
    )
    .bind(actor.id)
    .fetch_one(&state.db)
    .await?;

    let (total_earned, listings) = if actor.role.any_of(&[Role::Seller, Role::Moderator, Role::Admin]) {
        let earned: (Option<Decimal>,) = sqlx::query_as(
            r#"
            SELECT SUM(o.total_amount)
            FROM orders o
            JOIN products p ON p.id = o.product_id
            WHERE p.seller_id = $1
            "#,
        )
        .bind(actor.id)
        .fetch_one(&state.db)
        .await?;
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE seller_id = $1")
                .bind(actor.id)
                .fetch_one(&state.db)
                .await?;
        (earned.0, count.0)
    } else {
        (None, 0)
    };

    Ok(ProfileStats {
        total_spent: total_spent.unwrap_or_default(),
        total_earned: total_earned.unwrap_or_default(),
        purchases,
        listings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn root_cannot_be_deleted_by_anyone() {
        let root = make_user(Role::Root);
        for role in [Role::User, Role::Seller, Role::Moderator, Role::Admin, Role::Root] {
            let actor = make_user(role);
            assert!(matches!(
                may_delete_user(&actor, &root),
                Err(AppError::Permission(_))
            ));
        }
    }

    #[test]
    fn self_delete_is_forbidden() {
        let admin = make_user(Role::Admin);
        assert!(matches!(
            may_delete_user(&admin, &admin),
            Err(AppError::Permission(_))
        ));
    }

    #[test]
    fn staff_may_delete_ordinary_users() {
        let admin = make_user(Role::Admin);
        let target = make_user(Role::Seller);
        assert!(may_delete_user(&admin, &target).is_ok());
    }
}
