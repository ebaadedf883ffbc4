use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Exclusive role tag. Every permission check in the crate goes through
/// `Role::require` / `Role::any_of` rather than inline role lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Seller,
    Moderator,
    Admin,
    Root,
}

/// Roles with moderation and override authority.
pub const STAFF: &[Role] = &[Role::Moderator, Role::Admin, Role::Root];

/// Roles allowed to create listings.
pub const SELLERS: &[Role] = &[Role::Seller, Role::Admin];

/// Roles allowed to mint new accounts with chosen roles.
pub const USER_ADMINS: &[Role] = &[Role::Admin, Role::Root];

impl Role {
    pub fn any_of(self, allowed: &[Role]) -> bool {
        allowed.contains(&self)
    }

    pub fn is_staff(self) -> bool {
        self.any_of(STAFF)
    }

    pub fn require(self, allowed: &[Role]) -> Result<(), AppError> {
        if self.any_of(allowed) {
            Ok(())
        } else {
            Err(AppError::Permission("access denied".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_covers_moderation_roles_only() {
        assert!(Role::Moderator.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::Root.is_staff());
        assert!(!Role::Seller.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn require_rejects_outsiders() {
        assert!(Role::Admin.require(USER_ADMINS).is_ok());
        assert!(Role::Root.require(USER_ADMINS).is_ok());
        let err = Role::Moderator.require(USER_ADMINS).unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
    }

    #[test]
    fn sellers_and_admins_may_list() {
        assert!(Role::Seller.any_of(SELLERS));
        assert!(Role::Admin.any_of(SELLERS));
        assert!(!Role::User.any_of(SELLERS));
        assert!(!Role::Moderator.any_of(SELLERS));
    }
}
