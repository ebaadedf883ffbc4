use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;
use crate::users::role::Role;

/// Public part of a user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

/// Admin-created account with an explicit role.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar_b64: Option<String>,
    #[serde(default = "default_avatar_content_type")]
    pub avatar_content_type: String,
}

fn default_avatar_content_type() -> String {
    "image/jpeg".into()
}

/// Per-actor account statistics.
#[derive(Debug, Serialize)]
pub struct ProfileStats {
    pub total_spent: Decimal,
    pub total_earned: Decimal,
    pub purchases: i64,
    pub listings: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "buyer1".into(),
            email: "buyer1@resalex.com".into(),
            password_hash: "argon2-digest".into(),
            role: Role::User,
            is_active: true,
            avatar_key: None,
            created_at: time::OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("buyer1"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("argon2-digest"));
    }
}
