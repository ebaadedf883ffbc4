use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.len() < 3 || username.len() > 80 {
        return Err(AppError::Validation(
            "username must be between 3 and 80 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 6 {
        return Err(AppError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_new_account(username: &str, email: &str, password: &str) -> Result<(), AppError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)
}

/// Self-registration. The role is always `user`; duplicate username or
/// email surfaces from the uniqueness constraints, so two concurrent
/// registrations can never both win.
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let email = email.trim().to_lowercase();
    validate_new_account(username, &email, password)?;
    let hash = hash_password(password)?;
    let user = User::insert(&state.db, username, &email, &hash, Role::User).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Username/password login. Unknown username, wrong password and blocked
/// account all map to the same rejection.
pub async fn authenticate(state: &AppState, username: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("invalid credentials".into());

    let user = User::find_by_username(&state.db, username)
        .await?
        .ok_or_else(|| {
            warn!(username = %username, "login unknown username");
            invalid()
        })?;

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login on blocked account");
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("buyer1@resalex.com"));
        assert!(is_valid_email("a.b+c@d.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@host.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn short_usernames_and_passwords_are_rejected() {
        assert!(matches!(
            validate_new_account("ab", "ok@example.com", "secret1"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_new_account("abc", "ok@example.com", "short"),
            Err(AppError::Validation(_))
        ));
        assert!(validate_new_account("abc", "ok@example.com", "secret1").is_ok());
    }
}
