use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Role, User},
};

/// UserStore
///
/// Identity Store contract. Soft-deleted users are invisible to every method.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_id(&self, id: Uuid) -> AppResult<User>;
    /// Credential lookup; the email match is case-insensitive.
    async fn get_user_by_email(&self, email: &str) -> AppResult<User>;
    /// Fails with `Validation` on missing fields and `Conflict` on a taken email.
    async fn insert_user(&self, user: User) -> AppResult<User>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<()>;
    /// Soft delete: sets `deleted_at`, booking history keeps its references.
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;
    async fn get_users(&self, filter: &UserFilter) -> AppResult<Vec<User>>;
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.email
            .as_ref()
            .is_none_or(|email| user.email.eq_ignore_ascii_case(email))
            && self.role.is_none_or(|role| user.role == role)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

pub(crate) fn ensure_required(user: &User) -> AppResult<()> {
    let missing: Vec<&str> = [
        ("first_name", user.first_name.trim().is_empty()),
        ("last_name", user.last_name.trim().is_empty()),
        ("email", user.email.trim().is_empty()),
        ("encrypted_password", user.encrypted_password.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "missing required user fields: {}",
            missing.join(", ")
        )))
    }
}

pub(crate) fn email_taken() -> AppError {
    AppError::Conflict("an account with this email already exists".to_string())
}
