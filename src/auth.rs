use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{Role, User},
    store::Store,
};

/// Header carrying the raw JWT (no `Bearer` prefix).
pub const API_TOKEN_HEADER: &str = "x-api-token";
/// Local-only header naming the user to act as.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Only the HMAC family is accepted; anything else in the token header fails
/// validation.
const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims
///
/// Payload of an API token. `sub` is the user id resolved against the Identity
/// Store on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: u64,
    pub exp: u64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Inserted into the request
/// extensions by the auth middleware and taken by handlers as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// issue_token
///
/// Signs an HS256 token for `user_id` that expires after the configured TTL.
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> AppResult<String> {
    let iat = get_current_timestamp();
    let claims = Claims {
        sub: user_id,
        iat,
        exp: iat + config.token_ttl.as_secs(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| AppError::Internal(format!("failed to sign token: {err}")))
}

/// validate_token
///
/// Signature, algorithm family, and expiry check. The detailed error is returned
/// so the caller can log it; it must never reach the client.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Reads the token header. Missing or non-text values end the pipeline.
pub fn extract_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(API_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(stage = "extraction", "request without api token");
            AppError::Unauthorized
        })
}

/// Looks the token subject up. A sound token for an unknown or deleted user
/// is still unauthorized.
pub async fn resolve_identity(store: &Store, user_id: Uuid) -> AppResult<AuthUser> {
    match store.users.get_user_by_id(user_id).await {
        Ok(user) => Ok(user.into()),
        Err(AppError::NotFound(_)) => {
            tracing::warn!(stage = "identity", %user_id, "token subject does not exist");
            Err(AppError::Unauthorized)
        }
        Err(err) => Err(err),
    }
}

/// Role predicate applied per route group.
pub fn authorize(user: &AuthUser, required: Role) -> AppResult<()> {
    if user.role.satisfies(required) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, ?required, "insufficient role");
        Err(AppError::Forbidden)
    }
}

/// Ownership predicate for per-record access (own profile, own booking).
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> AppResult<()> {
    if user.id == owner_id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

async fn dev_bypass(headers: &HeaderMap, store: &Store) -> AppResult<Option<AuthUser>> {
    let Some(user_id) = headers
        .get(DEV_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
    else {
        return Ok(None);
    };

    match store.users.get_user_by_id(user_id).await {
        Ok(user) => {
            tracing::debug!(%user_id, "local bypass authenticated request");
            Ok(Some(user.into()))
        }
        Err(AppError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// AuthUser Extractor Implementation
///
/// Runs the pipeline: extraction, validation, identity resolution. When the auth
/// middleware already resolved the user, the stored identity is reused.
///
/// In `Env::Local` an `x-user-id` header naming a live user short-circuits token
/// validation; otherwise the request falls through to the token flow.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Store: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let store = Store::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(user) = dev_bypass(&parts.headers, &store).await? {
                return Ok(user);
            }
        }

        let token = extract_token(&parts.headers)?;
        let claims = validate_token(token, &config.jwt_secret).map_err(|err| {
            tracing::warn!(stage = "validation", reason = %err, "rejected api token");
            AppError::Unauthorized
        })?;

        resolve_identity(&store, claims.sub).await
    }
}

/// hash_password
///
/// bcrypt is CPU-bound, so hashing runs on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AppError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
}

pub async fn verify_password(password: String, encrypted_password: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &encrypted_password))
        .await
        .map_err(|err| AppError::Internal(format!("password check task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("password check failed: {err}")))
}
