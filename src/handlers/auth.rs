use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::{issue_token, verify_password},
    error::{AppError, AppResult, ErrorBody},
    extract::ApiJson,
    models::{AuthRequest, AuthResponse},
};

/// authenticate
///
/// [Public Route] Exchanges an email/password pair for an API token.
///
/// An unknown email and a wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AuthRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = match state.store.users.get_user_by_email(&req.email).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(err) => return Err(err),
    };

    if !verify_password(req.password, user.encrypted_password.clone()).await? {
        tracing::info!(user_id = %user.id, "password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.config)?;
    tracing::info!(user_id = %user.id, "token issued");
    Ok(Json(AuthResponse { user, token }))
}
