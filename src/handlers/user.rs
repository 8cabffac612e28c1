use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, ensure_owner_or_admin, hash_password},
    error::{AppResult, ErrorBody},
    extract::{ApiJson, IdPath},
    models::{
        CreateUserRequest, ResourceResponse, UpdateRoleRequest, UpdateUserRequest, User,
    },
    store::{UserFilter, UserPatch},
};
use uuid::Uuid;

/// get_users
///
/// [Authenticated Route] Lists every live account.
#[utoipa::path(
    get,
    path = "/api/v1/user",
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn get_users(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.store.users.get_users(&UserFilter::default()).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_user(
    _user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<User>> {
    let user = state.store.users.get_user_by_id(id).await?;
    Ok(Json(user))
}

/// post_user
///
/// [Authenticated Route] Creates an ordinary account. The password is validated,
/// hashed, and then dropped; only the hash is stored.
#[utoipa::path(
    post,
    path = "/api/v1/user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Email taken", body = ErrorBody)
    )
)]
pub async fn post_user(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    req.validate()?;
    let encrypted_password = hash_password(req.password.clone(), state.config.bcrypt_cost).await?;
    let user = state
        .store
        .users
        .insert_user(User::new(req, encrypted_password))
        .await?;

    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// put_user
///
/// [Authenticated Route] Partial profile update of the caller's own account, or
/// any account for an admin.
#[utoipa::path(
    put,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = ResourceResponse),
        (status = 403, description = "Not Owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn put_user(
    user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<ResourceResponse>> {
    ensure_owner_or_admin(&user, id)?;
    let patch = UserPatch {
        first_name: req.first_name,
        last_name: req.last_name,
        role: None,
    };
    state.store.users.update_user(id, patch).await?;
    Ok(Json(ResourceResponse::updated(id)))
}

/// delete_user
///
/// [Authenticated Route] Soft-deletes an account. Its bookings stay intact and its
/// tokens stop resolving.
#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = ResourceResponse),
        (status = 403, description = "Not Owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<ResourceResponse>> {
    ensure_owner_or_admin(&user, id)?;
    state.store.users.delete_user(id).await?;
    tracing::info!(user_id = %id, deleted_by = %user.id, "user deleted");
    Ok(Json(ResourceResponse::deleted(id)))
}

/// set_user_role
///
/// [Admin Route] Promotes or demotes an account. Takes effect on the account's
/// next request, since roles are resolved per request.
#[utoipa::path(
    put,
    path = "/api/v1/admin/user/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = ResourceResponse),
        (status = 403, description = "Not Admin", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn set_user_role(
    admin: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> AppResult<Json<ResourceResponse>> {
    let patch = UserPatch {
        role: Some(req.role),
        ..UserPatch::default()
    };
    state.store.users.update_user(id, patch).await?;
    tracing::info!(user_id = %id, role = ?req.role, changed_by = %admin.id, "role changed");
    Ok(Json(ResourceResponse::updated(id)))
}
