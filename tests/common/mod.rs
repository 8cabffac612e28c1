#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use hotel_booking::{
    AppConfig, AppState, create_router,
    auth::{API_TOKEN_HEADER, hash_password, issue_token},
    models::{CreateHotelRequest, CreateUserRequest, Hotel, Role, User},
    store::{Store, UserPatch},
};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse";

pub fn test_state() -> AppState {
    AppState::new(Store::in_memory(), AppConfig::default())
}

/// Inserts a live account with `role` and returns it.
pub async fn seed_user(store: &Store, email: &str, role: Role) -> User {
    let req = CreateUserRequest {
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
    };
    let hash = hash_password(req.password.clone(), 4).await.unwrap();
    let user = store.users.insert_user(User::new(req, hash)).await.unwrap();
    if role != Role::User {
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        store.users.update_user(user.id, patch).await.unwrap();
    }
    store.users.get_user_by_id(user.id).await.unwrap()
}

pub async fn seed_hotel(store: &Store, name: &str) -> Hotel {
    store
        .hotels
        .insert_hotel(Hotel::new(CreateHotelRequest {
            name: name.to_string(),
            location: "Lisbon".to_string(),
            rating: 4,
        }))
        .await
        .unwrap()
}

pub fn token_for(user: &User, config: &AppConfig) -> String {
    issue_token(user.id, config).unwrap()
}

/// One request through the full router (all layers included).
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(API_TOKEN_HEADER, token);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub fn app(state: AppState) -> Router {
    create_router(state)
}
