mod common;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::send;
use hotel_booking::{
    AppConfig, AppResult, AppState, create_router,
    models::{Role, User},
    store::{
        MemoryBookingStore, MemoryHotelStore, MemoryRoomStore, MemoryUserStore, Store, UserFilter,
        UserPatch, UserStore,
    },
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use uuid::Uuid;

// --- Slow Identity Store (deadline tests) ---

// Answers identity lookups immediately but stalls listings past any sane deadline.
struct SlowListingUserStore {
    inner: MemoryUserStore,
    delay: Duration,
}

#[async_trait]
impl UserStore for SlowListingUserStore {
    async fn get_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.inner.get_user_by_id(id).await
    }
    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.inner.get_user_by_email(email).await
    }
    async fn insert_user(&self, user: User) -> AppResult<User> {
        self.inner.insert_user(user).await
    }
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<()> {
        self.inner.update_user(id, patch).await
    }
    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.inner.delete_user(id).await
    }
    async fn get_users(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_users(filter).await
    }
}

struct TestApp {
    state: AppState,
    router: axum::Router,
}

impl TestApp {
    fn new() -> Self {
        let state = common::test_state();
        let router = create_router(state.clone());
        Self { state, router }
    }

    async fn user(&self, email: &str, role: Role) -> (User, String) {
        let user = common::seed_user(&self.state.store, email, role).await;
        let token = common::token_for(&user, &self.state.config);
        (user, token)
    }

    async fn call(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.router, method, uri, Some(token), body).await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_missing_or_bad_token_gets_generic_unauthorized() {
    let app = TestApp::new();
    let expected = json!({ "code": 401, "error": "unauthorized" });

    let (status, body) = send(&app.router, Method::GET, "/api/v1/hotel", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);

    let (status, body) = app.call(Method::GET, "/api/v1/hotel", "bogus-token", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);

    let (status, body) = send(&app.router, Method::GET, "/api/v1/admin/booking", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_admin_route_forbidden_until_role_is_elevated() {
    let app = TestApp::new();
    let (user, token) = app.user("guest@example.com", Role::User).await;

    let (status, body) = app.call(Method::GET, "/api/v1/admin/booking", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "code": 403, "error": "forbidden" }));

    let patch = UserPatch {
        role: Some(Role::Admin),
        ..UserPatch::default()
    };
    app.state.store.users.update_user(user.id, patch).await.unwrap();

    let (status, body) = app.call(Method::GET, "/api/v1/admin/booking", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_hotel_room_booking_lifecycle() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, guest) = app.user("guest@example.com", Role::User).await;

    let (status, hotel) = app
        .call(
            Method::POST,
            "/api/v1/admin/hotel",
            &admin,
            Some(json!({ "name": "Bellucia", "location": "France", "rating": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let hotel_id = hotel["id"].as_str().unwrap().to_string();

    let (status, room) = app
        .call(
            Method::POST,
            "/api/v1/admin/room",
            &admin,
            Some(json!({ "hotel_id": hotel_id, "size": "kingsize", "seaside": true, "price": 199.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id = room["id"].as_str().unwrap().to_string();

    let (status, hotel) = app
        .call(Method::GET, &format!("/api/v1/hotel/{hotel_id}"), &guest, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hotel["rooms"], json!([room_id]));

    let book_uri = format!("/api/v1/room/{room_id}/book");
    let (status, first) = app
        .call(
            Method::POST,
            &book_uri,
            &guest,
            Some(json!({ "from_date": "2024-01-01", "till_date": "2024-01-05", "num_persons": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "pending");
    let first_id = first["id"].as_str().unwrap().to_string();

    let overlapping = json!({ "from_date": "2024-01-03", "till_date": "2024-01-06", "num_persons": 2 });
    let (status, body) = app
        .call(Method::POST, &book_uri, &guest, Some(overlapping.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, canceled) = app
        .call(Method::GET, &format!("/api/v1/booking/{first_id}/cancel"), &guest, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(canceled["status"], "canceled");

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/booking/{first_id}/cancel"), &guest, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "code": 409, "error": "booking already canceled" }));

    let (status, _) = app
        .call(Method::POST, &book_uri, &guest, Some(overlapping))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, mine) = app.call(Method::GET, "/api/v1/booking", &guest, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, rooms) = app
        .call(Method::GET, &format!("/api/v1/hotel/{hotel_id}/rooms"), &guest, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms[0]["id"], room_id);

    let (status, free) = app
        .call(
            Method::GET,
            &format!("/api/v1/room?hotel_id={hotel_id}&from_date=2024-01-04&till_date=2024-01-05"),
            &guest,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(free, json!([]));
}

#[tokio::test]
async fn test_bookings_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let (owner, owner_token) = app.user("owner@example.com", Role::User).await;
    let (_, other_token) = app.user("other@example.com", Role::User).await;
    let (_, admin_token) = app.user("admin@example.com", Role::Admin).await;

    let hotel = common::seed_hotel(&app.state.store, "Bellucia").await;
    let room = app
        .state
        .store
        .insert_room(hotel_booking::models::Room::new(hotel_booking::models::CreateRoomRequest {
            hotel_id: hotel.id,
            size: Default::default(),
            seaside: false,
            price: 90.0,
        }))
        .await
        .unwrap();

    let (status, booking) = app
        .call(
            Method::POST,
            &format!("/api/v1/room/{}/book", room.id),
            &owner_token,
            Some(json!({ "from_date": "2024-02-01", "till_date": "2024-02-03", "num_persons": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["user_id"], owner.id.to_string());
    let booking_id = booking["id"].as_str().unwrap().to_string();
    let booking_uri = format!("/api/v1/booking/{booking_id}");

    let (status, _) = app.call(Method::GET, &booking_uri, &other_token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .call(Method::GET, &format!("{booking_uri}/cancel"), &other_token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::GET, &booking_uri, &admin_token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, confirmed) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/booking/{booking_id}/confirm"),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
}

#[tokio::test]
async fn test_error_envelopes_for_bad_input() {
    let app = TestApp::new();
    let (_, token) = app.user("guest@example.com", Role::User).await;

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/hotel/{}", Uuid::new_v4()), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "code": 404, "error": "hotel resourse not found" }));

    let (status, body) = app.call(Method::GET, "/api/v1/hotel/not-a-uuid", &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "code": 400, "error": "invalid id given" }));

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/room/{}/book", Uuid::new_v4()),
            &token,
            Some(json!({ "from_date": "yesterday" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid JSON request");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/room/{}/book", Uuid::new_v4()),
            &token,
            Some(json!({ "from_date": "2024-01-05", "till_date": "2024-01-01", "num_persons": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "till_date must be after from_date");

    let (status, body) = app
        .call(Method::GET, "/api/v1/room?from_date=2024-01-01", &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_user_registration_and_login() {
    let app = TestApp::new();
    let (_, token) = app.user("guest@example.com", Role::User).await;
    let registration = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "password": "analytical"
    });

    let (status, user) = app
        .call(Method::POST, "/api/v1/user", &token, Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");
    assert!(user.get("encrypted_password").is_none());

    let (status, body) = app
        .call(Method::POST, "/api/v1/user", &token, Some(registration))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, auth) = send(
        &app.router,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "ada@example.com", "password": "analytical" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(auth["user"]["email"], "ada@example.com");
    let issued = auth["token"].as_str().unwrap();
    let (status, _) = app.call(Method::GET, "/api/v1/booking", issued, None).await;
    assert_eq!(status, StatusCode::OK);

    for credentials in [
        json!({ "email": "ada@example.com", "password": "wrong-password" }),
        json!({ "email": "nobody@example.com", "password": "analytical" }),
    ] {
        let (status, body) =
            send(&app.router, Method::POST, "/api/auth", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "code": 401, "error": "invalid credentials" }));
    }
}

#[tokio::test]
async fn test_profile_edits_require_ownership() {
    let app = TestApp::new();
    let (user, token) = app.user("guest@example.com", Role::User).await;
    let (other, _) = app.user("other@example.com", Role::User).await;

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/user/{}", user.id),
            &token,
            Some(json!({ "first_name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": user.id }));

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/v1/user/{}", other.id), &token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/v1/user/{}", user.id), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": user.id }));

    // The deleted account's token no longer resolves.
    let (status, _) = app.call(Method::GET, "/api/v1/user", &token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orphaned_room_surfaces_as_store_error_and_reconciles() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let missing_hotel = Uuid::new_v4();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/admin/room",
            &admin,
            Some(json!({ "hotel_id": missing_hotel, "price": 80.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("persisted but not registered")
    );

    let (status, report) = app
        .call(Method::POST, "/api/v1/admin/room/reconcile", &admin, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["repaired"], json!([]));
    assert_eq!(report["unresolved"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_slow_store_call_hits_the_request_deadline() {
    let store = Store {
        users: Arc::new(SlowListingUserStore {
            inner: MemoryUserStore::new(),
            delay: Duration::from_secs(5),
        }),
        hotels: Arc::new(MemoryHotelStore::new()),
        rooms: Arc::new(MemoryRoomStore::new()),
        bookings: Arc::new(MemoryBookingStore::new()),
    };
    let config = AppConfig {
        request_timeout: Duration::from_millis(50),
        ..AppConfig::default()
    };
    let user = common::seed_user(&store, "guest@example.com", Role::User).await;
    let token = common::token_for(&user, &config);
    let router = create_router(AppState::new(store, config));

    let (status, body) = send(&router, Method::GET, "/api/v1/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, json!({ "code": 504, "error": "request deadline exceeded" }));

    // Requests that finish in time are unaffected.
    let (status, _) = send(&router, Method::GET, "/api/v1/hotel", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_served_over_tcp_with_request_id() {
    let state = common::test_state();
    common::seed_user(&state.store, "tcp@example.com", Role::User).await;
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{address}/api/auth"))
        .json(&json!({ "email": "tcp@example.com", "password": common::TEST_PASSWORD }))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    let auth: Value = response.json().await.unwrap();

    let response = client
        .get(format!("{address}/api/v1/booking"))
        .header("x-api-token", auth["token"].as_str().unwrap())
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), 200);
    let bookings: Vec<Value> = response.json().await.unwrap();
    assert!(bookings.is_empty());
}
