use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Mounted under `/api/v1` and wrapped by `auth_middleware`, so every handler
/// receives a resolved `AuthUser`. Ownership checks (own profile, own booking)
/// happen inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        // GET/POST /user
        .route("/user", get(handlers::get_users).post(handlers::post_user))
        // GET/PUT/DELETE /user/{id}
        // PUT and DELETE are owner-or-admin.
        .route(
            "/user/{id}",
            get(handlers::get_user)
                .put(handlers::put_user)
                .delete(handlers::delete_user),
        )
        // --- Hotels ---
        .route("/hotel", get(handlers::get_hotels))
        .route("/hotel/{id}", get(handlers::get_hotel))
        // GET /hotel/{id}/rooms
        // Resolves the hotel's room sequence, in order.
        .route("/hotel/{id}/rooms", get(handlers::get_hotel_rooms))
        // --- Rooms ---
        // GET /room?hotel_id=..&from_date=..&till_date=..
        .route("/room", get(handlers::get_rooms))
        // POST /room/{id}/book
        // Overlapping an active booking of the same room is a 409.
        .route("/room/{id}/book", post(handlers::book_room))
        // --- Bookings ---
        .route("/booking", get(handlers::get_my_bookings))
        .route("/booking/{id}", get(handlers::get_booking))
        // GET /booking/{id}/cancel
        .route("/booking/{id}/cancel", get(handlers::cancel_booking))
}
