use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Mounted under `/api/v1/admin`. `admin_middleware` rejects non-admin callers
/// with 403 before any of these handlers run.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/booking?user_id=..&room_id=..&status=..
        // Every booking, not just the caller's.
        .route("/booking", get(handlers::get_bookings))
        .route("/booking/{id}/confirm", post(handlers::confirm_booking))
        .route("/hotel", post(handlers::post_hotel))
        .route("/hotel/{id}", put(handlers::put_hotel))
        // POST /admin/room
        // Persists the room, then registers it on its hotel. No rollback.
        .route("/room", post(handlers::post_room))
        // POST /admin/room/reconcile
        // Re-registers orphaned rooms on their hotels.
        .route("/room/reconcile", post(handlers::reconcile_rooms))
        .route("/user/{id}/role", put(handlers::set_user_role))
}
