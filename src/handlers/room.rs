use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    extract::{ApiJson, ApiQuery},
    models::{CreateRoomRequest, ReconcileReport, Room, RoomQuery},
    store::RoomFilter,
};

/// get_rooms
///
/// [Authenticated Route] Room listing, optionally by hotel and by availability
/// over `[from_date, till_date)`.
#[utoipa::path(
    get,
    path = "/api/v1/room",
    params(RoomQuery),
    responses(
        (status = 200, description = "Rooms", body = [Room]),
        (status = 400, description = "Invalid range", body = ErrorBody)
    )
)]
pub async fn get_rooms(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RoomQuery>,
) -> AppResult<Json<Vec<Room>>> {
    let range = query.range()?;
    let filter = RoomFilter {
        hotel_id: query.hotel_id,
        ..RoomFilter::default()
    };
    Ok(Json(state.store.available_rooms(&filter, range).await?))
}

/// post_room
///
/// [Admin Route] Creates a room and registers it on its hotel.
///
/// A 500 whose message says the room "was persisted but not registered" means
/// the room exists as an orphan; `POST /admin/room/reconcile` repairs it.
#[utoipa::path(
    post,
    path = "/api/v1/admin/room",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Created", body = Room),
        (status = 400, description = "Malformed room", body = ErrorBody),
        (status = 500, description = "Room orphaned", body = ErrorBody)
    )
)]
pub async fn post_room(
    _admin: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let room = state.store.insert_room(Room::new(req)).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/room/reconcile",
    responses((status = 200, description = "Sweep report", body = ReconcileReport))
)]
pub async fn reconcile_rooms(
    admin: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ReconcileReport>> {
    let report = state.store.reconcile_orphans().await?;
    tracing::info!(
        requested_by = %admin.id,
        repaired = report.repaired.len(),
        unresolved = report.unresolved.len(),
        "orphan sweep finished"
    );
    Ok(Json(report))
}
