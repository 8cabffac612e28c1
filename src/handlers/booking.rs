use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, ensure_owner_or_admin},
    error::{AppResult, ErrorBody},
    extract::{ApiJson, ApiQuery, IdPath},
    models::{BookRoomRequest, Booking, BookingQuery},
    store::BookingFilter,
};
use uuid::Uuid;

/// book_room
///
/// [Authenticated Route] Books the room for the caller. Overlap with an active
/// booking of the same room is a 409 and writes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/room/{id}/book",
    params(("id" = Uuid, Path, description = "Room ID")),
    request_body = BookRoomRequest,
    responses(
        (status = 201, description = "Booked", body = Booking),
        (status = 404, description = "Room Not Found", body = ErrorBody),
        (status = 409, description = "Dates taken", body = ErrorBody)
    )
)]
pub async fn book_room(
    user: AuthUser,
    State(state): State<AppState>,
    IdPath(room_id): IdPath,
    ApiJson(req): ApiJson<BookRoomRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let range = req.validate()?;
    let booking = state
        .store
        .create_booking(user.id, room_id, range, req.num_persons)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// get_my_bookings
///
/// [Authenticated Route] The caller's own bookings, canceled ones included.
#[utoipa::path(
    get,
    path = "/api/v1/booking",
    responses((status = 200, description = "My Bookings", body = [Booking]))
)]
pub async fn get_my_bookings(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state
        .store
        .bookings
        .get_bookings(&BookingFilter::for_user(user.id))
        .await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/booking/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 403, description = "Not Owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_booking(
    user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Booking>> {
    let booking = state.store.bookings.get_booking_by_id(id).await?;
    ensure_owner_or_admin(&user, booking.user_id)?;
    Ok(Json(booking))
}

/// cancel_booking
///
/// [Authenticated Route] Cancels a booking owned by the caller (any booking for
/// an admin). A second cancel is a 409 `booking already canceled`.
#[utoipa::path(
    get,
    path = "/api/v1/booking/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Canceled", body = Booking),
        (status = 403, description = "Not Owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Already canceled", body = ErrorBody)
    )
)]
pub async fn cancel_booking(
    user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Booking>> {
    let booking = state.store.bookings.get_booking_by_id(id).await?;
    ensure_owner_or_admin(&user, booking.user_id)?;

    let canceled = state.store.bookings.cancel_booking(id).await?;
    tracing::info!(booking_id = %id, canceled_by = %user.id, "booking canceled");
    Ok(Json(canceled))
}

/// get_bookings
///
/// [Admin Route] Every booking in the system, optionally filtered.
#[utoipa::path(
    get,
    path = "/api/v1/admin/booking",
    params(BookingQuery),
    responses(
        (status = 200, description = "All Bookings", body = [Booking]),
        (status = 403, description = "Not Admin", body = ErrorBody)
    )
)]
pub async fn get_bookings(
    _admin: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let filter = BookingFilter {
        user_id: query.user_id,
        room_id: query.room_id,
        status: query.status,
    };
    Ok(Json(state.store.bookings.get_bookings(&filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/booking/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Confirmed", body = Booking),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Booking canceled", body = ErrorBody)
    )
)]
pub async fn confirm_booking(
    _admin: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.store.bookings.confirm_booking(id).await?))
}
