use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    extract::{ApiJson, ApiQuery, IdPath},
    models::{CreateHotelRequest, Hotel, HotelQuery, ResourceResponse, Room, UpdateHotelRequest},
    store::{HotelFilter, HotelPatch, HotelUpdate},
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/hotel",
    params(HotelQuery),
    responses((status = 200, description = "Hotels", body = [Hotel]))
)]
pub async fn get_hotels(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HotelQuery>,
) -> AppResult<Json<Vec<Hotel>>> {
    let filter = HotelFilter {
        location: query.location,
        ..HotelFilter::default()
    };
    Ok(Json(state.store.hotels.get_hotels(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/hotel/{id}",
    params(("id" = Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Hotel", body = Hotel),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_hotel(
    _user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Hotel>> {
    Ok(Json(state.store.hotels.get_hotel_by_id(id).await?))
}

/// get_hotel_rooms
///
/// [Authenticated Route] Rooms registered on the hotel, in registration order.
/// Orphaned rooms pointing at this hotel are not included.
#[utoipa::path(
    get,
    path = "/api/v1/hotel/{id}/rooms",
    params(("id" = Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Rooms", body = [Room]),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_hotel_rooms(
    _user: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(state.store.rooms_of_hotel(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/hotel",
    request_body = CreateHotelRequest,
    responses(
        (status = 201, description = "Created", body = Hotel),
        (status = 400, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn post_hotel(
    _admin: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateHotelRequest>,
) -> AppResult<(StatusCode, Json<Hotel>)> {
    req.validate()?;
    let hotel = state.store.hotels.insert_hotel(Hotel::new(req)).await?;
    tracing::info!(hotel_id = %hotel.id, "hotel created");
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// put_hotel
///
/// [Admin Route] Direct hotel edit through the generic `update_hotel` primitive.
#[utoipa::path(
    put,
    path = "/api/v1/admin/hotel/{id}",
    params(("id" = Uuid, Path, description = "Hotel ID")),
    request_body = UpdateHotelRequest,
    responses(
        (status = 200, description = "Updated", body = ResourceResponse),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn put_hotel(
    _admin: AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateHotelRequest>,
) -> AppResult<Json<ResourceResponse>> {
    req.validate()?;
    let patch = HotelPatch {
        name: req.name,
        location: req.location,
        rating: req.rating,
    };
    state
        .store
        .hotels
        .update_hotel(&HotelFilter::by_id(id), HotelUpdate::Patch(patch))
        .await?;
    Ok(Json(ResourceResponse::updated(id)))
}
