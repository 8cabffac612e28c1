use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MIN_FIRST_NAME_LEN: usize = 2;
const MIN_LAST_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 7;

// --- Core Records (Mapped to Database) ---

/// Role
///
/// The two authorization tiers. Stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Admin satisfies every tier; User satisfies only the user tier.
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::User => true,
            Role::Admin => self == Role::Admin,
        }
    }
}

/// User
///
/// The identity record. `encrypted_password` is never serialized, and a set
/// `deleted_at` hides the record from every store lookup.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub encrypted_password: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(req: CreateUserRequest, encrypted_password: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            encrypted_password,
            role: Role::User,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

/// Hotel
///
/// `rooms` is the authoritative, ordered membership list for this hotel.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub rating: i32,
    pub rooms: Vec<Uuid>,
}

impl Hotel {
    pub fn new(req: CreateHotelRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            location: req.location,
            rating: req.rating,
            rooms: Vec::new(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "room_size", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RoomSize {
    Small,
    #[default]
    Normal,
    Kingsize,
}

/// Room
///
/// `hotel_id` is a lookup-only back reference and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Room {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub size: RoomSize,
    pub seaside: bool,
    pub price: f64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(req: CreateRoomRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            hotel_id: req.hotel_id,
            size: req.size,
            seaside: req.seaside,
            price: req.price,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::Validation(
                "room price must be a positive amount".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Canceled,
}

/// DateRange
///
/// Half-open `[start, end)` range of calendar days. Construction rejects empty
/// and inverted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::Validation(
                "till_date must be after from_date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Booking
///
/// Bookings are never deleted; cancellation is a status transition.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    #[ts(type = "string")]
    pub from_date: NaiveDate,
    #[ts(type = "string")]
    pub till_date: NaiveDate,
    pub num_persons: i32,
    pub status: BookingStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, room_id: Uuid, range: DateRange, num_persons: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            room_id,
            from_date: range.start(),
            till_date: range.end(),
            num_persons,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.from_date,
            end: self.till_date,
        }
    }

    /// Only non-canceled bookings hold their room.
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Canceled
    }
}

// --- Request Payloads (Input Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// CreateUserRequest
///
/// Registration payload. The password is hashed before it reaches any store and
/// is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    /// Collects every violated rule into a single validation error.
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.first_name.trim().chars().count() < MIN_FIRST_NAME_LEN {
            errors.push(format!(
                "first_name length should be at least {MIN_FIRST_NAME_LEN} characters"
            ));
        }
        if self.last_name.trim().chars().count() < MIN_LAST_NAME_LEN {
            errors.push(format!(
                "last_name length should be at least {MIN_LAST_NAME_LEN} characters"
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "password length should be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        if !is_email_valid(&self.email) {
            errors.push(format!("email {} is invalid", self.email));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors.join("; ")))
        }
    }
}

fn is_email_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// UpdateUserRequest
///
/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateHotelRequest {
    pub name: String,
    pub location: String,
    pub rating: i32,
}

impl CreateHotelRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() || self.location.trim().is_empty() {
            return Err(AppError::Validation(
                "hotel name and location are required".to_string(),
            ));
        }
        validate_rating(self.rating)
    }
}

/// UpdateHotelRequest
///
/// Partial hotel edit; the room sequence cannot be edited through it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateHotelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

impl UpdateHotelRequest {
    pub fn validate(&self) -> AppResult<()> {
        match self.rating {
            Some(rating) => validate_rating(rating),
            None => Ok(()),
        }
    }
}

fn validate_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "hotel rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateRoomRequest {
    pub hotel_id: Uuid,
    #[serde(default)]
    pub size: RoomSize,
    #[serde(default)]
    pub seaside: bool,
    pub price: f64,
}

/// BookRoomRequest
///
/// Payload for `POST /room/{id}/book`; the date range is half-open.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BookRoomRequest {
    #[ts(type = "string")]
    pub from_date: NaiveDate,
    #[ts(type = "string")]
    pub till_date: NaiveDate,
    pub num_persons: i32,
}

impl BookRoomRequest {
    pub fn validate(&self) -> AppResult<DateRange> {
        if self.num_persons < 1 {
            return Err(AppError::Validation(
                "num_persons must be at least 1".to_string(),
            ));
        }
        DateRange::new(self.from_date, self.till_date)
    }
}

// --- Query Parameters ---

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HotelQuery {
    pub location: Option<String>,
}

/// RoomQuery
///
/// Room listing filter. When both dates are given, only rooms free for the whole
/// range are returned.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomQuery {
    pub hotel_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub till_date: Option<NaiveDate>,
}

impl RoomQuery {
    pub fn range(&self) -> AppResult<Option<DateRange>> {
        match (self.from_date, self.till_date) {
            (Some(from), Some(till)) => DateRange::new(from, till).map(Some),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "from_date and till_date must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    pub user_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResourceResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Uuid>,
}

impl ResourceResponse {
    pub fn updated(id: Uuid) -> Self {
        Self {
            updated: Some(id),
            deleted: None,
        }
    }

    pub fn deleted(id: Uuid) -> Self {
        Self {
            updated: None,
            deleted: Some(id),
        }
    }
}

/// ReconcileReport
///
/// Result of the orphan-room sweep: rooms re-registered on their hotel, and rooms
/// whose hotel no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ReconcileReport {
    pub repaired: Vec<Uuid>,
    pub unresolved: Vec<Uuid>,
}
