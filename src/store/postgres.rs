use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    booking::{self, BookingFilter, BookingStore},
    hotel::{self, HotelFilter, HotelStore, HotelUpdate},
    room::{RoomFilter, RoomStore},
    user::{self, UserFilter, UserPatch, UserStore},
};
use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingStatus, DateRange, Hotel, Room, User},
};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, encrypted_password, role, created_at, deleted_at";
const HOTEL_COLUMNS: &str = "id, name, location, rating, rooms";
const ROOM_COLUMNS: &str = "id, hotel_id, size, seaside, price, created_at";
const BOOKING_COLUMNS: &str =
    "id, user_id, room_id, from_date, till_date, num_persons, status, created_at";

// Postgres error codes surfaced as domain errors.
const EXCLUSION_VIOLATION: &str = "23P01";
const USERS_EMAIL_INDEX: &str = "users_email_live_idx";

/// Maps a driver error onto the taxonomy, keeping operation and entity as context.
/// Logging happens once, where the error is rendered.
fn db_error(operation: &'static str, entity: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| match err {
        sqlx::Error::PoolTimedOut => AppError::Timeout,
        sqlx::Error::PoolClosed => AppError::Canceled,
        other => AppError::store(operation, entity, other),
    }
}

fn is_email_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(USERS_EMAIL_INDEX)
    )
}

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION))
}

// --- Users ---

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get_user_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get", "user"))?
        .ok_or(AppError::NotFound("user"))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get", "user"))?
        .ok_or(AppError::NotFound("user"))
    }

    /// insert_user
    ///
    /// Uniqueness is enforced by the partial index on `lower(email)` for live rows;
    /// a violation of that index becomes `Conflict`. Any other constraint failure
    /// stays a store error.
    async fn insert_user(&self, user: User) -> AppResult<User> {
        user::ensure_required(&user)?;
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, NULL) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.encrypted_password)
        .bind(user.role)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_email_violation(&err) {
                user::email_taken()
            } else {
                db_error("insert", "user")(err)
            }
        })
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role)
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.role)
        .execute(&self.pool)
        .await
        .map_err(db_error("update", "user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_error("delete", "user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    async fn get_users(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL"
        ));
        if let Some(email) = &filter.email {
            builder.push(" AND lower(email) = lower(");
            builder.push_bind(email.clone());
            builder.push(")");
        }
        if let Some(role) = filter.role {
            builder.push(" AND role = ");
            builder.push_bind(role);
        }
        builder.push(" ORDER BY created_at ASC");

        builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list", "user"))
    }
}

// --- Hotels ---

pub struct PostgresHotelStore {
    pool: PgPool,
}

impl PostgresHotelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_hotel_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &HotelFilter) {
    if let Some(id) = filter.id {
        builder.push(" AND id = ");
        builder.push_bind(id);
    }
    if let Some(location) = &filter.location {
        builder.push(" AND lower(location) = lower(");
        builder.push_bind(location.clone());
        builder.push(")");
    }
}

#[async_trait]
impl HotelStore for PostgresHotelStore {
    async fn insert_hotel(&self, hotel: Hotel) -> AppResult<Hotel> {
        sqlx::query_as::<_, Hotel>(&format!(
            "INSERT INTO hotels ({HOTEL_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {HOTEL_COLUMNS}"
        ))
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(&hotel.location)
        .bind(hotel.rating)
        .bind(&hotel.rooms)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("insert", "hotel"))
    }

    async fn get_hotel_by_id(&self, id: Uuid) -> AppResult<Hotel> {
        sqlx::query_as::<_, Hotel>(&format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get", "hotel"))?
            .ok_or(AppError::NotFound("hotel"))
    }

    async fn get_hotels(&self, filter: &HotelFilter) -> AppResult<Vec<Hotel>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE TRUE"));
        push_hotel_filter(&mut builder, filter);
        builder.push(" ORDER BY name ASC");

        builder
            .build_query_as::<Hotel>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list", "hotel"))
    }

    /// update_hotel
    ///
    /// `PushRoom` is a single `UPDATE` whose CASE keeps the sequence duplicate-free,
    /// so a matched row always counts as applied.
    async fn update_hotel(&self, filter: &HotelFilter, update: HotelUpdate) -> AppResult<()> {
        hotel::reject_unfiltered(filter)?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE hotels SET ");
        match update {
            HotelUpdate::PushRoom(room_id) => {
                builder.push("rooms = CASE WHEN ");
                builder.push_bind(room_id);
                builder.push(" = ANY(rooms) THEN rooms ELSE array_append(rooms, ");
                builder.push_bind(room_id);
                builder.push(") END");
            }
            HotelUpdate::Patch(patch) => {
                builder.push("name = COALESCE(");
                builder.push_bind(patch.name);
                builder.push(", name), location = COALESCE(");
                builder.push_bind(patch.location);
                builder.push(", location), rating = COALESCE(");
                builder.push_bind(patch.rating);
                builder.push(", rating)");
            }
        }
        builder.push(" WHERE TRUE");
        push_hotel_filter(&mut builder, filter);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error("update", "hotel"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("hotel"));
        }
        Ok(())
    }
}

// --- Rooms ---

pub struct PostgresRoomStore {
    pool: PgPool,
}

impl PostgresRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for PostgresRoomStore {
    async fn persist_room(&self, room: Room) -> AppResult<Room> {
        room.validate()?;
        sqlx::query_as::<_, Room>(&format!(
            "INSERT INTO rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room.id)
        .bind(room.hotel_id)
        .bind(room.size)
        .bind(room.seaside)
        .bind(room.price)
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("insert", "room"))
    }

    async fn get_room_by_id(&self, id: Uuid) -> AppResult<Room> {
        sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get", "room"))?
            .ok_or(AppError::NotFound("room"))
    }

    async fn get_rooms(&self, filter: &RoomFilter) -> AppResult<Vec<Room>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE TRUE"));
        if let Some(hotel_id) = filter.hotel_id {
            builder.push(" AND hotel_id = ");
            builder.push_bind(hotel_id);
        }
        if let Some(ids) = &filter.ids {
            builder.push(" AND id = ANY(");
            builder.push_bind(ids.clone());
            builder.push(")");
        }
        builder.push(" ORDER BY created_at ASC");

        builder
            .build_query_as::<Room>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list", "room"))
    }
}

// --- Bookings ---

pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    /// create_booking
    ///
    /// Checks for overlap, then inserts. Two racing inserts that both pass the
    /// check are caught by the `bookings_no_overlap` exclusion constraint, and the
    /// loser gets the same `Conflict` as the check would have produced.
    async fn create_booking(&self, booking: Booking) -> AppResult<Booking> {
        if !self
            .find_overlapping(&[booking.room_id], booking.range())
            .await?
            .is_empty()
        {
            return Err(booking::room_taken());
        }

        sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.room_id)
        .bind(booking.from_date)
        .bind(booking.till_date)
        .bind(booking.num_persons)
        .bind(booking.status)
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_exclusion_violation(&err) {
                booking::room_taken()
            } else {
                db_error("insert", "booking")(err)
            }
        })
    }

    async fn get_booking_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get", "booking"))?
        .ok_or(AppError::NotFound("booking"))
    }

    async fn get_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE TRUE"));
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(room_id) = filter.room_id {
            builder.push(" AND room_id = ");
            builder.push_bind(room_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        builder.push(" ORDER BY created_at ASC");

        builder
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list", "booking"))
    }

    async fn find_overlapping(
        &self,
        room_ids: &[Uuid],
        range: DateRange,
    ) -> AppResult<Vec<Booking>> {
        if room_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE room_id = ANY($1) AND status <> 'canceled' AND from_date < $3 AND $2 < till_date"
        ))
        .bind(room_ids)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("availability", "booking"))
    }

    /// cancel_booking
    ///
    /// The conditional UPDATE is the state transition; when it matches nothing, a
    /// follow-up read tells "no such booking" apart from "already canceled".
    async fn cancel_booking(&self, id: Uuid) -> AppResult<Booking> {
        let canceled = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = 'canceled' WHERE id = $1 AND status <> 'canceled' \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("cancel", "booking"))?;

        match canceled {
            Some(booking) => Ok(booking),
            None => {
                self.get_booking_by_id(id).await?;
                Err(AppError::AlreadyCanceled)
            }
        }
    }

    async fn confirm_booking(&self, id: Uuid) -> AppResult<Booking> {
        let confirmed = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = 'confirmed' WHERE id = $1 AND status = 'pending' \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("confirm", "booking"))?;

        if let Some(booking) = confirmed {
            return Ok(booking);
        }
        let current = self.get_booking_by_id(id).await?;
        match current.status {
            BookingStatus::Canceled => Err(booking::confirm_canceled()),
            BookingStatus::Pending | BookingStatus::Confirmed => Ok(current),
        }
    }
}
