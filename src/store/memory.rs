use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
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

// In-process collections. Each method holds its collection lock for the whole
// operation, which gives the same per-operation atomicity a document store gives.
// Used by STORE_BACKEND=memory and by the test suites.

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned()
            .ok_or(AppError::NotFound("user"))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.deleted_at.is_none())
            .cloned()
            .ok_or(AppError::NotFound("user"))
    }

    async fn insert_user(&self, user: User) -> AppResult<User> {
        user::ensure_required(&user)?;
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(user::email_taken());
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(AppError::NotFound("user"))?;
        patch.apply(user);
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(AppError::NotFound("user"))?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn get_users(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.deleted_at.is_none() && filter.matches(u))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryHotelStore {
    hotels: RwLock<Vec<Hotel>>,
}

impl MemoryHotelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotelStore for MemoryHotelStore {
    async fn insert_hotel(&self, hotel: Hotel) -> AppResult<Hotel> {
        self.hotels.write().await.push(hotel.clone());
        Ok(hotel)
    }

    async fn get_hotel_by_id(&self, id: Uuid) -> AppResult<Hotel> {
        self.hotels
            .read()
            .await
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or(AppError::NotFound("hotel"))
    }

    async fn get_hotels(&self, filter: &HotelFilter) -> AppResult<Vec<Hotel>> {
        Ok(self
            .hotels
            .read()
            .await
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect())
    }

    async fn update_hotel(&self, filter: &HotelFilter, update: HotelUpdate) -> AppResult<()> {
        hotel::reject_unfiltered(filter)?;
        let mut hotels = self.hotels.write().await;
        let mut matched = 0;
        for hotel in hotels.iter_mut().filter(|h| filter.matches(h)) {
            update.apply(hotel);
            matched += 1;
        }
        if matched == 0 {
            return Err(AppError::NotFound("hotel"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<Vec<Room>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn persist_room(&self, room: Room) -> AppResult<Room> {
        room.validate()?;
        self.rooms.write().await.push(room.clone());
        Ok(room)
    }

    async fn get_room_by_id(&self, id: Uuid) -> AppResult<Room> {
        self.rooms
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(AppError::NotFound("room"))
    }

    async fn get_rooms(&self, filter: &RoomFilter) -> AppResult<Vec<Room>> {
        Ok(self
            .rooms
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<Vec<Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn overlapping<'a>(
    bookings: &'a [Booking],
    room_ids: &'a [Uuid],
    range: DateRange,
) -> impl Iterator<Item = &'a Booking> {
    bookings.iter().filter(move |b| {
        room_ids.contains(&b.room_id) && b.is_active() && b.range().overlaps(&range)
    })
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn create_booking(&self, booking: Booking) -> AppResult<Booking> {
        let mut bookings = self.bookings.write().await;
        if overlapping(&bookings, &[booking.room_id], booking.range())
            .next()
            .is_some()
        {
            return Err(booking::room_taken());
        }
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking_by_id(&self, id: Uuid) -> AppResult<Booking> {
        self.bookings
            .read()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(AppError::NotFound("booking"))
    }

    async fn get_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn find_overlapping(
        &self,
        room_ids: &[Uuid],
        range: DateRange,
    ) -> AppResult<Vec<Booking>> {
        Ok(overlapping(&self.bookings.read().await, room_ids, range)
            .cloned()
            .collect())
    }

    async fn cancel_booking(&self, id: Uuid) -> AppResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound("booking"))?;
        if booking.status == BookingStatus::Canceled {
            return Err(AppError::AlreadyCanceled);
        }
        booking.status = BookingStatus::Canceled;
        Ok(booking.clone())
    }

    async fn confirm_booking(&self, id: Uuid) -> AppResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound("booking"))?;
        match booking.status {
            BookingStatus::Canceled => Err(booking::confirm_canceled()),
            BookingStatus::Pending | BookingStatus::Confirmed => {
                booking.status = BookingStatus::Confirmed;
                Ok(booking.clone())
            }
        }
    }
}
