//! Persistence layer.
//!
//! One trait per collection (`UserStore`, `HotelStore`, `RoomStore`,
//! `BookingStore`), a Postgres and an in-memory implementation of each, and the
//! `Store` bundle that sequences the operations spanning several collections.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Booking, DateRange, ReconcileReport, Room},
};

pub mod booking;
pub mod hotel;
pub mod memory;
pub mod postgres;
pub mod room;
pub mod user;

pub use booking::{BookingFilter, BookingStore};
pub use hotel::{HotelFilter, HotelPatch, HotelStore, HotelUpdate};
pub use memory::{MemoryBookingStore, MemoryHotelStore, MemoryRoomStore, MemoryUserStore};
pub use postgres::{PostgresBookingStore, PostgresHotelStore, PostgresRoomStore, PostgresUserStore};
pub use room::{RoomFilter, RoomStore};
pub use user::{UserFilter, UserPatch, UserStore};

/// Store
///
/// Shared handles to every collection. Cloning is cheap; all clones talk to the
/// same underlying stores.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub hotels: Arc<dyn HotelStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            hotels: Arc::new(PostgresHotelStore::new(pool.clone())),
            rooms: Arc::new(PostgresRoomStore::new(pool.clone())),
            bookings: Arc::new(PostgresBookingStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            hotels: Arc::new(MemoryHotelStore::new()),
            rooms: Arc::new(MemoryRoomStore::new()),
            bookings: Arc::new(MemoryBookingStore::new()),
        }
    }

    /// insert_room
    ///
    /// Two-step write with no rollback:
    /// 1. persist the room record;
    /// 2. push its id onto the owning hotel's room sequence.
    ///
    /// When step 2 fails the room stays persisted but unreferenced (an orphan). The
    /// caller gets `OrphanedRoom` wrapping the hotel-side error, and the orphan is
    /// logged so `reconcile_orphans` or an operator can repair it.
    pub async fn insert_room(&self, room: Room) -> AppResult<Room> {
        let room = self.rooms.persist_room(room).await?;

        let filter = HotelFilter::by_id(room.hotel_id);
        if let Err(err) = self
            .hotels
            .update_hotel(&filter, HotelUpdate::PushRoom(room.id))
            .await
        {
            tracing::error!(
                room_id = %room.id,
                hotel_id = %room.hotel_id,
                error = %err,
                "room persisted without hotel registration"
            );
            return Err(AppError::OrphanedRoom {
                room_id: room.id,
                hotel_id: room.hotel_id,
                source: Box::new(err),
            });
        }

        tracing::info!(room_id = %room.id, hotel_id = %room.hotel_id, "room created");
        Ok(room)
    }

    /// Rooms listed in the hotel's sequence, in sequence order.
    pub async fn rooms_of_hotel(&self, hotel_id: Uuid) -> AppResult<Vec<Room>> {
        let hotel = self.hotels.get_hotel_by_id(hotel_id).await?;
        if hotel.rooms.is_empty() {
            return Ok(Vec::new());
        }

        let filter = RoomFilter {
            ids: Some(hotel.rooms.clone()),
            ..RoomFilter::default()
        };
        let order: HashMap<Uuid, usize> = hotel
            .rooms
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        let mut rooms = self.rooms.get_rooms(&filter).await?;
        rooms.sort_by_key(|room| order.get(&room.id).copied());
        Ok(rooms)
    }

    /// Rooms matching `filter`; with a range, only those without an active
    /// booking overlapping it.
    pub async fn available_rooms(
        &self,
        filter: &RoomFilter,
        range: Option<DateRange>,
    ) -> AppResult<Vec<Room>> {
        let rooms = self.rooms.get_rooms(filter).await?;
        let Some(range) = range else {
            return Ok(rooms);
        };

        let room_ids: Vec<Uuid> = rooms.iter().map(|room| room.id).collect();
        let taken: HashSet<Uuid> = self
            .bookings
            .find_overlapping(&room_ids, range)
            .await?
            .into_iter()
            .map(|booking| booking.room_id)
            .collect();
        Ok(rooms
            .into_iter()
            .filter(|room| !taken.contains(&room.id))
            .collect())
    }

    /// create_booking
    ///
    /// Books `room_id` for `user_id` over `range`. The room must exist; overlap
    /// checking happens inside the booking store.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        range: DateRange,
        num_persons: i32,
    ) -> AppResult<Booking> {
        self.rooms.get_room_by_id(room_id).await?;
        let booking = self
            .bookings
            .create_booking(Booking::new(user_id, room_id, range, num_persons))
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            room_id = %room_id,
            user_id = %user_id,
            nights = range.nights(),
            "booking created"
        );
        Ok(booking)
    }

    /// reconcile_orphans
    ///
    /// Pushes every room missing from all hotel sequences onto its owning hotel.
    /// Safe to run repeatedly: a second run finds nothing to repair. Rooms whose
    /// hotel is gone are reported as unresolved and left in place.
    pub async fn reconcile_orphans(&self) -> AppResult<ReconcileReport> {
        let hotels = self.hotels.get_hotels(&HotelFilter::default()).await?;
        let registered: HashSet<Uuid> = hotels
            .iter()
            .flat_map(|hotel| hotel.rooms.iter().copied())
            .collect();

        let mut report = ReconcileReport::default();
        for room in self.rooms.get_rooms(&RoomFilter::default()).await? {
            if registered.contains(&room.id) {
                continue;
            }
            match self
                .hotels
                .update_hotel(&HotelFilter::by_id(room.hotel_id), HotelUpdate::PushRoom(room.id))
                .await
            {
                Ok(()) => {
                    tracing::info!(room_id = %room.id, hotel_id = %room.hotel_id, "orphan room repaired");
                    report.repaired.push(room.id);
                }
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(room_id = %room.id, hotel_id = %room.hotel_id, "orphan room has no hotel");
                    report.unresolved.push(room.id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }
}
