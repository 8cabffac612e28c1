use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppResult, models::Room};

/// RoomStore
///
/// Raw room persistence. Registering the room on its hotel is sequenced by
/// `Store::insert_room`, not here.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn persist_room(&self, room: Room) -> AppResult<Room>;
    async fn get_room_by_id(&self, id: Uuid) -> AppResult<Room>;
    async fn get_rooms(&self, filter: &RoomFilter) -> AppResult<Vec<Room>>;
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub hotel_id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        self.hotel_id.is_none_or(|hotel_id| room.hotel_id == hotel_id)
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&room.id))
    }
}
