use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Hotel,
};

/// HotelStore
///
/// Hotel Relationship Store. Every hotel owns its ordered room-id sequence, and
/// `update_hotel` is the only way that sequence changes.
#[async_trait]
pub trait HotelStore: Send + Sync {
    async fn insert_hotel(&self, hotel: Hotel) -> AppResult<Hotel>;
    async fn get_hotel_by_id(&self, id: Uuid) -> AppResult<Hotel>;
    async fn get_hotels(&self, filter: &HotelFilter) -> AppResult<Vec<Hotel>>;
    /// Applies `update` to every hotel matching `filter` in one store operation.
    /// `NotFound` when nothing matched; write failures are `Store` errors.
    async fn update_hotel(&self, filter: &HotelFilter, update: HotelUpdate) -> AppResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    pub id: Option<Uuid>,
    pub location: Option<String>,
}

impl HotelFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.location.is_none()
    }

    pub fn matches(&self, hotel: &Hotel) -> bool {
        self.id.is_none_or(|id| hotel.id == id)
            && self
                .location
                .as_ref()
                .is_none_or(|location| hotel.location.eq_ignore_ascii_case(location))
    }
}

#[derive(Debug, Clone)]
pub enum HotelUpdate {
    /// Append a room id unless it is already present.
    PushRoom(Uuid),
    Patch(HotelPatch),
}

#[derive(Debug, Clone, Default)]
pub struct HotelPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub rating: Option<i32>,
}

impl HotelUpdate {
    pub fn apply(&self, hotel: &mut Hotel) {
        match self {
            HotelUpdate::PushRoom(room_id) => {
                if !hotel.rooms.contains(room_id) {
                    hotel.rooms.push(*room_id);
                }
            }
            HotelUpdate::Patch(patch) => {
                if let Some(name) = &patch.name {
                    hotel.name = name.clone();
                }
                if let Some(location) = &patch.location {
                    hotel.location = location.clone();
                }
                if let Some(rating) = patch.rating {
                    hotel.rating = rating;
                }
            }
        }
    }
}

pub(crate) fn reject_unfiltered(filter: &HotelFilter) -> AppResult<()> {
    if filter.is_empty() {
        return Err(AppError::Validation(
            "hotel update requires a filter".to_string(),
        ));
    }
    Ok(())
}
