use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingStatus, DateRange},
};

/// BookingStore
///
/// Booking persistence plus availability. Bookings only ever change status.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts `booking` unless an active booking of the same room overlaps it,
    /// in which case nothing is written and `Conflict` is returned.
    async fn create_booking(&self, booking: Booking) -> AppResult<Booking>;
    async fn get_booking_by_id(&self, id: Uuid) -> AppResult<Booking>;
    async fn get_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>>;
    /// Active bookings of any of `room_ids` overlapping `range`.
    async fn find_overlapping(&self, room_ids: &[Uuid], range: DateRange)
    -> AppResult<Vec<Booking>>;
    /// `AlreadyCanceled` when the booking was canceled before this call.
    async fn cancel_booking(&self, id: Uuid) -> AppResult<Booking>;
    async fn confirm_booking(&self, id: Uuid) -> AppResult<Booking>;
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.is_none_or(|id| booking.user_id == id)
            && self.room_id.is_none_or(|id| booking.room_id == id)
            && self.status.is_none_or(|status| booking.status == status)
    }
}

pub(crate) fn room_taken() -> AppError {
    AppError::Conflict("room is already booked for the requested dates".to_string())
}

pub(crate) fn confirm_canceled() -> AppError {
    AppError::Conflict("a canceled booking cannot be confirmed".to_string())
}
