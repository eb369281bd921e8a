use thiserror::Error;
use ulid::Ulid;

use crate::model::{HotelId, ReservationStatus};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid date range: check-out must be after check-in")]
    InvalidRange,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("{0}")]
    Validation(String),
    #[error("room type {room_type:?} not found on hotel {hotel_id}")]
    UnknownRoomType { hotel_id: HotelId, room_type: String },
    #[error("hotel not found: {0}")]
    HotelNotFound(HotelId),
    #[error("reservation not found: {0}")]
    ReservationNotFound(Ulid),
    #[error("not enough rooms available: {available} available, {requested} requested")]
    CapacityConflict { available: u32, requested: u32 },
    #[error("cannot move reservation from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("WAL error: {0}")]
    WalError(String),
}
