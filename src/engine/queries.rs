use rust_decimal::Decimal;
use ulid::Ulid;

use crate::model::*;

use super::admission::validate_stay;
use super::availability::resolve_type;
use super::overlap::booked_for_type;
use super::{Engine, EngineError};

/// Free units of one room type over one stay.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomAvailability {
    pub room_type: String,
    pub total_rooms: Option<u32>,
    pub booked: u32,
    pub available: Availability,
    pub price_per_night: Decimal,
}

impl Engine {
    pub async fn get_hotel(&self, id: &str) -> Result<Hotel, EngineError> {
        let shared = self
            .get_hotel_state(id)
            .ok_or_else(|| EngineError::HotelNotFound(id.to_string()))?;
        let guard = shared.read().await;
        Ok(guard.hotel.clone())
    }

    pub async fn get_reservation(&self, id: Ulid) -> Result<Reservation, EngineError> {
        let hotel_id = self
            .reservation_to_hotel
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::ReservationNotFound(id))?;
        let shared = self
            .get_hotel_state(&hotel_id)
            .ok_or(EngineError::ReservationNotFound(id))?;
        let guard = shared.read().await;
        guard
            .reservation(id)
            .cloned()
            .ok_or(EngineError::ReservationNotFound(id))
    }

    /// Every reservation of a hotel, ordered by check-in.
    pub async fn list_reservations(&self, hotel_id: &str) -> Result<Vec<Reservation>, EngineError> {
        let shared = self
            .get_hotel_state(hotel_id)
            .ok_or_else(|| EngineError::HotelNotFound(hotel_id.to_string()))?;
        let guard = shared.read().await;
        Ok(guard.reservations.clone())
    }

    /// Availability of one room type (label or room id) over `stay`.
    pub async fn room_availability(
        &self,
        hotel_id: &str,
        room_key: &str,
        stay: Stay,
    ) -> Result<RoomAvailability, EngineError> {
        validate_stay(&stay)?;
        let shared = self
            .get_hotel_state(hotel_id)
            .ok_or_else(|| EngineError::HotelNotFound(hotel_id.to_string()))?;
        let guard = shared.read().await;
        let room = guard
            .hotel
            .room_type(room_key)
            .ok_or_else(|| EngineError::UnknownRoomType {
                hotel_id: hotel_id.to_string(),
                room_type: room_key.to_string(),
            })?;

        let booked = booked_for_type(&guard, &room.label, &stay);
        let resolved = resolve_type(room, booked);
        Ok(RoomAvailability {
            room_type: room.label.clone(),
            total_rooms: room.total_units,
            booked,
            available: resolved.available,
            price_per_night: room.price_per_night,
        })
    }
}
