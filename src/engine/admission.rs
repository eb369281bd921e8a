use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::overlap::peak_booked_for_type;
use super::pricing::reservation_price;
use super::{Engine, EngineError};

#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    pub hotel_id: HotelId,
    /// Room type label (case-insensitive) or room id.
    pub room_type: String,
    pub quantity: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: Guests,
    pub children: Vec<ChildGuest>,
    pub guest_info: Option<GuestInfo>,
    pub user_id: Option<String>,
}

pub(super) fn validate_stay(stay: &Stay) -> Result<(), EngineError> {
    if stay.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(crate::observability::ADMISSIONS_TOTAL, "outcome" => outcome).increment(1);
}

impl Engine {
    /// Admit a new PENDING reservation if the room type still has the units.
    ///
    /// The hotel's write lock is held from the occupancy count through the
    /// WAL append, so two admissions racing for the last units are decided
    /// one after the other.
    pub async fn admit_reservation(&self, req: AdmissionRequest) -> Result<Reservation, EngineError> {
        if req.quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        if req.quantity > MAX_QUANTITY {
            return Err(EngineError::LimitExceeded("quantity too large"));
        }
        let stay = Stay::checked(req.check_in, req.check_out).ok_or(EngineError::InvalidRange)?;
        validate_stay(&stay)?;
        if req.guests.adults == 0 {
            return Err(EngineError::Validation("at least one adult is required".into()));
        }
        if req.children.len() > MAX_CHILDREN_PER_RESERVATION {
            return Err(EngineError::LimitExceeded("too many children"));
        }

        let shared = self
            .get_hotel_state(&req.hotel_id)
            .ok_or_else(|| EngineError::HotelNotFound(req.hotel_id.clone()))?;
        let mut guard = shared.write().await;

        let room = guard
            .hotel
            .room_type(&req.room_type)
            .ok_or_else(|| EngineError::UnknownRoomType {
                hotel_id: req.hotel_id.clone(),
                room_type: req.room_type.clone(),
            })?;
        let label = room.label.clone();
        let price_per_night = room.price_per_night;

        // No unit count means nothing to check against.
        if let Some(total) = room.total_units {
            let booked = peak_booked_for_type(&guard, &label, &stay);
            let available = total.saturating_sub(booked);
            if req.quantity > available {
                warn!(
                    hotel = %req.hotel_id,
                    room_type = %label,
                    available,
                    requested = req.quantity,
                    "admission rejected: capacity conflict"
                );
                record_outcome("conflict");
                return Err(EngineError::CapacityConflict {
                    available,
                    requested: req.quantity,
                });
            }
        }

        let nights = stay.nights();
        let price = reservation_price(
            price_per_night,
            req.quantity,
            nights,
            &req.children,
            guard.hotel.cot_fee_per_night,
        );
        let now = Utc::now();
        let reservation = Reservation {
            id: Ulid::new(),
            hotel_id: req.hotel_id.clone(),
            room_type: label,
            quantity: req.quantity,
            stay,
            nights,
            guests: req.guests,
            children: req.children,
            guest_info: req.guest_info,
            user_id: req.user_id,
            price_per_night: price.price_per_night,
            base_price: price.base_price,
            children_cost: price.children_cost,
            total_price: price.total_price,
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let event = Event::ReservationAdmitted {
            reservation: reservation.clone(),
        };
        if let Err(e) = self.persist_and_apply(&mut guard, &event).await {
            record_outcome("error");
            return Err(e);
        }
        record_outcome("admitted");
        info!(
            id = %reservation.id,
            hotel = %reservation.hotel_id,
            room_type = %reservation.room_type,
            quantity = reservation.quantity,
            nights,
            "reservation admitted"
        );
        Ok(reservation)
    }

    pub async fn transition_reservation(
        &self,
        id: Ulid,
        status: ReservationStatus,
    ) -> Result<Reservation, EngineError> {
        let mut guard = self.resolve_reservation_write(id).await?;
        let current = guard
            .reservation(id)
            .ok_or(EngineError::ReservationNotFound(id))?;
        if !current.status.can_transition_to(status) {
            return Err(EngineError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let event = Event::ReservationStatusChanged {
            id,
            hotel_id: current.hotel_id.clone(),
            status,
            at: Utc::now(),
        };
        self.persist_and_apply(&mut guard, &event).await?;
        info!(%id, %status, "reservation status changed");
        guard
            .reservation(id)
            .cloned()
            .ok_or(EngineError::ReservationNotFound(id))
    }

    /// Administrative removal. Frees any inventory the reservation held.
    pub async fn remove_reservation(&self, id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.resolve_reservation_write(id).await?;
        let event = Event::ReservationRemoved {
            id,
            hotel_id: guard.hotel.id.clone(),
        };
        self.persist_and_apply(&mut guard, &event).await?;
        info!(%id, "reservation removed");
        Ok(())
    }
}
