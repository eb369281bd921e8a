use tokio::sync::oneshot;
use tracing::info;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, WalCommand};

impl Engine {
    /// Insert or replace a hotel's inventory. Existing reservations and the
    /// hotel's listing position are kept.
    pub async fn register_hotel(&self, hotel: Hotel) -> Result<(), EngineError> {
        if hotel.id.trim().is_empty() {
            return Err(EngineError::Validation("hotel id must not be empty".into()));
        }
        if hotel.room_types.len() > MAX_ROOM_TYPES_PER_HOTEL {
            return Err(EngineError::LimitExceeded("too many room types on hotel"));
        }
        if hotel.room_types.iter().any(|rt| rt.label.is_empty() || rt.label.len() > MAX_LABEL_LEN) {
            return Err(EngineError::LimitExceeded("room type label empty or too long"));
        }

        let _catalog = self.catalog.lock().await;
        let event = Event::HotelRegistered { hotel: hotel.clone() };
        match self.get_hotel_state(&hotel.id) {
            Some(shared) => {
                let mut guard = shared.write().await;
                self.persist_and_apply(&mut guard, &event).await?;
            }
            None => {
                self.wal_append(&event).await?;
                self.insert_new_hotel(hotel);
            }
        }
        metrics::gauge!(crate::observability::HOTELS_LOADED).set(self.state.len() as f64);
        Ok(())
    }

    /// Drop a hotel and every reservation it holds.
    pub async fn remove_hotel(&self, id: &str) -> Result<(), EngineError> {
        let _catalog = self.catalog.lock().await;
        let shared = self
            .get_hotel_state(id)
            .ok_or_else(|| EngineError::HotelNotFound(id.to_string()))?;
        let _guard = shared.write().await;

        let event = Event::HotelRemoved { id: id.to_string() };
        self.wal_append(&event).await?;
        self.drop_hotel(&id.to_string());
        metrics::gauge!(crate::observability::HOTELS_LOADED).set(self.state.len() as f64);
        info!(hotel = %id, "hotel removed");
        Ok(())
    }

    /// Rewrite the WAL as one registration per hotel followed by its
    /// reservations at their current status.
    ///
    /// Every hotel is read-locked until the new log is in place, so no
    /// mutation can land in the old log after its state was captured.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _catalog = self.catalog.lock().await;

        let mut guards = Vec::with_capacity(self.state.len());
        for shared in self.hotel_states() {
            guards.push(shared.read_owned().await);
        }
        guards.sort_by_key(|g| g.seq);

        let mut events = Vec::new();
        for guard in &guards {
            events.push(Event::HotelRegistered {
                hotel: guard.hotel.clone(),
            });
            for r in &guard.reservations {
                events.push(Event::ReservationAdmitted {
                    reservation: r.clone(),
                });
            }
        }
        let count = events.len();

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;

        info!(events = count, "WAL compacted");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
