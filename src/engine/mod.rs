mod admission;
pub mod availability;
mod error;
mod mutations;
pub mod overlap;
pub mod planner;
pub mod pricing;
mod queries;
pub mod ranker;
mod search;

pub use admission::AdmissionRequest;
pub use availability::{HotelAvailability, TypeAvailability};
pub use error::EngineError;
pub use planner::{AllocationLine, AllocationPlan};
pub use pricing::Quote;
pub use queries::RoomAvailability;
pub use ranker::SortKey;
pub use search::{HotelDetail, RoomDetail, SearchHit, SearchOutcome, SearchQuery};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock, mpsc, oneshot};
use tracing::{info, warn};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

pub type SharedHotelState = Arc<RwLock<HotelState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut deferred = None;

                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            // Flush what we have before compacting or reporting.
                            deferred = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                commit_batch(&mut wal, &mut batch);
                if let Some(other) = deferred {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        tracing::error!("WAL flush failed for {} events: {e}", batch.len());
    }
    respond_batch(batch, &result);
}

fn flush_batch(wal: &mut Wal, batch: &mut [(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even after an append error so buffered bytes don't leak into the next batch.
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events).and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        // The writer loop routes appends to the batch path.
        WalCommand::Append { response, .. } => {
            let _ = response.send(Err(io::Error::other("append routed to control path")));
        }
    }
}

/// In-memory inventory and reservation store, one lock per hotel, backed by
/// the write-ahead log.
pub struct Engine {
    pub(super) state: DashMap<HotelId, SharedHotelState>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Reverse lookup: reservation id → hotel id.
    pub(super) reservation_to_hotel: DashMap<Ulid, HotelId>,
    pub(super) next_seq: AtomicU64,
    /// Serializes catalog changes (hotel add/remove) against compaction.
    pub(super) catalog: Mutex<()>,
}

/// Apply a reservation event to a hotel (no locking, caller holds the lock).
fn apply_to_hotel(hs: &mut HotelState, event: &Event, index: &DashMap<Ulid, HotelId>) {
    match event {
        Event::ReservationAdmitted { reservation } => {
            index.insert(reservation.id, reservation.hotel_id.clone());
            hs.insert_reservation(reservation.clone());
        }
        Event::ReservationStatusChanged { id, status, at, .. } => {
            if let Some(r) = hs.reservation_mut(*id) {
                r.status = *status;
                r.updated_at = *at;
            }
        }
        Event::ReservationRemoved { id, .. } => {
            hs.remove_reservation(*id);
            index.remove(id);
        }
        Event::HotelRegistered { hotel } => {
            hs.hotel = hotel.clone();
        }
        // Removal is handled at the map level.
        Event::HotelRemoved { .. } => {}
    }
}

/// Hotel an event belongs to.
fn event_hotel_id(event: &Event) -> &HotelId {
    match event {
        Event::HotelRegistered { hotel } => &hotel.id,
        Event::HotelRemoved { id } => id,
        Event::ReservationAdmitted { reservation } => &reservation.hotel_id,
        Event::ReservationStatusChanged { hotel_id, .. } | Event::ReservationRemoved { hotel_id, .. } => {
            hotel_id
        }
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let replay = Wal::replay(&wal_path)?;
        if replay.discarded_tail {
            warn!(
                path = %wal_path.display(),
                valid_len = replay.valid_len,
                "discarded torn or corrupt WAL tail"
            );
            Wal::truncate(&wal_path, replay.valid_len)?;
        }
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            state: DashMap::new(),
            wal_tx,
            reservation_to_hotel: DashMap::new(),
            next_seq: AtomicU64::new(0),
            catalog: Mutex::new(()),
        };

        // Sole owner of every Arc here, so try_write never contends.
        for event in &replay.events {
            match event {
                Event::HotelRegistered { hotel } if !engine.state.contains_key(&hotel.id) => {
                    engine.insert_new_hotel(hotel.clone());
                }
                Event::HotelRemoved { id } => engine.drop_hotel(id),
                other => {
                    let Some(shared) = engine.get_hotel_state(event_hotel_id(other)) else {
                        continue;
                    };
                    let Ok(mut guard) = shared.try_write() else {
                        continue;
                    };
                    apply_to_hotel(&mut guard, other, &engine.reservation_to_hotel);
                }
            }
        }

        info!(
            hotels = engine.state.len(),
            reservations = engine.reservation_to_hotel.len(),
            events = replay.events.len(),
            "engine state restored"
        );
        Ok(engine)
    }

    pub(super) fn insert_new_hotel(&self, hotel: Hotel) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = hotel.id.clone();
        self.state.insert(id, Arc::new(RwLock::new(HotelState::new(hotel, seq))));
    }

    pub(super) fn drop_hotel(&self, id: &HotelId) {
        if self.state.remove(id).is_some() {
            self.reservation_to_hotel.retain(|_, hotel_id| hotel_id != id);
        }
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_hotel_state(&self, id: &str) -> Option<SharedHotelState> {
        self.state.get(id).map(|e| e.value().clone())
    }

    /// Snapshot of every hotel handle. Each is locked separately by the caller.
    pub(super) fn hotel_states(&self) -> Vec<SharedHotelState> {
        self.state.iter().map(|e| e.value().clone()).collect()
    }

    pub fn hotel_count(&self) -> usize {
        self.state.len()
    }

    /// WAL-append then apply, under the caller's write guard.
    pub(super) async fn persist_and_apply(&self, hs: &mut HotelState, event: &Event) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_hotel(hs, event, &self.reservation_to_hotel);
        Ok(())
    }

    /// Lookup reservation → hotel, then take the hotel's write lock.
    pub(super) async fn resolve_reservation_write(
        &self,
        id: Ulid,
    ) -> Result<OwnedRwLockWriteGuard<HotelState>, EngineError> {
        let hotel_id = self
            .reservation_to_hotel
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::ReservationNotFound(id))?;
        let shared = self
            .get_hotel_state(&hotel_id)
            .ok_or(EngineError::ReservationNotFound(id))?;
        let guard = shared.write_owned().await;
        // Removed while we waited for the lock.
        if guard.reservation(id).is_none() {
            return Err(EngineError::ReservationNotFound(id));
        }
        Ok(guard)
    }
}
