use std::time::Instant;

use rust_decimal::Decimal;
use tracing::debug;

use crate::limits::*;
use crate::model::*;

use super::admission::validate_stay;
use super::availability::{HotelAvailability, resolve};
use super::overlap::booked_by_type;
use super::planner::{AllocationPlan, Candidate, PlanRequest, plan};
use super::pricing::{Quote, price_from, quote};
use super::ranker::{SortKey, rank};
use super::{Engine, EngineError};

#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Case-insensitive exact match.
    pub city: Option<String>,
    /// Without a stay, static inventory is treated as free.
    pub stay: Option<Stay>,
    pub guests: Guests,
    pub rooms: u32,
    pub room_type: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<SortKey>,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            city: None,
            stay: None,
            guests: Guests { adults: 1, children: 0 },
            rooms: 1,
            room_type: None,
            min_price: None,
            max_price: None,
            sort: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One hotel that can host the party.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub hotel: Hotel,
    pub seq: u64,
    pub price_from: Decimal,
    pub quote: Quote,
    pub allocation: AllocationPlan,
    /// Present only when the query carried a stay.
    pub availability: Option<HotelAvailability>,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The requested page.
    pub hits: Vec<SearchHit>,
    /// Matches across all pages.
    pub total_count: usize,
    pub nights: Option<u32>,
    pub total_guests: u32,
    pub requested_rooms: u32,
}

/// Room type annotated for one party on the hotel page.
#[derive(Debug, Clone)]
pub struct RoomDetail {
    pub room: RoomType,
    pub booked: u32,
    pub available: Availability,
    /// Units of this type alone needed to seat everyone.
    pub rooms_needed: u32,
    pub rooms_to_use: u32,
}

#[derive(Debug, Clone)]
pub struct HotelDetail {
    pub hotel: Hotel,
    pub stay: Option<Stay>,
    pub rooms: Vec<RoomDetail>,
    /// Cheapest allocation for the party, if one exists.
    pub allocation: Option<AllocationPlan>,
    pub quote: Option<Quote>,
}

fn candidates(hotel: &Hotel, avail: &HotelAvailability) -> Vec<Candidate> {
    hotel
        .room_types
        .iter()
        .zip(&avail.by_type)
        .map(|(room, t)| Candidate::from_room(room, t.available))
        .collect()
}

fn validate_party(guests: &Guests, rooms: u32) -> Result<(), EngineError> {
    if guests.total() > MAX_GUESTS_PER_QUERY {
        return Err(EngineError::LimitExceeded("too many guests"));
    }
    if rooms > MAX_ROOMS_PER_QUERY {
        return Err(EngineError::LimitExceeded("too many rooms"));
    }
    Ok(())
}

impl Engine {
    pub async fn search(&self, q: &SearchQuery) -> Result<SearchOutcome, EngineError> {
        validate_party(&q.guests, q.rooms)?;
        if q.page == 0 {
            return Err(EngineError::Validation("page must be at least 1".into()));
        }
        if q.limit == 0 || q.limit > MAX_PAGE_SIZE {
            return Err(EngineError::LimitExceeded("page size out of range"));
        }
        if let Some(stay) = &q.stay {
            validate_stay(stay)?;
        }

        let started = Instant::now();
        let total_guests = q.guests.total().max(1);
        let requested_rooms = q.rooms.max(1);
        let nights = q.stay.map(|s| s.nights());
        let req = PlanRequest {
            total_guests,
            requested_rooms,
            room_type: q.room_type.as_deref(),
        };

        let states = self.hotel_states();
        let considered = states.len();
        let mut hits = Vec::new();
        for shared in states {
            let guard = shared.read().await;
            let hotel = &guard.hotel;
            if q.city.as_deref().is_some_and(|c| !hotel.city.eq_ignore_ascii_case(c)) {
                continue;
            }

            let booked = q.stay.map(|s| booked_by_type(&guard, &s));
            let avail = resolve(hotel, booked.as_ref());
            let cands = candidates(hotel, &avail);
            let Some(allocation) = plan(&req, &cands) else {
                debug!(hotel = %hotel.id, "no allocation fits the party");
                continue;
            };
            let Some(from) = price_from(&cands, req.room_type) else {
                continue;
            };
            if q.min_price.is_some_and(|min| from < min) || q.max_price.is_some_and(|max| from > max) {
                continue;
            }

            hits.push(SearchHit {
                hotel: hotel.clone(),
                seq: guard.seq,
                price_from: from,
                quote: quote(&allocation, nights),
                allocation,
                availability: q.stay.map(|_| avail),
            });
        }

        rank(&mut hits, q.sort);
        let total_count = hits.len();
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .skip((q.page - 1).saturating_mul(q.limit))
            .take(q.limit)
            .collect();

        metrics::histogram!(crate::observability::SEARCH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::histogram!(crate::observability::SEARCH_HOTELS_CONSIDERED).record(considered as f64);
        debug!(considered, matched = total_count, "search complete");

        Ok(SearchOutcome {
            hits,
            total_count,
            nights,
            total_guests,
            requested_rooms,
        })
    }

    /// One hotel with every room type annotated for the party.
    pub async fn hotel_detail(
        &self,
        id: &str,
        stay: Option<Stay>,
        guests: Guests,
        rooms: u32,
    ) -> Result<HotelDetail, EngineError> {
        validate_party(&guests, rooms)?;
        if let Some(stay) = &stay {
            validate_stay(stay)?;
        }
        let shared = self
            .get_hotel_state(id)
            .ok_or_else(|| EngineError::HotelNotFound(id.to_string()))?;
        let guard = shared.read().await;
        let hotel = &guard.hotel;

        let total_guests = guests.total().max(1);
        let requested_rooms = rooms.max(1);
        let booked = stay.map(|s| booked_by_type(&guard, &s));
        let avail = resolve(hotel, booked.as_ref());

        let room_details = hotel
            .room_types
            .iter()
            .zip(&avail.by_type)
            .map(|(room, t)| {
                let rooms_needed = total_guests.div_ceil(room.capacity.max(1));
                RoomDetail {
                    room: room.clone(),
                    booked: t.booked,
                    available: t.available,
                    rooms_needed,
                    rooms_to_use: rooms_needed.max(requested_rooms),
                }
            })
            .collect();

        let req = PlanRequest {
            total_guests,
            requested_rooms,
            room_type: None,
        };
        let allocation = plan(&req, &candidates(hotel, &avail));
        let quote = allocation
            .as_ref()
            .map(|a| quote(a, stay.map(|s| s.nights())));

        Ok(HotelDetail {
            hotel: hotel.clone(),
            stay,
            rooms: room_details,
            allocation,
            quote,
        })
    }
}
