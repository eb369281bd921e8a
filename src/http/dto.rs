//! Wire shapes. Money goes out as plain JSON numbers; unbounded
//! availability goes out as `null`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::{AllocationPlan, HotelAvailability, HotelDetail, Quote, RoomAvailability, SearchHit};
use crate::model::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeDto {
    pub id: String,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub total_units: Option<u32>,
    pub capacity: u32,
}

impl From<&RoomType> for RoomTypeDto {
    fn from(rt: &RoomType) -> Self {
        Self {
            id: rt.id.clone(),
            label: rt.label.clone(),
            price_per_night: rt.price_per_night,
            total_units: rt.total_units,
            capacity: rt.capacity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDto {
    pub id: String,
    pub name: String,
    pub city: String,
    pub stars: u8,
    pub rating: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub cot_fee_per_night: Decimal,
}

impl From<&Hotel> for HotelDto {
    fn from(h: &Hotel) -> Self {
        Self {
            id: h.id.clone(),
            name: h.name.clone(),
            city: h.city.clone(),
            stars: h.stars,
            rating: h.rating,
            cot_fee_per_night: h.cot_fee_per_night,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLineDto {
    pub room_type: String,
    pub units_used: u32,
    pub capacity_per_unit: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
}

pub fn allocation_dto(plan: &AllocationPlan) -> Vec<AllocationLineDto> {
    plan.lines
        .iter()
        .map(|l| AllocationLineDto {
            room_type: l.label.clone(),
            units_used: l.units_used,
            capacity_per_unit: l.capacity_per_unit,
            price_per_night: l.price_per_night,
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub available_by_type: BTreeMap<String, Option<u32>>,
    pub total_available: u32,
    pub inventory_unknown: bool,
}

impl AvailabilityDto {
    fn new(stay: &Stay, avail: &HotelAvailability) -> Self {
        Self {
            from: stay.check_in,
            to: stay.check_out,
            available_by_type: avail
                .by_type
                .iter()
                .map(|t| (t.label.clone(), t.available.known()))
                .collect(),
            total_available: avail.total_available,
            inventory_unknown: avail.inventory_unknown,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitDto {
    #[serde(flatten)]
    pub hotel: HotelDto,
    pub room_types: Vec<RoomTypeDto>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_from: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_nightly: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_price: Option<Decimal>,
    pub required_rooms: u32,
    pub allocation: Vec<AllocationLineDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityDto>,
}

impl SearchHitDto {
    pub fn new(hit: &SearchHit, stay: Option<&Stay>) -> Self {
        Self {
            hotel: HotelDto::from(&hit.hotel),
            room_types: hit.hotel.room_types.iter().map(RoomTypeDto::from).collect(),
            price_from: hit.price_from,
            total_nightly: hit.quote.nightly_total,
            total_price: hit.quote.stay_total,
            required_rooms: hit.allocation.rooms_needed,
            allocation: allocation_dto(&hit.allocation),
            availability: stay
                .zip(hit.availability.as_ref())
                .map(|(s, a)| AvailabilityDto::new(s, a)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetaDto {
    pub nights: Option<u32>,
    pub total_guests: u32,
    pub requested_rooms: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hotels: Vec<SearchHitDto>,
    pub total_count: usize,
    pub page: usize,
    pub limit: usize,
    pub search_meta: SearchMetaDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    #[serde(flatten)]
    pub room: RoomTypeDto,
    /// `null` when the hotel has no unit count for this type.
    pub available_units: Option<u32>,
    pub booked: u32,
    pub rooms_needed: u32,
    pub rooms_to_use: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetailDto {
    #[serde(flatten)]
    pub hotel: HotelDto,
    pub room_types: Vec<RoomDetailDto>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub nights: Option<u32>,
    pub allocation: Option<Vec<AllocationLineDto>>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_nightly: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_price: Option<Decimal>,
    pub required_rooms: Option<u32>,
}

impl From<&HotelDetail> for HotelDetailDto {
    fn from(d: &HotelDetail) -> Self {
        let quote: Option<&Quote> = d.quote.as_ref();
        Self {
            hotel: HotelDto::from(&d.hotel),
            room_types: d
                .rooms
                .iter()
                .map(|r| RoomDetailDto {
                    room: RoomTypeDto::from(&r.room),
                    available_units: r.available.known(),
                    booked: r.booked,
                    rooms_needed: r.rooms_needed,
                    rooms_to_use: r.rooms_to_use,
                })
                .collect(),
            from: d.stay.map(|s| s.check_in),
            to: d.stay.map(|s| s.check_out),
            nights: d.stay.map(|s| s.nights()),
            allocation: d.allocation.as_ref().map(allocation_dto),
            total_nightly: quote.map(|q| q.nightly_total),
            total_price: quote.and_then(|q| q.stay_total),
            required_rooms: d.allocation.as_ref().map(|a| a.rooms_needed),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailabilityDto {
    pub room_type: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_rooms: Option<u32>,
    pub booked: u32,
    /// `null` when the hotel has no unit count for this type.
    pub available: Option<u32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
}

impl RoomAvailabilityDto {
    pub fn new(stay: &Stay, a: RoomAvailability) -> Self {
        Self {
            room_type: a.room_type,
            from: stay.check_in,
            to: stay.check_out,
            total_rooms: a.total_rooms,
            booked: a.booked,
            available: a.available.known(),
            price_per_night: a.price_per_night,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestsDto {
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

fn one() -> u32 {
    1
}

impl Default for GuestsDto {
    fn default() -> Self {
        Self { adults: 1, children: 0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDto {
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub needs_cot: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub hotel_id: String,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub guests: GuestsDto,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub guest_info: Option<GuestInfo>,
    #[serde(default)]
    pub children: Vec<ChildDto>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: Ulid,
    pub hotel_id: String,
    pub room_type: String,
    pub quantity: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub guests: GuestsDto,
    pub children: Vec<ChildDto>,
    pub guest_info: Option<GuestInfo>,
    pub user_id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub children_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            hotel_id: r.hotel_id,
            room_type: r.room_type,
            quantity: r.quantity,
            check_in: r.stay.check_in,
            check_out: r.stay.check_out,
            nights: r.nights,
            guests: GuestsDto {
                adults: r.guests.adults,
                children: r.guests.children,
            },
            children: r
                .children
                .into_iter()
                .map(|c| ChildDto {
                    age: c.age,
                    needs_cot: c.needs_cot,
                })
                .collect(),
            guest_info: r.guest_info,
            user_id: r.user_id,
            price_per_night: r.price_per_night,
            base_price: r.base_price,
            children_cost: r.children_cost,
            total_price: r.total_price,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
