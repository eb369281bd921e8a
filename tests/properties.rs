use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use ulid::Ulid;

use innkeep::engine::overlap::{booked_for_type, peak_booked_for_type};
use innkeep::engine::planner::{Candidate, PlanRequest, plan};
use innkeep::engine::pricing::reservation_price;
use innkeep::engine::{AdmissionRequest, Engine, EngineError};
use innkeep::model::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn stay_at(offset: u32, nights: u32) -> Stay {
    let check_in = base_date() + Duration::days(offset as i64);
    Stay::new(check_in, check_in + Duration::days(nights as i64))
}

fn arb_availability() -> impl Strategy<Value = Availability> {
    prop_oneof![
        4 => (0u32..=4).prop_map(Availability::Known),
        1 => Just(Availability::Unbounded),
    ]
}

fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec((0i64..=300, 1u32..=5, arb_availability()), 1..=4).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (price, capacity, available))| Candidate {
                label: format!("T{i}"),
                price_per_night: Decimal::from(price),
                capacity,
                available,
            })
            .collect()
    })
}

/// Cheapest nightly cost over every unit mix that seats `guests`, or `None`.
fn brute_force_cost(guests: u32, cands: &[Candidate]) -> Option<Decimal> {
    let bounds: Vec<u32> = cands
        .iter()
        .map(|c| c.available.cap(guests.div_ceil(c.capacity)))
        .collect();
    let mut counts = vec![0u32; cands.len()];
    let mut best: Option<Decimal> = None;
    loop {
        let seats: u32 = counts.iter().zip(cands).map(|(n, c)| n * c.capacity).sum();
        if seats >= guests {
            let cost: Decimal = counts
                .iter()
                .zip(cands)
                .map(|(n, c)| c.price_per_night * Decimal::from(*n))
                .sum();
            best = Some(best.map_or(cost, |b: Decimal| b.min(cost)));
        }
        // Odometer increment.
        let mut i = 0;
        loop {
            if i == counts.len() {
                return best;
            }
            if counts[i] < bounds[i] {
                counts[i] += 1;
                break;
            }
            counts[i] = 0;
            i += 1;
        }
    }
}

fn reservation(label: &str, quantity: u32, stay: Stay, status: ReservationStatus) -> Reservation {
    let now = Utc::now();
    Reservation {
        id: Ulid::new(),
        hotel_id: "P".into(),
        room_type: label.into(),
        quantity,
        stay,
        nights: stay.nights(),
        guests: Guests { adults: 1, children: 0 },
        children: Vec::new(),
        guest_info: None,
        user_id: None,
        price_per_night: Decimal::from(100),
        base_price: Decimal::ZERO,
        children_cost: Decimal::ZERO,
        total_price: Decimal::ZERO,
        status,
        created_at: now,
        updated_at: now,
    }
}

fn hotel(units: u32) -> Hotel {
    Hotel {
        id: "P".into(),
        name: "Pensao P".into(),
        city: "Porto".into(),
        stars: 3,
        rating: 4.0,
        cot_fee_per_night: Decimal::from(10),
        room_types: vec![RoomType {
            id: "double".into(),
            label: "Double".into(),
            price_per_night: Decimal::from(80),
            total_units: Some(units),
            capacity: 2,
        }],
    }
}

/// Units held on the single night `night`, counted the slow way.
fn held_on(reservations: &[Reservation], night: NaiveDate) -> u32 {
    reservations
        .iter()
        .filter(|r| r.status.is_active() && r.stay.contains_night(night))
        .map(|r| r.quantity)
        .sum()
}

fn arb_bookings() -> impl Strategy<Value = Vec<(u32, u32, u32)>> {
    // (offset, nights, quantity)
    prop::collection::vec((0u32..15, 1u32..6, 1u32..=3), 0..25)
}

proptest! {
    #[test]
    fn plan_seats_everyone_within_inventory(cands in arb_candidates(), guests in 1u32..=12, rooms in 1u32..=4) {
        let req = PlanRequest { total_guests: guests, requested_rooms: rooms, room_type: None };
        if let Some(p) = plan(&req, &cands) {
            prop_assert!(p.guests_covered);
            prop_assert!(p.total_capacity() >= guests);
            prop_assert!(p.total_units() >= rooms);
            prop_assert!(p.rooms_needed >= rooms);
            for line in &p.lines {
                let cand = cands.iter().find(|c| c.label == line.label).unwrap();
                if let Availability::Known(n) = cand.available {
                    prop_assert!(line.units_used <= n);
                }
            }
            let prices: Vec<Decimal> = p.lines.iter().map(|l| l.price_per_night).collect();
            let mut sorted = prices.clone();
            sorted.sort();
            prop_assert_eq!(prices, sorted);
        }
    }

    #[test]
    fn plan_cost_matches_exhaustive_search(cands in arb_candidates(), guests in 1u32..=10) {
        let req = PlanRequest { total_guests: guests, requested_rooms: 1, room_type: None };
        let best = brute_force_cost(guests, &cands);
        match plan(&req, &cands) {
            Some(p) => prop_assert_eq!(Some(p.nightly_total()), best),
            None => prop_assert_eq!(best, None),
        }
    }

    #[test]
    fn fully_unbounded_hotel_is_never_excluded(cands in arb_candidates(), guests in 1u32..=40) {
        let cands: Vec<Candidate> = cands
            .into_iter()
            .map(|c| Candidate { available: Availability::Unbounded, ..c })
            .collect();
        let req = PlanRequest { total_guests: guests, requested_rooms: 1, room_type: None };
        prop_assert!(plan(&req, &cands).is_some());
    }

    #[test]
    fn peak_matches_night_by_night_count(bookings in arb_bookings(), q_offset in 0u32..15, q_nights in 1u32..8) {
        let mut state = HotelState::new(hotel(100), 0);
        for (i, (offset, nights, qty)) in bookings.iter().enumerate() {
            let status = if i % 4 == 3 { ReservationStatus::Cancelled } else { ReservationStatus::Confirmed };
            state.insert_reservation(reservation("Double", *qty, stay_at(*offset, *nights), status));
        }
        let query = stay_at(q_offset, q_nights);
        let slow_peak = (0..q_nights)
            .map(|d| held_on(&state.reservations, query.check_in + Duration::days(d as i64)))
            .max()
            .unwrap_or(0);
        let peak = peak_booked_for_type(&state, "Double", &query);
        prop_assert_eq!(peak, slow_peak);
        prop_assert!(booked_for_type(&state, "Double", &query) >= peak);
    }

    #[test]
    fn reservation_price_is_exact(
        cents in 1i64..=100_000,
        quantity in 1u32..=10,
        nights in 1u32..=30,
        cots in 0usize..=4,
        plain in 0usize..=4,
        fee_cents in 0i64..=5_000,
    ) {
        let price = Decimal::new(cents, 2);
        let fee = Decimal::new(fee_cents, 2);
        let mut children = vec![ChildGuest { age: Some(1), needs_cot: true }; cots];
        children.extend(vec![ChildGuest { age: Some(8), needs_cot: false }; plain]);

        let quoted = reservation_price(price, quantity, nights, &children, fee);
        let expected_base = Decimal::new(cents * quantity as i64 * nights as i64, 2);
        let expected_cots = Decimal::new(fee_cents * cots as i64 * nights as i64, 2);
        prop_assert_eq!(quoted.base_price, expected_base);
        prop_assert_eq!(quoted.children_cost, expected_cots);
        prop_assert_eq!(quoted.total_price, expected_base + expected_cots);
    }
}

static WAL_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn fresh_wal() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("innkeep_test_properties");
    std::fs::create_dir_all(&dir).unwrap();
    let n = WAL_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = dir.join(format!("{}-{n}.wal", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn admitted_reservations_never_overbook_a_night(units in 1u32..=4, bookings in arb_bookings()) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let engine = Engine::new(fresh_wal()).unwrap();
            engine.register_hotel(hotel(units)).await.unwrap();

            for (offset, nights, qty) in &bookings {
                let stay = stay_at(*offset, *nights);
                let result = engine
                    .admit_reservation(AdmissionRequest {
                        hotel_id: "P".into(),
                        room_type: "Double".into(),
                        quantity: *qty,
                        check_in: stay.check_in,
                        check_out: stay.check_out,
                        guests: Guests { adults: 1, children: 0 },
                        children: Vec::new(),
                        guest_info: None,
                        user_id: None,
                    })
                    .await;
                match result {
                    Ok(_) => {}
                    Err(EngineError::CapacityConflict { .. }) => {
                        // A rejection must mean some night would have gone over.
                        let held = engine.list_reservations("P").await.unwrap();
                        let worst = (0..*nights)
                            .map(|d| held_on(&held, stay.check_in + Duration::days(d as i64)))
                            .max()
                            .unwrap_or(0);
                        assert!(worst + qty > units, "rejected {qty} with {worst} of {units} held");
                    }
                    Err(e) => panic!("unexpected admission error: {e}"),
                }
            }

            let admitted = engine.list_reservations("P").await.unwrap();
            for day in 0..25 {
                let night = base_date() + Duration::days(day);
                assert!(held_on(&admitted, night) <= units, "night {night} overbooked");
            }
        });
    }
}
