use rust_decimal::Decimal;

use crate::model::ChildGuest;

use super::planner::{AllocationPlan, Candidate, eligible};

/// Search-time price of an allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub nightly_total: Decimal,
    /// `None` when no date range was given.
    pub stay_total: Option<Decimal>,
    pub nights: Option<u32>,
}

pub fn quote(plan: &AllocationPlan, nights: Option<u32>) -> Quote {
    let nightly_total = plan.nightly_total();
    Quote {
        nightly_total,
        stay_total: nights.map(|n| nightly_total * Decimal::from(n)),
        nights,
    }
}

/// Cheapest single-unit nightly price among eligible types, independent of
/// whatever allocation was chosen.
pub fn price_from(candidates: &[Candidate], room_type: Option<&str>) -> Option<Decimal> {
    eligible(candidates, room_type)
        .first()
        .map(|c| c.price_per_night)
}

/// Cot fees: one fee per night for each child that needs a cot.
pub fn children_cost(children: &[ChildGuest], cot_fee_per_night: Decimal, nights: u32) -> Decimal {
    let cots = children.iter().filter(|c| c.needs_cot).count() as u64;
    cot_fee_per_night * Decimal::from(cots) * Decimal::from(nights)
}

/// Price breakdown stored on a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPrice {
    pub price_per_night: Decimal,
    pub base_price: Decimal,
    pub children_cost: Decimal,
    pub total_price: Decimal,
}

pub fn reservation_price(
    price_per_night: Decimal,
    quantity: u32,
    nights: u32,
    children: &[ChildGuest],
    cot_fee_per_night: Decimal,
) -> ReservationPrice {
    let base_price = price_per_night * Decimal::from(nights) * Decimal::from(quantity);
    let children_cost = children_cost(children, cot_fee_per_night, nights);
    ReservationPrice {
        price_per_night,
        base_price,
        children_cost,
        total_price: base_price + children_cost,
    }
}
