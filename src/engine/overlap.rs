use std::collections::HashMap;

use crate::model::*;

/// Units held per room type by active reservations whose stay overlaps `stay`.
///
/// Every overlapping reservation counts in full, even if it only shares one
/// night with the query, so the sum is an upper bound on any single night.
pub fn booked_by_type(state: &HotelState, stay: &Stay) -> HashMap<String, u32> {
    let mut booked: HashMap<String, u32> = HashMap::new();
    for r in state.overlapping(stay).filter(|r| r.status.is_active()) {
        *booked.entry(r.room_type.clone()).or_default() += r.quantity;
    }
    booked
}

/// Same as [`booked_by_type`] restricted to one room type label.
pub fn booked_for_type(state: &HotelState, label: &str, stay: &Stay) -> u32 {
    state
        .overlapping(stay)
        .filter(|r| r.status.is_active() && r.room_type == label)
        .map(|r| r.quantity)
        .sum()
}

/// Highest number of units of one type held on any single night of `stay`.
///
/// Admission checks against this rather than the overlap sum, so two
/// reservations that never share a night do not block a stay spanning both.
pub fn peak_booked_for_type(state: &HotelState, label: &str, stay: &Stay) -> u32 {
    let mut edges: Vec<(chrono::NaiveDate, i64)> = Vec::new();
    for r in state
        .overlapping(stay)
        .filter(|r| r.status.is_active() && r.room_type == label)
    {
        edges.push((r.stay.check_in.max(stay.check_in), r.quantity as i64));
        edges.push((r.stay.check_out.min(stay.check_out), -(r.quantity as i64)));
    }
    // Departures sort before arrivals on the same date.
    edges.sort_unstable();

    let mut held = 0i64;
    let mut peak = 0i64;
    for (_, delta) in edges {
        held += delta;
        peak = peak.max(held);
    }
    peak as u32
}
