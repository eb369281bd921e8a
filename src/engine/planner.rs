use rust_decimal::Decimal;

use crate::model::*;

/// A room type as the planner sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub price_per_night: Decimal,
    pub capacity: u32,
    pub available: Availability,
}

impl Candidate {
    pub fn from_room(room: &RoomType, available: Availability) -> Self {
        Self {
            label: room.label.clone(),
            price_per_night: room.price_per_night,
            capacity: room.capacity,
            available,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub total_guests: u32,
    pub requested_rooms: u32,
    /// Restrict to one room type label (case-insensitive).
    pub room_type: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationLine {
    pub label: String,
    pub units_used: u32,
    pub capacity_per_unit: u32,
    pub price_per_night: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    /// Ascending by price per night.
    pub lines: Vec<AllocationLine>,
    /// `max(units needed to seat everyone, requested rooms)`.
    pub rooms_needed: u32,
    pub guests_covered: bool,
}

impl AllocationPlan {
    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|l| l.units_used).sum()
    }

    pub fn total_capacity(&self) -> u32 {
        self.lines.iter().map(|l| l.units_used * l.capacity_per_unit).sum()
    }

    pub fn nightly_total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.price_per_night * Decimal::from(l.units_used))
            .sum()
    }
}

/// Types that may take part in a plan, cheapest first. The sort is stable so
/// equal prices keep catalog order.
pub fn eligible<'c>(candidates: &'c [Candidate], room_type: Option<&str>) -> Vec<&'c Candidate> {
    let mut out: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.capacity >= 1 && !c.price_per_night.is_sign_negative())
        .filter(|c| room_type.is_none_or(|want| c.label.eq_ignore_ascii_case(want)))
        .collect();
    out.sort_by(|a, b| a.price_per_night.cmp(&b.price_per_night));
    out
}

/// Units of a type worth considering: enough to seat everyone alone, capped by
/// what is free.
fn useful_units(c: &Candidate, guests: u32) -> u32 {
    c.available.cap(guests.div_ceil(c.capacity))
}

/// Cheapest-first walk: take as many units of each type as the remaining
/// party needs, capped by availability. Returns units per eligible type and
/// the guests left unseated.
#[cfg(test)]
fn greedy_cover(total_guests: u32, eligible: &[&Candidate]) -> (Vec<u32>, u32) {
    let mut remaining = total_guests;
    let mut counts = vec![0u32; eligible.len()];
    for (i, c) in eligible.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let units = useful_units(c, remaining);
        if units > 0 {
            counts[i] = units;
            remaining = remaining.saturating_sub(units * c.capacity);
        }
    }
    (counts, remaining)
}

/// Exact minimum-cost cover of `total_guests` with bounded units per type.
///
/// Layered DP over "guests seated so far" (capped at the party size), one
/// layer per type in ascending price order. Cost ties prefer fewer units,
/// then fewer units of the later type, so cheaper types win ties.
///
/// A layer only tries unit counts that still seat someone, so its work is
/// about `G^2 / (2 * capacity)` for a party of `G`. The guest and room-type
/// limits keep the worst case near 1.3M steps per hotel.
fn cheapest_cover(total_guests: u32, eligible: &[&Candidate]) -> Option<Vec<u32>> {
    let g_max = total_guests as usize;
    let mut dp: Vec<Option<(Decimal, u32)>> = vec![None; g_max + 1];
    dp[0] = Some((Decimal::ZERO, 0));
    let mut choices: Vec<Vec<(u32, usize)>> = Vec::with_capacity(eligible.len());

    for c in eligible {
        let max_units = useful_units(c, total_guests);
        let mut next: Vec<Option<(Decimal, u32)>> = vec![None; g_max + 1];
        let mut choice = vec![(0u32, 0usize); g_max + 1];

        for (g, best) in dp.iter().enumerate() {
            let Some((cost, units)) = *best else { continue };
            let still_needed = (g_max - g).div_ceil(c.capacity as usize) as u32;
            for k in 0..=max_units.min(still_needed) {
                let seated = (g + k as usize * c.capacity as usize).min(g_max);
                let cand = (cost + c.price_per_night * Decimal::from(k), units + k);
                // On equal cost and units prefer fewer units of this (pricier) type.
                let better = match next[seated] {
                    None => true,
                    Some(cur) => cand < cur || (cand == cur && k < choice[seated].0),
                };
                if better {
                    next[seated] = Some(cand);
                    choice[seated] = (k, g);
                }
            }
        }
        dp = next;
        choices.push(choice);
    }

    dp[g_max]?;
    let mut counts = vec![0u32; eligible.len()];
    let mut g = g_max;
    for (i, choice) in choices.iter().enumerate().rev() {
        let (k, prev) = choice[g];
        counts[i] = k;
        g = prev;
    }
    Some(counts)
}

/// Plan which room types, and how many units of each, seat the party at the
/// lowest nightly cost while meeting the room-count floor.
///
/// `None` means the hotel cannot host this party. An `Unbounded` type can
/// always absorb the whole party, so a hotel whose inventory is entirely
/// unknown is never excluded for lack of rooms.
pub fn plan(req: &PlanRequest<'_>, candidates: &[Candidate]) -> Option<AllocationPlan> {
    let total_guests = req.total_guests.max(1);
    let requested_rooms = req.requested_rooms.max(1);
    let eligible = eligible(candidates, req.room_type);
    if eligible.is_empty() {
        return None;
    }

    let mut counts = cheapest_cover(total_guests, &eligible)?;
    let cover_units: u32 = counts.iter().sum();

    // Room-count floor: top up with the cheapest types that still have spare units.
    let mut units = cover_units;
    for (i, c) in eligible.iter().enumerate() {
        if units >= requested_rooms {
            break;
        }
        let spare = match c.available {
            Availability::Known(n) => n.saturating_sub(counts[i]),
            Availability::Unbounded => u32::MAX,
        };
        let extra = spare.min(requested_rooms - units);
        counts[i] += extra;
        units += extra;
    }
    if units < requested_rooms {
        return None;
    }

    let lines: Vec<AllocationLine> = eligible
        .iter()
        .zip(&counts)
        .filter(|(_, n)| **n > 0)
        .map(|(c, n)| AllocationLine {
            label: c.label.clone(),
            units_used: *n,
            capacity_per_unit: c.capacity,
            price_per_night: c.price_per_night,
        })
        .collect();

    let seats: u32 = lines.iter().map(|l| l.units_used * l.capacity_per_unit).sum();
    Some(AllocationPlan {
        lines,
        rooms_needed: cover_units.max(requested_rooms),
        guests_covered: seats >= total_guests,
    })
}
