use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Hotels are keyed by the catalog's own string id.
pub type HotelId = String;

/// Half-open stay `[check_in, check_out)`. A guest leaving on a date frees
/// the room for a guest arriving the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "Stay check_in must be before check_out");
        Self { check_in, check_out }
    }

    /// `None` unless `check_out` is strictly after `check_in`.
    pub fn checked(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_in < check_out).then_some(Self { check_in, check_out })
    }

    /// Number of nights, never less than one.
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(1) as u32
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains_night(&self, night: NaiveDate) -> bool {
        self.check_in <= night && night < self.check_out
    }
}

/// Reservation lifecycle. Only `Pending` and `Confirmed` hold inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
    CheckedIn,
    CheckedOut,
}

impl ReservationStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, NoShow)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
                | (CheckedOut, Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::NoShow => "NO_SHOW",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free units of one room type. `Unbounded` means the hotel never told us how
/// many physical units it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Known(u32),
    Unbounded,
}

impl Availability {
    pub fn is_unbounded(self) -> bool {
        matches!(self, Availability::Unbounded)
    }

    /// Clamp a wanted unit count to what is free.
    pub fn cap(self, wanted: u32) -> u32 {
        match self {
            Availability::Known(n) => wanted.min(n),
            Availability::Unbounded => wanted,
        }
    }

    pub fn known(self) -> Option<u32> {
        match self {
            Availability::Known(n) => Some(n),
            Availability::Unbounded => None,
        }
    }
}

/// Canonical room type, reconciled once at ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: String,
    pub label: String,
    pub price_per_night: Decimal,
    /// `None` when the catalog carries no usable unit count.
    pub total_units: Option<u32>,
    /// Max guests per unit, at least 1.
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub city: String,
    pub stars: u8,
    pub rating: f64,
    pub cot_fee_per_night: Decimal,
    pub room_types: Vec<RoomType>,
}

impl Hotel {
    /// Look up a room type by label (case-insensitive) or by room id.
    pub fn room_type(&self, key: &str) -> Option<&RoomType> {
        self.room_types
            .iter()
            .find(|rt| rt.label.eq_ignore_ascii_case(key))
            .or_else(|| self.room_types.iter().find(|rt| rt.id == key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guests {
    pub adults: u32,
    pub children: u32,
}

impl Guests {
    /// Saturates, so an absurd party still trips the guest limit.
    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildGuest {
    pub age: Option<u8>,
    pub needs_cot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub hotel_id: HotelId,
    /// Canonical room type label.
    pub room_type: String,
    pub quantity: u32,
    pub stay: Stay,
    pub nights: u32,
    pub guests: Guests,
    pub children: Vec<ChildGuest>,
    pub guest_info: Option<GuestInfo>,
    pub user_id: Option<String>,
    pub price_per_night: Decimal,
    pub base_price: Decimal,
    pub children_cost: Decimal,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A hotel's inventory plus every reservation referencing it.
#[derive(Debug, Clone)]
pub struct HotelState {
    pub hotel: Hotel,
    /// Registration order, used as the default listing order.
    pub seq: u64,
    /// Sorted by `stay.check_in`.
    pub reservations: Vec<Reservation>,
}

impl HotelState {
    pub fn new(hotel: Hotel, seq: u64) -> Self {
        Self {
            hotel,
            seq,
            reservations: Vec::new(),
        }
    }

    /// Insert reservation maintaining sort order by check-in.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .partition_point(|r| r.stay.check_in <= reservation.stay.check_in);
        self.reservations.insert(pos, reservation);
    }

    pub fn remove_reservation(&mut self, id: Ulid) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.id == id)?;
        Some(self.reservations.remove(pos))
    }

    pub fn reservation(&self, id: Ulid) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn reservation_mut(&mut self, id: Ulid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Reservations whose stay overlaps `query`, regardless of status.
    /// Everything at index >= right_bound checks in on or after `query.check_out`.
    pub fn overlapping(&self, query: &Stay) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.stay.check_in < query.check_out);
        let from = query.check_in;
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.stay.check_out > from)
    }
}

/// WAL record format. Flat, one variant per mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    HotelRegistered {
        hotel: Hotel,
    },
    HotelRemoved {
        id: HotelId,
    },
    ReservationAdmitted {
        reservation: Reservation,
    },
    ReservationStatusChanged {
        id: Ulid,
        hotel_id: HotelId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    },
    ReservationRemoved {
        id: Ulid,
        hotel_id: HotelId,
    },
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn stay_basics() {
        let s = stay("2025-03-01", "2025-03-03");
        assert_eq!(s.nights(), 2);
        assert!(s.contains_night(date("2025-03-01")));
        assert!(s.contains_night(date("2025-03-02")));
        assert!(!s.contains_night(date("2025-03-03"))); // half-open
    }

    #[test]
    fn stay_checked_rejects_empty_and_inverted() {
        assert!(Stay::checked(date("2025-03-01"), date("2025-03-01")).is_none());
        assert!(Stay::checked(date("2025-03-02"), date("2025-03-01")).is_none());
        assert!(Stay::checked(date("2025-03-01"), date("2025-03-02")).is_some());
    }

    #[test]
    fn stay_overlap() {
        let a = stay("2025-01-01", "2025-01-03");
        let b = stay("2025-01-03", "2025-01-05");
        let c = stay("2025-01-01", "2025-01-05");
        let d = stay("2025-01-03", "2025-01-07");
        assert!(!a.overlaps(&b)); // touching, not overlapping
        assert!(!b.overlaps(&a));
        assert!(c.overlaps(&d));
        assert!(d.overlaps(&c));
    }

    #[test]
    fn status_state_machine() {
        use super::ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(CheckedIn.can_transition_to(CheckedOut));
        assert!(CheckedOut.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!CheckedIn.can_transition_to(Cancelled));
    }

    #[test]
    fn only_pending_and_confirmed_are_active() {
        use super::ReservationStatus::*;
        let active: Vec<_> = [Pending, Confirmed, Cancelled, Completed, NoShow, CheckedIn, CheckedOut]
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        assert_eq!(active, vec![Pending, Confirmed]);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ReservationStatus::NoShow).unwrap();
        assert_eq!(json, "\"NO_SHOW\"");
        let parsed: ReservationStatus = serde_json::from_str("\"CHECKED_IN\"").unwrap();
        assert_eq!(parsed, ReservationStatus::CheckedIn);
    }

    #[test]
    fn room_lookup_by_label_or_id() {
        let h = hotel_h();
        assert_eq!(h.room_type("standard").unwrap().label, "Standard");
        assert_eq!(h.room_type("SUITE").unwrap().label, "Suite");
        assert_eq!(h.room_type("suite").unwrap().id, "suite");
        assert!(h.room_type("Penthouse").is_none());
    }

    #[test]
    fn guest_total_saturates() {
        let g = Guests { adults: u32::MAX, children: 1 };
        assert_eq!(g.total(), u32::MAX);
        assert_eq!(Guests { adults: 2, children: 3 }.total(), 5);
    }

    #[test]
    fn availability_cap() {
        assert_eq!(Availability::Known(2).cap(5), 2);
        assert_eq!(Availability::Known(7).cap(5), 5);
        assert_eq!(Availability::Unbounded.cap(5), 5);
    }

    #[test]
    fn reservations_kept_sorted_by_check_in() {
        let mut hs = HotelState::new(hotel_h(), 0);
        hs.insert_reservation(reservation("Standard", 1, stay("2025-03-10", "2025-03-12"), ReservationStatus::Pending));
        hs.insert_reservation(reservation("Standard", 1, stay("2025-03-01", "2025-03-02"), ReservationStatus::Pending));
        hs.insert_reservation(reservation("Suite", 1, stay("2025-03-05", "2025-03-06"), ReservationStatus::Pending));
        let starts: Vec<_> = hs.reservations.iter().map(|r| r.stay.check_in).collect();
        assert_eq!(starts, vec![date("2025-03-01"), date("2025-03-05"), date("2025-03-10")]);
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut hs = HotelState::new(hotel_h(), 0);
        hs.insert_reservation(reservation("Standard", 1, stay("2025-02-01", "2025-02-05"), ReservationStatus::Pending));
        hs.insert_reservation(reservation("Standard", 1, stay("2025-03-02", "2025-03-04"), ReservationStatus::Pending));
        hs.insert_reservation(reservation("Standard", 1, stay("2025-04-01", "2025-04-02"), ReservationStatus::Pending));

        let hits: Vec<_> = hs.overlapping(&stay("2025-03-01", "2025-03-03")).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].stay, stay("2025-03-02", "2025-03-04"));
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        let mut hs = HotelState::new(hotel_h(), 0);
        hs.insert_reservation(reservation("Standard", 1, stay("2025-01-01", "2025-01-03"), ReservationStatus::Pending));
        assert_eq!(hs.overlapping(&stay("2025-01-03", "2025-01-05")).count(), 0);
        assert_eq!(hs.overlapping(&stay("2024-12-30", "2025-01-01")).count(), 0);
    }

    #[test]
    fn overlapping_long_stay_spanning_query() {
        let mut hs = HotelState::new(hotel_h(), 0);
        hs.insert_reservation(reservation("Suite", 1, stay("2025-01-01", "2025-12-31"), ReservationStatus::Confirmed));
        assert_eq!(hs.overlapping(&stay("2025-06-01", "2025-06-02")).count(), 1);
    }

    #[test]
    fn remove_reservation_by_id() {
        let mut hs = HotelState::new(hotel_h(), 0);
        let r = reservation("Standard", 1, stay("2025-01-01", "2025-01-03"), ReservationStatus::Pending);
        let id = r.id;
        hs.insert_reservation(r);
        assert!(hs.remove_reservation(Ulid::new()).is_none());
        assert_eq!(hs.remove_reservation(id).unwrap().id, id);
        assert!(hs.reservations.is_empty());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::ReservationAdmitted {
            reservation: reservation("Suite", 2, stay("2025-03-01", "2025-03-03"), ReservationStatus::Pending),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
