use std::collections::HashMap;

use crate::model::*;

/// Free units for one room type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAvailability {
    pub label: String,
    pub total_units: Option<u32>,
    pub booked: u32,
    pub available: Availability,
}

/// Per-type availability for a hotel, in the hotel's room type order.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelAvailability {
    pub by_type: Vec<TypeAvailability>,
    /// Sum of the known per-type figures.
    pub total_available: u32,
    /// Every room type lacks a unit count. Such hotels must not be filtered
    /// out for having "zero" rooms.
    pub inventory_unknown: bool,
}

impl HotelAvailability {
    pub fn get(&self, label: &str) -> Option<&TypeAvailability> {
        self.by_type.iter().find(|t| t.label == label)
    }
}

/// `available = max(0, total - booked)` for one type, or `Unbounded` when the
/// type has no unit count.
pub fn resolve_type(room: &RoomType, booked: u32) -> TypeAvailability {
    let available = match room.total_units {
        Some(total) => Availability::Known(total.saturating_sub(booked)),
        None => Availability::Unbounded,
    };
    TypeAvailability {
        label: room.label.clone(),
        total_units: room.total_units,
        booked,
        available,
    }
}

/// Combine static inventory with booked counts. `booked == None` means no date
/// range was given: every type reports its full static inventory.
pub fn resolve(hotel: &Hotel, booked: Option<&HashMap<String, u32>>) -> HotelAvailability {
    let by_type: Vec<TypeAvailability> = hotel
        .room_types
        .iter()
        .map(|room| {
            let held = booked
                .and_then(|b| b.get(&room.label))
                .copied()
                .unwrap_or(0);
            resolve_type(room, held)
        })
        .collect();

    let total_available = by_type
        .iter()
        .filter_map(|t| t.available.known())
        .sum();
    let inventory_unknown =
        !by_type.is_empty() && by_type.iter().all(|t| t.available.is_unbounded());

    HotelAvailability {
        by_type,
        total_available,
        inventory_unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;

    #[test]
    fn subtracts_booked_units() {
        let booked = HashMap::from([("Standard".to_string(), 1)]);
        let avail = resolve(&hotel_h(), Some(&booked));
        assert_eq!(avail.get("Standard").unwrap().available, Availability::Known(1));
        assert_eq!(avail.get("Suite").unwrap().available, Availability::Known(1));
        assert_eq!(avail.total_available, 2);
        assert!(!avail.inventory_unknown);
    }

    #[test]
    fn never_negative() {
        let booked = HashMap::from([("Suite".to_string(), 5)]);
        let avail = resolve(&hotel_h(), Some(&booked));
        assert_eq!(avail.get("Suite").unwrap().available, Availability::Known(0));
        assert_eq!(avail.get("Suite").unwrap().booked, 5);
    }

    #[test]
    fn no_range_reports_static_inventory() {
        let avail = resolve(&hotel_h(), None);
        assert_eq!(avail.get("Standard").unwrap().available, Availability::Known(2));
        assert_eq!(avail.total_available, 3);
    }

    #[test]
    fn unknown_units_are_unbounded() {
        let h = hotel(
            "demo",
            vec![room("Dorm", 20, None, 6), room("Cabin", 90, None, 2)],
        );
        let avail = resolve(&h, Some(&HashMap::new()));
        assert!(avail.by_type.iter().all(|t| t.available == Availability::Unbounded));
        assert_eq!(avail.total_available, 0);
        assert!(avail.inventory_unknown);
    }

    #[test]
    fn mixed_inventory_is_not_unknown() {
        let h = hotel(
            "mixed",
            vec![room("Dorm", 20, None, 6), room("Double", 90, Some(3), 2)],
        );
        let avail = resolve(&h, None);
        assert!(!avail.inventory_unknown);
        assert_eq!(avail.total_available, 3);
    }

    #[test]
    fn hotel_without_rooms() {
        let avail = resolve(&hotel("empty", vec![]), None);
        assert!(avail.by_type.is_empty());
        assert!(!avail.inventory_unknown);
    }
}
