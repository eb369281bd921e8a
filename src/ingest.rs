//! Catalog documents as they arrive from the hotel-management side.
//!
//! Room documents name their unit count and guest capacity several different
//! ways. Everything is reconciled here, once, into [`Hotel`]/[`RoomType`] so the
//! allocation code only ever sees one canonical shape.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::limits::*;
use crate::model::{Hotel, RoomType};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("hotel id must not be empty")]
    EmptyId,
    #[error("hotel {hotel}: duplicate room type {label:?}")]
    DuplicateRoomType { hotel: String, label: String },
    #[error("hotel {0}: too many room types")]
    TooManyRoomTypes(String),
    #[error("hotel {0}: room type label empty or too long")]
    BadLabel(String),
    #[error("read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDocument {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "starRating")]
    pub stars: Option<f64>,
    #[serde(default, alias = "averageRating")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub cot_fee_per_night: Option<f64>,
    #[serde(default, alias = "rooms")]
    pub room_types: Vec<RoomDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "type", alias = "name")]
    pub label: String,
    #[serde(alias = "price")]
    pub price_per_night: f64,
    #[serde(default)]
    pub total_units: Option<i64>,
    #[serde(default)]
    pub available_rooms: Option<i64>,
    #[serde(default)]
    pub total_rooms: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub max_adults: Option<i64>,
    #[serde(default)]
    pub max_children: Option<i64>,
}

impl RoomDocument {
    /// First positive unit count among the field spellings, else unknown.
    fn total_units(&self) -> Option<u32> {
        [self.total_units, self.available_rooms, self.total_rooms, self.quantity]
            .into_iter()
            .flatten()
            .find(|n| *n > 0)
            .map(|n| n.min(u32::MAX as i64) as u32)
    }

    fn capacity(&self) -> u32 {
        let explicit = self.capacity.filter(|c| *c > 0);
        let derived = self.max_adults.unwrap_or(0).max(0).saturating_add(self.max_children.unwrap_or(0).max(0));
        explicit.unwrap_or(derived).clamp(1, u32::MAX as i64) as u32
    }

    fn price(&self) -> Option<Decimal> {
        if !self.price_per_night.is_finite() || self.price_per_night < 0.0 {
            return None;
        }
        Decimal::from_f64(self.price_per_night)
    }
}

impl HotelDocument {
    pub fn into_hotel(self) -> Result<Hotel, IngestError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(IngestError::EmptyId);
        }
        if self.room_types.len() > MAX_ROOM_TYPES_PER_HOTEL {
            return Err(IngestError::TooManyRoomTypes(id));
        }

        let mut seen = HashSet::new();
        let mut room_types = Vec::with_capacity(self.room_types.len());
        for doc in &self.room_types {
            let label = doc.label.trim().to_string();
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(IngestError::BadLabel(id));
            }
            if !seen.insert(label.to_lowercase()) {
                return Err(IngestError::DuplicateRoomType { hotel: id, label });
            }
            let Some(price_per_night) = doc.price() else {
                warn!(hotel = %id, room = %label, price = doc.price_per_night, "dropping room type with unusable price");
                continue;
            };
            room_types.push(RoomType {
                id: doc.id.clone().unwrap_or_else(|| label.to_lowercase()),
                total_units: doc.total_units(),
                capacity: doc.capacity(),
                price_per_night,
                label,
            });
        }

        Ok(Hotel {
            name: if self.name.is_empty() { id.clone() } else { self.name },
            city: self.city,
            stars: self.stars.map_or(0, |s| s.clamp(0.0, 5.0) as u8),
            rating: self.rating.filter(|r| r.is_finite()).unwrap_or(0.0),
            cot_fee_per_night: self
                .cot_fee_per_night
                .filter(|f| f.is_finite() && *f >= 0.0)
                .and_then(Decimal::from_f64)
                .unwrap_or(Decimal::ZERO),
            id,
            room_types,
        })
    }
}

/// Load a JSON array of hotel documents.
pub fn load_seed_file(path: &Path) -> Result<Vec<Hotel>, IngestError> {
    let raw = std::fs::read_to_string(path)?;
    let docs: Vec<HotelDocument> = serde_json::from_str(&raw)?;
    docs.into_iter().map(HotelDocument::into_hotel).collect()
}
