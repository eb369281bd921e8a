use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::engine::{EngineError, SearchQuery, SortKey};
use crate::limits::DEFAULT_PAGE_SIZE;
use crate::model::{Guests, Stay};

use super::dto::*;
use super::{ApiError, AppState};

/// Query strings arrive as raw text so malformed values get our JSON 400
/// instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    city: Option<String>,
    from: Option<String>,
    to: Option<String>,
    adults: Option<String>,
    children: Option<String>,
    rooms: Option<String>,
    room_type: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailParams {
    from: Option<String>,
    to: Option<String>,
    adults: Option<String>,
    children: Option<String>,
    rooms: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    room_type: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, ApiError> {
    present(value)
        .map(|s| {
            s.parse()
                .map_err(|_| ApiError::bad_request(format!("invalid {name}: {s:?}")))
        })
        .transpose()
}

fn parse_date(name: &str, s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid {name}: expected YYYY-MM-DD, got {s:?}")))
}

/// Both dates or neither.
fn parse_stay(from: &Option<String>, to: &Option<String>) -> Result<Option<Stay>, ApiError> {
    match (present(from), present(to)) {
        (None, None) => Ok(None),
        (Some(f), Some(t)) => {
            let stay = Stay::checked(parse_date("from", f)?, parse_date("to", t)?)
                .ok_or(EngineError::InvalidRange)?;
            Ok(Some(stay))
        }
        _ => Err(ApiError::bad_request("from and to must be given together")),
    }
}

fn parse_guests(adults: &Option<String>, children: &Option<String>) -> Result<Guests, ApiError> {
    Ok(Guests {
        adults: parse_opt("adults", adults)?.unwrap_or(1),
        children: parse_opt("children", children)?.unwrap_or(0),
    })
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let stay = parse_stay(&params.from, &params.to)?;
    let sort = present(&params.sort).map(SortKey::from_str).transpose()?;
    let query = SearchQuery {
        city: present(&params.city).map(str::to_string),
        stay,
        guests: parse_guests(&params.adults, &params.children)?,
        rooms: parse_opt("rooms", &params.rooms)?.unwrap_or(1),
        room_type: present(&params.room_type).map(str::to_string),
        min_price: parse_opt::<Decimal>("minPrice", &params.min_price)?,
        max_price: parse_opt::<Decimal>("maxPrice", &params.max_price)?,
        sort,
        page: parse_opt("page", &params.page)?.unwrap_or(1),
        limit: parse_opt("limit", &params.limit)?.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let outcome = state.engine.search(&query).await?;
    Ok(Json(SearchResponse {
        hotels: outcome
            .hits
            .iter()
            .map(|hit| SearchHitDto::new(hit, stay.as_ref()))
            .collect(),
        total_count: outcome.total_count,
        page: query.page,
        limit: query.limit,
        search_meta: SearchMetaDto {
            nights: outcome.nights,
            total_guests: outcome.total_guests,
            requested_rooms: outcome.requested_rooms,
        },
    }))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Json<HotelDetailDto>, ApiError> {
    let stay = parse_stay(&params.from, &params.to)?;
    let guests = parse_guests(&params.adults, &params.children)?;
    let rooms = parse_opt("rooms", &params.rooms)?.unwrap_or(1);
    let detail = state.engine.hotel_detail(&id, stay, guests, rooms).await?;
    Ok(Json(HotelDetailDto::from(&detail)))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<RoomAvailabilityDto>, ApiError> {
    let room_type = present(&params.room_type)
        .ok_or_else(|| ApiError::bad_request("roomType is required"))?
        .to_string();
    let stay = parse_stay(&params.from, &params.to)?
        .ok_or_else(|| ApiError::bad_request("from and to are required"))?;
    let avail = state.engine.room_availability(&id, &room_type, stay).await?;
    Ok(Json(RoomAvailabilityDto::new(&stay, avail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn stay_requires_both_dates() {
        assert!(parse_stay(&None, &None).unwrap().is_none());
        assert!(parse_stay(&s("2025-03-01"), &None).is_err());
        assert!(parse_stay(&None, &s("2025-03-03")).is_err());
        assert_eq!(parse_stay(&s("2025-03-01"), &s("2025-03-03")).unwrap().unwrap().nights(), 2);
    }

    #[test]
    fn stay_rejects_inverted_and_malformed() {
        let err = parse_stay(&s("2025-03-03"), &s("2025-03-01")).unwrap_err();
        assert_eq!(err.code(), "INVALID_RANGE");
        assert!(parse_stay(&s("03/01/2025"), &s("2025-03-03")).is_err());
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(parse_opt::<u32>("rooms", &s("  ")).unwrap(), None);
        assert_eq!(parse_opt::<u32>("rooms", &s("3")).unwrap(), Some(3));
        assert!(parse_opt::<u32>("rooms", &s("-3")).is_err());
    }

    #[test]
    fn guest_defaults() {
        let g = parse_guests(&None, &None).unwrap();
        assert_eq!((g.adults, g.children), (1, 0));
    }
}
