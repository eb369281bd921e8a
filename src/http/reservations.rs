use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use ulid::Ulid;

use crate::engine::{AdmissionRequest, EngineError};
use crate::model::{ChildGuest, Guests};

use super::dto::*;
use super::{ApiError, AppState};

fn parse_id(raw: &str) -> Result<Ulid, ApiError> {
    Ulid::from_string(raw).map_err(|_| ApiError::bad_request(format!("invalid reservation id: {raw:?}")))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationDto>), ApiError> {
    let Json(req) = body?;
    let room_type = req
        .room_type
        .filter(|s| !s.trim().is_empty())
        .or(req.room_id)
        .ok_or_else(|| ApiError::bad_request("roomType or roomId is required"))?;

    let admission = AdmissionRequest {
        hotel_id: req.hotel_id,
        room_type,
        quantity: req.quantity,
        check_in: req.check_in,
        check_out: req.check_out,
        guests: Guests {
            adults: req.guests.adults,
            children: req.guests.children,
        },
        children: req
            .children
            .into_iter()
            .map(|c| ChildGuest {
                age: c.age,
                needs_cot: c.needs_cot,
            })
            .collect(),
        guest_info: req.guest_info,
        user_id: req.user_id,
    };

    match state.engine.admit_reservation(admission).await {
        Ok(reservation) => Ok((StatusCode::CREATED, Json(reservation.into()))),
        // A room the hotel doesn't have is a bad request here, not a missing page.
        Err(e @ EngineError::UnknownRoomType { .. }) => Err(ApiError::bad_request(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReservationDto>, ApiError> {
    let reservation = state.engine.get_reservation(parse_id(&id)?).await?;
    Ok(Json(reservation.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<ReservationDto>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = body?;
    let reservation = state.engine.transition_reservation(id, update.status).await?;
    Ok(Json(reservation.into()))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.engine.remove_reservation(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_for_hotel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReservationDto>>, ApiError> {
    let reservations = state.engine.list_reservations(&id).await?;
    Ok(Json(reservations.into_iter().map(ReservationDto::from).collect()))
}
