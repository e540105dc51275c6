use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingFilter, BookingStatus, Hotel, Room, RoomStatus, User};
use crate::services::bookings;
use crate::services::catalog::{self, NewHotel, NewRoom, UpdateHotel, UpdateRoom};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/hotels
pub async fn create_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewHotel>,
) -> Result<Json<Hotel>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::create_hotel(&state, body)?))
}

// PUT /api/admin/hotels/:id
pub async fn update_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateHotel>,
) -> Result<Json<Hotel>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::update_hotel(&state, &id, body)?))
}

// DELETE /api/admin/hotels/:id
pub async fn delete_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    catalog::delete_hotel(&state, &id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// GET /api/admin/hotels/:id/guests
pub async fn get_hotel_guests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::hotel_guests(&state, &id)?))
}

// POST /api/admin/hotels/:id/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(hotel_id): Path<String>,
    Json(body): Json<NewRoom>,
) -> Result<Json<Room>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::create_room(&state, &hotel_id, body)?))
}

// PUT /api/admin/rooms/:id
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoom>,
) -> Result<Json<Room>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::update_room(&state, &id, body)?))
}

// DELETE /api/admin/rooms/:id
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    catalog::delete_room(&state, &id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// PATCH /api/admin/rooms/:id/status
#[derive(Deserialize)]
pub struct RoomStatusRequest {
    pub status: RoomStatus,
}

pub async fn set_room_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<String>,
    Json(body): Json<RoomStatusRequest>,
) -> Result<Json<Room>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(catalog::set_room_status(&state, &room_id, body.status)?))
}

// GET /api/admin/bookings
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(bookings::list_bookings(&state, &filter)?))
}

// PATCH /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct BookingStatusRequest {
    pub booking_status: BookingStatus,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<BookingStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let booking = bookings::update_status(&state, &id, body.booking_status).await?;
    Ok(Json(booking))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    bookings::delete_booking(&state, &id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_check_auth() {
        assert!(check_auth(&headers("Bearer secret"), "secret").is_ok());
        assert!(check_auth(&headers("Bearer wrong"), "secret").is_err());
        assert!(check_auth(&headers("secret"), "secret").is_err());
        assert!(check_auth(&HeaderMap::new(), "secret").is_err());
        assert!(check_auth(&headers("Bearer "), "").is_err());
    }
}
