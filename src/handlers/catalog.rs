use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Hotel, HotelFilter, Room, RoomFilter, User};
use crate::services::catalog::{self, NewUser};
use crate::state::AppState;

// GET /api/hotels
pub async fn get_hotels(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<HotelFilter>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    Ok(Json(catalog::list_hotels(&state, &filter)?))
}

// GET /api/hotels/:id
pub async fn get_hotel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Hotel>, AppError> {
    Ok(Json(catalog::get_hotel(&state, &id)?))
}

// GET /api/hotels/:id/rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    Path(hotel_id): Path<String>,
    Query(filter): Query<RoomFilter>,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(catalog::list_rooms(&state, &hotel_id, &filter)?))
}

// GET /api/rooms/:id
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(catalog::get_room(&state, &id)?))
}

// POST /api/users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<Json<User>, AppError> {
    Ok(Json(catalog::register_user(&state, body)?))
}

// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(catalog::get_user(&state, &id)?))
}
