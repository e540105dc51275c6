use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingFilter, BookingStatus};
use crate::services::bookings::{self, NewBooking};
use crate::state::AppState;

// POST /api/bookings
pub async fn book_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(bookings::book_room(&state, body)?))
}

// GET /api/bookings/user/:user_id
#[derive(Deserialize)]
pub struct UserBookingsQuery {
    pub search: Option<String>,
    pub booking_status: Option<BookingStatus>,
}

pub async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let filter = BookingFilter::for_user(&user_id)
        .search(query.search)
        .status(query.booking_status);
    Ok(Json(bookings::list_bookings(&state, &filter)?))
}

// POST /api/bookings/:id/cancel?user_id=
#[derive(Deserialize)]
pub struct CancelQuery {
    pub user_id: String,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CancelQuery>,
) -> Result<Json<Booking>, AppError> {
    let booking = bookings::cancel(&state, &id, &query.user_id).await?;
    Ok(Json(booking))
}
