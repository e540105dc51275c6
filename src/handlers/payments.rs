use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Booking, Transaction};
use crate::services::bookings;
use crate::state::AppState;

// GET /api/payments/user/:user_id
pub async fn get_user_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(bookings::user_transactions(&state, &user_id)?))
}

// POST /api/payments/:booking_id/verify
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(bookings::verify_payment(&state, &booking_id)?))
}

// POST /api/payments/:booking_id/failed
pub async fn payment_failed(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    bookings::mark_payment_failed(&state, &booking_id)?;
    Ok(Json(serde_json::json!({ "ok": true, "deleted": booking_id })))
}
