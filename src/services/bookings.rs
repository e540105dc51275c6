use chrono::{Days, Local, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingDetails, BookingFilter, BookingStatus, PaymentStatus, RoomStatus, Transaction};
use crate::services::{lifecycle, notifications};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub room_id: String,
    pub user_id: String,
    pub total_guests: i32,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
}

fn booking_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Booking not found with id: {id}"))
}

fn new_transaction_id() -> String {
    format!("TXN{}", Utc::now().timestamp_millis())
}

/// Re-derives a room's status from all of its bookings and writes it back.
/// Returns `None` if the room no longer exists.
pub fn reconcile_room(conn: &Connection, room_id: &str) -> anyhow::Result<Option<RoomStatus>> {
    let Some(room) = queries::get_room(conn, room_id)? else {
        return Ok(None);
    };

    let statuses: Vec<BookingStatus> = queries::get_bookings_for_room(conn, room_id)?
        .iter()
        .map(|b| b.booking_status)
        .collect();
    let status = lifecycle::derive_room_status(room.status, &statuses);

    queries::update_room_status(conn, room_id, status)?;
    if status != room.status {
        tracing::info!(room_id = %room_id, from = room.status.as_str(), to = status.as_str(), "room status changed");
    }
    Ok(Some(status))
}

/// Notification context is loaded after commit; a failure here only costs
/// the notification.
fn load_details(conn: &Connection, id: &str) -> Option<BookingDetails> {
    match queries::get_booking_details(conn, id) {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!(booking_id = %id, error = %e, "failed to load booking details for notification");
            None
        }
    }
}

pub fn book_room(state: &AppState, req: NewBooking) -> Result<Booking, AppError> {
    if req.total_guests < 1 {
        return Err(AppError::BadRequest("total_guests must be at least 1".to_string()));
    }

    let today = Local::now().date_naive();
    let check_in = req.check_in_date.unwrap_or(today);
    let check_out = match req.check_out_date {
        Some(date) => date,
        None => check_in
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest(format!("check_in_date out of range: {check_in}")))?,
    };
    if check_out <= check_in {
        return Err(AppError::InvalidState(
            "Check-out date must be after check-in date".to_string(),
        ));
    }

    let mut db = state.lock_db()?;
    let tx = db.transaction()?;

    if queries::get_user(&tx, &req.user_id)?.is_none() {
        return Err(AppError::NotFound(format!("User not found with id: {}", req.user_id)));
    }
    let room = queries::get_room(&tx, &req.room_id)?
        .ok_or_else(|| AppError::NotFound(format!("Room not found with id: {}", req.room_id)))?;

    if room.status == RoomStatus::Maintenance {
        return Err(AppError::InvalidState(format!(
            "Room {} is under maintenance",
            room.room_number
        )));
    }
    if let Some(capacity) = room.capacity {
        if req.total_guests > capacity {
            return Err(AppError::BadRequest(format!(
                "Room {} holds at most {capacity} guests",
                room.room_number
            )));
        }
    }
    if queries::has_overlapping_booking(&tx, &room.id, check_in, check_out)? {
        return Err(AppError::Conflict(format!(
            "Room {} is already booked for the selected dates",
            room.room_number
        )));
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: req.user_id,
        hotel_id: room.hotel_id.clone(),
        room_id: room.id.clone(),
        booking_status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        check_in_date: Some(check_in),
        check_out_date: Some(check_out),
        total_guests: req.total_guests,
        total_amount: room.price,
        transaction_id: Some(new_transaction_id()),
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking)?;
    reconcile_room(&tx, &room.id)?;
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, room_id = %booking.room_id, "room booked");
    Ok(booking)
}

/// Staff status change. Not subject to the cancellation window.
pub async fn update_status(
    state: &AppState,
    id: &str,
    requested: BookingStatus,
) -> Result<Booking, AppError> {
    let (booking, change, details) = {
        let mut db = state.lock_db()?;
        let tx = db.transaction()?;

        let mut booking = queries::get_booking_by_id(&tx, id)?.ok_or_else(|| booking_not_found(id))?;
        let change = lifecycle::apply_status_change(&mut booking, requested);
        queries::save_booking(&tx, &mut booking)?;
        reconcile_room(&tx, &booking.room_id)?;
        tx.commit()?;

        let details = if change.is_confirmation() {
            load_details(&db, id)
        } else {
            None
        };
        (booking, change, details)
    };

    tracing::info!(
        booking_id = %id,
        from = change.previous.as_str(),
        to = change.applied.as_str(),
        "booking status updated"
    );

    if let Some(details) = details {
        notifications::notify_confirmed(state, &details).await;
    }

    Ok(booking)
}

/// Guest self-service cancellation, gated by ownership and the
/// cancellation window.
pub async fn cancel(state: &AppState, id: &str, requesting_user_id: &str) -> Result<Booking, AppError> {
    let now = Local::now().naive_local();

    let (booking, details) = {
        let mut db = state.lock_db()?;
        let tx = db.transaction()?;

        let mut booking = queries::get_booking_by_id(&tx, id)?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        lifecycle::check_cancellation(
            &booking,
            requesting_user_id,
            now,
            state.config.cancellation_hours_before_checkin,
        )?;

        lifecycle::apply_cancellation(&mut booking);
        queries::save_booking(&tx, &mut booking)?;
        reconcile_room(&tx, &booking.room_id)?;
        tx.commit()?;

        let details = load_details(&db, id);
        (booking, details)
    };

    tracing::info!(booking_id = %id, user_id = %requesting_user_id, "booking cancelled by guest");

    if let Some(details) = details {
        notifications::notify_cancelled(state, &details).await;
    }

    Ok(booking)
}

pub fn delete_booking(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut db = state.lock_db()?;
    let tx = db.transaction()?;

    let booking = queries::get_booking_by_id(&tx, id)?.ok_or_else(|| booking_not_found(id))?;
    queries::delete_booking(&tx, id)?;
    reconcile_room(&tx, &booking.room_id)?;
    tx.commit()?;

    tracing::info!(booking_id = %id, room_id = %booking.room_id, "booking deleted");
    Ok(())
}

pub fn verify_payment(state: &AppState, id: &str) -> Result<Booking, AppError> {
    let db = state.lock_db()?;
    let mut booking = queries::get_booking_by_id(&db, id)?.ok_or_else(|| booking_not_found(id))?;

    if booking.payment_status == PaymentStatus::Paid {
        return Ok(booking);
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(AppError::InvalidState(
            "Cannot verify payment for a cancelled booking".to_string(),
        ));
    }

    booking.payment_status = PaymentStatus::Paid;
    if booking.transaction_id.as_deref().map_or(true, str::is_empty) {
        booking.transaction_id = Some(new_transaction_id());
    }
    queries::save_booking(&db, &mut booking)?;

    tracing::info!(booking_id = %id, "payment verified");
    Ok(booking)
}

/// An unpaid booking whose payment failed is removed outright.
pub fn mark_payment_failed(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut db = state.lock_db()?;
    let tx = db.transaction()?;

    let booking = queries::get_booking_by_id(&tx, id)?.ok_or_else(|| booking_not_found(id))?;
    if booking.payment_status == PaymentStatus::Paid {
        return Err(AppError::InvalidState(
            "Cannot mark paid booking as failed".to_string(),
        ));
    }

    queries::delete_booking(&tx, id)?;
    reconcile_room(&tx, &booking.room_id)?;
    tx.commit()?;

    tracing::info!(booking_id = %id, "booking deleted after payment failure");
    Ok(())
}

pub fn list_bookings(state: &AppState, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
    let db = state.lock_db()?;
    Ok(queries::find_bookings(&db, filter)?)
}

pub fn user_transactions(state: &AppState, user_id: &str) -> Result<Vec<Transaction>, AppError> {
    let db = state.lock_db()?;
    Ok(queries::get_user_transactions(&db, user_id)?)
}
