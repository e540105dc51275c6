//! Booking status rules: transitions, payment coupling, room availability and
//! the self-service cancellation window. Nothing here touches storage.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentStatus, RoomStatus};

/// Hour of day (local) at which a stay begins.
pub const CHECK_IN_HOUR: u32 = 14;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CancelRejection {
    #[error("You are not authorized to cancel this booking")]
    NotOwner,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot cancel booking after check-in")]
    AfterCheckIn,

    #[error("Invalid booking: check-in date not found")]
    MissingCheckIn,

    #[error("Cancellation is only allowed {required} hours before check-in. Current time remaining: {remaining} hours")]
    OutsideWindow { required: i64, remaining: i64 },
}

impl From<CancelRejection> for AppError {
    fn from(rejection: CancelRejection) -> Self {
        match rejection {
            CancelRejection::NotOwner => AppError::Forbidden(rejection.to_string()),
            _ => AppError::InvalidState(rejection.to_string()),
        }
    }
}

/// Outcome of applying a staff status change to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: BookingStatus,
    pub requested: BookingStatus,
    pub applied: BookingStatus,
}

impl StatusChange {
    pub fn is_confirmation(&self) -> bool {
        self.previous == BookingStatus::Pending && self.requested == BookingStatus::Confirmed
    }
}

/// CHECKED_OUT is never stored; it closes the stay.
pub fn normalize_status(requested: BookingStatus) -> BookingStatus {
    match requested {
        BookingStatus::CheckedOut => BookingStatus::Completed,
        other => other,
    }
}

/// Staff status change. Any status is accepted; cancelling a paid booking
/// refunds it.
pub fn apply_status_change(booking: &mut Booking, requested: BookingStatus) -> StatusChange {
    let previous = booking.booking_status;
    let applied = normalize_status(requested);

    booking.booking_status = applied;
    if requested == BookingStatus::Cancelled {
        refund_if_paid(booking);
    }

    StatusChange {
        previous,
        requested,
        applied,
    }
}

pub fn refund_if_paid(booking: &mut Booking) {
    if booking.payment_status == PaymentStatus::Paid {
        booking.payment_status = PaymentStatus::Refunded;
    }
}

/// Recomputes a room's status from the statuses of all its bookings.
pub fn derive_room_status(current: RoomStatus, bookings: &[BookingStatus]) -> RoomStatus {
    if current == RoomStatus::Maintenance {
        return current;
    }
    if bookings.iter().any(BookingStatus::holds_room) {
        return RoomStatus::Booked;
    }
    if bookings.iter().all(BookingStatus::is_terminal) {
        return RoomStatus::Available;
    }
    current
}

/// Whole hours from `now` until check-in, truncated toward zero. Negative
/// once check-in has passed.
pub fn hours_until_check_in(check_in: NaiveDate, now: NaiveDateTime) -> i64 {
    let check_in_at = check_in.and_time(NaiveTime::MIN) + chrono::Duration::hours(CHECK_IN_HOUR as i64);
    (check_in_at - now).num_hours()
}

/// Checks a guest's own cancellation request against ownership, status
/// and the cancellation window. The first failing check wins.
pub fn check_cancellation(
    booking: &Booking,
    requesting_user_id: &str,
    now: NaiveDateTime,
    min_hours_before_check_in: i64,
) -> Result<(), CancelRejection> {
    if booking.user_id != requesting_user_id {
        return Err(CancelRejection::NotOwner);
    }

    match booking.booking_status {
        BookingStatus::Cancelled => return Err(CancelRejection::AlreadyCancelled),
        BookingStatus::CheckedIn | BookingStatus::CheckedOut | BookingStatus::Completed => {
            return Err(CancelRejection::AfterCheckIn)
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    let check_in = booking.check_in_date.ok_or(CancelRejection::MissingCheckIn)?;

    let remaining = hours_until_check_in(check_in, now);
    if remaining < min_hours_before_check_in {
        return Err(CancelRejection::OutsideWindow {
            required: min_hours_before_check_in,
            remaining,
        });
    }

    Ok(())
}

pub fn apply_cancellation(booking: &mut Booking) {
    booking.booking_status = BookingStatus::Cancelled;
    refund_if_paid(booking);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_booking(status: BookingStatus, payment: PaymentStatus, check_in: Option<&str>) -> Booking {
        let now = dt("2025-06-01 09:00");
        Booking {
            id: "bk-1".to_string(),
            user_id: "guest-1".to_string(),
            hotel_id: "hotel-1".to_string(),
            room_id: "room-1".to_string(),
            booking_status: status,
            payment_status: payment,
            check_in_date: check_in.map(date),
            check_out_date: check_in.map(|d| date(d) + chrono::Duration::days(1)),
            total_guests: 2,
            total_amount: 1000.0,
            transaction_id: Some("TXN1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_checked_out_is_stored_as_completed() {
        let mut booking = make_booking(BookingStatus::CheckedIn, PaymentStatus::Paid, Some("2025-06-10"));
        let change = apply_status_change(&mut booking, BookingStatus::CheckedOut);

        assert_eq!(booking.booking_status, BookingStatus::Completed);
        assert_eq!(change.applied, BookingStatus::Completed);
        assert_eq!(change.previous, BookingStatus::CheckedIn);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_staff_cancel_refunds_paid_only() {
        let mut paid = make_booking(BookingStatus::Confirmed, PaymentStatus::Paid, Some("2025-06-10"));
        apply_status_change(&mut paid, BookingStatus::Cancelled);
        assert_eq!(paid.payment_status, PaymentStatus::Refunded);

        for payment in [PaymentStatus::Pending, PaymentStatus::Failed] {
            let mut b = make_booking(BookingStatus::Confirmed, payment, Some("2025-06-10"));
            apply_status_change(&mut b, BookingStatus::Cancelled);
            assert_eq!(b.booking_status, BookingStatus::Cancelled);
            assert_eq!(b.payment_status, payment);
        }
    }

    #[test]
    fn test_staff_cancel_ignores_window_and_status() {
        // Already checked in and past the window; staff may still cancel.
        let mut booking = make_booking(BookingStatus::CheckedIn, PaymentStatus::Pending, Some("2025-06-01"));
        let change = apply_status_change(&mut booking, BookingStatus::Cancelled);
        assert_eq!(change.applied, BookingStatus::Cancelled);
    }

    #[test]
    fn test_only_pending_to_confirmed_is_a_confirmation() {
        let mut pending = make_booking(BookingStatus::Pending, PaymentStatus::Pending, Some("2025-06-10"));
        assert!(apply_status_change(&mut pending, BookingStatus::Confirmed).is_confirmation());

        let mut confirmed = make_booking(BookingStatus::Confirmed, PaymentStatus::Pending, Some("2025-06-10"));
        assert!(!apply_status_change(&mut confirmed, BookingStatus::Confirmed).is_confirmation());

        let mut checked_in = make_booking(BookingStatus::Pending, PaymentStatus::Pending, Some("2025-06-10"));
        assert!(!apply_status_change(&mut checked_in, BookingStatus::CheckedIn).is_confirmation());
    }

    #[test]
    fn test_room_with_active_booking_is_booked() {
        assert_eq!(
            derive_room_status(RoomStatus::Available, &[BookingStatus::Confirmed]),
            RoomStatus::Booked
        );
        assert_eq!(
            derive_room_status(
                RoomStatus::Available,
                &[BookingStatus::Cancelled, BookingStatus::CheckedOut]
            ),
            RoomStatus::Booked
        );
    }

    #[test]
    fn test_room_frees_up_when_bookings_end() {
        assert_eq!(derive_room_status(RoomStatus::Booked, &[]), RoomStatus::Available);
        assert_eq!(
            derive_room_status(
                RoomStatus::Booked,
                &[BookingStatus::Cancelled, BookingStatus::Completed]
            ),
            RoomStatus::Available
        );
    }

    #[test]
    fn test_maintenance_is_sticky() {
        assert_eq!(
            derive_room_status(RoomStatus::Maintenance, &[BookingStatus::Confirmed]),
            RoomStatus::Maintenance
        );
        assert_eq!(derive_room_status(RoomStatus::Maintenance, &[]), RoomStatus::Maintenance);
    }

    #[test]
    fn test_hours_until_check_in_truncates() {
        let check_in = date("2025-06-10");
        assert_eq!(hours_until_check_in(check_in, dt("2025-06-10 13:30")), 0);
        assert_eq!(hours_until_check_in(check_in, dt("2025-06-10 12:59")), 1);
        assert_eq!(hours_until_check_in(check_in, dt("2025-06-09 14:00")), 24);
        assert_eq!(hours_until_check_in(check_in, dt("2025-06-10 16:30")), -2);
    }

    #[test]
    fn test_cancel_same_day_after_1pm_rejected() {
        let booking = make_booking(BookingStatus::Confirmed, PaymentStatus::Paid, Some("2025-06-10"));
        let result = check_cancellation(&booking, "guest-1", dt("2025-06-10 13:15"), 1);
        assert_eq!(
            result,
            Err(CancelRejection::OutsideWindow {
                required: 1,
                remaining: 0
            })
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Current time remaining: 0 hours"));
    }

    #[test]
    fn test_cancel_within_window_allowed() {
        let booking = make_booking(BookingStatus::Pending, PaymentStatus::Pending, Some("2025-06-10"));
        assert!(check_cancellation(&booking, "guest-1", dt("2025-06-10 12:00"), 1).is_ok());
        assert!(check_cancellation(&booking, "guest-1", dt("2025-06-07 09:00"), 1).is_ok());
    }

    #[test]
    fn test_cancel_respects_configured_threshold() {
        let booking = make_booking(BookingStatus::Confirmed, PaymentStatus::Pending, Some("2025-06-10"));
        let result = check_cancellation(&booking, "guest-1", dt("2025-06-09 20:00"), 24);
        assert_eq!(
            result,
            Err(CancelRejection::OutsideWindow {
                required: 24,
                remaining: 18
            })
        );
    }

    #[test]
    fn test_cancel_after_check_in_always_rejected() {
        for status in [BookingStatus::CheckedIn, BookingStatus::CheckedOut, BookingStatus::Completed] {
            let booking = make_booking(status, PaymentStatus::Paid, Some("2030-01-01"));
            assert_eq!(
                check_cancellation(&booking, "guest-1", dt("2025-06-01 09:00"), 1),
                Err(CancelRejection::AfterCheckIn)
            );
        }
    }

    #[test]
    fn test_cancel_checks_run_in_order() {
        let cancelled = make_booking(BookingStatus::Cancelled, PaymentStatus::Refunded, None);
        assert_eq!(
            check_cancellation(&cancelled, "someone-else", dt("2025-06-01 09:00"), 1),
            Err(CancelRejection::NotOwner)
        );
        assert_eq!(
            check_cancellation(&cancelled, "guest-1", dt("2025-06-01 09:00"), 1),
            Err(CancelRejection::AlreadyCancelled)
        );

        let undated = make_booking(BookingStatus::Pending, PaymentStatus::Pending, None);
        assert_eq!(
            check_cancellation(&undated, "guest-1", dt("2025-06-01 09:00"), 1),
            Err(CancelRejection::MissingCheckIn)
        );
    }

    #[test]
    fn test_cancel_rejections_map_to_http_errors() {
        assert!(matches!(AppError::from(CancelRejection::NotOwner), AppError::Forbidden(_)));
        assert!(matches!(
            AppError::from(CancelRejection::AlreadyCancelled),
            AppError::InvalidState(_)
        ));
    }

    #[test]
    fn test_apply_cancellation_refunds() {
        let mut booking = make_booking(BookingStatus::Confirmed, PaymentStatus::Paid, Some("2025-06-10"));
        apply_cancellation(&mut booking);
        assert_eq!(booking.booking_status, BookingStatus::Cancelled);
        assert_eq!(booking.payment_status, PaymentStatus::Refunded);
    }
}
