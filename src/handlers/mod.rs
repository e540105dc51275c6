pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod payments;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/users", post(catalog::register_user))
        .route("/api/users/:id", get(catalog::get_user))
        .route("/api/hotels", get(catalog::get_hotels))
        .route("/api/hotels/:id", get(catalog::get_hotel))
        .route("/api/hotels/:id/rooms", get(catalog::get_rooms))
        .route("/api/rooms/:id", get(catalog::get_room))
        .route("/api/bookings", post(bookings::book_room))
        .route(
            "/api/bookings/user/:user_id",
            get(bookings::get_user_bookings),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route(
            "/api/payments/user/:user_id",
            get(payments::get_user_transactions),
        )
        .route(
            "/api/payments/:booking_id/verify",
            post(payments::verify_payment),
        )
        .route(
            "/api/payments/:booking_id/failed",
            post(payments::payment_failed),
        )
        .route("/api/admin/hotels", post(admin::create_hotel))
        .route(
            "/api/admin/hotels/:id",
            put(admin::update_hotel).delete(admin::delete_hotel),
        )
        .route("/api/admin/hotels/:id/rooms", post(admin::create_room))
        .route(
            "/api/admin/hotels/:id/guests",
            get(admin::get_hotel_guests),
        )
        .route(
            "/api/admin/rooms/:id",
            put(admin::update_room).delete(admin::delete_room),
        )
        .route(
            "/api/admin/rooms/:id/status",
            patch(admin::set_room_status),
        )
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            patch(admin::update_booking_status),
        )
        .route("/api/admin/bookings/:id", delete(admin::delete_booking))
        .with_state(state)
}
