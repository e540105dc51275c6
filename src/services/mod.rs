pub mod bookings;
pub mod catalog;
pub mod lifecycle;
pub mod notifications;
