pub mod booking;
pub mod filter;
pub mod hotel;
pub mod room;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingStatus, PaymentStatus, Transaction};
pub use filter::{BookingFilter, HotelFilter, RoomFilter, SortDirection};
pub use hotel::{Hotel, HotelStatus};
pub use room::{Room, RoomStatus};
pub use user::User;
