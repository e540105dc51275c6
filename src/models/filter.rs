use chrono::NaiveDate;
use serde::Deserialize;

use super::{BookingStatus, HotelStatus, PaymentStatus, RoomStatus};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Criteria for listing bookings. Every field is optional and the set
/// ones are combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    /// Substring match on transaction id, guest name or email, hotel name
    /// and room number.
    pub search: Option<String>,
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub hotel_id: Option<String>,
    pub user_id: Option<String>,
    pub check_in_start: Option<NaiveDate>,
    pub check_in_end: Option<NaiveDate>,
    /// Sort on check-in date. Unsorted results fall back to newest first.
    pub sort: Option<SortDirection>,
    /// Unset returns every match.
    pub limit: Option<i64>,
}

impl BookingFilter {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            sort: Some(SortDirection::Desc),
            ..Self::default()
        }
    }

    pub fn search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn status(mut self, status: Option<BookingStatus>) -> Self {
        self.booking_status = status;
        self
    }
}

/// Criteria for listing hotels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelFilter {
    /// Substring match on name, description, city and address.
    pub search: Option<String>,
    pub status: Option<HotelStatus>,
    /// Exact city, case-insensitive.
    pub city: Option<String>,
    /// Sort on name. Defaults to ascending.
    pub sort: Option<SortDirection>,
}

/// Criteria for listing a hotel's rooms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomFilter {
    /// Substring match on room number.
    pub search: Option<String>,
    pub status: Option<RoomStatus>,
    /// Exact room type, case-insensitive.
    pub room_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Sort on price. Unsorted results are ordered by room number.
    pub sort: Option<SortDirection>,
}
