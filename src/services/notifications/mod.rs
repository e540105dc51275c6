pub mod console;
pub mod smtp;
pub mod whatsapp;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::BookingDetails;
use crate::state::AppState;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send_booking_confirmation(&self, email: &BookingConfirmationEmail) -> anyhow::Result<()>;
    async fn send_booking_cancellation(&self, email: &BookingCancellationEmail) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmationEmail {
    pub to: String,
    pub guest_name: String,
    pub hotel_name: String,
    pub room_number: String,
    pub room_type: String,
    pub check_in: String,
    pub check_out: String,
    pub transaction_id: String,
    pub amount: f64,
    pub guests: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingCancellationEmail {
    pub to: String,
    pub guest_name: String,
    pub hotel_name: String,
    pub transaction_id: String,
    pub check_in: String,
    pub check_out: String,
    pub amount: f64,
}

pub fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_default()
}

/// Normalizes a stored contact number to E.164 for the WhatsApp bridge.
/// Returns `None` when there are no digits to send to.
pub fn format_phone_number(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let national_len = 10;
    let formatted = if digits.len() == national_len {
        format!("+{country_code}{digits}")
    } else if digits.len() == national_len + 1 && digits.starts_with('0') {
        format!("+{country_code}{}", &digits[1..])
    } else {
        format!("+{digits}")
    };
    Some(formatted)
}

pub fn confirmation_message(details: &BookingDetails, app_name: &str) -> String {
    let booking = &details.booking;
    let mut message = format!(
        "*{app_name} Booking Confirmation*\n\nDear {},\n\nYour booking has been confirmed.\n\n*Hotel:* {}\n",
        details.guest_name, details.hotel_name
    );
    if let Some(address) = details.hotel_address.as_deref().filter(|a| !a.is_empty()) {
        message.push_str(&format!("*Address:* {address}\n"));
    }
    if let Some(contact) = details.hotel_contact.as_deref().filter(|c| !c.is_empty()) {
        message.push_str(&format!("*Contact:* {contact}\n"));
    }
    message.push_str(&format!(
        "\n*Room:* {} ({})\n*Guests:* {}\n*Amount:* {:.2}\n\n*Check-in:* {} (2:00 PM)\n*Check-out:* {}\n*Transaction:* {}\n",
        details.room_number,
        details.room_type,
        booking.total_guests,
        booking.total_amount,
        display_date(booking.check_in_date),
        display_date(booking.check_out_date),
        booking.transaction_id.as_deref().unwrap_or("-"),
    ));
    message
}

impl BookingConfirmationEmail {
    pub fn from_details(details: &BookingDetails, to: &str) -> Self {
        let booking = &details.booking;
        Self {
            to: to.to_string(),
            guest_name: details.guest_name.clone(),
            hotel_name: details.hotel_name.clone(),
            room_number: details.room_number.clone(),
            room_type: details.room_type.clone(),
            check_in: display_date(booking.check_in_date),
            check_out: display_date(booking.check_out_date),
            transaction_id: booking.transaction_id.clone().unwrap_or_default(),
            amount: booking.total_amount,
            guests: booking.total_guests,
        }
    }
}

impl BookingCancellationEmail {
    pub fn from_details(details: &BookingDetails, to: &str) -> Self {
        let booking = &details.booking;
        Self {
            to: to.to_string(),
            guest_name: details.guest_name.clone(),
            hotel_name: details.hotel_name.clone(),
            transaction_id: booking.transaction_id.clone().unwrap_or_default(),
            check_in: display_date(booking.check_in_date),
            check_out: display_date(booking.check_out_date),
            amount: booking.total_amount,
        }
    }
}

fn guest_email(details: &BookingDetails) -> Option<&str> {
    details
        .guest_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
}

/// Best-effort: delivery errors are logged, never returned.
pub async fn notify_confirmed(state: &AppState, details: &BookingDetails) {
    let booking_id = details.booking.id.as_str();

    match details
        .guest_phone
        .as_deref()
        .and_then(|p| format_phone_number(p, &state.config.whatsapp_country_code))
    {
        Some(phone) => {
            let body = confirmation_message(details, &state.config.app_name);
            if let Err(e) = state.messaging.send_message(&phone, &body).await {
                tracing::warn!(booking_id = %booking_id, error = %e, "failed to send WhatsApp confirmation");
            }
        }
        None => tracing::debug!(booking_id = %booking_id, "guest has no phone number, skipping WhatsApp"),
    }

    if let Some(to) = guest_email(details) {
        let email = BookingConfirmationEmail::from_details(details, to);
        if let Err(e) = state.email.send_booking_confirmation(&email).await {
            tracing::warn!(booking_id = %booking_id, error = %e, "failed to send confirmation email");
        }
    }
}

/// Best-effort: delivery errors are logged, never returned.
pub async fn notify_cancelled(state: &AppState, details: &BookingDetails) {
    let Some(to) = guest_email(details) else {
        tracing::debug!(booking_id = %details.booking.id, "guest has no email, skipping cancellation notice");
        return;
    };

    let email = BookingCancellationEmail::from_details(details, to);
    if let Err(e) = state.email.send_booking_cancellation(&email).await {
        tracing::warn!(booking_id = %details.booking.id, error = %e, "failed to send cancellation email");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, BookingStatus, PaymentStatus};

    fn details() -> BookingDetails {
        let now = chrono::Utc::now().naive_utc();
        BookingDetails {
            booking: Booking {
                id: "bk-1".to_string(),
                user_id: "u-1".to_string(),
                hotel_id: "h-1".to_string(),
                room_id: "r-1".to_string(),
                booking_status: BookingStatus::Confirmed,
                payment_status: PaymentStatus::Paid,
                check_in_date: NaiveDate::from_ymd_opt(2025, 6, 10),
                check_out_date: NaiveDate::from_ymd_opt(2025, 6, 12),
                total_guests: 2,
                total_amount: 2500.0,
                transaction_id: Some("TXN42".to_string()),
                created_at: now,
                updated_at: now,
            },
            guest_name: "Asha Rao".to_string(),
            guest_email: Some("asha@example.com".to_string()),
            guest_phone: Some("98765 43210".to_string()),
            hotel_name: "Lakeview Inn".to_string(),
            hotel_address: Some("1 Lake Rd".to_string()),
            hotel_contact: None,
            room_number: "101".to_string(),
            room_type: "Deluxe".to_string(),
        }
    }

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("98765 43210", "91").as_deref(), Some("+919876543210"));
        assert_eq!(format_phone_number("09876543210", "91").as_deref(), Some("+919876543210"));
        assert_eq!(format_phone_number("+91 98765-43210", "91").as_deref(), Some("+919876543210"));
        assert_eq!(format_phone_number("+1 (555) 123-4567", "91").as_deref(), Some("+15551234567"));
        assert_eq!(format_phone_number("n/a", "91"), None);
    }

    #[test]
    fn test_confirmation_message_contents() {
        let text = confirmation_message(&details(), "StayWell");
        assert!(text.contains("StayWell Booking Confirmation"));
        assert!(text.contains("Dear Asha Rao"));
        assert!(text.contains("*Address:* 1 Lake Rd"));
        assert!(!text.contains("*Contact:*"));
        assert!(text.contains("101 (Deluxe)"));
        assert!(text.contains("2500.00"));
        assert!(text.contains("10-06-2025 (2:00 PM)"));
        assert!(text.contains("12-06-2025"));
    }

    #[test]
    fn test_emails_from_details() {
        let d = details();
        let confirmation = BookingConfirmationEmail::from_details(&d, "asha@example.com");
        assert_eq!(confirmation.check_in, "10-06-2025");
        assert_eq!(confirmation.transaction_id, "TXN42");
        assert_eq!(confirmation.guests, 2);

        let cancellation = BookingCancellationEmail::from_details(&d, "asha@example.com");
        assert_eq!(cancellation.check_out, "12-06-2025");
        assert_eq!(cancellation.amount, 2500.0);
    }
}
