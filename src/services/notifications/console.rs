use async_trait::async_trait;

use super::{BookingCancellationEmail, BookingConfirmationEmail, EmailNotifier, MessagingProvider};

/// Logs notifications instead of delivering them. Used when no SMTP host
/// or WhatsApp bridge is configured.
pub struct ConsoleNotifier;

#[async_trait]
impl MessagingProvider for ConsoleNotifier {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, body = %body, "WhatsApp message (console)");
        Ok(())
    }
}

#[async_trait]
impl EmailNotifier for ConsoleNotifier {
    async fn send_booking_confirmation(&self, email: &BookingConfirmationEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            hotel = %email.hotel_name,
            room = %email.room_number,
            check_in = %email.check_in,
            transaction_id = %email.transaction_id,
            "booking confirmation email (console)"
        );
        Ok(())
    }

    async fn send_booking_cancellation(&self, email: &BookingCancellationEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            hotel = %email.hotel_name,
            transaction_id = %email.transaction_id,
            "booking cancellation email (console)"
        );
        Ok(())
    }
}
