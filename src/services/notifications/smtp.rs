use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{BookingCancellationEmail, BookingConfirmationEmail, EmailNotifier};

pub struct SmtpEmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    app_name: String,
}

impl SmtpEmailNotifier {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: String,
        app_name: String,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP relay: {host}"))?
            .port(port);
        if !username.is_empty() {
            builder = builder.credentials(Credentials::new(username, password));
        }
        let transport = builder.build();

        Ok(Self {
            transport,
            from,
            app_name,
        })
    }

    async fn send_html(&self, to: &str, subject: String, html: String) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("invalid MAIL_FROM address")?)
            .to(to.parse().with_context(|| format!("invalid recipient: {to}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }
}

#[async_trait]
impl EmailNotifier for SmtpEmailNotifier {
    async fn send_booking_confirmation(&self, email: &BookingConfirmationEmail) -> anyhow::Result<()> {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
<h2>Booking confirmed</h2>
<p>Dear {guest},</p>
<p>Your stay at <strong>{hotel}</strong> is confirmed.</p>
<table>
<tr><td>Room</td><td>{room_number} ({room_type})</td></tr>
<tr><td>Check-in</td><td>{check_in} (2:00 PM)</td></tr>
<tr><td>Check-out</td><td>{check_out}</td></tr>
<tr><td>Guests</td><td>{guests}</td></tr>
<tr><td>Amount</td><td>{amount:.2}</td></tr>
<tr><td>Transaction</td><td>{txn}</td></tr>
</table>
<p>{app}</p>
</div>"#,
            guest = email.guest_name,
            hotel = email.hotel_name,
            room_number = email.room_number,
            room_type = email.room_type,
            check_in = email.check_in,
            check_out = email.check_out,
            guests = email.guests,
            amount = email.amount,
            txn = email.transaction_id,
            app = self.app_name,
        );
        self.send_html(&email.to, format!("Booking Confirmed - {}", self.app_name), html)
            .await
    }

    async fn send_booking_cancellation(&self, email: &BookingCancellationEmail) -> anyhow::Result<()> {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
<h2>Booking cancelled</h2>
<p>Dear {guest},</p>
<p>Your booking at <strong>{hotel}</strong> for {check_in} to {check_out} has been cancelled.</p>
<p>Transaction {txn}, amount {amount:.2}. Paid bookings are refunded to the original payment method.</p>
<p>{app}</p>
</div>"#,
            guest = email.guest_name,
            hotel = email.hotel_name,
            check_in = email.check_in,
            check_out = email.check_out,
            txn = email.transaction_id,
            amount = email.amount,
            app = self.app_name,
        );
        self.send_html(&email.to, format!("Booking Cancelled - {}", self.app_name), html)
            .await
    }
}
