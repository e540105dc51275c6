use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Minimum whole hours between now and the 14:00 check-in for a guest
    /// to cancel on their own.
    pub cancellation_hours_before_checkin: i64,
    pub whatsapp_server_url: String,
    pub whatsapp_country_code: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
    pub app_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "hotelbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            cancellation_hours_before_checkin: env::var("CANCELLATION_HOURS_BEFORE_CHECKIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            whatsapp_server_url: env::var("WHATSAPP_SERVER_URL").unwrap_or_default(),
            whatsapp_country_code: env::var("WHATSAPP_COUNTRY_CODE")
                .unwrap_or_else(|_| "91".to_string()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or_default(),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "StayWell".to_string()),
        }
    }
}
