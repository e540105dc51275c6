use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hotelbook::config::AppConfig;
use hotelbook::db;
use hotelbook::handlers;
use hotelbook::services::notifications::console::ConsoleNotifier;
use hotelbook::services::notifications::smtp::SmtpEmailNotifier;
use hotelbook::services::notifications::whatsapp::WhatsAppBridgeProvider;
use hotelbook::services::notifications::{EmailNotifier, MessagingProvider};
use hotelbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        config.cancellation_hours_before_checkin >= 0,
        "CANCELLATION_HOURS_BEFORE_CHECKIN must not be negative"
    );

    let conn = db::init_db(&config.database_url)?;

    let email: Box<dyn EmailNotifier> = if config.smtp_host.is_empty() {
        tracing::info!("SMTP_HOST not set, logging emails to console");
        Box::new(ConsoleNotifier)
    } else {
        anyhow::ensure!(!config.mail_from.is_empty(), "MAIL_FROM must be set when SMTP_HOST is set");
        tracing::info!("using SMTP email (host: {})", config.smtp_host);
        Box::new(SmtpEmailNotifier::new(
            &config.smtp_host,
            config.smtp_port,
            config.smtp_username.clone(),
            config.smtp_password.clone(),
            config.mail_from.clone(),
            config.app_name.clone(),
        )?)
    };

    let messaging: Box<dyn MessagingProvider> = if config.whatsapp_server_url.is_empty() {
        tracing::info!("WHATSAPP_SERVER_URL not set, logging WhatsApp messages to console");
        Box::new(ConsoleNotifier)
    } else {
        tracing::info!("using WhatsApp bridge (url: {})", config.whatsapp_server_url);
        Box::new(WhatsAppBridgeProvider::new(config.whatsapp_server_url.clone()))
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        email,
        messaging,
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
