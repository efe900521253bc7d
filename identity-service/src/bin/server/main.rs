use std::sync::Arc;
use std::time::Duration;

use auth::TokenConfig;
use auth::TokenIssuer;
use identity_service::config::Config;
use identity_service::domain::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::google::GoogleTokenVerifier;
use identity_service::outbound::repositories::PostgresIdentityRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    // A missing JWT secret fails here, before the service accepts traffic
    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        jwt_audience = %config.jwt.audience,
        jwt_expiration_minutes = config.jwt.expiration_minutes,
        google_configured = config.google.client_id.is_some(),
        "Configuration loaded"
    );

    if config.google.client_id.is_none() {
        tracing::warn!("Google client id not configured; Google sign-in will reject all tokens");
    }

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let token_issuer = Arc::new(TokenIssuer::new(TokenConfig {
        secret: config.jwt.secret.clone(),
        issuer: config.jwt.issuer.clone(),
        audience: config.jwt.audience.clone(),
        lifetime_minutes: config.jwt.expiration_minutes,
    }));

    // Bounded timeout so an unresponsive provider cannot stall logins
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let google_verifier = Arc::new(GoogleTokenVerifier::new(
        http_client,
        config.google.client_id.clone(),
    ));

    let identity_repository = Arc::new(PostgresIdentityRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        identity_repository,
        google_verifier,
        Arc::clone(&token_issuer),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, token_issuer);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
