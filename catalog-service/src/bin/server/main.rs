use std::sync::Arc;

use auth::JwtHandler;
use catalog_service::config::Config;
use catalog_service::domain::identity::ports::AuthServicePort;
use catalog_service::domain::identity::ports::CredentialStore;
use catalog_service::domain::identity::ports::UserServicePort;
use catalog_service::domain::identity::service::AuthService;
use catalog_service::domain::identity::token::TokenProvider;
use catalog_service::domain::identity::users::UserService;
use catalog_service::inbound::http::router::create_router;
use catalog_service::outbound::repositories::InMemoryCredentialStore;
use catalog_service::outbound::repositories::PostgresCredentialStore;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "catalog-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_expiration_hours = config.jwt.expiration_hours,
        persistence = if config.database.is_some() { "postgresql" } else { "memory" },
        "Configuration loaded"
    );

    let credential_store: Arc<dyn CredentialStore> = match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            Arc::new(PostgresCredentialStore::new(pg_pool))
        }
        None => {
            tracing::warn!("No database configured; users are kept in memory");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let token_provider = Arc::new(TokenProvider::new(
        JwtHandler::new(config.jwt.secret.as_bytes())?,
        Duration::hours(config.jwt.expiration_hours),
    ));

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        Arc::clone(&credential_store),
        Arc::clone(&token_provider),
    ));
    let user_service: Arc<dyn UserServicePort> =
        Arc::new(UserService::new(Arc::clone(&credential_store)));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, user_service, token_provider);

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
