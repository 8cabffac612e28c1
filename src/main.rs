use std::process::ExitCode;

use hotel_booking::{
    AppState,
    config::{AppConfig, Env, StoreBackend},
    create_router,
    store::Store,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects the selected store backend, and
/// serves the API until ctrl-c.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Logging is not up yet, so a config failure goes straight to stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("FATAL: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.env);
    tracing::info!("Application starting in {:?} mode", config.env);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server terminated");
            ExitCode::FAILURE
        }
    }
}

/// Pretty output for humans locally, JSON for log aggregation in production.
/// `RUST_LOG` overrides the default filter.
fn init_tracing(env: Env) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hotel_booking=debug,tower_http=info,axum=trace".into());

    match env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }
}

async fn connect_store(config: &AppConfig) -> Result<Store, Box<dyn std::error::Error>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(config.request_timeout)
                .connect(&config.db_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Postgres connected, migrations applied");
            Ok(Store::postgres(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            Ok(Store::in_memory())
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect_store(&config).await?;
    let listen_addr = config.listen_addr.clone();
    let app = create_router(AppState::new(store, config));

    let listener = TcpListener::bind(&listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{listen_addr}/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server keeps running until killed.
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
