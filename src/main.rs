use {
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
    topup_sync::{
        AppState,
        adapters::{api, cryptopay::CryptoPayClient},
        config::Config,
        domain::notify::LogNotifier,
        infra::postgres::PgStore,
        services::{PaymentContext, sweeper::run_sweeper, topup::TopUpService},
    },
    tracing_subscriber::EnvFilter,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let provider = CryptoPayClient::new(
        &config.crypto_pay_base_url,
        &config.crypto_pay_token,
        config.provider_timeout,
    )
    .expect("failed to build provider client")
    .with_paid_button(config.paid_button.clone());

    let ctx = PaymentContext::new(Arc::new(PgStore::new(pool)), Arc::new(provider));
    let state = AppState {
        topups: Arc::new(TopUpService::new(ctx.clone(), config.invoice_expires_in_secs)),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(run_sweeper(
        ctx,
        Arc::new(LogNotifier),
        config.sweep_interval,
        shutdown_rx,
    ));

    // Leave headroom over the provider timeout for the store round-trips.
    let app = api::router(state, config.provider_timeout + Duration::from_secs(5));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    shutdown_tx.send(true).ok();
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "sweeper task panicked");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
