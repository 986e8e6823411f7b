use std::process;

use permiso::{
    config,
    infra::{db::PostgresRepositories, error::InfraError, http, telemetry},
};
use sqlx::postgres::PgPool;
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), InfraError> {
    let pool = connect_database(&settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    let state = http::AppState::with_postgres(PostgresRepositories::new(pool));
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.listen_addr).await?;
    info!(
        target = "permiso::server",
        addr = %settings.server.listen_addr,
        "Listening for permit API requests"
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = shutdown_rx.await;
        },
    );
    let server = tokio::spawn(async move { server.await });

    shutdown_signal().await;
    info!(target = "permiso::server", "Shutdown signal received, draining connections");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(Ok(result)) => result.map_err(InfraError::Io)?,
        Ok(Err(join_error)) => {
            return Err(InfraError::configuration(format!(
                "server task failed: {join_error}"
            )));
        }
        Err(_) => {
            warn!(
                target = "permiso::server",
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out, aborting remaining connections"
            );
        }
    }

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), InfraError> {
    let pool = connect_database(&settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    info!(target = "permiso::migrate", "Migrations applied");
    Ok(())
}

async fn connect_database(settings: &config::Settings) -> Result<PgPool, InfraError> {
    let url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    PostgresRepositories::connect(
        url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| InfraError::database(err.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
