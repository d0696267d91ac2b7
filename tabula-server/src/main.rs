use std::path::Path;

use tabula_core::init_tracing_with;
use tabula_data_postgrest::ConnectionProvider;
use tabula_server::config::{credentials, load_or_env};
use tabula_server::{app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, load_error) = load_or_env(Path::new("."), "dev");
    let settings = ServerConfig::from_config(&config)?;
    init_tracing_with(settings.log_format);
    if let Some(err) = &load_error {
        tracing::warn!(error = %err, "configuration files not loaded, using environment only");
    }

    let options = settings.client_options();
    let provider = match credentials(&config)
        .and_then(|creds| ConnectionProvider::from_credentials(&creds, &options))
    {
        Ok(provider) => provider,
        Err(err) => {
            tracing::error!(error = %err, "cannot connect to the backend");
            std::process::exit(1);
        }
    };

    let state = AppState::new(provider.client().clone());
    let router = app(state, &settings.api_prefix);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        environment = %settings.environment,
        profile = config.profile(),
        "Server is running"
    );
    tabula_core::http::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
