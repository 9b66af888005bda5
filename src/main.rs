use reputation_dashboard::{AppState, Config, DashboardSource, FileSource, HttpSource, router};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let source: Box<dyn DashboardSource> = match &config.data_url {
        Some(url) => {
            info!("reading dashboard data from {url}");
            Box::new(HttpSource::new(url.as_str(), config.fetch_timeout, config.retry)?)
        }
        None => {
            info!("reading dashboard data from {}", config.data_dir.display());
            Box::new(FileSource::new(config.data_dir.clone()))
        }
    };

    let state = AppState::new(source, config.data_dir.clone());

    // Started in the background: the data URL may point back at this server.
    let controller = state.controller.clone();
    tokio::spawn(async move {
        if let Err(err) = controller.start().await {
            warn!("initial dashboard load failed: {err}");
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let terminate = signal(SignalKind::terminate());
        let interrupt = signal(SignalKind::interrupt());
        if let (Ok(mut sigterm), Ok(mut sigint)) = (terminate, interrupt) {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
            return;
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}
