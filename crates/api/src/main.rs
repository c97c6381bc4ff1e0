//! issuesync - keeps a ticket tracker in step with code forge issues
//!
//! Main entry point: loads configuration, optionally reconciles once, then
//! serves webhooks until interrupted.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use issuesync_app::utils::logging;
use issuesync_app::{AppContext, Cli};
use issuesync_infra::config;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = config::load(cli.config.clone()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    logging::init(&config.log_level, config.log_format).context("failed to initialise logging")?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env loaded"),
    }
    info!(version = env!("CARGO_PKG_VERSION"), "issuesync starting");

    config.validate().context("verifying configuration")?;

    let ctx = AppContext::new(config).await.context("Error creating server")?;

    if ctx.config.do_presync {
        ctx.presync().await;
    } else {
        info!("bypass presync");
    }

    let mut scheduler = ctx.start_scheduler().await.context("starting reconcile scheduler")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.listen_port));
    let listener =
        TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening for webhooks");

    axum::serve(listener, ctx.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server failed")?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "reconcile scheduler did not stop cleanly");
        }
    }
    info!("issuesync stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
