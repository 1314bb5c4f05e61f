//! `smsrelay` - forwards received SMS to email.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use smsrelay::{AppState, Config, init_tracing};
use smsrelay_core::{ForwardService, SmtpMailer, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config.log_level, config.json_logs)?;
    config.validate()?;
    let database = config.database_path()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.bind,
        database = %database.display(),
        "starting smsrelay"
    );

    if config.check {
        info!("configuration is valid");
        return Ok(());
    }

    if let Some(parent) = database.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = Store::open(&database.to_string_lossy())
        .await
        .with_context(|| format!("opening database {}", database.display()))?;

    let mailer = SmtpMailer::new(config.smtp_options(), config.retry_policy());
    let service = ForwardService::new(store.clone(), Arc::new(mailer));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(address = %listener.local_addr()?, "listening");

    smsrelay::serve(listener, AppState::new(service), shutdown_signal()).await?;

    store.close().await;
    info!("smsrelay stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
