//! Ping Dispatcher binary
//!
//! Reads configuration from the environment (and `.env`), dispatches a ping
//! and tracks it. Ctrl+C or SIGTERM stops tracking early.

use dispatcher::{AppContext, Config};
use tracing::{error, info};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    info!("Starting Hyperbridge ping dispatcher");

    let config = Config::load()?;
    info!(
        source_rpc = %config.source.rpc_url,
        dest_rpc = %config.dest.rpc_url,
        hyperbridge = %config.hyperbridge_url,
        self_relay = config.self_relay,
        "Configuration loaded"
    );

    let ctx = AppContext::new(config)?;

    tokio::select! {
        result = dispatcher::run(&ctx) => {
            let outcome = result?;
            info!(outcome = ?outcome, "Ping dispatcher finished");
        }
        _ = wait_for_shutdown_signal() => {
            info!("Ping dispatcher stopped before completion");
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,ping_dispatcher=debug,dispatcher=debug,hyperbridge_rs=debug")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
