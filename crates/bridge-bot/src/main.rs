//! Consciousness bridge entry point.
//!
//! Binary name: `consciousness-bridge`
//!
//! Resolves configuration, probes the generation providers, then runs the
//! bot until Ctrl+C or SIGTERM.

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use bridge_core::bot::Bot;
use bridge_core::bot::settings::BotSettings;
use bridge_core::responder::Responder;
use bridge_infra::config::{apply_env_secrets, finalize, load_bot_config};
use bridge_infra::irc::IrcTransport;
use bridge_infra::llm::build_fallback_chain;
use bridge_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.otel, filter_for_verbosity(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let mut config = load_bot_config(cli.config.as_deref()).await;
    cli.apply(&mut config);
    apply_env_secrets(&mut config);
    finalize(&mut config).context("invalid configuration")?;

    if !cli.quiet {
        println!(
            "  {} Consciousness bridge connecting to {} as {}",
            console::style("🧠").bold(),
            console::style(config.endpoint()).cyan(),
            console::style(&config.nickname).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let chain = build_fallback_chain(&config).await;
    let settings = BotSettings::from_config(&config);
    let identity = config.identity();
    let transport = IrcTransport::from_config(&mut config);

    let mut bot = Bot::new(
        transport,
        identity,
        Responder::new(Arc::new(chain)),
        settings,
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown requested");
        trigger.cancel();
    });

    bot.run(shutdown).await;

    if !cli.quiet {
        println!("\n  Bridge stopped.");
    }
    shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
