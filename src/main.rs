use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{Result, eyre::Context};
use portico::{
    adapters::{HealthChecker, HttpClientAdapter, TcpProbeAdapter, build_router},
    config::{GatewayConfigValidator, load_config},
    core::Registry,
    tracing_setup,
    utils::graceful_shutdown::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.yaml")]
    config: String,

    /// Human-readable console logs instead of JSON
    #[clap(long)]
    pretty_logs: bool,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let pretty_logs = args.pretty_logs;

    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config),
    };

    if command == "validate" {
        return validate_config_command(&config_path);
    }

    if pretty_logs {
        tracing_setup::init_console_tracing().context("Failed to initialize tracing")?;
    } else {
        tracing_setup::init_tracing().context("Failed to initialize tracing")?;
    }

    tracing::info!("Loading configuration from {config_path}");

    let config =
        load_config(&config_path).with_context(|| format!("Failed to load {config_path}"))?;

    GatewayConfigValidator::validate(&config).context("Configuration validation failed")?;

    let registry = Arc::new(Registry::from_config(&config).context("Failed to build registry")?);

    tracing::info!(
        services = registry.len(),
        listen_addr = %config.listen_addr,
        "registry constructed"
    );

    let client = Arc::new(HttpClientAdapter::new());
    let router = build_router(&registry, client).context("Failed to build router")?;

    let graceful_shutdown = Arc::new(GracefulShutdown::new());

    {
        let shutdown = Arc::clone(&graceful_shutdown);
        tokio::spawn(async move {
            if let Err(e) = shutdown.run_signal_handler().await {
                tracing::error!("Signal handler failed: {}", e);
            }
        });
    }

    if config.health_check.enabled {
        let checker = HealthChecker::new(
            Arc::clone(&registry),
            Arc::new(TcpProbeAdapter::new()),
            config.health_check.clone(),
            graceful_shutdown.shutdown_token(),
        );
        tokio::spawn(async move {
            if let Err(e) = checker.run().await {
                tracing::error!("Health checker failed: {}", e);
            }
        });
    } else {
        tracing::info!("Health checking is disabled in configuration");
    }

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    tracing::info!("Gateway listening on {}", config.listen_addr);

    tokio::select! {
        result = axum::serve(listener, router) => {
            result.context("Server error")?;
            tracing::info!("Server stopped");
        }
        shutdown_reason = graceful_shutdown.wait_for_shutdown_signal() => {
            tracing::info!("Server shutting down: {:?}", shutdown_reason);
        }
    }

    Ok(())
}

fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • Services: {}", config.services.len());
            println!("   • Health Checks: {}", config.health_check.enabled);
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
