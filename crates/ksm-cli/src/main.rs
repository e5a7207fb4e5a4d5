//! KSM CLI entry point.

use clap::Parser;
use ksm_cli::{run, Cli};
use ksm_core::config::{Config, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging settings come from the config file when it can be read; a
    // broken file is reported by the command itself.
    let logging = Config::resolve(cli.global.config.as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(cli.global.verbose, &logging);

    // Run the command
    run(cli).await
}

/// Install the global subscriber. `RUST_LOG` wins over config and `-v`.
fn init_logging(verbose: u8, logging: &LoggingConfig) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ksm={level},tower_http={level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
