//! Server command.

use clap::Args;
use ksm_core::config::Config;
use ksm_gateway::{Gateway, GatewayConfig};
use tracing::info;

use super::build_manager;

/// Server command arguments.
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Listen host (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port number (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Apply command-line overrides to the `server` section.
pub fn apply_overrides(config: &mut Config, args: &ServerArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
}

/// Run the REST gateway until interrupted.
pub async fn run(args: ServerArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    config.validate()?;

    let manager = build_manager(&config)?;
    let gateway = Gateway::new(GatewayConfig::from_settings(&config.server), manager);

    info!(
        backend = ?config.store.backend,
        "Serving secrets API on {}:{}",
        config.server.host,
        config.server.port
    );
    gateway.run().await?;
    Ok(())
}
