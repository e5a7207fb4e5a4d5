//! KSM command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ksm_core::config::{Config, StoreBackend};
use ksm_secrets::SecretManager;

/// KSM - manage namespaced secrets in a cluster secret store
#[derive(Parser, Debug)]
#[command(name = "ksm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true, env = "KSM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace to operate in (defaults to manager.default_namespace)
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Secret store backend (cluster or memory)
    #[arg(long, global = true)]
    pub store: Option<StoreBackend>,

    /// Kubeconfig to take the cluster connection from
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,
}

impl GlobalArgs {
    /// Resolve the configuration and apply flag overrides.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::resolve(self.config.as_deref())?;
        if let Some(namespace) = &self.namespace {
            config.manager.default_namespace = namespace.clone();
        }
        if let Some(backend) = self.store {
            config.store.backend = backend;
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.store.kubeconfig = Some(kubeconfig.clone());
        }
        Ok(config)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a secret
    Create(commands::secrets::WriteArgs),

    /// Replace the data of an existing secret
    Update(commands::secrets::WriteArgs),

    /// Show a secret, or one value with --key
    Get {
        /// Secret name
        #[arg(long)]
        name: String,

        /// Print only this entry's value
        #[arg(long)]
        key: Option<String>,
    },

    /// List secrets in the namespace
    List,

    /// Delete a secret
    Delete {
        /// Secret name
        #[arg(long)]
        name: String,
    },

    /// Run the REST API server
    Server(commands::server::ServerArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;

    match cli.command {
        Commands::Create(args) => {
            let (manager, namespace) = open(&global)?;
            commands::secrets::create(&manager, &namespace, args).await
        }
        Commands::Update(args) => {
            let (manager, namespace) = open(&global)?;
            commands::secrets::update(&manager, &namespace, args).await
        }
        Commands::Get { name, key } => {
            let (manager, namespace) = open(&global)?;
            commands::secrets::get(&manager, &namespace, &name, key.as_deref()).await
        }
        Commands::List => {
            let (manager, namespace) = open(&global)?;
            commands::secrets::list(&manager, &namespace).await
        }
        Commands::Delete { name } => {
            let (manager, namespace) = open(&global)?;
            commands::secrets::delete(&manager, &namespace, &name).await
        }
        Commands::Server(args) => commands::server::run(args, global.load_config()?).await,
        Commands::Config(args) => commands::config::run(args, global.config.as_deref()).await,
        Commands::Version => {
            println!("ksm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load and validate config, then build the manager and pick the namespace.
fn open(global: &GlobalArgs) -> anyhow::Result<(SecretManager, String)> {
    let config = global.load_config()?;
    config.validate()?;
    let manager = commands::build_manager(&config)?;
    Ok((manager, config.manager.default_namespace))
}
