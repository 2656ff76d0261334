use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docker_remote::{ClientOptions, Factory, Registry, RegistryPassword};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    registry: RegistryArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RegistryArgs {
    /// Registry host (e.g., registry.example.com:5000), or "docker.io" for the public hub
    #[arg(long, env = "REGISTRY", global = true)]
    registry: Option<String>,
    /// Registry username
    #[arg(long, env = "REGISTRY_USERNAME", global = true)]
    username: Option<String>,
    /// Registry password
    #[arg(long, env = "REGISTRY_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
    /// Read the password from this file (overrides --password)
    #[arg(long, env = "REGISTRY_PASSWORD_FILE", global = true)]
    password_file: Option<PathBuf>,
    /// Read username and password from ~/.docker/config.json
    #[arg(long, env = "CREDENTIALS_FROM_DOCKER_CONFIG", global = true)]
    credentials_from_docker_config: bool,
    /// Use plain HTTP for private registries
    #[arg(long, global = true)]
    insecure: bool,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all repositories of the registry
    #[command(visible_alias = "repos")]
    #[command(visible_alias = "ls")]
    Repositories,
    /// List all tags of a repository
    #[command(visible_alias = "t")]
    Tags {
        /// Repository name (e.g., team/app, or library/nginx on the hub)
        repository: String,
    },
}

impl RegistryArgs {
    /// Build the registry from flags, password file or credential store, in that order
    fn resolve(&self) -> Result<Registry> {
        let mut password = RegistryPassword::from(self.password.clone().unwrap_or_default());
        if let Some(path) = &self.password_file {
            password = RegistryPassword::from_file(path)?;
        }

        let mut registry = Registry::new(
            self.registry.clone().unwrap_or_default(),
            self.username.clone().unwrap_or_default(),
            password,
        );

        if self.credentials_from_docker_config {
            registry
                .read_credentials_from_docker_config()
                .context("read credentials failed")?;
        }

        debug!("Using registry {:?}", registry);
        registry.validate().context("validate registry failed")?;

        Ok(registry)
    }

    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            insecure: self.insecure,
            timeout: self.timeout_secs.map(Duration::from_secs),
            ..ClientOptions::default()
        }
    }
}

/// Write one entry per line
fn write_lines<W: Write, T: Display>(writer: &mut W, entries: &[T]) -> Result<()> {
    for entry in entries {
        writeln!(writer, "{}", entry).context("Failed to write output")?;
    }
    writer.flush().context("Failed to write output")?;
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let registry = cli.registry.resolve()?;
    let factory = Factory::new(cli.registry.client_options())?;

    match &cli.command {
        Commands::Repositories => {
            let repositories = factory
                .repositories()
                .list(&registry)
                .await
                .with_context(|| format!("list repositories of {} failed", registry.name))?;
            write_lines(&mut std::io::stdout().lock(), &repositories)
        }
        Commands::Tags { repository } => {
            let tags = factory
                .tags()
                .list(&registry, repository)
                .await
                .with_context(|| format!("list tags of {} failed", repository))?;
            write_lines(&mut std::io::stdout().lock(), &tags)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries the listing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(&cli).await
}
