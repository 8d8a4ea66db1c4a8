//! oci-discovery binary.
//!
//! Resolves host-based image names to Merkle roots, or lists the
//! ref-engines discovered for them, and prints the result as JSON keyed by
//! name.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use oci_discovery::{
    Context, Flow, HttpTransport, RefEngineRegistry, Resolver, ResolverOptions,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve image names to Merkle roots
    Resolve {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Stop at the first Merkle root found for each name
        #[arg(long)]
        first: bool,

        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// List the ref-engines discovered for image names
    Discover {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
}

#[derive(Args)]
struct DiscoveryArgs {
    /// Transport protocol for well-known discovery (repeatable, in order)
    #[arg(long = "protocol", value_name = "PROTOCOL")]
    protocols: Vec<String>,

    /// Port for well-known URIs
    #[arg(long)]
    port: Option<u16>,

    /// Only attempt well-known discovery over https
    #[arg(long, conflicts_with = "protocols")]
    https_only: bool,

    /// Skip local configuration files
    #[arg(long)]
    no_local: bool,

    /// Skip well-known URI discovery
    #[arg(long)]
    no_well_known: bool,

    /// Local config file (repeatable, earlier files win)
    #[arg(long = "config", value_name = "FILE")]
    config_paths: Vec<PathBuf>,

    /// Per-request HTTP timeout
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

impl DiscoveryArgs {
    fn options(&self) -> ResolverOptions {
        let mut options = ResolverOptions {
            port: self.port,
            well_known: !self.no_well_known,
            local_config: !self.no_local,
            config_paths: self.config_paths.clone(),
            timeout_secs: self.timeout,
            ..ResolverOptions::default()
        };
        if self.https_only {
            options.protocols = vec!["https".to_string()];
        } else if !self.protocols.is_empty() {
            options.protocols = self.protocols.clone();
        }
        options
    }
}

fn init_logging(level: &str) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    LogTracer::init()?;
    Ok(())
}

/// Build a resolver and a context cancelled by ctrl-c.
fn setup(discovery: &DiscoveryArgs) -> (Resolver, Context) {
    let options = discovery.options();
    debug!("resolver options: {:?}", options);

    let registry = Arc::new(RefEngineRegistry::with_defaults());
    let resolver = Resolver::from_options(registry, &options);

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            interrupt.cancel();
        }
    });

    let transport = Arc::new(HttpTransport::with_timeout(options.timeout()));
    (resolver, Context::with_cancellation(transport, token))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

async fn resolve(discovery: &DiscoveryArgs, first: bool, names: &[String]) -> Result<bool, BoxError> {
    let (resolver, ctx) = setup(discovery);
    let mut results = BTreeMap::new();
    let mut ok = true;

    for name in names {
        let mut roots = Vec::new();
        let outcome = resolver
            .resolve(&ctx, name, |root| {
                roots.push(root);
                Ok(if first { Flow::Stop } else { Flow::Continue })
            })
            .await;

        match outcome {
            Ok(()) => {
                results.insert(name.as_str(), roots);
            }
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(e) => {
                warn!("{}", e);
                ok = false;
            }
        }
    }

    resolver.close().await?;
    print_json(&results)?;
    Ok(ok)
}

async fn discover(discovery: &DiscoveryArgs, names: &[String]) -> Result<bool, BoxError> {
    let (resolver, ctx) = setup(discovery);
    let mut results = BTreeMap::new();
    let mut ok = true;

    for name in names {
        match resolver.discover(&ctx, name).await {
            Ok(references) => {
                results.insert(name.as_str(), references);
            }
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(e) => {
                warn!("{}", e);
                ok = false;
            }
        }
    }

    resolver.close().await?;
    print_json(&results)?;
    Ok(ok)
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let ok = match &cli.command {
        Command::Resolve {
            discovery,
            first,
            names,
        } => resolve(discovery, *first, names).await?,
        Command::Discover { discovery, names } => discover(discovery, names).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
