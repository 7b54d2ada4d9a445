///! gkectl
///!
///! Command-line interface for GKE cluster lifecycle operations

mod api;
mod auth;
mod commands;
mod config;
mod lifecycle;
mod logging;
mod output;
mod poller;

use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project ID
    #[arg(short, long, env = "GOOGLE_CLOUD_PROJECT", global = true)]
    project: Option<String>,

    /// Compute zone
    #[arg(short, long, env = "GKE_ZONE", global = true)]
    zone: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Control-plane API endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Service account key file (defaults to application default credentials)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Service account key JSON, written to a temporary file for this run
    #[arg(long, env = "GKE_CREDENTIALS_JSON", hide_env_values = true, global = true)]
    credentials_json: Option<String>,

    /// Send requests without credentials (local emulators)
    #[arg(long, global = true)]
    anonymous: bool,

    /// Seconds between status polls
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: Option<u64>,

    /// Give up waiting for RUNNING after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show a spinner while waiting
    #[arg(long, global = true)]
    progress: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Also write JSON logs to <DIR>/gkectl.log
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List clusters and their node pools (default)
    #[command(alias = "l")]
    List,
    /// Create a cluster and wait until it is running
    #[command(alias = "c")]
    Create(CreateArgs),
    /// Upgrade versions or resize a cluster
    #[command(alias = "u")]
    Update(UpdateArgs),
    /// Delete a cluster
    #[command(alias = "d")]
    Delete {
        /// Cluster name
        #[arg(short, long)]
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Cluster name
    #[arg(short, long)]
    pub name: Option<String>,
    /// TOML file with cluster settings; flags override it
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Cluster description
    #[arg(long)]
    pub description: Option<String>,
    /// Initial node count
    #[arg(long, default_value_t = 0)]
    pub node_count: i32,
    /// Initial Kubernetes master version
    #[arg(long)]
    pub master_version: Option<String>,
    /// Pod IP range in CIDR notation
    #[arg(long)]
    pub cluster_ipv4_cidr: Option<String>,
    /// VPC network
    #[arg(long)]
    pub network: Option<String>,
    /// VPC subnetwork
    #[arg(long)]
    pub subnetwork: Option<String>,
    /// Additional node zone (repeatable)
    #[arg(long = "location")]
    pub locations: Vec<String>,
    /// Enable the HTTP load balancing addon
    #[arg(long)]
    pub http_load_balancing: bool,
    /// Enable the horizontal pod autoscaling addon
    #[arg(long)]
    pub horizontal_pod_autoscaling: bool,
    /// Enable the Kubernetes dashboard addon
    #[arg(long)]
    pub kubernetes_dashboard: bool,
    /// Enable the network policy addon
    #[arg(long)]
    pub network_policy: bool,
    /// Enable legacy ABAC
    #[arg(long)]
    pub legacy_abac: bool,
    /// Enable Kubernetes alpha features
    #[arg(long)]
    pub enable_alpha: bool,
    /// Node machine type
    #[arg(long)]
    pub machine_type: Option<String>,
    /// Node boot disk size in GB
    #[arg(long)]
    pub disk_size_gb: Option<i32>,
    /// Node image type
    #[arg(long)]
    pub image_type: Option<String>,
    /// Use preemptible nodes
    #[arg(long)]
    pub preemptible: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Cluster name
    #[arg(short, long)]
    pub name: String,
    /// Target master version
    #[arg(long)]
    pub master_version: Option<String>,
    /// Target node version
    #[arg(long)]
    pub node_version: Option<String>,
    /// New node count for the node pool
    #[arg(long, default_value_t = 0)]
    pub node_count: i32,
    /// Node pool to update; required when the cluster has several
    #[arg(long)]
    pub node_pool: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = logging::LoggingConfig::from_verbosity(cli.verbose);
    logging.json_format = cli.log_json;
    logging.log_dir = cli.log_dir.clone();
    let _log_guard = logging.init();

    let command = cli.command.unwrap_or(Commands::List);
    if let Commands::Completions { shell } = &command {
        generate_completions(*shell);
        return Ok(());
    }

    // Load config
    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Could not read config file, using defaults");
            config::Config::default()
        }
    };

    let project = cli.project.or(config.default_project.clone());
    let zone = cli.zone.or(config.default_zone.clone());
    let (project, zone) = match (project, zone) {
        (Some(p), Some(z)) if !p.is_empty() && !z.is_empty() => (p, z),
        (p, _) => {
            let missing = if p.map_or(true, |p| p.is_empty()) {
                "--project flag missing"
            } else {
                "--zone flag missing"
            };
            Cli::command()
                .error(ErrorKind::MissingRequiredArgument, missing)
                .exit();
        }
    };

    let mut spec = gke_common::ClusterSpec::new(project, zone, "");
    spec.credential_path = cli.credentials.or(config.credentials.clone());

    let ctx = commands::cluster::Context {
        output: output::OutputFormat::from_str(
            cli.output.as_deref().unwrap_or(&config.default_output),
        ),
        poll: poller::PollSettings {
            interval: Duration::from_secs(cli.poll_interval.unwrap_or(config.poll_interval_secs)),
            timeout: cli.timeout.or(config.wait_timeout_secs).map(Duration::from_secs),
        },
        progress: cli.progress,
    };

    let mut spec = commands::cluster::build_spec(&command, spec)?;

    let token_provider = if cli.anonymous {
        None
    } else {
        Some(auth::resolve(&mut spec, cli.credentials_json.as_deref()).await?)
    };
    let _credential_guard = auth::TempCredentialGuard::new(&spec);

    let endpoint = cli.endpoint.unwrap_or(config.api_endpoint);
    debug!(endpoint = %endpoint, "Using control-plane endpoint");
    let api_client = api::ApiClient::with_timeout(
        &endpoint,
        token_provider,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let work =
        commands::cluster::handle_cluster_command(command, spec, &api_client, &ctx, cancel.clone());
    interruptible(work, &cancel).await
}

/// Run a command until it finishes or Ctrl-C fires
async fn interruptible<F>(work: F, cancel: &CancellationToken) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        result = work => result,
        _ = cancel.cancelled() => {
            warn!("Interrupted");
            Err(anyhow!("interrupted"))
        }
    }
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
