///! Cluster lifecycle commands

use crate::api::ApiClient;
use crate::lifecycle::{ClusterLifecycle, ClusterListing, CreateOutcome, DeleteOutcome};
use crate::output::{self, OutputFormat};
use crate::poller::{PollSettings, Poller};
use crate::{Commands, CreateArgs, UpdateArgs};
use anyhow::{Context as _, Result};
use gke_common::schema::NodeConfig;
use gke_common::ClusterSpec;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

/// Settings shared by every command, resolved once in `main`
pub struct Context {
    pub output: OutputFormat,
    pub poll: PollSettings,
    pub progress: bool,
}

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "CLUSTER")]
    cluster: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "MASTER")]
    master_version: String,
    #[tabled(rename = "POOL")]
    pool: String,
    #[tabled(rename = "POOL STATUS")]
    pool_status: String,
    #[tabled(rename = "MACHINE TYPE")]
    machine_type: String,
    #[tabled(rename = "NODE VERSION")]
    node_version: String,
    #[tabled(rename = "AUTOSCALING")]
    autoscaling: String,
}

/// One row per node pool; clusters without pools get a single row
fn cluster_rows(listings: &[ClusterListing]) -> Vec<ClusterRow> {
    let mut rows = Vec::new();
    for cluster in listings {
        if cluster.node_pools.is_empty() {
            rows.push(ClusterRow {
                cluster: cluster.name.clone(),
                status: output::or_dash(&cluster.status),
                master_version: output::or_dash(&cluster.master_version),
                pool: "-".to_string(),
                pool_status: "-".to_string(),
                machine_type: "-".to_string(),
                node_version: "-".to_string(),
                autoscaling: "-".to_string(),
            });
            continue;
        }

        for pool in &cluster.node_pools {
            rows.push(ClusterRow {
                cluster: cluster.name.clone(),
                status: output::or_dash(&cluster.status),
                master_version: output::or_dash(&cluster.master_version),
                pool: pool.name.clone(),
                pool_status: output::or_dash(&pool.status),
                machine_type: output::or_dash(&pool.machine_type),
                node_version: output::or_dash(&pool.node_version),
                autoscaling: pool.autoscaling.to_string(),
            });
        }
    }
    rows
}

/// Fill the command's fields into the spec carrying project, zone and credentials
pub fn build_spec(command: &Commands, mut spec: ClusterSpec) -> Result<ClusterSpec> {
    match command {
        Commands::Create(args) => {
            apply_create_args(&mut spec, args);
            if let Some(path) = &args.file {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read spec file {}", path.display()))?;
                let file: ClusterSpec = toml::from_str(&contents)
                    .with_context(|| format!("invalid spec file {}", path.display()))?;
                spec.fill_from(file);
            }
        }
        Commands::Update(args) => apply_update_args(&mut spec, args),
        Commands::Delete { name, .. } => spec.name = name.clone(),
        Commands::List | Commands::Completions { .. } => {}
    }
    Ok(spec)
}

fn apply_create_args(spec: &mut ClusterSpec, args: &CreateArgs) {
    spec.name = args.name.clone().unwrap_or_default();
    spec.description = args.description.clone();
    spec.node_count = args.node_count;
    spec.master_version = args.master_version.clone();
    spec.cluster_ipv4_cidr = args.cluster_ipv4_cidr.clone();
    spec.network = args.network.clone();
    spec.subnetwork = args.subnetwork.clone();
    spec.locations = args.locations.clone();
    spec.http_load_balancing = args.http_load_balancing;
    spec.horizontal_pod_autoscaling = args.horizontal_pod_autoscaling;
    spec.kubernetes_dashboard = args.kubernetes_dashboard;
    spec.network_policy_config = args.network_policy;
    spec.legacy_abac = args.legacy_abac;
    spec.enable_alpha_feature = args.enable_alpha;

    let wants_node_config = args.machine_type.is_some()
        || args.disk_size_gb.is_some()
        || args.image_type.is_some()
        || args.preemptible;
    if wants_node_config {
        let mut config = NodeConfig::with_default_scopes();
        config.machine_type = args.machine_type.clone();
        config.disk_size_gb = args.disk_size_gb;
        config.image_type = args.image_type.clone();
        config.preemptible = args.preemptible;
        spec.node_config = Some(config);
    }
}

fn apply_update_args(spec: &mut ClusterSpec, args: &UpdateArgs) {
    spec.name = args.name.clone();
    spec.master_version = args.master_version.clone();
    spec.node_version = args.node_version.clone();
    spec.node_count = args.node_count;
    spec.node_pool_id = args.node_pool.clone();
}

fn spinner(message: String) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

pub async fn handle_cluster_command(
    command: Commands,
    mut spec: ClusterSpec,
    api: &ApiClient,
    ctx: &Context,
    cancel: CancellationToken,
) -> Result<()> {
    let mut poller = Poller::new(ctx.poll.clone(), cancel);
    if ctx.progress && !matches!(command, Commands::List | Commands::Delete { .. }) {
        poller = poller.with_progress(spinner(format!("Waiting for cluster '{}'...", spec.name)));
    }
    let lifecycle = ClusterLifecycle::new(api, &poller);

    match command {
        Commands::List => {
            let listings = lifecycle.list(&spec).await?;
            output::print_output(cluster_rows(&listings), &listings, ctx.output)?;
        }

        Commands::Create(_) => match lifecycle.create(&spec).await? {
            CreateOutcome::Created => {
                output::print_success(&format!("Cluster '{}' created and running", spec.name))
            }
            CreateOutcome::AlreadyExists => output::print_info(&format!(
                "Cluster '{}' already exists and is running",
                spec.name
            )),
        },

        Commands::Update(_) => {
            if spec.master_version.is_none() && spec.node_version.is_none() && spec.node_count == 0 {
                output::print_warning("Nothing to update: pass --master-version, --node-version or --node-count");
                return Ok(());
            }
            lifecycle.update(&mut spec).await?;
            output::print_success(&format!("Cluster '{}' updated", spec.name));
        }

        Commands::Delete { yes, .. } => {
            if !yes {
                use dialoguer::Confirm;

                let prompt = format!(
                    "Are you sure you want to delete cluster '{}' in {}/{}?",
                    spec.name, spec.project_id, spec.zone
                );
                // Blocking read; keep it off the runtime so Ctrl-C is still seen
                let confirm = tokio::task::spawn_blocking(move || {
                    Confirm::new().with_prompt(prompt).default(false).interact()
                })
                .await??;

                if !confirm {
                    output::print_info("Deletion cancelled");
                    return Ok(());
                }
            }

            match lifecycle.delete(&spec).await? {
                DeleteOutcome::Deleted => {
                    output::print_success(&format!("Cluster '{}' deletion started", spec.name))
                }
                DeleteOutcome::NotFound => {
                    output::print_info(&format!("Cluster '{}' doesn't exist", spec.name))
                }
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
