///! Cluster lifecycle operations: list, create, update, delete

use crate::api::ControlPlane;
use crate::auth;
use crate::poller::Poller;
use gke_common::request;
use gke_common::{ClusterSpec, Error, Result};
use serde::Serialize;
use tracing::{info, warn};

/// One cluster and its node pools, as shown by `list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterListing {
    pub name: String,
    pub status: String,
    pub master_version: String,
    pub node_pools: Vec<NodePoolListing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePoolListing {
    pub name: String,
    pub status: String,
    pub machine_type: String,
    pub node_version: String,
    pub autoscaling: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

pub struct ClusterLifecycle<'a> {
    api: &'a dyn ControlPlane,
    poller: &'a Poller,
}

impl<'a> ClusterLifecycle<'a> {
    pub fn new(api: &'a dyn ControlPlane, poller: &'a Poller) -> Self {
        Self { api, poller }
    }

    /// List every cluster in the spec's project and zone with its node pools
    pub async fn list(&self, spec: &ClusterSpec) -> Result<Vec<ClusterListing>> {
        spec.validate_location()?;

        let response = self.api.list_clusters(&spec.project_id, &spec.zone).await?;
        if !response.missing_zones.is_empty() {
            warn!(zones = ?response.missing_zones, "Some zones could not be reached");
        }

        let mut listings = Vec::with_capacity(response.clusters.len());
        for cluster in response.clusters {
            let cluster_ref = gke_common::ClusterRef {
                project: &spec.project_id,
                zone: &spec.zone,
                cluster: &cluster.name,
            };
            let pools = self.api.list_node_pools(cluster_ref).await?;

            listings.push(ClusterListing {
                status: cluster.status.clone().unwrap_or_default(),
                master_version: cluster.current_master_version.clone().unwrap_or_default(),
                node_pools: pools
                    .into_iter()
                    .map(|pool| NodePoolListing {
                        autoscaling: pool.autoscaling_enabled(),
                        machine_type: pool
                            .config
                            .as_ref()
                            .and_then(|c| c.machine_type.clone())
                            .unwrap_or_default(),
                        node_version: pool.version.unwrap_or_default(),
                        status: pool.status.unwrap_or_default(),
                        name: pool.name,
                    })
                    .collect(),
                name: cluster.name,
            });
        }

        Ok(listings)
    }

    /// Create the cluster and wait until it is running.
    ///
    /// A cluster that already exists is not an error; the wait still runs.
    pub async fn create(&self, spec: &ClusterSpec) -> Result<CreateOutcome> {
        spec.validate()?;

        let create_request = request::create_cluster_request(spec);
        info!(cluster = %spec.name, request = ?create_request, "Cluster request");

        let outcome = match self
            .api
            .create_cluster(&spec.project_id, &spec.zone, &create_request)
            .await
        {
            Ok(submitted) => {
                info!(
                    cluster = %spec.name,
                    project = %spec.project_id,
                    zone = %spec.zone,
                    status_code = submitted.status,
                    operation = %submitted.operation.name,
                    "Cluster create is called"
                );
                CreateOutcome::Created
            }
            Err(e) if e.is_already_exists() => {
                info!(cluster = %spec.name, "Cluster already exists");
                CreateOutcome::AlreadyExists
            }
            Err(e) => return Err(Error::Api(e)),
        };

        self.poller
            .wait_for_cluster(self.api, spec.cluster_ref())
            .await?;
        Ok(outcome)
    }

    /// Apply master version, node version and node count changes in order,
    /// waiting for convergence after each.
    pub async fn update(&self, spec: &mut ClusterSpec) -> Result<()> {
        spec.validate()?;
        info!(
            cluster = %spec.name,
            master_version = ?spec.master_version,
            node_version = ?spec.node_version,
            node_count = spec.node_count,
            "Updating cluster"
        );

        if spec.needs_node_pool() && spec.node_pool_id.is_none() {
            spec.node_pool_id = Some(self.resolve_node_pool(spec).await?);
        }

        let spec = &*spec;
        let cluster = spec.cluster_ref();

        if let Some(update) = request::master_update_request(spec) {
            info!(version = ?update.update.desired_master_version, "Updating master version");
            let submitted = self.api.update_cluster(cluster, &update).await?;
            info!(
                cluster = %spec.name,
                status_code = submitted.status,
                "Cluster update is called"
            );
            self.poller.wait_for_cluster(self.api, cluster).await?;
        }

        let pool = spec.node_pool_id.as_deref().unwrap_or_default();

        if let Some(update) = request::node_version_request(spec) {
            info!(version = %update.node_version, node_pool = %pool, "Updating node version");
            let submitted = self.api.update_node_pool(cluster, pool, &update).await?;
            info!(
                node_pool = %pool,
                cluster = %spec.name,
                status_code = submitted.status,
                "Nodepool update is called"
            );
            self.poller
                .wait_for_node_pool(self.api, cluster, pool)
                .await?;
        }

        if let Some(resize) = request::node_size_request(spec) {
            info!(node_count = resize.node_count, node_pool = %pool, "Updating node pool size");
            let submitted = self.api.set_node_pool_size(cluster, pool, &resize).await?;
            info!(
                node_pool = %pool,
                cluster = %spec.name,
                status_code = submitted.status,
                "Nodepool size change is called"
            );
            self.poller.wait_for_cluster(self.api, cluster).await?;
        }

        Ok(())
    }

    /// Pick the node pool for a node-scoped update when none was given.
    ///
    /// Only a single-pool cluster is resolved; with several pools the caller
    /// has to choose.
    async fn resolve_node_pool(&self, spec: &ClusterSpec) -> Result<String> {
        let cluster = self.api.get_cluster(spec.cluster_ref()).await?;
        let mut names: Vec<String> = cluster.node_pools.into_iter().map(|p| p.name).collect();

        match names.len() {
            0 => Err(Error::Validation(format!(
                "cluster {} has no node pools",
                spec.name
            ))),
            1 => {
                let name = names.remove(0);
                info!(node_pool = %name, "Resolved node pool");
                Ok(name)
            }
            _ => Err(Error::Validation(format!(
                "cluster {} has several node pools ({}); select one with --node-pool",
                spec.name,
                names.join(", ")
            ))),
        }
    }

    /// Delete the cluster. A missing cluster counts as deleted.
    pub async fn delete(&self, spec: &ClusterSpec) -> Result<DeleteOutcome> {
        spec.validate()?;
        info!(
            cluster = %spec.name,
            project = %spec.project_id,
            zone = %spec.zone,
            "Removing cluster"
        );

        let outcome = match self.api.delete_cluster(spec.cluster_ref()).await {
            Ok(submitted) => {
                info!(cluster = %spec.name, status_code = submitted.status, "Cluster delete is called");
                DeleteOutcome::Deleted
            }
            Err(e) if e.is_not_found() => {
                info!(cluster = %spec.name, "Cluster doesn't exist");
                DeleteOutcome::NotFound
            }
            Err(e) => return Err(Error::Api(e)),
        };

        auth::remove_temp_credential(spec);
        Ok(outcome)
    }
}
