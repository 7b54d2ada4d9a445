//! Cluster spec: the flat record describing desired cluster state

use crate::schema::NodeConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OAuth scopes granted to nodes when the caller does not pick any
pub const DEFAULT_OAUTH_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/monitoring.write",
    "https://www.googleapis.com/auth/devstorage.read_only",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSpec {
    pub project_id: String,
    pub zone: String,
    pub name: String,
    pub description: Option<String>,
    /// Number of nodes; 0 means unset
    pub node_count: i32,
    pub master_version: Option<String>,
    pub node_version: Option<String>,
    pub cluster_ipv4_cidr: Option<String>,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    /// Additional zones the cluster's nodes are placed in
    pub locations: Vec<String>,
    pub http_load_balancing: bool,
    pub horizontal_pod_autoscaling: bool,
    pub kubernetes_dashboard: bool,
    pub network_policy_config: bool,
    pub legacy_abac: bool,
    pub enable_alpha_feature: bool,
    pub node_config: Option<NodeConfig>,
    /// Service account key file used to authenticate
    pub credential_path: Option<PathBuf>,
    /// Key file materialized from inline credentials; removed after delete
    pub temp_credential_path: Option<PathBuf>,
    pub node_pool_id: Option<String>,
}

/// Borrowed identity of a cluster, the addressing unit of every API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterRef<'a> {
    pub project: &'a str,
    pub zone: &'a str,
    pub cluster: &'a str,
}

impl std::fmt::Display for ClusterRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.zone, self.cluster)
    }
}

impl ClusterSpec {
    pub fn new(project_id: impl Into<String>, zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            zone: zone.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check the identity fields required before any mutating call
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        if self.name.trim().is_empty() {
            return Err(Error::Validation("cluster name is required".to_string()));
        }
        Ok(())
    }

    /// Check project and zone only, enough for listing
    pub fn validate_location(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::Validation("project ID is required".to_string()));
        }
        if self.zone.trim().is_empty() {
            return Err(Error::Validation("zone is required".to_string()));
        }
        Ok(())
    }

    pub fn cluster_ref(&self) -> ClusterRef<'_> {
        ClusterRef {
            project: &self.project_id,
            zone: &self.zone,
            cluster: &self.name,
        }
    }

    /// Whether an update touches the node pool and so needs a pool id
    pub fn needs_node_pool(&self) -> bool {
        self.node_version.is_some() || self.node_count != 0
    }

    /// Merge values from a spec file underneath the current values.
    ///
    /// Fields already set here win; toggles are OR-ed.
    pub fn fill_from(&mut self, file: ClusterSpec) {
        fn keep<T>(slot: &mut Option<T>, other: Option<T>) {
            if slot.is_none() {
                *slot = other;
            }
        }
        fn keep_str(slot: &mut String, other: String) {
            if slot.is_empty() {
                *slot = other;
            }
        }

        keep_str(&mut self.project_id, file.project_id);
        keep_str(&mut self.zone, file.zone);
        keep_str(&mut self.name, file.name);
        keep(&mut self.description, file.description);
        if self.node_count == 0 {
            self.node_count = file.node_count;
        }
        keep(&mut self.master_version, file.master_version);
        keep(&mut self.node_version, file.node_version);
        keep(&mut self.cluster_ipv4_cidr, file.cluster_ipv4_cidr);
        keep(&mut self.network, file.network);
        keep(&mut self.subnetwork, file.subnetwork);
        if self.locations.is_empty() {
            self.locations = file.locations;
        }
        self.http_load_balancing |= file.http_load_balancing;
        self.horizontal_pod_autoscaling |= file.horizontal_pod_autoscaling;
        self.kubernetes_dashboard |= file.kubernetes_dashboard;
        self.network_policy_config |= file.network_policy_config;
        self.legacy_abac |= file.legacy_abac;
        self.enable_alpha_feature |= file.enable_alpha_feature;
        keep(&mut self.node_config, file.node_config);
        keep(&mut self.credential_path, file.credential_path);
        keep(&mut self.node_pool_id, file.node_pool_id);
    }
}

impl NodeConfig {
    /// Node config carrying the default OAuth scopes
    pub fn with_default_scopes() -> Self {
        Self {
            oauth_scopes: DEFAULT_OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}
