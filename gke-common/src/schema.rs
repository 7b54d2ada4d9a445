//! GKE `container/v1` wire types
//!
//! Only the fields gkectl reads or writes are modelled. Names follow the
//! provider's JSON schema verbatim (camelCase).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A GKE cluster, used both as the create payload and as the read model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_node_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_cluster_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_ipv4_cidr: Option<String>,
    pub enable_kubernetes_alpha: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons_config: Option<AddonsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_abac: Option<LegacyAbac>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_auth: Option<MasterAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_config: Option<NodeConfig>,

    // Output only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_master_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePool>,
}

/// Addon switches. Each addon is expressed as "disabled", the inverse of the
/// spec's enabled flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_load_balancing: Option<AddonState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_pod_autoscaling: Option<AddonState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_dashboard: Option<AddonState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_policy_config: Option<AddonState>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonState {
    #[serde(default)]
    pub disabled: bool,
}

impl AddonState {
    pub fn from_enabled(enabled: bool) -> Self {
        Self { disabled: !enabled }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAbac {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Parameters for the nodes of a cluster or node pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub oauth_scopes: Vec<String>,
    pub preemptible: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_node_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<NodeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<NodePoolAutoscaling>,
}

impl NodePool {
    pub fn autoscaling_enabled(&self) -> bool {
        self.autoscaling.as_ref().map(|a| a.enabled).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePoolAutoscaling {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_node_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub cluster: Cluster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClusterRequest {
    pub update: ClusterUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_master_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodePoolRequest {
    pub node_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNodePoolSizeRequest {
    pub node_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    /// Zones that could not be reached while listing
    #[serde(default)]
    pub missing_zones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodePoolsResponse {
    #[serde(default)]
    pub node_pools: Vec<NodePool>,
}

/// Long-running operation returned by every mutating call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_read_model() {
        let body = r#"{
            "name": "demo",
            "status": "PROVISIONING",
            "currentMasterVersion": "1.29.4-gke.100",
            "nodePools": [{
                "name": "default-pool",
                "status": "PROVISIONING",
                "version": "1.29.4-gke.100",
                "config": {"machineType": "e2-medium", "diskSizeGb": 100},
                "autoscaling": {"enabled": true, "minNodeCount": 1, "maxNodeCount": 3}
            }],
            "selfLink": "https://container.googleapis.com/v1/projects/p/zones/z/clusters/demo"
        }"#;

        let cluster: Cluster = serde_json::from_str(body).unwrap();
        assert_eq!(cluster.status.as_deref(), Some("PROVISIONING"));
        assert_eq!(cluster.node_pools.len(), 1);

        let pool = &cluster.node_pools[0];
        assert!(pool.autoscaling_enabled());
        assert_eq!(
            pool.config.as_ref().and_then(|c| c.machine_type.as_deref()),
            Some("e2-medium")
        );
    }

    #[test]
    fn test_update_requests_use_camel_case() {
        let body = serde_json::to_value(UpdateClusterRequest {
            update: ClusterUpdate {
                desired_master_version: Some("1.30.1".to_string()),
            },
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"update": {"desiredMasterVersion": "1.30.1"}}));

        let body = serde_json::to_value(SetNodePoolSizeRequest { node_count: 4 }).unwrap();
        assert_eq!(body, serde_json::json!({"nodeCount": 4}));

        let body = serde_json::to_value(UpdateNodePoolRequest {
            node_version: "1.30.1".to_string(),
            image_type: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"nodeVersion": "1.30.1"}));
    }

    #[test]
    fn test_pool_without_autoscaling() {
        let pool: NodePool = serde_json::from_str(r#"{"name": "pool-a"}"#).unwrap();
        assert!(!pool.autoscaling_enabled());
        assert!(pool.config.is_none());
    }
}
