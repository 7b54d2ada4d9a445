//! Request builders: translate a `ClusterSpec` into GKE API payloads

use crate::schema::{
    AddonState, AddonsConfig, Cluster, ClusterUpdate, CreateClusterRequest, LegacyAbac,
    MasterAuth, SetNodePoolSizeRequest, UpdateClusterRequest, UpdateNodePoolRequest,
};
use crate::spec::ClusterSpec;

/// Username set on the master auth of every created cluster
pub const MASTER_USERNAME: &str = "admin";

/// Build the create payload. Enabled toggles become inverted `disabled` flags.
pub fn create_cluster_request(spec: &ClusterSpec) -> CreateClusterRequest {
    let cluster = Cluster {
        name: spec.name.clone(),
        zone: Some(spec.zone.clone()),
        description: spec.description.clone(),
        initial_node_count: (spec.node_count != 0).then_some(spec.node_count),
        initial_cluster_version: spec.master_version.clone(),
        cluster_ipv4_cidr: spec.cluster_ipv4_cidr.clone(),
        enable_kubernetes_alpha: spec.enable_alpha_feature,
        addons_config: Some(AddonsConfig {
            http_load_balancing: Some(AddonState::from_enabled(spec.http_load_balancing)),
            horizontal_pod_autoscaling: Some(AddonState::from_enabled(
                spec.horizontal_pod_autoscaling,
            )),
            kubernetes_dashboard: Some(AddonState::from_enabled(spec.kubernetes_dashboard)),
            network_policy_config: Some(AddonState::from_enabled(spec.network_policy_config)),
        }),
        network: spec.network.clone(),
        subnetwork: spec.subnetwork.clone(),
        locations: spec.locations.clone(),
        legacy_abac: Some(LegacyAbac {
            enabled: spec.legacy_abac,
        }),
        master_auth: Some(MasterAuth {
            username: Some(MASTER_USERNAME.to_string()),
        }),
        node_config: spec.node_config.clone(),
        ..Default::default()
    };

    CreateClusterRequest { cluster }
}

/// Master upgrade payload, `None` when no master version is requested
pub fn master_update_request(spec: &ClusterSpec) -> Option<UpdateClusterRequest> {
    spec.master_version.as_ref().map(|version| UpdateClusterRequest {
        update: ClusterUpdate {
            desired_master_version: Some(version.clone()),
        },
    })
}

pub fn node_version_request(spec: &ClusterSpec) -> Option<UpdateNodePoolRequest> {
    spec.node_version.as_ref().map(|version| UpdateNodePoolRequest {
        node_version: version.clone(),
        image_type: spec
            .node_config
            .as_ref()
            .and_then(|config| config.image_type.clone()),
    })
}

pub fn node_size_request(spec: &ClusterSpec) -> Option<SetNodePoolSizeRequest> {
    (spec.node_count != 0).then_some(SetNodePoolSizeRequest {
        node_count: spec.node_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeConfig;

    fn addons(spec: &ClusterSpec) -> AddonsConfig {
        create_cluster_request(spec).cluster.addons_config.unwrap()
    }

    #[test]
    fn test_addon_toggles_are_inverted() {
        let mut spec = ClusterSpec::new("proj", "us-central1-a", "demo");
        spec.http_load_balancing = true;
        spec.horizontal_pod_autoscaling = true;
        spec.kubernetes_dashboard = true;
        spec.network_policy_config = true;

        let enabled = addons(&spec);
        assert_eq!(enabled.http_load_balancing, Some(AddonState { disabled: false }));
        assert_eq!(enabled.horizontal_pod_autoscaling, Some(AddonState { disabled: false }));
        assert_eq!(enabled.kubernetes_dashboard, Some(AddonState { disabled: false }));
        assert_eq!(enabled.network_policy_config, Some(AddonState { disabled: false }));

        let disabled = addons(&ClusterSpec::new("proj", "us-central1-a", "demo"));
        assert_eq!(disabled.http_load_balancing, Some(AddonState { disabled: true }));
        assert_eq!(disabled.horizontal_pod_autoscaling, Some(AddonState { disabled: true }));
        assert_eq!(disabled.kubernetes_dashboard, Some(AddonState { disabled: true }));
        assert_eq!(disabled.network_policy_config, Some(AddonState { disabled: true }));
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut spec = ClusterSpec::new("proj", "us-central1-a", "demo");
        spec.kubernetes_dashboard = true;

        let config = addons(&spec);
        assert!(config.http_load_balancing.unwrap().disabled);
        assert!(config.horizontal_pod_autoscaling.unwrap().disabled);
        assert!(!config.kubernetes_dashboard.unwrap().disabled);
        assert!(config.network_policy_config.unwrap().disabled);
    }

    #[test]
    fn test_create_payload_field_names() {
        let mut spec = ClusterSpec::new("proj", "us-central1-a", "demo");
        spec.node_count = 2;
        spec.master_version = Some("1.29.4".to_string());
        spec.cluster_ipv4_cidr = Some("10.0.0.0/14".to_string());
        spec.network = Some("vpc".to_string());
        spec.subnetwork = Some("subnet".to_string());
        spec.legacy_abac = true;
        spec.enable_alpha_feature = true;
        spec.http_load_balancing = true;

        let body = serde_json::to_value(create_cluster_request(&spec)).unwrap();
        let cluster = &body["cluster"];
        assert_eq!(cluster["name"], "demo");
        assert_eq!(cluster["zone"], "us-central1-a");
        assert_eq!(cluster["initialNodeCount"], 2);
        assert_eq!(cluster["initialClusterVersion"], "1.29.4");
        assert_eq!(cluster["clusterIpv4Cidr"], "10.0.0.0/14");
        assert_eq!(cluster["enableKubernetesAlpha"], true);
        assert_eq!(cluster["network"], "vpc");
        assert_eq!(cluster["subnetwork"], "subnet");
        assert_eq!(cluster["legacyAbac"]["enabled"], true);
        assert_eq!(cluster["masterAuth"]["username"], "admin");
        assert_eq!(cluster["addonsConfig"]["httpLoadBalancing"]["disabled"], false);
        assert_eq!(cluster["addonsConfig"]["kubernetesDashboard"]["disabled"], true);
        assert!(cluster.get("status").is_none());
        assert!(cluster.get("nodeConfig").is_none());
    }

    #[test]
    fn test_node_config_is_passed_through() {
        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        let mut config = NodeConfig::with_default_scopes();
        config.machine_type = Some("e2-standard-4".to_string());
        spec.node_config = Some(config.clone());

        let request = create_cluster_request(&spec);
        assert_eq!(request.cluster.node_config, Some(config));
    }

    #[test]
    fn test_update_requests_follow_set_fields() {
        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        assert!(master_update_request(&spec).is_none());
        assert!(node_version_request(&spec).is_none());
        assert!(node_size_request(&spec).is_none());

        spec.master_version = Some("1.30.2".to_string());
        spec.node_version = Some("1.30.1".to_string());
        spec.node_count = 3;

        let master = master_update_request(&spec).unwrap();
        assert_eq!(master.update.desired_master_version.as_deref(), Some("1.30.2"));
        assert_eq!(node_version_request(&spec).unwrap().node_version, "1.30.1");
        assert_eq!(node_size_request(&spec).unwrap().node_count, 3);
    }
}
