///! API client for the GKE control plane

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use gke_common::schema::{
    Cluster, CreateClusterRequest, ListClustersResponse, ListNodePoolsResponse, NodePool,
    Operation, SetNodePoolSizeRequest, UpdateClusterRequest, UpdateNodePoolRequest,
};
use gke_common::{ApiError, ClusterRef};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_ENDPOINT: &str = "https://container.googleapis.com";

/// Upper bound for a single HTTP exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Accepted mutation: the HTTP status and the long-running operation handle
#[derive(Debug, Clone)]
pub struct Submitted {
    pub status: u16,
    pub operation: Operation,
}

/// Calls gkectl issues against the control plane
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn list_clusters(&self, project: &str, zone: &str) -> Result<ListClustersResponse, ApiError>;

    async fn get_cluster(&self, cluster: ClusterRef<'_>) -> Result<Cluster, ApiError>;

    async fn create_cluster(
        &self,
        project: &str,
        zone: &str,
        request: &CreateClusterRequest,
    ) -> Result<Submitted, ApiError>;

    async fn update_cluster(
        &self,
        cluster: ClusterRef<'_>,
        request: &UpdateClusterRequest,
    ) -> Result<Submitted, ApiError>;

    async fn delete_cluster(&self, cluster: ClusterRef<'_>) -> Result<Submitted, ApiError>;

    async fn list_node_pools(&self, cluster: ClusterRef<'_>) -> Result<Vec<NodePool>, ApiError>;

    async fn get_node_pool(&self, cluster: ClusterRef<'_>, pool: &str) -> Result<NodePool, ApiError>;

    async fn update_node_pool(
        &self,
        cluster: ClusterRef<'_>,
        pool: &str,
        request: &UpdateNodePoolRequest,
    ) -> Result<Submitted, ApiError>;

    async fn set_node_pool_size(
        &self,
        cluster: ClusterRef<'_>,
        pool: &str,
        request: &SetNodePoolSizeRequest,
    ) -> Result<Submitted, ApiError>;
}

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    auth: Option<Arc<dyn TokenProvider>>,
}

impl ApiClient {
    /// Create a client. Without a token provider requests go out unauthenticated.
    pub fn new(base_url: &str, auth: Option<Arc<dyn TokenProvider>>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, auth, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        auth: Option<Arc<dyn TokenProvider>>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth,
        })
    }

    /// Build request with authentication header
    async fn build_request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Sending request");
        let mut request = self.client.request(method, &url);

        if let Some(auth) = &self.auth {
            let token = auth
                .token(&[CLOUD_PLATFORM_SCOPE])
                .await
                .map_err(|e| ApiError::transport(format!("failed to obtain access token: {}", e)))?;
            request = request.bearer_auth(token.as_str());
        }

        Ok(request)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(u16, T), ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;
        trace!(status = %status, body = %body, "Response body");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let data = serde_json::from_str(&body).map_err(|e| ApiError {
            status: Some(status.as_u16()),
            code: None,
            reason: None,
            message: format!("invalid response body: {}", e),
        })?;
        Ok((status.as_u16(), data))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.build_request(reqwest::Method::GET, path).await?;
        self.send(request).await.map(|(_, data)| data)
    }

    async fn submit<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Submitted, ApiError> {
        let mut request = self.build_request(method, path).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let (status, operation) = self.send::<Operation>(request).await?;
        Ok(Submitted { status, operation })
    }
}

fn zone_path(project: &str, zone: &str) -> String {
    format!(
        "/v1/projects/{}/zones/{}/clusters",
        urlencoding::encode(project),
        urlencoding::encode(zone)
    )
}

fn cluster_path(cluster: ClusterRef<'_>) -> String {
    format!(
        "{}/{}",
        zone_path(cluster.project, cluster.zone),
        urlencoding::encode(cluster.cluster)
    )
}

fn node_pool_path(cluster: ClusterRef<'_>, pool: &str) -> String {
    format!("{}/nodePools/{}", cluster_path(cluster), urlencoding::encode(pool))
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn list_clusters(&self, project: &str, zone: &str) -> Result<ListClustersResponse, ApiError> {
        self.get(&zone_path(project, zone)).await
    }

    async fn get_cluster(&self, cluster: ClusterRef<'_>) -> Result<Cluster, ApiError> {
        self.get(&cluster_path(cluster)).await
    }

    async fn create_cluster(
        &self,
        project: &str,
        zone: &str,
        request: &CreateClusterRequest,
    ) -> Result<Submitted, ApiError> {
        self.submit(reqwest::Method::POST, &zone_path(project, zone), Some(request))
            .await
    }

    async fn update_cluster(
        &self,
        cluster: ClusterRef<'_>,
        request: &UpdateClusterRequest,
    ) -> Result<Submitted, ApiError> {
        self.submit(reqwest::Method::PUT, &cluster_path(cluster), Some(request))
            .await
    }

    async fn delete_cluster(&self, cluster: ClusterRef<'_>) -> Result<Submitted, ApiError> {
        self.submit::<()>(reqwest::Method::DELETE, &cluster_path(cluster), None)
            .await
    }

    async fn list_node_pools(&self, cluster: ClusterRef<'_>) -> Result<Vec<NodePool>, ApiError> {
        let path = format!("{}/nodePools", cluster_path(cluster));
        let response: ListNodePoolsResponse = self.get(&path).await?;
        Ok(response.node_pools)
    }

    async fn get_node_pool(&self, cluster: ClusterRef<'_>, pool: &str) -> Result<NodePool, ApiError> {
        self.get(&node_pool_path(cluster, pool)).await
    }

    async fn update_node_pool(
        &self,
        cluster: ClusterRef<'_>,
        pool: &str,
        request: &UpdateNodePoolRequest,
    ) -> Result<Submitted, ApiError> {
        let path = format!("{}/update", node_pool_path(cluster, pool));
        self.submit(reqwest::Method::POST, &path, Some(request)).await
    }

    async fn set_node_pool_size(
        &self,
        cluster: ClusterRef<'_>,
        pool: &str,
        request: &SetNodePoolSizeRequest,
    ) -> Result<Submitted, ApiError> {
        let path = format!("{}/setSize", node_pool_path(cluster, pool));
        self.submit(reqwest::Method::POST, &path, Some(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLUSTERS: &str = "/v1/projects/proj/zones/us-central1-a/clusters";

    fn demo() -> ClusterRef<'static> {
        ClusterRef {
            project: "proj",
            zone: "us-central1-a",
            cluster: "demo",
        }
    }

    fn operation() -> serde_json::Value {
        serde_json::json!({"name": "operation-123", "operationType": "CREATE_CLUSTER", "status": "RUNNING"})
    }

    #[test]
    fn test_paths_are_encoded() {
        let cluster = ClusterRef {
            project: "proj",
            zone: "us-central1-a",
            cluster: "a b",
        };
        assert_eq!(
            node_pool_path(cluster, "pool/1"),
            "/v1/projects/proj/zones/us-central1-a/clusters/a%20b/nodePools/pool%2F1"
        );
    }

    #[tokio::test]
    async fn test_list_clusters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CLUSTERS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clusters": [{"name": "demo", "status": "RUNNING", "currentMasterVersion": "1.29.4"}]
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let list = api.list_clusters("proj", "us-central1-a").await.unwrap();
        assert_eq!(list.clusters.len(), 1);
        assert_eq!(list.clusters[0].current_master_version.as_deref(), Some("1.29.4"));
    }

    #[tokio::test]
    async fn test_empty_list_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CLUSTERS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let list = api.list_clusters("proj", "us-central1-a").await.unwrap();
        assert!(list.clusters.is_empty());
    }

    #[tokio::test]
    async fn test_create_conflict_is_structured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CLUSTERS))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": {
                    "code": 409,
                    "message": "Already exists: projects/proj/zones/us-central1-a/clusters/demo.",
                    "status": "ALREADY_EXISTS"
                }
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let spec = gke_common::ClusterSpec::new("proj", "us-central1-a", "demo");
        let request = gke_common::request::create_cluster_request(&spec);

        let err = api
            .create_cluster("proj", "us-central1-a", &request)
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(err.status, Some(409));
    }

    #[tokio::test]
    async fn test_update_cluster_sends_desired_version() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/demo", CLUSTERS)))
            .and(body_json(serde_json::json!({"update": {"desiredMasterVersion": "1.30.1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(operation()))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let request = UpdateClusterRequest {
            update: gke_common::schema::ClusterUpdate {
                desired_master_version: Some("1.30.1".to_string()),
            },
        };
        let submitted = api.update_cluster(demo(), &request).await.unwrap();
        assert_eq!(submitted.status, 200);
        assert_eq!(submitted.operation.name, "operation-123");
    }

    #[tokio::test]
    async fn test_set_size_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/demo/nodePools/default-pool/setSize", CLUSTERS)))
            .and(body_json(serde_json::json!({"nodeCount": 4})))
            .respond_with(ResponseTemplate::new(200).set_body_json(operation()))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        api.set_node_pool_size(demo(), "default-pool", &SetNodePoolSizeRequest { node_count: 4 })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_cluster() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/demo", CLUSTERS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Not found: demo.", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let err = api.delete_cluster(demo()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_node_pools_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/demo/nodePools", CLUSTERS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nodePools": [{"name": "default-pool", "status": "RUNNING", "version": "1.29.4"}]
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let pools = api.list_node_pools(demo()).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].name, "default-pool");
    }

    #[tokio::test]
    async fn test_server_error_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/demo", CLUSTERS)))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), None).unwrap();
        let err = api.get_cluster(demo()).await.unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "backend unavailable");
    }

    #[tokio::test]
    async fn test_slow_response_hits_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CLUSTERS))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let api = ApiClient::with_timeout(&server.uri(), None, Duration::from_millis(50)).unwrap();
        let err = api.list_clusters("proj", "us-central1-a").await.unwrap_err();
        assert!(err.status.is_none());
    }
}
