///! Credential resolution
///!
///! Picks a token provider for the control-plane client: an explicit service
///! account key file, inline key JSON materialized to a temporary file, or the
///! application default credentials.

use gcp_auth::{CustomServiceAccount, TokenProvider};
use gke_common::{ClusterSpec, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolve the token provider for a spec.
///
/// `credential_json` is written to a temporary key file whose path is stored
/// in `spec.temp_credential_path`. The file is removed again if it cannot be
/// loaded; otherwise hold a [`TempCredentialGuard`] for the rest of the run.
pub async fn resolve(
    spec: &mut ClusterSpec,
    credential_json: Option<&str>,
) -> Result<Arc<dyn TokenProvider>> {
    if let Some(content) = credential_json {
        let path = materialize_credential(content)?;
        debug!(path = %path.display(), "Wrote temporary credential file");
        spec.temp_credential_path = Some(path);
    }

    let key_file = spec
        .temp_credential_path
        .as_ref()
        .or(spec.credential_path.as_ref());

    match key_file {
        Some(path) => {
            let provider = service_account(path);
            if provider.is_err() {
                remove_temp_credential(spec);
            }
            provider
        }
        None => {
            info!("Using application default credentials");
            gcp_auth::provider()
                .await
                .map_err(|e| Error::Auth(format!("GCP auth initialization failed: {}", e)))
        }
    }
}

fn service_account(path: &Path) -> Result<Arc<dyn TokenProvider>> {
    info!(path = %path.display(), "Using service account key file");
    let account = CustomServiceAccount::from_file(path).map_err(|e| {
        Error::Auth(format!(
            "could not load service account key {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(Arc::new(account))
}

/// Write key JSON to a temporary file that outlives this process
pub fn materialize_credential(content: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("gkectl-credential-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
    Ok(path)
}

/// Remove the temporary credential file, ignoring failures
pub fn remove_temp_credential(spec: &ClusterSpec) {
    if let Some(path) = &spec.temp_credential_path {
        if let Err(e) = std::fs::remove_file(path) {
            debug!(path = %path.display(), error = %e, "Could not remove temporary credential file");
        }
    }
}

/// Removes the temporary credential file when the command finishes
pub struct TempCredentialGuard {
    path: Option<PathBuf>,
}

impl TempCredentialGuard {
    pub fn new(spec: &ClusterSpec) -> Self {
        Self {
            path: spec.temp_credential_path.clone(),
        }
    }
}

impl Drop for TempCredentialGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %e, "Could not remove temporary credential file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_and_remove() {
        let path = materialize_credential(r#"{"type": "service_account"}"#).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"type": "service_account"}"#
        );

        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        spec.temp_credential_path = Some(path.clone());
        remove_temp_credential(&spec);
        assert!(!path.exists());

        // Second removal is silent
        remove_temp_credential(&spec);
    }

    #[tokio::test]
    async fn test_invalid_key_file_is_auth_error() {
        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        let result = resolve(&mut spec, Some("not json")).await;
        assert!(matches!(result, Err(Error::Auth(_))));

        let path = spec.temp_credential_path.as_ref().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_guard_removes_credential_after_command() {
        let path = materialize_credential("{}").unwrap();
        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        spec.temp_credential_path = Some(path.clone());

        {
            let _guard = TempCredentialGuard::new(&spec);
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_guard_after_delete_is_silent() {
        let path = materialize_credential("{}").unwrap();
        let mut spec = ClusterSpec::new("proj", "zone", "demo");
        spec.temp_credential_path = Some(path.clone());

        let guard = TempCredentialGuard::new(&spec);
        remove_temp_credential(&spec);
        drop(guard);
        assert!(!path.exists());
    }
}
