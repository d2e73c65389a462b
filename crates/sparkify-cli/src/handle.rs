//! Saved cluster handles.

use std::fs;
use std::path::Path;

use sparkify_core::PipelineConfig;
use sparkify_infra::ClusterHandle;
use tracing::info;

use crate::error::{CliError, Result};

/// Read a handle written by [`save`].
///
/// # Errors
///
/// Returns `CliError::Handle` if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<ClusterHandle> {
    let text = fs::read_to_string(path).map_err(|e| handle_error(path, &e))?;
    serde_json::from_str(&text).map_err(|e| handle_error(path, &e))
}

/// Write `handle` as pretty JSON.
///
/// # Errors
///
/// Returns `CliError::Handle` if the file cannot be written.
pub fn save(path: &Path, handle: &ClusterHandle) -> Result<()> {
    let text = serde_json::to_string_pretty(handle).map_err(|e| handle_error(path, &e))?;
    fs::write(path, text).map_err(|e| handle_error(path, &e))?;
    info!(path = %path.display(), "Saved cluster handle");
    Ok(())
}

/// Point the warehouse section at the cluster in the handle file, if any.
///
/// # Errors
///
/// Returns `CliError::Handle` if the file cannot be read or parsed.
pub fn apply(config: &mut PipelineConfig, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        let handle = load(path)?;
        handle.apply_to(&mut config.warehouse);
        info!(
            cluster_id = %handle.cluster_id,
            endpoint = %handle.endpoint,
            "Using saved cluster handle"
        );
    }
    Ok(())
}

fn handle_error(path: &Path, err: &dyn std::error::Error) -> CliError {
    CliError::Handle {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
