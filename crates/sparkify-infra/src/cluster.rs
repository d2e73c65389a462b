//! Cluster resource model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sparkify_core::{PipelineConfig, WarehouseParams};

/// Lifecycle state of the cluster as reported by the backend.
///
/// Valid transitions: `Absent -> Creating -> Available -> Deleting -> Absent`.
/// The backend drives every transition; the manager only observes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    /// Creation requested, not yet usable.
    Creating,
    /// Accepting connections.
    Available,
    /// Deletion requested.
    Deleting,
    /// The backend no longer knows the cluster.
    Absent,
    /// Any other status string (`modifying`, `rebooting`, ...).
    Other(String),
}

impl ClusterStatus {
    /// Parse the backend status string.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "creating" => ClusterStatus::Creating,
            "available" => ClusterStatus::Available,
            "deleting" => ClusterStatus::Deleting,
            other => ClusterStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Creating => f.write_str("creating"),
            ClusterStatus::Available => f.write_str("available"),
            ClusterStatus::Deleting => f.write_str("deleting"),
            ClusterStatus::Absent => f.write_str("absent"),
            ClusterStatus::Other(status) => f.write_str(status),
        }
    }
}

/// Snapshot of the cluster returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescription {
    /// Cluster identifier.
    pub identifier: String,
    /// Current status.
    pub status: ClusterStatus,
    /// Endpoint address, present once the cluster is available.
    pub endpoint: Option<String>,
    /// Endpoint port, present once the cluster is available.
    pub port: Option<u16>,
    /// ARNs of the roles attached to the cluster.
    pub iam_role_arns: Vec<String>,
}

/// Everything needed to request the cluster and its access role.
#[derive(Clone)]
pub struct ClusterRequest {
    /// Cluster identifier.
    pub identifier: String,
    /// `single-node` or `multi-node`.
    pub cluster_type: String,
    /// Node type.
    pub node_type: String,
    /// Number of nodes.
    pub num_nodes: u32,
    /// Database created with the cluster.
    pub db_name: String,
    /// Master user name.
    pub master_username: String,
    /// Master user password.
    pub master_password: String,
    /// Access role name.
    pub role_name: String,
}

impl fmt::Debug for ClusterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRequest")
            .field("identifier", &self.identifier)
            .field("cluster_type", &self.cluster_type)
            .field("node_type", &self.node_type)
            .field("num_nodes", &self.num_nodes)
            .field("db_name", &self.db_name)
            .field("master_username", &self.master_username)
            .field("master_password", &"<redacted>")
            .field("role_name", &self.role_name)
            .finish()
    }
}

impl ClusterRequest {
    /// Build the request from the cluster and warehouse sections.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            identifier: config.cluster.identifier.clone(),
            cluster_type: config.cluster.cluster_type.clone(),
            node_type: config.cluster.node_type.clone(),
            num_nodes: config.cluster.num_nodes,
            db_name: config.warehouse.db_name.clone(),
            master_username: config.warehouse.db_user.clone(),
            master_password: config.warehouse.db_password.clone(),
            role_name: config.cluster.iam_role_name.clone(),
        }
    }

    /// Whether the backend expects a node count.
    #[must_use]
    pub fn is_multi_node(&self) -> bool {
        self.cluster_type == "multi-node"
    }
}

/// Connection details of an available cluster.
///
/// Saved by `provision` so later runs can connect without copying the
/// endpoint and role ARN into the configuration by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHandle {
    /// Cluster identifier.
    pub cluster_id: String,
    /// Endpoint address.
    pub endpoint: String,
    /// Endpoint port, if the backend reported one.
    pub port: Option<u16>,
    /// ARN of the role attached to the cluster.
    pub role_arn: String,
    /// When the cluster was observed available.
    pub provisioned_at: DateTime<Utc>,
}

impl ClusterHandle {
    /// Fill the endpoint, port and role ARN into warehouse parameters.
    pub fn apply_to(&self, params: &mut WarehouseParams) {
        params.host = Some(self.endpoint.clone());
        if let Some(port) = self.port {
            params.port = port;
        }
        params.iam_role_arn = Some(self.role_arn.clone());
    }
}
