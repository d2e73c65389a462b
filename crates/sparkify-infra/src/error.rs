//! Error types for cluster lifecycle management.

use crate::cluster::ClusterStatus;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, InfraError>;

/// Errors that can occur while provisioning or tearing down the cluster.
#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    /// A managed-service call failed.
    #[error("{operation} failed: {message}")]
    Api {
        /// The API operation, e.g. `redshift:CreateCluster`.
        operation: &'static str,
        /// Error message reported by the service.
        message: String,
    },

    /// The role exists but the service returned no ARN for it.
    #[error("role {role} has no ARN")]
    RoleArnMissing {
        /// Role name.
        role: String,
    },

    /// The cluster reports `available` without an endpoint address.
    #[error("cluster {cluster_id} is available but has no endpoint")]
    EndpointMissing {
        /// Cluster identifier.
        cluster_id: String,
    },

    /// The cluster did not reach the awaited state within the poll budget.
    #[error("cluster {cluster_id} did not become {target} after {attempts} status checks")]
    PollTimeout {
        /// Cluster identifier.
        cluster_id: String,
        /// The state being waited for.
        target: ClusterStatus,
        /// Number of status checks made.
        attempts: u32,
    },

    /// The cluster moved to a state it cannot come back from on its own.
    #[error("cluster {cluster_id} entered {status} while waiting for {target}")]
    UnexpectedStatus {
        /// Cluster identifier.
        cluster_id: String,
        /// The state observed.
        status: ClusterStatus,
        /// The state being waited for.
        target: ClusterStatus,
    },
}
