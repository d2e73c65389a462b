//! The managed-service surface the lifecycle manager drives.

use async_trait::async_trait;

use crate::cluster::{ClusterDescription, ClusterRequest};
use crate::error::Result;

/// Outcome of a role creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCreation {
    /// The role was created.
    Created,
    /// A role with that name already existed and is reused.
    AlreadyExists,
}

/// Outcome of a cluster creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterCreation {
    /// Creation was accepted.
    Requested,
    /// A cluster with that identifier already exists.
    AlreadyExists,
}

/// Access-role and cluster operations of the managed backend.
///
/// Every call is a single blocking request; none of them wait for the
/// resource to settle. Waiting is the manager's job.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Create the access role the cluster assumes.
    async fn create_role(&self, role_name: &str) -> Result<RoleCreation>;

    /// Attach a managed policy to the role.
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;

    /// Detach a managed policy from the role. A missing role or attachment is not an error.
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;

    /// Delete the role. A missing role is not an error.
    async fn delete_role(&self, role_name: &str) -> Result<()>;

    /// Look up the role's ARN.
    async fn get_role_arn(&self, role_name: &str) -> Result<String>;

    /// Request cluster creation with the role attached.
    async fn create_cluster(&self, request: &ClusterRequest, role_arn: &str)
        -> Result<ClusterCreation>;

    /// Describe the cluster, or `None` if the backend does not know it.
    async fn describe_cluster(&self, identifier: &str) -> Result<Option<ClusterDescription>>;

    /// Request cluster deletion without a final snapshot.
    async fn delete_cluster(&self, identifier: &str) -> Result<()>;
}
