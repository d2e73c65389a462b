//! Provisioning and teardown of the warehouse cluster.

use std::time::Duration;

use chrono::Utc;
use sparkify_core::{PollSettings, Progress};
use tracing::{debug, info, instrument, warn};

use crate::backend::{ClusterBackend, ClusterCreation, RoleCreation};
use crate::cluster::{ClusterDescription, ClusterHandle, ClusterRequest, ClusterStatus};
use crate::error::{InfraError, Result};
use crate::policy::S3_READ_ONLY_POLICY_ARN;

/// How often and how long to poll the cluster status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between status checks.
    pub interval: Duration,
    /// Status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollSettings::default().into()
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self {
            interval: settings.interval(),
            max_attempts: settings.max_attempts.max(1),
        }
    }
}

/// Drives the access role and cluster through their lifecycle.
#[derive(Debug)]
pub struct ClusterManager<B> {
    backend: B,
    request: ClusterRequest,
    poll: PollPolicy,
}

impl<B: ClusterBackend> ClusterManager<B> {
    /// Create a manager for the cluster described by `request`.
    #[must_use]
    pub fn new(backend: B, request: ClusterRequest) -> Self {
        Self {
            backend,
            request,
            poll: PollPolicy::default(),
        }
    }

    /// Set the status polling bounds.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// The backend this manager drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the role, attach the storage policy, create the cluster and wait
    /// until it is available.
    ///
    /// Safe to rerun: an existing role or cluster is reused.
    ///
    /// # Errors
    ///
    /// Returns an error if a managed-service call fails, if the cluster enters
    /// `deleting` while being waited on, or if it is not available within the
    /// poll budget.
    #[instrument(skip(self), fields(cluster_id = %self.request.identifier))]
    pub async fn provision(&self) -> Result<ClusterHandle> {
        let mut progress = Progress::new(5);
        let role = &self.request.role_name;

        match self.backend.create_role(role).await? {
            RoleCreation::Created => info!(role = %role, "Created access role"),
            RoleCreation::AlreadyExists => info!(role = %role, "Reusing existing access role"),
        }
        progress.advance("Role Created");

        self.backend
            .attach_role_policy(role, S3_READ_ONLY_POLICY_ARN)
            .await?;
        progress.advance("Policy Attached");

        let role_arn = self.backend.get_role_arn(role).await?;
        progress.advance("Role ARN Saved");

        match self.backend.create_cluster(&self.request, &role_arn).await? {
            ClusterCreation::Requested => info!("Cluster creation requested"),
            ClusterCreation::AlreadyExists => info!("Cluster already exists, waiting for it"),
        }
        progress.advance("Cluster Requested");

        let cluster = self.wait_until_available().await?;
        progress.advance("Cluster Available");

        let endpoint = cluster
            .endpoint
            .ok_or_else(|| InfraError::EndpointMissing {
                cluster_id: self.request.identifier.clone(),
            })?;
        let role_arn = cluster.iam_role_arns.into_iter().next().unwrap_or(role_arn);

        info!(endpoint = %endpoint, role_arn = %role_arn, "Cluster is available");

        Ok(ClusterHandle {
            cluster_id: self.request.identifier.clone(),
            endpoint,
            port: cluster.port,
            role_arn,
            provisioned_at: Utc::now(),
        })
    }

    /// Delete the cluster, wait until it is gone, then remove the role.
    ///
    /// The role is only touched once the backend stops reporting the cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if a managed-service call fails or the cluster is
    /// still present after the poll budget.
    #[instrument(skip(self), fields(cluster_id = %self.request.identifier))]
    pub async fn teardown(&self) -> Result<()> {
        let mut progress = Progress::new(3);
        let identifier = &self.request.identifier;

        if self.backend.describe_cluster(identifier).await?.is_some() {
            self.backend.delete_cluster(identifier).await?;
            info!("Cluster deletion requested");
            self.wait_until_absent().await?;
        } else {
            info!("Cluster already absent");
        }
        progress.advance("Cluster Deleted");

        let role = &self.request.role_name;
        self.backend
            .detach_role_policy(role, S3_READ_ONLY_POLICY_ARN)
            .await?;
        progress.advance("Policy Detached");

        self.backend.delete_role(role).await?;
        progress.advance("Role Deleted");

        Ok(())
    }

    /// Current cluster status, `Absent` if the backend does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the describe call fails.
    pub async fn status(&self) -> Result<ClusterStatus> {
        Ok(self
            .backend
            .describe_cluster(&self.request.identifier)
            .await?
            .map_or(ClusterStatus::Absent, |c| c.status))
    }

    async fn wait_until_available(&self) -> Result<ClusterDescription> {
        let identifier = &self.request.identifier;

        for attempt in 1..=self.poll.max_attempts {
            match self.backend.describe_cluster(identifier).await? {
                Some(cluster) if cluster.status == ClusterStatus::Available => return Ok(cluster),
                Some(cluster) if cluster.status == ClusterStatus::Deleting => {
                    return Err(InfraError::UnexpectedStatus {
                        cluster_id: identifier.clone(),
                        status: cluster.status,
                        target: ClusterStatus::Available,
                    });
                }
                Some(cluster) => {
                    info!(status = %cluster.status, attempt, "Waiting for cluster");
                }
                None => {
                    warn!(attempt, "Cluster not visible yet");
                }
            }
            self.pause(attempt).await;
        }

        Err(InfraError::PollTimeout {
            cluster_id: identifier.clone(),
            target: ClusterStatus::Available,
            attempts: self.poll.max_attempts,
        })
    }

    async fn wait_until_absent(&self) -> Result<()> {
        let identifier = &self.request.identifier;

        for attempt in 1..=self.poll.max_attempts {
            match self.backend.describe_cluster(identifier).await? {
                None => {
                    info!("Cluster deleted");
                    return Ok(());
                }
                Some(cluster) => {
                    info!(status = %cluster.status, attempt, "Waiting for cluster deletion");
                }
            }
            self.pause(attempt).await;
        }

        Err(InfraError::PollTimeout {
            cluster_id: identifier.clone(),
            target: ClusterStatus::Absent,
            attempts: self.poll.max_attempts,
        })
    }

    async fn pause(&self, attempt: u32) {
        if attempt < self.poll.max_attempts {
            debug!(interval = ?self.poll.interval, "Sleeping before next status check");
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}
