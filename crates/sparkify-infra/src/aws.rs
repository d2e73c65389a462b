//! IAM and Redshift implementation of [`ClusterBackend`].

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::config::Credentials;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::operation::create_role::CreateRoleError;
use aws_sdk_iam::operation::delete_role::DeleteRoleError;
use aws_sdk_iam::operation::detach_role_policy::DetachRolePolicyError;
use aws_sdk_redshift::operation::create_cluster::CreateClusterError;
use aws_sdk_redshift::operation::delete_cluster::DeleteClusterError;
use aws_sdk_redshift::operation::describe_clusters::DescribeClustersError;
use aws_sdk_redshift::types::Cluster;
use sparkify_core::AwsCredentials;
use tracing::{debug, instrument};

use crate::backend::{ClusterBackend, ClusterCreation, RoleCreation};
use crate::cluster::{ClusterDescription, ClusterRequest, ClusterStatus};
use crate::error::{InfraError, Result};
use crate::policy::{trust_policy_document, ROLE_DESCRIPTION};

/// Talks to IAM for the access role and Redshift for the cluster.
#[derive(Debug, Clone)]
pub struct AwsClusterBackend {
    iam: aws_sdk_iam::Client,
    redshift: aws_sdk_redshift::Client,
}

impl AwsClusterBackend {
    /// Build both clients from explicitly supplied credentials.
    pub async fn connect(credentials: &AwsCredentials) -> Self {
        let provider = Credentials::new(
            credentials.key.clone(),
            credentials.secret.clone(),
            None,
            None,
            "sparkify-config",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;

        debug!(region = %credentials.region, "Created IAM and Redshift clients");

        Self {
            iam: aws_sdk_iam::Client::new(&shared),
            redshift: aws_sdk_redshift::Client::new(&shared),
        }
    }
}

fn api_error<E>(operation: &'static str, err: &E) -> InfraError
where
    E: std::error::Error,
{
    InfraError::Api {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

fn describe(cluster: &Cluster) -> ClusterDescription {
    let endpoint = cluster.endpoint();
    ClusterDescription {
        identifier: cluster.cluster_identifier().unwrap_or_default().to_string(),
        status: cluster
            .cluster_status()
            .map_or(ClusterStatus::Other("unknown".into()), ClusterStatus::parse),
        endpoint: endpoint.and_then(|e| e.address()).map(ToString::to_string),
        port: endpoint
            .and_then(|e| e.port())
            .and_then(|p| u16::try_from(p).ok()),
        iam_role_arns: cluster
            .iam_roles()
            .iter()
            .filter_map(|r| r.iam_role_arn())
            .map(ToString::to_string)
            .collect(),
    }
}

#[async_trait]
impl ClusterBackend for AwsClusterBackend {
    #[instrument(skip(self))]
    async fn create_role(&self, role_name: &str) -> Result<RoleCreation> {
        let result = self
            .iam
            .create_role()
            .path("/")
            .role_name(role_name)
            .description(ROLE_DESCRIPTION)
            .assume_role_policy_document(trust_policy_document())
            .send()
            .await;

        match result {
            Ok(_) => Ok(RoleCreation::Created),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateRoleError::is_entity_already_exists_exception) =>
            {
                Ok(RoleCreation::AlreadyExists)
            }
            Err(err) => Err(api_error("iam:CreateRole", &err)),
        }
    }

    #[instrument(skip(self))]
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.iam
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|err| api_error("iam:AttachRolePolicy", &err))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        let result = self
            .iam
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DetachRolePolicyError::is_no_such_entity_exception) =>
            {
                debug!("Policy was not attached");
                Ok(())
            }
            Err(err) => Err(api_error("iam:DetachRolePolicy", &err)),
        }
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, role_name: &str) -> Result<()> {
        let result = self.iam.delete_role().role_name(role_name).send().await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DeleteRoleError::is_no_such_entity_exception) =>
            {
                debug!("Role did not exist");
                Ok(())
            }
            Err(err) => Err(api_error("iam:DeleteRole", &err)),
        }
    }

    #[instrument(skip(self))]
    async fn get_role_arn(&self, role_name: &str) -> Result<String> {
        let output = self
            .iam
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|err| api_error("iam:GetRole", &err))?;

        output
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| InfraError::RoleArnMissing {
                role: role_name.to_string(),
            })
    }

    #[instrument(skip(self, request), fields(cluster_id = %request.identifier))]
    async fn create_cluster(
        &self,
        request: &ClusterRequest,
        role_arn: &str,
    ) -> Result<ClusterCreation> {
        let mut builder = self
            .redshift
            .create_cluster()
            .cluster_type(&request.cluster_type)
            .node_type(&request.node_type)
            .db_name(&request.db_name)
            .cluster_identifier(&request.identifier)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .iam_roles(role_arn);

        if request.is_multi_node() {
            let nodes = i32::try_from(request.num_nodes).map_err(|_| InfraError::Api {
                operation: "redshift:CreateCluster",
                message: format!("node count {} out of range", request.num_nodes),
            })?;
            builder = builder.number_of_nodes(nodes);
        }

        match builder.send().await {
            Ok(_) => Ok(ClusterCreation::Requested),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateClusterError::is_cluster_already_exists_fault) =>
            {
                Ok(ClusterCreation::AlreadyExists)
            }
            Err(err) => Err(api_error("redshift:CreateCluster", &err)),
        }
    }

    async fn describe_cluster(&self, identifier: &str) -> Result<Option<ClusterDescription>> {
        let result = self
            .redshift
            .describe_clusters()
            .cluster_identifier(identifier)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.clusters().first().map(describe)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DescribeClustersError::is_cluster_not_found_fault) =>
            {
                Ok(None)
            }
            Err(err) => Err(api_error("redshift:DescribeClusters", &err)),
        }
    }

    #[instrument(skip(self))]
    async fn delete_cluster(&self, identifier: &str) -> Result<()> {
        let result = self
            .redshift
            .delete_cluster()
            .cluster_identifier(identifier)
            .skip_final_cluster_snapshot(true)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DeleteClusterError::is_cluster_not_found_fault) =>
            {
                debug!("Cluster already gone");
                Ok(())
            }
            Err(err) => Err(api_error("redshift:DeleteCluster", &err)),
        }
    }
}
