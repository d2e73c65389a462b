//! In-memory cluster backend for lifecycle tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sparkify_infra::{
    ClusterBackend, ClusterCreation, ClusterDescription, ClusterRequest, ClusterStatus,
    InfraError, Result, RoleCreation,
};

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";
pub const ENDPOINT: &str = "dwhcluster.abc123.us-west-2.redshift.amazonaws.com";

#[derive(Debug, Default)]
struct State {
    role_exists: bool,
    policy_attached: bool,
    cluster: Option<ClusterDescription>,
    /// Statuses the backend moves through, one per describe call.
    script: VecDeque<ClusterStatus>,
    calls: Vec<String>,
    violations: Vec<String>,
    fail_attach: bool,
}

/// Backend that records every call and walks a scripted status sequence.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing role and a cluster in `status`.
    pub fn with_cluster(status: ClusterStatus) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state.lock().unwrap();
            state.role_exists = true;
            state.policy_attached = true;
            state.cluster = Some(description(status));
        }
        backend
    }

    pub fn with_role() -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().role_exists = true;
        backend
    }

    /// Statuses reported by successive describe calls. `Absent` removes the cluster.
    pub fn script(&self, statuses: impl IntoIterator<Item = ClusterStatus>) {
        self.state.lock().unwrap().script.extend(statuses);
    }

    pub fn fail_attach(&self) {
        self.state.lock().unwrap().fail_attach = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn violations(&self) -> Vec<String> {
        self.state.lock().unwrap().violations.clone()
    }

    pub fn role_exists(&self) -> bool {
        self.state.lock().unwrap().role_exists
    }

    pub fn cluster_exists(&self) -> bool {
        self.state.lock().unwrap().cluster.is_some()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

pub fn request() -> ClusterRequest {
    ClusterRequest {
        identifier: "dwhCluster".into(),
        cluster_type: "multi-node".into(),
        node_type: "dc2.large".into(),
        num_nodes: 4,
        db_name: "dwh".into(),
        master_username: "dwhuser".into(),
        master_password: "Passw0rd".into(),
        role_name: "dwhRole".into(),
    }
}

fn description(status: ClusterStatus) -> ClusterDescription {
    let available = status == ClusterStatus::Available;
    ClusterDescription {
        identifier: "dwhCluster".into(),
        status,
        endpoint: available.then(|| ENDPOINT.to_string()),
        port: available.then_some(5439),
        iam_role_arns: vec![ROLE_ARN.to_string()],
    }
}

#[async_trait]
impl ClusterBackend for FakeBackend {
    async fn create_role(&self, _role_name: &str) -> Result<RoleCreation> {
        self.record("create_role");
        let mut state = self.state.lock().unwrap();
        if state.role_exists {
            return Ok(RoleCreation::AlreadyExists);
        }
        state.role_exists = true;
        Ok(RoleCreation::Created)
    }

    async fn attach_role_policy(&self, _role_name: &str, _policy_arn: &str) -> Result<()> {
        self.record("attach_role_policy");
        let mut state = self.state.lock().unwrap();
        if state.fail_attach {
            return Err(InfraError::Api {
                operation: "iam:AttachRolePolicy",
                message: "AccessDenied".into(),
            });
        }
        state.policy_attached = true;
        Ok(())
    }

    async fn detach_role_policy(&self, _role_name: &str, _policy_arn: &str) -> Result<()> {
        self.record("detach_role_policy");
        let mut state = self.state.lock().unwrap();
        if state.cluster.is_some() {
            state
                .violations
                .push("policy detached while cluster present".into());
        }
        state.policy_attached = false;
        Ok(())
    }

    async fn delete_role(&self, _role_name: &str) -> Result<()> {
        self.record("delete_role");
        let mut state = self.state.lock().unwrap();
        if state.cluster.is_some() {
            state
                .violations
                .push("role deleted while cluster present".into());
        }
        state.role_exists = false;
        Ok(())
    }

    async fn get_role_arn(&self, role_name: &str) -> Result<String> {
        self.record("get_role_arn");
        if self.state.lock().unwrap().role_exists {
            Ok(ROLE_ARN.to_string())
        } else {
            Err(InfraError::RoleArnMissing {
                role: role_name.to_string(),
            })
        }
    }

    async fn create_cluster(
        &self,
        _request: &ClusterRequest,
        _role_arn: &str,
    ) -> Result<ClusterCreation> {
        self.record("create_cluster");
        let mut state = self.state.lock().unwrap();
        if state.cluster.is_some() {
            return Ok(ClusterCreation::AlreadyExists);
        }
        state.cluster = Some(description(ClusterStatus::Creating));
        Ok(ClusterCreation::Requested)
    }

    async fn describe_cluster(&self, _identifier: &str) -> Result<Option<ClusterDescription>> {
        self.record("describe_cluster");
        let mut state = self.state.lock().unwrap();
        if let Some(next) = state.script.pop_front() {
            state.cluster = match next {
                ClusterStatus::Absent => None,
                status => Some(description(status)),
            };
        }
        Ok(state.cluster.clone())
    }

    async fn delete_cluster(&self, _identifier: &str) -> Result<()> {
        self.record("delete_cluster");
        let mut state = self.state.lock().unwrap();
        if let Some(cluster) = state.cluster.as_mut() {
            cluster.status = ClusterStatus::Deleting;
            cluster.endpoint = None;
        }
        Ok(())
    }
}
