//! Warehouse cluster lifecycle for sparkify.
//!
//! This crate creates the access role the warehouse uses to read object
//! storage, provisions the cluster with that role attached, waits for it to
//! become available, and tears both down again in the opposite order.
//!
//! The managed services sit behind the [`ClusterBackend`] trait;
//! [`AwsClusterBackend`] talks to IAM and Redshift.
//!
//! # Example
//!
//! ```no_run
//! use sparkify_core::PipelineConfig;
//! use sparkify_infra::{AwsClusterBackend, ClusterManager, ClusterRequest, PollPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load("dwh.json")?;
//! let backend = AwsClusterBackend::connect(&config.aws).await;
//! let manager = ClusterManager::new(backend, ClusterRequest::from_config(&config))
//!     .with_poll_policy(PollPolicy::from(config.polling));
//!
//! let handle = manager.provision().await?;
//! println!("Cluster endpoint: {}", handle.endpoint);
//!
//! manager.teardown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod aws;
mod backend;
mod cluster;
mod error;
mod lifecycle;
mod policy;

pub use aws::AwsClusterBackend;
pub use backend::{ClusterBackend, ClusterCreation, RoleCreation};
pub use cluster::{ClusterDescription, ClusterHandle, ClusterRequest, ClusterStatus};
pub use error::{InfraError, Result};
pub use lifecycle::{ClusterManager, PollPolicy};
pub use policy::{trust_policy_document, ROLE_DESCRIPTION, S3_READ_ONLY_POLICY_ARN};
