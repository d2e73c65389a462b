//! Pipeline configuration.
//!
//! The configuration is a single value grouped into sections. It is read once
//! at startup, optionally overridden from environment variables, and then
//! passed by reference to every component that needs it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Entry points whose required keys can be checked up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Create the access role and the warehouse cluster.
    Provision,
    /// Delete the cluster and its access role.
    Teardown,
    /// Reset the schema and run the staged load.
    Warehouse,
    /// Run the partitioned batch transform.
    Lake,
}

/// Credentials and region for the managed services.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsCredentials {
    /// Access key id.
    pub key: String,
    /// Secret access key.
    pub secret: String,
    /// Region the cluster and buckets live in.
    pub region: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Parameters for the warehouse cluster resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// `single-node` or `multi-node`.
    pub cluster_type: String,
    /// Node type, e.g. `dc2.large`.
    pub node_type: String,
    /// Number of nodes (ignored by the backend for single-node clusters).
    pub num_nodes: u32,
    /// Cluster identifier.
    pub identifier: String,
    /// Name of the access role attached to the cluster.
    pub iam_role_name: String,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            cluster_type: "multi-node".into(),
            node_type: "dc2.large".into(),
            num_nodes: 4,
            identifier: "dwhCluster".into(),
            iam_role_name: "dwhRole".into(),
        }
    }
}

/// Database connection parameters for the warehouse.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseParams {
    /// Endpoint address. Only known once the cluster is available.
    pub host: Option<String>,
    /// Database name.
    pub db_name: String,
    /// Master user name.
    pub db_user: String,
    /// Master user password.
    pub db_password: String,
    /// Database port.
    pub port: u16,
    /// ARN of the role the warehouse uses to read object storage.
    pub iam_role_arn: Option<String>,
}

impl Default for WarehouseParams {
    fn default() -> Self {
        Self {
            host: None,
            db_name: "dwh".into(),
            db_user: "dwhuser".into(),
            db_password: String::new(),
            port: 5439,
            iam_role_arn: None,
        }
    }
}

impl fmt::Debug for WarehouseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseParams")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("port", &self.port)
            .field("iam_role_arn", &self.iam_role_arn)
            .finish()
    }
}

impl WarehouseParams {
    /// The `host=.. dbname=.. user=.. password=.. port=..` connection string
    /// with the password masked, for logging.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if the host is not known yet.
    pub fn redacted_connection_string(&self) -> Result<String> {
        let host = self.host.as_deref().ok_or(ConfigError::MissingKey {
            section: "warehouse",
            key: "host",
        })?;
        Ok(format!(
            "host={host} dbname={} user={} password=*** port={}",
            self.db_name, self.db_user, self.port
        ))
    }
}

/// Object storage locations read and written by both pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageLocations {
    /// Prefix of the raw event logs bulk-copied into `staging_events`.
    pub log_data: String,
    /// JSONPaths file describing the event log layout.
    pub log_jsonpath: String,
    /// Prefix of the raw song catalog bulk-copied into `staging_songs`.
    pub song_data: String,
    /// Root holding `song_data/` and `log_data/` for the batch transform.
    pub input_data: String,
    /// Root the batch transform writes its partitioned tables under.
    pub output_data: String,
}

impl Default for StorageLocations {
    fn default() -> Self {
        Self {
            log_data: "s3://udacity-dend/log_data".into(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
            song_data: "s3://udacity-dend/song_data".into(),
            input_data: "s3a://udacity-dend/".into(),
            output_data: String::new(),
        }
    }
}

/// Bounds on the cluster status polling loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds to sleep between status checks.
    pub interval_secs: u64,
    /// Maximum number of status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_attempts: 90,
        }
    }
}

impl PollSettings {
    /// Interval between status checks.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Policy applied to row-count checkpoints.
///
/// In report mode (`enforce = false`) a shortfall is logged and the pipeline
/// carries on. In enforce mode it aborts the current stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Abort on a shortfall instead of only logging it.
    pub enforce: bool,
    /// Minimum number of rows every checked table must hold.
    pub min_rows: u64,
    /// Expected row counts per table name.
    pub expected: BTreeMap<String, u64>,
    /// Allowed relative deviation from `expected`, e.g. `0.05` for 5%.
    pub tolerance: f64,
}

impl ValidationPolicy {
    /// Check a count against the policy.
    ///
    /// Returns a description of the shortfall, or `None` if the count passes.
    #[must_use]
    pub fn evaluate(&self, table: &str, rows: u64) -> Option<String> {
        if rows < self.min_rows {
            return Some(format!("expected at least {} rows", self.min_rows));
        }

        let expected = *self.expected.get(table)?;
        #[allow(clippy::cast_precision_loss)]
        let deviation = (rows as f64 - expected as f64).abs();
        #[allow(clippy::cast_precision_loss)]
        let allowed = expected as f64 * self.tolerance;
        (deviation > allowed).then(|| {
            format!(
                "expected {expected} rows within a tolerance of {}",
                self.tolerance
            )
        })
    }
}

/// The complete configuration for every entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Credentials for the managed services.
    pub aws: AwsCredentials,
    /// Cluster resource parameters.
    pub cluster: ClusterParams,
    /// Database connection parameters.
    pub warehouse: WarehouseParams,
    /// Object storage locations.
    pub storage: StorageLocations,
    /// Status polling bounds.
    pub polling: PollSettings,
    /// Row-count checkpoint policy.
    pub validation: ValidationPolicy,
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from a JSON file, then apply process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an override is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AWS_ACCESS_KEY_ID") {
            self.aws.key = v;
        }
        if let Some(v) = lookup("AWS_SECRET_ACCESS_KEY") {
            self.aws.secret = v;
        }
        if let Some(v) = lookup("AWS_REGION") {
            self.aws.region = v;
        }
        if let Some(v) = lookup("DWH_HOST") {
            self.warehouse.host = Some(v);
        }
        if let Some(v) = lookup("DWH_DB_PASSWORD") {
            self.warehouse.db_password = v;
        }
        if let Some(v) = lookup("DWH_PORT") {
            self.warehouse.port = v.parse().map_err(|e| ConfigError::InvalidValue {
                section: "warehouse",
                key: "port",
                message: format!("{v:?}: {e}"),
            })?;
        }
        if let Some(v) = lookup("DWH_IAM_ROLE_ARN") {
            self.warehouse.iam_role_arn = Some(v);
        }
        if let Some(v) = lookup("LAKE_INPUT_DATA") {
            self.storage.input_data = v;
        }
        if let Some(v) = lookup("LAKE_OUTPUT_DATA") {
            self.storage.output_data = v;
        }
        Ok(())
    }

    /// Check that every key needed by `target` is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing key as `ConfigError::MissingKey`.
    pub fn validate_for(&self, target: Target) -> Result<()> {
        match target {
            Target::Provision | Target::Teardown => {
                self.require_aws()?;
                require("cluster", "identifier", &self.cluster.identifier)?;
                require("cluster", "iam_role_name", &self.cluster.iam_role_name)?;
                if target == Target::Provision {
                    require("cluster", "cluster_type", &self.cluster.cluster_type)?;
                    require("cluster", "node_type", &self.cluster.node_type)?;
                    require("warehouse", "db_name", &self.warehouse.db_name)?;
                    require("warehouse", "db_user", &self.warehouse.db_user)?;
                    require("warehouse", "db_password", &self.warehouse.db_password)?;
                }
            }
            Target::Warehouse => {
                require("warehouse", "db_name", &self.warehouse.db_name)?;
                require("warehouse", "db_user", &self.warehouse.db_user)?;
                require("warehouse", "db_password", &self.warehouse.db_password)?;
                require("aws", "region", &self.aws.region)?;
                require("storage", "log_data", &self.storage.log_data)?;
                require("storage", "log_jsonpath", &self.storage.log_jsonpath)?;
                require("storage", "song_data", &self.storage.song_data)?;
            }
            Target::Lake => {
                require("storage", "input_data", &self.storage.input_data)?;
                require("storage", "output_data", &self.storage.output_data)?;
            }
        }
        Ok(())
    }

    fn require_aws(&self) -> Result<()> {
        require("aws", "key", &self.aws.key)?;
        require("aws", "secret", &self.aws.secret)?;
        require("aws", "region", &self.aws.region)
    }
}

fn require(section: &'static str, key: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingKey { section, key });
    }
    Ok(())
}
