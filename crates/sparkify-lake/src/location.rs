//! Input and output roots.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use datafusion::prelude::SessionContext;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use sparkify_core::AwsCredentials;
use tracing::debug;
use url::Url;

use crate::error::{LakeError, Result};

/// A directory-like root in object storage or on the local filesystem.
///
/// `s3a://` and `s3n://` locations are read as `s3://`. Anything without a
/// scheme is a local directory, resolved against the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakeLocation {
    url: Url,
}

impl LakeLocation {
    /// Parse a configured location.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Location` if the location is empty, malformed, or
    /// uses a scheme other than `s3` or `file`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = |message: String| LakeError::Location {
            location: raw.to_string(),
            message,
        };

        if raw.is_empty() {
            return Err(invalid("location is empty".into()));
        }

        let mut url = if let Some(rest) = raw
            .strip_prefix("s3a://")
            .or_else(|| raw.strip_prefix("s3n://"))
        {
            Url::parse(&format!("s3://{rest}")).map_err(|e| invalid(e.to_string()))?
        } else if raw.contains("://") {
            Url::parse(raw).map_err(|e| invalid(e.to_string()))?
        } else {
            let path = absolute(Path::new(raw))?;
            Url::from_directory_path(&path)
                .map_err(|()| invalid(format!("{} is not a directory path", path.display())))?
        };

        match url.scheme() {
            "s3" => {
                if url.host_str().map_or(true, str::is_empty) {
                    return Err(invalid("missing bucket name".into()));
                }
            }
            "file" => {}
            other => return Err(invalid(format!("unsupported scheme {other}"))),
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { url })
    }

    /// The root as a URL, always ending in `/`.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the root is in S3.
    #[must_use]
    pub fn is_s3(&self) -> bool {
        self.url.scheme() == "s3"
    }

    /// URL of the directory `segment` under the root.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Location` if `segment` does not form a valid URL.
    pub fn join(&self, segment: &str) -> Result<Url> {
        self.url
            .join(&format!("{segment}/"))
            .map_err(|e| LakeError::Location {
                location: format!("{}{segment}", self.url),
                message: e.to_string(),
            })
    }

    /// Object store path of the directory `segment` under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not map to a store path.
    pub fn prefix(&self, segment: &str) -> Result<ObjectPath> {
        let url = self.join(segment)?;
        ObjectPath::from_url_path(url.path()).map_err(|e| LakeError::Location {
            location: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Make the root's store available to `ctx`.
    ///
    /// Local directories use the store every session already has. S3 roots
    /// get a store for their bucket built from `aws`; empty credentials fall
    /// back to the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the S3 store cannot be built.
    pub fn register(&self, ctx: &SessionContext, aws: &AwsCredentials) -> Result<()> {
        if !self.is_s3() {
            return Ok(());
        }

        let bucket = self.url.host_str().unwrap_or_default();
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if !aws.region.is_empty() {
            builder = builder.with_region(&aws.region);
        }
        if !aws.key.is_empty() {
            builder = builder
                .with_access_key_id(&aws.key)
                .with_secret_access_key(&aws.secret);
        }
        let store = builder.build()?;

        let bucket_url = Url::parse(&format!("s3://{bucket}")).map_err(|e| LakeError::Location {
            location: self.url.to_string(),
            message: e.to_string(),
        })?;
        ctx.register_object_store(&bucket_url, Arc::new(store));
        debug!(bucket = %bucket, "Registered S3 store");
        Ok(())
    }
}

impl fmt::Display for LakeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    // Drops `.` segments.
    Ok(joined.components().collect())
}
