//! Access role policy documents.

/// Managed policy granting the warehouse read-only access to object storage.
pub const S3_READ_ONLY_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess";

/// Description attached to the access role.
pub const ROLE_DESCRIPTION: &str = "Allows Redshift clusters to call AWS services on your behalf.";

/// Trust policy letting the warehouse service assume the role.
#[must_use]
pub fn trust_policy_document() -> String {
    serde_json::json!({
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "Service": "redshift.amazonaws.com" }
        }],
        "Version": "2012-10-17"
    })
    .to_string()
}
