use anyhow::{Context, Result};
use object_store::aws::{AmazonS3, AmazonS3Builder};

use super::S3Config;

/// Builds an S3 client, picking up credentials from the `AWS_*` environment.
pub fn s3_storage(s3: &S3Config) -> Result<AmazonS3> {
    let mut builder = AmazonS3Builder::from_env()
        .with_region(s3.region.as_str())
        .with_bucket_name(s3.bucket.as_str())
        .with_allow_http(s3.allow_http);

    // For supporting localstack/minio for testing
    if let Some(endpoint) = &s3.endpoint {
        builder = builder
            .with_endpoint(endpoint.as_str())
            .with_virtual_hosted_style_request(false);
        if endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
    }

    builder.build().context("unable to build S3 client")
}
