use anyhow::Result;
use blob_store::{BlobStorageConfig, DiskStorageConfig};
use tempfile::TempDir;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{config::ServerConfig, service::Service};

pub struct TestService {
    pub service: Service,
    // Keeps the blob directory alive for the duration of the test.
    _temp_dir: TempDir,
}

impl TestService {
    pub fn new() -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let temp_dir = tempfile::tempdir()?;

        let cfg = ServerConfig {
            blob_storage: BlobStorageConfig {
                s3: None,
                disk: Some(DiskStorageConfig {
                    path: temp_dir
                        .path()
                        .join("blob_store")
                        .to_string_lossy()
                        .to_string(),
                }),
            },
            ..Default::default()
        };
        let srv = Service::new(cfg)?;

        Ok(Self {
            service: srv,
            _temp_dir: temp_dir,
        })
    }
}
