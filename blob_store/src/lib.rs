use std::{fmt::Debug, sync::Arc};

use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore, PutPayload};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod disk;
pub mod s3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3 compatible stores (minio, localstack).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskStorageConfig {
    pub path: String,
}

const DEFAULT_DISK_PATH: &str = "report_storage/blobs";

/// At most one backend may be set. With neither set, blobs go to
/// `report_storage/blobs` on local disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlobStorageConfig {
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub disk: Option<DiskStorageConfig>,
}

impl BlobStorageConfig {
    /// Fills in the local disk backend when no backend is configured.
    pub fn with_default_backend(self) -> Self {
        if self.s3.is_some() || self.disk.is_some() {
            return self;
        }
        BlobStorageConfig {
            s3: None,
            disk: Some(DiskStorageConfig {
                path: DEFAULT_DISK_PATH.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PutResult {
    pub url: String,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct BlobStorage {
    object_store: Arc<dyn ObjectStore>,
    url_prefix: String,
}

impl Debug for BlobStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStorage")
            .field("url_prefix", &self.url_prefix)
            .finish()
    }
}

impl BlobStorage {
    pub fn new(config: BlobStorageConfig) -> Result<Self> {
        match (&config.s3, &config.disk) {
            (Some(s3), None) => {
                info!(bucket = %s3.bucket, region = %s3.region, "using s3 blob storage");
                Ok(Self {
                    object_store: Arc::new(s3::s3_storage(s3)?),
                    url_prefix: format!("s3://{}", s3.bucket),
                })
            }
            (None, Some(disk)) => {
                info!(path = %disk.path, "using disk blob storage");
                Ok(Self {
                    object_store: Arc::new(disk::file_storage(disk)?),
                    url_prefix: format!("file://{}", disk.path),
                })
            }
            (Some(_), Some(_)) => Err(anyhow!("cannot specify both s3 and disk blob storage")),
            (None, None) => Err(anyhow!("must specify one of s3 or disk blob storage")),
        }
    }

    /// Wraps an already built object store, e.g. `object_store::memory::InMemory`.
    pub fn with_object_store(object_store: Arc<dyn ObjectStore>, url_prefix: &str) -> Self {
        Self {
            object_store,
            url_prefix: url_prefix.to_string(),
        }
    }

    pub fn path_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }

    /// Lists the keys of every object below `prefix`, sorted lexicographically.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix_path = Path::from(prefix);
        let objects: Vec<_> = self
            .object_store
            .list(Some(&prefix_path))
            .try_collect()
            .await
            .map_err(|e| anyhow!("failed to list objects at {}: {}", prefix, e))?;

        let mut keys: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        keys.sort();
        debug!(prefix, count = keys.len(), "listed objects");
        Ok(keys)
    }

    /// Reads the object at `key`, returning `None` when it does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = Path::from(key);
        let get_result = match self.object_store.get(&path).await {
            Ok(get_result) => get_result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(anyhow!("failed to get object at {}: {}", key, e)),
        };
        let bytes = get_result
            .bytes()
            .await
            .map_err(|e| anyhow!("failed to read object content at {}: {}", key, e))?;
        Ok(Some(bytes))
    }

    /// Reads the object at `key`, failing when it does not exist.
    pub async fn read_bytes(&self, key: &str) -> Result<Bytes> {
        self.get(key)
            .await?
            .ok_or_else(|| anyhow!("object not found at {}", key))
    }

    pub async fn put(&self, key: &str, data: Bytes) -> Result<PutResult> {
        let path = Path::from(key);
        let size_bytes = data.len() as u64;
        self.object_store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| anyhow!("failed to put object at {}: {}", key, e))?;
        Ok(PutResult {
            url: self.path_url(key),
            size_bytes,
        })
    }
}
