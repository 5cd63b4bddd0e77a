use anyhow::{Context, Result};
use object_store::local::LocalFileSystem;

use super::DiskStorageConfig;

pub fn file_storage(disk: &DiskStorageConfig) -> Result<LocalFileSystem> {
    std::fs::create_dir_all(&disk.path)
        .with_context(|| format!("unable to create blob directory {}", disk.path))?;
    LocalFileSystem::new_with_prefix(&disk.path)
        .with_context(|| format!("unable to open blob directory {}", disk.path))
}
