use std::{fmt::Debug, net::SocketAddr, path::Path};

use anyhow::Result;
use blob_store::BlobStorageConfig;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "REPORT_SERVER_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub env: String,
    pub listen_addr: String,
    pub structured_logging: bool,
    pub blob_storage: BlobStorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: "local".to_string(),
            listen_addr: "0.0.0.0:8900".to_string(),
            structured_logging: false,
            blob_storage: Default::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the config from defaults, then the optional yaml file, then
    /// `REPORT_SERVER_*` environment variables (`__` separates nested keys).
    pub fn load(path: Option<&Path>) -> Result<ServerConfig> {
        let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));
        if let Some(path) = path {
            let config_str = std::fs::read_to_string(path)?;
            figment = figment.merge(Yaml::string(&config_str));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_yaml_str(config_str: &str) -> Result<ServerConfig> {
        Self::extract(
            Figment::from(Serialized::defaults(ServerConfig::default()))
                .merge(Yaml::string(config_str)),
        )
    }

    fn extract(figment: Figment) -> Result<ServerConfig> {
        let mut config: ServerConfig = figment.extract()?;
        config.blob_storage = config.blob_storage.with_default_backend();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blob_storage.s3.is_some() && self.blob_storage.disk.is_some() {
            return Err(anyhow::anyhow!(
                "cannot specify both s3 and disk blob storage"
            ));
        }
        if self.blob_storage.s3.is_none() && self.blob_storage.disk.is_none() {
            return Err(anyhow::anyhow!(
                "must specify one of s3 or disk blob storage"
            ));
        }
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "invalid listen address: {}",
                self.listen_addr
            ));
        }
        Ok(())
    }
}
