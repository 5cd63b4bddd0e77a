use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum_server::Handle;
use blob_store::BlobStorage;
use report::{BlobReportStore, CsvReportGenerator, ReportGenerator};
use tokio::signal;
use tracing::{error, info};

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
};

#[derive(Clone)]
pub struct Service {
    pub config: ServerConfig,
    pub blob_storage: Arc<BlobStorage>,
    pub report_generator: Arc<dyn ReportGenerator>,
}

impl Service {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let blob_storage = Arc::new(
            BlobStorage::new(config.blob_storage.clone())
                .context("error initializing BlobStorage")?,
        );
        let report_store = Arc::new(BlobReportStore::new(blob_storage.clone()));
        let report_generator: Arc<dyn ReportGenerator> =
            Arc::new(CsvReportGenerator::new(report_store));

        Ok(Self {
            config,
            blob_storage,
            report_generator,
        })
    }

    pub fn route_state(&self) -> RouteState {
        RouteState {
            report_generator: self.report_generator.clone(),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let handle = Handle::new();
        let handle_sh = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh).await;
            info!("graceful shutdown signal received, shutting down server gracefully");
        });

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        info!("server api listening on {}", self.config.listen_addr);
        let routes = create_routes(self.route_state(), &self.config.env);
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    handle.graceful_shutdown(None);
    info!("signal received, shutting down server gracefully");
}
