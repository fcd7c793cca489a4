//! HTTP serving layer over the geoatlas query engine.

pub mod loader;
pub mod routes;

use geoatlas::QueryService;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Serve the API until `shutdown` resolves.
pub async fn run_server(
    addr: SocketAddr,
    service: Arc<QueryService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = routes::router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
