//! Status server
//!
//! Serves liveness/readiness checks and the current aggregate:
//! - `GET /livenesscheck` - `LIVE`
//! - `GET /readinesscheck` - `HEALTHY`
//! - `GET /state` - crawl progress and the summary table as plain text
//! - `GET /state.json` - the same as JSON
//!
//! Snapshots are taken while workers are still merging; each entry is
//! consistent, but a page batch may show up partially applied.

mod routes;

pub use routes::{build_router, StateResponse};

use crate::crawler::CrawlProgress;
use crate::summary::ChannelSummaries;
use crate::ScrapeError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handles the routes read from
#[derive(Debug, Clone)]
pub struct StatusState {
    pub summaries: Arc<ChannelSummaries>,
    pub progress: Arc<CrawlProgress>,
}

/// Binds `addr` and serves the status routes until the process exits
pub async fn serve(addr: SocketAddr, state: StatusState) -> Result<(), ScrapeError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Status server listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
