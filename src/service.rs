//! Async entry points shared by the MCP tools, the HTTP API and the CLI.
//!
//! Each call runs on tokio's blocking pool with its own pooled store
//! connection, so a slow read stalls neither the executor nor other requests.

use crate::db::Database;
use crate::error::Result;
use crate::listing::{ListTicketsRequest, ListingOptions, list_tickets};
use crate::reports::{DashboardRequest, dashboard_data};
use crate::types::{DashboardData, TicketPage};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct DeskService {
    db: Arc<Database>,
    listing: ListingOptions,
}

impl DeskService {
    pub fn new(db: Arc<Database>, listing: ListingOptions) -> Self {
        Self { db, listing }
    }

    pub async fn list_tickets(&self, req: ListTicketsRequest) -> Result<TicketPage> {
        let db = Arc::clone(&self.db);
        let options = self.listing;
        let start = Instant::now();
        let page = tokio::task::spawn_blocking(move || list_tickets(&db, &options, &req)).await??;
        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            count = page.count,
            "list_tickets finished"
        );
        Ok(page)
    }

    pub async fn dashboard(&self, req: DashboardRequest) -> Result<DashboardData> {
        let db = Arc::clone(&self.db);
        let start = Instant::now();
        let data = tokio::task::spawn_blocking(move || dashboard_data(&db, &req)).await??;
        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            attendants = data.attendants.len(),
            "dashboard finished"
        );
        Ok(data)
    }
}
