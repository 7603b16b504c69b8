//! HTTP API, enabled with `--ui web`.

mod server;

pub use server::{ApiError, TicketParams, api_dashboard, api_tickets, build_router, start_server};
