//! Read-only HTTP API over the listing and dashboard paths.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{DeskError, ErrorCode};
use crate::listing::ListTicketsRequest;
use crate::reports::DashboardRequest;
use crate::service::DeskService;
use crate::types::{DashboardData, TicketPage, TicketStatus};

/// Error wrapper mapping the desk taxonomy onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(pub DeskError);

impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidArgument | ErrorCode::UnknownTool => StatusCode::BAD_REQUEST,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self.0, "API request failed");
        (status, Json(self.0.body())).into_response()
    }
}

/// Query string of `GET /api/tickets`. Multi-value facets are comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TicketParams {
    pub user_id: i64,
    pub company_id: Option<i64>,
    pub is_search: bool,
    pub search: Option<String>,
    pub page_number: Option<String>,
    pub status: Option<TicketStatus>,
    pub groups: bool,
    pub date: Option<String>,
    pub updated_at: Option<String>,
    pub show_all: bool,
    pub with_unread_messages: bool,
    pub not_closed: bool,
    pub all: bool,
    pub queue_ids: Option<String>,
    pub tags: Option<String>,
    pub users: Option<String>,
}

impl TicketParams {
    pub fn into_request(self) -> Result<ListTicketsRequest, DeskError> {
        Ok(ListTicketsRequest {
            user_id: self.user_id,
            company_id: self.company_id,
            is_search: self.is_search,
            search: self.search,
            page_number: self.page_number,
            status: self.status,
            groups: self.groups,
            date: self.date.filter(|s| !s.is_empty()),
            updated_at: self.updated_at.filter(|s| !s.is_empty()),
            show_all: self.show_all,
            with_unread_messages: self.with_unread_messages,
            not_closed: self.not_closed,
            all: self.all,
            queue_ids: parse_id_list("queue_ids", self.queue_ids.as_deref())?,
            tags: parse_id_list("tags", self.tags.as_deref())?,
            users: parse_id_list("users", self.users.as_deref())?,
        })
    }
}

/// Parse `"1,2, 3"` into ids; empty or missing means no selection.
fn parse_id_list(field: &'static str, raw: Option<&str>) -> Result<Vec<i64>, DeskError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| DeskError::invalid(field, format!("'{}' is not an id", s)))
        })
        .collect()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn api_tickets(
    State(service): State<DeskService>,
    Query(params): Query<TicketParams>,
) -> Result<Json<TicketPage>, ApiError> {
    let req = params.into_request()?;
    Ok(Json(service.list_tickets(req).await?))
}

pub async fn api_dashboard(
    State(service): State<DeskService>,
    Query(req): Query<DashboardRequest>,
) -> Result<Json<DashboardData>, ApiError> {
    Ok(Json(service.dashboard(req).await?))
}

pub fn build_router(service: DeskService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tickets", get(api_tickets))
        .route("/api/dashboard", get(api_dashboard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind and serve in the background. Returns the shutdown trigger and the
/// bound address.
pub async fn start_server(
    service: DeskService,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("HTTP API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("HTTP API shutting down");
            })
            .await
        {
            tracing::error!("HTTP API error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(DeskError::not_found("user", 1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(DeskError::invalid("page_number", "x")).status(),
            StatusCode::BAD_REQUEST
        );
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(
            ApiError(DeskError::Store(busy)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(DeskError::Store(rusqlite::Error::InvalidQuery)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("tags", Some("3, 1,,2")).unwrap(), vec![3, 1, 2]);
        assert!(parse_id_list("tags", None).unwrap().is_empty());
        assert!(parse_id_list("tags", Some("")).unwrap().is_empty());
        let err = parse_id_list("users", Some("1,x")).unwrap_err();
        assert_eq!(err.field(), Some("users"));
    }

    #[test]
    fn test_ticket_params_into_request() {
        let params = TicketParams {
            user_id: 4,
            tags: Some("1,2".into()),
            date: Some(String::new()),
            ..Default::default()
        };
        let req = params.into_request().unwrap();
        assert_eq!(req.user_id, 4);
        assert_eq!(req.tags, vec![1, 2]);
        assert!(req.date.is_none());
    }
}
