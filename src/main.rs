//! Support Desk MCP Server
//!
//! Serves ticket listing and dashboard tools over stdio, optionally with a
//! read-only HTTP API, or runs a single query from the command line.

use anyhow::Result;
use clap::Parser;
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use support_desk_mcp::cli::{Cli, Command};
use support_desk_mcp::config::{Config, ConfigLoader, UiMode};
use support_desk_mcp::db::Database;
use support_desk_mcp::format::{OutputFormat, render_dashboard, render_ticket_page};
use support_desk_mcp::logging::{ClientLevel, LogTarget, ToolLog, init_tracing};
use support_desk_mcp::service::DeskService;
use support_desk_mcp::tools::{ToolContext, ToolHandler};
use support_desk_mcp::web;
use tracing::{debug, info, warn};

const INSTRUCTIONS: &str = "\
Read-only support desk. list_tickets(user_id, ...) returns the tickets an acting user may see; \
dashboard_data(user_id, days|date_from|date_to) returns counters and a per-agent breakdown.";

#[derive(Clone)]
struct SupportDeskServer {
    tool_handler: Arc<ToolHandler>,
    /// Client-adjustable via logging/setLevel.
    client_level: Arc<ClientLevel>,
}

impl ServerHandler for SupportDeskServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "support-desk-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        info!(level = ?request.level, "Client log level changed");
        self.client_level.set(request.level);
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.to_string();
        let start = std::time::Instant::now();

        let tool_ctx = ToolContext::new(ToolLog::connected(
            format!("tool:{}", tool_name),
            context.peer.clone(),
            Arc::clone(&self.client_level),
        ));

        let args = Value::Object(request.arguments.unwrap_or_default());
        match self.tool_handler.call_tool(&tool_name, args, &tool_ctx).await {
            Ok(output) => {
                debug!(
                    tool = %tool_name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                Ok(text_result(output, false))
            }
            Err(e) => {
                warn!(
                    tool = %tool_name,
                    error_code = ?e.code(),
                    error_message = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
                let body = serde_json::to_string(&e.body()).unwrap_or_else(|_| {
                    format!("{{\"code\":\"INTERNAL_ERROR\",\"message\":\"{}\"}}", e)
                });
                Ok(text_result(body, true))
            }
        }
    }
}

fn text_result(text: String, failed: bool) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text)],
        is_error: failed.then_some(true),
        meta: None,
        structured_content: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = ConfigLoader::load(cli.config.as_deref().map(Path::new))?;
    if let Some(path) = loader.config_path() {
        info!(path = %path.display(), "Loaded configuration");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(ui_mode) = cli.ui {
        config.ui.mode = ui_mode.into();
    }
    if let Some(ui_port) = cli.ui_port {
        config.ui.port = ui_port;
    }
    if let Some(format) = cli.format {
        config.server.default_format = format.into();
    }
    let config = loader.into_config();

    let service = open_service(&config)?;
    let format = config.server.default_format;

    match cli.command {
        Some(Command::Tickets(args)) => {
            let page = service.list_tickets(args.into()).await?;
            println!("{}", render_ticket_page(&page, format)?);
        }
        Some(Command::Dashboard(args)) => {
            let data = service.dashboard(args.into()).await?;
            println!("{}", render_dashboard(&data, format)?);
        }
        Some(Command::Serve) | None => {
            run_server(&config, service, format).await?;
        }
    }

    Ok(())
}

fn open_service(config: &Config) -> Result<DeskService> {
    if let Some(parent) = config.server.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(
        &config.server.db_path,
        config.server.busy_timeout_ms,
        config.server.pool_size,
    )?;
    info!(path = %config.server.db_path.display(), "Opened database");
    Ok(DeskService::new(Arc::new(db), config.listing.options()))
}

async fn run_server(config: &Config, service: DeskService, format: OutputFormat) -> Result<()> {
    let _http = if config.ui.mode == UiMode::Web {
        match web::start_server(service.clone(), config.ui.port).await {
            Ok((shutdown_tx, addr)) => {
                info!("HTTP API available at http://{}", addr);
                Some(shutdown_tx)
            }
            Err(e) => {
                // The MCP server keeps running without the HTTP API.
                warn!("Failed to start HTTP API on port {}: {}", config.ui.port, e);
                None
            }
        }
    } else {
        None
    };

    let server = SupportDeskServer {
        tool_handler: Arc::new(ToolHandler::new(service, format)),
        client_level: Arc::new(ClientLevel::default()),
    };

    info!("Server ready, listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
