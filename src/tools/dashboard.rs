//! Dashboard tool.

use super::{ToolContext, make_tool, parse_args};
use crate::error::Result;
use crate::format::{OutputFormat, render_dashboard};
use crate::reports::DashboardRequest;
use crate::service::DeskService;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![make_tool(
        "dashboard_data",
        "Operational dashboard for the acting user's scope: average support and wait minutes, \
         open/pending/finished counts, leads, and a per-agent breakdown ordered by name. \
         Window bounds (days, date_from, date_to) are combined; open and pending counts ignore \
         the window.",
        json!({
            "user_id": { "type": "integer", "description": "Acting user" },
            "company_id": { "type": "integer", "description": "Company of the acting user (checked when given)" },
            "days": { "type": "integer", "description": "Only tracking records created in the last N days" },
            "date_from": { "type": "string", "description": "First included day (YYYY-MM-DD)" },
            "date_to": { "type": "string", "description": "Last included day (YYYY-MM-DD)" },
            "format": { "type": "string", "enum": ["json", "markdown"] }
        }),
        vec!["user_id"],
    )]
}

pub async fn dashboard_data(
    service: &DeskService,
    args: Value,
    format: OutputFormat,
    ctx: &ToolContext,
) -> Result<String> {
    let req: DashboardRequest = parse_args(args)?;
    ctx.log.debug(&format!("computing dashboard for user {}", req.user_id));

    let data = service.dashboard(req).await?;
    Ok(render_dashboard(&data, format)?)
}
