//! Ticket listing tool.

use super::{ToolContext, make_tool, parse_args};
use crate::error::Result;
use crate::format::{OutputFormat, render_ticket_page};
use crate::listing::ListTicketsRequest;
use crate::service::DeskService;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![make_tool(
        "list_tickets",
        "List the tickets visible to an acting user, newest update first. Agents see tickets \
         they own plus pending ones in their queues or with no queue; admins see every queue. \
         Multi-select tags/users keep only tickets matching every selected value. Returns \
         {tickets, count, hasMore}.",
        json!({
            "user_id": { "type": "integer", "description": "Acting user" },
            "company_id": { "type": "integer", "description": "Company of the acting user (checked when given)" },
            "page_number": { "type": "string", "description": "1-based page number (default: \"1\")" },
            "status": { "type": "string", "enum": ["pending", "open", "closed"] },
            "search": { "type": "string", "description": "Case-insensitive match on contact name or number" },
            "is_search": { "type": "boolean", "description": "Search mode; ignores the groups tab" },
            "groups": { "type": "boolean", "description": "List the group side of the groups tab" },
            "date": { "type": "string", "description": "Created on this day (YYYY-MM-DD)" },
            "updated_at": { "type": "string", "description": "Updated on this day (YYYY-MM-DD); wins over date" },
            "show_all": { "type": "boolean", "description": "Drop the own-or-pending restriction" },
            "with_unread_messages": { "type": "boolean", "description": "Only tickets with unread messages" },
            "not_closed": { "type": "boolean" },
            "all": { "type": "boolean", "description": "Return every match without paging" },
            "queue_ids": { "type": "array", "items": { "type": "integer" } },
            "tags": { "type": "array", "items": { "type": "integer" } },
            "users": { "type": "array", "items": { "type": "integer" } },
            "format": { "type": "string", "enum": ["json", "markdown"] }
        }),
        vec!["user_id"],
    )]
}

pub async fn list_tickets(
    service: &DeskService,
    args: Value,
    format: OutputFormat,
    ctx: &ToolContext,
) -> Result<String> {
    let req: ListTicketsRequest = parse_args(args)?;
    ctx.log.debug(&format!("listing tickets for user {}", req.user_id));

    let page = service.list_tickets(req).await?;
    ctx.log.info(
        "tickets listed",
        json!({ "count": page.count, "returned": page.tickets.len(), "hasMore": page.has_more }),
    );
    Ok(render_ticket_page(&page, format)?)
}
