//! Output formatting for listing pages and dashboards.

use crate::types::{DashboardData, TicketListItem, TicketPage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output format for tool and CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// Render a listing page.
pub fn render_ticket_page(page: &TicketPage, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(page),
        OutputFormat::Markdown => Ok(format_ticket_page_markdown(page)),
    }
}

/// Render a dashboard.
pub fn render_dashboard(data: &DashboardData, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(data),
        OutputFormat::Markdown => Ok(format_dashboard_markdown(data)),
    }
}

pub fn format_ticket_page_markdown(page: &TicketPage) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "# Tickets ({} shown of {})\n\n",
        page.tickets.len(),
        page.count
    ));

    if page.tickets.is_empty() {
        md.push_str("_No tickets._\n");
        return md;
    }

    md.push_str("| id | status | contact | queue | agent | unread | tags |\n");
    md.push_str("|---:|---|---|---|---|---:|---|\n");
    for ticket in &page.tickets {
        md.push_str(&format_ticket_row(ticket));
    }

    if page.has_more {
        md.push_str("\n_More tickets on the next page._\n");
    }
    md
}

fn format_ticket_row(ticket: &TicketListItem) -> String {
    let tags: Vec<&str> = ticket.tags.iter().map(|t| t.name.as_str()).collect();
    format!(
        "| {} | {} | {} ({}) | {} | {} | {} | {} |\n",
        ticket.id,
        ticket.status,
        escape_cell(&ticket.contact.name),
        escape_cell(&ticket.contact.number),
        ticket.queue.as_ref().map(|q| escape_cell(&q.name)).unwrap_or_else(|| "-".into()),
        ticket.user.as_ref().map(|u| escape_cell(&u.name)).unwrap_or_else(|| "-".into()),
        ticket.unread_messages,
        escape_cell(&tags.join(", ")),
    )
}

pub fn format_dashboard_markdown(data: &DashboardData) -> String {
    let c = &data.counters;
    let mut md = String::from("# Dashboard\n\n");
    md.push_str(&format!("- **avg support time**: {:.1} min\n", c.avg_support_time));
    md.push_str(&format!("- **avg wait time**: {:.1} min\n", c.avg_wait_time));
    md.push_str(&format!("- **in progress**: {}\n", c.support_happening));
    md.push_str(&format!("- **pending**: {}\n", c.support_pending));
    md.push_str(&format!("- **finished**: {}\n", c.support_finished));
    md.push_str(&format!("- **leads**: {}\n", c.leads));

    if data.attendants.is_empty() {
        return md;
    }

    md.push_str("\n## Attendants\n\n");
    md.push_str("| agent | online | tickets | avg support | avg wait | rating | closed | open |\n");
    md.push_str("|---|---|---:|---:|---:|---:|---:|---:|\n");
    for a in &data.attendants {
        md.push_str(&format!(
            "| {} | {} | {} | {:.1} | {:.1} | {:.2} | {} | {} |\n",
            escape_cell(&a.name),
            if a.online { "yes" } else { "no" },
            a.tickets,
            a.avg_support_time,
            a.avg_wait_time,
            a.rating,
            a.close_count,
            a.open_count
        ));
    }
    md
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
