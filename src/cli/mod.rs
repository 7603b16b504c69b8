//! Command-line interface.
//!
//! With no subcommand the MCP server runs on stdio. `tickets` and `dashboard`
//! run one query against the configured database and print the result.

use crate::config;
use crate::format::OutputFormat;
use crate::listing::ListTicketsRequest;
use crate::reports::DashboardRequest;
use crate::types::TicketStatus;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UiMode {
    /// MCP over stdio only (default)
    #[default]
    None,
    /// Also serve the read-only HTTP API
    Web,
}

impl From<UiMode> for config::UiMode {
    fn from(mode: UiMode) -> Self {
        match mode {
            UiMode::None => config::UiMode::None,
            UiMode::Web => config::UiMode::Web,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Open,
    Closed,
}

impl From<StatusArg> for TicketStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TicketStatus::Pending,
            StatusArg::Open => TicketStatus::Open,
            StatusArg::Closed => TicketStatus::Closed,
        }
    }
}

/// Support desk ticket listing and dashboards over MCP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// UI mode: none (MCP only) or web (also serve the HTTP API)
    #[arg(long, value_enum, global = true)]
    pub ui: Option<UiMode>,

    /// Port for the HTTP API
    #[arg(long, global = true)]
    pub ui_port: Option<u16>,

    /// Output format for one-shot commands (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default if no subcommand given)
    Serve,

    /// List tickets visible to a user
    Tickets(TicketsArgs),

    /// Print the dashboard for a user's scope
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TicketsArgs {
    /// Acting user id
    #[arg(long)]
    pub user: i64,

    /// Company id (checked against the user's company)
    #[arg(long)]
    pub company: Option<i64>,

    /// 1-based page number
    #[arg(long)]
    pub page: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Search contact name or number
    #[arg(long)]
    pub search: Option<String>,

    /// Search mode (ignores the groups tab)
    #[arg(long)]
    pub is_search: bool,

    /// List the group side of the groups tab
    #[arg(long)]
    pub groups: bool,

    /// Created on this day (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Updated on this day (YYYY-MM-DD)
    #[arg(long)]
    pub updated_at: Option<String>,

    /// Drop the own-or-pending restriction
    #[arg(long)]
    pub show_all: bool,

    /// Only tickets with unread messages
    #[arg(long)]
    pub unread: bool,

    #[arg(long)]
    pub not_closed: bool,

    /// Return every match without paging
    #[arg(long)]
    pub all: bool,

    /// Queue ids, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub queues: Vec<i64>,

    /// Tag ids, comma-separated; tickets must carry all of them
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<i64>,

    /// Assigned user ids, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub users: Vec<i64>,
}

impl From<TicketsArgs> for ListTicketsRequest {
    fn from(args: TicketsArgs) -> Self {
        ListTicketsRequest {
            user_id: args.user,
            company_id: args.company,
            is_search: args.is_search,
            search: args.search,
            page_number: args.page,
            status: args.status.map(Into::into),
            groups: args.groups,
            date: args.date,
            updated_at: args.updated_at,
            show_all: args.show_all,
            with_unread_messages: args.unread,
            not_closed: args.not_closed,
            all: args.all,
            queue_ids: args.queues,
            tags: args.tags,
            users: args.users,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Acting user id
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub company: Option<i64>,

    /// Trailing window in days
    #[arg(long)]
    pub days: Option<i64>,

    /// First included day (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Last included day (YYYY-MM-DD)
    #[arg(long)]
    pub date_to: Option<String>,
}

impl From<DashboardArgs> for DashboardRequest {
    fn from(args: DashboardArgs) -> Self {
        DashboardRequest {
            user_id: args.user,
            company_id: args.company,
            days: args.days,
            date_from: args.date_from,
            date_to: args.date_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_subcommand() {
        let cli = Cli::try_parse_from([
            "support-desk-mcp",
            "--format",
            "markdown",
            "tickets",
            "--user",
            "7",
            "--status",
            "open",
            "--tags",
            "1,2",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(FormatArg::Markdown));
        let Some(Command::Tickets(args)) = cli.command else {
            panic!("expected tickets subcommand");
        };
        let req: ListTicketsRequest = args.into();
        assert_eq!(req.user_id, 7);
        assert_eq!(req.status, Some(TicketStatus::Open));
        assert_eq!(req.tags, vec![1, 2]);
    }

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::try_parse_from(["support-desk-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn test_dashboard_subcommand() {
        let cli = Cli::try_parse_from([
            "support-desk-mcp",
            "dashboard",
            "--user",
            "1",
            "--days",
            "7",
        ])
        .unwrap();
        let Some(Command::Dashboard(args)) = cli.command else {
            panic!("expected dashboard subcommand");
        };
        let req: DashboardRequest = args.into();
        assert_eq!(req.days, Some(7));
    }
}
