//! Core types for the support desk read core.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Role of a user inside its company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Admin,
    Agent,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Admin => "admin",
            Profile::Agent => "agent",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Profile::Admin),
            "agent" => Ok(Profile::Agent),
            other => Err(format!("unknown profile '{}'", other)),
        }
    }
}

impl FromSql for Profile {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketStatus::Pending),
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status '{}'", other)),
        }
    }
}

impl FromSql for TicketStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Visibility scope of an acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub user_id: i64,
    pub company_id: i64,
    pub profile: Profile,
    pub queue_ids: BTreeSet<i64>,
}

impl Scope {
    pub fn is_admin(&self) -> bool {
        self.profile == Profile::Admin
    }
}

/// Contact projection joined into listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub email: String,
    pub profile_pic_url: String,
    pub presence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSummary {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagSummary {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// Originating channel of a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSummary {
    pub id: i64,
    pub name: String,
}

/// Tracking projection, present only when the status facet is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSummary {
    pub id: i64,
    pub rating_at: Option<i64>,
    pub rated: bool,
}

/// A ticket row with its display-relevant related entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketListItem {
    pub id: i64,
    pub status: TicketStatus,
    pub queue_id: Option<i64>,
    pub user_id: Option<i64>,
    pub contact_id: i64,
    pub whatsapp_id: Option<i64>,
    pub is_group: bool,
    pub unread_messages: i64,
    pub last_message: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub contact: ContactSummary,
    pub queue: Option<QueueSummary>,
    pub user: Option<UserSummary>,
    pub whatsapp: Option<ChannelSummary>,
    pub tags: Vec<TagSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingSummary>,
}

/// One page of the ticket listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketPage {
    pub tickets: Vec<TicketListItem>,
    /// Distinct tickets matching the filter, ignoring the page window.
    pub count: i64,
    pub has_more: bool,
}

/// Company-wide dashboard counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounters {
    pub avg_support_time: f64,
    pub avg_wait_time: f64,
    pub support_happening: i64,
    pub support_pending: i64,
    pub support_finished: i64,
    pub leads: i64,
}

/// Per-agent dashboard breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendantStats {
    pub id: i64,
    pub name: String,
    pub avg_support_time: f64,
    pub avg_wait_time: f64,
    pub tickets: i64,
    pub rating: f64,
    pub online: bool,
    /// Finished tickets of this agent, across all time.
    pub close_count: i64,
    /// Started but unfinished tickets of this agent, across all time.
    pub open_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardData {
    pub counters: DashboardCounters,
    pub attendants: Vec<AttendantStats>,
}
