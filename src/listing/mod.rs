//! Role-aware, paginated ticket listing.

pub mod filter;
pub mod intersect;
pub mod pager;

use crate::dates::{DayRange, parse_day};
use crate::db::Database;
use crate::db::scope::SETTING_GROUPS_TAB;
use crate::db::tickets::TicketQuery;
use crate::error::{DeskError, Result};
use crate::types::{TicketPage, TicketStatus};
use filter::FilterContext;
use intersect::IntersectionFacet;
use pager::{DEFAULT_PAGE_SIZE, Pager};
use serde::{Deserialize, Serialize};

/// Listing knobs that come from configuration rather than the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub page_size: i64,
    pub search_message_body: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_message_body: false,
        }
    }
}

/// Facets of one listing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTicketsRequest {
    /// Acting user.
    pub user_id: i64,
    /// Must match the acting user's company when given.
    pub company_id: Option<i64>,
    pub is_search: bool,
    pub search: Option<String>,
    /// 1-based page number, as text.
    pub page_number: Option<String>,
    pub status: Option<TicketStatus>,
    /// Which side of the groups tab to list.
    pub groups: bool,
    /// Created on this calendar day.
    pub date: Option<String>,
    /// Updated on this calendar day.
    pub updated_at: Option<String>,
    pub show_all: bool,
    pub with_unread_messages: bool,
    pub not_closed: bool,
    /// Return every match, unpaginated.
    pub all: bool,
    pub queue_ids: Vec<i64>,
    pub tags: Vec<i64>,
    pub users: Vec<i64>,
}

/// Facets that need no store access, checked up front.
struct Validated {
    pager: Pager,
    search: Option<String>,
    created_on: Option<DayRange>,
    updated_on: Option<DayRange>,
}

fn validate(req: &ListTicketsRequest, options: &ListingOptions) -> Result<Validated> {
    let pager = Pager::new(options.page_size, req.page_number.as_deref(), req.all)?;
    let created_on = req
        .date
        .as_deref()
        .map(|raw| parse_day("date", raw).map(DayRange::of))
        .transpose()?;
    let updated_on = req
        .updated_at
        .as_deref()
        .map(|raw| parse_day("updated_at", raw).map(DayRange::of))
        .transpose()?;
    let search = req
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(Validated {
        pager,
        search,
        created_on,
        updated_on,
    })
}

/// List the tickets visible to the acting user under the requested facets.
pub fn list_tickets(
    db: &Database,
    options: &ListingOptions,
    req: &ListTicketsRequest,
) -> Result<TicketPage> {
    let checked = validate(req, options)?;

    let scope = db.resolve_scope(req.user_id)?;
    if let Some(company_id) = req.company_id.filter(|&id| id != scope.company_id) {
        return Err(DeskError::invalid(
            "company_id",
            format!("user {} does not belong to company {}", scope.user_id, company_id),
        ));
    }

    let groups_tab =
        !req.is_search && db.setting_enabled(scope.company_id, SETTING_GROUPS_TAB, "disabled")?;

    let tag_allow_list = IntersectionFacet::Tags.resolve(db, &req.tags)?;
    let user_allow_list = IntersectionFacet::Users.resolve(db, &req.users)?;

    let ctx = FilterContext {
        company_id: scope.company_id,
        scope,
        requested_queue_ids: req.queue_ids.clone(),
        groups_tab,
        groups: req.groups,
        status: req.status,
        search: checked.search,
        search_message_body: options.search_message_body,
        created_on: checked.created_on,
        updated_on: checked.updated_on,
        show_all: req.show_all,
        unread_only: req.with_unread_messages,
        not_closed: req.not_closed,
        tag_allow_list,
        user_allow_list,
    };
    let tree = filter::compose(&ctx);

    let query = TicketQuery {
        predicate: tree.into_predicate(),
        with_tracking: req.status.is_some(),
        limit: checked.pager.limit(),
        offset: checked.pager.offset(),
    };
    let (tickets, count) = db.fetch_ticket_page(&query)?;
    let has_more = checked.pager.has_more(count, tickets.len());

    tracing::debug!(
        user_id = req.user_id,
        page = checked.pager.page_number(),
        returned = tickets.len(),
        count,
        "listed tickets"
    );

    Ok(TicketPage {
        tickets,
        count,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_sparse_json() {
        let req: ListTicketsRequest =
            serde_json::from_value(serde_json::json!({"user_id": 3, "status": "open"})).unwrap();
        assert_eq!(req.user_id, 3);
        assert_eq!(req.status, Some(TicketStatus::Open));
        assert!(req.tags.is_empty());
        assert!(!req.all);
    }

    #[test]
    fn test_validation_precedes_store_access() {
        // No such user: a store lookup would answer NotFound.
        let db = Database::open_in_memory().unwrap();
        let req = ListTicketsRequest {
            user_id: 404,
            page_number: Some("0".into()),
            ..Default::default()
        };
        let err = list_tickets(&db, &ListingOptions::default(), &req).unwrap_err();
        assert_eq!(err.field(), Some("page_number"));

        let req = ListTicketsRequest {
            user_id: 404,
            updated_at: Some("yesterday".into()),
            ..Default::default()
        };
        let err = list_tickets(&db, &ListingOptions::default(), &req).unwrap_err();
        assert_eq!(err.field(), Some("updated_at"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let req = ListTicketsRequest {
            search: Some("   ".into()),
            ..Default::default()
        };
        let checked = validate(&req, &ListingOptions::default()).unwrap();
        assert!(checked.search.is_none());
    }
}
