//! Ticket filter composition.
//!
//! The filter is built by a fixed, ordered list of stages. Each stage takes
//! the tree produced so far and returns a new one; some stages extend it,
//! others rebuild it and drop what earlier stages installed. The order is:
//!
//! base → groups → status → search → created_on → updated_on → unread →
//! tags → users → not_closed → company
//!
//! Overrides that are observable by callers:
//! - `created_on` and `updated_on` keep only the shared AND-list and install
//!   their own date range, so the later of the two wins and queue, group and
//!   status slots are dropped.
//! - `unread` rebuilds the whole tree (dropping search and any date range).
//! - `users` replaces the id allow-list installed by `tags`.

use crate::dates::DayRange;
use crate::db::predicate::{Column, Predicate};
use crate::types::{Scope, TicketStatus};
use std::collections::{BTreeMap, BTreeSet};

/// Named positions in the filter tree that a stage may set or replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Queue,
    Group,
    Status,
    CreatedAt,
    UpdatedAt,
    Unread,
    Id,
    NotClosed,
    Company,
}

/// Filter under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterTree {
    /// Clauses that survive date rewrites: ownership base, rating guard, search.
    pub anded: Vec<Predicate>,
    pub slots: BTreeMap<Slot, Predicate>,
}

impl FilterTree {
    pub fn slot(&self, slot: Slot) -> Option<&Predicate> {
        self.slots.get(&slot)
    }

    fn with_slot(mut self, slot: Slot, predicate: Predicate) -> Self {
        self.slots.insert(slot, predicate);
        self
    }

    /// Conjunction of every clause, AND-list first, then slots in slot order.
    pub fn into_predicate(self) -> Predicate {
        let mut all = self.anded;
        all.extend(self.slots.into_values());
        Predicate::And(all)
    }
}

/// Everything the stages read. Built once per request, after validation and
/// facet resolution, so the stages themselves never touch the store.
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub scope: Scope,
    pub company_id: i64,
    /// Queue facet chosen by the caller; empty means "my queues".
    pub requested_queue_ids: Vec<i64>,
    /// Company has the separate groups tab enabled (never in search mode).
    pub groups_tab: bool,
    /// Which side of the groups tab is listed.
    pub groups: bool,
    pub status: Option<TicketStatus>,
    /// Trimmed search text, if any.
    pub search: Option<String>,
    /// Also match message bodies when searching.
    pub search_message_body: bool,
    pub created_on: Option<DayRange>,
    pub updated_on: Option<DayRange>,
    pub show_all: bool,
    pub unread_only: bool,
    pub not_closed: bool,
    pub tag_allow_list: Option<BTreeSet<i64>>,
    pub user_allow_list: Option<BTreeSet<i64>>,
}

pub type Stage = fn(FilterTree, &FilterContext) -> FilterTree;

/// Stages in execution order.
pub const STAGES: [(&str, Stage); 11] = [
    ("base", base),
    ("groups", groups),
    ("status", status),
    ("search", search),
    ("created_on", created_on),
    ("updated_on", updated_on),
    ("unread", unread),
    ("tags", tags),
    ("users", users),
    ("not_closed", not_closed),
    ("company", company),
];

/// Run every stage in order.
pub fn compose(ctx: &FilterContext) -> FilterTree {
    STAGES
        .iter()
        .fold(FilterTree::default(), |tree, (_, stage)| stage(tree, ctx))
}

/// Run stages until (and including) `last`; used to inspect intermediate trees.
pub fn compose_until(ctx: &FilterContext, last: &str) -> FilterTree {
    let mut tree = FilterTree::default();
    for (name, stage) in STAGES.iter() {
        tree = stage(tree, ctx);
        if *name == last {
            break;
        }
    }
    tree
}

fn ownership(ctx: &FilterContext) -> Predicate {
    Predicate::Or(vec![
        Predicate::eq(Column::TicketUserId, ctx.scope.user_id),
        Predicate::eq(Column::TicketStatus, TicketStatus::Pending.as_str().to_string()),
    ])
}

fn rating_guard() -> Predicate {
    Predicate::Or(vec![
        Predicate::IsNull(Column::TrackingRatingAt),
        Predicate::eq(Column::TrackingRated, true),
    ])
}

/// Queues an agent may see: the requested ones it belongs to, or all of its
/// own when none were requested.
fn visible_queues(ctx: &FilterContext) -> BTreeSet<i64> {
    if ctx.requested_queue_ids.is_empty() {
        ctx.scope.queue_ids.clone()
    } else {
        ctx.requested_queue_ids
            .iter()
            .copied()
            .filter(|id| ctx.scope.queue_ids.contains(id))
            .collect()
    }
}

fn base(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    let mut tree = tree;
    if !ctx.show_all {
        tree.anded.push(ownership(ctx));
    }
    if ctx.scope.is_admin() {
        return tree;
    }
    tree.with_slot(
        Slot::Queue,
        Predicate::Or(vec![
            Predicate::in_ids(Column::TicketQueueId, visible_queues(ctx)),
            Predicate::IsNull(Column::TicketQueueId),
            Predicate::eq(Column::TicketUserId, ctx.scope.user_id),
        ]),
    )
}

fn group_predicate(ctx: &FilterContext) -> Predicate {
    Predicate::eq(Column::TicketIsGroup, ctx.groups)
}

fn groups(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    if !ctx.groups_tab {
        return tree;
    }
    tree.with_slot(Slot::Group, group_predicate(ctx))
}

fn status(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    let Some(status) = ctx.status else {
        return tree;
    };
    let mut tree = tree;
    tree.anded.push(rating_guard());
    tree.with_slot(
        Slot::Status,
        Predicate::eq(Column::TicketStatus, status.as_str().to_string()),
    )
}

fn search(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    let Some(needle) = ctx.search.as_deref().filter(|s| !s.is_empty()) else {
        return tree;
    };
    let mut any = vec![
        Predicate::ContainsCi(Column::ContactName, needle.to_string()),
        Predicate::ContainsCi(Column::ContactNumber, needle.to_string()),
    ];
    if ctx.search_message_body {
        any.push(Predicate::MessageBodyContains(needle.to_string()));
    }
    let mut tree = tree;
    tree.anded.push(Predicate::Or(any));
    tree
}

fn date_only(tree: FilterTree, slot: Slot, column: Column, range: DayRange) -> FilterTree {
    FilterTree {
        anded: tree.anded,
        slots: BTreeMap::new(),
    }
    .with_slot(slot, Predicate::between(column, range.start_ms, range.end_ms))
}

fn created_on(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    match ctx.created_on {
        Some(range) => date_only(tree, Slot::CreatedAt, Column::TicketCreatedAt, range),
        None => tree,
    }
}

fn updated_on(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    match ctx.updated_on {
        Some(range) => date_only(tree, Slot::UpdatedAt, Column::TicketUpdatedAt, range),
        None => tree,
    }
}

fn unread(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    if !ctx.unread_only {
        return tree;
    }
    let mut anded = vec![ownership(ctx)];
    // Tickets awaiting a rating decision stay hidden from status-scoped views.
    if ctx.status.is_some() {
        anded.push(rating_guard());
    }
    let mut rebuilt = FilterTree {
        anded,
        slots: BTreeMap::new(),
    }
    .with_slot(
        Slot::Queue,
        Predicate::Or(vec![
            Predicate::in_ids(Column::TicketQueueId, ctx.scope.queue_ids.iter().copied()),
            Predicate::IsNull(Column::TicketQueueId),
        ]),
    )
    .with_slot(Slot::Unread, Predicate::gt(Column::TicketUnreadMessages, 0i64));
    if ctx.groups_tab {
        rebuilt = rebuilt.with_slot(Slot::Group, group_predicate(ctx));
    }
    rebuilt
}

fn tags(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    match &ctx.tag_allow_list {
        Some(allow) => tree.with_slot(
            Slot::Id,
            Predicate::in_ids(Column::TicketId, allow.iter().copied()),
        ),
        None => tree,
    }
}

fn users(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    match &ctx.user_allow_list {
        Some(allow) => tree.with_slot(
            Slot::Id,
            Predicate::in_ids(Column::TicketId, allow.iter().copied()),
        ),
        None => tree,
    }
}

fn not_closed(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    if !ctx.not_closed {
        return tree;
    }
    tree.with_slot(
        Slot::NotClosed,
        Predicate::ne(Column::TicketStatus, TicketStatus::Closed.as_str().to_string()),
    )
}

fn company(tree: FilterTree, ctx: &FilterContext) -> FilterTree {
    tree.with_slot(
        Slot::Company,
        Predicate::eq(Column::TicketCompanyId, ctx.company_id),
    )
}
