//! Ticket-id allow-lists for the multi-select tag and user facets.
//!
//! Each selected value is resolved to the set of ticket ids it matches and
//! the sets are intersected: a ticket must match every selected value.

use crate::db::Database;
use crate::error::Result;
use std::collections::BTreeSet;

/// Multi-select facet backed by a per-value ticket-id lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionFacet {
    /// Tickets carrying the tag.
    Tags,
    /// Tickets assigned to the user.
    Users,
}

impl IntersectionFacet {
    pub fn name(&self) -> &'static str {
        match self {
            IntersectionFacet::Tags => "tags",
            IntersectionFacet::Users => "users",
        }
    }

    fn lookup(&self, db: &Database, value: i64) -> Result<Vec<i64>> {
        match self {
            IntersectionFacet::Tags => db.ticket_ids_with_tag(value),
            IntersectionFacet::Users => db.ticket_ids_assigned_to(value),
        }
    }

    /// Resolve the allow-list for `values`; `None` when nothing is selected.
    ///
    /// All lookups complete before the intersection is taken, and the first
    /// failing lookup fails the whole resolution.
    pub fn resolve(&self, db: &Database, values: &[i64]) -> Result<Option<BTreeSet<i64>>> {
        if values.is_empty() {
            return Ok(None);
        }
        let sets = values
            .iter()
            .map(|&value| self.lookup(db, value))
            .collect::<Result<Vec<_>>>()?;
        let allow = intersect_all(sets);
        tracing::debug!(
            facet = self.name(),
            selected = values.len(),
            allowed = allow.len(),
            "resolved intersection facet"
        );
        Ok(Some(allow))
    }
}

/// Intersection of every set; empty when there are no sets.
pub fn intersect_all<I>(sets: I) -> BTreeSet<i64>
where
    I: IntoIterator<Item = Vec<i64>>,
{
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    let mut acc: BTreeSet<i64> = first.into_iter().collect();
    for set in sets {
        if acc.is_empty() {
            break;
        }
        let next: BTreeSet<i64> = set.into_iter().collect();
        acc.retain(|id| next.contains(id));
    }
    acc
}
