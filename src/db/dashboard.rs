//! Dashboard aggregation queries.
//!
//! Counters and the per-agent breakdown are computed from a tracking view:
//! one row per tracking record joined to its ticket, limited to the company,
//! the caller's scope and the time window. Every read of one aggregation
//! shares a single snapshot.

use super::{Database, id_array};
use crate::dates::{elapsed_minutes, utc_day};
use crate::error::Result;
use crate::types::{AttendantStats, DashboardCounters, DashboardData, Scope};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params, params_from_iter};
use std::collections::HashMap;

/// Inclusive bounds on `ticket_tracking.created_at`; all present bounds apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// Lower bound derived from a trailing number of days.
    pub since_ms: Option<i64>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

/// A resolved aggregation request.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub scope: Scope,
    pub window: TimeWindow,
    /// Leave group conversations out of the pending counter.
    pub exclude_pending_groups: bool,
}

/// One row of the tracking view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackingViewRow {
    id: i64,
    ticket_user_id: Option<i64>,
    contact_id: Option<i64>,
    queued_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    rating_at: Option<i64>,
}

impl TrackingViewRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ticket_user_id: row.get(1)?,
            contact_id: row.get(2)?,
            queued_at: row.get(3)?,
            started_at: row.get(4)?,
            finished_at: row.get(5)?,
            rating_at: row.get(6)?,
        })
    }

    /// Minutes from start until rated, or until finished when never rated.
    fn support_minutes(&self) -> i64 {
        elapsed_minutes(self.started_at, self.rating_at.or(self.finished_at))
    }

    /// Minutes spent queued before an agent started.
    fn wait_minutes(&self) -> i64 {
        elapsed_minutes(Some(self.queued_at), self.started_at)
    }

    fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

const VIEW_SQL: &str = "SELECT tt.id, t.user_id, t.contact_id, tt.queued_at, tt.started_at,
        tt.finished_at, tt.rating_at
     FROM ticket_tracking tt
     LEFT JOIN tickets t ON t.id = tt.ticket_id
     WHERE tt.company_id = ?1";

impl Database {
    /// Compute counters and the per-agent breakdown for one scope and window.
    pub fn dashboard(&self, query: &DashboardQuery) -> Result<DashboardData> {
        self.with_read_snapshot(|conn| {
            let rows = load_tracking_view(conn, &query.scope, &query.window)?;

            let scope = &query.scope;
            let counters = DashboardCounters {
                avg_support_time: mean_of_positive(
                    rows.iter().map(TrackingViewRow::support_minutes),
                ),
                avg_wait_time: mean_of_positive(rows.iter().map(TrackingViewRow::wait_minutes)),
                support_happening: count_support_happening(conn, scope)?,
                support_pending: count_support_pending(conn, scope, query.exclude_pending_groups)?,
                support_finished: rows.iter().filter(|r| r.is_finished()).count() as i64,
                leads: count_leads(&rows),
            };

            let attendants = load_attendants(conn, &query.scope, &rows)?;

            tracing::debug!(
                company_id = query.scope.company_id,
                view_rows = rows.len(),
                attendants = attendants.len(),
                "computed dashboard"
            );

            Ok(DashboardData {
                counters,
                attendants,
            })
        })
    }
}

fn load_tracking_view(
    conn: &Connection,
    scope: &Scope,
    window: &TimeWindow,
) -> Result<Vec<TrackingViewRow>> {
    let mut sql = String::from(VIEW_SQL);
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(scope.company_id)];
    let mut param_idx = 2;

    if !scope.is_admin() {
        sql.push_str(&format!(
            " AND (t.user_id = ?{0} OR (t.user_id IS NULL AND tt.user_id = ?{0}))",
            param_idx
        ));
        params_vec.push(Box::new(scope.user_id));
        param_idx += 1;
    }

    for (op, bound) in [
        (">=", window.since_ms),
        (">=", window.from_ms),
        ("<=", window.to_ms),
    ] {
        if let Some(bound) = bound {
            sql.push_str(&format!(" AND tt.created_at {} ?{}", op, param_idx));
            params_vec.push(Box::new(bound));
            param_idx += 1;
        }
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), TrackingViewRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Mean of the strictly positive values; 0 when there are none.
fn mean_of_positive<I: Iterator<Item = i64>>(values: I) -> f64 {
    mean(values.filter(|&v| v > 0))
}

fn mean<I: Iterator<Item = i64>>(values: I) -> f64 {
    let (sum, n) = values.fold((0i64, 0i64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

/// Open tickets of the company, or of the acting agent; not windowed.
fn count_support_happening(conn: &Connection, scope: &Scope) -> Result<i64> {
    let count = if scope.is_admin() {
        conn.query_row(
            "SELECT COUNT(DISTINCT id) FROM tickets WHERE status = 'open' AND company_id = ?1",
            params![scope.company_id],
            |row| row.get(0),
        )?
    } else {
        conn.query_row(
            "SELECT COUNT(DISTINCT id) FROM tickets
             WHERE status = 'open' AND company_id = ?1 AND user_id = ?2",
            params![scope.company_id, scope.user_id],
            |row| row.get(0),
        )?
    };
    Ok(count)
}

/// Pending, unfinished tickets; not windowed. Agents only count tickets
/// already routed to a queue, and only their own queues when they have any.
fn count_support_pending(conn: &Connection, scope: &Scope, exclude_groups: bool) -> Result<i64> {
    let mut sql = String::from(
        "SELECT COUNT(DISTINCT t.id) FROM tickets t
         LEFT JOIN ticket_tracking tt ON tt.ticket_id = t.id
         WHERE t.status = 'pending' AND t.company_id = ?1 AND tt.finished_at IS NULL",
    );
    let mut params_vec: Vec<SqlValue> = vec![SqlValue::Integer(scope.company_id)];

    if !scope.is_admin() {
        sql.push_str(" AND t.queue_id IS NOT NULL");
        if !scope.queue_ids.is_empty() {
            let queue_ids: Vec<i64> = scope.queue_ids.iter().copied().collect();
            sql.push_str(" AND t.queue_id IN (SELECT value FROM json_each(?2))");
            params_vec.push(SqlValue::Text(id_array(&queue_ids)));
        }
    }
    if exclude_groups {
        sql.push_str(" AND t.is_group = 0");
    }

    let count = conn.query_row(&sql, params_from_iter(params_vec.iter()), |row| row.get(0))?;
    Ok(count)
}

/// Contacts that appear on exactly one row of the view.
fn count_leads(rows: &[TrackingViewRow]) -> i64 {
    let mut per_contact: HashMap<i64, usize> = HashMap::new();
    for contact_id in rows.iter().filter_map(|r| r.contact_id) {
        *per_contact.entry(contact_id).or_default() += 1;
    }
    per_contact.values().filter(|&&n| n == 1).count() as i64
}

/// One agent row of the breakdown, before its tracking rows are folded in.
struct AttendantRow {
    id: i64,
    name: String,
    online: bool,
}

/// Users with their live-session flag; the acting agent alone unless admin.
const ATTENDANT_SQL: &str = "SELECT u.id, u.name,
        EXISTS (SELECT 1 FROM user_socket_sessions s WHERE s.user_id = u.id AND s.active = 1)
     FROM users u";

fn load_attendants(
    conn: &Connection,
    scope: &Scope,
    rows: &[TrackingViewRow],
) -> Result<Vec<AttendantStats>> {
    let (sql, key) = if scope.is_admin() {
        (
            format!("{} WHERE u.company_id = ?1 ORDER BY u.name, u.id", ATTENDANT_SQL),
            scope.company_id,
        )
    } else {
        (format!("{} WHERE u.id = ?1", ATTENDANT_SQL), scope.user_id)
    };
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(params![key], |row| {
            Ok(AttendantRow {
                id: row.get(0)?,
                name: row.get(1)?,
                online: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let ratings = load_rating_days(conn, &user_ids)?;
    let lifetime = load_lifetime_counts(conn, scope.company_id, &user_ids)?;

    let mut by_user: HashMap<i64, Vec<&TrackingViewRow>> = HashMap::new();
    for row in rows {
        if let Some(user_id) = row.ticket_user_id {
            by_user.entry(user_id).or_default().push(row);
        }
    }

    let attendants = users
        .into_iter()
        .map(|user| {
            let own = by_user.remove(&user.id).unwrap_or_default();
            let (close_count, open_count) = lifetime.get(&user.id).copied().unwrap_or((0, 0));
            AttendantStats {
                id: user.id,
                name: user.name,
                avg_support_time: mean(own.iter().map(|r| r.support_minutes())),
                avg_wait_time: mean(own.iter().map(|r| r.wait_minutes())),
                tickets: own.len() as i64,
                rating: matched_rating(&own, ratings.get(&user.id)),
                online: user.online,
                close_count,
                open_count,
            }
        })
        .collect();
    Ok(attendants)
}

/// Ratings of each user keyed by the UTC day they were given.
fn load_rating_days(
    conn: &Connection,
    user_ids: &[i64],
) -> Result<HashMap<i64, HashMap<i64, Vec<f64>>>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, rate, created_at FROM user_ratings
         WHERE user_id IN (SELECT value FROM json_each(?1))",
    )?;
    let rows = stmt.query_map(params![id_array(user_ids)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut out: HashMap<i64, HashMap<i64, Vec<f64>>> = HashMap::new();
    for row in rows {
        let (user_id, rate, created_at) = row?;
        out.entry(user_id)
            .or_default()
            .entry(utc_day(created_at))
            .or_default()
            .push(rate);
    }
    Ok(out)
}

/// Average over every (finished row, rating given that same day) pair.
fn matched_rating(rows: &[&TrackingViewRow], ratings: Option<&HashMap<i64, Vec<f64>>>) -> f64 {
    let Some(ratings) = ratings else {
        return 0.0;
    };
    let (sum, n) = rows
        .iter()
        .filter_map(|r| r.finished_at)
        .filter_map(|finished| ratings.get(&utc_day(finished)))
        .flatten()
        .fold((0.0, 0usize), |(sum, n), rate| (sum + rate, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Finished and in-progress tracking rows per ticket owner, ignoring the
/// time window.
fn load_lifetime_counts(
    conn: &Connection,
    company_id: i64,
    user_ids: &[i64],
) -> Result<HashMap<i64, (i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT t.user_id,
                SUM(CASE WHEN tt.finished_at IS NOT NULL THEN 1 ELSE 0 END),
                SUM(CASE WHEN tt.started_at IS NOT NULL AND tt.finished_at IS NULL
                    THEN 1 ELSE 0 END)
         FROM ticket_tracking tt
         JOIN tickets t ON t.id = tt.ticket_id
         WHERE tt.company_id = ?1 AND t.user_id IN (SELECT value FROM json_each(?2))
         GROUP BY t.user_id",
    )?;
    let counts = stmt
        .query_map(params![company_id, id_array(user_ids)], |row| {
            Ok((row.get::<_, i64>(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(counts)
}
