//! Typed boolean filter over tickets, compiled into parameterized SQL.
//!
//! Column names come from a closed enum and every value is bound as a
//! positional parameter, so no caller-supplied text reaches the SQL string.

use super::id_array;
use rusqlite::types::Value as SqlValue;

/// Filterable columns of the listing query.
///
/// Aliases: `t` tickets, `c` contacts, `tt` ticket_tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    TicketId,
    TicketCompanyId,
    TicketStatus,
    TicketQueueId,
    TicketUserId,
    TicketIsGroup,
    TicketUnreadMessages,
    TicketCreatedAt,
    TicketUpdatedAt,
    ContactName,
    ContactNumber,
    TrackingRatingAt,
    TrackingRated,
}

impl Column {
    pub fn sql(&self) -> &'static str {
        match self {
            Column::TicketId => "t.id",
            Column::TicketCompanyId => "t.company_id",
            Column::TicketStatus => "t.status",
            Column::TicketQueueId => "t.queue_id",
            Column::TicketUserId => "t.user_id",
            Column::TicketIsGroup => "t.is_group",
            Column::TicketUnreadMessages => "t.unread_messages",
            Column::TicketCreatedAt => "t.created_at",
            Column::TicketUpdatedAt => "t.updated_at",
            Column::ContactName => "c.name",
            Column::ContactNumber => "c.number",
            Column::TrackingRatingAt => "tt.rating_at",
            Column::TrackingRated => "tt.rated",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, Column::TrackingRatingAt | Column::TrackingRated)
    }
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Column, SqlValue),
    Ne(Column, SqlValue),
    Gt(Column, SqlValue),
    /// Inclusive on both bounds.
    Between(Column, SqlValue, SqlValue),
    /// Id set membership; an empty set matches nothing. The set is bound as
    /// one JSON array, so its size is not limited by SQLite's variable cap.
    In(Column, Vec<i64>),
    IsNull(Column),
    /// Case-insensitive substring match.
    ContainsCi(Column, String),
    /// Case-insensitive substring match against any message of the ticket.
    MessageBodyContains(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// SQL fragment with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Predicate {
    pub fn eq(column: Column, value: impl Into<SqlValue>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn ne(column: Column, value: impl Into<SqlValue>) -> Self {
        Predicate::Ne(column, value.into())
    }

    pub fn gt(column: Column, value: impl Into<SqlValue>) -> Self {
        Predicate::Gt(column, value.into())
    }

    pub fn between(column: Column, low: impl Into<SqlValue>, high: impl Into<SqlValue>) -> Self {
        Predicate::Between(column, low.into(), high.into())
    }

    pub fn in_ids<I>(column: Column, ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Predicate::In(column, ids.into_iter().collect())
    }

    /// Whether any leaf reads a tracking column.
    pub fn touches_tracking(&self) -> bool {
        match self {
            Predicate::Eq(c, _)
            | Predicate::Ne(c, _)
            | Predicate::Gt(c, _)
            | Predicate::Between(c, _, _)
            | Predicate::In(c, _)
            | Predicate::IsNull(c)
            | Predicate::ContainsCi(c, _) => c.is_tracking(),
            Predicate::MessageBodyContains(_) => false,
            Predicate::And(items) | Predicate::Or(items) => {
                items.iter().any(Predicate::touches_tracking)
            }
        }
    }

    /// Compile into a SQL boolean expression with `?N` placeholders.
    pub fn compile(&self) -> CompiledSql {
        let mut params = Vec::new();
        let sql = self.write(&mut params);
        CompiledSql { sql, params }
    }

    fn write(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Predicate::Eq(c, v) => format!("{} = {}", c.sql(), bind(params, v.clone())),
            Predicate::Ne(c, v) => format!("{} != {}", c.sql(), bind(params, v.clone())),
            Predicate::Gt(c, v) => format!("{} > {}", c.sql(), bind(params, v.clone())),
            Predicate::Between(c, low, high) => {
                let low = bind(params, low.clone());
                let high = bind(params, high.clone());
                format!("{} BETWEEN {} AND {}", c.sql(), low, high)
            }
            Predicate::In(_, values) if values.is_empty() => "1 = 0".to_string(),
            Predicate::In(c, ids) => format!(
                "{} IN (SELECT value FROM json_each({}))",
                c.sql(),
                bind(params, SqlValue::Text(id_array(ids)))
            ),
            Predicate::IsNull(c) => format!("{} IS NULL", c.sql()),
            Predicate::ContainsCi(c, needle) => format!(
                "LOWER({}) LIKE {} ESCAPE '\\'",
                c.sql(),
                bind(params, SqlValue::Text(like_pattern(needle)))
            ),
            Predicate::MessageBodyContains(needle) => format!(
                "EXISTS (SELECT 1 FROM messages m WHERE m.ticket_id = t.id AND LOWER(m.body) LIKE {} ESCAPE '\\')",
                bind(params, SqlValue::Text(like_pattern(needle)))
            ),
            Predicate::And(items) => join(items, " AND ", "1 = 1", params),
            Predicate::Or(items) => join(items, " OR ", "1 = 0", params),
        }
    }
}

fn bind(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
    params.push(value);
    format!("?{}", params.len())
}

fn join(items: &[Predicate], sep: &str, empty: &str, params: &mut Vec<SqlValue>) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = items
        .iter()
        .map(|p| format!("({})", p.write(params)))
        .collect();
    parts.join(sep)
}

/// Lowercased `%needle%` with LIKE wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}
