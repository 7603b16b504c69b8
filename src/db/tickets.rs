//! Ticket listing queries.

use super::predicate::Predicate;
use super::{Database, id_array};
use crate::error::Result;
use crate::types::{
    ChannelSummary, ContactSummary, QueueSummary, TagSummary, TicketListItem, TrackingSummary,
    UserSummary,
};
use rusqlite::{Row, params, params_from_iter};
use std::collections::HashMap;

/// A compiled listing request ready to run against the store.
#[derive(Debug, Clone)]
pub struct TicketQuery {
    pub predicate: Predicate,
    /// Join and project the tracking summary.
    pub with_tracking: bool,
    /// `None` returns every matching row.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const TICKET_COLUMNS: &str = "t.id, t.status, t.queue_id, t.user_id, t.contact_id, t.whatsapp_id,
        t.is_group, t.unread_messages, t.last_message, t.created_at, t.updated_at,
        c.id, c.name, c.number, c.email, c.profile_pic_url, c.presence,
        q.id, q.name, q.color,
        u.id, u.name,
        w.id, w.name";

const TICKET_JOINS: &str = "FROM tickets t
        JOIN contacts c ON c.id = t.contact_id
        LEFT JOIN queues q ON q.id = t.queue_id
        LEFT JOIN users u ON u.id = t.user_id
        LEFT JOIN whatsapps w ON w.id = t.whatsapp_id";

const TRACKING_JOIN: &str = "LEFT JOIN ticket_tracking tt ON tt.ticket_id = t.id";

impl Database {
    /// Ids of every ticket carrying `tag_id`.
    pub fn ticket_ids_with_tag(&self, tag_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT ticket_id FROM ticket_tags WHERE tag_id = ?1 ORDER BY ticket_id",
            )?;
            let ids = stmt
                .query_map(params![tag_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            Ok(ids)
        })
    }

    /// Ids of every ticket currently assigned to `user_id`.
    pub fn ticket_ids_assigned_to(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM tickets WHERE user_id = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            Ok(ids)
        })
    }

    /// Count distinct matching tickets and fetch one window of them, newest
    /// update first. Both reads share one snapshot.
    pub fn fetch_ticket_page(&self, query: &TicketQuery) -> Result<(Vec<TicketListItem>, i64)> {
        let compiled = query.predicate.compile();
        let join_tracking = query.with_tracking || query.predicate.touches_tracking();
        let joins = if join_tracking {
            format!("{}\n        {}", TICKET_JOINS, TRACKING_JOIN)
        } else {
            TICKET_JOINS.to_string()
        };

        let count_sql = format!("SELECT COUNT(DISTINCT t.id) {} WHERE {}", joins, compiled.sql);

        let mut sql = format!("SELECT {}", TICKET_COLUMNS);
        if query.with_tracking {
            sql.push_str(", tt.id, tt.rating_at, tt.rated");
        }
        sql.push_str(&format!(
            " {} WHERE {} ORDER BY t.updated_at DESC, t.id DESC",
            joins, compiled.sql
        ));
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, query.offset.unwrap_or(0)));
        }

        tracing::debug!(sql = %sql, params = compiled.params.len(), "ticket listing query");

        self.with_read_snapshot(|conn| {
            let count: i64 = conn.query_row(
                &count_sql,
                params_from_iter(compiled.params.iter()),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&sql)?;
            let mut tickets = stmt
                .query_map(params_from_iter(compiled.params.iter()), |row| {
                    ticket_from_row(row, query.with_tracking)
                })?
                .collect::<rusqlite::Result<Vec<TicketListItem>>>()?;

            if !tickets.is_empty() {
                let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
                let mut tags = load_tags(conn, &ids)?;
                for ticket in &mut tickets {
                    ticket.tags = tags.remove(&ticket.id).unwrap_or_default();
                }
            }

            Ok((tickets, count))
        })
    }
}

fn ticket_from_row(row: &Row<'_>, with_tracking: bool) -> rusqlite::Result<TicketListItem> {
    let queue_id: Option<i64> = row.get(17)?;
    let queue = match queue_id {
        Some(id) => Some(QueueSummary {
            id,
            name: row.get(18)?,
            color: row.get(19)?,
        }),
        None => None,
    };
    let user_id: Option<i64> = row.get(20)?;
    let user = match user_id {
        Some(id) => Some(UserSummary {
            id,
            name: row.get(21)?,
        }),
        None => None,
    };
    let whatsapp_id: Option<i64> = row.get(22)?;
    let whatsapp = match whatsapp_id {
        Some(id) => Some(ChannelSummary {
            id,
            name: row.get(23)?,
        }),
        None => None,
    };
    let tracking = if with_tracking {
        let tracking_id: Option<i64> = row.get(24)?;
        match tracking_id {
            Some(id) => Some(TrackingSummary {
                id,
                rating_at: row.get(25)?,
                rated: row.get(26)?,
            }),
            None => None,
        }
    } else {
        None
    };

    Ok(TicketListItem {
        id: row.get(0)?,
        status: row.get(1)?,
        queue_id: row.get(2)?,
        user_id: row.get(3)?,
        contact_id: row.get(4)?,
        whatsapp_id: row.get(5)?,
        is_group: row.get(6)?,
        unread_messages: row.get(7)?,
        last_message: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        contact: ContactSummary {
            id: row.get(11)?,
            name: row.get(12)?,
            number: row.get(13)?,
            email: row.get(14)?,
            profile_pic_url: row.get(15)?,
            presence: row.get(16)?,
        },
        queue,
        user,
        whatsapp,
        tags: Vec::new(),
        tracking,
    })
}

fn load_tags(
    conn: &rusqlite::Connection,
    ticket_ids: &[i64],
) -> Result<HashMap<i64, Vec<TagSummary>>> {
    let mut stmt = conn.prepare(
        "SELECT x.ticket_id, g.id, g.name, g.color
         FROM ticket_tags x
         JOIN tags g ON g.id = x.tag_id
         WHERE x.ticket_id IN (SELECT value FROM json_each(?1))
         ORDER BY g.name, g.id",
    )?;
    let rows = stmt.query_map(params![id_array(ticket_ids)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            TagSummary {
                id: row.get(1)?,
                name: row.get(2)?,
                color: row.get(3)?,
            },
        ))
    })?;

    let mut by_ticket: HashMap<i64, Vec<TagSummary>> = HashMap::new();
    for row in rows {
        let (ticket_id, tag) = row?;
        by_ticket.entry(ticket_id).or_default().push(tag);
    }
    Ok(by_ticket)
}
