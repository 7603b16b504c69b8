//! Store fixtures shared by the integration tests.
//!
//! Rows are inserted with plain SQL; the crate itself never writes.

#![allow(dead_code)]

use rusqlite::params;
use support_desk_mcp::dates::{MS_PER_DAY, MS_PER_MINUTE};
use support_desk_mcp::db::Database;

pub const COMPANY: i64 = 1;

/// 2024-03-15 00:00:00 UTC.
pub const DAY0: i64 = 19_797 * MS_PER_DAY;

pub fn at(day: i64, hour: i64, minute: i64) -> i64 {
    DAY0 + day * MS_PER_DAY + (hour * 60 + minute) * MS_PER_MINUTE
}

/// Ticket row under construction. `id` doubles as the contact id unless
/// `contact_id` is set.
#[derive(Debug, Clone)]
pub struct TicketRow {
    pub id: i64,
    pub company_id: i64,
    pub status: &'static str,
    pub queue_id: Option<i64>,
    pub user_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub is_group: bool,
    pub unread_messages: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TicketRow {
    pub fn new(id: i64, status: &'static str) -> Self {
        Self {
            id,
            company_id: COMPANY,
            status,
            queue_id: None,
            user_id: None,
            contact_id: None,
            is_group: false,
            unread_messages: 0,
            created_at: at(0, 9, 0),
            updated_at: at(0, 9, 0) + id * MS_PER_MINUTE,
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn queue(mut self, queue_id: i64) -> Self {
        self.queue_id = Some(queue_id);
        self
    }

    pub fn contact(mut self, contact_id: i64) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn group(mut self) -> Self {
        self.is_group = true;
        self
    }

    pub fn unread(mut self, n: i64) -> Self {
        self.unread_messages = n;
        self
    }

    pub fn created(mut self, ms: i64) -> Self {
        self.created_at = ms;
        self
    }

    pub fn updated(mut self, ms: i64) -> Self {
        self.updated_at = ms;
        self
    }
}

/// Tracking row under construction.
#[derive(Debug, Clone)]
pub struct TrackingRow {
    pub ticket_id: i64,
    pub user_id: Option<i64>,
    pub queued_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub rating_at: Option<i64>,
    pub rated: bool,
    pub created_at: i64,
}

impl TrackingRow {
    pub fn new(ticket_id: i64, queued_at: i64) -> Self {
        Self {
            ticket_id,
            user_id: None,
            queued_at,
            started_at: None,
            finished_at: None,
            rating_at: None,
            rated: false,
            created_at: queued_at,
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn started(mut self, ms: i64) -> Self {
        self.started_at = Some(ms);
        self
    }

    pub fn finished(mut self, ms: i64) -> Self {
        self.finished_at = Some(ms);
        self
    }

    pub fn rating(mut self, ms: i64, rated: bool) -> Self {
        self.rating_at = Some(ms);
        self.rated = rated;
        self
    }

    pub fn created(mut self, ms: i64) -> Self {
        self.created_at = ms;
        self
    }
}

/// In-memory store with one company already present.
pub struct Fixture {
    pub db: Database,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        let fx = Self { db };
        fx.company(COMPANY, "Acme");
        fx
    }

    pub fn exec(&self, sql: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .expect("fixture SQL failed");
    }

    pub fn company(&self, id: i64, name: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO companies (id, name) VALUES (?1, ?2)",
                    params![id, name],
                )?;
                Ok(())
            })
            .expect("insert company");
    }

    pub fn admin(&self, id: i64, name: &str) {
        self.user_in(id, COMPANY, name, "admin");
    }

    pub fn agent(&self, id: i64, name: &str) {
        self.user_in(id, COMPANY, name, "agent");
    }

    pub fn user_in(&self, id: i64, company_id: i64, name: &str, profile: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (id, company_id, name, profile) VALUES (?1, ?2, ?3, ?4)",
                    params![id, company_id, name, profile],
                )?;
                Ok(())
            })
            .expect("insert user");
    }

    /// Create the queue if needed and add the user to it.
    pub fn join_queue(&self, user_id: i64, queue_id: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO queues (id, company_id, name) VALUES (?1, ?2, ?3)",
                    params![queue_id, COMPANY, format!("Queue {}", queue_id)],
                )?;
                conn.execute(
                    "INSERT INTO user_queues (user_id, queue_id) VALUES (?1, ?2)",
                    params![user_id, queue_id],
                )?;
                Ok(())
            })
            .expect("join queue");
    }

    pub fn queue(&self, queue_id: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO queues (id, company_id, name) VALUES (?1, ?2, ?3)",
                    params![queue_id, COMPANY, format!("Queue {}", queue_id)],
                )?;
                Ok(())
            })
            .expect("insert queue");
    }

    pub fn contact(&self, id: i64, name: &str, number: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO contacts (id, company_id, name, number)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, COMPANY, name, number],
                )?;
                Ok(())
            })
            .expect("insert contact");
    }

    /// Insert a ticket, creating its contact and queue when missing.
    pub fn ticket(&self, row: TicketRow) -> i64 {
        let contact_id = row.contact_id.unwrap_or(row.id);
        let name = format!("Contact {}", contact_id);
        self.contact(contact_id, &name, &format!("5500{}", contact_id));
        if let Some(queue_id) = row.queue_id {
            self.queue(queue_id);
        }
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO tickets (id, company_id, status, queue_id, user_id, contact_id,
                        is_group, unread_messages, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        row.id,
                        row.company_id,
                        row.status,
                        row.queue_id,
                        row.user_id,
                        contact_id,
                        row.is_group,
                        row.unread_messages,
                        row.created_at,
                        row.updated_at,
                    ],
                )?;
                Ok(())
            })
            .expect("insert ticket");
        row.id
    }

    pub fn tracking(&self, row: TrackingRow) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO ticket_tracking (ticket_id, company_id, user_id, queued_at,
                        started_at, finished_at, rating_at, rated, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        row.ticket_id,
                        COMPANY,
                        row.user_id,
                        row.queued_at,
                        row.started_at,
                        row.finished_at,
                        row.rating_at,
                        row.rated,
                        row.created_at,
                    ],
                )?;
                Ok(())
            })
            .expect("insert tracking");
    }

    /// Attach a tag, creating it when missing.
    pub fn tag(&self, ticket_id: i64, tag_id: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO tags (id, company_id, name) VALUES (?1, ?2, ?3)",
                    params![tag_id, COMPANY, format!("tag-{}", tag_id)],
                )?;
                conn.execute(
                    "INSERT INTO ticket_tags (ticket_id, tag_id) VALUES (?1, ?2)",
                    params![ticket_id, tag_id],
                )?;
                Ok(())
            })
            .expect("tag ticket");
    }

    pub fn message(&self, ticket_id: i64, body: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO messages (ticket_id, body, created_at) VALUES (?1, ?2, ?3)",
                    params![ticket_id, body, DAY0],
                )?;
                Ok(())
            })
            .expect("insert message");
    }

    pub fn rating(&self, user_id: i64, rate: f64, created_at: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO user_ratings (user_id, rate, created_at) VALUES (?1, ?2, ?3)",
                    params![user_id, rate, created_at],
                )?;
                Ok(())
            })
            .expect("insert rating");
    }

    pub fn setting(&self, key: &str, value: &str) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO settings (company_id, key, value) VALUES (?1, ?2, ?3)",
                    params![COMPANY, key, value],
                )?;
                Ok(())
            })
            .expect("set setting");
    }

    pub fn online(&self, user_id: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO user_socket_sessions (user_id, active) VALUES (?1, 1)",
                    params![user_id],
                )?;
                Ok(())
            })
            .expect("insert session");
    }
}
