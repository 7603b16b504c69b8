//! Acting-user scope and company settings lookups.

use super::Database;
use crate::error::{DeskError, Result};
use crate::types::{Profile, Scope};
use rusqlite::{OptionalExtension, params};
use std::collections::BTreeSet;

/// Setting that splits group conversations into their own listing tab.
pub const SETTING_GROUPS_TAB: &str = "groupsTab";
/// Setting that marks group conversations as ignored by attendants.
pub const SETTING_CHECK_MSG_IS_GROUP: &str = "CheckMsgIsGroup";

impl Database {
    /// Load the role and queue memberships of `user_id`.
    pub fn resolve_scope(&self, user_id: i64) -> Result<Scope> {
        self.with_conn(|conn| {
            let row: Option<(i64, Profile)> = conn
                .query_row(
                    "SELECT company_id, profile FROM users WHERE id = ?1",
                    params![user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (company_id, profile) = row.ok_or_else(|| DeskError::not_found("user", user_id))?;

            let mut stmt =
                conn.prepare("SELECT queue_id FROM user_queues WHERE user_id = ?1")?;
            let queue_ids = stmt
                .query_map(params![user_id], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<BTreeSet<i64>>>()?;

            Ok(Scope {
                user_id,
                company_id,
                profile,
                queue_ids,
            })
        })
    }

    /// Read a company setting, falling back to `default` when unset.
    pub fn get_company_setting(&self, company_id: i64, key: &str, default: &str) -> Result<String> {
        self.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE company_id = ?1 AND key = ?2",
                    params![company_id, key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.unwrap_or_else(|| default.to_string()))
        })
    }

    /// Whether a company setting reads "enabled".
    pub fn setting_enabled(&self, company_id: i64, key: &str, default: &str) -> Result<bool> {
        Ok(self.get_company_setting(company_id, key, default)? == "enabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO companies (id, name) VALUES (1, 'Acme');
                 INSERT INTO users (id, company_id, name, profile) VALUES (10, 1, 'Ana', 'agent');
                 INSERT INTO users (id, company_id, name, profile) VALUES (11, 1, 'Root', 'admin');
                 INSERT INTO queues (id, company_id, name) VALUES (100, 1, 'Sales'), (101, 1, 'Support');
                 INSERT INTO user_queues (user_id, queue_id) VALUES (10, 100), (10, 101);
                 INSERT INTO settings (company_id, key, value) VALUES (1, 'groupsTab', 'enabled');",
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_resolve_scope_loads_queues() {
        let db = seeded();
        let scope = db.resolve_scope(10).unwrap();
        assert_eq!(scope.company_id, 1);
        assert_eq!(scope.profile, Profile::Agent);
        assert_eq!(scope.queue_ids, BTreeSet::from([100, 101]));
        assert!(!scope.is_admin());
        assert!(db.resolve_scope(11).unwrap().is_admin());
    }

    #[test]
    fn test_resolve_scope_unknown_user() {
        let db = seeded();
        let err = db.resolve_scope(999).unwrap_err();
        assert!(matches!(err, DeskError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn test_settings_default_and_override() {
        let db = seeded();
        assert!(db.setting_enabled(1, SETTING_GROUPS_TAB, "disabled").unwrap());
        assert!(db.setting_enabled(1, SETTING_CHECK_MSG_IS_GROUP, "enabled").unwrap());
        assert!(!db.setting_enabled(2, SETTING_GROUPS_TAB, "disabled").unwrap());
    }
}
