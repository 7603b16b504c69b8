//! Dashboard reporting over a time window.

use crate::dates::{MS_PER_DAY, end_of_day_ms, parse_day, start_of_day_ms};
use crate::db::dashboard::{DashboardQuery, TimeWindow};
use crate::db::scope::{SETTING_CHECK_MSG_IS_GROUP, SETTING_GROUPS_TAB};
use crate::db::{Database, now_ms};
use crate::error::{DeskError, Result};
use crate::types::DashboardData;
use serde::{Deserialize, Serialize};

/// Inputs of one dashboard computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardRequest {
    /// Acting user.
    pub user_id: i64,
    /// Must match the acting user's company when given.
    pub company_id: Option<i64>,
    /// Trailing window ending now.
    pub days: Option<i64>,
    /// First included day, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Last included day, `YYYY-MM-DD`.
    pub date_to: Option<String>,
}

impl DashboardRequest {
    /// Validate and convert the window bounds, relative to `now`.
    pub fn window(&self, now: i64) -> Result<TimeWindow> {
        let since_ms = match self.days {
            Some(days) if days < 0 => {
                return Err(DeskError::invalid(
                    "days",
                    format!("must not be negative, got {}", days),
                ));
            }
            Some(days) => Some(now - days.saturating_mul(MS_PER_DAY)),
            None => None,
        };
        let from_ms = self
            .date_from
            .as_deref()
            .map(|raw| parse_day("date_from", raw).map(start_of_day_ms))
            .transpose()?;
        let to_ms = self
            .date_to
            .as_deref()
            .map(|raw| parse_day("date_to", raw).map(end_of_day_ms))
            .transpose()?;
        Ok(TimeWindow {
            since_ms,
            from_ms,
            to_ms,
        })
    }
}

/// Compute the dashboard for the acting user's scope.
pub fn dashboard_data(db: &Database, req: &DashboardRequest) -> Result<DashboardData> {
    let window = req.window(now_ms())?;

    let scope = db.resolve_scope(req.user_id)?;
    if let Some(company_id) = req.company_id.filter(|&id| id != scope.company_id) {
        return Err(DeskError::invalid(
            "company_id",
            format!("user {} does not belong to company {}", scope.user_id, company_id),
        ));
    }

    let groups_tab = db.setting_enabled(scope.company_id, SETTING_GROUPS_TAB, "disabled")?;
    let groups_ignored =
        db.setting_enabled(scope.company_id, SETTING_CHECK_MSG_IS_GROUP, "enabled")?;

    db.dashboard(&DashboardQuery {
        scope,
        window,
        exclude_pending_groups: groups_tab || groups_ignored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_are_anded() {
        let req = DashboardRequest {
            days: Some(7),
            date_from: Some("1970-01-02".into()),
            date_to: Some("1970-01-03".into()),
            ..Default::default()
        };
        let window = req.window(10 * MS_PER_DAY).unwrap();
        assert_eq!(window.since_ms, Some(3 * MS_PER_DAY));
        assert_eq!(window.from_ms, Some(MS_PER_DAY));
        assert_eq!(window.to_ms, Some(3 * MS_PER_DAY - 1));
    }

    #[test]
    fn test_empty_window() {
        let window = DashboardRequest::default().window(0).unwrap();
        assert_eq!(window, TimeWindow::default());
    }

    #[test]
    fn test_window_rejects_bad_input() {
        let req = DashboardRequest {
            date_to: Some("31/12/2024".into()),
            ..Default::default()
        };
        assert_eq!(req.window(0).unwrap_err().field(), Some("date_to"));

        let req = DashboardRequest {
            days: Some(-1),
            ..Default::default()
        };
        assert_eq!(req.window(0).unwrap_err().field(), Some("days"));
    }
}
