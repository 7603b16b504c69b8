//! Integration tests for dashboard counters and the per-agent breakdown.

mod common;

use common::{Fixture, TicketRow, TrackingRow, at};
use support_desk_mcp::dates::MS_PER_DAY;
use support_desk_mcp::db::now_ms;
use support_desk_mcp::error::ErrorCode;
use support_desk_mcp::reports::{DashboardRequest, dashboard_data};
use support_desk_mcp::types::{AttendantStats, DashboardData};

const ADMIN: i64 = 1;
const ANA: i64 = 2;
const BRUNO: i64 = 3;

fn desk() -> Fixture {
    let fx = Fixture::new();
    fx.admin(ADMIN, "Admin");
    fx.agent(ANA, "Ana");
    fx.agent(BRUNO, "Bruno");
    fx.join_queue(BRUNO, 10);
    fx
}

fn as_user(user_id: i64) -> DashboardRequest {
    DashboardRequest {
        user_id,
        ..Default::default()
    }
}

fn dashboard(fx: &Fixture, req: DashboardRequest) -> DashboardData {
    dashboard_data(&fx.db, &req).expect("dashboard failed")
}

fn attendant(data: &DashboardData, id: i64) -> &AttendantStats {
    data.attendants
        .iter()
        .find(|a| a.id == id)
        .unwrap_or_else(|| panic!("no attendant {}", id))
}

/// Ana handled one ticket: queued 10:00, started 10:05, finished 10:35.
fn handled_ticket(fx: &Fixture) {
    fx.ticket(TicketRow::new(1, "closed").user(ANA));
    fx.tracking(
        TrackingRow::new(1, at(0, 10, 0))
            .user(ANA)
            .started(at(0, 10, 5))
            .finished(at(0, 10, 35)),
    );
}

mod counter_tests {
    use super::*;

    #[test]
    fn wait_and_support_minutes() {
        let fx = desk();
        handled_ticket(&fx);

        let data = dashboard(&fx, as_user(ADMIN));
        assert_eq!(data.counters.avg_wait_time, 5.0);
        assert_eq!(data.counters.avg_support_time, 30.0);
        assert_eq!(data.counters.support_finished, 1);
    }

    #[test]
    fn zero_durations_do_not_dilute_company_averages() {
        let fx = desk();
        handled_ticket(&fx);
        fx.ticket(TicketRow::new(2, "pending"));
        fx.tracking(TrackingRow::new(2, at(0, 11, 0)));

        let data = dashboard(&fx, as_user(ADMIN));
        assert_eq!(data.counters.avg_wait_time, 5.0);
        assert_eq!(data.counters.avg_support_time, 30.0);
        assert_eq!(data.counters.support_finished, 1);
    }

    #[test]
    fn empty_store_reports_zeros() {
        let fx = desk();
        let data = dashboard(&fx, as_user(ADMIN));
        assert_eq!(data.counters.avg_wait_time, 0.0);
        assert_eq!(data.counters.support_pending, 0);
        assert_eq!(data.counters.leads, 0);
        assert_eq!(data.attendants.len(), 3);
    }

    #[test]
    fn window_limits_view_but_not_live_counters() {
        let fx = desk();
        let eight_days_ago = now_ms() - 8 * MS_PER_DAY;

        fx.ticket(TicketRow::new(1, "closed").user(ANA).created(eight_days_ago));
        fx.tracking(
            TrackingRow::new(1, eight_days_ago)
                .started(eight_days_ago + 60_000)
                .finished(eight_days_ago + 120_000),
        );
        fx.ticket(TicketRow::new(2, "open").user(ANA).created(eight_days_ago));
        fx.tracking(TrackingRow::new(2, eight_days_ago).started(eight_days_ago + 60_000));
        fx.ticket(TicketRow::new(3, "pending").created(eight_days_ago));

        let req = DashboardRequest {
            days: Some(7),
            ..as_user(ADMIN)
        };
        let data = dashboard(&fx, req);
        assert_eq!(data.counters.support_finished, 0);
        assert_eq!(data.counters.avg_support_time, 0.0);
        assert_eq!(data.counters.support_happening, 1);
        assert_eq!(data.counters.support_pending, 1);

        // Lifetime counts ignore the window.
        let ana = attendant(&data, ANA);
        assert_eq!(ana.tickets, 0);
        assert_eq!(ana.close_count, 1);
        assert_eq!(ana.open_count, 1);

        let data = dashboard(&fx, as_user(ADMIN));
        assert_eq!(data.counters.support_finished, 1);
    }

    #[test]
    fn date_bounds_are_inclusive_days() {
        let fx = desk();
        for (id, day) in [(1, 0), (2, 1), (3, 2), (4, 3)] {
            fx.ticket(TicketRow::new(id, "closed"));
            fx.tracking(
                TrackingRow::new(id, at(day, 23, 0))
                    .started(at(day, 23, 1))
                    .finished(at(day, 23, 2)),
            );
        }

        let req = DashboardRequest {
            date_from: Some("2024-03-16".into()),
            date_to: Some("2024-03-17".into()),
            ..as_user(ADMIN)
        };
        assert_eq!(dashboard(&fx, req).counters.support_finished, 2);
    }

    #[test]
    fn leads_are_contacts_seen_once() {
        let fx = desk();
        fx.contact(70, "Returning", "1");
        fx.contact(71, "New", "2");
        for (id, contact) in [(1, 70), (2, 70), (3, 71)] {
            fx.ticket(TicketRow::new(id, "pending").contact(contact));
            fx.tracking(TrackingRow::new(id, at(0, 9, id)));
        }

        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.leads, 1);
    }

    #[test]
    fn agent_pending_count_follows_queues() {
        let fx = desk();
        fx.ticket(TicketRow::new(1, "pending").queue(10));
        fx.ticket(TicketRow::new(2, "pending").queue(20));
        fx.ticket(TicketRow::new(3, "pending"));

        assert_eq!(dashboard(&fx, as_user(BRUNO)).counters.support_pending, 1);
        assert_eq!(dashboard(&fx, as_user(ANA)).counters.support_pending, 2);
        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_pending, 3);
    }

    #[test]
    fn finished_pending_tickets_are_not_pending() {
        let fx = desk();
        fx.ticket(TicketRow::new(1, "pending"));
        fx.tracking(
            TrackingRow::new(1, at(0, 9, 0))
                .started(at(0, 9, 1))
                .finished(at(0, 9, 2)),
        );

        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_pending, 0);
    }

    #[test]
    fn pending_group_conversations_follow_settings() {
        let fx = desk();
        fx.ticket(TicketRow::new(1, "pending"));
        fx.ticket(TicketRow::new(2, "pending").group());

        // Groups are ignored by default.
        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_pending, 1);

        fx.setting("CheckMsgIsGroup", "disabled");
        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_pending, 2);

        fx.setting("groupsTab", "enabled");
        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_pending, 1);
    }

    #[test]
    fn happening_counts_agent_own_open_tickets() {
        let fx = desk();
        fx.ticket(TicketRow::new(1, "open").user(ANA));
        fx.ticket(TicketRow::new(2, "open").user(BRUNO));

        assert_eq!(dashboard(&fx, as_user(ANA)).counters.support_happening, 1);
        assert_eq!(dashboard(&fx, as_user(ADMIN)).counters.support_happening, 2);
    }
}

mod attendant_tests {
    use super::*;

    #[test]
    fn admin_sees_every_agent_ordered_by_name() {
        let fx = desk();
        fx.agent(4, "Aaron");

        let data = dashboard(&fx, as_user(ADMIN));
        let names: Vec<&str> = data.attendants.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Aaron", "Admin", "Ana", "Bruno"]);
    }

    #[test]
    fn agent_sees_only_itself() {
        let fx = desk();
        handled_ticket(&fx);
        fx.ticket(TicketRow::new(2, "closed").user(BRUNO));
        fx.tracking(
            TrackingRow::new(2, at(0, 9, 0))
                .started(at(0, 9, 30))
                .finished(at(0, 11, 0)),
        );

        let data = dashboard(&fx, as_user(ANA));
        assert_eq!(data.attendants.len(), 1);
        assert_eq!(data.attendants[0].id, ANA);
        assert_eq!(data.counters.support_finished, 1);
        assert_eq!(data.counters.avg_wait_time, 5.0);
    }

    #[test]
    fn unassigned_ticket_counts_for_tracking_agent() {
        let fx = desk();
        fx.ticket(TicketRow::new(1, "pending"));
        fx.tracking(
            TrackingRow::new(1, at(0, 9, 0))
                .user(ANA)
                .started(at(0, 9, 10))
                .finished(at(0, 9, 20)),
        );

        let data = dashboard(&fx, as_user(ANA));
        assert_eq!(data.counters.support_finished, 1);
        assert_eq!(data.counters.avg_support_time, 10.0);
    }

    #[test]
    fn agent_averages_include_zero_durations() {
        let fx = desk();
        handled_ticket(&fx);
        fx.ticket(TicketRow::new(2, "open").user(ANA));
        fx.tracking(TrackingRow::new(2, at(0, 12, 0)));

        let data = dashboard(&fx, as_user(ADMIN));
        let ana = attendant(&data, ANA);
        assert_eq!(ana.tickets, 2);
        assert_eq!(ana.avg_wait_time, 2.5);
        assert_eq!(ana.avg_support_time, 15.0);
        assert_eq!(data.counters.avg_wait_time, 5.0);
    }

    #[test]
    fn rating_matches_ratings_given_on_finish_day() {
        let fx = desk();
        handled_ticket(&fx);
        fx.rating(ANA, 4.0, at(0, 18, 0));
        fx.rating(ANA, 2.0, at(0, 20, 0));
        fx.rating(ANA, 5.0, at(1, 9, 0));

        let data = dashboard(&fx, as_user(ADMIN));
        assert_eq!(attendant(&data, ANA).rating, 3.0);
        assert_eq!(attendant(&data, BRUNO).rating, 0.0);
    }

    #[test]
    fn online_follows_active_sessions() {
        let fx = desk();
        fx.online(ANA);
        fx.exec("INSERT INTO user_socket_sessions (user_id, active) VALUES (3, 0)");

        let data = dashboard(&fx, as_user(ADMIN));
        assert!(attendant(&data, ANA).online);
        assert!(!attendant(&data, BRUNO).online);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn unknown_user_is_not_found() {
        let fx = desk();
        let err = dashboard_data(&fx.db, &as_user(404)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn bad_window_names_its_field() {
        let fx = desk();
        let req = DashboardRequest {
            date_from: Some("not-a-date".into()),
            ..as_user(ADMIN)
        };
        let err = dashboard_data(&fx.db, &req).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.field(), Some("date_from"));

        let req = DashboardRequest {
            days: Some(-3),
            ..as_user(ADMIN)
        };
        assert_eq!(dashboard_data(&fx.db, &req).unwrap_err().field(), Some("days"));
    }

    #[test]
    fn foreign_company_is_rejected() {
        let fx = desk();
        let req = DashboardRequest {
            company_id: Some(9),
            ..as_user(ADMIN)
        };
        let err = dashboard_data(&fx.db, &req).unwrap_err();
        assert_eq!(err.field(), Some("company_id"));
    }
}
