use super::*;

fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid date")
}

#[test]
fn hourly_schedule_advances_by_one_hour() {
    let now = dt(2026, 1, 1, 0);
    let next = compute_next(now, ScheduleFrequency::Hourly, Tz::UTC);
    assert_eq!(next, dt(2026, 1, 1, 1));
}

#[test]
fn daily_schedule_lands_on_next_nine_am() {
    let now = dt(2026, 1, 1, 3); // 3am, before today's anchor
    let next = compute_next(now, ScheduleFrequency::Daily, Tz::UTC);
    assert_eq!(next, dt(2026, 1, 1, 9));

    let now_after_anchor = dt(2026, 1, 1, 10); // past today's 09:00
    let next = compute_next(now_after_anchor, ScheduleFrequency::Daily, Tz::UTC);
    assert_eq!(next, dt(2026, 1, 2, 9));
}

#[test]
fn weekly_schedule_lands_on_next_monday_nine_am() {
    // 2026-01-01 is a Thursday.
    let now = dt(2026, 1, 1, 12);
    let next = compute_next(now, ScheduleFrequency::Weekly, Tz::UTC);
    assert_eq!(next, dt(2026, 1, 5, 9)); // the following Monday
    assert_eq!(next.weekday(), chrono::Weekday::Mon);
}

#[test]
fn monthly_schedule_lands_on_first_of_next_month_nine_am() {
    let now = dt(2026, 1, 31, 23);
    let next = compute_next(now, ScheduleFrequency::Monthly, Tz::UTC);
    assert_eq!(next, dt(2026, 2, 1, 9));
}

#[test]
fn once_schedule_deactivates_after_firing() {
    let mut schedule = Schedule::builder().frequency(ScheduleFrequency::Once).build();
    assert!(schedule.active);
    schedule.record_fire(Utc::now());
    assert!(!schedule.active);
    assert!(schedule.next_run_at.is_none());
    assert_eq!(schedule.total_runs, 1);
}

#[test]
fn recurring_schedule_stays_active_and_advances_next_run() {
    let mut schedule = Schedule::builder().frequency(ScheduleFrequency::Hourly).build();
    let now = dt(2026, 1, 1, 0);
    schedule.record_fire(now);
    assert!(schedule.active);
    assert_eq!(schedule.next_run_at, Some(dt(2026, 1, 1, 1)));
    assert_eq!(schedule.total_runs, 1);
}

#[test]
fn is_due_respects_active_flag_and_missing_next_run() {
    let mut schedule = Schedule::builder().next_run_at(Some(dt(2026, 1, 1, 0))).build();
    schedule.active = false;
    assert!(!schedule.is_due(dt(2026, 1, 2, 0)));
    schedule.active = true;
    assert!(schedule.is_due(dt(2026, 1, 2, 0)));
    schedule.next_run_at = None;
    assert!(!schedule.is_due(dt(2026, 1, 2, 0)));
}

#[test]
fn success_rate_reflects_recorded_outcomes() {
    let mut schedule = Schedule::builder().build();
    assert_eq!(schedule.success_rate(), 0.0);
    schedule.total_runs = 4;
    schedule.record_outcome(true);
    schedule.record_outcome(true);
    schedule.record_outcome(false);
    assert_eq!(schedule.successful_runs, 2);
    assert_eq!(schedule.failed_runs, 1);
    assert_eq!(schedule.success_rate(), 50.0);
}

#[test]
fn compute_next_is_pure_for_non_custom_frequencies() {
    let now = dt(2026, 3, 15, 6);
    let a = compute_next(now, ScheduleFrequency::Daily, Tz::UTC);
    let b = compute_next(now, ScheduleFrequency::Daily, Tz::UTC);
    assert_eq!(a, b);
}
