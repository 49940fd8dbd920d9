// tests/datetime_normalize.rs
use itsm_automation::datetime::{
    apply_offset_hours, modify_time, parse_canonical, shift, to_issue_tracker_format,
    to_ticketing_format, Direction, TimeDelta,
};
use itsm_automation::AutomationError;

#[test]
fn canonical_round_trips_into_servicenow_format() {
    let t = parse_canonical("2022-01-16T16:39:43Z").unwrap();
    assert_eq!(to_ticketing_format(t), "2022-01-16 16:39:43");
}

#[test]
fn shift_by_a_day_and_back() {
    let t = parse_canonical("2022-01-16T16:39:43Z").unwrap();
    let one_day = TimeDelta {
        days: 1,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };
    let later = shift(t, one_day, Direction::Add).unwrap();
    assert_eq!(later, parse_canonical("2022-01-17T16:39:43Z").unwrap());
    assert_eq!(shift(later, one_day, Direction::Subtract).unwrap(), t);
}

#[test]
fn shift_crosses_month_and_year_boundaries() {
    let t = parse_canonical("2021-12-31T23:30:00Z").unwrap();
    let out = shift(t, TimeDelta::minutes(45), Direction::Add).unwrap();
    assert_eq!(out.to_string(), "2022-01-01T00:15:00Z");

    let leap = parse_canonical("2024-03-01T00:00:00Z").unwrap();
    let back = shift(leap, TimeDelta::seconds(1), Direction::Subtract).unwrap();
    assert_eq!(to_ticketing_format(back), "2024-02-29 23:59:59");
}

#[test]
fn unknown_modifier_is_rejected() {
    let err = modify_time("2022-01-16T16:39:43Z", "sideways", TimeDelta::days(1)).unwrap_err();
    assert_eq!(err, AutomationError::InvalidModifier("sideways".into()));
}

#[test]
fn modify_time_outputs_servicenow_format() {
    let out = modify_time("2022-01-16T16:39:43Z", "  SUBTRACT ", TimeDelta::hours(17)).unwrap();
    assert_eq!(out, "2022-01-15 23:39:43");
}

#[test]
fn modify_time_rejects_bad_input_before_modifier() {
    let err = modify_time("2022-01-16 16:39:43", "sideways", TimeDelta::default()).unwrap_err();
    assert!(matches!(err, AutomationError::MalformedTimestamp { .. }));
}

#[test]
fn jira_offsets_compose_add_then_subtract() {
    let t = parse_canonical("2022-02-06T09:50:37Z").unwrap();
    let out = apply_offset_hours(t, Some(2), Some(1)).unwrap();
    assert_eq!(to_issue_tracker_format(out, false), "2022-02-06 10:50");
    assert_eq!(to_issue_tracker_format(out, true), "2022-02-06T10:50:37Z");
}

#[test]
fn malformed_inputs_name_the_offender() {
    let err = parse_canonical("2022-01-32T00:00:00Z").unwrap_err();
    match err {
        AutomationError::MalformedTimestamp { input, .. } => {
            assert_eq!(input, "2022-01-32T00:00:00Z")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
