use chrono::{Duration, TimeZone, Utc};
use proto_news::time_ago::{parse_timestamp, time_ago, time_ago_between};

#[test]
fn test_relative_time_buckets() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

    let cases = [
        (Duration::seconds(30), "Just now"),
        (Duration::seconds(59), "Just now"),
        (Duration::seconds(60), "1 minute ago"),
        (Duration::minutes(5), "5 minutes ago"),
        (Duration::minutes(59), "59 minutes ago"),
        (Duration::minutes(90), "1 hour ago"),
        (Duration::hours(23), "23 hours ago"),
        (Duration::hours(24), "1 day ago"),
        (Duration::hours(50), "2 days ago"),
    ];

    for (age, expected) in cases {
        assert_eq!(time_ago_between(now - age, now), expected, "age {:?}", age);
    }
}

#[test]
fn test_future_timestamps_read_just_now() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    assert_eq!(time_ago_between(now + Duration::hours(3), now), "Just now");
}

#[test]
fn test_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

    assert_eq!(parse_timestamp("2024-03-01 10:00:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T10:00:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T12:00:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T10:00:00.000"), Some(expected));
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_unparseable_timestamp_gives_empty_label() {
    let now = Utc::now();
    assert_eq!(time_ago("not a date", now), "");
    assert_eq!(time_ago("", now), "");
}

#[test]
fn test_sql_timestamp_label() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
    assert_eq!(time_ago("2024-03-01 10:00:00", now), "3 hours ago");
}
