use std::collections::BTreeMap;
use tres_usage::models::AccountKey;
use tres_usage::report::{
    aggregate_by_account, aggregate_usage, collect_limits, parse_association_report,
    parse_usage_report,
};
use tres_usage::{AssociationLine, LineError, ReportRecord, ScalarCodec, TresKeys, UsageLine};

mod common;

fn keys() -> TresKeys {
    TresKeys::new(["cpu", "mem", "node", "gres/gpu"])
}

#[test]
fn test_unit_integer_multipliers() {
    let multipliers = [("", 1u64), ("K", 1 << 10), ("M", 1 << 20), ("G", 1 << 30), ("T", 1 << 40)];
    for n in [0u64, 1, 7, 64, 1000] {
        for (suffix, factor) in multipliers {
            assert_eq!(
                ScalarCodec::decode_unit_integer(&format!("{n}{suffix}")),
                n * factor,
                "decoding {n}{suffix}"
            );
        }
    }
}

#[test]
fn test_duration_shapes() {
    assert_eq!(ScalarCodec::decode_duration_minutes("00:01:00"), 1.0);
    assert_eq!(ScalarCodec::decode_duration_minutes("00:00:03"), 0.05);
    assert_eq!(ScalarCodec::decode_duration_minutes("00:01:03"), 1.05);
    assert_eq!(ScalarCodec::decode_duration_minutes("850:00:00"), 51000.0);
    assert_eq!(ScalarCodec::decode_duration_minutes("1-00:00:00"), 1440.0);
}

#[test]
fn test_usage_line_example() {
    let line = UsageLine::parse(
        "acctA|cpu=4,mem=2097152|00:10:00|userX",
        &TresKeys::new(["cpu", "mem"]),
    )
    .unwrap();

    let expected: BTreeMap<String, f64> =
        [("cpu".to_string(), 40.0), ("mem".to_string(), 20.0)].into_iter().collect();
    assert_eq!(line.tres_usage(), &expected);
}

#[test]
fn test_missing_equals_dropped() {
    let line = UsageLine::parse("a|cpu=4,bogus,mem=1|00:01:00|u", &keys()).unwrap();

    let resources: Vec<(&str, &str)> = line
        .resources()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(resources, vec![("cpu", "4"), ("mem", "1")]);
}

#[test]
fn test_structurally_invalid_lines_fail() {
    assert_eq!(
        UsageLine::parse("acctA|cpu=4", &keys()).unwrap_err(),
        LineError::TooFewFields {
            expected: 4,
            found: 2
        }
    );
    assert!(AssociationLine::parse("acctA", &keys()).is_err());
}

#[test]
fn test_records_usable_through_trait() {
    fn describe(record: &dyn ReportRecord) -> String {
        format!("{}:{}:{}", record.account(), record.user(), record.resources().len())
    }

    let usage = UsageLine::parse("a|cpu=1|00:01:00|u", &keys()).unwrap();
    let assoc = AssociationLine::parse("a|cpu=1,node=2", &keys()).unwrap();
    assert_eq!(describe(&usage), "a:u:1");
    assert_eq!(describe(&assoc), "a::2");
}

#[test]
fn test_usage_report_aggregation() {
    let report = parse_usage_report(common::USAGE_REPORT, &keys());
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, 5);

    let per_user = aggregate_usage(&report.records);
    let carol = &per_user[&AccountKey::new("acctB", "carol")];
    assert_eq!(carol.line_count, 2);
    assert_eq!(carol.tres_usage["cpu"], 11520.0 + 51000.0);
    assert_eq!(carol.tres_usage["node"], 2880.0);

    let per_account = aggregate_by_account(&report.records);
    let acct_a = &per_account[&AccountKey::account_only("acctA")];
    assert_eq!(acct_a.tres_usage["cpu"], 160.0);
    assert_eq!(acct_a.tres_usage["gres/gpu"], 60.0);
    assert_eq!(acct_a.tres_usage["mem"], 20.0);
}

#[test]
fn test_association_report_limits() {
    let report = parse_association_report(common::ASSOCIATION_REPORT, &keys());
    assert!(report.is_clean());

    let limits = collect_limits(&report.records);
    assert_eq!(limits.len(), 3);
    assert_eq!(limits[&AccountKey::account_only("acctA")]["node"], 10);
    assert_eq!(limits[&AccountKey::new("acctA", "alice")]["mem"], 4096);
    assert_eq!(limits[&AccountKey::account_only("acctB")]["gres/gpu"], 4);
}
