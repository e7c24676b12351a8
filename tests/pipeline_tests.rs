//! End-to-end pipeline tests over a temporary artifact tree: per-month
//! dumps and snapshots in place, then split → merge → leaderboard through
//! the same entry points the CLI uses.

use mpf_etl::config::AppConfig;
use mpf_etl::models::{
    ConsolidatedPayload, FundPricePayload, MergedPayload, SheetRow, TopFundsPayload,
    TrusteesSchemesPayload, UnitPrice,
};
use mpf_etl::pipeline::Pipeline;
use mpf_etl::{storage, transform};
use std::path::Path;
use tempfile::TempDir;

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.raw_dir = root.join("raw");
    config.paths.json_dir = root.join("json");
    config.paths.public_data_dir = root.join("public");
    config
}

fn labelled_row(trustee: &str, scheme: &str, fund: &str, price: f64) -> SheetRow {
    SheetRow {
        trustee_en: Some(trustee.to_string()),
        trustee_zh: Some(format!("{trustee}-zh")),
        scheme_en: Some(scheme.to_string()),
        scheme_zh: Some(format!("{scheme}-zh")),
        trustee: Some(trustee.to_string()),
        scheme: Some(scheme.to_string()),
        fund: Some(fund.to_string()),
        fund_zh: None,
        unit_price: price,
        notes: None,
    }
}

fn unlabelled_row(fund: &str, price: f64) -> SheetRow {
    SheetRow {
        fund: Some(fund.to_string()),
        unit_price: price,
        ..SheetRow::default()
    }
}

/// Lay down one month's worth of upstream artifacts: the consolidated
/// dump (raw rows) plus the monthly price snapshot.
fn seed_month(config: &AppConfig, mon: &str, month_key: &str, rows: Vec<SheetRow>) {
    let base = format!("Consolidated_list_for_{mon}_25_Read_Only");

    storage::write_json(
        &config.paths.json_dir.join(format!("{base}.json")),
        &ConsolidatedPayload {
            source: format!("{base}.xls"),
            sheet: "Sheet1".into(),
            exported_at: "2025-12-31T00:00:00.000Z".into(),
            row_count: rows.len(),
            data: rows.clone(),
        },
    )
    .unwrap();

    let groups = transform::group_by_scheme(&transform::forward_fill(rows));
    storage::write_json(
        &config
            .paths
            .json_dir
            .join(storage::monthly_snapshot_file(month_key)),
        &FundPricePayload {
            source: format!("{base}.json"),
            month_key: Some(month_key.to_string()),
            exported_at: "2025-12-31T00:00:00.000Z".into(),
            count: groups.len(),
            data: groups,
        },
    )
    .unwrap();
}

fn two_month_tree(config: &AppConfig) {
    seed_month(
        config,
        "Nov",
        "2025-11",
        vec![
            labelled_row("Trustee One", "Scheme One", "Fund A", 10.5),
            unlabelled_row("Fund B", 20.0),
        ],
    );
    seed_month(
        config,
        "Dec",
        "2025-12",
        vec![
            labelled_row("Trustee One", "Scheme One", "Fund A", 11.0),
            unlabelled_row("Fund B", 18.0),
        ],
    );
}

#[test]
fn full_pipeline_from_dumps_to_leaderboard() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    two_month_tree(&config);

    let pipeline = Pipeline::new(config.clone());
    pipeline.split_latest().unwrap();
    pipeline.merge_all().unwrap();
    pipeline.leaderboard().unwrap();

    let top: TopFundsPayload = storage::read_json(
        &config.paths.json_dir.join(storage::TOP_FUNDS_FILE),
    )
    .unwrap();

    assert_eq!(top.this_month, "2025-12");
    assert_eq!(top.last_month, "2025-11");
    assert_eq!(top.top10.len(), 2);

    // Fund A +4.76% outranks Fund B -10%.
    assert_eq!(top.top10[0].fund, "Fund A");
    assert_eq!(top.top10[0].rank, 1);
    assert!((top.top10[0].change_percent - (0.5 / 10.5 * 100.0)).abs() < 1e-9);
    assert_eq!(top.top10[0].trustee, "Trustee One");
    assert_eq!(top.top10[0].scheme, "Scheme One");

    assert_eq!(top.top10[1].fund, "Fund B");
    assert_eq!(top.top10[1].rank, 2);
    assert!((top.top10[1].change_percent + 10.0).abs() < 1e-9);

    // Site-facing mirrors exist.
    assert!(config.paths.public_data_dir.join(storage::TOP_FUNDS_FILE).exists());
    assert!(config
        .paths
        .public_data_dir
        .join(storage::FUND_PRICE_SCHEME_FILE)
        .exists());
}

#[test]
fn split_forward_fills_and_rewrites_the_latest_dump() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    two_month_tree(&config);

    Pipeline::new(config.clone()).split_latest().unwrap();

    // The canonical index and snapshot come from the December dump.
    let pairs: TrusteesSchemesPayload = storage::read_json(
        &config.paths.json_dir.join(storage::TRUSTEES_SCHEMES_FILE),
    )
    .unwrap();
    assert_eq!(pairs.count, 1);
    assert_eq!(pairs.month_key, None);
    assert_eq!(pairs.data[0].trustee.en.as_deref(), Some("Trustee One"));
    assert_eq!(pairs.data[0].trustee.zh.as_deref(), Some("Trustee One-zh"));

    let canonical: FundPricePayload = storage::read_json(
        &config.paths.json_dir.join(storage::FUND_PRICE_SCHEME_FILE),
    )
    .unwrap();
    assert_eq!(canonical.source, "Consolidated_list_for_Dec_25_Read_Only.json");
    assert_eq!(canonical.data.len(), 1);
    assert_eq!(canonical.data[0].funds.len(), 2);
    assert_eq!(canonical.data[0].funds[1].unit_price, UnitPrice::Scalar(18.0));

    // The dump itself was rewritten with filled labels.
    let dump: ConsolidatedPayload = storage::read_json(
        &config
            .paths
            .json_dir
            .join("Consolidated_list_for_Dec_25_Read_Only.json"),
    )
    .unwrap();
    assert_eq!(dump.data[1].trustee_en.as_deref(), Some("Trustee One"));
    assert_eq!(dump.data[1].scheme_en.as_deref(), Some("Scheme One"));
}

#[test]
fn merge_builds_one_point_per_month_with_nulls_for_gaps() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    two_month_tree(&config);

    // "Fund C" exists only in December; after splitting on December it is
    // part of the canonical structure, so November shows as null.
    seed_month(
        &config,
        "Dec",
        "2025-12",
        vec![
            labelled_row("Trustee One", "Scheme One", "Fund A", 11.0),
            unlabelled_row("Fund B", 18.0),
            unlabelled_row("Fund C", 7.0),
        ],
    );

    let pipeline = Pipeline::new(config.clone());
    pipeline.split_latest().unwrap();
    pipeline.merge_all().unwrap();

    let merged: MergedPayload = storage::read_json(
        &config.paths.json_dir.join(storage::FUND_PRICE_SCHEME_FILE),
    )
    .unwrap();
    assert_eq!(merged.months, ["2025-11", "2025-12"]);
    assert_eq!(merged.count, 1);

    let fund_c = merged.data[0]
        .funds
        .iter()
        .find(|f| f.fund.as_deref() == Some("Fund C"))
        .unwrap();
    match &fund_c.unit_price {
        UnitPrice::Series(points) => {
            assert_eq!(points.len(), 2);
            assert_eq!((points[0].month.as_str(), points[0].price), ("2025-11", None));
            assert_eq!((points[1].month.as_str(), points[1].price), ("2025-12", Some(7.0)));
        }
        UnitPrice::Scalar(_) => panic!("expected merged series"),
    }
}

#[test]
fn leaderboard_fails_fast_with_one_month_and_writes_nothing() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    seed_month(
        &config,
        "Nov",
        "2025-11",
        vec![labelled_row("Trustee One", "Scheme One", "Fund A", 10.5)],
    );

    let pipeline = Pipeline::new(config.clone());
    pipeline.split_latest().unwrap();
    pipeline.merge_all().unwrap();

    let err = pipeline.leaderboard().unwrap_err();
    assert!(err.to_string().contains("at least 2"));
    assert!(!config.paths.json_dir.join(storage::TOP_FUNDS_FILE).exists());
}

#[test]
fn merge_without_canonical_artifact_is_fatal() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    two_month_tree(&config);

    // No split has run, so fund_price_scheme.json is absent.
    let err = Pipeline::new(config).merge_all().unwrap_err();
    assert!(err.to_string().contains("split"));
}

#[test]
fn run_without_input_workbooks_is_fatal() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    std::fs::create_dir_all(&config.paths.raw_dir).unwrap();

    let err = Pipeline::new(config).run().unwrap_err();
    assert!(err.to_string().contains("no workbooks"));
}
