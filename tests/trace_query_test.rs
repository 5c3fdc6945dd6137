// ==========================================
// 追溯查询与归档集成测试
// ==========================================
// 测试目标: 实时 + 归档联合查询、上限截断、历史状态值兼容
// ==========================================

mod test_helpers;

use chrono::{Duration, NaiveDateTime};
use production_trace::repository::{Collection, ScanRecordRepository, ScanRecordStore};
use production_trace::{
    ApiError, RecordFilter, ScanContext, ScanOutcome, ScanRecord, ScanSettings, ScanStatus,
    TraceQuery,
};
use test_helpers::setup_api;

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// 写入已入库的历史记录（扫码时间 = now - days_ago 天 - i 分钟）
fn seed_warehouse(store: &ScanRecordRepository, prefix: &str, count: usize, days_ago: i64) {
    let ctx = ScanContext::new("WP1", "ABC", "OP01");
    for i in 0..count {
        let scanned_at = now() - Duration::days(days_ago) - Duration::minutes(i as i64);
        let mut record = ScanRecord::new_boxed(&ctx, &format!("{}{:03}", prefix, i), scanned_at);
        record.status = ScanStatus::Warehouse;
        record.batch_code = Some(format!("{}-B", prefix));
        record.pallet_code = Some(format!("{}-P", prefix));
        store.insert_one(Collection::Live, &record).unwrap();
    }
}

#[test]
fn test_archive_then_query_spans_both_collections() {
    let (_temp_file, conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    let store = ScanRecordRepository::new(conn);

    seed_warehouse(&store, "ABCOLD", 3, 200);
    seed_warehouse(&store, "ABCNEW", 2, 1);
    // 未封闭容器里的旧记录不归档
    let mut open = ScanRecord::new_boxed(
        &ScanContext::new("WP1", "ABC", "OP01"),
        "ABCOPEN",
        now() - Duration::days(300),
    );
    open.status = ScanStatus::Box;
    store.insert_one(Collection::Live, &open).unwrap();

    let moved = api.archive_closed_records(None, "admin").unwrap();
    assert_eq!(moved, 3);
    assert_eq!(
        store
            .count(Collection::Archive, &RecordFilter::new())
            .unwrap(),
        3
    );
    assert_eq!(store.count(Collection::Live, &RecordFilter::new()).unwrap(), 3);

    // 实时记录在前（最新优先）,归档补足
    let result = api
        .query(&TraceQuery::new(RecordFilter::container("WP1", "ABC")))
        .unwrap();
    assert_eq!(result.records.len(), 6);
    assert!(!result.truncated);
    assert!(result.records[..3]
        .iter()
        .all(|r| !r.unit_code.starts_with("ABCOLD")));
    assert!(result.records[3..]
        .iter()
        .all(|r| r.unit_code.starts_with("ABCOLD")));

    // 归档中的托盘码仍可追溯
    let by_pallet = api
        .query(&TraceQuery::new(RecordFilter::new().any_code("ABCOLD-P")))
        .unwrap();
    assert_eq!(by_pallet.records.len(), 3);
}

#[test]
fn test_query_cap_and_truncation() {
    let settings = ScanSettings {
        query_default_cap: 4,
        query_defect_export_cap: 50,
        ..ScanSettings::default()
    };
    let (_temp_file, conn, api) = setup_api(settings).expect("setup failed");
    let store = ScanRecordRepository::new(conn);
    seed_warehouse(&store, "ABCOLD", 5, 200);
    seed_warehouse(&store, "ABCNEW", 3, 1);
    api.archive_closed_records(Some(30), "admin").unwrap();

    let filter = RecordFilter::container("WP1", "ABC");

    // 默认上限 4: 实时 3 条 + 归档 1 条
    let capped = api.query(&TraceQuery::new(filter.clone())).unwrap();
    assert_eq!(capped.records.len(), 4);
    assert!(capped.truncated);

    // 请求上限高于用途上限时取用途上限
    let over = api
        .query(&TraceQuery::new(filter.clone()).with_limit(100))
        .unwrap();
    assert_eq!(over.records.len(), 4);

    // 请求上限较小时只查实时集合
    let small = api
        .query(&TraceQuery::new(filter.clone()).with_limit(2))
        .unwrap();
    assert_eq!(small.records.len(), 2);
    assert!(small.truncated);
    assert!(small.records.iter().all(|r| r.unit_code.starts_with("ABCNEW")));

    // 缺陷导出使用更大的上限
    let export = api
        .query(&TraceQuery::new(filter).for_defect_export())
        .unwrap();
    assert_eq!(export.records.len(), 8);
    assert!(!export.truncated);
}

#[test]
fn test_legacy_suffixed_status_is_classified() {
    let (_temp_file, conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    {
        let store = ScanRecordRepository::new(conn.clone());
        seed_warehouse(&store, "ABCLEG", 1, 2);
    }
    {
        let guard = conn.lock().unwrap();
        guard
            .execute(
                "UPDATE scan_record SET status = 'rework2' WHERE unit_code = 'ABCLEG000'",
                [],
            )
            .unwrap();
    }

    let result = api
        .query(&TraceQuery::new(
            RecordFilter::new().status(ScanStatus::Rework),
        ))
        .unwrap();
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].status, ScanStatus::Rework);

    // 旧返工记录不阻止同码重扫
    let rescan = api
        .scan_unit(&ScanContext::new("WP1", "ABC", "OP01"), "ABCLEG000")
        .unwrap();
    assert!(rescan.outcome.is_saved());
}

#[test]
fn test_archive_rejects_non_positive_days() {
    let (_temp_file, _conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    assert!(matches!(
        api.archive_closed_records(Some(0), "admin"),
        Err(ApiError::InvalidInput(_))
    ));
    assert_eq!(api.archive_closed_records(Some(7), "admin").unwrap(), 0);
}

#[test]
fn test_archive_rejects_out_of_range_days() {
    let (_temp_file, _conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    assert!(matches!(
        api.archive_closed_records(Some(1_000_000_000), "admin"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.archive_closed_records(Some(i64::MAX), "admin"),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_archived_unit_code_cannot_be_rescanned() {
    let (_temp_file, conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    let store = ScanRecordRepository::new(conn);
    seed_warehouse(&store, "ABCARC", 1, 200);
    assert_eq!(api.archive_closed_records(None, "admin").unwrap(), 1);

    let rescan = api
        .scan_unit(&ScanContext::new("WP1", "ABC", "OP01"), "ABCARC000")
        .unwrap();
    assert_eq!(rescan.outcome, ScanOutcome::Duplicate);
    assert_eq!(store.count(Collection::Live, &RecordFilter::new()).unwrap(), 0);
}

#[test]
fn test_rework_reaches_archived_pallet() {
    let (_temp_file, conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    let store = ScanRecordRepository::new(conn);
    seed_warehouse(&store, "ABCOLD", 2, 200);
    assert_eq!(api.archive_closed_records(None, "admin").unwrap(), 2);

    assert_eq!(api.mark_rework("ABCOLD-P", "customer recall", "QA01").unwrap(), 2);

    let reworked = store
        .find_many(
            Collection::Archive,
            &RecordFilter::new().pallet_code("ABCOLD-P"),
            10,
        )
        .unwrap();
    assert_eq!(reworked.len(), 2);
    assert!(reworked.iter().all(|r| r.status == ScanStatus::Rework));
    assert!(reworked
        .iter()
        .all(|r| r.rework_reason.as_deref() == Some("customer recall")));

    // 返工后归档单件码可重新扫码
    let rescan = api
        .scan_unit(&ScanContext::new("WP1", "ABC", "OP01"), "ABCOLD000")
        .unwrap();
    assert!(rescan.outcome.is_saved());
}

#[test]
fn test_fill_level_for_unknown_article() {
    let (_temp_file, _conn, api) = setup_api(ScanSettings::default()).expect("setup failed");
    assert!(api.fill_level("WP1", "NOPE").unwrap().is_none());

    let level = api.fill_level("WP1", "XYZ").unwrap().unwrap();
    assert_eq!(level.units_in_open_box, 0);
    assert_eq!(level.box_capacity, 3);
    assert!(level.pallet_capacity.is_none());
}
