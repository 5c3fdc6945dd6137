// ==========================================
// 生产追溯系统 - 记录归档
// ==========================================
// 职责: 把已封闭的旧记录从实时集合迁入归档集合
// 红线: box / pallet 状态（容器未封闭）的记录永不归档
// ==========================================

use crate::domain::trace_query::RecordFilter;
use crate::domain::types::ScanStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::scan_record_store::ScanRecordStore;
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tracing::info;

pub struct RecordArchiver {
    store: Arc<dyn ScanRecordStore>,
}

impl RecordArchiver {
    pub fn new(store: Arc<dyn ScanRecordStore>) -> Self {
        Self { store }
    }

    /// 归档扫码时间早于 cutoff 的已封闭记录
    ///
    /// # 返回
    /// - 迁移的记录数
    pub fn archive_before(&self, cutoff: NaiveDateTime) -> RepositoryResult<usize> {
        let filter = RecordFilter::new()
            .exclude_status(ScanStatus::Box)
            .exclude_status(ScanStatus::Pallet);
        let moved = self.store.move_to_archive(&filter, cutoff)?;
        info!(%cutoff, moved, "扫码记录归档完成");
        Ok(moved)
    }

    /// 保留天数对应的截止时间（cutoff = now - days）
    ///
    /// days < 1 或结果超出日历可表示范围时返回 None
    pub fn retention_cutoff(now: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
        if days < 1 {
            return None;
        }
        Duration::try_days(days).and_then(|span| now.checked_sub_signed(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scan_record::{ScanContext, ScanRecord};
    use crate::repository::scan_record_store::Collection;
    use crate::repository::ScanRecordRepository;
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::sync::Mutex;

    #[test]
    fn test_only_closed_old_records_move() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let store: Arc<dyn ScanRecordStore> =
            Arc::new(ScanRecordRepository::new(Arc::new(Mutex::new(conn))));

        let ctx = ScanContext::new("WP1", "ABC", "op1");
        let old = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let recent = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let seeds = [
            ("OLD-BOX", old, ScanStatus::Box),
            ("OLD-PAL", old, ScanStatus::Pallet),
            ("OLD-WH", old, ScanStatus::Warehouse),
            ("OLD-RW", old, ScanStatus::Rework),
            ("NEW-WH", recent, ScanStatus::Warehouse),
        ];
        for (code, at, status) in seeds {
            let mut record = ScanRecord::new_boxed(&ctx, code, at);
            record.status = status;
            store.insert_one(Collection::Live, &record).unwrap();
        }

        let archiver = RecordArchiver::new(store.clone());
        let now = NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let cutoff = RecordArchiver::retention_cutoff(now, 90).unwrap();
        assert_eq!(archiver.archive_before(cutoff).unwrap(), 2);

        assert_eq!(store.count(Collection::Live, &RecordFilter::new()).unwrap(), 3);
        assert_eq!(store.count(Collection::Archive, &RecordFilter::new()).unwrap(), 2);
        assert!(store
            .find_one(Collection::Archive, &RecordFilter::new().unit_code("OLD-RW"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_retention_cutoff_bounds() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            RecordArchiver::retention_cutoff(now, 14),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(RecordArchiver::retention_cutoff(now, 0), None);
        assert_eq!(RecordArchiver::retention_cutoff(now, 1_000_000_000), None);
        assert_eq!(RecordArchiver::retention_cutoff(now, i64::MAX), None);
    }
}
