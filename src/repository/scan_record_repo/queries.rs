use super::core::{ScanRecordRepository, COLUMNS};
use crate::domain::scan_record::ScanRecord;
use crate::domain::trace_query::RecordFilter;
use crate::domain::types::ScanStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::scan_record_store::Collection;
use crate::repository::sql_builder::SqlQueryBuilder;
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Result as SqliteResult, Row};

impl ScanRecordRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按条件查询（最新优先）
    pub(super) fn select(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<ScanRecord>> {
        let mut builder = SqlQueryBuilder::new(&format!(
            "SELECT {} FROM {}",
            COLUMNS,
            collection.table()
        ))
        .filter(filter)
        .order_by("scanned_at DESC, rowid DESC");
        if let Some(n) = limit {
            builder = builder.limit(n);
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&builder.build())?;
        let records = stmt
            .query_map(params_from_iter(builder.params().iter()), |row| {
                Self::map_row(row)
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 行映射
    ///
    /// 历史带后缀的状态值（rework2 / defect_1）在此归类
    fn map_row(row: &Row) -> SqliteResult<ScanRecord> {
        let status_raw: String = row.get(5)?;
        let status = ScanStatus::from_stored(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("未知状态: {}", status_raw).into(),
            )
        })?;

        let defect_keys_raw: String = row.get(14)?;
        let history_raw: String = row.get(15)?;

        Ok(ScanRecord {
            record_id: row.get(0)?,
            unit_code: row.get(1)?,
            workplace: row.get(2)?,
            article_number: row.get(3)?,
            operator_id: row.get(4)?,
            status,
            scanned_at: row.get(6)?,
            batch_code: row.get(7)?,
            batch_assigned_at: row.get(8)?,
            pallet_code: row.get(9)?,
            pallet_assigned_at: row.get(10)?,
            rework_reason: row.get(11)?,
            rework_by: row.get(12)?,
            rework_at: row.get(13)?,
            defect_keys: serde_json::from_str(&defect_keys_raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e))
            })?,
            status_history: serde_json::from_str(&history_raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(15, Type::Text, Box::new(e))
            })?,
        })
    }
}
