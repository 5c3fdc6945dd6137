use crate::db::TS_FORMAT;
use crate::domain::scan_record::{BatchTransition, ScanRecord, Transition};
use crate::domain::trace_query::RecordFilter;
use crate::domain::types::ScanStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::scan_record_store::{Collection, GuardedInsert, ScanRecordStore};
use crate::repository::sql_builder::SqlQueryBuilder;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};

pub(super) const COLUMNS: &str = r#"
    record_id, unit_code, workplace, article_number, operator_id,
    status, scanned_at, batch_code, batch_assigned_at, pallet_code,
    pallet_assigned_at, rework_reason, rework_by, rework_at,
    defect_keys, status_history
"#;

/// 历史条目中的时间使用 ISO 格式,与 serde 反序列化对齐
const HISTORY_TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

// ==========================================
// ScanRecordRepository - 扫码记录仓储
// ==========================================
pub struct ScanRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScanRecordRepository {
    /// 创建新的扫码记录仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn fmt_opt_ts(ts: &Option<NaiveDateTime>) -> Option<String> {
    ts.as_ref().map(fmt_ts)
}

/// 写入单条记录（调用方负责事务）
fn insert_record(conn: &Connection, table: &str, record: &ScanRecord) -> RepositoryResult<()> {
    let defect_keys = serde_json::to_string(&record.defect_keys)?;
    let history = serde_json::to_string(&record.status_history)?;

    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            table, COLUMNS
        ),
        params![
            record.record_id,
            record.unit_code,
            record.workplace,
            record.article_number,
            record.operator_id,
            record.status.as_str(),
            fmt_ts(&record.scanned_at),
            record.batch_code,
            fmt_opt_ts(&record.batch_assigned_at),
            record.pallet_code,
            fmt_opt_ts(&record.pallet_assigned_at),
            record.rework_reason,
            record.rework_by,
            fmt_opt_ts(&record.rework_at),
            defect_keys,
            history,
        ],
    )?;
    Ok(())
}

fn count_in(conn: &Connection, table: &str, filter: &RecordFilter) -> RepositoryResult<u64> {
    let builder =
        SqlQueryBuilder::new(&format!("SELECT COUNT(*) FROM {}", table)).filter(filter);
    let n: i64 = conn.query_row(
        &builder.build(),
        params_from_iter(builder.params().iter()),
        |row| row.get(0),
    )?;
    Ok(n.max(0) as u64)
}

/// 历史压栈片段: 把当前 status 追加到 status_history
fn history_push_clause() -> &'static str {
    "status_history = json_insert(status_history, '$[#]', \
     json_object('status', status, 'at', ?, 'by', ?))"
}

/// 迁移对应的 SET 子句与参数
fn transition_set(transition: &Transition) -> RepositoryResult<(String, Vec<Value>)> {
    let status = Value::Text(transition.target_status().as_str().to_string());
    let set = match transition {
        Transition::CloseBox {
            batch_code,
            at,
            operator_id,
        } => (
            "status = ?, batch_code = ?, batch_assigned_at = ?, operator_id = ?".to_string(),
            vec![
                status,
                Value::Text(batch_code.clone()),
                Value::Text(fmt_ts(at)),
                Value::Text(operator_id.clone()),
            ],
        ),
        Transition::ClosePallet {
            pallet_code,
            at,
            operator_id,
        } => (
            "status = ?, pallet_code = ?, pallet_assigned_at = ?, operator_id = ?".to_string(),
            vec![
                status,
                Value::Text(pallet_code.clone()),
                Value::Text(fmt_ts(at)),
                Value::Text(operator_id.clone()),
            ],
        ),
        Transition::Rework {
            reason,
            at,
            operator_id,
        } => (
            format!(
                "{}, status = ?, rework_reason = ?, rework_by = ?, rework_at = ?",
                history_push_clause()
            ),
            vec![
                Value::Text(at.format(HISTORY_TS_FORMAT).to_string()),
                Value::Text(operator_id.clone()),
                status,
                Value::Text(reason.clone()),
                Value::Text(operator_id.clone()),
                Value::Text(fmt_ts(at)),
            ],
        ),
        Transition::Defect {
            defect_keys,
            at,
            operator_id,
        } => (
            format!("{}, status = ?, defect_keys = ?", history_push_clause()),
            vec![
                Value::Text(at.format(HISTORY_TS_FORMAT).to_string()),
                Value::Text(operator_id.clone()),
                status,
                Value::Text(serde_json::to_string(defect_keys)?),
            ],
        ),
    };
    Ok(set)
}

impl ScanRecordStore for ScanRecordRepository {
    fn insert_one(&self, collection: Collection, record: &ScanRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_record(&conn, collection.table(), record)
    }

    fn insert_guarded(
        &self,
        record: &ScanRecord,
        box_capacity: u32,
    ) -> RepositoryResult<GuardedInsert> {
        let mut conn = self.get_conn()?;
        // IMMEDIATE: 读计数前即取得写锁,关闭"计数-写入"竞争窗口
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let table = Collection::Live.table();

        let duplicate_filter = RecordFilter::new()
            .unit_code(&record.unit_code)
            .exclude_status(ScanStatus::Rework);
        // 已归档的单件码同样占用,不得重新装箱
        if count_in(&tx, table, &duplicate_filter)? > 0
            || count_in(&tx, Collection::Archive.table(), &duplicate_filter)? > 0
        {
            return Ok(GuardedInsert::Duplicate);
        }

        if box_capacity > 0 {
            let open_filter = RecordFilter::container(&record.workplace, &record.article_number)
                .status(ScanStatus::Box);
            if count_in(&tx, table, &open_filter)? >= u64::from(box_capacity) {
                return Ok(GuardedInsert::ContainerFull);
            }
        }

        insert_record(&tx, table, record)?;
        tx.commit()?;
        Ok(GuardedInsert::Inserted)
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> RepositoryResult<Option<ScanRecord>> {
        Ok(self.select(collection, filter, Some(1))?.into_iter().next())
    }

    fn count(&self, collection: Collection, filter: &RecordFilter) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        count_in(&conn, collection.table(), filter)
    }

    fn count_distinct_batches(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let builder = SqlQueryBuilder::new(&format!(
            "SELECT COUNT(DISTINCT batch_code) FROM {}",
            collection.table()
        ))
        .filter(filter);
        let n: i64 = conn.query_row(
            &builder.build(),
            params_from_iter(builder.params().iter()),
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    fn find_many(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<ScanRecord>> {
        self.select(collection, filter, Some(limit))
    }

    fn update_many(
        &self,
        collection: Collection,
        batch: &BatchTransition,
    ) -> RepositoryResult<usize> {
        let (set_clause, set_params) = transition_set(&batch.transition)?;
        let builder = SqlQueryBuilder::new(&format!(
            "UPDATE {} SET {}",
            collection.table(),
            set_clause
        ))
        .filter(&batch.filter)
        .leading_params(set_params);

        let conn = self.get_conn()?;
        let rows = conn.execute(&builder.build(), params_from_iter(builder.params().iter()))?;
        Ok(rows)
    }

    fn move_to_archive(
        &self,
        filter: &RecordFilter,
        cutoff: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let live = Collection::Live.table();
        let archive = Collection::Archive.table();
        let cutoff_param = vec![Value::Text(fmt_ts(&cutoff))];

        let copy = SqlQueryBuilder::new(&format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            archive, COLUMNS, COLUMNS, live
        ))
        .filter(filter)
        .where_clause("scanned_at < ?", cutoff_param.clone());
        let delete = SqlQueryBuilder::new(&format!("DELETE FROM {}", live))
            .filter(filter)
            .where_clause("scanned_at < ?", cutoff_param);

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let copied = tx.execute(&copy.build(), params_from_iter(copy.params().iter()))?;
        let deleted = tx.execute(&delete.build(), params_from_iter(delete.params().iter()))?;
        if copied != deleted {
            // 事务随 tx 丢弃回滚
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "归档行数不一致: copied={}, deleted={}",
                copied, deleted
            )));
        }
        tx.commit()?;
        Ok(deleted)
    }
}
