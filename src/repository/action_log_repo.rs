// ==========================================
// 生产追溯系统 - 扫码操作日志数据仓储
// ==========================================
// 存储: scan_action_log 表
// 红线: 所有扫码与人工标记必须记录
// ==========================================

use crate::db::TS_FORMAT;
use crate::domain::action_log::{ScanActionLog, ScanActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_type, action_ts, actor, workplace,
           article_number, payload, outcome, affected_count, detail
    FROM scan_action_log
"#;

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ScanActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO scan_action_log (
                action_id, action_type, action_ts, actor, workplace,
                article_number, payload, outcome, affected_count, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.action_id,
                log.action_type.to_string(),
                log.action_ts.format(TS_FORMAT).to_string(),
                log.actor,
                log.workplace,
                log.article_number,
                log.payload,
                log.outcome,
                log.affected_count as i64,
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询最近的 N 条日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ScanActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY action_ts DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询指定操作人的日志
    pub fn find_by_actor(&self, actor: &str, limit: i32) -> RepositoryResult<Vec<ScanActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE actor = ? ORDER BY action_ts DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![actor, limit], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询指定时间范围的操作日志
    pub fn find_by_time_range(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> RepositoryResult<Vec<ScanActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE action_ts BETWEEN ? AND ? ORDER BY action_ts DESC",
            SELECT_COLUMNS
        ))?;
        let logs = stmt
            .query_map(
                params![
                    start_time.format(TS_FORMAT).to_string(),
                    end_time.format(TS_FORMAT).to_string(),
                ],
                |row| Self::map_row(row),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    fn map_row(row: &Row) -> SqliteResult<ScanActionLog> {
        let type_raw: String = row.get(1)?;
        let action_type = ScanActionType::from_str(&type_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("未知操作类型: {}", type_raw).into(),
            )
        })?;
        let affected: i64 = row.get(8)?;

        Ok(ScanActionLog {
            action_id: row.get(0)?,
            action_type,
            action_ts: row.get(2)?,
            actor: row.get(3)?,
            workplace: row.get(4)?,
            article_number: row.get(5)?,
            payload: row.get(6)?,
            outcome: row.get(7)?,
            affected_count: affected.max(0) as usize,
            detail: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_test_log(actor: &str, minute: u32) -> ScanActionLog {
        let ts = NaiveDate::from_ymd_opt(2026, 2, 10)
            .unwrap()
            .and_hms_opt(7, minute, 0)
            .unwrap();
        let mut log = ScanActionLog::new(ScanActionType::ScanUnit, actor, ts);
        log.workplace = Some("WP1".to_string());
        log.article_number = Some("ABC".to_string());
        log.payload = Some(format!("ABC{:03}", minute));
        log.outcome = "SAVED".to_string();
        log.affected_count = 1;
        log
    }

    #[test]
    fn test_insert_and_find_recent() {
        let repo = ActionLogRepository::new(setup_test_db());
        for m in 0..3 {
            repo.insert(&make_test_log("op1", m)).unwrap();
        }

        let logs = repo.find_recent(2).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].payload.as_deref(), Some("ABC002"));
        assert_eq!(logs[0].action_type, ScanActionType::ScanUnit);
        assert_eq!(logs[0].affected_count, 1);
    }

    #[test]
    fn test_find_by_actor() {
        let repo = ActionLogRepository::new(setup_test_db());
        repo.insert(&make_test_log("op1", 1)).unwrap();
        repo.insert(&make_test_log("op1", 2)).unwrap();
        repo.insert(&make_test_log("op2", 3)).unwrap();

        assert_eq!(repo.find_by_actor("op1", 10).unwrap().len(), 2);
        assert_eq!(repo.find_by_actor("op3", 10).unwrap().len(), 0);
    }

    #[test]
    fn test_find_by_time_range() {
        let repo = ActionLogRepository::new(setup_test_db());
        for m in [5, 15, 25] {
            repo.insert(&make_test_log("op1", m)).unwrap();
        }

        let day = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let logs = repo
            .find_by_time_range(
                day.and_hms_opt(7, 10, 0).unwrap(),
                day.and_hms_opt(7, 20, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].payload.as_deref(), Some("ABC015"));
    }
}
