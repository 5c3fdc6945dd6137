// ==========================================
// 生产追溯系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少多工位并发扫码时的偶发 busy 错误
// - 统一建表语句（实时表 / 归档表结构一致）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（毫秒精度，字符串可直接排序）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PRODUCTION_TRACE_DB_PATH > 用户数据目录 > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("PRODUCTION_TRACE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./production_trace.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("production-trace");
        // 目录创建失败时回退当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("production_trace.db");
        }
    }
    path.to_string_lossy().to_string()
}

/// 扫码记录表结构（实时表与归档表共用）
fn scan_record_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            record_id TEXT PRIMARY KEY,
            unit_code TEXT NOT NULL,
            workplace TEXT NOT NULL,
            article_number TEXT NOT NULL,
            operator_id TEXT NOT NULL,
            status TEXT NOT NULL,
            scanned_at TEXT NOT NULL,
            batch_code TEXT,
            batch_assigned_at TEXT,
            pallet_code TEXT,
            pallet_assigned_at TEXT,
            rework_reason TEXT,
            rework_by TEXT,
            rework_at TEXT,
            defect_keys TEXT NOT NULL DEFAULT '[]',
            status_history TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_unit_code ON {table}(unit_code);
        CREATE INDEX IF NOT EXISTS idx_{table}_container
            ON {table}(workplace, article_number, status);
        CREATE INDEX IF NOT EXISTS idx_{table}_batch_code ON {table}(batch_code);
        CREATE INDEX IF NOT EXISTS idx_{table}_pallet_code ON {table}(pallet_code);
        CREATE INDEX IF NOT EXISTS idx_{table}_scanned_at ON {table}(scanned_at);
        "#
    )
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS article_config (
            workplace TEXT NOT NULL,
            article_number TEXT NOT NULL,
            display_name TEXT NOT NULL,
            container_type TEXT NOT NULL,
            box_capacity INTEGER NOT NULL,
            pallet_capacity INTEGER,
            expected_code_template TEXT NOT NULL,
            date_ranges_json TEXT NOT NULL DEFAULT '[]',
            date_scheme TEXT NOT NULL DEFAULT 'none',
            hydra_process_codes_json TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (workplace, article_number)
        );

        CREATE TABLE IF NOT EXISTS scan_action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            workplace TEXT,
            article_number TEXT,
            payload TEXT,
            outcome TEXT NOT NULL,
            affected_count INTEGER NOT NULL DEFAULT 0,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_scan_action_log_ts ON scan_action_log(action_ts);
        "#,
    )?;

    conn.execute_batch(&scan_record_table_sql("scan_record"))?;
    conn.execute_batch(&scan_record_table_sql("scan_record_archive"))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('scan_record', 'scan_record_archive')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
