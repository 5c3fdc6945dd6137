// ==========================================
// 生产追溯系统 - 配置管理器
// ==========================================
// 职责: 读取 config_kv 中的运行时设置,缺失或非法时回退默认值
// 存储: config_kv 表 (scope_id + key → value),扫码设置只使用 global scope
// ==========================================

use crate::config::scan_config_trait::ScanConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::date_cipher::{BmwCipher, DateWindow, FordCipher, FordLayout, MAX_WINDOW_DAYS};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 按数据库路径打开独立连接
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::wrap(conn))
    }

    /// 与仓储共享同一连接（再次应用统一 PRAGMA,幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        crate::db::configure_sqlite_connection(&*Self::lock_shared(&conn)?)?;
        Ok(Self { conn })
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock_shared(
        conn: &Arc<Mutex<Connection>>,
    ) -> Result<MutexGuard<'_, Connection>, Box<dyn Error>> {
        conn.lock()
            .map_err(|e| format!("配置连接锁获取失败: {}", e).into())
    }

    /// 读取 global 配置值,不存在时返回 None
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = Self::lock_shared(&self.conn)?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = Self::lock_shared(&self.conn)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 全部 global 配置（按 key 排序）
    pub fn global_values(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = Self::lock_shared(&self.conn)?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1")?;
        let values = stmt
            .query_map(params![GLOBAL_SCOPE], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;
        Ok(values)
    }

    /// 生效配置快照（JSON）,启动日志使用
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_json::to_string(&self.global_values()?)?)
    }

    fn text_or(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 数值配置,解析失败时回退默认值
    fn parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(key)?
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default))
    }

    /// 日期窗口,两侧天数限制在 0..=MAX_WINDOW_DAYS
    fn window_or(&self, back_key: &str, ahead_key: &str) -> Result<DateWindow, Box<dyn Error>> {
        let raw = DateWindow::new(
            self.parsed_or(back_key, 14i64)?,
            self.parsed_or(ahead_key, 1i64)?,
        );
        if raw.is_clamped() {
            return Ok(raw);
        }
        let window = DateWindow::clamped(raw.days_back, raw.days_ahead);
        tracing::warn!(
            back_key,
            ahead_key,
            days_back = raw.days_back,
            days_ahead = raw.days_ahead,
            max_days = MAX_WINDOW_DAYS,
            "日期窗口超出范围,已截断"
        );
        Ok(window)
    }
}

#[async_trait]
impl ScanConfigReader for ConfigManager {
    // ===== 查询上限 =====

    async fn get_query_default_cap(&self) -> Result<usize, Box<dyn Error>> {
        let cap = self.parsed_or(config_keys::QUERY_DEFAULT_CAP, 1000usize)?;
        Ok(if cap == 0 { 1000 } else { cap })
    }

    async fn get_query_defect_export_cap(&self) -> Result<usize, Box<dyn Error>> {
        let cap = self.parsed_or(config_keys::QUERY_DEFECT_EXPORT_CAP, 20000usize)?;
        Ok(if cap == 0 { 20000 } else { cap })
    }

    // ===== 日期编码 =====

    async fn get_ford_cipher(&self) -> Result<FordCipher, Box<dyn Error>> {
        let layout_raw = self.text_or(config_keys::FORD_DATE_LAYOUT, "YDDD")?;
        let layout = FordLayout::parse(&layout_raw).unwrap_or(FordLayout::Yddd);

        Ok(FordCipher {
            layout,
            window: self.window_or(
                config_keys::FORD_WINDOW_DAYS_BACK,
                config_keys::FORD_WINDOW_DAYS_AHEAD,
            )?,
        })
    }

    async fn get_bmw_cipher(&self) -> Result<BmwCipher, Box<dyn Error>> {
        let format = self.text_or(config_keys::BMW_DATE_FORMAT, "%y%m%d")?;
        let default_width = BmwCipher::default().width;

        Ok(BmwCipher {
            format,
            width: self.parsed_or(config_keys::BMW_DATE_WIDTH, default_width)?,
            window: self.window_or(
                config_keys::BMW_WINDOW_DAYS_BACK,
                config_keys::BMW_WINDOW_DAYS_AHEAD,
            )?,
        })
    }

    // ===== 批次码 / 托盘码 =====

    async fn get_batch_delimiter(&self) -> Result<char, Box<dyn Error>> {
        let value = self.text_or(config_keys::BATCH_DELIMITER, "|")?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_alphanumeric() => Ok(c),
            _ => Ok('|'), // 非单个分隔字符时回退默认
        }
    }

    async fn get_batch_min_length(&self) -> Result<usize, Box<dyn Error>> {
        self.parsed_or(config_keys::BATCH_MIN_LENGTH, 7usize)
    }

    // ===== 归档 =====

    async fn get_archive_after_days(&self) -> Result<i64, Box<dyn Error>> {
        let days = self.parsed_or(config_keys::ARCHIVE_AFTER_DAYS, 90i64)?;
        Ok(days.max(1))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 查询上限
    pub const QUERY_DEFAULT_CAP: &str = "query_default_cap";
    pub const QUERY_DEFECT_EXPORT_CAP: &str = "query_defect_export_cap";

    // Ford 日期编码
    pub const FORD_DATE_LAYOUT: &str = "ford_date_layout";
    pub const FORD_WINDOW_DAYS_BACK: &str = "ford_window_days_back";
    pub const FORD_WINDOW_DAYS_AHEAD: &str = "ford_window_days_ahead";

    // BMW 日期编码
    pub const BMW_DATE_FORMAT: &str = "bmw_date_format";
    pub const BMW_DATE_WIDTH: &str = "bmw_date_width";
    pub const BMW_WINDOW_DAYS_BACK: &str = "bmw_window_days_back";
    pub const BMW_WINDOW_DAYS_AHEAD: &str = "bmw_window_days_ahead";

    // 批次码
    pub const BATCH_DELIMITER: &str = "batch_delimiter";
    pub const BATCH_MIN_LENGTH: &str = "batch_min_length";

    // 归档
    pub const ARCHIVE_AFTER_DAYS: &str = "archive_after_days";
}
