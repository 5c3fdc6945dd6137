// ==========================================
// 生产追溯系统 - 物料配置数据仓储
// ==========================================
// 存储: article_config 表,主键 (workplace, article_number)
// 红线: 只做数据映射,一致性校验由注册表在加载时完成
// ==========================================

use crate::domain::article::{ArticleConfig, DateRange};
use crate::domain::types::{ContainerType, DateScheme};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT workplace, article_number, display_name, container_type,
           box_capacity, pallet_capacity, expected_code_template,
           date_ranges_json, date_scheme, hydra_process_codes_json
    FROM article_config
"#;

// ==========================================
// ArticleConfigRepository - 物料配置仓储
// ==========================================
pub struct ArticleConfigRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ArticleConfigRepository {
    /// 创建新的物料配置仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部物料配置
    pub fn list_all(&self) -> RepositoryResult<Vec<ArticleConfig>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY workplace, article_number",
            SELECT_COLUMNS
        ))?;
        let configs = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(configs)
    }

    /// 按主键查询
    pub fn find_by_key(
        &self,
        workplace: &str,
        article_number: &str,
    ) -> RepositoryResult<Option<ArticleConfig>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE workplace = ?1 AND article_number = ?2",
            SELECT_COLUMNS
        ))?;

        match stmt.query_row(params![workplace, article_number], |row| Self::map_row(row)) {
            Ok(config) => Ok(Some(config)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入或覆盖单条配置
    pub fn upsert(&self, config: &ArticleConfig) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_with(&conn, config)
    }

    /// 批量写入（事务化,任一失败整体回滚）
    pub fn batch_upsert(&self, configs: &[ArticleConfig]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for config in configs {
            Self::upsert_with(&tx, config)?;
        }
        tx.commit()?;
        Ok(configs.len())
    }

    fn upsert_with(conn: &Connection, config: &ArticleConfig) -> RepositoryResult<()> {
        let ranges: Vec<[usize; 2]> = config
            .date_validation_ranges
            .iter()
            .map(|r| [r.start, r.end])
            .collect();

        conn.execute(
            r#"
            INSERT INTO article_config (
                workplace, article_number, display_name, container_type,
                box_capacity, pallet_capacity, expected_code_template,
                date_ranges_json, date_scheme, hydra_process_codes_json, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
            ON CONFLICT(workplace, article_number) DO UPDATE SET
                display_name = excluded.display_name,
                container_type = excluded.container_type,
                box_capacity = excluded.box_capacity,
                pallet_capacity = excluded.pallet_capacity,
                expected_code_template = excluded.expected_code_template,
                date_ranges_json = excluded.date_ranges_json,
                date_scheme = excluded.date_scheme,
                hydra_process_codes_json = excluded.hydra_process_codes_json,
                updated_at = excluded.updated_at
            "#,
            params![
                config.workplace,
                config.article_number,
                config.display_name,
                config.container_type.to_string(),
                config.box_capacity,
                config.pallet_capacity,
                config.expected_code_template,
                serde_json::to_string(&ranges)?,
                config.date_scheme.to_string(),
                serde_json::to_string(&config.hydra_process_codes)?,
            ],
        )?;
        Ok(())
    }

    fn map_row(row: &Row) -> SqliteResult<ArticleConfig> {
        let container_raw: String = row.get(3)?;
        let container_type = ContainerType::parse(&container_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("未知容器类型: {}", container_raw).into(),
            )
        })?;

        let scheme_raw: String = row.get(8)?;
        let date_scheme = DateScheme::parse(&scheme_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                format!("未知日期方案: {}", scheme_raw).into(),
            )
        })?;

        let ranges_raw: String = row.get(7)?;
        let ranges: Vec<[usize; 2]> = serde_json::from_str(&ranges_raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        let codes_raw: String = row.get(9)?;
        let hydra_process_codes: BTreeSet<String> = serde_json::from_str(&codes_raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

        Ok(ArticleConfig {
            workplace: row.get(0)?,
            article_number: row.get(1)?,
            display_name: row.get(2)?,
            container_type,
            box_capacity: row.get(4)?,
            pallet_capacity: row.get(5)?,
            expected_code_template: row.get(6)?,
            date_validation_ranges: ranges
                .into_iter()
                .map(|[start, end]| DateRange::new(start, end))
                .collect(),
            date_scheme,
            hydra_process_codes,
        })
    }
}
