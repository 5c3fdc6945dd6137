// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、物料配置种子数据等功能
// ==========================================

#![allow(dead_code)]

use production_trace::domain::article::ArticleConfig;
use production_trace::domain::types::{ContainerType, DateScheme};
use production_trace::repository::article_config_repo::ArticleConfigRepository;
use production_trace::{ScanSettings, TraceApi};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = production_trace::db::open_sqlite_connection(&db_path)?;
    production_trace::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(production_trace::db::open_sqlite_connection(db_path)?)
}

/// 打开共享连接（仓储/API 使用）
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

/// 构造物料配置（码模板 = 物料号,不校验日期）
pub fn article(
    workplace: &str,
    article_number: &str,
    container_type: ContainerType,
    box_capacity: u32,
    pallet_capacity: Option<u32>,
) -> ArticleConfig {
    ArticleConfig {
        workplace: workplace.to_string(),
        article_number: article_number.to_string(),
        display_name: format!("{} 测试件", article_number),
        container_type,
        box_capacity,
        pallet_capacity,
        expected_code_template: article_number.to_string(),
        date_validation_ranges: Vec::new(),
        date_scheme: DateScheme::None,
        hydra_process_codes: BTreeSet::from(["090".to_string()]),
    }
}

/// 标准场景: WP1/ABC 每箱 2 件、每托 1 箱；WP1/XYZ 只装箱,每箱 3 件
pub fn standard_articles() -> Vec<ArticleConfig> {
    vec![
        article("WP1", "ABC", ContainerType::UnitBoxPallet, 2, Some(1)),
        article("WP1", "XYZ", ContainerType::UnitBox, 3, None),
    ]
}

/// 写入物料配置
pub fn seed_articles(
    conn: Arc<Mutex<Connection>>,
    configs: &[ArticleConfig],
) -> Result<usize, Box<dyn Error>> {
    let repo = ArticleConfigRepository::new(conn);
    Ok(repo.batch_upsert(configs)?)
}

/// 写入 global 配置项
pub fn insert_test_config(conn: &Connection, pairs: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    for (key, value) in pairs {
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            [key, value],
        )?;
    }
    Ok(())
}

/// 组装测试用 TraceApi（标准物料配置 + 默认设置）
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 与 API 共享的连接
/// - TraceApi
pub fn setup_api(
    settings: ScanSettings,
) -> Result<(NamedTempFile, Arc<Mutex<Connection>>, TraceApi), Box<dyn Error>> {
    production_trace::logging::init_test();
    let (temp_file, db_path) = create_test_db()?;
    let conn = open_shared_connection(&db_path)?;
    seed_articles(conn.clone(), &standard_articles())?;

    let api = TraceApi::from_connection(conn.clone(), settings)?;
    Ok((temp_file, conn, api))
}
