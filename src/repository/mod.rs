// ==========================================
// 生产追溯系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod article_config_repo;
pub mod error;
pub mod scan_record_repo;
pub mod scan_record_store;
pub mod sql_builder;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use article_config_repo::ArticleConfigRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use scan_record_repo::ScanRecordRepository;
pub use scan_record_store::{Collection, GuardedInsert, ScanRecordStore};
pub use sql_builder::SqlQueryBuilder;
