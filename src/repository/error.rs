// ==========================================
// 生产追溯系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 仓储层只报告基础设施失败,业务校验结果不走错误通道
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 存储不可用 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    /// SQLite 忙或被其他连接锁定（busy_timeout 已耗尽）
    #[error("数据库繁忙: {0}")]
    StoreBusy(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 存储内容异常 =====
    #[error("记录字段无法解析 (field={field}): {message}")]
    CorruptRecord { field: String, message: String },

    #[error("JSON 序列化失败: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否为存储内容损坏（而非存储不可达）
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            RepositoryError::CorruptRecord { .. } | RepositoryError::SerializationError(_)
        )
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                RepositoryError::StoreBusy(err.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, cause) => {
                RepositoryError::CorruptRecord {
                    field: format!("column#{}", idx),
                    message: cause.to_string(),
                }
            }
            rusqlite::Error::InvalidColumnType(idx, name, ty) => RepositoryError::CorruptRecord {
                field: format!("{}#{}", name, idx),
                message: format!("unexpected type {}", ty),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
