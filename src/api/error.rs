// ==========================================
// 生产追溯系统 - API层错误类型
// ==========================================
// 职责: 对外边界的错误类型
// 红线: 扫码业务校验失败走 ScanResult,不走错误通道
// 红线: 存储不可达一律对外表现为 StoreUnavailable,不自动重试;存储内容损坏为 InternalError
// ==========================================

use crate::config::article_registry::RegistryError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 基础设施错误
    // ==========================================
    /// 存储不可用（连接、锁、SQL 执行失败等）
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("物料配置被拒绝: {0}")]
    ConfigRejected(String),

    #[error("运行时设置读取失败: {0}")]
    SettingsError(String),

    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if err.is_corrupt_data() {
            ApiError::InternalError(err.to_string())
        } else {
            ApiError::StoreUnavailable(err.to_string())
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Repository(repo_err) => repo_err.into(),
            other => ApiError::ConfigRejected(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(repo_err) => repo_err.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_become_store_unavailable() {
        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::StoreUnavailable(ref msg) if msg.contains("poisoned")));

        let api_err: ApiError =
            RepositoryError::DatabaseQueryError("disk I/O error".to_string()).into();
        assert!(matches!(api_err, ApiError::StoreUnavailable(_)));

        let api_err: ApiError = RepositoryError::StoreBusy("database is locked".to_string()).into();
        assert!(matches!(api_err, ApiError::StoreUnavailable(_)));

        let api_err: ApiError = RepositoryError::CorruptRecord {
            field: "column#5".to_string(),
            message: "未知状态".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_registry_error_conversion() {
        let api_err: ApiError = RegistryError::DuplicateArticle {
            workplace: "WP1".to_string(),
            article_number: "ABC".to_string(),
        }
        .into();
        match api_err {
            ApiError::ConfigRejected(msg) => assert!(msg.contains("ABC")),
            other => panic!("Expected ConfigRejected, got {other:?}"),
        }

        let api_err: ApiError =
            RegistryError::Repository(RepositoryError::LockError("x".to_string())).into();
        assert!(matches!(api_err, ApiError::StoreUnavailable(_)));
    }
}
