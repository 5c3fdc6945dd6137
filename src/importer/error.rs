// ==========================================
// 生产追溯系统 - 导入模块错误类型
// ==========================================
// 文件级错误: 整个导入失败
// 行级错误: 进入导入报告,其余行照常导入
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件级 =====
    #[error("配置表文件不存在: {0}")]
    FileNotFound(String),

    #[error("配置表格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("配置表读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel 工作簿无法解析: {0}")]
    Workbook(String),

    #[error("CSV 无法解析: {0}")]
    Csv(#[from] csv::Error),

    // ===== 行级 =====
    #[error("第 {row} 行缺少必填列 {field}")]
    MissingField { row: usize, field: String },

    #[error("第 {row} 行列 {field} 取值无效: {message}")]
    InvalidValue {
        row: usize,
        field: String,
        message: String,
    },

    #[error("第 {row} 行配置不合法: {message}")]
    RuleViolation { row: usize, message: String },

    #[error("第 {row} 行重复的物料配置: workplace={workplace}, article={article_number}")]
    DuplicateArticle {
        row: usize,
        workplace: String,
        article_number: String,
    },

    // ===== 落库 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    /// 行级错误对应的行号（文件级错误返回 None）
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::MissingField { row, .. }
            | ImportError::InvalidValue { row, .. }
            | ImportError::RuleViolation { row, .. }
            | ImportError::DuplicateArticle { row, .. } => Some(*row),
            _ => None,
        }
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Workbook(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
