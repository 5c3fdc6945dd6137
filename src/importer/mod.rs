// ==========================================
// 生产追溯系统 - 导入层
// ==========================================
// 职责: 物料配置表导入 (article_config)
// 支持: Excel, CSV
// ==========================================

pub mod article_importer;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use article_importer::{ArticleConfigImporter, ArticleImportReport, RowError};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
