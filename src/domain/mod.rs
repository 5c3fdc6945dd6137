// ==========================================
// 生产追溯系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod article;
pub mod scan_record;
pub mod trace_query;
pub mod types;

// 重导出核心类型
pub use action_log::{ScanActionLog, ScanActionType};
pub use article::{ArticleConfig, DateRange, MAX_DATE_RANGES};
pub use scan_record::{
    BatchTransition, FillLevel, ScanContext, ScanRecord, ScanResult, StatusHistoryEntry,
    Transition,
};
pub use trace_query::{QueryPurpose, RecordFilter, TraceQuery, TraceQueryResult};
pub use types::{ContainerType, DateScheme, ScanOutcome, ScanStatus, ValidationOutcome};
