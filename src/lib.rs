// ==========================================
// 生产追溯系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 工位扫码校验 + 单件/箱/托盘/入库追溯
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 扫码规则与状态机
pub mod engine;

// 导入层 - 物料配置表
pub mod importer;

// 配置层 - 运行时设置与物料配置注册表
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ContainerType, DateScheme, ScanOutcome, ScanStatus, ValidationOutcome};

// 领域实体
pub use domain::{
    ArticleConfig, DateRange, FillLevel, QueryPurpose, RecordFilter, ScanActionLog,
    ScanActionType, ScanContext, ScanRecord, ScanResult, TraceQuery, TraceQueryResult,
};

// 引擎
pub use engine::{
    BatchCodeParser, ContainerFillTracker, IdentifierValidator, RecordArchiver, ScanProcessor,
    TraceQueryService,
};

// 配置
pub use config::{ArticleConfigRegistry, ConfigManager, ScanSettings};

// API
pub use api::{ApiError, ApiResult, TraceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产追溯系统";
