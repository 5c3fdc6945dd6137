// ==========================================
// 生产追溯系统 - API 层
// ==========================================
// 职责: 对外提供扫码、标记、查询接口（展示层/传输层不在本 crate 内）
// ==========================================

pub mod error;
pub mod trace_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use trace_api::TraceApi;
