// ==========================================
// 生产追溯系统 - 扫码记录数据仓储
// ==========================================
// 存储: scan_record（实时）/ scan_record_archive（归档）,表结构一致
// 红线: Repository 不含业务规则,只做数据映射与条件执行
// ==========================================

mod core;
mod queries;


pub use core::ScanRecordRepository;
