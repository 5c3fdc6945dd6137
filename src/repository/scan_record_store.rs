// ==========================================
// 生产追溯系统 - 扫码记录存储 Trait
// ==========================================
// 职责: 定义扫码引擎所需的抽象存储操作（不包含业务逻辑）
// 约定: 每类实体两个逻辑集合（实时 / 归档）
// 红线: 存储失败一律作为错误上抛,引擎不自动重试
// ==========================================

use crate::domain::scan_record::{BatchTransition, ScanRecord};
use crate::domain::trace_query::RecordFilter;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use std::fmt;

// ==========================================
// Collection - 逻辑集合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Live,    // 实时数据
    Archive, // 历史归档
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Live => "scan_record",
            Collection::Archive => "scan_record_archive",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Live => write!(f, "LIVE"),
            Collection::Archive => write!(f, "ARCHIVE"),
        }
    }
}

/// 带容量守卫的装箱写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedInsert {
    Inserted,
    /// 写入前发现同码非返工记录
    Duplicate,
    /// 写入前箱内数量已达上限
    ContainerFull,
}

// ==========================================
// ScanRecordStore Trait
// ==========================================
// 实现者: ScanRecordRepository（使用 rusqlite）
pub trait ScanRecordStore: Send + Sync {
    /// 插入一条记录
    fn insert_one(&self, collection: Collection, record: &ScanRecord) -> RepositoryResult<()>;

    /// 在同一事务内完成"查重 + 箱容量判定 + 写入"（查重覆盖两个集合,写入实时集合）
    ///
    /// # 参数
    /// - record: 待写入的 box 状态记录
    /// - box_capacity: 箱容量,0 表示不限
    fn insert_guarded(
        &self,
        record: &ScanRecord,
        box_capacity: u32,
    ) -> RepositoryResult<GuardedInsert>;

    /// 查询一条匹配记录（最新优先）
    fn find_one(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> RepositoryResult<Option<ScanRecord>>;

    /// 按条件计数
    fn count(&self, collection: Collection, filter: &RecordFilter) -> RepositoryResult<u64>;

    /// 按条件统计不同批次码数量（托盘上的箱数）
    fn count_distinct_batches(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> RepositoryResult<u64>;

    /// 按条件查询（最新优先,最多 limit 条）
    fn find_many(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<ScanRecord>>;

    /// 按条件批量迁移状态
    ///
    /// # 返回
    /// - 被修改的记录数
    fn update_many(
        &self,
        collection: Collection,
        batch: &BatchTransition,
    ) -> RepositoryResult<usize>;

    /// 把实时集合中匹配且扫码时间早于 cutoff 的记录迁入归档集合
    ///
    /// # 返回
    /// - 迁移的记录数
    fn move_to_archive(
        &self,
        filter: &RecordFilter,
        cutoff: NaiveDateTime,
    ) -> RepositoryResult<usize>;
}
