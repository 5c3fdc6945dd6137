// ==========================================
// 生产追溯系统 - 扫码配置读取 Trait
// ==========================================
// 职责: 定义扫码引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::date_cipher::{BmwCipher, FordCipher};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ScanConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ScanConfigReader: Send + Sync {
    // ===== 查询上限 =====

    /// 获取普通追溯查询的结果上限
    ///
    /// # 默认值
    /// - 1000
    async fn get_query_default_cap(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取缺陷导出的结果上限（大于普通上限）
    ///
    /// # 默认值
    /// - 20000
    async fn get_query_defect_export_cap(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 日期编码 =====

    /// 获取 Ford 日期编码配置（布局 + 允许窗口）
    ///
    /// # 默认值
    /// - YDDD, 回溯 14 天, 前瞻 1 天
    async fn get_ford_cipher(&self) -> Result<FordCipher, Box<dyn Error>>;

    /// 获取 BMW 日期编码配置（格式 + 宽度 + 允许窗口）
    ///
    /// # 默认值
    /// - %y%m%d, 宽度 6, 回溯 14 天, 前瞻 1 天
    async fn get_bmw_cipher(&self) -> Result<BmwCipher, Box<dyn Error>>;

    // ===== 批次码 / 托盘码 =====

    /// 获取批次码字段分隔符
    ///
    /// # 默认值
    /// - '|'
    async fn get_batch_delimiter(&self) -> Result<char, Box<dyn Error>>;

    /// 获取批次码最小长度
    ///
    /// # 默认值
    /// - 7
    async fn get_batch_min_length(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 归档 =====

    /// 获取归档阈值（扫码时间早于 N 天前的已封闭记录迁入归档）
    ///
    /// # 默认值
    /// - 90
    async fn get_archive_after_days(&self) -> Result<i64, Box<dyn Error>>;
}
