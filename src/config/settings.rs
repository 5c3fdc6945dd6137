// ==========================================
// 生产追溯系统 - 运行时设置快照
// ==========================================
// 职责: 启动时一次性读取配置,之后以普通结构体传入引擎
// 生命周期: 只读;重新加载 = 新实例
// ==========================================

use crate::config::scan_config_trait::ScanConfigReader;
use crate::engine::date_cipher::DateCiphers;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub query_default_cap: usize,
    pub query_defect_export_cap: usize,
    pub ciphers: DateCiphers,
    pub batch_delimiter: char,
    pub batch_min_length: usize,
    pub archive_after_days: i64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            query_default_cap: 1000,
            query_defect_export_cap: 20000,
            ciphers: DateCiphers::default(),
            batch_delimiter: '|',
            batch_min_length: 7,
            archive_after_days: 90,
        }
    }
}

impl ScanSettings {
    /// 通过配置读取接口加载全部设置
    pub async fn load(reader: &dyn ScanConfigReader) -> Result<Self, Box<dyn Error>> {
        let settings = Self {
            query_default_cap: reader.get_query_default_cap().await?,
            query_defect_export_cap: reader.get_query_defect_export_cap().await?,
            ciphers: DateCiphers {
                ford: reader.get_ford_cipher().await?,
                bmw: reader.get_bmw_cipher().await?,
            },
            batch_delimiter: reader.get_batch_delimiter().await?,
            batch_min_length: reader.get_batch_min_length().await?,
            archive_after_days: reader.get_archive_after_days().await?,
        };

        tracing::debug!(?settings, "扫码设置已加载");
        Ok(settings)
    }
}
