// ==========================================
// 生产追溯系统 - 配置层
// ==========================================
// 职责: 运行时设置 (config_kv) 与物料配置注册表
// ==========================================

pub mod article_registry;
pub mod config_manager;
pub mod scan_config_trait;
pub mod settings;

// 重导出核心配置
pub use article_registry::{ArticleConfigRegistry, RegistryError};
pub use config_manager::{config_keys, ConfigManager};
pub use scan_config_trait::ScanConfigReader;
pub use settings::ScanSettings;
