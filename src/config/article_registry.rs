// ==========================================
// 生产追溯系统 - 物料配置注册表
// ==========================================
// 职责: 按 (工位, 物料号) 查找校验与容量规则
// 生命周期: 加载一次,只读;重新加载 = 新实例
// 红线: 配置错误在加载时拒绝,不留到扫码时
// ==========================================

use crate::domain::article::ArticleConfig;
use crate::repository::article_config_repo::ArticleConfigRepository;
use crate::repository::error::RepositoryError;
use std::collections::HashMap;
use thiserror::Error;

/// 注册表加载错误
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("物料配置重复: workplace={workplace}, article={article_number}")]
    DuplicateArticle {
        workplace: String,
        article_number: String,
    },

    #[error("物料配置无效 (workplace={workplace}, article={article_number}): {reason}")]
    InvalidArticle {
        workplace: String,
        article_number: String,
        reason: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// ArticleConfigRegistry - 物料配置注册表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ArticleConfigRegistry {
    // workplace → article_number → config
    by_workplace: HashMap<String, HashMap<String, ArticleConfig>>,
    len: usize,
}

impl ArticleConfigRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从配置列表构建（逐条校验,拒绝重复主键）
    pub fn from_configs(configs: Vec<ArticleConfig>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for config in configs {
            config
                .validate()
                .map_err(|reason| RegistryError::InvalidArticle {
                    workplace: config.workplace.clone(),
                    article_number: config.article_number.clone(),
                    reason,
                })?;

            let articles = registry
                .by_workplace
                .entry(config.workplace.clone())
                .or_default();
            if articles.contains_key(&config.article_number) {
                return Err(RegistryError::DuplicateArticle {
                    workplace: config.workplace,
                    article_number: config.article_number,
                });
            }
            articles.insert(config.article_number.clone(), config);
            registry.len += 1;
        }

        Ok(registry)
    }

    /// 从 article_config 表加载
    pub fn load(repo: &ArticleConfigRepository) -> Result<Self, RegistryError> {
        let configs = repo.list_all()?;
        let registry = Self::from_configs(configs)?;
        tracing::info!(articles = registry.len(), "物料配置注册表已加载");
        Ok(registry)
    }

    /// 查找配置
    ///
    /// None 是正常结果（操作员尚未选择有效物料）,不是系统错误
    pub fn lookup(&self, workplace: &str, article_number: &str) -> Option<&ArticleConfig> {
        self.by_workplace
            .get(workplace)
            .and_then(|articles| articles.get(article_number))
    }

    /// 工位下的全部物料（按物料号排序）
    pub fn articles_for(&self, workplace: &str) -> Vec<&ArticleConfig> {
        let mut list: Vec<&ArticleConfig> = self
            .by_workplace
            .get(workplace)
            .map(|articles| articles.values().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| a.article_number.cmp(&b.article_number));
        list
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
