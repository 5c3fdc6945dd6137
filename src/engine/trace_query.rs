// ==========================================
// 生产追溯系统 - 追溯查询服务
// ==========================================
// 职责: 实时集合优先,不足上限时用同一条件补查归档集合
// 排序: 扫码时间倒序（最新优先）
// 红线: 返回条数不超过上限;达到上限即标记 truncated
// ==========================================

use crate::config::article_registry::ArticleConfigRegistry;
use crate::config::settings::ScanSettings;
use crate::domain::scan_record::FillLevel;
use crate::domain::trace_query::{QueryPurpose, TraceQuery, TraceQueryResult};
use crate::engine::fill_tracker::ContainerFillTracker;
use crate::repository::error::RepositoryResult;
use crate::repository::scan_record_store::{Collection, ScanRecordStore};
use std::sync::Arc;
use tracing::debug;

pub struct TraceQueryService {
    store: Arc<dyn ScanRecordStore>,
    registry: Arc<ArticleConfigRegistry>,
    default_cap: usize,
    defect_export_cap: usize,
}

impl TraceQueryService {
    pub fn new(
        store: Arc<dyn ScanRecordStore>,
        registry: Arc<ArticleConfigRegistry>,
        settings: &ScanSettings,
    ) -> Self {
        Self {
            store,
            registry,
            default_cap: settings.query_default_cap,
            defect_export_cap: settings.query_defect_export_cap,
        }
    }

    /// 实际生效的上限: min(请求上限, 用途上限),未指定或为 0 时取用途上限
    pub fn effective_cap(&self, query: &TraceQuery) -> usize {
        let purpose_cap = match query.purpose {
            QueryPurpose::Default => self.default_cap,
            QueryPurpose::DefectExport => self.defect_export_cap,
        };
        query
            .limit
            .filter(|limit| *limit > 0)
            .map_or(purpose_cap, |limit| limit.min(purpose_cap))
    }

    /// 执行追溯查询
    pub fn query(&self, query: &TraceQuery) -> RepositoryResult<TraceQueryResult> {
        let cap = self.effective_cap(query);

        let mut records = self.store.find_many(Collection::Live, &query.filter, cap)?;
        let live_count = records.len();

        if live_count < cap {
            let remaining = cap - live_count;
            let archived = self
                .store
                .find_many(Collection::Archive, &query.filter, remaining)?;
            records.extend(archived);
        }

        let truncated = records.len() == cap;
        debug!(
            cap,
            live = live_count,
            archive = records.len() - live_count,
            truncated,
            "追溯查询完成"
        );

        Ok(TraceQueryResult { records, truncated })
    }

    /// 工位当前容器填充情况,物料未配置时返回 None
    pub fn fill_level(
        &self,
        workplace: &str,
        article_number: &str,
    ) -> RepositoryResult<Option<FillLevel>> {
        let Some(config) = self.registry.lookup(workplace, article_number) else {
            return Ok(None);
        };
        let tracker = ContainerFillTracker::new(self.store.clone());
        tracker.fill_level(config).map(Some)
    }
}
