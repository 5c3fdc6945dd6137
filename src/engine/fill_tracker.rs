// ==========================================
// 生产追溯系统 - 容器填充统计
// ==========================================
// 职责: 统计 (工位, 物料) 当前未封箱/未封托的数量
// 红线: 不缓存,每次调用直接计数,反映最新已提交状态
// ==========================================

use crate::domain::article::ArticleConfig;
use crate::domain::scan_record::FillLevel;
use crate::domain::trace_query::RecordFilter;
use crate::domain::types::{ContainerType, ScanStatus};
use crate::repository::error::RepositoryResult;
use crate::repository::scan_record_store::{Collection, ScanRecordStore};
use std::sync::Arc;

// ==========================================
// ContainerFillTracker
// ==========================================
pub struct ContainerFillTracker {
    store: Arc<dyn ScanRecordStore>,
}

impl ContainerFillTracker {
    pub fn new(store: Arc<dyn ScanRecordStore>) -> Self {
        Self { store }
    }

    /// 统计实时集合中指定状态的记录数
    pub fn count_open(
        &self,
        workplace: &str,
        article_number: &str,
        status: ScanStatus,
    ) -> RepositoryResult<u64> {
        let filter = RecordFilter::container(workplace, article_number).status(status);
        self.store.count(Collection::Live, &filter)
    }

    /// 统计当前托盘上的箱数（pallet 状态下不同批次码的数量）
    pub fn count_open_batches(
        &self,
        workplace: &str,
        article_number: &str,
    ) -> RepositoryResult<u64> {
        let filter =
            RecordFilter::container(workplace, article_number).status(ScanStatus::Pallet);
        self.store.count_distinct_batches(Collection::Live, &filter)
    }

    /// 工位看板用的填充情况
    pub fn fill_level(&self, config: &ArticleConfig) -> RepositoryResult<FillLevel> {
        let units_in_open_box =
            self.count_open(&config.workplace, &config.article_number, ScanStatus::Box)?;

        let batches_on_open_pallet = match config.container_type {
            ContainerType::UnitBoxPallet => Some(
                self.count_open_batches(&config.workplace, &config.article_number)?,
            ),
            ContainerType::UnitBox => None,
        };

        Ok(FillLevel {
            workplace: config.workplace.clone(),
            article_number: config.article_number.clone(),
            units_in_open_box,
            box_capacity: config.box_capacity,
            batches_on_open_pallet,
            pallet_capacity: config.pallet_capacity,
        })
    }
}
