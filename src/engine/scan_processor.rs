// ==========================================
// 生产追溯系统 - 扫码处理引擎（状态机驱动）
// ==========================================
// 状态: box → pallet → warehouse, 旁路: rework / defect
// 职责: 编排 单件码校验 + 批次码解析 + 容器计数 + 存储写入
// 红线: 业务校验失败是 ScanResult,只有存储失败才返回 Err
// 红线: 不自动重试（重试非幂等写入会产生重复记录）
// ==========================================

use crate::config::article_registry::ArticleConfigRegistry;
use crate::config::settings::ScanSettings;
use crate::domain::article::ArticleConfig;
use crate::domain::scan_record::{BatchTransition, ScanContext, ScanRecord, ScanResult, Transition};
use crate::domain::trace_query::RecordFilter;
use crate::domain::types::{ContainerType, ScanOutcome, ScanStatus, ValidationOutcome};
use crate::engine::batch_code_parser::{BatchCodeParser, PayloadRules};
use crate::engine::fill_tracker::ContainerFillTracker;
use crate::engine::identifier_validator::IdentifierValidator;
use crate::repository::error::RepositoryResult;
use crate::repository::scan_record_store::{Collection, GuardedInsert, ScanRecordStore};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// ScanProcessor
// ==========================================
pub struct ScanProcessor {
    store: Arc<dyn ScanRecordStore>,
    registry: Arc<ArticleConfigRegistry>,
    settings: Arc<ScanSettings>,
    fill_tracker: ContainerFillTracker,
}

impl ScanProcessor {
    pub fn new(
        store: Arc<dyn ScanRecordStore>,
        registry: Arc<ArticleConfigRegistry>,
        settings: Arc<ScanSettings>,
    ) -> Self {
        let fill_tracker = ContainerFillTracker::new(store.clone());
        Self {
            store,
            registry,
            settings,
            fill_tracker,
        }
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn payload_rules(&self) -> PayloadRules {
        PayloadRules {
            delimiter: self.settings.batch_delimiter,
            min_length: self.settings.batch_min_length,
        }
    }

    fn resolve(&self, ctx: &ScanContext) -> Result<&ArticleConfig, ScanResult> {
        self.registry
            .lookup(&ctx.workplace, &ctx.article_number)
            .ok_or_else(|| {
                ScanResult::rejected(
                    ScanOutcome::ConfigMissing,
                    format!(
                        "工位 {} 未配置物料 {}",
                        ctx.workplace, ctx.article_number
                    ),
                )
            })
    }

    /// 实时 + 归档两个集合中是否已有匹配记录
    fn exists_anywhere(&self, filter: &RecordFilter) -> RepositoryResult<bool> {
        if self.store.count(Collection::Live, filter)? > 0 {
            return Ok(true);
        }
        Ok(self.store.count(Collection::Archive, filter)? > 0)
    }

    /// 人工标记同时作用于实时与归档集合,返回两者修改数之和
    fn update_everywhere(&self, batch: &BatchTransition) -> RepositoryResult<usize> {
        let live = self.store.update_many(Collection::Live, batch)?;
        let archived = self.store.update_many(Collection::Archive, batch)?;
        Ok(live + archived)
    }

    // ==========================================
    // 单件扫码
    // ==========================================

    pub fn scan_unit(&self, ctx: &ScanContext, code: &str) -> RepositoryResult<ScanResult> {
        self.scan_unit_at(ctx, code, Self::now())
    }

    /// 单件扫码
    ///
    /// # 流程
    /// 1. 物料配置 → ConfigMissing
    /// 2. 同码非返工记录（实时或归档）→ Duplicate（返工件允许重新扫码,生成新记录）
    /// 3. 单件码校验 → InvalidFormat / WrongDate
    /// 4. 箱内数量 >= 箱容量 → BoxFull
    /// 5. 写入 box 状态记录 → Saved
    ///
    /// 第 2、4 步在写入事务内再次判定,并发扫码不会超出箱容量
    pub fn scan_unit_at(
        &self,
        ctx: &ScanContext,
        code: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<ScanResult> {
        let code = code.trim();
        let config = match self.resolve(ctx) {
            Ok(config) => config,
            Err(rejected) => return Ok(self.log_rejected(ctx, code, rejected)),
        };

        let duplicate_filter = RecordFilter::new()
            .unit_code(code)
            .exclude_status(ScanStatus::Rework);
        if !code.is_empty() && self.exists_anywhere(&duplicate_filter)? {
            return Ok(self.log_rejected(
                ctx,
                code,
                ScanResult::rejected(ScanOutcome::Duplicate, format!("单件码 {} 已扫描", code)),
            ));
        }

        match IdentifierValidator::validate_unit_code(code, config, now, &self.settings.ciphers) {
            ValidationOutcome::Valid => {}
            ValidationOutcome::InvalidFormat => {
                return Ok(self.log_rejected(
                    ctx,
                    code,
                    ScanResult::rejected(
                        ScanOutcome::InvalidFormat,
                        format!("单件码不包含模板 {}", config.expected_code_template),
                    ),
                ));
            }
            ValidationOutcome::WrongDate => {
                return Ok(self.log_rejected(
                    ctx,
                    code,
                    ScanResult::rejected(
                        ScanOutcome::WrongDate,
                        format!("单件码日期不在允许范围 ({})", config.date_scheme),
                    ),
                ));
            }
        }

        if config.has_box_gating() {
            let in_box =
                self.fill_tracker
                    .count_open(&ctx.workplace, &ctx.article_number, ScanStatus::Box)?;
            if in_box >= u64::from(config.box_capacity) {
                return Ok(self.log_rejected(ctx, code, box_full(config)));
            }
        }

        let record = ScanRecord::new_boxed(ctx, code, now);
        let result = match self.store.insert_guarded(&record, config.box_capacity)? {
            GuardedInsert::Inserted => {
                info!(
                    workplace = %ctx.workplace,
                    article = %ctx.article_number,
                    unit_code = %code,
                    record_id = %record.record_id,
                    "单件已装箱"
                );
                return Ok(ScanResult::saved(1, format!("单件码 {} 已装箱", code)));
            }
            GuardedInsert::Duplicate => {
                ScanResult::rejected(ScanOutcome::Duplicate, format!("单件码 {} 已扫描", code))
            }
            GuardedInsert::ContainerFull => box_full(config),
        };
        Ok(self.log_rejected(ctx, code, result))
    }

    // ==========================================
    // 批次码封箱
    // ==========================================

    pub fn scan_batch(&self, ctx: &ScanContext, payload: &str) -> RepositoryResult<ScanResult> {
        self.scan_batch_at(ctx, payload, Self::now())
    }

    /// 批次码封箱: 当前箱内全部 box 记录 → pallet
    ///
    /// # 流程
    /// 1. 物料配置 → ConfigMissing
    /// 2. 结构 → InvalidFormat; 物料号 → WrongArticle; 数量 → WrongQuantity;
    ///    工序码 → WrongProcess
    /// 3. 批次号已存在（实时或归档）→ Duplicate
    /// 4. 批量迁移,修改 0 条 → NotFound
    pub fn scan_batch_at(
        &self,
        ctx: &ScanContext,
        payload: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<ScanResult> {
        let config = match self.resolve(ctx) {
            Ok(config) => config,
            Err(rejected) => return Ok(self.log_rejected(ctx, payload, rejected)),
        };

        let batch = match BatchCodeParser::check_batch(payload, config, &self.payload_rules()) {
            Ok(batch) => batch,
            Err(rejection) => return Ok(self.log_rejected(ctx, payload, rejection.into())),
        };

        if self.exists_anywhere(&RecordFilter::new().batch_code(&batch.batch_code))? {
            return Ok(self.log_rejected(
                ctx,
                payload,
                ScanResult::rejected(
                    ScanOutcome::Duplicate,
                    format!("批次号 {} 已使用", batch.batch_code),
                ),
            ));
        }

        let transition = BatchTransition {
            filter: RecordFilter::container(&ctx.workplace, &ctx.article_number)
                .status(ScanStatus::Box),
            transition: Transition::CloseBox {
                batch_code: batch.batch_code.clone(),
                at: now,
                operator_id: ctx.operator_id.clone(),
            },
        };
        let affected = self.store.update_many(Collection::Live, &transition)?;

        if affected == 0 {
            return Ok(self.log_rejected(
                ctx,
                payload,
                ScanResult::rejected(ScanOutcome::NotFound, "当前箱内没有待封箱的单件"),
            ));
        }

        info!(
            workplace = %ctx.workplace,
            article = %ctx.article_number,
            batch_code = %batch.batch_code,
            affected,
            "箱已封,挂入托盘批次"
        );
        Ok(ScanResult::saved(
            affected,
            format!("批次 {} 已封箱 ({} 件)", batch.batch_code, affected),
        ))
    }

    // ==========================================
    // 托盘码封托
    // ==========================================

    pub fn scan_pallet(&self, ctx: &ScanContext, payload: &str) -> RepositoryResult<ScanResult> {
        self.scan_pallet_at(ctx, payload, Self::now())
    }

    /// 托盘码封托: 当前托盘上全部 pallet 记录 → warehouse
    ///
    /// # 流程
    /// 1. 物料配置 → ConfigMissing; unit-box 物料 → PalletNotApplicable
    /// 2. 结构 → InvalidFormat; 物料号 → WrongArticle; 箱数 → WrongQuantity
    /// 3. 托盘号已存在（实时或归档）→ Duplicate
    /// 4. 托盘上的批次数 < 托盘容量 → PalletNotFull
    /// 5. 批量迁移,修改 0 条 → NotFound
    pub fn scan_pallet_at(
        &self,
        ctx: &ScanContext,
        payload: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<ScanResult> {
        let config = match self.resolve(ctx) {
            Ok(config) => config,
            Err(rejected) => return Ok(self.log_rejected(ctx, payload, rejected)),
        };

        let pallet_capacity = match (config.container_type, config.pallet_capacity) {
            (ContainerType::UnitBoxPallet, Some(cap)) => cap,
            _ => {
                return Ok(self.log_rejected(
                    ctx,
                    payload,
                    ScanResult::rejected(
                        ScanOutcome::PalletNotApplicable,
                        format!("物料 {} 没有托盘层级", config.article_number),
                    ),
                ));
            }
        };

        let pallet = match BatchCodeParser::check_pallet(payload, config, &self.payload_rules()) {
            Ok(pallet) => pallet,
            Err(rejection) => return Ok(self.log_rejected(ctx, payload, rejection.into())),
        };

        if self.exists_anywhere(&RecordFilter::new().pallet_code(&pallet.pallet_code))? {
            return Ok(self.log_rejected(
                ctx,
                payload,
                ScanResult::rejected(
                    ScanOutcome::Duplicate,
                    format!("托盘号 {} 已使用", pallet.pallet_code),
                ),
            ));
        }

        let batches = self
            .fill_tracker
            .count_open_batches(&ctx.workplace, &ctx.article_number)?;
        if batches < u64::from(pallet_capacity) {
            return Ok(self.log_rejected(
                ctx,
                payload,
                ScanResult::rejected(
                    ScanOutcome::PalletNotFull,
                    format!("托盘未满 ({}/{} 箱)", batches, pallet_capacity),
                ),
            ));
        }

        let transition = BatchTransition {
            filter: RecordFilter::container(&ctx.workplace, &ctx.article_number)
                .status(ScanStatus::Pallet),
            transition: Transition::ClosePallet {
                pallet_code: pallet.pallet_code.clone(),
                at: now,
                operator_id: ctx.operator_id.clone(),
            },
        };
        let affected = self.store.update_many(Collection::Live, &transition)?;

        if affected == 0 {
            return Ok(self.log_rejected(
                ctx,
                payload,
                ScanResult::rejected(ScanOutcome::NotFound, "当前托盘上没有待封托的箱"),
            ));
        }

        info!(
            workplace = %ctx.workplace,
            article = %ctx.article_number,
            pallet_code = %pallet.pallet_code,
            batches,
            affected,
            "托盘已封,入库"
        );
        Ok(ScanResult::saved(
            affected,
            format!("托盘 {} 已入库 ({} 箱, {} 件)", pallet.pallet_code, batches, affected),
        ))
    }

    // ==========================================
    // 人工标记（返工 / 缺陷）
    // ==========================================

    pub fn mark_rework(
        &self,
        identifier: &str,
        reason: &str,
        operator_id: &str,
    ) -> RepositoryResult<usize> {
        self.mark_rework_at(identifier, reason, operator_id, Self::now())
    }

    /// 标记返工
    ///
    /// identifier 与 unit_code / batch_code / pallet_code 任一相等即匹配,
    /// 实时与归档记录都会被标记,已是返工状态的记录不重复标记
    ///
    /// # 返回
    /// - 修改的记录数,0 表示没有匹配
    pub fn mark_rework_at(
        &self,
        identifier: &str,
        reason: &str,
        operator_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(0);
        }

        let batch = BatchTransition {
            filter: RecordFilter::new()
                .any_code(identifier)
                .exclude_status(ScanStatus::Rework),
            transition: Transition::Rework {
                reason: reason.trim().to_string(),
                at: now,
                operator_id: operator_id.trim().to_string(),
            },
        };
        let affected = self.update_everywhere(&batch)?;

        if affected == 0 {
            warn!(identifier, operator_id, "返工标记未匹配任何记录");
        } else {
            info!(identifier, operator_id, affected, "已标记返工");
        }
        Ok(affected)
    }

    pub fn mark_defect(
        &self,
        identifier: &str,
        defect_keys: &BTreeSet<String>,
        operator_id: &str,
    ) -> RepositoryResult<usize> {
        self.mark_defect_at(identifier, defect_keys, operator_id, Self::now())
    }

    /// 标记缺陷（匹配规则同返工,缺陷键整体替换）
    pub fn mark_defect_at(
        &self,
        identifier: &str,
        defect_keys: &BTreeSet<String>,
        operator_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let identifier = identifier.trim();
        let keys: BTreeSet<String> = defect_keys
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if identifier.is_empty() || keys.is_empty() {
            return Ok(0);
        }

        let batch = BatchTransition {
            filter: RecordFilter::new()
                .any_code(identifier)
                .exclude_status(ScanStatus::Defect),
            transition: Transition::Defect {
                defect_keys: keys,
                at: now,
                operator_id: operator_id.trim().to_string(),
            },
        };
        let affected = self.update_everywhere(&batch)?;

        info!(identifier, operator_id, affected, "已标记缺陷");
        Ok(affected)
    }

    fn log_rejected(&self, ctx: &ScanContext, input: &str, result: ScanResult) -> ScanResult {
        warn!(
            workplace = %ctx.workplace,
            article = %ctx.article_number,
            operator = %ctx.operator_id,
            input,
            outcome = %result.outcome,
            reason = %result.reason,
            "扫码被拒绝"
        );
        result
    }
}

fn box_full(config: &ArticleConfig) -> ScanResult {
    ScanResult::rejected(
        ScanOutcome::BoxFull,
        format!("箱已满 (容量 {}),请先扫描批次码封箱", config.box_capacity),
    )
}
