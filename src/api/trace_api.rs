// ==========================================
// 生产追溯系统 - 追溯 API（对外边界）
// ==========================================
// 职责: 扫码、人工标记、追溯查询、配置重载
// 红线: 每个操作写入 scan_action_log（包括被拒绝的扫码）
// 红线: 物料配置注册表只读,重载 = 换一个新实例
// ==========================================

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::article_registry::ArticleConfigRegistry;
use crate::config::config_manager::ConfigManager;
use crate::config::settings::ScanSettings;
use crate::domain::action_log::{ScanActionLog, ScanActionType};
use crate::domain::scan_record::{FillLevel, ScanContext, ScanResult};
use crate::domain::trace_query::{TraceQuery, TraceQueryResult};
use crate::engine::archiver::RecordArchiver;
use crate::engine::scan_processor::ScanProcessor;
use crate::engine::trace_query::TraceQueryService;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::article_config_repo::ArticleConfigRepository;
use crate::repository::error::RepositoryError;
use crate::repository::scan_record_repo::ScanRecordRepository;
use crate::repository::scan_record_store::ScanRecordStore;

// ==========================================
// TraceApi - 追溯 API
// ==========================================
pub struct TraceApi {
    store: Arc<dyn ScanRecordStore>,
    article_repo: Arc<ArticleConfigRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    registry: RwLock<Arc<ArticleConfigRegistry>>,
    settings: Arc<ScanSettings>,
}

impl TraceApi {
    /// 创建新的 TraceApi 实例
    ///
    /// # 参数
    /// - store: 扫码记录存储
    /// - article_repo: 物料配置仓储（重载时使用）
    /// - action_log_repo: 操作日志仓储
    /// - registry: 已加载的物料配置注册表
    /// - settings: 运行时设置快照
    pub fn new(
        store: Arc<dyn ScanRecordStore>,
        article_repo: Arc<ArticleConfigRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        registry: ArticleConfigRegistry,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            article_repo,
            action_log_repo,
            registry: RwLock::new(Arc::new(registry)),
            settings: Arc::new(settings),
        }
    }

    /// 基于共享连接组装全部仓储,并从 article_config 表加载注册表
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        settings: ScanSettings,
    ) -> ApiResult<Self> {
        let store: Arc<dyn ScanRecordStore> = Arc::new(ScanRecordRepository::new(conn.clone()));
        let article_repo = Arc::new(ArticleConfigRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));
        let registry = ArticleConfigRegistry::load(&article_repo)?;

        Ok(Self::new(
            store,
            article_repo,
            action_log_repo,
            registry,
            settings,
        ))
    }

    /// 打开数据库（建表幂等）,从 config_kv 读取设置后组装
    pub async fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        crate::db::init_schema(&conn).map_err(RepositoryError::from)?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::SettingsError(e.to_string()))?;
        let settings = ScanSettings::load(&config_manager)
            .await
            .map_err(|e| ApiError::SettingsError(e.to_string()))?;
        match config_manager.get_config_snapshot() {
            Ok(snapshot) => info!(db_path, config = %snapshot, "追溯库已打开"),
            Err(e) => warn!(db_path, error = %e, "配置快照读取失败"),
        }

        Self::from_connection(conn, settings)
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// 当前注册表快照
    pub fn registry(&self) -> ApiResult<Arc<ArticleConfigRegistry>> {
        self.registry
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| ApiError::InternalError(format!("注册表锁获取失败: {}", e)))
    }

    fn processor(&self) -> ApiResult<ScanProcessor> {
        Ok(ScanProcessor::new(
            self.store.clone(),
            self.registry()?,
            self.settings.clone(),
        ))
    }

    fn query_service(&self) -> ApiResult<TraceQueryService> {
        Ok(TraceQueryService::new(
            self.store.clone(),
            self.registry()?,
            &self.settings,
        ))
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    // ==========================================
    // 扫码接口
    // ==========================================

    /// 单件扫码
    pub fn scan_unit(&self, ctx: &ScanContext, code: &str) -> ApiResult<ScanResult> {
        validate_context(ctx)?;
        let result = self.processor()?.scan_unit(ctx, code)?;
        self.record_scan(ScanActionType::ScanUnit, ctx, code, &result);
        Ok(result)
    }

    /// 批次码封箱
    pub fn scan_batch(&self, ctx: &ScanContext, payload: &str) -> ApiResult<ScanResult> {
        validate_context(ctx)?;
        let result = self.processor()?.scan_batch(ctx, payload)?;
        self.record_scan(ScanActionType::ScanBatch, ctx, payload, &result);
        Ok(result)
    }

    /// 托盘码封托
    pub fn scan_pallet(&self, ctx: &ScanContext, payload: &str) -> ApiResult<ScanResult> {
        validate_context(ctx)?;
        let result = self.processor()?.scan_pallet(ctx, payload)?;
        self.record_scan(ScanActionType::ScanPallet, ctx, payload, &result);
        Ok(result)
    }

    // ==========================================
    // 人工标记接口
    // ==========================================

    /// 标记返工
    ///
    /// # 返回
    /// - Ok(n): 修改的记录数,0 表示没有匹配（正常结果）
    pub fn mark_rework(
        &self,
        identifier: &str,
        reason: &str,
        operator_id: &str,
    ) -> ApiResult<usize> {
        require_non_empty("identifier", identifier)?;
        require_non_empty("reason", reason)?;
        require_non_empty("operator_id", operator_id)?;

        let affected = self
            .processor()?
            .mark_rework(identifier, reason, operator_id)?;

        let mut log = ScanActionLog::new(ScanActionType::MarkRework, operator_id, Self::now());
        log.payload = Some(identifier.trim().to_string());
        log.outcome = marked_outcome(affected).to_string();
        log.affected_count = affected;
        log.detail = Some(reason.trim().to_string());
        self.record_action(&log);

        Ok(affected)
    }

    /// 标记缺陷
    pub fn mark_defect(
        &self,
        identifier: &str,
        defect_keys: &BTreeSet<String>,
        operator_id: &str,
    ) -> ApiResult<usize> {
        require_non_empty("identifier", identifier)?;
        require_non_empty("operator_id", operator_id)?;
        if defect_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(ApiError::InvalidInput("缺陷键不能为空".to_string()));
        }

        let affected = self
            .processor()?
            .mark_defect(identifier, defect_keys, operator_id)?;

        let mut log = ScanActionLog::new(ScanActionType::MarkDefect, operator_id, Self::now());
        log.payload = Some(identifier.trim().to_string());
        log.outcome = marked_outcome(affected).to_string();
        log.affected_count = affected;
        log.detail = Some(
            defect_keys
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(","),
        );
        self.record_action(&log);

        Ok(affected)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 追溯查询（实时 + 归档,受上限约束）
    pub fn query(&self, query: &TraceQuery) -> ApiResult<TraceQueryResult> {
        Ok(self.query_service()?.query(query)?)
    }

    /// 工位当前容器填充情况
    pub fn fill_level(
        &self,
        workplace: &str,
        article_number: &str,
    ) -> ApiResult<Option<FillLevel>> {
        Ok(self
            .query_service()?
            .fill_level(workplace.trim(), article_number.trim())?)
    }

    // ==========================================
    // 维护接口
    // ==========================================

    /// 从 article_config 表重新加载注册表
    ///
    /// 加载失败时保留旧注册表
    pub fn reload_articles(&self) -> ApiResult<usize> {
        let fresh = ArticleConfigRegistry::load(&self.article_repo).map_err(|e| {
            warn!(error = %e, "物料配置重载失败,沿用旧配置");
            ApiError::from(e)
        })?;
        let count = fresh.len();

        let mut guard = self
            .registry
            .write()
            .map_err(|e| ApiError::InternalError(format!("注册表锁获取失败: {}", e)))?;
        *guard = Arc::new(fresh);

        info!(articles = count, "物料配置已重载");
        Ok(count)
    }

    /// 归档早于保留天数的已封闭记录
    ///
    /// # 参数
    /// - after_days: 保留天数,None 时取 archive_after_days 设置
    /// - operator_id: 执行人（写入操作日志）
    pub fn archive_closed_records(
        &self,
        after_days: Option<i64>,
        operator_id: &str,
    ) -> ApiResult<usize> {
        let days = after_days.unwrap_or(self.settings.archive_after_days);
        if days < 1 {
            return Err(ApiError::InvalidInput(format!("保留天数必须为正数: {}", days)));
        }
        let now = Self::now();
        let cutoff = RecordArchiver::retention_cutoff(now, days)
            .ok_or_else(|| ApiError::InvalidInput(format!("保留天数超出范围: {}", days)))?;
        let moved = RecordArchiver::new(self.store.clone()).archive_before(cutoff)?;

        let mut log = ScanActionLog::new(ScanActionType::Archive, operator_id, now);
        log.outcome = "ARCHIVED".to_string();
        log.affected_count = moved;
        log.detail = Some(format!("archive_after_days={}", days));
        self.record_action(&log);

        Ok(moved)
    }

    // ==========================================
    // 操作日志
    // ==========================================

    fn record_scan(
        &self,
        action_type: ScanActionType,
        ctx: &ScanContext,
        payload: &str,
        result: &ScanResult,
    ) {
        let mut log = ScanActionLog::new(action_type, &ctx.operator_id, Self::now());
        log.workplace = Some(ctx.workplace.clone());
        log.article_number = Some(ctx.article_number.clone());
        log.payload = Some(payload.trim().to_string());
        log.outcome = result.outcome.to_string();
        log.affected_count = result.affected;
        log.detail = Some(result.reason.clone());
        self.record_action(&log);
    }

    /// 操作已生效后写日志,日志失败只告警,不改变操作结果
    fn record_action(&self, log: &ScanActionLog) {
        if let Err(e) = self.action_log_repo.insert(log) {
            warn!(
                action_type = %log.action_type,
                actor = %log.actor,
                error = %e,
                "操作日志写入失败"
            );
        }
    }
}

fn validate_context(ctx: &ScanContext) -> ApiResult<()> {
    require_non_empty("workplace", &ctx.workplace)?;
    require_non_empty("operator_id", &ctx.operator_id)
}

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

fn marked_outcome(affected: usize) -> &'static str {
    if affected == 0 {
        "NOT_FOUND"
    } else {
        "MARKED"
    }
}
