// ==========================================
// 生产追溯系统 - 批次码 / 托盘码解析
// ==========================================
// 批次码: 物料号 | 工序码 | 数量 | 批次号
// 托盘码: 物料号 | 箱数 | 托盘号
// 红线: 纯函数,只做结构解析与配置比对,不查库
// 红线: 比对按固定顺序短路,首个失败即返回
// ==========================================

use crate::domain::article::ArticleConfig;
use crate::domain::scan_record::ScanResult;
use crate::domain::types::ScanOutcome;

/// 解析规则（来自运行时设置）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadRules {
    pub delimiter: char,
    pub min_length: usize,
}

impl Default for PayloadRules {
    fn default() -> Self {
        Self {
            delimiter: '|',
            min_length: 7,
        }
    }
}

/// 解析或比对失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRejection {
    pub outcome: ScanOutcome,
    pub reason: String,
}

impl PayloadRejection {
    fn new(outcome: ScanOutcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
        }
    }
}

impl From<PayloadRejection> for ScanResult {
    fn from(rejection: PayloadRejection) -> Self {
        ScanResult::rejected(rejection.outcome, rejection.reason)
    }
}

// ==========================================
// BatchPayload - 批次码（封箱）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPayload {
    pub article_code: String,
    pub process_code: String,
    pub declared_quantity: String,
    /// 已转大写
    pub batch_code: String,
}

// ==========================================
// PalletPayload - 托盘码（封托）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalletPayload {
    pub article_code: String,
    pub declared_box_count: String,
    /// 已转大写
    pub pallet_code: String,
}

// ==========================================
// BatchCodeParser - 纯函数工具类
// ==========================================
pub struct BatchCodeParser;

impl BatchCodeParser {
    /// 结构检查并拆分字段
    ///
    /// # 规则
    /// - 去除首尾空白后长度 >= min_length
    /// - 必须包含分隔符
    /// - 至少 expected 个字段,前 expected 个字段非空（多余字段忽略）
    fn split_fields(
        payload: &str,
        rules: &PayloadRules,
        expected: usize,
    ) -> Result<Vec<String>, PayloadRejection> {
        let payload = payload.trim();

        if payload.chars().count() < rules.min_length {
            return Err(PayloadRejection::new(
                ScanOutcome::InvalidFormat,
                format!("扫码内容过短 (最少 {} 个字符)", rules.min_length),
            ));
        }
        if !payload.contains(rules.delimiter) {
            return Err(PayloadRejection::new(
                ScanOutcome::InvalidFormat,
                format!("扫码内容缺少分隔符 '{}'", rules.delimiter),
            ));
        }

        let fields: Vec<String> = payload
            .split(rules.delimiter)
            .map(|f| f.trim().to_string())
            .collect();
        if fields.len() < expected || fields[..expected].iter().any(|f| f.is_empty()) {
            return Err(PayloadRejection::new(
                ScanOutcome::InvalidFormat,
                format!("字段数量不足或存在空字段 (需要 {} 个)", expected),
            ));
        }

        Ok(fields)
    }

    /// 解析批次码（不比对配置）
    pub fn parse_batch(payload: &str, rules: &PayloadRules) -> Result<BatchPayload, PayloadRejection> {
        let fields = Self::split_fields(payload, rules, 4)?;
        Ok(BatchPayload {
            article_code: fields[0].clone(),
            process_code: fields[1].clone(),
            declared_quantity: fields[2].clone(),
            batch_code: fields[3].to_uppercase(),
        })
    }

    /// 解析托盘码（不比对配置）
    pub fn parse_pallet(
        payload: &str,
        rules: &PayloadRules,
    ) -> Result<PalletPayload, PayloadRejection> {
        let fields = Self::split_fields(payload, rules, 3)?;
        Ok(PalletPayload {
            article_code: fields[0].clone(),
            declared_box_count: fields[1].clone(),
            pallet_code: fields[2].to_uppercase(),
        })
    }

    /// 解析批次码并与物料配置比对
    ///
    /// # 比对顺序
    /// 1. 物料号 == article_number → 否则 WrongArticle
    /// 2. 数量 == box_capacity → 否则 WrongQuantity（非数字同样视为数量不符）
    /// 3. 工序码 ∈ hydra_process_codes → 否则 WrongProcess
    ///
    /// 批次号查重需要查库,由 ScanProcessor 负责
    pub fn check_batch(
        payload: &str,
        config: &ArticleConfig,
        rules: &PayloadRules,
    ) -> Result<BatchPayload, PayloadRejection> {
        let batch = Self::parse_batch(payload, rules)?;

        if batch.article_code != config.article_number {
            return Err(PayloadRejection::new(
                ScanOutcome::WrongArticle,
                format!(
                    "批次码物料号 {} 与当前物料 {} 不符",
                    batch.article_code, config.article_number
                ),
            ));
        }

        if batch.declared_quantity.parse::<u32>().ok() != Some(config.box_capacity) {
            return Err(PayloadRejection::new(
                ScanOutcome::WrongQuantity,
                format!(
                    "批次码数量 {} 与箱容量 {} 不符",
                    batch.declared_quantity, config.box_capacity
                ),
            ));
        }

        if !config.hydra_process_codes.contains(&batch.process_code) {
            return Err(PayloadRejection::new(
                ScanOutcome::WrongProcess,
                format!("工序码 {} 不在允许列表中", batch.process_code),
            ));
        }

        Ok(batch)
    }

    /// 解析托盘码并与物料配置比对
    ///
    /// # 比对顺序
    /// 1. 物料号 == article_number → 否则 WrongArticle
    /// 2. 箱数 == pallet_capacity → 否则 WrongQuantity
    pub fn check_pallet(
        payload: &str,
        config: &ArticleConfig,
        rules: &PayloadRules,
    ) -> Result<PalletPayload, PayloadRejection> {
        let pallet = Self::parse_pallet(payload, rules)?;

        if pallet.article_code != config.article_number {
            return Err(PayloadRejection::new(
                ScanOutcome::WrongArticle,
                format!(
                    "托盘码物料号 {} 与当前物料 {} 不符",
                    pallet.article_code, config.article_number
                ),
            ));
        }

        let declared = pallet.declared_box_count.parse::<u32>().ok();
        if declared.is_none() || declared != config.pallet_capacity {
            return Err(PayloadRejection::new(
                ScanOutcome::WrongQuantity,
                format!(
                    "托盘码箱数 {} 与托盘容量不符",
                    pallet.declared_box_count
                ),
            ));
        }

        Ok(pallet)
    }
}
