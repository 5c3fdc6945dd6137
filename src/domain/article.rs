// ==========================================
// 生产追溯系统 - 物料配置领域模型
// ==========================================
// 职责: 单个工位上单个可生产物料的校验与容量规则
// 标识: (workplace, article_number) 唯一
// 红线: 扫码引擎只读,不修改配置
// ==========================================

use crate::domain::types::{ContainerType, DateScheme};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 单件码中日期片段允许的最大区间数量
pub const MAX_DATE_RANGES: usize = 2;

// ==========================================
// DateRange - 单件码中的日期片段区间 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: usize,
    pub end: usize,
}

impl DateRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// ArticleConfig - 物料配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleConfig {
    // ===== 主键 =====
    pub workplace: String,
    pub article_number: String,
    pub display_name: String,

    // ===== 容量规则 =====
    pub container_type: ContainerType,
    pub box_capacity: u32,           // 0 = 不限箱容量
    pub pallet_capacity: Option<u32>, // 仅 unit-box-pallet 存在

    // ===== 单件码校验规则 =====
    pub expected_code_template: String,
    pub date_validation_ranges: Vec<DateRange>,
    pub date_scheme: DateScheme,

    // ===== 批次码校验规则 =====
    pub hydra_process_codes: BTreeSet<String>,
}

impl ArticleConfig {
    /// 配置键
    pub fn key(&self) -> (String, String) {
        (self.workplace.clone(), self.article_number.clone())
    }

    /// 是否启用箱容量控制
    pub fn has_box_gating(&self) -> bool {
        self.box_capacity > 0
    }

    /// 配置一致性检查
    ///
    /// # 返回
    /// - Ok(()): 配置合法
    /// - Err(reason): 违规原因（加载时拒绝,不留到扫码时）
    pub fn validate(&self) -> Result<(), String> {
        if self.workplace.trim().is_empty() {
            return Err("workplace 为空".to_string());
        }
        if self.article_number.trim().is_empty() {
            return Err("article_number 为空".to_string());
        }
        if self.expected_code_template.is_empty() {
            return Err("expected_code_template 为空".to_string());
        }

        match (self.container_type, self.pallet_capacity) {
            (ContainerType::UnitBox, Some(cap)) => {
                return Err(format!("unit-box 物料不允许配置托盘容量 (pallet_capacity={})", cap));
            }
            (ContainerType::UnitBoxPallet, None) => {
                return Err("unit-box-pallet 物料必须配置托盘容量".to_string());
            }
            (ContainerType::UnitBoxPallet, Some(0)) => {
                return Err("托盘容量必须为正数".to_string());
            }
            _ => {}
        }

        if self.date_validation_ranges.len() > MAX_DATE_RANGES {
            return Err(format!(
                "日期区间最多 {} 个，实际 {} 个",
                MAX_DATE_RANGES,
                self.date_validation_ranges.len()
            ));
        }
        for range in &self.date_validation_ranges {
            if range.start >= range.end {
                return Err(format!("日期区间无效: [{}, {})", range.start, range.end));
            }
        }

        match (self.date_scheme, self.date_validation_ranges.is_empty()) {
            (DateScheme::None, false) => {
                Err("date_scheme=none 时不应配置日期区间".to_string())
            }
            (DateScheme::Ford, true) | (DateScheme::Bmw, true) => Err(format!(
                "date_scheme={} 时至少需要一个日期区间",
                self.date_scheme
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ArticleConfig {
        ArticleConfig {
            workplace: "WP1".to_string(),
            article_number: "ABC".to_string(),
            display_name: "Bracket ABC".to_string(),
            container_type: ContainerType::UnitBox,
            box_capacity: 2,
            pallet_capacity: None,
            expected_code_template: "ABC".to_string(),
            date_validation_ranges: vec![],
            date_scheme: DateScheme::None,
            hydra_process_codes: ["090".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_valid_unit_box_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_unit_box_with_pallet_capacity_rejected() {
        let mut cfg = base_config();
        cfg.pallet_capacity = Some(4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_pallet_config_requires_capacity() {
        let mut cfg = base_config();
        cfg.container_type = ContainerType::UnitBoxPallet;
        assert!(cfg.validate().is_err());

        cfg.pallet_capacity = Some(0);
        assert!(cfg.validate().is_err());

        cfg.pallet_capacity = Some(3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_date_range_rules() {
        let mut cfg = base_config();
        cfg.date_scheme = DateScheme::Ford;
        assert!(cfg.validate().is_err(), "ford 需要日期区间");

        cfg.date_validation_ranges = vec![DateRange::new(3, 7)];
        assert!(cfg.validate().is_ok());

        cfg.date_validation_ranges = vec![DateRange::new(7, 3)];
        assert!(cfg.validate().is_err());

        cfg.date_validation_ranges =
            vec![DateRange::new(0, 4), DateRange::new(4, 8), DateRange::new(8, 12)];
        assert!(cfg.validate().is_err());

        cfg.date_scheme = DateScheme::None;
        cfg.date_validation_ranges = vec![DateRange::new(0, 4)];
        assert!(cfg.validate().is_err());
    }
}
