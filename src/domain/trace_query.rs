// ==========================================
// 生产追溯系统 - 追溯查询模型
// ==========================================
// 规则: 同字段多值 OR, 跨字段 AND
// 状态伪值: rework / defect 按前缀匹配（兼容历史带次数后缀的状态）
// ==========================================

use crate::domain::scan_record::ScanRecord;
use crate::domain::types::ScanStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RecordFilter - 记录过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub workplaces: Vec<String>,
    pub article_numbers: Vec<String>,
    pub statuses: Vec<ScanStatus>,
    pub exclude_statuses: Vec<ScanStatus>,
    pub unit_codes: Vec<String>,
    pub unit_code_contains: Option<String>,
    pub batch_codes: Vec<String>,
    pub pallet_codes: Vec<String>,
    /// unit_code / batch_code / pallet_code 任一相等
    pub any_code: Option<String>,
    /// 扫码时间下限（含）
    pub scanned_from: Option<NaiveDateTime>,
    /// 扫码时间上限（不含）
    pub scanned_to: Option<NaiveDateTime>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 工位 + 物料（容器维度）
    pub fn container(workplace: &str, article_number: &str) -> Self {
        Self::new().workplace(workplace).article(article_number)
    }

    pub fn workplace(mut self, workplace: &str) -> Self {
        self.workplaces.push(workplace.to_string());
        self
    }

    pub fn article(mut self, article_number: &str) -> Self {
        self.article_numbers.push(article_number.to_string());
        self
    }

    pub fn status(mut self, status: ScanStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn exclude_status(mut self, status: ScanStatus) -> Self {
        self.exclude_statuses.push(status);
        self
    }

    pub fn unit_code(mut self, unit_code: &str) -> Self {
        self.unit_codes.push(unit_code.to_string());
        self
    }

    pub fn unit_code_contains(mut self, fragment: &str) -> Self {
        self.unit_code_contains = Some(fragment.to_string());
        self
    }

    pub fn batch_code(mut self, batch_code: &str) -> Self {
        self.batch_codes.push(batch_code.to_string());
        self
    }

    pub fn pallet_code(mut self, pallet_code: &str) -> Self {
        self.pallet_codes.push(pallet_code.to_string());
        self
    }

    pub fn any_code(mut self, code: &str) -> Self {
        self.any_code = Some(code.to_string());
        self
    }

    pub fn scanned_between(
        mut self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Self {
        self.scanned_from = from;
        self.scanned_to = to;
        self
    }
}

// ==========================================
// QueryPurpose - 查询用途（决定上限）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryPurpose {
    #[default]
    Default,
    DefectExport, // 缺陷导出，上限更大
}

// ==========================================
// TraceQuery - 追溯查询请求（只读,不落库）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceQuery {
    pub filter: RecordFilter,
    pub limit: Option<usize>,
    pub purpose: QueryPurpose,
}

impl TraceQuery {
    pub fn new(filter: RecordFilter) -> Self {
        Self {
            filter,
            limit: None,
            purpose: QueryPurpose::Default,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn for_defect_export(mut self) -> Self {
        self.purpose = QueryPurpose::DefectExport;
        self
    }
}

/// 查询结果
///
/// truncated = true 表示结果已达上限,上限之外可能还有匹配记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceQueryResult {
    pub records: Vec<ScanRecord>,
    pub truncated: bool,
}
