// ==========================================
// 生产追溯系统 - 扫码操作日志领域模型
// ==========================================
// 红线: 所有扫码与人工标记必须记录（包括被拒绝的扫码）
// 用途: 审计追踪,操作员误扫分析
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ScanActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanActionLog {
    pub action_id: String,
    pub action_type: ScanActionType,
    pub action_ts: NaiveDateTime,
    pub actor: String,

    pub workplace: Option<String>,
    pub article_number: Option<String>,
    pub payload: Option<String>, // 原始扫码内容 / 标记标识

    pub outcome: String,
    pub affected_count: usize,
    pub detail: Option<String>,
}

impl ScanActionLog {
    pub fn new(action_type: ScanActionType, actor: &str, action_ts: NaiveDateTime) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            action_ts,
            actor: actor.to_string(),
            workplace: None,
            article_number: None,
            payload: None,
            outcome: String::new(),
            affected_count: 0,
            detail: None,
        }
    }
}

// ==========================================
// ScanActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanActionType {
    ScanUnit,   // 单件扫码
    ScanBatch,  // 批次码封箱
    ScanPallet, // 托盘码封托
    MarkRework, // 标记返工
    MarkDefect, // 标记缺陷
    Archive,    // 归档
}

impl fmt::Display for ScanActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanActionType::ScanUnit => "SCAN_UNIT",
            ScanActionType::ScanBatch => "SCAN_BATCH",
            ScanActionType::ScanPallet => "SCAN_PALLET",
            ScanActionType::MarkRework => "MARK_REWORK",
            ScanActionType::MarkDefect => "MARK_DEFECT",
            ScanActionType::Archive => "ARCHIVE",
        };
        f.write_str(s)
    }
}

impl ScanActionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SCAN_UNIT" => Some(ScanActionType::ScanUnit),
            "SCAN_BATCH" => Some(ScanActionType::ScanBatch),
            "SCAN_PALLET" => Some(ScanActionType::ScanPallet),
            "MARK_REWORK" => Some(ScanActionType::MarkRework),
            "MARK_DEFECT" => Some(ScanActionType::MarkDefect),
            "ARCHIVE" => Some(ScanActionType::Archive),
            _ => None,
        }
    }
}
