// ==========================================
// 生产追溯系统 - 扫码记录领域模型
// ==========================================
// 职责: 单件追溯记录、扫码上下文、批量状态迁移
// 红线: 状态只向前推进,返工/缺陷为人工旁路
// ==========================================

use crate::domain::trace_query::RecordFilter;
use crate::domain::types::{ScanOutcome, ScanStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// ScanRecord - 单件追溯记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    // ===== 主键 =====
    pub record_id: String,
    pub unit_code: String, // status != rework 时唯一

    // ===== 归属 =====
    pub workplace: String,
    pub article_number: String,
    pub operator_id: String,

    // ===== 状态 =====
    pub status: ScanStatus,
    pub scanned_at: NaiveDateTime,

    // ===== 箱/托盘 =====
    pub batch_code: Option<String>,
    pub batch_assigned_at: Option<NaiveDateTime>,
    pub pallet_code: Option<String>,
    pub pallet_assigned_at: Option<NaiveDateTime>,

    // ===== 返工/缺陷 =====
    pub rework_reason: Option<String>,
    pub rework_by: Option<String>,
    pub rework_at: Option<NaiveDateTime>,
    pub defect_keys: BTreeSet<String>,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl ScanRecord {
    /// 新建装箱记录（首次成功扫码的初始状态为 box）
    pub fn new_boxed(ctx: &ScanContext, unit_code: &str, scanned_at: NaiveDateTime) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            unit_code: unit_code.to_string(),
            workplace: ctx.workplace.clone(),
            article_number: ctx.article_number.clone(),
            operator_id: ctx.operator_id.clone(),
            status: ScanStatus::Box,
            scanned_at,
            batch_code: None,
            batch_assigned_at: None,
            pallet_code: None,
            pallet_assigned_at: None,
            rework_reason: None,
            rework_by: None,
            rework_at: None,
            defect_keys: BTreeSet::new(),
            status_history: Vec::new(),
        }
    }
}

/// 状态变更历史（返工/缺陷覆盖前的状态）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: String, // 原始存储值
    pub at: NaiveDateTime,
    pub by: String,
}

// ==========================================
// ScanContext - 扫码上下文（工位 + 当前物料 + 操作员）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    pub workplace: String,
    pub article_number: String,
    pub operator_id: String,
}

impl ScanContext {
    pub fn new(workplace: &str, article_number: &str, operator_id: &str) -> Self {
        Self {
            workplace: workplace.trim().to_string(),
            article_number: article_number.trim().to_string(),
            operator_id: operator_id.trim().to_string(),
        }
    }
}

// ==========================================
// ScanResult - 单次扫码处理结果
// ==========================================
// 红线: 所有结果必须输出 reason,供工位界面展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub outcome: ScanOutcome,
    pub affected: usize,
    pub reason: String,
}

impl ScanResult {
    pub fn rejected(outcome: ScanOutcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            affected: 0,
            reason: reason.into(),
        }
    }

    pub fn saved(affected: usize, reason: impl Into<String>) -> Self {
        Self {
            outcome: ScanOutcome::Saved,
            affected,
            reason: reason.into(),
        }
    }
}

// ==========================================
// Transition - 批量状态迁移
// ==========================================
// 封箱、封托、返工、缺陷均为"按条件批量更新",
// 各条记录之间不保证跨记录原子性,由存储层单条语句执行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// box → pallet
    CloseBox {
        batch_code: String,
        at: NaiveDateTime,
        operator_id: String,
    },
    /// pallet → warehouse
    ClosePallet {
        pallet_code: String,
        at: NaiveDateTime,
        operator_id: String,
    },
    /// any → rework（原状态写入历史）
    Rework {
        reason: String,
        at: NaiveDateTime,
        operator_id: String,
    },
    /// any → defect（原状态写入历史）
    Defect {
        defect_keys: BTreeSet<String>,
        at: NaiveDateTime,
        operator_id: String,
    },
}

impl Transition {
    pub fn target_status(&self) -> ScanStatus {
        match self {
            Transition::CloseBox { .. } => ScanStatus::Pallet,
            Transition::ClosePallet { .. } => ScanStatus::Warehouse,
            Transition::Rework { .. } => ScanStatus::Rework,
            Transition::Defect { .. } => ScanStatus::Defect,
        }
    }
}

/// 条件 + 迁移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTransition {
    pub filter: RecordFilter,
    pub transition: Transition,
}

// ==========================================
// FillLevel - 工位当前容器填充情况
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillLevel {
    pub workplace: String,
    pub article_number: String,
    pub units_in_open_box: u64,
    pub box_capacity: u32,
    pub batches_on_open_pallet: Option<u64>,
    pub pallet_capacity: Option<u32>,
}
