// ==========================================
// 生产追溯系统 - 领域类型定义
// ==========================================
// 职责: 容器类型、日期编码方案、记录状态、扫码结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 容器类型 (Container Type)
// ==========================================
// 序列化格式与配置表一致: unit-box / unit-box-pallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerType {
    UnitBox,       // 单件 → 箱
    UnitBoxPallet, // 单件 → 箱 → 托盘
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::UnitBox => write!(f, "unit-box"),
            ContainerType::UnitBoxPallet => write!(f, "unit-box-pallet"),
        }
    }
}

impl ContainerType {
    /// 从配置字符串解析（大小写、下划线不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "unit-box" => Some(ContainerType::UnitBox),
            "unit-box-pallet" => Some(ContainerType::UnitBoxPallet),
            _ => None,
        }
    }
}

// ==========================================
// 日期编码方案 (Date Scheme)
// ==========================================
// 客户专用的生产日期编码,决定单件码中日期片段的解码规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateScheme {
    None, // 不校验日期
    Ford, // 年末位 + 年内天数
    Bmw,  // 定宽数字日期
}

impl fmt::Display for DateScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateScheme::None => write!(f, "none"),
            DateScheme::Ford => write!(f, "ford"),
            DateScheme::Bmw => write!(f, "bmw"),
        }
    }
}

impl DateScheme {
    /// 从配置字符串解析，空字符串视为 none
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Some(DateScheme::None),
            "ford" => Some(DateScheme::Ford),
            "bmw" => Some(DateScheme::Bmw),
            _ => None,
        }
    }
}

// ==========================================
// 记录状态 (Scan Status)
// ==========================================
// 正向: box → pallet → warehouse
// 旁路: rework / defect（人工标记）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Box,       // 已装箱（箱未封）
    Pallet,    // 箱已封，挂在托盘批次上
    Warehouse, // 托盘已封，入库
    Rework,    // 返工
    Defect,    // 缺陷
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Box => "box",
            ScanStatus::Pallet => "pallet",
            ScanStatus::Warehouse => "warehouse",
            ScanStatus::Rework => "rework",
            ScanStatus::Defect => "defect",
        }
    }

    /// 从存储值解析状态
    ///
    /// 历史数据中返工/缺陷状态带有次数后缀（如 `rework2`、`defect_1`），
    /// 读取时统一归类为 Rework / Defect。
    pub fn from_stored(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "box" => Some(ScanStatus::Box),
            "pallet" => Some(ScanStatus::Pallet),
            "warehouse" => Some(ScanStatus::Warehouse),
            _ if s.starts_with("rework") => Some(ScanStatus::Rework),
            _ if s.starts_with("defect") => Some(ScanStatus::Defect),
            _ => None,
        }
    }

    /// 是否为未封闭容器中的状态（归档时不可迁移）
    pub fn is_open(&self) -> bool {
        matches!(self, ScanStatus::Box | ScanStatus::Pallet)
    }
}

// ==========================================
// 扫码结果 (Scan Outcome)
// ==========================================
// 红线: 业务校验失败是返回值,不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Saved,               // 已保存
    Duplicate,           // 重复扫码
    InvalidFormat,       // 码格式错误
    WrongDate,           // 日期不在允许范围
    WrongArticle,        // 物料号不符
    WrongQuantity,       // 数量不符
    WrongProcess,        // 工序码不符
    BoxFull,             // 箱已满
    PalletNotFull,       // 托盘未满
    PalletNotApplicable, // 该物料无托盘层级
    ConfigMissing,       // 未找到物料配置
    NotFound,            // 没有可封装的记录
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanOutcome::Saved => "SAVED",
            ScanOutcome::Duplicate => "DUPLICATE",
            ScanOutcome::InvalidFormat => "INVALID_FORMAT",
            ScanOutcome::WrongDate => "WRONG_DATE",
            ScanOutcome::WrongArticle => "WRONG_ARTICLE",
            ScanOutcome::WrongQuantity => "WRONG_QUANTITY",
            ScanOutcome::WrongProcess => "WRONG_PROCESS",
            ScanOutcome::BoxFull => "BOX_FULL",
            ScanOutcome::PalletNotFull => "PALLET_NOT_FULL",
            ScanOutcome::PalletNotApplicable => "PALLET_NOT_APPLICABLE",
            ScanOutcome::ConfigMissing => "CONFIG_MISSING",
            ScanOutcome::NotFound => "NOT_FOUND",
        };
        f.write_str(s)
    }
}

impl ScanOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, ScanOutcome::Saved)
    }
}

// ==========================================
// 单件码校验结果 (Validation Outcome)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationOutcome {
    Valid,
    InvalidFormat,
    WrongDate,
}
