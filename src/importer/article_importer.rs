// ==========================================
// 生产追溯系统 - 物料配置导入器
// ==========================================
// 流程: 解析 → 映射 → 校验 → 文件内查重 → 落库
// 红线: 行级错误逐条收集上报,不静默丢弃
// 红线: 校验规则与注册表加载一致,坏配置不入库
// ==========================================

use crate::domain::article::{ArticleConfig, DateRange};
use crate::domain::types::{ContainerType, DateScheme};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::repository::article_config_repo::ArticleConfigRepository;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 配置表列名
pub mod columns {
    pub const WORKPLACE: &str = "workplace";
    pub const ARTICLE_NUMBER: &str = "article_number";
    pub const DISPLAY_NAME: &str = "display_name";
    pub const CONTAINER_TYPE: &str = "container_type";
    pub const BOX_CAPACITY: &str = "box_capacity";
    pub const PALLET_CAPACITY: &str = "pallet_capacity";
    pub const EXPECTED_CODE_TEMPLATE: &str = "expected_code_template";
    pub const DATE_RANGES: &str = "date_ranges";
    pub const DATE_SCHEME: &str = "date_scheme";
    pub const HYDRA_PROCESS_CODES: &str = "hydra_process_codes";
}

/// 行级错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// 导入结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub errors: Vec<RowError>,
}

impl From<ImportError> for RowError {
    fn from(err: ImportError) -> Self {
        Self {
            row: err.row().unwrap_or(0),
            message: err.to_string(),
        }
    }
}

impl ArticleImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ==========================================
// ArticleConfigImporter
// ==========================================
pub struct ArticleConfigImporter {
    repo: Arc<ArticleConfigRepository>,
}

impl ArticleConfigImporter {
    pub fn new(repo: Arc<ArticleConfigRepository>) -> Self {
        Self { repo }
    }

    /// 从文件导入（有效行写入,无效行进入报告）
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ArticleImportReport> {
        let rows = UniversalFileParser.parse(file_path.as_ref())?;
        let total_rows = rows.len();

        let (configs, errors) = map_rows(&rows);
        for err in &errors {
            warn!(row = err.row, message = %err.message, "物料配置行被拒绝");
        }

        let imported = self.repo.batch_upsert(&configs)?;
        info!(total_rows, imported, rejected = errors.len(), "物料配置导入完成");

        Ok(ArticleImportReport {
            total_rows,
            imported,
            errors,
        })
    }
}

/// 映射全部行（行号从 2 开始,第 1 行为表头）
///
/// 文件内重复的 (workplace, article_number) 以首次出现为准,后续行报错
pub fn map_rows(rows: &[RawRow]) -> (Vec<ArticleConfig>, Vec<RowError>) {
    let mut configs = Vec::new();
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 2;
        match map_row(row, raw) {
            Ok(config) => {
                if seen.insert(config.key()) {
                    configs.push(config);
                } else {
                    errors.push(RowError::from(ImportError::DuplicateArticle {
                        row,
                        workplace: config.workplace,
                        article_number: config.article_number,
                    }));
                }
            }
            Err(e) => errors.push(RowError::from(e)),
        }
    }

    (configs, errors)
}

/// 映射并校验单行
pub fn map_row(row: usize, raw: &RawRow) -> ImportResult<ArticleConfig> {
    let workplace = required(row, raw, columns::WORKPLACE)?;
    let article_number = required(row, raw, columns::ARTICLE_NUMBER)?;
    let display_name = optional(raw, columns::DISPLAY_NAME)
        .unwrap_or(&article_number)
        .to_string();

    let container_type_raw = required(row, raw, columns::CONTAINER_TYPE)?;
    let container_type = ContainerType::parse(&container_type_raw).ok_or_else(|| {
        ImportError::InvalidValue {
            row,
            field: columns::CONTAINER_TYPE.to_string(),
            message: format!("未知容器类型 {}", container_type_raw),
        }
    })?;

    let box_capacity = parse_u32(
        row,
        columns::BOX_CAPACITY,
        &required(row, raw, columns::BOX_CAPACITY)?,
    )?;
    let pallet_capacity = optional(raw, columns::PALLET_CAPACITY)
        .map(|v| parse_u32(row, columns::PALLET_CAPACITY, v))
        .transpose()?;

    let scheme_raw = optional(raw, columns::DATE_SCHEME).unwrap_or("");
    let date_scheme =
        DateScheme::parse(scheme_raw).ok_or_else(|| ImportError::InvalidValue {
            row,
            field: columns::DATE_SCHEME.to_string(),
            message: format!("未知日期编码方案 {}", scheme_raw),
        })?;

    let date_validation_ranges = optional(raw, columns::DATE_RANGES)
        .map(|v| parse_ranges(row, v))
        .transpose()?
        .unwrap_or_default();

    let hydra_process_codes: BTreeSet<String> = optional(raw, columns::HYDRA_PROCESS_CODES)
        .map(split_list)
        .unwrap_or_default();

    let config = ArticleConfig {
        workplace,
        article_number,
        display_name,
        container_type,
        box_capacity,
        pallet_capacity,
        expected_code_template: required(row, raw, columns::EXPECTED_CODE_TEMPLATE)?,
        date_validation_ranges,
        date_scheme,
        hydra_process_codes,
    };

    config
        .validate()
        .map_err(|message| ImportError::RuleViolation { row, message })?;
    Ok(config)
}

fn optional<'a>(raw: &'a RawRow, field: &str) -> Option<&'a str> {
    raw.get(field).map(|v| v.as_str()).filter(|v| !v.is_empty())
}

fn required(row: usize, raw: &RawRow, field: &str) -> ImportResult<String> {
    optional(raw, field)
        .map(str::to_string)
        .ok_or_else(|| ImportError::MissingField {
            row,
            field: field.to_string(),
        })
}

/// 解析非负整数（Excel 数值单元格可能带 ".0"）
fn parse_u32(row: usize, field: &str, value: &str) -> ImportResult<u32> {
    if let Ok(n) = value.parse::<u32>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX) => Ok(f as u32),
        _ => Err(ImportError::InvalidValue {
            row,
            field: field.to_string(),
            message: format!("期望非负整数,实际 {}", value),
        }),
    }
}

/// 日期区间: "3-7" 或 "3-7;9-15"
fn parse_ranges(row: usize, value: &str) -> ImportResult<Vec<DateRange>> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (start, end) = part.split_once('-').ok_or_else(|| {
                ImportError::InvalidValue {
                    row,
                    field: columns::DATE_RANGES.to_string(),
                    message: format!("日期区间格式应为 start-end,实际 {}", part),
                }
            })?;
            Ok(DateRange::new(
                parse_u32(row, columns::DATE_RANGES, start.trim())? as usize,
                parse_u32(row, columns::DATE_RANGES, end.trim())? as usize,
            ))
        })
        .collect()
}

/// 分号或逗号分隔的列表（去重,去空项）
fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split([';', ','])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
