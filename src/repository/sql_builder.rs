// ==========================================
// 生产追溯系统 - SQL 构建工具模块
// ==========================================
// 职责: 把 RecordFilter 翻译为参数化 WHERE 子句
// 约束: 所有值走参数绑定,不拼接用户输入
// ==========================================

use crate::db::TS_FORMAT;
use crate::domain::trace_query::RecordFilter;
use crate::domain::types::ScanStatus;
use rusqlite::types::Value;

/// SQL 查询构建器（流式 API）
///
/// # 示例
/// ```
/// use production_trace::domain::RecordFilter;
/// use production_trace::repository::sql_builder::SqlQueryBuilder;
///
/// let filter = RecordFilter::container("WP1", "ABC");
/// let builder = SqlQueryBuilder::new("SELECT COUNT(*) FROM scan_record")
///     .filter(&filter)
///     .order_by("scanned_at DESC")
///     .limit(10);
///
/// assert_eq!(
///     builder.build(),
///     "SELECT COUNT(*) FROM scan_record WHERE workplace IN (?) AND article_number IN (?) ORDER BY scanned_at DESC LIMIT 10"
/// );
/// assert_eq!(builder.params().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    params: Vec<Value>,
    order_by_clause: Option<String>,
    limit_clause: Option<usize>,
}

impl SqlQueryBuilder {
    /// 创建新的 SQL 查询构建器
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_clause: None,
            limit_clause: None,
        }
    }

    /// 预先绑定 SET 子句等前置参数（UPDATE 语句使用）
    pub fn leading_params(mut self, params: Vec<Value>) -> Self {
        let mut all = params;
        all.append(&mut self.params);
        self.params = all;
        self
    }

    /// 添加带参数的 WHERE 条件
    pub fn where_clause(mut self, condition: &str, params: Vec<Value>) -> Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params);
        self
    }

    /// 追加 RecordFilter 的全部条件
    pub fn filter(mut self, filter: &RecordFilter) -> Self {
        self.push_in("workplace", &filter.workplaces);
        self.push_in("article_number", &filter.article_numbers);
        self.push_in("unit_code", &filter.unit_codes);
        self.push_in("batch_code", &filter.batch_codes);
        self.push_in("pallet_code", &filter.pallet_codes);

        if !filter.statuses.is_empty() {
            let clause = status_clause(&filter.statuses);
            self.where_clauses.push(clause);
        }
        if !filter.exclude_statuses.is_empty() {
            let clause = format!("NOT {}", status_clause(&filter.exclude_statuses));
            self.where_clauses.push(clause);
        }

        if let Some(fragment) = &filter.unit_code_contains {
            self.where_clauses.push("instr(unit_code, ?) > 0".to_string());
            self.params.push(Value::Text(fragment.clone()));
        }

        if let Some(code) = &filter.any_code {
            self.where_clauses
                .push("(unit_code = ? OR batch_code = ? OR pallet_code = ?)".to_string());
            for _ in 0..3 {
                self.params.push(Value::Text(code.clone()));
            }
        }

        if let Some(from) = filter.scanned_from {
            self.where_clauses.push("scanned_at >= ?".to_string());
            self.params
                .push(Value::Text(from.format(TS_FORMAT).to_string()));
        }
        if let Some(to) = filter.scanned_to {
            self.where_clauses.push("scanned_at < ?".to_string());
            self.params.push(Value::Text(to.format(TS_FORMAT).to_string()));
        }

        self
    }

    /// 添加 ORDER BY 子句
    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    /// 添加 LIMIT 子句
    pub fn limit(mut self, n: usize) -> Self {
        self.limit_clause = Some(n);
        self
    }

    /// 绑定参数（与 build() 中的占位符顺序一致）
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// 构建最终的 SQL 语句
    pub fn build(&self) -> String {
        let mut sql = self.select_clause.clone();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(order) = &self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit_clause {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    fn push_in(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.where_clauses
            .push(format!("{} IN ({})", column, placeholders));
        self.params
            .extend(values.iter().map(|v| Value::Text(v.clone())));
    }
}

/// 状态条件（多值 OR）
///
/// rework / defect 按前缀匹配,状态值均为内部常量,可直接内联
fn status_clause(statuses: &[ScanStatus]) -> String {
    let parts: Vec<String> = statuses
        .iter()
        .map(|status| match status {
            ScanStatus::Rework | ScanStatus::Defect => {
                format!("status LIKE '{}%'", status.as_str())
            }
            _ => format!("status = '{}'", status.as_str()),
        })
        .collect();
    format!("({})", parts.join(" OR "))
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_filter_has_no_where() {
        let sql = SqlQueryBuilder::new("SELECT * FROM scan_record")
            .filter(&RecordFilter::new())
            .build();
        assert_eq!(sql, "SELECT * FROM scan_record");
    }

    #[test]
    fn test_multi_value_or_and_cross_field_and() {
        let filter = RecordFilter::new()
            .workplace("WP1")
            .workplace("WP2")
            .status(ScanStatus::Box)
            .status(ScanStatus::Rework);
        let builder = SqlQueryBuilder::new("SELECT * FROM scan_record").filter(&filter);

        assert_eq!(
            builder.build(),
            "SELECT * FROM scan_record WHERE workplace IN (?, ?) AND (status = 'box' OR status LIKE 'rework%')"
        );
        assert_eq!(builder.params().len(), 2);
    }

    #[test]
    fn test_any_code_and_time_range() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let filter = RecordFilter::new()
            .any_code("BATCH01")
            .scanned_between(Some(from), None)
            .exclude_status(ScanStatus::Rework);
        let builder = SqlQueryBuilder::new("SELECT * FROM scan_record").filter(&filter);
        let sql = builder.build();

        assert!(sql.contains("NOT (status LIKE 'rework%')"));
        assert!(sql.contains("(unit_code = ? OR batch_code = ? OR pallet_code = ?)"));
        assert!(sql.contains("scanned_at >= ?"));
        assert_eq!(builder.params().len(), 4);
        assert_eq!(
            builder.params()[3],
            Value::Text("2026-01-01 00:00:00.000".to_string())
        );
    }

    #[test]
    fn test_leading_params_precede_filter_params() {
        let builder = SqlQueryBuilder::new("UPDATE scan_record SET status = ?")
            .filter(&RecordFilter::new().workplace("WP1"))
            .leading_params(vec![Value::Text("pallet".to_string())]);

        assert_eq!(builder.params()[0], Value::Text("pallet".to_string()));
        assert_eq!(builder.params()[1], Value::Text("WP1".to_string()));
    }
}
