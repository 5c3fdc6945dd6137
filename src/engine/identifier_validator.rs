// ==========================================
// 生产追溯系统 - 单件码校验
// ==========================================
// 职责: 校验单件码是否符合物料的码模板与日期编码规则
// 红线: 无状态、无副作用、无 I/O 操作
// 红线: 格式错误是正常结果,不 panic
// ==========================================

use crate::domain::article::{ArticleConfig, DateRange};
use crate::domain::types::{DateScheme, ValidationOutcome};
use crate::engine::date_cipher::DateCiphers;
use chrono::{NaiveDate, NaiveDateTime};

// ==========================================
// IdentifierValidator - 纯函数工具类
// ==========================================
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// 校验单件码
    ///
    /// # 规则
    /// 1. code 必须包含 expected_code_template（区分大小写）→ 否则 InvalidFormat
    /// 2. 每个日期区间截取 code[start..end],按 date_scheme 解码并校验窗口
    ///    → 截取失败、无法解码或超出窗口均为 WrongDate
    /// 3. 全部通过 → Valid
    ///
    /// # 参数
    /// - code: 扫描到的单件码
    /// - config: 物料配置
    /// - now: 当前时间（窗口基准）
    /// - ciphers: 客户日期编码配置
    pub fn validate_unit_code(
        code: &str,
        config: &ArticleConfig,
        now: NaiveDateTime,
        ciphers: &DateCiphers,
    ) -> ValidationOutcome {
        if !code.contains(config.expected_code_template.as_str()) {
            return ValidationOutcome::InvalidFormat;
        }

        if config.date_scheme == DateScheme::None {
            return ValidationOutcome::Valid;
        }

        let all_dates_ok = config.date_validation_ranges.iter().all(|range| {
            Self::decode_range(code, range, config.date_scheme, now, ciphers).is_some()
        });

        if all_dates_ok {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::WrongDate
        }
    }

    /// 截取并解码单个日期片段
    ///
    /// 区间越界或落在多字节字符中间时返回 None
    pub fn decode_range(
        code: &str,
        range: &DateRange,
        scheme: DateScheme,
        now: NaiveDateTime,
        ciphers: &DateCiphers,
    ) -> Option<NaiveDate> {
        let token = code.get(range.start..range.end)?;
        match scheme {
            DateScheme::Ford => ciphers.ford.decode(token, now),
            DateScheme::Bmw => ciphers.bmw.decode(token, now),
            DateScheme::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ContainerType;
    use chrono::{Datelike, Duration};
    use proptest::prelude::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn config(scheme: DateScheme, ranges: Vec<DateRange>) -> ArticleConfig {
        ArticleConfig {
            workplace: "WP1".to_string(),
            article_number: "ABC".to_string(),
            display_name: "ABC".to_string(),
            container_type: ContainerType::UnitBox,
            box_capacity: 2,
            pallet_capacity: None,
            expected_code_template: "ABC".to_string(),
            date_validation_ranges: ranges,
            date_scheme: scheme,
            hydra_process_codes: Default::default(),
        }
    }

    fn ford_token(date: NaiveDate) -> String {
        format!("{}{:03}", date.year().rem_euclid(10), date.ordinal())
    }

    #[test]
    fn test_template_required() {
        let cfg = config(DateScheme::None, vec![]);
        let ciphers = DateCiphers::default();
        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC001", &cfg, now(), &ciphers),
            ValidationOutcome::Valid
        );
        assert_eq!(
            IdentifierValidator::validate_unit_code("XYZ001", &cfg, now(), &ciphers),
            ValidationOutcome::InvalidFormat
        );
        // 区分大小写
        assert_eq!(
            IdentifierValidator::validate_unit_code("abc001", &cfg, now(), &ciphers),
            ValidationOutcome::InvalidFormat
        );
        assert_eq!(
            IdentifierValidator::validate_unit_code("", &cfg, now(), &ciphers),
            ValidationOutcome::InvalidFormat
        );
    }

    #[test]
    fn test_ford_date_range() {
        let cfg = config(DateScheme::Ford, vec![DateRange::new(3, 7)]);
        let ciphers = DateCiphers::default();

        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC6074X1", &cfg, now(), &ciphers),
            ValidationOutcome::Valid
        );
        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC6030X1", &cfg, now(), &ciphers),
            ValidationOutcome::WrongDate
        );
        // 日期片段超出码长度
        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC60", &cfg, now(), &ciphers),
            ValidationOutcome::WrongDate
        );
    }

    #[test]
    fn test_bmw_two_ranges_all_must_pass() {
        let cfg = config(
            DateScheme::Bmw,
            vec![DateRange::new(3, 9), DateRange::new(9, 15)],
        );
        let ciphers = DateCiphers::default();

        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC260314260315", &cfg, now(), &ciphers),
            ValidationOutcome::Valid
        );
        assert_eq!(
            IdentifierValidator::validate_unit_code("ABC260314250315", &cfg, now(), &ciphers),
            ValidationOutcome::WrongDate
        );
    }

    #[test]
    fn test_multibyte_slice_is_wrong_date() {
        let cfg = config(DateScheme::Bmw, vec![DateRange::new(4, 10)]);
        let ciphers = DateCiphers::default();
        // "ABCé" 中 é 占两个字节,区间从字符中间开始
        assert_eq!(
            IdentifierValidator::validate_unit_code("ABCé260315", &cfg, now(), &ciphers),
            ValidationOutcome::WrongDate
        );
    }

    proptest! {
        #[test]
        fn prop_missing_template_is_invalid_format(code in "[a-z0-9|]{0,24}") {
            let cfg = config(DateScheme::Ford, vec![DateRange::new(0, 4)]);
            prop_assert_eq!(
                IdentifierValidator::validate_unit_code(&code, &cfg, now(), &DateCiphers::default()),
                ValidationOutcome::InvalidFormat
            );
        }

        #[test]
        fn prop_ford_dates_inside_window_are_valid(
            offset in -14i64..=1,
            serial in "[0-9]{1,6}",
        ) {
            let date = now().date() + Duration::days(offset);
            let code = format!("ABC{}{}", ford_token(date), serial);
            let cfg = config(DateScheme::Ford, vec![DateRange::new(3, 7)]);
            prop_assert_eq!(
                IdentifierValidator::validate_unit_code(&code, &cfg, now(), &DateCiphers::default()),
                ValidationOutcome::Valid
            );
        }

        #[test]
        fn prop_ford_dates_outside_window_are_wrong_date(offset in 2i64..300) {
            let date = now().date() + Duration::days(offset);
            let code = format!("ABC{}", ford_token(date));
            let cfg = config(DateScheme::Ford, vec![DateRange::new(3, 7)]);
            prop_assert_eq!(
                IdentifierValidator::validate_unit_code(&code, &cfg, now(), &DateCiphers::default()),
                ValidationOutcome::WrongDate
            );
        }
    }
}
