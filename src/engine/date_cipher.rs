// ==========================================
// 生产追溯系统 - 客户日期编码解码
// ==========================================
// 职责: 把单件码中的日期片段解码为日历日期,并判定是否落在允许窗口内
// 红线: 纯函数,编码细节(布局/格式/窗口)全部来自配置,不写死
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DateWindow - 允许窗口（相对当前时间）
// ==========================================
/// 窗口单侧天数上限
///
/// Ford 码年份只有末位,两个候选年份相差十年;
/// 单侧不超过一年时两个候选最多一个落在窗口内
pub const MAX_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub days_back: i64,
    pub days_ahead: i64,
}

impl DateWindow {
    pub fn new(days_back: i64, days_ahead: i64) -> Self {
        Self {
            days_back,
            days_ahead,
        }
    }

    /// 两侧天数限制在 0..=MAX_WINDOW_DAYS（配置加载使用）
    pub fn clamped(days_back: i64, days_ahead: i64) -> Self {
        Self::new(
            days_back.clamp(0, MAX_WINDOW_DAYS),
            days_ahead.clamp(0, MAX_WINDOW_DAYS),
        )
    }

    pub fn is_clamped(&self) -> bool {
        (0..=MAX_WINDOW_DAYS).contains(&self.days_back)
            && (0..=MAX_WINDOW_DAYS).contains(&self.days_ahead)
    }

    /// now.date() - days_back <= date <= now.date() + days_ahead
    ///
    /// 边界超出日历可表示范围时视为不在窗口内
    pub fn contains(&self, date: NaiveDate, now: NaiveDateTime) -> bool {
        let today = now.date();
        let earliest = Duration::try_days(self.days_back)
            .and_then(|back| today.checked_sub_signed(back));
        let latest = Duration::try_days(self.days_ahead)
            .and_then(|ahead| today.checked_add_signed(ahead));
        match (earliest, latest) {
            (Some(earliest), Some(latest)) => date >= earliest && date <= latest,
            _ => false,
        }
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self::new(14, 1)
    }
}

// ==========================================
// Ford: 年末位 + 年内天数（4 位）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FordLayout {
    /// Y DDD,例如 6074 = 某个末位为 6 的年份的第 74 天
    Yddd,
    /// DDD Y
    Dddy,
}

impl FordLayout {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "YDDD" => Some(FordLayout::Yddd),
            "DDDY" => Some(FordLayout::Dddy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FordCipher {
    pub layout: FordLayout,
    pub window: DateWindow,
}

impl Default for FordCipher {
    fn default() -> Self {
        Self {
            layout: FordLayout::Yddd,
            window: DateWindow::default(),
        }
    }
}

impl FordCipher {
    /// 解码并校验窗口
    ///
    /// 年份只有末位,候选年份取不晚于当前年份的最近一年,
    /// 以及其后一个十年(跨十年边界时 days_ahead 仍可命中)
    ///
    /// 第二个候选依赖 days_ahead 很小: 窗口超过十年时两个候选可能同时命中,
    /// 配置加载经 DateWindow::clamped 限制在 MAX_WINDOW_DAYS 以内
    pub fn decode(&self, token: &str, now: NaiveDateTime) -> Option<NaiveDate> {
        if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let (year_digit, day_str) = match self.layout {
            FordLayout::Yddd => (&token[0..1], &token[1..4]),
            FordLayout::Dddy => (&token[3..4], &token[0..3]),
        };
        let year_digit: i32 = year_digit.parse().ok()?;
        let day_of_year: u32 = day_str.parse().ok()?;

        let current_year = now.year();
        let back = (current_year.rem_euclid(10) - year_digit).rem_euclid(10);
        let base_year = current_year - back;

        [base_year, base_year + 10]
            .into_iter()
            .filter_map(|year| NaiveDate::from_yo_opt(year, day_of_year))
            .find(|date| self.window.contains(*date, now))
    }
}

// ==========================================
// BMW: 定宽数字日期（默认 YYMMDD）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmwCipher {
    /// chrono 格式串
    pub format: String,
    /// 片段固定宽度
    pub width: usize,
    pub window: DateWindow,
}

impl Default for BmwCipher {
    fn default() -> Self {
        Self {
            format: "%y%m%d".to_string(),
            width: 6,
            window: DateWindow::default(),
        }
    }
}

impl BmwCipher {
    /// 解码并校验窗口
    pub fn decode(&self, token: &str, now: NaiveDateTime) -> Option<NaiveDate> {
        if token.len() != self.width || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(token, &self.format)
            .ok()
            .filter(|date| self.window.contains(*date, now))
    }
}

/// 全部客户日期编码配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCiphers {
    pub ford: FordCipher,
    pub bmw: BmwCipher,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_ford_yddd_today() {
        let cipher = FordCipher::default();
        // 2026-03-15 是第 74 天
        assert_eq!(
            cipher.decode("6074", now()),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
    }

    #[test]
    fn test_ford_dddy_layout() {
        let cipher = FordCipher {
            layout: FordLayout::Dddy,
            window: DateWindow::default(),
        };
        assert_eq!(
            cipher.decode("0706", now()),
            NaiveDate::from_ymd_opt(2026, 3, 11)
        );
    }

    #[test]
    fn test_ford_rejects_outside_window_and_garbage() {
        let cipher = FordCipher::default();
        // 第 30 天,超过 14 天回溯窗口
        assert_eq!(cipher.decode("6030", now()), None);
        // 年份末位 5 → 2025 年,远超窗口
        assert_eq!(cipher.decode("5074", now()), None);
        // 第 400 天不存在
        assert_eq!(cipher.decode("6400", now()), None);
        assert_eq!(cipher.decode("6A74", now()), None);
        assert_eq!(cipher.decode("607", now()), None);
    }

    #[test]
    fn test_ford_decade_boundary_ahead() {
        let cipher = FordCipher::default();
        let new_years_eve = NaiveDate::from_ymd_opt(2029, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        // 2030-01-01 在 days_ahead=1 窗口内
        assert_eq!(
            cipher.decode("0001", new_years_eve),
            NaiveDate::from_ymd_opt(2030, 1, 1)
        );
    }

    #[test]
    fn test_oversized_window_does_not_overflow() {
        let huge = DateWindow::new(100_000_000, 1);
        assert!(!huge.contains(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(), now()));
        assert!(!DateWindow::new(1, i64::MAX).contains(now().date(), now()));

        let cipher = FordCipher {
            layout: FordLayout::Yddd,
            window: huge,
        };
        assert_eq!(cipher.decode("6074", now()), None);
    }

    #[test]
    fn test_clamped_window() {
        let window = DateWindow::clamped(100_000_000, -5);
        assert_eq!(window, DateWindow::new(MAX_WINDOW_DAYS, 0));
        assert!(window.is_clamped());
        assert!(!DateWindow::new(400, 1).is_clamped());
        assert!(window.contains(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(), now()));
    }

    #[test]
    fn test_bmw_default_format() {
        let cipher = BmwCipher::default();
        assert_eq!(
            cipher.decode("260310", now()),
            NaiveDate::from_ymd_opt(2026, 3, 10)
        );
        assert_eq!(cipher.decode("260230", now()), None);
        assert_eq!(cipher.decode("250310", now()), None);
        assert_eq!(cipher.decode("26031", now()), None);
        assert_eq!(cipher.decode("2603-1", now()), None);
    }

    #[test]
    fn test_bmw_custom_format() {
        let cipher = BmwCipher {
            format: "%d%m%Y".to_string(),
            width: 8,
            window: DateWindow::new(0, 0),
        };
        assert_eq!(
            cipher.decode("15032026", now()),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
        assert_eq!(cipher.decode("14032026", now()), None);
    }
}
