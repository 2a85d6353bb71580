// ==========================================
// UCM需求登记系统 - 变更日期闸门
// ==========================================
// 职责: 判定UCM变更日期是否可登记，列出可登记日期
// 规则:
// - 日期必须是变更窗口（周三 / 周六）
// - 日期不早于今天
// - now < 目标日 00:00 - 提前小时数（严格小于）
// 说明: 时间均为本地墙钟时间（NaiveDateTime）
// ==========================================

use crate::domain::deadline::DeadlineConfig;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// 可登记日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleDate {
    pub date: NaiveDate,
    pub deadline: NaiveDateTime,
    /// 展示文本，如 "2024-01-02 周二 17:00 截止"
    pub label: String,
}

pub struct DateGate;

impl DateGate {
    /// 目标日期的登记截止时刻；非变更窗口返回 None
    pub fn deadline_for(date: NaiveDate, config: &DeadlineConfig) -> Option<NaiveDateTime> {
        let offset = config.offset_hours(date.weekday())?;
        let midnight = date.and_time(NaiveTime::MIN);
        Some(midnight - Duration::hours(i64::from(offset)))
    }

    /// 日期是否可登记
    pub fn is_date_eligible(date: NaiveDate, config: &DeadlineConfig, now: NaiveDateTime) -> bool {
        if date < now.date() {
            return false;
        }
        match Self::deadline_for(date, config) {
            Some(deadline) => now < deadline,
            None => false,
        }
    }

    /// 从今天起 horizon_days 天内的可登记日期
    ///
    /// 没有可登记日期时返回空列表，由调用方决定如何提示
    pub fn eligible_dates(
        now: NaiveDateTime,
        config: &DeadlineConfig,
        horizon_days: u32,
    ) -> Vec<EligibleDate> {
        let today = now.date();
        (0..=i64::from(horizon_days))
            .map(|offset| today + Duration::days(offset))
            .filter(|date| Self::is_date_eligible(*date, config, now))
            .filter_map(|date| {
                Self::deadline_for(date, config).map(|deadline| EligibleDate {
                    date,
                    deadline,
                    label: Self::deadline_label(deadline),
                })
            })
            .collect()
    }

    /// 截止时刻展示文本
    pub fn deadline_label(deadline: NaiveDateTime) -> String {
        let date = deadline.format("%Y-%m-%d").to_string();
        let time = deadline.format("%H:%M").to_string();
        let weekday = crate::i18n::t(weekday_key(deadline.weekday()));
        crate::i18n::t_with_args(
            "date_gate.deadline_label",
            &[("date", &date), ("weekday", &weekday), ("time", &time)],
        )
    }
}

fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "weekday.mon",
        Weekday::Tue => "weekday.tue",
        Weekday::Wed => "weekday.wed",
        Weekday::Thu => "weekday.thu",
        Weekday::Fri => "weekday.fri",
        Weekday::Sat => "weekday.sat",
        Weekday::Sun => "weekday.sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wednesday_offset_seven_hours() {
        let config = DeadlineConfig::new(7, 31).unwrap();
        let target = date(2024, 1, 3);
        assert_eq!(
            DateGate::deadline_for(target, &config),
            Some(at(2024, 1, 2, 17, 0))
        );
        assert!(DateGate::is_date_eligible(target, &config, at(2024, 1, 2, 16, 0)));
        assert!(!DateGate::is_date_eligible(target, &config, at(2024, 1, 2, 18, 0)));
        // 截止时刻本身不可登记
        assert!(!DateGate::is_date_eligible(target, &config, at(2024, 1, 2, 17, 0)));
    }

    #[test]
    fn test_saturday_offset() {
        let config = DeadlineConfig::default();
        // 2024-01-06 周六，提前 31 小时 → 周四 17:00
        assert_eq!(
            DateGate::deadline_for(date(2024, 1, 6), &config),
            Some(at(2024, 1, 4, 17, 0))
        );
    }

    #[test]
    fn test_negative_offset_moves_cutoff_after_midnight() {
        let config = DeadlineConfig::new(-7, 31).unwrap();
        let target = date(2024, 1, 3);
        assert_eq!(
            DateGate::deadline_for(target, &config),
            Some(at(2024, 1, 3, 7, 0))
        );
        assert!(DateGate::is_date_eligible(target, &config, at(2024, 1, 3, 6, 59)));
        assert!(!DateGate::is_date_eligible(target, &config, at(2024, 1, 3, 7, 0)));
    }

    #[test]
    fn test_non_target_weekday_never_eligible() {
        let config = DeadlineConfig::default();
        // 2024-01-04 周四
        assert!(DateGate::deadline_for(date(2024, 1, 4), &config).is_none());
        assert!(!DateGate::is_date_eligible(date(2024, 1, 4), &config, at(2024, 1, 1, 0, 0)));
    }

    #[test]
    fn test_past_date_never_eligible() {
        let config = DeadlineConfig::new(-168, -168).unwrap();
        // 截止在一周后，但日期已过去
        assert!(!DateGate::is_date_eligible(date(2024, 1, 3), &config, at(2024, 1, 4, 0, 0)));
    }

    #[test]
    fn test_eligible_dates_within_horizon() {
        let config = DeadlineConfig::new(7, 31).unwrap();
        // 周二 18:00: 本周三已截止；本周六（截止周四 17:00）可登记
        let now = at(2024, 1, 2, 18, 0);
        let dates: Vec<NaiveDate> = DateGate::eligible_dates(now, &config, 7)
            .into_iter()
            .map(|d| d.date)
            .collect();
        assert_eq!(dates, vec![date(2024, 1, 6)]);
    }

    #[test]
    fn test_eligible_dates_may_be_empty() {
        let config = DeadlineConfig::new(168, 168).unwrap();
        let now = at(2024, 1, 2, 12, 0);
        assert!(DateGate::eligible_dates(now, &config, 3).is_empty());
    }
}
