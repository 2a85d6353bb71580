// ==========================================
// UCM需求登记系统 - 登记截止配置
// ==========================================
// 职责: 每周两个变更窗口（周三 / 周六）的截止提前小时数
// 规则: 截止时刻 = 目标日 00:00 - 提前小时数；负数表示目标日 00:00 之后截止
// 红线: 取值范围 [-168, 168]，在配置写入时校验，不在判定时校验
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 截止提前小时数下限（向后一周）
pub const DEADLINE_OFFSET_MIN_HOURS: i32 = -168;
/// 截止提前小时数上限（向前一周）
pub const DEADLINE_OFFSET_MAX_HOURS: i32 = 168;

pub const DEFAULT_WEDNESDAY_DEADLINE_HOURS: i32 = 7;
pub const DEFAULT_SATURDAY_DEADLINE_HOURS: i32 = 31;

/// 变更窗口所在的星期
pub const TARGET_WEEKDAYS: [Weekday; 2] = [Weekday::Wed, Weekday::Sat];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeadlineConfigError {
    #[error("截止提前小时数超出范围 ({field}={value})，允许范围 [{min}, {max}]")]
    OffsetOutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    pub wednesday_deadline_hours: i32,
    pub saturday_deadline_hours: i32,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            wednesday_deadline_hours: DEFAULT_WEDNESDAY_DEADLINE_HOURS,
            saturday_deadline_hours: DEFAULT_SATURDAY_DEADLINE_HOURS,
        }
    }
}

impl DeadlineConfig {
    /// 构造并校验取值范围
    pub fn new(
        wednesday_deadline_hours: i32,
        saturday_deadline_hours: i32,
    ) -> Result<Self, DeadlineConfigError> {
        let config = Self {
            wednesday_deadline_hours,
            saturday_deadline_hours,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeadlineConfigError> {
        check_range("wednesday_deadline_hours", self.wednesday_deadline_hours)?;
        check_range("saturday_deadline_hours", self.saturday_deadline_hours)?;
        Ok(())
    }

    /// 目标星期对应的提前小时数；非变更窗口返回 None
    pub fn offset_hours(&self, weekday: Weekday) -> Option<i32> {
        match weekday {
            Weekday::Wed => Some(self.wednesday_deadline_hours),
            Weekday::Sat => Some(self.saturday_deadline_hours),
            _ => None,
        }
    }
}

fn check_range(field: &'static str, value: i32) -> Result<(), DeadlineConfigError> {
    if !(DEADLINE_OFFSET_MIN_HOURS..=DEADLINE_OFFSET_MAX_HOURS).contains(&value) {
        return Err(DeadlineConfigError::OffsetOutOfRange {
            field,
            value,
            min: DEADLINE_OFFSET_MIN_HOURS,
            max: DEADLINE_OFFSET_MAX_HOURS,
        });
    }
    Ok(())
}
