//! 排產時段遮罩

use chrono::NaiveDate;
use grid_core::{OperatingHours, WeekWindow};
use serde::{Deserialize, Serialize};

use crate::resolution::GridResolution;

/// 每欄是否落在營運時段內，長度恆為 COLS_PER_WEEK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleMask(Vec<bool>);

impl ScheduleMask {
    /// 以每欄起始時間判斷是否在營運時段內
    pub fn build(week: &WeekWindow, hours: &OperatingHours, resolution: &GridResolution) -> Self {
        let mask = (0..resolution.cols_per_week())
            .map(|column| hours.is_open_at(resolution.time_of_column(column, week)))
            .collect();
        Self(mask)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 欄是否在排產時段內，超出範圍視為否
    pub fn is_scheduled(&self, column: usize) -> bool {
        self.0.get(column).copied().unwrap_or(false)
    }

    /// 排產欄數
    pub fn scheduled_count(&self) -> usize {
        self.0.iter().filter(|s| **s).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// 本週有排班的日期
    pub fn scheduled_days(week: &WeekWindow, hours: &OperatingHours) -> Vec<NaiveDate> {
        week.dates
            .iter()
            .copied()
            .filter(|date| hours.is_scheduled_day(*date))
            .collect()
    }
}
