//! 格線時間解析度

use chrono::{Duration, NaiveDateTime, Timelike};
use grid_core::{GridConfig, WeekWindow};
use serde::{Deserialize, Serialize};

/// 時間量化規則：時間點 → 欄索引
///
/// `column_of = 週內日索引 × COLS_PER_DAY + 小時 × COLS_PER_HOUR`，
/// 日索引以該週週一為 0。預設捨去小時以下的部分；啟用分鐘量化時，
/// 分鐘以欄寬向下取整後加入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResolution {
    cols_per_hour: u32,
    minute_precision: bool,
}

impl GridResolution {
    /// 由配置建立（配置需先通過驗證）
    pub fn from_config(config: &GridConfig) -> grid_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            cols_per_hour: config.cols_per_hour,
            minute_precision: config.minute_precision,
        })
    }

    /// 整點解析度（每小時一欄）
    pub fn hourly() -> Self {
        Self {
            cols_per_hour: 1,
            minute_precision: false,
        }
    }

    pub fn cols_per_hour(&self) -> usize {
        self.cols_per_hour as usize
    }

    pub fn cols_per_day(&self) -> usize {
        self.cols_per_hour() * 24
    }

    pub fn cols_per_week(&self) -> usize {
        self.cols_per_day() * 7
    }

    /// 單欄代表的時間長度
    pub fn column_width(&self) -> Duration {
        Duration::minutes(60 / i64::from(self.cols_per_hour))
    }

    /// 未截斷的欄索引，週外時間點會得到負值或超過週寬的值
    pub fn raw_column(&self, timestamp: NaiveDateTime, week: &WeekWindow) -> i64 {
        let cols_per_hour = i64::from(self.cols_per_hour);
        let day = (timestamp.date() - week.dates[0]).num_days();
        let hour = i64::from(timestamp.hour());

        let mut column = day * cols_per_hour * 24 + hour * cols_per_hour;
        if self.minute_precision {
            column += i64::from(timestamp.minute()) / (60 / cols_per_hour);
        }
        column
    }

    /// 時間點所在欄索引，範圍 [0, COLS_PER_WEEK]
    ///
    /// 只接受本週 [start, end] 內的時間點。
    pub fn column_of(&self, timestamp: NaiveDateTime, week: &WeekWindow) -> usize {
        let raw = self.raw_column(timestamp, week);
        debug_assert!(
            (0..=self.cols_per_week() as i64).contains(&raw),
            "時間點 {timestamp} 不在週 {} 內（欄 {raw}）",
            week.year_week
        );
        self.clamp_column(raw)
    }

    /// 截斷到 [0, COLS_PER_WEEK]
    pub fn clamp_column(&self, raw: i64) -> usize {
        if raw < 0 {
            tracing::warn!("欄索引下溢 ({raw})，截斷為 0");
            return 0;
        }
        (raw as usize).min(self.cols_per_week())
    }

    /// 欄索引代表的起始時間
    pub fn time_of_column(&self, column: usize, week: &WeekWindow) -> NaiveDateTime {
        week.start_datetime + self.column_width() * column as i32
    }

    /// 將時間點向下對齊到所在欄的起始時間
    pub fn snap_to_grid(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let width = 60 / self.cols_per_hour;
        let minute = timestamp.minute() / width * width;
        timestamp
            .with_minute(minute)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(timestamp)
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        Self::hourly()
    }
}
