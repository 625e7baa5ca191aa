//! 工廠營運時段（排班表）模型

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// 單日班別時段 [open, close)
///
/// `close <= open` 表示跨夜班，延續到隔日 `close`；`open == close` 即全天。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl ShiftHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// 以整點小時建立（24 視為隔日 00:00）
    pub fn from_hours(open_hour: u32, close_hour: u32) -> Result<Self> {
        let to_time = |hour: u32| {
            NaiveTime::from_hms_opt(hour % 24, 0, 0)
                .filter(|_| hour <= 24)
                .ok_or_else(|| GridError::Config(format!("無效的小時: {hour}")))
        };
        Ok(Self::new(to_time(open_hour)?, to_time(close_hour)?))
    }

    /// 全天（00:00 - 24:00）
    pub fn all_day() -> Self {
        Self::new(NaiveTime::MIN, NaiveTime::MIN)
    }

    pub fn is_overnight(&self) -> bool {
        self.close <= self.open
    }

    /// 當日時刻是否在班別內（不含跨夜延續到隔日的部分）
    fn covers_same_day(&self, time: NaiveTime) -> bool {
        if self.is_overnight() {
            time >= self.open
        } else {
            self.open <= time && time < self.close
        }
    }

    /// 前一日跨夜班延續到今日的部分
    fn covers_spillover(&self, time: NaiveTime) -> bool {
        self.is_overnight() && time < self.close
    }
}

/// 營運時段
///
/// 每週固定班表加上特定日期覆寫（節假日即覆寫為 `None`）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingHours {
    /// 日曆ID
    pub calendar_id: String,

    /// 索引 0 = 週一, ..., 6 = 週日；None 表示當日不排產
    pub weekly: [Option<ShiftHours>; 7],

    /// 特定日期覆寫
    pub overrides: BTreeMap<NaiveDate, Option<ShiftHours>>,
}

impl OperatingHours {
    /// 預設班表：週一到週五 06:00 - 23:00
    pub fn new(calendar_id: String) -> Self {
        let weekday_shift = Some(ShiftHours::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
        ));
        Self {
            calendar_id,
            weekly: [
                weekday_shift,
                weekday_shift,
                weekday_shift,
                weekday_shift,
                weekday_shift,
                None,
                None,
            ],
            overrides: BTreeMap::new(),
        }
    }

    /// 24/7 全天候班表
    pub fn new_24_7(calendar_id: String) -> Self {
        Self {
            calendar_id,
            weekly: [Some(ShiftHours::all_day()); 7],
            overrides: BTreeMap::new(),
        }
    }

    /// 無法取得排班資料時使用的降級班表
    pub fn fallback_calendar() -> Self {
        Self::new_24_7("FALLBACK-24/7".to_string())
    }

    /// 建構器模式：設置某個星期幾的班別
    pub fn with_weekday(mut self, weekday: Weekday, shift: Option<ShiftHours>) -> Self {
        self.weekly[weekday.num_days_from_monday() as usize] = shift;
        self
    }

    /// 建構器模式：覆寫特定日期
    pub fn with_override(mut self, date: NaiveDate, shift: Option<ShiftHours>) -> Self {
        self.overrides.insert(date, shift);
        self
    }

    /// 添加節假日（當日不排產）
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.overrides.insert(date, None);
    }

    /// 指定日期的班別（覆寫優先）
    pub fn shift_on(&self, date: NaiveDate) -> Option<ShiftHours> {
        match self.overrides.get(&date) {
            Some(shift) => *shift,
            None => self.weekly[date.weekday().num_days_from_monday() as usize],
        }
    }

    /// 指定日期是否有排產
    pub fn is_scheduled_day(&self, date: NaiveDate) -> bool {
        self.shift_on(date).is_some()
    }

    /// 時間點是否在營運時段內
    pub fn is_open_at(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        let time = timestamp.time();

        if self
            .shift_on(date)
            .is_some_and(|shift| shift.covers_same_day(time))
        {
            return true;
        }

        date.checked_sub_signed(Duration::days(1))
            .and_then(|prev| self.shift_on(prev))
            .is_some_and(|shift| shift.covers_spillover(time))
    }

    /// 從排班表建立營運時段
    pub fn from_shift_table(calendar_id: String, table: &ShiftTable) -> Result<Self> {
        let mut weekly = [None; 7];
        for (index, (start, end)) in table.pairs().into_iter().enumerate() {
            weekly[index] = match (start, end) {
                (Some(start), Some(end)) => {
                    Some(ShiftHours::new(parse_clock(start)?, parse_clock(end)?))
                }
                (None, None) => None,
                _ => {
                    return Err(GridError::Config(format!(
                        "{} 的開始/結束時間必須同時設定",
                        WEEKDAY_KEYS[index]
                    )))
                }
            };
        }

        Ok(Self {
            calendar_id,
            weekly,
            overrides: BTreeMap::new(),
        })
    }

    /// 從排班表 JSON 建立營運時段
    pub fn from_json(calendar_id: String, json: &str) -> Result<Self> {
        let table: ShiftTable = serde_json::from_str(json)?;
        Self::from_shift_table(calendar_id, &table)
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}

const WEEKDAY_KEYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| GridError::Config(format!("無效的時間格式: {value}")))
}

/// 排班表資料結構（用於從設定檔載入）
///
/// ```json
/// { "mon_start_time": "06:00", "mon_end_time": "23:00", "sat_start_time": null }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftTable {
    pub mon_start_time: Option<String>,
    pub mon_end_time: Option<String>,
    pub tue_start_time: Option<String>,
    pub tue_end_time: Option<String>,
    pub wed_start_time: Option<String>,
    pub wed_end_time: Option<String>,
    pub thu_start_time: Option<String>,
    pub thu_end_time: Option<String>,
    pub fri_start_time: Option<String>,
    pub fri_end_time: Option<String>,
    pub sat_start_time: Option<String>,
    pub sat_end_time: Option<String>,
    pub sun_start_time: Option<String>,
    pub sun_end_time: Option<String>,
}

impl ShiftTable {
    fn pairs(&self) -> [(Option<&str>, Option<&str>); 7] {
        [
            (self.mon_start_time.as_deref(), self.mon_end_time.as_deref()),
            (self.tue_start_time.as_deref(), self.tue_end_time.as_deref()),
            (self.wed_start_time.as_deref(), self.wed_end_time.as_deref()),
            (self.thu_start_time.as_deref(), self.thu_end_time.as_deref()),
            (self.fri_start_time.as_deref(), self.fri_end_time.as_deref()),
            (self.sat_start_time.as_deref(), self.sat_end_time.as_deref()),
            (self.sun_start_time.as_deref(), self.sun_end_time.as_deref()),
        ]
    }
}
