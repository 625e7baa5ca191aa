//! 週識別碼與週時間窗

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// ISO 週識別碼（ISO 年 + ISO 週次）
///
/// 文字格式為 `YYYY-WW`（等同 `%G-%V`），解析時也接受 `YYYY-Www`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    year: i32,
    week: u32,
}

impl WeekId {
    /// 創建週識別碼，週次必須存在於該 ISO 年
    pub fn new(year: i32, week: u32) -> Result<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or_else(|| GridError::InvalidWeekIdentifier(format!("{year}-{week:02}")))
    }

    /// 包含指定日期的週
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// 該週週一
    pub fn monday(&self) -> NaiveDate {
        // new() 已驗證過，這裡必定可解析
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// 上一週（跨年時自動進位到前一 ISO 年的最後一週）
    pub fn prior(&self) -> Result<Self> {
        self.shift_weeks(-1)
    }

    /// 下一週
    pub fn next(&self) -> Result<Self> {
        self.shift_weeks(1)
    }

    /// 平移 n 週
    pub fn shift_weeks(&self, weeks: i64) -> Result<Self> {
        self.monday()
            .checked_add_signed(Duration::weeks(weeks))
            .map(Self::containing)
            .ok_or_else(|| GridError::InvalidWeekIdentifier(format!("{self} {weeks:+} 週超出日期範圍")))
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GridError::InvalidWeekIdentifier(s.to_string());

        let (year, week) = s.trim().split_once('-').ok_or_else(invalid)?;
        let week = week.strip_prefix(['W', 'w']).unwrap_or(week);
        if week.is_empty() || week.len() > 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week)
    }
}

impl TryFrom<String> for WeekId {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WeekId> for String {
    fn from(id: WeekId) -> Self {
        id.to_string()
    }
}

/// 週排程相對於現在的時態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleTense {
    Past,
    Current,
    Future,
}

/// 一週的時間窗：週一 00:00（含）到下週一 00:00（不含）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub year_week: WeekId,

    /// 週一到週日
    pub dates: [NaiveDate; 7],

    pub start_datetime: NaiveDateTime,

    pub end_datetime: NaiveDateTime,

    pub prior_week: WeekId,

    pub next_week: WeekId,
}

impl WeekWindow {
    /// 由週識別碼建立時間窗
    pub fn new(year_week: WeekId) -> Result<Self> {
        let monday = year_week.monday();
        let mut dates = [monday; 7];
        for (offset, date) in dates.iter_mut().enumerate() {
            *date = monday
                .checked_add_signed(Duration::days(offset as i64))
                .ok_or_else(|| GridError::InvalidWeekIdentifier(year_week.to_string()))?;
        }

        let start_datetime = monday.and_time(NaiveTime::MIN);
        let end_datetime = start_datetime
            .checked_add_signed(Duration::weeks(1))
            .ok_or_else(|| GridError::InvalidWeekIdentifier(year_week.to_string()))?;

        Ok(Self {
            year_week,
            dates,
            start_datetime,
            end_datetime,
            prior_week: year_week.prior()?,
            next_week: year_week.next()?,
        })
    }

    /// 解析文字識別碼後建立時間窗
    pub fn parse(year_week: &str) -> Result<Self> {
        Self::new(year_week.parse()?)
    }

    /// 包含指定時間點的週
    pub fn containing(timestamp: NaiveDateTime) -> Result<Self> {
        Self::new(WeekId::containing(timestamp.date()))
    }

    /// 時間點是否落在本週 [start, end)
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start_datetime <= timestamp && timestamp < self.end_datetime
    }

    /// 區間 [start, end) 是否與本週重疊
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end_datetime && end > self.start_datetime
    }

    /// 相對於 `now` 的時態
    pub fn tense_at(&self, now: NaiveDateTime) -> ScheduleTense {
        if now < self.start_datetime {
            ScheduleTense::Future
        } else if now >= self.end_datetime {
            ScheduleTense::Past
        } else {
            ScheduleTense::Current
        }
    }

    /// 日期在本週的索引（週一 = 0），不在本週則為 None
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    /// 顯示用標籤，例如 `Jan 01, 2024 - Jan 07, 2024`
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.dates[0].format("%b %d, %Y"),
            self.dates[6].format("%b %d, %Y")
        )
    }
}

impl fmt::Display for WeekWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
