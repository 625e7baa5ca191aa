//! 目前時段追蹤

use chrono::NaiveDateTime;
use grid_core::{ScheduleTense, WeekWindow};
use serde::{Deserialize, Serialize};

use crate::resolution::GridResolution;

/// 欄相對於現在的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnState {
    Elapsed,
    Current,
    Upcoming,
}

/// 週的時態與目前所在欄
///
/// 時鐘讀數由呼叫端傳入，不讀取系統時間。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPeriod {
    pub tense: ScheduleTense,

    /// 僅在 `tense == Current` 時有值
    pub current_column: Option<usize>,
}

impl CurrentPeriod {
    pub fn at(week: &WeekWindow, now: NaiveDateTime, resolution: &GridResolution) -> Self {
        let tense = week.tense_at(now);
        let current_column = match tense {
            ScheduleTense::Current => Some(resolution.column_of(now, week)),
            ScheduleTense::Past | ScheduleTense::Future => None,
        };
        Self {
            tense,
            current_column,
        }
    }

    /// 欄狀態：過去週全部已過，未來週全部未到
    pub fn state_of(&self, column: usize) -> ColumnState {
        match (self.tense, self.current_column) {
            (ScheduleTense::Past, _) => ColumnState::Elapsed,
            (ScheduleTense::Future, _) | (ScheduleTense::Current, None) => ColumnState::Upcoming,
            (ScheduleTense::Current, Some(current)) if column < current => ColumnState::Elapsed,
            (ScheduleTense::Current, Some(current)) if column == current => ColumnState::Current,
            (ScheduleTense::Current, Some(_)) => ColumnState::Upcoming,
        }
    }
}
