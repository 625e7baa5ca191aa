//! 工單格線定位
//!
//! 依工單區間與週界線的關係分成四種互斥情況（依序判斷）：
//! 1. 橫跨整週：start < 週起 且 end > 週終 → [0, COLS_PER_WEEK)
//! 2. 週前開始：start < 週起 → [0, column_of(end) + 一小時欄數 + 1)
//! 3. 週後結束：end > 週終 → [column_of(start), COLS_PER_WEEK)
//! 4. 週內完成：[column_of(start), column_of(end) + 一小時欄數 + 1)
//!
//! 結束欄多加一小時的欄數以涵蓋最後一個時段，再留一欄間隔區分相鄰工單。
//! 所有結束欄皆截斷至 COLS_PER_WEEK。

use chrono::NaiveDateTime;
use grid_core::{GridError, MachineFamily, WeekWindow, WorkOrder};
use serde::{Deserialize, Serialize};

use crate::resolution::GridResolution;

/// 定位情況
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementCase {
    Spanning,
    StartsBeforeWeek,
    EndsAfterWeek,
    Contained,
}

impl PlacementCase {
    /// 判斷區間相對於週的情況，區間需與週重疊
    pub fn classify(start: NaiveDateTime, end: NaiveDateTime, week: &WeekWindow) -> Self {
        let starts_before = start < week.start_datetime;
        let ends_after = end > week.end_datetime;
        match (starts_before, ends_after) {
            (true, true) => PlacementCase::Spanning,
            (true, false) => PlacementCase::StartsBeforeWeek,
            (false, true) => PlacementCase::EndsAfterWeek,
            (false, false) => PlacementCase::Contained,
        }
    }
}

/// 欄區間 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// 工單在格線上的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// 穩定鍵，跨次繪製追蹤同一元素
    pub lot_number: u64,
    pub lot_id: String,
    pub product: String,
    pub machine: String,
    pub row: usize,
    pub span: ColumnSpan,
    pub case: PlacementCase,
}

/// 單張工單的定位結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(Placement),
    /// 未指派機台，歸入停車場
    Unassigned,
    /// 區間不在本週
    OutsideWeek,
}

/// 工單定位器：只依工單目前的機台/區間與週界線計算，無狀態
#[derive(Debug, Clone, Copy)]
pub struct PlacementResolver<'a> {
    week: &'a WeekWindow,
    family: &'a MachineFamily,
    resolution: GridResolution,
}

impl<'a> PlacementResolver<'a> {
    pub fn new(week: &'a WeekWindow, family: &'a MachineFamily, resolution: GridResolution) -> Self {
        Self {
            week,
            family,
            resolution,
        }
    }

    /// 計算工單定位
    ///
    /// 指派到族群外機台回傳 `UnknownMachine`，區間缺值或顛倒回傳
    /// `MalformedWorkOrder`，皆不會歸入停車場。
    pub fn resolve(&self, order: &WorkOrder) -> grid_core::Result<PlacementOutcome> {
        let Some(machine_name) = order.machine.as_deref() else {
            return Ok(PlacementOutcome::Unassigned);
        };

        let machine = self
            .family
            .get(machine_name)
            .ok_or_else(|| GridError::UnknownMachine {
                lot_number: order.lot_number,
                machine: machine_name.to_string(),
            })?;

        let (start, end) = order.valid_interval()?;
        if !self.week.overlaps(start, end) {
            return Ok(PlacementOutcome::OutsideWeek);
        }

        let case = PlacementCase::classify(start, end, self.week);
        let span = self.span_for(case, start, end);
        tracing::debug!(
            "工單 {} 定位於 {} 第 {} 列: {:?} [{}, {})",
            order.lot_number,
            machine.short_name,
            machine.row,
            case,
            span.start,
            span.end
        );

        Ok(PlacementOutcome::Placed(Placement {
            lot_number: order.lot_number,
            lot_id: order.lot_id.clone(),
            product: order.product.clone(),
            machine: machine.short_name.clone(),
            row: machine.row,
            span,
            case,
        }))
    }

    /// 依情況計算欄區間
    pub fn span_for(&self, case: PlacementCase, start: NaiveDateTime, end: NaiveDateTime) -> ColumnSpan {
        let cols_per_week = self.resolution.cols_per_week();
        let span = match case {
            PlacementCase::Spanning => ColumnSpan {
                start: 0,
                end: cols_per_week,
            },
            PlacementCase::StartsBeforeWeek => ColumnSpan {
                start: 0,
                end: self.end_column(end),
            },
            PlacementCase::EndsAfterWeek => ColumnSpan {
                start: self.resolution.column_of(start, self.week),
                end: cols_per_week,
            },
            PlacementCase::Contained => ColumnSpan {
                start: self.resolution.column_of(start, self.week),
                end: self.end_column(end),
            },
        };

        debug_assert!(
            span.start < span.end && span.end <= cols_per_week,
            "欄區間 [{}, {}) 超出週寬 {cols_per_week}",
            span.start,
            span.end
        );
        span
    }

    /// 結束時間所在欄 + 一小時欄數 + 1 欄間隔，截斷至週寬
    fn end_column(&self, end: NaiveDateTime) -> usize {
        let raw = self.resolution.raw_column(end, self.week)
            + self.resolution.cols_per_hour() as i64
            + 1;
        self.resolution.clamp_column(raw)
    }
}
