//! 機台工單佇列
//!
//! 工單拖到機台時依模式排入該機台的佇列：
//! - `Replace`：生產中的工單移回停車場，新工單立即開始生產
//! - `Insert`：排在生產中工單之後（順位 1）
//! - `Append`：排在佇列最後
//!
//! 排入後整條佇列依順位重新排時：順位 0 為生產中，其後每張工單從前一張
//! 結束後的第一個營運欄開始，長度為剩餘工時。

use chrono::{Duration, NaiveDateTime};
use grid_core::{GridError, MachineFamily, OperatingHours, WorkOrder, WorkOrderStatus};
use serde::{Deserialize, Serialize};

use crate::reassign::Reassignment;
use crate::resolution::GridResolution;

/// 尋找營運時段的最長範圍（週）
const SEARCH_WEEKS: usize = 4;

/// 排入佇列的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    Replace,
    Insert,
    Append,
}

/// 排入佇列的結果
#[derive(Debug, Clone, PartialEq)]
pub struct QueuePlan {
    /// 依順位排列、已重新排時的佇列
    pub queue: Vec<WorkOrder>,

    /// `Replace` 時被移回停車場的工單
    pub parked: Option<WorkOrder>,
}

impl QueuePlan {
    /// 所有變更過的工單
    pub fn orders(&self) -> impl Iterator<Item = &WorkOrder> {
        self.queue.iter().chain(self.parked.iter())
    }
}

/// 單一機台族群的佇列排程器
#[derive(Debug, Clone, Copy)]
pub struct JobQueue<'a> {
    family: &'a MachineFamily,
    hours: &'a OperatingHours,
    resolution: GridResolution,
}

impl<'a> JobQueue<'a> {
    pub fn new(
        family: &'a MachineFamily,
        hours: &'a OperatingHours,
        resolution: GridResolution,
    ) -> Self {
        Self {
            family,
            hours,
            resolution,
        }
    }

    /// 把 `order` 以 `mode` 排入 `machine` 的佇列
    ///
    /// `current` 為目前指派在該機台上的工單（其他機台與已結案工單會被忽略）。
    /// 失敗時不回傳任何變更。
    pub fn schedule(
        &self,
        order: &WorkOrder,
        machine: &str,
        mode: ScheduleMode,
        current: &[WorkOrder],
        now: NaiveDateTime,
    ) -> grid_core::Result<QueuePlan> {
        if !self.family.contains(machine) {
            return Err(GridError::InvalidAssignment(format!(
                "工單 {}: 機台 {machine} 不屬於族群 {}",
                order.lot_number, self.family.name
            )));
        }

        let mut jobs: Vec<WorkOrder> = current
            .iter()
            .filter(|job| {
                job.machine.as_deref() == Some(machine)
                    && job.lot_number != order.lot_number
                    && job.status != WorkOrderStatus::Closed
            })
            .cloned()
            .collect();
        jobs.sort_by_key(|job| {
            (
                job.priority.unwrap_or(u32::MAX),
                job.pouching_start_dt,
                job.lot_number,
            )
        });

        let mut incoming = order.clone();
        let mut parked = None;
        match mode {
            ScheduleMode::Replace => {
                if !jobs.is_empty() {
                    let mut running = jobs.remove(0);
                    running.park();
                    parked = Some(running);
                }
                // 立即開始生產
                incoming.status = WorkOrderStatus::Pouching;
                incoming.pouching_start_dt = Some(now);
                jobs.insert(0, incoming);
            }
            ScheduleMode::Insert => {
                let at = jobs.len().min(1);
                jobs.insert(at, incoming);
            }
            ScheduleMode::Append => jobs.push(incoming),
        }

        let queue = self.reflow(machine, jobs, now)?;
        tracing::debug!(
            "工單 {} 以 {:?} 排入機台 {}，佇列 {} 張",
            order.lot_number,
            mode,
            machine,
            queue.len()
        );
        Ok(QueuePlan { queue, parked })
    }

    /// 依順位重新排時
    fn reflow(
        &self,
        machine: &str,
        jobs: Vec<WorkOrder>,
        now: NaiveDateTime,
    ) -> grid_core::Result<Vec<WorkOrder>> {
        let mut cursor = self.resolution.snap_to_grid(now);
        let mut queue = Vec::with_capacity(jobs.len());

        for (priority, job) in jobs.into_iter().enumerate() {
            let run_time = self.run_time(&job)?;
            let open = self.first_open_at(machine, cursor)?;

            let start = match (priority, job.status, job.pouching_start_dt) {
                (0, WorkOrderStatus::Pouching, Some(started)) if started <= now => started,
                (0, _, _) => now,
                _ => open,
            };
            let end = open.checked_add_signed(run_time).ok_or_else(|| {
                GridError::MalformedWorkOrder {
                    lot_number: job.lot_number,
                    reason: "預估完工時間超出日期範圍".to_string(),
                }
            })?;

            let mut scheduled = Reassignment::to_machine(machine)
                .with_interval(start, end)
                .apply_to(&job, self.family)?;
            scheduled.priority = u32::try_from(priority).ok();
            scheduled.status = if priority == 0 {
                WorkOrderStatus::Pouching
            } else {
                WorkOrderStatus::Queued
            };

            cursor = end;
            queue.push(scheduled);
        }
        Ok(queue)
    }

    /// 剩餘工時，缺數量時沿用目前區間長度；至少一欄
    fn run_time(&self, job: &WorkOrder) -> grid_core::Result<Duration> {
        let malformed = |reason: &str| GridError::MalformedWorkOrder {
            lot_number: job.lot_number,
            reason: reason.to_string(),
        };

        let run_time = match job.remaining_hours() {
            Some(_) => job
                .remaining_duration()
                .ok_or_else(|| malformed("預估工時超出時間範圍"))?,
            None => match job.interval() {
                Some((start, end)) if start < end => end - start,
                _ => return Err(malformed("缺少數量或標準產能，無法估算工時")),
            },
        };
        Ok(run_time.max(self.resolution.column_width()))
    }

    /// `from` 所在欄起第一個營運欄的起始時間
    fn first_open_at(&self, machine: &str, from: NaiveDateTime) -> grid_core::Result<NaiveDateTime> {
        let width = self.resolution.column_width();
        let limit = self.resolution.cols_per_week() * SEARCH_WEEKS;

        let mut slot = self.resolution.snap_to_grid(from);
        for _ in 0..limit {
            if self.hours.is_open_at(slot) {
                return Ok(slot.max(from));
            }
            slot = slot.checked_add_signed(width).ok_or_else(|| {
                GridError::InvalidAssignment(format!("機台 {machine} 的排程超出日期範圍"))
            })?;
        }
        Err(GridError::InvalidAssignment(format!(
            "機台 {machine} 在 {from} 之後 {SEARCH_WEEKS} 週內沒有營運時段"
        )))
    }
}
