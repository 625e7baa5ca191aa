//! 週排程格線主計算器

use chrono::{NaiveDate, NaiveDateTime};
use grid_core::{
    GridConfig, GridError, Machine, MachineFamily, OperatingHours, ScheduleTense, WeekId,
    WeekWindow, WorkOrder,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::current::{ColumnState, CurrentPeriod};
use crate::mask::ScheduleMask;
use crate::overlap::{OverlapConflict, OverlapDetector};
use crate::parking::ParkingLot;
use crate::placement::{Placement, PlacementOutcome, PlacementResolver};
use crate::queue::JobQueue;
use crate::resolution::GridResolution;

/// 交給畫面層的週排程格線模型
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleGrid {
    pub machine_family: String,

    pub week: WeekWindow,

    /// 顯示用標籤
    pub label: String,

    pub schedule_tense: ScheduleTense,

    pub cols_per_hour: usize,
    pub cols_per_day: usize,
    pub cols_per_week: usize,

    pub schedule_mask: ScheduleMask,

    pub scheduled_days: Vec<NaiveDate>,

    /// 僅目前週有值
    pub current_grid_column: Option<usize>,

    /// 依列位置排序的機台
    pub machines: Vec<Machine>,

    /// 依輸入順序
    pub placements: Vec<Placement>,

    /// 未指派機台的工單，依輸入順序
    pub parking_lot: Vec<WorkOrder>,

    /// 同機台區間重疊（只提示，不影響定位）
    pub overlaps: Vec<OverlapConflict>,

    /// 個別工單的資料錯誤，不中斷整週繪製
    pub errors: Vec<GridError>,
}

impl ScheduleGrid {
    /// 欄相對於現在的狀態
    pub fn column_state(&self, column: usize) -> ColumnState {
        CurrentPeriod {
            tense: self.schedule_tense,
            current_column: self.current_grid_column,
        }
        .state_of(column)
    }

    /// 指定機台列上的定位
    pub fn row(&self, machine: &str) -> impl Iterator<Item = &Placement> + '_ {
        let machine = machine.to_string();
        self.placements.iter().filter(move |p| p.machine == machine)
    }

    /// 依批號查找定位
    pub fn placement(&self, lot_number: u64) -> Option<&Placement> {
        self.placements.iter().find(|p| p.lot_number == lot_number)
    }

    /// 有資料完整性錯誤（工單指向族群外機台）時回傳第一個錯誤
    pub fn ensure_integrity(&self) -> grid_core::Result<()> {
        match self
            .errors
            .iter()
            .find(|e| matches!(e, GridError::UnknownMachine { .. }))
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// 週排程格線計算器
#[derive(Debug, Clone)]
pub struct GridCalculator {
    family: MachineFamily,
    hours: OperatingHours,
    config: GridConfig,
    resolution: GridResolution,
}

impl GridCalculator {
    /// 創建新的格線計算器
    pub fn new(
        family: MachineFamily,
        hours: OperatingHours,
        config: GridConfig,
    ) -> grid_core::Result<Self> {
        let resolution = GridResolution::from_config(&config)?;
        Ok(Self {
            family,
            hours,
            config,
            resolution,
        })
    }

    pub fn family(&self) -> &MachineFamily {
        &self.family
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    /// 本族群的機台佇列排程器
    pub fn job_queue(&self) -> JobQueue<'_> {
        JobQueue::new(&self.family, &self.hours, self.resolution)
    }

    /// 計算單週格線
    ///
    /// `now` 為呼叫端提供的時鐘讀數，用於判斷時態與目前欄。
    pub fn build(
        &self,
        year_week: WeekId,
        orders: &[WorkOrder],
        now: NaiveDateTime,
    ) -> grid_core::Result<ScheduleGrid> {
        let start_time = std::time::Instant::now();
        tracing::info!(
            "開始計算 {} 週 {} 格線：工單 {} 筆",
            self.family.name,
            year_week,
            orders.len()
        );

        // Step 1: 週時間窗
        let week = WeekWindow::new(year_week)?;

        // Step 2: 欄標註（排產遮罩、目前時段）
        let schedule_mask = ScheduleMask::build(&week, &self.hours, &self.resolution);
        let scheduled_days = ScheduleMask::scheduled_days(&week, &self.hours);
        let period = CurrentPeriod::at(&week, now, &self.resolution);

        // Step 3: 逐工單定位
        let resolver = PlacementResolver::new(&week, &self.family, self.resolution);
        let mut placements = Vec::new();
        let mut placed_orders = Vec::new();
        let mut errors = Vec::new();

        for order in orders {
            match resolver.resolve(order) {
                Ok(PlacementOutcome::Placed(placement)) => {
                    placements.push(placement);
                    placed_orders.push(order);
                }
                Ok(PlacementOutcome::Unassigned) | Ok(PlacementOutcome::OutsideWeek) => {}
                Err(err) => {
                    tracing::warn!("工單 {} 無法定位: {}", order.lot_number, err);
                    errors.push(err);
                }
            }
        }

        // Step 4: 停車場與重疊提示
        let parking_lot = ParkingLot::collect(orders);
        let overlaps = OverlapDetector::detect(placed_orders);
        if !overlaps.is_empty() {
            tracing::warn!("{} 週有 {} 組同機台重疊工單", year_week, overlaps.len());
        }

        tracing::info!(
            "格線計算完成，耗時 {:?}：定位 {} 筆，停車場 {} 筆，錯誤 {} 筆",
            start_time.elapsed(),
            placements.len(),
            parking_lot.len(),
            errors.len()
        );

        Ok(ScheduleGrid {
            machine_family: self.family.name.clone(),
            label: week.label(),
            week,
            schedule_tense: period.tense,
            cols_per_hour: self.resolution.cols_per_hour(),
            cols_per_day: self.resolution.cols_per_day(),
            cols_per_week: self.resolution.cols_per_week(),
            schedule_mask,
            scheduled_days,
            current_grid_column: period.current_column,
            machines: self.family.machines().to_vec(),
            placements,
            parking_lot,
            overlaps,
            errors,
        })
    }

    /// 計算 `now` 所在週的格線
    pub fn build_current(
        &self,
        orders: &[WorkOrder],
        now: NaiveDateTime,
    ) -> grid_core::Result<ScheduleGrid> {
        self.build(WeekId::containing(now.date()), orders, now)
    }

    /// 從 `first_week` 起連續 `weeks` 週的格線，各週獨立並行計算，依週次排序回傳
    pub fn build_outlook(
        &self,
        first_week: WeekId,
        weeks: usize,
        orders: &[WorkOrder],
        now: NaiveDateTime,
    ) -> grid_core::Result<Vec<ScheduleGrid>> {
        let week_ids = (0..weeks as i64)
            .map(|offset| first_week.shift_weeks(offset))
            .collect::<grid_core::Result<Vec<_>>>()?;

        week_ids
            .into_par_iter()
            .map(|week_id| self.build(week_id, orders, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{ColumnSpan, PlacementCase};
    use grid_core::ShiftHours;

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn calculator() -> GridCalculator {
        let family = MachineFamily::new("itrak", &["line5", "line6", "line7"]).unwrap();
        GridCalculator::new(family, OperatingHours::default(), GridConfig::default()).unwrap()
    }

    fn week_id() -> WeekId {
        "2024-02".parse().unwrap()
    }

    fn orders() -> Vec<WorkOrder> {
        vec![
            WorkOrder::new(1, "A".to_string(), "STRIP".to_string())
                .assigned("line7", at(1, 9, 8), at(1, 9, 14)),
            WorkOrder::new(2, "B".to_string(), "STRIP".to_string()),
            WorkOrder::new(3, "C".to_string(), "STRIP".to_string())
                .assigned("line5", at(1, 7, 20), at(1, 8, 3)),
            WorkOrder::new(4, "D".to_string(), "STRIP".to_string())
                .assigned("line9", at(1, 9, 8), at(1, 9, 10)),
            WorkOrder::new(5, "E".to_string(), "STRIP".to_string())
                .assigned("line6", at(1, 10, 12), at(1, 10, 8)),
            WorkOrder::new(6, "F".to_string(), "STRIP".to_string()),
            WorkOrder::new(7, "G".to_string(), "STRIP".to_string())
                .assigned("line6", at(2, 1, 8), at(2, 1, 12)),
        ]
    }

    #[test]
    fn test_build_week_grid() {
        let grid = calculator().build(week_id(), &orders(), at(1, 10, 9)).unwrap();

        assert_eq!(grid.machine_family, "itrak");
        assert_eq!(grid.label, "Jan 08, 2024 - Jan 14, 2024");
        assert_eq!(grid.cols_per_week, grid.cols_per_day * 7);
        assert_eq!(grid.schedule_mask.len(), grid.cols_per_week);
        assert_eq!(grid.schedule_tense, ScheduleTense::Current);
        assert_eq!(grid.current_grid_column, Some(57));
        assert_eq!(grid.scheduled_days.len(), 5);
        assert_eq!(grid.machines.len(), 3);

        let lots: Vec<u64> = grid.placements.iter().map(|p| p.lot_number).collect();
        assert_eq!(lots, vec![1, 3]);
        assert_eq!(
            grid.placement(1).map(|p| (p.row, p.span)),
            Some((2, ColumnSpan { start: 32, end: 40 }))
        );
        assert_eq!(grid.placement(3).map(|p| p.case), Some(PlacementCase::StartsBeforeWeek));

        let parked: Vec<u64> = grid.parking_lot.iter().map(|o| o.lot_number).collect();
        assert_eq!(parked, vec![2, 6]);
    }

    #[test]
    fn test_bad_records_are_collected_not_fatal() {
        let grid = calculator().build(week_id(), &orders(), at(1, 10, 9)).unwrap();

        assert_eq!(grid.errors.len(), 2);
        assert!(grid.errors.contains(&GridError::UnknownMachine {
            lot_number: 4,
            machine: "line9".to_string()
        }));
        assert!(grid
            .errors
            .iter()
            .any(|e| matches!(e, GridError::MalformedWorkOrder { lot_number: 5, .. })));

        assert!(matches!(
            grid.ensure_integrity(),
            Err(GridError::UnknownMachine { lot_number: 4, .. })
        ));
    }

    #[test]
    fn test_past_and_future_tense() {
        let calc = calculator();

        let past = calc.build(week_id(), &[], at(3, 1, 0)).unwrap();
        assert_eq!(past.schedule_tense, ScheduleTense::Past);
        assert_eq!(past.current_grid_column, None);
        assert_eq!(past.column_state(0), ColumnState::Elapsed);

        let future = calc.build(week_id(), &[], at(1, 1, 0)).unwrap();
        assert_eq!(future.schedule_tense, ScheduleTense::Future);
        assert_eq!(future.column_state(167), ColumnState::Upcoming);
    }

    #[test]
    fn test_overlaps_reported() {
        let orders = vec![
            WorkOrder::new(1, "A".to_string(), "STRIP".to_string())
                .assigned("line5", at(1, 9, 8), at(1, 9, 14)),
            WorkOrder::new(2, "B".to_string(), "STRIP".to_string())
                .assigned("line5", at(1, 9, 12), at(1, 9, 18)),
        ];
        let grid = calculator().build(week_id(), &orders, at(1, 1, 0)).unwrap();

        // 兩者仍各自定位
        assert_eq!(grid.placements.len(), 2);
        assert_eq!(grid.overlaps.len(), 1);
        assert_eq!(grid.row("line5").count(), 2);
    }

    #[test]
    fn test_closed_order_renders_truncated_interval() {
        let mut order = WorkOrder::new(1, "A".to_string(), "STRIP".to_string())
            .assigned("line5", at(1, 9, 8), at(1, 9, 20));
        order.close(at(1, 9, 11));

        let grid = calculator().build(week_id(), &[order], at(1, 9, 12)).unwrap();

        assert!(grid.parking_lot.is_empty());
        assert_eq!(
            grid.placement(1).map(|p| p.span),
            Some(ColumnSpan { start: 32, end: 37 })
        );
    }

    #[test]
    fn test_outlook_is_ordered_and_continuous() {
        // 週日 20:00 到下週二 06:00
        let orders = vec![WorkOrder::new(1, "A".to_string(), "STRIP".to_string())
            .assigned("line6", at(1, 14, 20), at(1, 16, 6))];

        let grids = calculator()
            .build_outlook(week_id(), 3, &orders, at(1, 10, 9))
            .unwrap();

        let weeks: Vec<String> = grids.iter().map(|g| g.week.year_week.to_string()).collect();
        assert_eq!(weeks, vec!["2024-02", "2024-03", "2024-04"]);

        let first = grids[0].placement(1).unwrap();
        let second = grids[1].placement(1).unwrap();
        assert_eq!(first.span.end, 168);
        assert_eq!(second.span.start, 0);
        assert!(grids[2].placement(1).is_none());
    }

    #[test]
    fn test_half_hour_grid_with_custom_hours() {
        let family = MachineFamily::new("swab", &["swabauto"]).unwrap();
        let hours = OperatingHours::new_24_7("PLANT".to_string())
            .with_weekday(chrono::Weekday::Sun, None)
            .with_weekday(chrono::Weekday::Sat, Some(ShiftHours::from_hours(6, 14).unwrap()));
        let config = GridConfig::new().with_cols_per_hour(2);
        let calc = GridCalculator::new(family, hours, config).unwrap();

        let grid = calc.build(week_id(), &[], at(1, 1, 0)).unwrap();

        assert_eq!(grid.cols_per_week, 336);
        assert_eq!(grid.schedule_mask.len(), 336);
        // 週一到週五全天 + 週六 8 小時
        assert_eq!(grid.schedule_mask.scheduled_count(), 5 * 48 + 16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let family = MachineFamily::new("itrak", &["line5"]).unwrap();
        let result = GridCalculator::new(
            family,
            OperatingHours::default(),
            GridConfig::new().with_cols_per_hour(7),
        );
        assert!(matches!(result, Err(GridError::InvalidResolution(_))));
    }

    #[test]
    fn test_grid_serializes_for_renderer() {
        let grid = calculator().build(week_id(), &orders(), at(1, 10, 9)).unwrap();
        let json = serde_json::to_value(&grid).unwrap();

        assert_eq!(json["week"]["year_week"], "2024-02");
        assert_eq!(json["schedule_tense"], "current");
        assert_eq!(json["placements"][0]["span"]["start"], 32);
        assert_eq!(json["errors"][0]["kind"], "unknown_machine");
    }
}
