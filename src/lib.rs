//! # Weekgrid
//!
//! 生產週排程格線引擎：把工單（機台 + 起訖時間）換算成固定週的
//! (機台列, 時間欄) 位置，並處理跨週邊界、目前時段標示與停車場。
//!
//! ```
//! use chrono::NaiveDate;
//! use weekgrid::{GridCalculator, GridConfig, MachineFamily, OperatingHours, WorkOrder};
//!
//! let family = MachineFamily::new("itrak", &["line5", "line6"]).unwrap();
//! let calculator =
//!     GridCalculator::new(family, OperatingHours::default(), GridConfig::default()).unwrap();
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
//! let order = WorkOrder::new(1001, "A12".to_string(), "STRIP".to_string()).assigned(
//!     "line6",
//!     day.and_hms_opt(8, 0, 0).unwrap(),
//!     day.and_hms_opt(14, 0, 0).unwrap(),
//! );
//!
//! let now = day.and_hms_opt(9, 0, 0).unwrap();
//! let grid = calculator.build("2024-02".parse().unwrap(), &[order], now).unwrap();
//! assert_eq!(grid.placement(1001).map(|p| (p.span.start, p.span.end)), Some((32, 40)));
//! ```

pub use grid_board::{AssignmentEvent, DirtyTracker, ScheduleBoard};
pub use grid_calc::{
    reassign, reassign_checked, ColumnSpan, ColumnState, CurrentPeriod, GridCalculator,
    GridResolution, JobQueue, MachineChange, OverlapConflict, OverlapDetector, ParkingLot,
    Placement, PlacementCase, PlacementOutcome, PlacementResolver, QueuePlan, Reassignment,
    ScheduleGrid, ScheduleMask, ScheduleMode,
};
pub use grid_core::{
    GridConfig, GridError, Machine, MachineFamily, MachineRegistry, OperatingHours, OverlapPolicy,
    Result, ScheduleTense, ShiftHours, ShiftTable, WeekId, WeekWindow, WorkOrder, WorkOrderStatus,
};
