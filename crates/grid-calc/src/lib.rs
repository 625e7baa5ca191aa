//! # Grid Calculation Engine
//!
//! 週排程格線計算引擎：時間量化、排產遮罩、工單定位、停車場

pub mod calculator;
pub mod current;
pub mod mask;
pub mod overlap;
pub mod parking;
pub mod placement;
pub mod queue;
pub mod reassign;
pub mod resolution;

// Re-export 主要類型
pub use calculator::{GridCalculator, ScheduleGrid};
pub use current::{ColumnState, CurrentPeriod};
pub use mask::ScheduleMask;
pub use overlap::{OverlapConflict, OverlapDetector};
pub use parking::ParkingLot;
pub use placement::{ColumnSpan, Placement, PlacementCase, PlacementOutcome, PlacementResolver};
pub use queue::{JobQueue, QueuePlan, ScheduleMode};
pub use reassign::{reassign, reassign_checked, MachineChange, Reassignment};
pub use resolution::GridResolution;
