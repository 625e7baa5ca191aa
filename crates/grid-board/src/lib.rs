//! # Grid Board
//!
//! 共用排程看板：拖放重新指派的並行控制與增量重繪追蹤

pub mod board;
pub mod dirty_tracking;
pub mod journal;

// Re-export 主要類型
pub use board::ScheduleBoard;
pub use dirty_tracking::DirtyTracker;
pub use journal::AssignmentEvent;
