//! # Grid Core
//!
//! 週排程格線的核心資料模型與類型定義

pub mod calendar;
pub mod config;
pub mod machine;
pub mod week;
pub mod work_order;

// Re-export 主要類型
pub use calendar::{OperatingHours, ShiftHours, ShiftTable};
pub use config::{GridConfig, OverlapPolicy};
pub use machine::{Machine, MachineFamily, MachineRegistry};
pub use week::{ScheduleTense, WeekId, WeekWindow};
pub use work_order::{WorkOrder, WorkOrderStatus};

/// 排程格線錯誤類型
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GridError {
    #[error("無效的週識別碼: {0}")]
    InvalidWeekIdentifier(String),

    #[error("無效的工單指派: {0}")]
    InvalidAssignment(String),

    #[error("工單 {lot_number} 指派到不存在的機台: {machine}")]
    UnknownMachine { lot_number: u64, machine: String },

    #[error("工單 {lot_number} 資料錯誤: {reason}")]
    MalformedWorkOrder { lot_number: u64, reason: String },

    #[error("無效的格線解析度: {0}")]
    InvalidResolution(String),

    #[error("設定檔錯誤: {0}")]
    Config(String),

    #[error("排程鎖已損壞: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
