//! 指派紀錄

use chrono::NaiveDateTime;
use grid_core::WorkOrder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一次成功的重新指派
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub id: Uuid,
    pub lot_number: u64,
    pub from_machine: Option<String>,
    pub to_machine: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub at: NaiveDateTime,
}

impl AssignmentEvent {
    /// 由變更前後的工單建立紀錄
    pub fn between(before: &WorkOrder, after: &WorkOrder, at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_number: after.lot_number,
            from_machine: before.machine.clone(),
            to_machine: after.machine.clone(),
            start: after.pouching_start_dt,
            end: after.pouching_end_dt,
            at,
        }
    }

    /// 是否為移回停車場
    pub fn is_park(&self) -> bool {
        self.from_machine.is_some() && self.to_machine.is_none()
    }
}
