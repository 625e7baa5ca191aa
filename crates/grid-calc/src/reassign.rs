//! 工單重新指派（拖放操作的入口）

use chrono::NaiveDateTime;
use grid_core::{GridError, MachineFamily, OverlapPolicy, WorkOrder, WorkOrderStatus};
use serde::{Deserialize, Serialize};

use crate::overlap::OverlapDetector;

/// 機台變更
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineChange {
    /// 不變更
    #[default]
    Keep,
    /// 指派到機台
    Assign(String),
    /// 移回停車場
    Unassign,
}

/// 重新指派請求
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reassignment {
    pub machine: MachineChange,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Reassignment {
    /// 指派到機台
    pub fn to_machine(machine: impl Into<String>) -> Self {
        Self {
            machine: MachineChange::Assign(machine.into()),
            ..Self::default()
        }
    }

    /// 移回停車場
    pub fn unassign() -> Self {
        Self {
            machine: MachineChange::Unassign,
            ..Self::default()
        }
    }

    /// 只變更時間
    pub fn retime(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::default().with_interval(start, end)
    }

    /// 建構器模式：設置新區間
    pub fn with_interval(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// 建構器模式：只設置新開始時間
    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// 建構器模式：只設置新結束時間
    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// 套用到工單副本並驗證，原工單不受影響
    pub fn apply_to(&self, order: &WorkOrder, family: &MachineFamily) -> grid_core::Result<WorkOrder> {
        let invalid = |reason: String| {
            GridError::InvalidAssignment(format!("工單 {}: {reason}", order.lot_number))
        };
        let mut updated = order.clone();

        match &self.machine {
            MachineChange::Unassign => {
                if self.start.is_some() || self.end.is_some() {
                    return Err(invalid("移回停車場時不可同時指定區間".to_string()));
                }
                updated.park();
                return Ok(updated);
            }
            MachineChange::Assign(machine) => {
                if !family.contains(machine) {
                    return Err(invalid(format!("機台 {machine} 不屬於族群 {}", family.name)));
                }
                if order.machine.as_deref() != Some(machine.as_str()) {
                    // 換機台後原佇列順位失效
                    updated.priority = None;
                }
                updated.machine = Some(machine.clone());
            }
            MachineChange::Keep => {}
        }

        if let Some(start) = self.start {
            updated.pouching_start_dt = Some(start);
        }
        if let Some(end) = self.end {
            updated.pouching_end_dt = Some(end);
        }

        match updated.interval() {
            Some((start, end)) if start >= end => {
                return Err(invalid(format!("開始時間 {start} 不早於結束時間 {end}")));
            }
            None if updated.is_assigned() => {
                return Err(invalid("指派到機台需要完整的生產區間".to_string()));
            }
            _ => {}
        }

        if updated.is_assigned() && updated.status == WorkOrderStatus::ParkingLot {
            updated.status = WorkOrderStatus::Queued;
        }
        Ok(updated)
    }
}

/// 重新指派工單
///
/// 驗證新區間 start < end、新機台屬於族群；失敗時工單保持不變。
/// 成功後由呼叫端負責持久化，下次繪製時重新定位。
pub fn reassign(
    order: &mut WorkOrder,
    change: &Reassignment,
    family: &MachineFamily,
) -> grid_core::Result<()> {
    let updated = change.apply_to(order, family)?;
    tracing::debug!(
        "工單 {} 重新指派: {:?} -> {:?}",
        order.lot_number,
        order.machine,
        updated.machine
    );
    *order = updated;
    Ok(())
}

/// 重新指派並依重疊政策檢查同機台其他工單
pub fn reassign_checked<'a>(
    order: &mut WorkOrder,
    change: &Reassignment,
    family: &MachineFamily,
    others: impl IntoIterator<Item = &'a WorkOrder>,
    policy: OverlapPolicy,
) -> grid_core::Result<()> {
    let updated = change.apply_to(order, family)?;

    if policy == OverlapPolicy::Reject {
        if let Some(conflict) = OverlapDetector::first_conflict(&updated, others) {
            return Err(GridError::InvalidAssignment(format!(
                "工單 {} 與工單 {} 在機台 {} 上時間重疊",
                order.lot_number,
                conflict.lot_number,
                updated.machine.as_deref().unwrap_or_default()
            )));
        }
    }

    *order = updated;
    Ok(())
}
