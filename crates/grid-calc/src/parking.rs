//! 停車場：未指派機台的工單

use grid_core::WorkOrder;

/// 停車場收集器
pub struct ParkingLot;

impl ParkingLot {
    /// 收集未指派機台的工單，保持輸入順序
    pub fn collect(orders: &[WorkOrder]) -> Vec<WorkOrder> {
        orders.iter().filter(|o| !o.is_assigned()).cloned().collect()
    }
}
