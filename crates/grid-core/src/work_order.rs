//! 生產工單模型

use chrono::{Duration, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    /// 未指派機台
    ParkingLot,
    /// 已排入機台，等待生產
    Queued,
    /// 生產中
    Pouching,
    /// 已結案
    Closed,
}

/// 生產工單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// 批號（唯一識別，亦為格線元素的穩定鍵）
    pub lot_number: u64,

    /// 人員可讀批次代碼
    pub lot_id: String,

    /// 產品類別（僅用於畫面分組）
    pub product: String,

    /// 指派的機台簡稱，None 表示未指派
    pub machine: Option<String>,

    pub pouching_start_dt: Option<NaiveDateTime>,

    pub pouching_end_dt: Option<NaiveDateTime>,

    pub status: WorkOrderStatus,

    /// 機台佇列中的順位，0 為生產中；未排入佇列為 None
    #[serde(default)]
    pub priority: Option<u32>,

    /// 投入數量
    pub strip_qty: Option<Decimal>,

    /// 已完成數量
    pub pouched_qty: Decimal,

    /// 標準產能（每小時）
    pub standard_rate: Option<Decimal>,
}

impl WorkOrder {
    /// 創建未指派的工單
    pub fn new(lot_number: u64, lot_id: String, product: String) -> Self {
        Self {
            lot_number,
            lot_id,
            product,
            machine: None,
            pouching_start_dt: None,
            pouching_end_dt: None,
            status: WorkOrderStatus::ParkingLot,
            priority: None,
            strip_qty: None,
            pouched_qty: Decimal::ZERO,
            standard_rate: None,
        }
    }

    /// 建構器模式：指派機台與生產區間
    pub fn assigned(
        mut self,
        machine: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        self.machine = Some(machine.into());
        self.pouching_start_dt = Some(start);
        self.pouching_end_dt = Some(end);
        self.status = WorkOrderStatus::Queued;
        self
    }

    /// 建構器模式：設置數量與標準產能
    pub fn with_quantities(mut self, strip_qty: Decimal, standard_rate: Decimal) -> Self {
        self.strip_qty = Some(strip_qty);
        self.standard_rate = Some(standard_rate);
        self
    }

    /// 建構器模式：設置佇列順位
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: WorkOrderStatus) -> Self {
        self.status = status;
        self
    }

    /// 是否已指派機台
    pub fn is_assigned(&self) -> bool {
        self.machine.is_some()
    }

    /// 生產區間（開始與結束皆有值時）
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.pouching_start_dt.zip(self.pouching_end_dt)
    }

    /// 取得有效的生產區間，缺值或 start >= end 視為資料錯誤
    pub fn valid_interval(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let (start, end) = self.interval().ok_or_else(|| GridError::MalformedWorkOrder {
            lot_number: self.lot_number,
            reason: "缺少生產開始或結束時間".to_string(),
        })?;

        if start >= end {
            return Err(GridError::MalformedWorkOrder {
                lot_number: self.lot_number,
                reason: format!("開始時間 {start} 不早於結束時間 {end}"),
            });
        }
        Ok((start, end))
    }

    /// 與另一張工單的生產區間是否重疊
    pub fn overlaps(&self, other: &WorkOrder) -> bool {
        match (self.interval(), other.interval()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }

    /// 移回停車場：清除機台與生產區間
    pub fn park(&mut self) {
        self.machine = None;
        self.pouching_start_dt = None;
        self.pouching_end_dt = None;
        self.priority = None;
        self.status = WorkOrderStatus::ParkingLot;
    }

    /// 結案，結束時間設為 `now`
    pub fn close(&mut self, now: NaiveDateTime) {
        self.status = WorkOrderStatus::Closed;
        self.pouching_end_dt = Some(now);
    }

    /// 剩餘數量
    pub fn remaining_qty(&self) -> Option<Decimal> {
        self.strip_qty
            .map(|strip| (strip - self.pouched_qty).max(Decimal::ZERO))
    }

    /// 剩餘工時（小時，無條件進位），數值溢位時為 None
    pub fn remaining_hours(&self) -> Option<i64> {
        let rate = self.standard_rate.filter(|r| *r > Decimal::ZERO)?;
        self.remaining_qty()?.checked_div(rate)?.ceil().to_i64()
    }

    /// 剩餘工時，超出時間範圍時為 None
    pub fn remaining_duration(&self) -> Option<Duration> {
        Duration::try_hours(self.remaining_hours()?)
    }

    /// 從 `start` 起算的預估完工時間
    pub fn estimated_end(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        start.checked_add_signed(self.remaining_duration()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_create_work_order() {
        let order = WorkOrder::new(1001, "A12".to_string(), "STRIP".to_string());

        assert!(!order.is_assigned());
        assert_eq!(order.status, WorkOrderStatus::ParkingLot);
        assert!(order.interval().is_none());
    }

    #[test]
    fn test_valid_interval() {
        let order = WorkOrder::new(1, "A1".to_string(), "P".to_string())
            .assigned("line5", dt(9, 8), dt(9, 14));
        assert_eq!(order.valid_interval().unwrap(), (dt(9, 8), dt(9, 14)));

        let inverted = WorkOrder::new(2, "A2".to_string(), "P".to_string())
            .assigned("line5", dt(9, 14), dt(9, 14));
        assert!(matches!(
            inverted.valid_interval(),
            Err(GridError::MalformedWorkOrder { lot_number: 2, .. })
        ));

        let missing = WorkOrder::new(3, "A3".to_string(), "P".to_string());
        assert!(missing.valid_interval().is_err());
    }

    #[test]
    fn test_park_and_close() {
        let mut order = WorkOrder::new(1, "A1".to_string(), "P".to_string())
            .assigned("line5", dt(9, 8), dt(9, 14));

        order.close(dt(9, 12));
        assert_eq!(order.status, WorkOrderStatus::Closed);
        assert_eq!(order.pouching_end_dt, Some(dt(9, 12)));

        order.priority = Some(0);
        order.park();
        assert!(!order.is_assigned());
        assert_eq!(order.priority, None);
        assert!(order.interval().is_none());
        assert_eq!(order.status, WorkOrderStatus::ParkingLot);
    }

    #[test]
    fn test_remaining_time_estimate() {
        let mut order = WorkOrder::new(1, "A1".to_string(), "P".to_string())
            .with_quantities(Decimal::from(1000), Decimal::from(300));
        order.pouched_qty = Decimal::from(100);

        // 剩 900，每小時 300 → 3 小時
        assert_eq!(order.remaining_qty(), Some(Decimal::from(900)));
        assert_eq!(order.remaining_hours(), Some(3));

        order.pouched_qty = Decimal::from(50);
        // 剩 950 → 3.17 小時進位為 4
        assert_eq!(order.remaining_hours(), Some(4));
        assert_eq!(order.estimated_end(dt(9, 8)), Some(dt(9, 12)));
    }

    #[test]
    fn test_estimates_at_extreme_quantities() {
        // 商數超出 Decimal 範圍
        let huge = WorkOrder::new(1, "A1".to_string(), "P".to_string())
            .with_quantities(Decimal::MAX, Decimal::new(5, 1));
        assert_eq!(huge.remaining_hours(), None);
        assert_eq!(huge.estimated_end(dt(9, 8)), None);

        // 工時超出 chrono 時間範圍
        let long = WorkOrder::new(2, "A2".to_string(), "P".to_string())
            .with_quantities(Decimal::from(1_000_000_000_000_000i64), Decimal::ONE);
        assert_eq!(long.remaining_hours(), Some(1_000_000_000_000_000));
        assert_eq!(long.remaining_duration(), None);
        assert_eq!(long.estimated_end(dt(9, 8)), None);

        // 結果落在日期範圍之外
        let late = WorkOrder::new(3, "A3".to_string(), "P".to_string())
            .with_quantities(Decimal::from(100_000_000_000i64), Decimal::ONE);
        assert!(late.remaining_duration().is_some());
        assert_eq!(late.estimated_end(dt(9, 8)), None);
    }

    #[test]
    fn test_overlaps() {
        let a = WorkOrder::new(1, "A".to_string(), "P".to_string())
            .assigned("line5", dt(9, 8), dt(9, 14));
        let b = WorkOrder::new(2, "B".to_string(), "P".to_string())
            .assigned("line5", dt(9, 14), dt(9, 20));
        let c = WorkOrder::new(3, "C".to_string(), "P".to_string())
            .assigned("line5", dt(9, 13), dt(9, 15));

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }
}
