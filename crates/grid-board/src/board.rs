//! 共用排程看板
//!
//! 同一週的工單可能被多個呼叫端同時拖放。每個機台列有獨立的寫入鎖，
//! 所有寫入（載入、重新指派、排入佇列）都依列位置順序鎖住來源列與目標列，
//! 在鎖內重新驗證目標列後才寫入，因此兩個並行指派不會在同一列造成重疊。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use chrono::NaiveDateTime;
use grid_calc::{
    GridCalculator, OverlapDetector, QueuePlan, Reassignment, ScheduleGrid, ScheduleMode,
};
use grid_core::{GridError, OverlapPolicy, WeekId, WorkOrder};

use crate::dirty_tracking::DirtyTracker;
use crate::journal::AssignmentEvent;

fn poisoned<E: std::fmt::Display>(err: E) -> GridError {
    GridError::LockPoisoned(err.to_string())
}

/// 依插入順序保存的工單
#[derive(Debug, Default)]
struct OrderBook {
    sequence: Vec<u64>,
    orders: HashMap<u64, WorkOrder>,
}

impl OrderBook {
    fn upsert(&mut self, order: WorkOrder) {
        if !self.orders.contains_key(&order.lot_number) {
            self.sequence.push(order.lot_number);
        }
        self.orders.insert(order.lot_number, order);
    }

    fn ordered(&self) -> Vec<WorkOrder> {
        self.sequence
            .iter()
            .filter_map(|lot| self.orders.get(lot).cloned())
            .collect()
    }
}

/// 共用排程看板
pub struct ScheduleBoard {
    calculator: GridCalculator,
    orders: RwLock<OrderBook>,
    /// 依列位置排列，與 `calculator.family().machines()` 一致
    row_locks: Vec<(String, Mutex<()>)>,
    dirty: Mutex<DirtyTracker>,
    journal: Mutex<Vec<AssignmentEvent>>,
}

impl ScheduleBoard {
    /// 創建新的看板
    pub fn new(calculator: GridCalculator) -> Self {
        let mut machines = calculator.family().machines().to_vec();
        machines.sort_by_key(|m| m.row);
        let row_locks = machines
            .into_iter()
            .map(|m| (m.short_name, Mutex::new(())))
            .collect();

        Self {
            calculator,
            orders: RwLock::new(OrderBook::default()),
            row_locks,
            dirty: Mutex::new(DirtyTracker::new()),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// 建構器模式：載入工單
    pub fn with_orders(self, orders: Vec<WorkOrder>) -> grid_core::Result<Self> {
        for order in orders {
            self.upsert(order)?;
        }
        Ok(self)
    }

    /// 新增或取代工單（取代時保留原順序）
    ///
    /// 與重新指派共用列鎖，但不套用重疊政策：載入的資料照原樣保存，
    /// 重疊由格線的 `overlaps` 提示。
    pub fn upsert(&self, order: WorkOrder) -> grid_core::Result<()> {
        loop {
            let previous = self.get(order.lot_number)?;
            let previous_machine = previous.as_ref().and_then(|o| o.machine.clone());
            let _guards =
                self.lock_rows(&[previous_machine.as_deref(), order.machine.as_deref()])?;

            let mut book = self.orders.write().map_err(poisoned)?;
            if book.orders.get(&order.lot_number) != previous.as_ref() {
                continue;
            }

            let mut dirty = self.dirty.lock().map_err(poisoned)?;
            for machine in [&previous_machine, &order.machine].into_iter().flatten() {
                dirty.mark_dirty(machine);
            }
            book.upsert(order);
            return Ok(());
        }
    }

    /// 查詢工單
    pub fn get(&self, lot_number: u64) -> grid_core::Result<Option<WorkOrder>> {
        let book = self.orders.read().map_err(poisoned)?;
        Ok(book.orders.get(&lot_number).cloned())
    }

    /// 依插入順序的工單快照
    pub fn snapshot(&self) -> grid_core::Result<Vec<WorkOrder>> {
        Ok(self.orders.read().map_err(poisoned)?.ordered())
    }

    /// 以一致的快照計算格線
    pub fn render(&self, year_week: WeekId, now: NaiveDateTime) -> grid_core::Result<ScheduleGrid> {
        let orders = self.snapshot()?;
        self.calculator.build(year_week, &orders, now)
    }

    /// 取出自上次重繪後有變動的機台列
    pub fn take_dirty_rows(&self) -> grid_core::Result<Vec<String>> {
        Ok(self.dirty.lock().map_err(poisoned)?.take())
    }

    /// 指派紀錄
    pub fn journal(&self) -> grid_core::Result<Vec<AssignmentEvent>> {
        Ok(self.journal.lock().map_err(poisoned)?.clone())
    }

    /// 取出尚未交給持久化層的指派紀錄
    pub fn take_journal(&self) -> grid_core::Result<Vec<AssignmentEvent>> {
        Ok(std::mem::take(&mut *self.journal.lock().map_err(poisoned)?))
    }

    /// 重新指派工單
    ///
    /// 失敗時看板狀態不變。成功後回傳更新後的工單，持久化由呼叫端負責。
    pub fn reassign(
        &self,
        lot_number: u64,
        change: &Reassignment,
        at: NaiveDateTime,
    ) -> grid_core::Result<WorkOrder> {
        loop {
            let before = self.get(lot_number)?.ok_or_else(|| {
                GridError::InvalidAssignment(format!("找不到工單 {lot_number}"))
            })?;

            let updated = change.apply_to(&before, self.calculator.family())?;

            // 依列位置順序上鎖，避免反向搬移互相等待
            let _guards = self.lock_rows(&[before.machine.as_deref(), updated.machine.as_deref()])?;

            if self.config_rejects_overlap() {
                let book = self.orders.read().map_err(poisoned)?;
                if let Some(conflict) = OverlapDetector::first_conflict(&updated, book.orders.values()) {
                    return Err(GridError::InvalidAssignment(format!(
                        "工單 {lot_number} 與工單 {} 在機台 {} 上時間重疊",
                        conflict.lot_number,
                        updated.machine.as_deref().unwrap_or_default()
                    )));
                }
            }

            let mut book = self.orders.write().map_err(poisoned)?;
            match book.orders.get_mut(&lot_number) {
                Some(current) if *current == before => *current = updated.clone(),
                // 上鎖前工單已被他人變更，以新狀態重試
                Some(_) => {
                    tracing::debug!("工單 {lot_number} 已被並行變更，重試指派");
                    continue;
                }
                None => {
                    return Err(GridError::InvalidAssignment(format!(
                        "工單 {lot_number} 已被移除"
                    )))
                }
            }
            drop(book);

            let mut dirty = self.dirty.lock().map_err(poisoned)?;
            for machine in [&before.machine, &updated.machine].into_iter().flatten() {
                dirty.mark_dirty(machine);
            }
            drop(dirty);

            self.journal
                .lock()
                .map_err(poisoned)?
                .push(AssignmentEvent::between(&before, &updated, at));

            tracing::info!(
                "工單 {} 指派: {:?} -> {:?}",
                lot_number,
                before.machine,
                updated.machine
            );
            return Ok(updated);
        }
    }

    /// 把工單以 `mode` 排入機台佇列，整條佇列重新排時
    ///
    /// 失敗時看板狀態不變。回傳的計畫包含所有變更過的工單。
    pub fn schedule_job(
        &self,
        lot_number: u64,
        machine: &str,
        mode: ScheduleMode,
        now: NaiveDateTime,
    ) -> grid_core::Result<QueuePlan> {
        loop {
            let before = self.get(lot_number)?.ok_or_else(|| {
                GridError::InvalidAssignment(format!("找不到工單 {lot_number}"))
            })?;

            let _guards = self.lock_rows(&[before.machine.as_deref(), Some(machine)])?;

            let mut book = self.orders.write().map_err(poisoned)?;
            if book.orders.get(&lot_number) != Some(&before) {
                tracing::debug!("工單 {lot_number} 已被並行變更，重試排入佇列");
                continue;
            }

            let current: Vec<WorkOrder> = book
                .orders
                .values()
                .filter(|o| o.machine.as_deref() == Some(machine))
                .cloned()
                .collect();
            let plan = self
                .calculator
                .job_queue()
                .schedule(&before, machine, mode, &current, now)?;

            let mut events = Vec::new();
            for updated in plan.orders() {
                if let Some(slot) = book.orders.get_mut(&updated.lot_number) {
                    if *slot != *updated {
                        events.push(AssignmentEvent::between(slot, updated, now));
                        *slot = updated.clone();
                    }
                }
            }
            drop(book);

            let mut dirty = self.dirty.lock().map_err(poisoned)?;
            for row in [before.machine.as_deref(), Some(machine)].into_iter().flatten() {
                dirty.mark_dirty(row);
            }
            drop(dirty);

            tracing::info!(
                "工單 {} 以 {:?} 排入機台 {}，異動 {} 張",
                lot_number,
                mode,
                machine,
                events.len()
            );
            self.journal.lock().map_err(poisoned)?.extend(events);
            return Ok(plan);
        }
    }

    fn config_rejects_overlap(&self) -> bool {
        self.calculator.config().overlap_policy == OverlapPolicy::Reject
    }

    /// 鎖住指定機台列，依列位置順序、去重；族群外機台不佔鎖
    fn lock_rows(&self, machines: &[Option<&str>]) -> grid_core::Result<Vec<MutexGuard<'_, ()>>> {
        let mut guards = Vec::new();
        for (name, lock) in &self.row_locks {
            if machines.iter().any(|m| *m == Some(name.as_str())) {
                guards.push(lock.lock().map_err(poisoned)?);
            }
        }
        Ok(guards)
    }
}
