//! 同機台區間重疊檢查

use grid_core::WorkOrder;
use serde::{Deserialize, Serialize};

/// 同一機台上兩張區間重疊的工單
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapConflict {
    pub machine: String,
    /// 開始時間較早者
    pub first: u64,
    pub second: u64,
}

/// 重疊偵測器
pub struct OverlapDetector;

impl OverlapDetector {
    /// 找出所有同機台重疊的工單對
    ///
    /// 只比較有機台且有區間的工單；依機台、開始時間排序輸出。
    pub fn detect<'a, I>(orders: I) -> Vec<OverlapConflict>
    where
        I: IntoIterator<Item = &'a WorkOrder>,
    {
        let mut scheduled: Vec<(&str, &WorkOrder)> = orders
            .into_iter()
            .filter_map(|o| {
                let machine = o.machine.as_deref()?;
                o.interval().filter(|(start, end)| start < end)?;
                Some((machine, o))
            })
            .collect();
        scheduled.sort_by(|(ma, a), (mb, b)| {
            ma.cmp(mb)
                .then(a.pouching_start_dt.cmp(&b.pouching_start_dt))
                .then(a.lot_number.cmp(&b.lot_number))
        });

        let mut conflicts = Vec::new();
        for (index, (machine, order)) in scheduled.iter().enumerate() {
            for (other_machine, other) in &scheduled[index + 1..] {
                // 已排序：之後的工單開始時間都不早於此張
                if other_machine != machine || other.pouching_start_dt >= order.pouching_end_dt {
                    break;
                }
                conflicts.push(OverlapConflict {
                    machine: machine.to_string(),
                    first: order.lot_number,
                    second: other.lot_number,
                });
            }
        }
        conflicts
    }

    /// `candidate` 與同機台其他工單是否重疊，回傳第一張衝突工單
    pub fn first_conflict<'a>(
        candidate: &WorkOrder,
        others: impl IntoIterator<Item = &'a WorkOrder>,
    ) -> Option<&'a WorkOrder> {
        candidate.machine.as_deref()?;
        others.into_iter().find(|other| {
            other.lot_number != candidate.lot_number
                && other.machine == candidate.machine
                && candidate.overlaps(other)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn order(lot: u64, machine: &str, start: u32, end: u32) -> WorkOrder {
        WorkOrder::new(lot, format!("L{lot}"), "P".to_string()).assigned(machine, at(start), at(end))
    }

    #[test]
    fn test_detect_overlaps() {
        let orders = vec![
            order(1, "line5", 8, 12),
            order(2, "line5", 12, 16),
            order(3, "line5", 10, 13),
            order(4, "line6", 9, 11),
            WorkOrder::new(5, "L5".to_string(), "P".to_string()),
        ];

        let conflicts = OverlapDetector::detect(&orders);

        assert_eq!(
            conflicts,
            vec![
                OverlapConflict { machine: "line5".to_string(), first: 1, second: 3 },
                OverlapConflict { machine: "line5".to_string(), first: 3, second: 2 },
            ]
        );
    }

    #[test]
    fn test_adjacent_orders_do_not_overlap() {
        let orders = vec![order(1, "line5", 8, 12), order(2, "line5", 12, 16)];
        assert!(OverlapDetector::detect(&orders).is_empty());
    }

    #[test]
    fn test_first_conflict_ignores_self() {
        let orders = vec![order(1, "line5", 8, 12), order(2, "line6", 8, 12)];

        let moved = order(1, "line5", 9, 11);
        assert!(OverlapDetector::first_conflict(&moved, &orders).is_none());

        let onto_line6 = order(1, "line6", 9, 11);
        assert_eq!(
            OverlapDetector::first_conflict(&onto_line6, &orders).map(|o| o.lot_number),
            Some(2)
        );
    }
}
