//! 髒標記追蹤：記錄需要重繪的機台列

use std::collections::BTreeSet;

/// 髒標記追蹤器
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_rows: BTreeSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記機台列為髒
    pub fn mark_dirty(&mut self, machine: &str) {
        if !self.dirty_rows.contains(machine) {
            self.dirty_rows.insert(machine.to_string());
        }
    }

    /// 檢查機台列是否為髒
    pub fn is_dirty(&self, machine: &str) -> bool {
        self.dirty_rows.contains(machine)
    }

    pub fn is_clean(&self) -> bool {
        self.dirty_rows.is_empty()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_rows.clear();
    }

    /// 取出所有髒機台列並清除標記
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dirty_rows).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_take() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_dirty("line6");
        tracker.mark_dirty("line5");
        tracker.mark_dirty("line6");

        assert!(tracker.is_dirty("line5"));
        assert!(!tracker.is_dirty("line7"));
        assert_eq!(tracker.take(), vec!["line5".to_string(), "line6".to_string()]);
        assert!(tracker.is_clean());
    }
}
