//! 格線配置模型

use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// 格線參數配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// 每小時欄數（必須整除 60）
    pub cols_per_hour: u32,

    /// 是否依欄寬量化分鐘
    /// - false: 捨去小時以下的部分，所有時間點對齊整點（預設）
    /// - true: 分鐘以欄寬向下取整，例如每小時 2 欄時 08:45 落在 08:30 欄
    pub minute_precision: bool,

    /// 重新指派時對同機台重疊工單的處理方式
    pub overlap_policy: OverlapPolicy,
}

impl GridConfig {
    /// 創建整點解析度的預設配置
    pub fn new() -> Self {
        Self {
            cols_per_hour: 1,
            minute_precision: false,
            overlap_policy: OverlapPolicy::Reject,
        }
    }

    /// 建構器模式：設置每小時欄數
    pub fn with_cols_per_hour(mut self, cols_per_hour: u32) -> Self {
        self.cols_per_hour = cols_per_hour;
        self
    }

    /// 建構器模式：啟用分鐘量化
    pub fn with_minute_precision(mut self, enabled: bool) -> Self {
        self.minute_precision = enabled;
        self
    }

    /// 建構器模式：設置重疊處理方式
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// 檢查配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.cols_per_hour == 0 || 60 % self.cols_per_hour != 0 {
            return Err(GridError::InvalidResolution(format!(
                "每小時欄數必須整除 60，實際為 {}",
                self.cols_per_hour
            )));
        }
        Ok(())
    }

    /// 從 JSON 載入並驗證
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 同機台區間重疊的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// 允許重疊，交由畫面呈現
    Allow,
    /// 拒絕會造成重疊的指派
    Reject,
}
