//! 機台與機台族群

use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// 機台（格線上的一列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// 機台編號（例如 "5"）
    pub id: String,

    /// 簡稱，工單以此參照機台（例如 "line5"）
    pub short_name: String,

    /// 顯示名稱（例如 "Line 5"）
    pub name: String,

    /// 在族群內的固定列位置
    pub row: usize,

    /// 是否啟用
    pub active: bool,
}

impl Machine {
    pub fn new(id: String, short_name: String, name: String, row: usize) -> Self {
        Self {
            id,
            short_name,
            name,
            row,
            active: true,
        }
    }

    /// 依族群命名慣例由簡稱推導編號與顯示名稱
    pub fn from_short_name(family: &str, short_name: &str, row: usize) -> Self {
        let (prefix, label) = match family {
            "itrak" => ("line", "Line "),
            "dipstick" => ("dipstick", "Dipstick "),
            "swab" => ("swab", "Swab Poucher "),
            _ => ("", ""),
        };

        match short_name.strip_prefix(prefix) {
            Some(id) if !prefix.is_empty() && !id.is_empty() => Self::new(
                id.to_string(),
                short_name.to_string(),
                format!("{label}{id}"),
                row,
            ),
            _ => Self::new(
                short_name.to_string(),
                short_name.to_string(),
                short_name.to_string(),
                row,
            ),
        }
    }

    /// 建構器模式：設置啟用狀態
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// 機台族群（例如同一類包裝線），列順序固定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineFamily {
    pub name: String,
    machines: Vec<Machine>,
}

impl MachineFamily {
    /// 由機台簡稱依序建立族群，列位置即順序
    pub fn new(name: impl Into<String>, short_names: &[&str]) -> Result<Self> {
        let name = name.into();
        let machines = short_names
            .iter()
            .enumerate()
            .map(|(row, short_name)| Machine::from_short_name(&name, short_name, row))
            .collect();
        Self::from_machines(name, machines)
    }

    /// 由已建好的機台建立族群，檢查簡稱與列位置不得重複
    pub fn from_machines(name: impl Into<String>, machines: Vec<Machine>) -> Result<Self> {
        let name = name.into();
        for (index, machine) in machines.iter().enumerate() {
            let duplicate = machines[..index]
                .iter()
                .any(|m| m.short_name == machine.short_name || m.row == machine.row);
            if duplicate {
                return Err(GridError::Config(format!(
                    "機台族群 {name} 中機台 {} 重複",
                    machine.short_name
                )));
            }
        }
        Ok(Self { name, machines })
    }

    /// 依簡稱查找機台
    pub fn get(&self, short_name: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.short_name == short_name)
    }

    pub fn contains(&self, short_name: &str) -> bool {
        self.get(short_name).is_some()
    }

    /// 依列位置排序的機台
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// 格線列數
    pub fn row_count(&self) -> usize {
        self.machines.iter().map(|m| m.row + 1).max().unwrap_or(0)
    }
}

/// 機台族群登錄表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRegistry {
    families: Vec<MachineFamily>,
}

impl MachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入族群（同名族群會被取代）
    pub fn insert(&mut self, family: MachineFamily) {
        self.families.retain(|f| f.name != family.name);
        self.families.push(family);
    }

    pub fn family(&self, name: &str) -> Option<&MachineFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn families(&self) -> &[MachineFamily] {
        &self.families
    }

    /// 從機台設定 JSON 載入
    ///
    /// ```json
    /// { "itrak": { "line5": true, "line6": false } }
    /// ```
    ///
    /// 列位置依檔案中的順序，布林值為啟用狀態。
    pub fn from_json(json: &str) -> Result<Self> {
        let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut registry = Self::new();

        for (family_name, machines) in root {
            let entries = machines.as_object().ok_or_else(|| {
                GridError::Config(format!("機台族群 {family_name} 必須是物件"))
            })?;

            let mut list = Vec::with_capacity(entries.len());
            for (row, (short_name, active)) in entries.iter().enumerate() {
                let active = active.as_bool().ok_or_else(|| {
                    GridError::Config(format!("機台 {short_name} 的啟用狀態必須是布林值"))
                })?;
                list.push(Machine::from_short_name(&family_name, short_name, row).with_active(active));
            }

            registry.insert(MachineFamily::from_machines(family_name, list)?);
        }

        Ok(registry)
    }
}
