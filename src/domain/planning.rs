// ==========================================
// S&OP 运营计划引擎 - 需求/供应领域模型
// ==========================================
// 计划单元: SKU × 库位
// 输入行 (*Row): 外部采集方提供，按日期引用期间，数量为 f64
// 计划对象 (DemandLine / SupplyRecord): 归一化后按桶下标引用，数量为整件
// ==========================================

use crate::domain::types::{Qty, SupplyType};
use crate::error::{PlanningError, PlanningResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// PlanningKey - 计划单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanningKey {
    pub sku: String,      // 物料编码
    pub location: String, // 库位/仓库
}

impl PlanningKey {
    pub fn new(sku: &str, location: &str) -> Self {
        Self {
            sku: sku.to_string(),
            location: location.to_string(),
        }
    }
}

impl fmt::Display for PlanningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.sku, self.location)
    }
}

// ==========================================
// DemandLine - 需求行
// ==========================================
// 红线: 输入只读，constrained_quantity 仅由配给器写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub line_id: String,
    pub key: PlanningKey,
    pub bucket: usize,
    pub quantity: Qty,
    pub priority: Option<u32>, // 越小越先满足；None 排在所有显式优先级之后
    pub channel: String,
    pub constrained_quantity: Option<Qty>,
}

impl DemandLine {
    pub fn new(line_id: &str, key: PlanningKey, bucket: usize, quantity: Qty) -> Self {
        Self {
            line_id: line_id.to_string(),
            key,
            bucket,
            quantity,
            priority: None,
            channel: String::new(),
            constrained_quantity: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channel = channel.to_string();
        self
    }
}

// ==========================================
// SupplyRecord - 供应记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRecord {
    pub record_id: String,
    pub key: PlanningKey,
    pub bucket: usize, // 到货桶（在途固定，不可提前）
    pub quantity: Qty,
    pub supply_type: SupplyType,
    pub expiry_bucket: Option<i64>, // 到期桶位置；计划期外按桶长外推，早于计划起点为负
}

impl SupplyRecord {
    pub fn new(
        record_id: &str,
        key: PlanningKey,
        bucket: usize,
        quantity: Qty,
        supply_type: SupplyType,
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            key,
            bucket,
            quantity,
            supply_type,
            expiry_bucket: None,
        }
    }

    pub fn with_expiry(mut self, expiry_bucket: i64) -> Self {
        self.expiry_bucket = Some(expiry_bucket);
        self
    }
}

// ==========================================
// 输入行（外部采集方数据契约）
// ==========================================

/// 需求输入行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRow {
    pub sku: String,
    pub location: String,
    pub period: NaiveDate,
    pub quantity: f64,
    pub priority: Option<u32>,
    pub channel: String,
}

impl DemandRow {
    pub fn key(&self) -> PlanningKey {
        PlanningKey::new(&self.sku, &self.location)
    }
}

/// 供应输入行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRow {
    pub sku: String,
    pub location: String,
    pub period: NaiveDate,
    pub quantity: f64,
    pub supply_type: SupplyType,
    pub expiry: Option<NaiveDate>,
}

impl SupplyRow {
    pub fn key(&self) -> PlanningKey {
        PlanningKey::new(&self.sku, &self.location)
    }
}

/// 共享供应池输入行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSupplyRow {
    pub pool_id: String,
    pub period: NaiveDate,
    pub quantity: f64,
}

/// 外部数量 → 整件数量
///
/// 负数或非有限值返回 `InvalidQuantity`；其余四舍五入到整件。
pub fn to_qty(
    key: &PlanningKey,
    bucket: Option<usize>,
    field: &str,
    value: f64,
) -> PlanningResult<Qty> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::invalid_quantity(key, bucket, field, value));
    }
    Ok(value.round() as Qty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_qty_rejects_negative_and_non_finite() {
        let key = PlanningKey::new("SKU001", "DC1");
        assert_eq!(to_qty(&key, Some(0), "quantity", 12.4).unwrap(), 12);
        assert_eq!(to_qty(&key, Some(0), "quantity", 12.5).unwrap(), 13);
        assert!(to_qty(&key, Some(0), "quantity", -0.5).is_err());
        assert!(to_qty(&key, Some(0), "quantity", f64::INFINITY).is_err());
        assert!(to_qty(&key, None, "safety_stock", f64::NAN).is_err());
    }
}
