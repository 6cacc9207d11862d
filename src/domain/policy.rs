// ==========================================
// S&OP 运营计划引擎 - 补货策略领域模型
// ==========================================
// 策略表: 每个计划单元一行 (安全库存/再订货点/批量/最小订货量/提前期/保质期)
// 红线: 策略作为不可变参数显式传入各组件，不使用全局状态
// ==========================================

use crate::domain::planning::{to_qty, PlanningKey};
use crate::domain::types::Qty;
use crate::error::{PlanningError, PlanningResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// Policy - 已解析的补货策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub safety_stock: Qty,
    pub reorder_point: Qty,
    pub lot_size: Qty,
    pub min_order_qty: Qty,
    pub lead_time_buckets: usize,
    pub shelf_life_buckets: Option<usize>, // 最短剩余寿命要求（桶）
    pub max_stock: Option<Qty>,            // 超储判定线
    pub supply_pool: Option<String>,       // 共享供应池
}

impl Policy {
    /// 订货量取整: 向上取整到批量倍数，且不低于最小订货量
    pub fn round_order_quantity(&self, shortfall: Qty) -> Qty {
        if shortfall <= 0 {
            return 0;
        }
        let rounded = if self.lot_size > 1 {
            (shortfall + self.lot_size - 1) / self.lot_size * self.lot_size
        } else {
            shortfall
        };
        rounded.max(self.min_order_qty)
    }

    /// 补货目标水位 = 再订货点 + 安全库存
    pub fn target_level(&self) -> Qty {
        self.reorder_point + self.safety_stock
    }
}

// ==========================================
// PolicyRow - 策略输入行（字段可缺失）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRow {
    pub sku: String,
    pub location: String,
    pub safety_stock: Option<f64>,
    pub reorder_point: Option<f64>,
    pub lot_size: Option<f64>,
    pub min_order_qty: Option<f64>,
    pub lead_time_buckets: Option<f64>,
    pub shelf_life_buckets: Option<f64>,
    pub max_stock: Option<f64>,
    pub supply_pool: Option<String>,
}

impl PolicyRow {
    pub fn key(&self) -> PlanningKey {
        PlanningKey::new(&self.sku, &self.location)
    }

    /// 解析为 Policy
    ///
    /// # 错误
    /// - `PolicyMissing`: 必填字段缺失
    /// - `InvalidQuantity`: 字段为负或非有限值
    pub fn resolve(&self) -> PlanningResult<Policy> {
        let key = self.key();
        let required = |field: &str, value: Option<f64>| -> PlanningResult<Qty> {
            let v = value.ok_or_else(|| PlanningError::policy_missing(&key, field))?;
            to_qty(&key, None, field, v)
        };
        let optional = |field: &str, value: Option<f64>| -> PlanningResult<Option<Qty>> {
            value.map(|v| to_qty(&key, None, field, v)).transpose()
        };

        Ok(Policy {
            safety_stock: required("safety_stock", self.safety_stock)?,
            reorder_point: required("reorder_point", self.reorder_point)?,
            lot_size: required("lot_size", self.lot_size)?,
            min_order_qty: required("min_order_qty", self.min_order_qty)?,
            lead_time_buckets: required("lead_time_buckets", self.lead_time_buckets)? as usize,
            shelf_life_buckets: optional("shelf_life_buckets", self.shelf_life_buckets)?
                .map(|v| v as usize),
            max_stock: optional("max_stock", self.max_stock)?,
            supply_pool: self
                .supply_pool
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

// ==========================================
// PolicyTable - 策略表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    rows: HashMap<PlanningKey, PolicyRow>,
}

impl PolicyTable {
    pub fn new(rows: Vec<PolicyRow>) -> Self {
        let rows = rows.into_iter().map(|r| (r.key(), r)).collect();
        Self { rows }
    }

    /// 查找并解析某计划单元的策略
    pub fn policy_for(&self, key: &PlanningKey) -> PlanningResult<Policy> {
        match self.rows.get(key) {
            Some(row) => row.resolve(),
            None => Err(PlanningError::policy_missing(key, "*")),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &PlanningKey> {
        self.rows.keys()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
