// ==========================================
// S&OP 运营计划引擎 - 补货订单领域模型
// ==========================================
// 红线: order_bucket = due_bucket − lead_time_buckets
// 红线: quantity 为批量倍数且 ≥ 最小订货量
// 红线: 下单桶早于计划起点时仍输出，标记 past_due_issue
// ==========================================

use crate::domain::planning::PlanningKey;
use crate::domain::types::Qty;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentOrder {
    pub key: PlanningKey,
    pub order_bucket: i64, // 可为负（早于计划起点）
    pub due_bucket: usize,
    pub quantity: Qty,
    pub shortfall: Qty,       // 取整前缺口
    pub past_due_issue: bool, // 下单桶早于计划起点
    pub reason: String,
}

impl ReplenishmentOrder {
    pub fn new(
        key: PlanningKey,
        due_bucket: usize,
        lead_time_buckets: usize,
        shortfall: Qty,
        quantity: Qty,
        reason: String,
    ) -> Self {
        let order_bucket = due_bucket as i64 - lead_time_buckets as i64;
        Self {
            key,
            order_bucket,
            due_bucket,
            quantity,
            shortfall,
            past_due_issue: order_bucket < 0,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_time_offset() {
        let key = PlanningKey::new("SKU001", "DC1");
        let order = ReplenishmentOrder::new(key.clone(), 10, 3, 37, 50, String::new());
        assert_eq!(order.order_bucket, 7);
        assert!(!order.past_due_issue);

        let late = ReplenishmentOrder::new(key, 1, 3, 10, 25, String::new());
        assert_eq!(late.order_bucket, -2);
        assert!(late.past_due_issue);
    }
}
