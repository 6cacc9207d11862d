// ==========================================
// S&OP 运营计划引擎 - 补货计划器 (DRP)
// ==========================================
// 职责: 基于投影生成分时段补货订单
// 输入: 计划单元输入 + 计划日历
// 输出: 最终投影 + 补货订单
// ==========================================
// 规则:
// 1) 触发: 不含新订单的净余额 (期初+到货−报废−总需求) < 再订货点
// 2) 缺口 = 再订货点 + 安全库存 − 净余额
// 3) 订货量向上取整到批量倍数，且不低于最小订货量
// 4) 到货桶 = 触发桶；下单桶 = 到货桶 − 提前期（早于计划起点时标记 past_due）
// 5) 订单计入到货后重新投影，直到无新触发（不动点）
// 红线: 迭代次数有上限；每轮期末库存单调不减，否则视为缺陷
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::calendar::Calendar;
use crate::domain::order::ReplenishmentOrder;
use crate::domain::policy::Policy;
use crate::domain::projection::ProjectionRow;
use crate::domain::types::Qty;
use crate::engine::projector::{InventoryProjector, KeyInput, KeyProjection};
use crate::error::{PlanningError, PlanningResult};
use serde::Serialize;
use tracing::{debug, instrument, warn};

// ==========================================
// KeyPlan - 单个计划单元的计划结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPlan {
    pub projection: KeyProjection,
    pub orders: Vec<ReplenishmentOrder>,
    pub iterations: usize,
}

// ==========================================
// ReplenishmentPlanner - 补货计划器
// ==========================================
pub struct ReplenishmentPlanner {
    projector: InventoryProjector,
    config: PlanningConfig,
}

impl ReplenishmentPlanner {
    pub fn new(config: &PlanningConfig) -> Self {
        Self {
            projector: InventoryProjector::new(config),
            config: config.clone(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为单个计划单元生成补货计划
    ///
    /// # 参数
    /// - `calendar`: 计划日历
    /// - `input`: 计划单元输入
    ///
    /// # 返回
    /// 含全部订单的最终投影与订单列表（按到货桶升序）
    ///
    /// # 错误
    /// - 投影错误原样传播
    /// - `ConvergenceViolation`: 期末库存回落或迭代超限
    #[instrument(skip(self, calendar, input), fields(key = %input.key))]
    pub fn plan(&self, calendar: &Calendar, input: &KeyInput) -> PlanningResult<KeyPlan> {
        let limit = self.config.drp_iteration_limit(calendar.len());
        let mut orders: Vec<ReplenishmentOrder> = Vec::new();
        let mut projection = self.projector.project(calendar, input, &orders)?;

        for iteration in 1..=limit {
            let order = match self.next_order(&projection.rows, &input.policy) {
                Some(order) => order,
                None => {
                    debug!(
                        iterations = iteration,
                        orders = orders.len(),
                        "DRP 收敛"
                    );
                    return Ok(KeyPlan {
                        projection,
                        orders,
                        iterations: iteration,
                    });
                }
            };

            if order.past_due_issue {
                warn!(
                    due_bucket = order.due_bucket,
                    order_bucket = order.order_bucket,
                    quantity = order.quantity,
                    "补货订单下单时点早于计划起点"
                );
            }
            orders.push(order);

            let next = self.projector.project(calendar, input, &orders)?;
            check_monotone(&projection, &next, iteration)?;
            projection = next;
        }

        // 上限内未收敛：最后一轮仍有触发
        match self.next_order(&projection.rows, &input.policy) {
            None => Ok(KeyPlan {
                projection,
                orders,
                iterations: limit + 1,
            }),
            Some(pending) => Err(PlanningError::ConvergenceViolation {
                key: input.key.to_string(),
                bucket: pending.due_bucket,
                iteration: limit,
                message: format!("迭代 {} 次后仍有补货触发", limit),
            }),
        }
    }

    /// 从投影中找出最早的补货触发并生成订单
    ///
    /// 只看最早触发桶：该桶订单到货后会改变后续所有桶的投影。
    pub fn next_order(&self, rows: &[ProjectionRow], policy: &Policy) -> Option<ReplenishmentOrder> {
        rows.iter().find_map(|row| order_for_row(row, policy))
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 单桶补货判定
pub fn order_for_row(row: &ProjectionRow, policy: &Policy) -> Option<ReplenishmentOrder> {
    let net: Qty = row.net_balance();
    if net >= policy.reorder_point {
        return None;
    }

    let shortfall = policy.target_level() - net;
    let quantity = policy.round_order_quantity(shortfall);
    if quantity <= 0 {
        return None;
    }

    Some(ReplenishmentOrder::new(
        row.key.clone(),
        row.bucket,
        policy.lead_time_buckets,
        shortfall,
        quantity,
        format!(
            "净余额 {} 低于再订货点 {}，补至 {}",
            net,
            policy.reorder_point,
            policy.target_level()
        ),
    ))
}

/// 单调性断言：新一轮每桶期末不低于上一轮
fn check_monotone(
    previous: &KeyProjection,
    next: &KeyProjection,
    iteration: usize,
) -> PlanningResult<()> {
    for (before, after) in previous.rows.iter().zip(next.rows.iter()) {
        if after.ending < before.ending {
            return Err(PlanningError::ConvergenceViolation {
                key: next.key.to_string(),
                bucket: after.bucket,
                iteration,
                message: format!("期末库存从 {} 回落到 {}", before.ending, after.ending),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::{DemandLine, PlanningKey, SupplyRecord};
    use crate::domain::types::SupplyType;
    use chrono::NaiveDate;

    fn key() -> PlanningKey {
        PlanningKey::new("SKU001", "DC1")
    }

    fn calendar(weeks: usize) -> Calendar {
        Calendar::weekly(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), weeks).unwrap()
    }

    fn policy(rp: Qty, ss: Qty, lot: Qty, moq: Qty, lead: usize) -> Policy {
        Policy {
            safety_stock: ss,
            reorder_point: rp,
            lot_size: lot,
            min_order_qty: moq,
            lead_time_buckets: lead,
            shelf_life_buckets: None,
            max_stock: None,
            supply_pool: None,
        }
    }

    #[test]
    fn test_lot_size_rounding_of_shortfall() {
        // 净余额 = 0 − 37 = −37，缺口 = 0 + 0 − (−37) = 37 → 批量 25 → 50
        let mut input = KeyInput::new(key(), policy(0, 0, 25, 10, 0));
        input.demand.push(DemandLine::new("D0", key(), 0, 37));

        let planner = ReplenishmentPlanner::new(&PlanningConfig::default());
        let plan = planner.plan(&calendar(1), &input).unwrap();
        assert_eq!(plan.orders.len(), 1);
        assert_eq!(plan.orders[0].shortfall, 37);
        assert_eq!(plan.orders[0].quantity, 50);
        assert_eq!(plan.projection.rows[0].ending, 13);
        assert_eq!(plan.projection.rows[0].constrained_demand, 37);
    }

    #[test]
    fn test_lead_time_offset_and_past_due() {
        let mut input = KeyInput::new(key(), policy(0, 0, 1, 0, 3));
        input
            .supply
            .push(SupplyRecord::new("OH", key(), 0, 100, SupplyType::OnHand));
        input.demand.push(DemandLine::new("D10", key(), 10, 120));
        input.demand.push(DemandLine::new("D1", key(), 1, 110));

        let planner = ReplenishmentPlanner::new(&PlanningConfig::default());
        let plan = planner.plan(&calendar(12), &input).unwrap();
        assert_eq!(plan.orders.len(), 2);

        let early = &plan.orders[0];
        assert_eq!(early.due_bucket, 1);
        assert_eq!(early.order_bucket, -2);
        assert!(early.past_due_issue);

        let late = &plan.orders[1];
        assert_eq!(late.due_bucket, 10);
        assert_eq!(late.order_bucket, 7);
        assert!(!late.past_due_issue);
    }

    #[test]
    fn test_order_eliminates_later_shortfalls() {
        // 单笔订单到货后覆盖后续桶，不再重复触发
        let mut input = KeyInput::new(key(), policy(10, 40, 1, 0, 0));
        for t in 0..4 {
            input.demand.push(DemandLine::new(&format!("D{}", t), key(), t, 10));
        }

        let planner = ReplenishmentPlanner::new(&PlanningConfig::default());
        let plan = planner.plan(&calendar(4), &input).unwrap();
        // 桶 0: 净 −10 → 补 60；桶 1..3 净余额 40, 30, 20 → 桶 3 净 20 ≥ 10 不触发
        assert_eq!(plan.orders.len(), 1);
        assert_eq!(plan.orders[0].quantity, 60);
        assert_eq!(plan.projection.endings(), vec![50, 40, 30, 20]);
    }

    #[test]
    fn test_no_trigger_means_no_orders() {
        let mut input = KeyInput::new(key(), policy(5, 5, 1, 0, 1));
        input
            .supply
            .push(SupplyRecord::new("OH", key(), 0, 100, SupplyType::OnHand));
        input.demand.push(DemandLine::new("D0", key(), 0, 10));

        let planner = ReplenishmentPlanner::new(&PlanningConfig::default());
        let plan = planner.plan(&calendar(3), &input).unwrap();
        assert!(plan.orders.is_empty());
        assert_eq!(plan.iterations, 1);
    }

    #[test]
    fn test_iteration_cap_reports_convergence_violation() {
        let mut input = KeyInput::new(key(), policy(0, 0, 1, 0, 0));
        for t in 0..3 {
            input.demand.push(DemandLine::new(&format!("D{}", t), key(), t, 10));
        }
        let config = PlanningConfig {
            max_drp_iterations: 1,
            ..PlanningConfig::default()
        };

        let planner = ReplenishmentPlanner::new(&config);
        assert!(matches!(
            planner.plan(&calendar(3), &input),
            Err(PlanningError::ConvergenceViolation { .. })
        ));
    }
}
