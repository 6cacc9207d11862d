// ==========================================
// S&OP 运营计划引擎 - 风险分析引擎
// ==========================================
// 职责: 投影行风险标记、DRP 汇总指标、ABC 分类
// 输入: 投影行 + 策略 + 订单
// 输出: RowRisk / DrpMetrics / AbcRecord
// ==========================================
// 风险等级:
// - RED: 缺货（约束需求 < 总需求）
// - ORANGE: 期末低于安全库存
// - YELLOW: 覆盖度低于阈值，或超过最高库存
// - GREEN: 其他
// ==========================================

use crate::domain::order::ReplenishmentOrder;
use crate::domain::planning::PlanningKey;
use crate::domain::policy::Policy;
use crate::domain::projection::ProjectionRow;
use crate::domain::types::{AbcClass, Qty, RiskLevel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RowRisk - 投影行风险
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRisk {
    pub key: PlanningKey,
    pub bucket: usize,
    pub bucket_start: NaiveDate,
    pub stockout_risk: bool,
    pub below_safety: bool,
    pub low_coverage: bool,
    pub overstock: bool,
    pub level: RiskLevel,
}

// ==========================================
// DrpMetrics - 计划汇总指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrpMetrics {
    pub keys_planned: usize,
    pub keys_rejected: usize,
    pub total_orders: usize,
    pub total_order_quantity: Qty,
    pub past_due_orders: usize,
    pub avg_service_level: f64, // %
    pub stockout_periods: usize,
    pub below_safety_periods: usize,
    pub total_expired_waste: Qty,
}

// ==========================================
// AbcRecord - ABC 分类结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcRecord {
    pub key: PlanningKey,
    pub total_demand: Qty,
    pub share: f64,
    pub cumulative_share: f64,
    pub class: AbcClass,
}

// ==========================================
// RiskEngine - 风险分析引擎
// ==========================================
pub struct RiskEngine {
    low_coverage_threshold: f64,
}

impl RiskEngine {
    pub fn new(low_coverage_threshold: f64) -> Self {
        Self {
            low_coverage_threshold,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 评估单行风险
    pub fn assess_row(&self, row: &ProjectionRow, policy: &Policy) -> RowRisk {
        let stockout_risk = row.constrained_demand < row.total_demand;
        let below_safety = row.ending < policy.safety_stock;
        let low_coverage = row.coverage.is_below(self.low_coverage_threshold);
        let overstock = policy.max_stock.map_or(false, |max| row.ending > max);

        let level = if stockout_risk {
            RiskLevel::Red
        } else if below_safety {
            RiskLevel::Orange
        } else if low_coverage || overstock {
            RiskLevel::Yellow
        } else {
            RiskLevel::Green
        };

        RowRisk {
            key: row.key.clone(),
            bucket: row.bucket,
            bucket_start: row.bucket_start,
            stockout_risk,
            below_safety,
            low_coverage,
            overstock,
            level,
        }
    }

    /// 评估一个计划单元的全部投影行
    pub fn assess(&self, rows: &[ProjectionRow], policy: &Policy) -> Vec<RowRisk> {
        rows.iter().map(|r| self.assess_row(r, policy)).collect()
    }

    /// 汇总指标
    ///
    /// # 参数
    /// - `rows`: 全部投影行
    /// - `orders`: 全部补货订单
    /// - `risks`: 全部行风险
    /// - `keys_planned`: 成功计划的计划单元数
    /// - `keys_rejected`: 被拒绝的计划单元数
    pub fn metrics(
        &self,
        rows: &[ProjectionRow],
        orders: &[ReplenishmentOrder],
        risks: &[RowRisk],
        keys_planned: usize,
        keys_rejected: usize,
    ) -> DrpMetrics {
        let avg_service_level = if rows.is_empty() {
            100.0
        } else {
            rows.iter().map(|r| r.service_level_pct()).sum::<f64>() / rows.len() as f64
        };

        DrpMetrics {
            keys_planned,
            keys_rejected,
            total_orders: orders.len(),
            total_order_quantity: orders.iter().map(|o| o.quantity).sum(),
            past_due_orders: orders.iter().filter(|o| o.past_due_issue).count(),
            avg_service_level,
            stockout_periods: risks.iter().filter(|r| r.stockout_risk).count(),
            below_safety_periods: risks.iter().filter(|r| r.below_safety).count(),
            total_expired_waste: rows.iter().map(|r| r.expired_waste).sum(),
        }
    }

    /// ABC 分类（按总需求降序，同量按计划单元排序）
    ///
    /// 累计占比（不含自身）低于 A 阈值为 A，低于 B 阈值为 B，其余为 C。
    /// 总需求为 0 时全部为 C。
    pub fn classify_abc(
        &self,
        totals: &[(PlanningKey, Qty)],
        a_threshold: f64,
        b_threshold: f64,
    ) -> Vec<AbcRecord> {
        let mut sorted: Vec<&(PlanningKey, Qty)> = totals.iter().collect();
        sorted.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(&y.0)));

        let grand_total: Qty = totals.iter().map(|(_, q)| q).sum();
        let mut cumulative_qty: Qty = 0;

        sorted
            .into_iter()
            .map(|(key, total)| {
                let ratio = |q: Qty| {
                    if grand_total > 0 {
                        q as f64 / grand_total as f64
                    } else {
                        0.0
                    }
                };
                let before = ratio(cumulative_qty);
                let class = if grand_total <= 0 {
                    AbcClass::C
                } else if before < a_threshold {
                    AbcClass::A
                } else if before < b_threshold {
                    AbcClass::B
                } else {
                    AbcClass::C
                };
                cumulative_qty += *total;
                AbcRecord {
                    key: key.clone(),
                    total_demand: *total,
                    share: ratio(*total),
                    cumulative_share: ratio(cumulative_qty),
                    class,
                }
            })
            .collect()
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}
