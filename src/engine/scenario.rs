// ==========================================
// S&OP 运营计划引擎 - 情景模拟
// ==========================================
// 职责: 以不同安全库存/再订货点倍数重跑完整计划并对比
// 红线: 每个情景是独立的纯计算，互不影响
// ==========================================

use crate::config::{PlanningConfig, ScenarioProfile};
use crate::domain::policy::Policy;
use crate::domain::types::Qty;
use crate::engine::orchestrator::{PlanningInput, PlanningOrchestrator};
use crate::error::PlanningResult;
use serde::{Deserialize, Serialize};
use tracing::info;

/// 单个情景的结果摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub safety_stock_multiplier: f64,
    pub reorder_point_multiplier: f64,
    pub service_level: f64,
    pub service_level_target: f64,
    pub target_met: bool,
    pub total_orders: usize,
    pub total_order_quantity: Qty,
    pub stockout_periods: usize,
    pub below_safety_periods: usize,
}

pub struct ScenarioRunner {
    orchestrator: PlanningOrchestrator,
}

impl ScenarioRunner {
    pub fn new(config: PlanningConfig) -> Self {
        Self {
            orchestrator: PlanningOrchestrator::new(config),
        }
    }

    /// 逐个情景运行完整计划
    ///
    /// # 返回
    /// 与 `profiles` 同序的情景摘要
    pub fn run(
        &self,
        input: &PlanningInput,
        profiles: &[ScenarioProfile],
    ) -> PlanningResult<Vec<ScenarioSummary>> {
        let mut summaries = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let run = self
                .orchestrator
                .run_with(input, |policy| scale_policy(&policy, profile))?;
            let metrics = &run.metrics;

            let summary = ScenarioSummary {
                scenario: profile.name.clone(),
                safety_stock_multiplier: profile.safety_stock_multiplier,
                reorder_point_multiplier: profile.reorder_point_multiplier,
                service_level: metrics.avg_service_level,
                service_level_target: profile.service_level_target,
                target_met: metrics.avg_service_level >= profile.service_level_target,
                total_orders: metrics.total_orders,
                total_order_quantity: metrics.total_order_quantity,
                stockout_periods: metrics.stockout_periods,
                below_safety_periods: metrics.below_safety_periods,
            };
            info!(
                scenario = %summary.scenario,
                service_level = summary.service_level,
                orders = summary.total_orders,
                target_met = summary.target_met,
                "情景运行完成"
            );
            summaries.push(summary);
        }

        Ok(summaries)
    }
}

/// 按情景倍数调整策略（向上取整到整件）
pub fn scale_policy(policy: &Policy, profile: &ScenarioProfile) -> Policy {
    let scale = |qty: Qty, multiplier: f64| -> Qty {
        if multiplier.is_finite() && multiplier >= 0.0 {
            (qty as f64 * multiplier).ceil() as Qty
        } else {
            qty
        }
    };

    Policy {
        safety_stock: scale(policy.safety_stock, profile.safety_stock_multiplier),
        reorder_point: scale(policy.reorder_point, profile.reorder_point_multiplier),
        ..policy.clone()
    }
}
