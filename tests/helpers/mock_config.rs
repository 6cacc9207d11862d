// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use sop_drp_planner::config::PlanningConfigReader;
use sop_drp_planner::domain::types::{DistributionRule, EqualPriorityRule};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub distribution_rule: DistributionRule,
    pub equal_priority_rule: EqualPriorityRule,
    pub coverage_window_buckets: usize,
    pub low_coverage_threshold: f64,
    pub abc_thresholds: (f64, f64),
    pub max_drp_iterations: usize,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            distribution_rule: DistributionRule::WeightedByDays,
            equal_priority_rule: EqualPriorityRule::ProRata,
            coverage_window_buckets: 4,
            low_coverage_threshold: 1.0,
            abc_thresholds: (0.80, 0.95),
            max_drp_iterations: 0,
        }
    }

    /// 同优先级先到先得
    pub fn input_order() -> Self {
        Self {
            equal_priority_rule: EqualPriorityRule::InputOrder,
            ..Self::default()
        }
    }
}

impl PlanningConfigReader for MockConfig {
    fn get_distribution_rule(&self) -> DistributionRule {
        self.distribution_rule.clone()
    }

    fn get_equal_priority_rule(&self) -> EqualPriorityRule {
        self.equal_priority_rule
    }

    fn get_coverage_window_buckets(&self) -> usize {
        self.coverage_window_buckets
    }

    fn get_low_coverage_threshold(&self) -> f64 {
        self.low_coverage_threshold
    }

    fn get_abc_thresholds(&self) -> (f64, f64) {
        self.abc_thresholds
    }

    fn get_max_drp_iterations(&self) -> usize {
        self.max_drp_iterations
    }
}
