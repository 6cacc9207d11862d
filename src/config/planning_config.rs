// ==========================================
// S&OP 运营计划引擎 - 计划配置读取接口与快照
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 运行开始时取一次快照，作为不可变参数传入各组件
// ==========================================

use crate::domain::types::{DistributionRule, EqualPriorityRule};
use serde::{Deserialize, Serialize};

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 JSON 配置读取）
pub trait PlanningConfigReader: Send + Sync {
    /// 月→周分摊规则
    ///
    /// # 默认值
    /// - WEIGHTED_BY_DAYS
    fn get_distribution_rule(&self) -> DistributionRule;

    /// 同优先级配给规则
    ///
    /// # 默认值
    /// - PRO_RATA
    fn get_equal_priority_rule(&self) -> EqualPriorityRule;

    /// 覆盖度前瞻窗口（桶）
    ///
    /// # 默认值
    /// - 4
    fn get_coverage_window_buckets(&self) -> usize;

    /// 低覆盖阈值（桶）
    ///
    /// # 默认值
    /// - 1.0
    fn get_low_coverage_threshold(&self) -> f64;

    /// ABC 累计占比阈值 (A, B)
    ///
    /// # 默认值
    /// - (0.80, 0.95)
    fn get_abc_thresholds(&self) -> (f64, f64);

    /// DRP 最大迭代次数（0 = 计划期长度 + 1）
    fn get_max_drp_iterations(&self) -> usize;
}

// ==========================================
// PlanningConfig - 配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    pub distribution_rule: DistributionRule,
    pub equal_priority_rule: EqualPriorityRule,
    pub coverage_window_buckets: usize,
    pub low_coverage_threshold: f64,
    pub abc_a_threshold: f64,
    pub abc_b_threshold: f64,
    pub max_drp_iterations: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            distribution_rule: DistributionRule::WeightedByDays,
            equal_priority_rule: EqualPriorityRule::ProRata,
            coverage_window_buckets: 4,
            low_coverage_threshold: 1.0,
            abc_a_threshold: 0.80,
            abc_b_threshold: 0.95,
            max_drp_iterations: 0,
        }
    }
}

impl PlanningConfig {
    /// 从配置读取器取快照
    pub fn load<R: PlanningConfigReader + ?Sized>(reader: &R) -> Self {
        let (abc_a_threshold, abc_b_threshold) = reader.get_abc_thresholds();
        Self {
            distribution_rule: reader.get_distribution_rule(),
            equal_priority_rule: reader.get_equal_priority_rule(),
            coverage_window_buckets: reader.get_coverage_window_buckets(),
            low_coverage_threshold: reader.get_low_coverage_threshold(),
            abc_a_threshold,
            abc_b_threshold,
            max_drp_iterations: reader.get_max_drp_iterations(),
        }
    }

    /// 实际 DRP 迭代上限
    pub fn drp_iteration_limit(&self, horizon_len: usize) -> usize {
        if self.max_drp_iterations == 0 {
            horizon_len + 1
        } else {
            self.max_drp_iterations
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;

    #[test]
    fn test_snapshot_matches_default_when_config_empty() {
        let config = PlanningConfig::load(&ConfigManager::new());
        assert_eq!(config, PlanningConfig::default());
        assert_eq!(config.drp_iteration_limit(12), 13);
    }
}
