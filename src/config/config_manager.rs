// ==========================================
// S&OP 运营计划引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: JSON 对象文件 (key-value, global scope)
// ==========================================

use crate::config::planning_config::PlanningConfigReader;
use crate::domain::types::{DistributionRule, EqualPriorityRule};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    FileReadError { path: String, message: String },

    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    #[error("配置文件顶层必须是 JSON 对象")]
    NotAnObject,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: HashMap<String, String>,
}

impl ConfigManager {
    /// 创建空配置（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - path: 配置文件路径，内容为 `{ "key": value, ... }`
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: JsonValue =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let object = parsed.as_object().ok_or(ConfigError::NotAnObject)?;

        let values = object
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect();

        Ok(Self { values })
    }

    /// 覆写单个配置项
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// 读取配置值（global scope）
    ///
    /// # 返回
    /// - Some(&str): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// 读取配置值，不存在时返回默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_global_config_value(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_or_default<T: std::str::FromStr + Copy>(&self, key: &str, default: T) -> T
    where
        T: std::fmt::Display,
    {
        let raw = self.get_config_or_default(key, &default.to_string());
        match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(key = key, value = %raw, "配置值无法解析，使用默认值");
                default
            }
        }
    }
}

// ==========================================
// PlanningConfigReader trait 实现
// ==========================================
impl PlanningConfigReader for ConfigManager {
    fn get_distribution_rule(&self) -> DistributionRule {
        let raw = self.get_config_or_default(config_keys::DISTRIBUTION_RULE, "WEIGHTED_BY_DAYS");
        match raw.to_uppercase().as_str() {
            "UNIFORM" => DistributionRule::Uniform,
            "WEIGHTED_BY_DAYS" => DistributionRule::WeightedByDays,
            "EXPLICIT_WEIGHTS" => {
                let weights_raw = self.get_config_or_default(config_keys::EXPLICIT_WEIGHTS, "[]");
                match serde_json::from_str::<Vec<f64>>(&weights_raw) {
                    Ok(weights) if !weights.is_empty() => DistributionRule::ExplicitWeights(weights),
                    _ => {
                        warn!(value = %weights_raw, "explicit_weights 无效，回退为 WEIGHTED_BY_DAYS");
                        DistributionRule::WeightedByDays
                    }
                }
            }
            other => {
                warn!(value = other, "未知的 distribution_rule，回退为 WEIGHTED_BY_DAYS");
                DistributionRule::WeightedByDays
            }
        }
    }

    fn get_equal_priority_rule(&self) -> EqualPriorityRule {
        let raw = self.get_config_or_default(config_keys::EQUAL_PRIORITY_RULE, "PRO_RATA");
        match raw.to_uppercase().as_str() {
            "INPUT_ORDER" => EqualPriorityRule::InputOrder,
            "PRO_RATA" => EqualPriorityRule::ProRata,
            other => {
                warn!(value = other, "未知的 equal_priority_rule，回退为 PRO_RATA");
                EqualPriorityRule::ProRata
            }
        }
    }

    fn get_coverage_window_buckets(&self) -> usize {
        self.parse_or_default(config_keys::COVERAGE_WINDOW_BUCKETS, 4usize)
            .max(1)
    }

    fn get_low_coverage_threshold(&self) -> f64 {
        self.parse_or_default(config_keys::LOW_COVERAGE_THRESHOLD_BUCKETS, 1.0f64)
    }

    fn get_abc_thresholds(&self) -> (f64, f64) {
        let a = self.parse_or_default(config_keys::ABC_A_THRESHOLD, 0.80f64);
        let b = self.parse_or_default(config_keys::ABC_B_THRESHOLD, 0.95f64);
        if a > b {
            warn!(a, b, "ABC 阈值 A > B，使用默认值");
            return (0.80, 0.95);
        }
        (a, b)
    }

    fn get_max_drp_iterations(&self) -> usize {
        self.parse_or_default(config_keys::MAX_DRP_ITERATIONS, 0usize)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 时间粒度转换
    pub const DISTRIBUTION_RULE: &str = "distribution_rule";
    pub const EXPLICIT_WEIGHTS: &str = "explicit_weights"; // JSON 数组

    // 需求配给
    pub const EQUAL_PRIORITY_RULE: &str = "equal_priority_rule";

    // 覆盖度
    pub const COVERAGE_WINDOW_BUCKETS: &str = "coverage_window_buckets";
    pub const LOW_COVERAGE_THRESHOLD_BUCKETS: &str = "low_coverage_threshold_buckets";

    // ABC 分类
    pub const ABC_A_THRESHOLD: &str = "abc_a_threshold";
    pub const ABC_B_THRESHOLD: &str = "abc_b_threshold";

    // DRP 迭代上限（0 = 计划期长度 + 1）
    pub const MAX_DRP_ITERATIONS: &str = "max_drp_iterations";
}
