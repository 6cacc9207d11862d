use serde::{Deserialize, Serialize};

/// 情景模拟参数（DRP 情景对比）
///
/// 倍数作用于每个计划单元的策略，结果向上取整到整件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// 情景名称（Conservative / Aggressive / Balanced / High_Service 或自定义）
    pub name: String,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 安全库存倍数
    #[serde(default = "default_multiplier")]
    pub safety_stock_multiplier: f64,

    /// 再订货点倍数
    #[serde(default = "default_multiplier")]
    pub reorder_point_multiplier: f64,

    /// 服务水平目标（%）
    #[serde(default = "default_service_level_target")]
    pub service_level_target: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_service_level_target() -> f64 {
    95.0
}

impl ScenarioProfile {
    fn preset(name: &str, ss: f64, target: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
            safety_stock_multiplier: ss,
            reorder_point_multiplier: 1.0,
            service_level_target: target,
        }
    }

    /// 预设情景
    pub fn presets() -> Vec<ScenarioProfile> {
        vec![
            Self::preset("Conservative", 1.5, 98.0, "更高安全库存"),
            Self::preset("Aggressive", 0.7, 92.0, "压降库存"),
            Self::preset("Balanced", 1.0, 95.0, "标准平衡"),
            Self::preset("High_Service", 2.0, 99.0, "最高服务水平"),
        ]
    }
}
