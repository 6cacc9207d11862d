// ==========================================
// S&OP 运营计划引擎 - 领域类型定义
// ==========================================
// 数量口径: 整数件数 (Qty = i64)，守恒校验精确到件
// 枚举序列化: SCREAMING_SNAKE_CASE (与输入输出表一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 数量（整件）
pub type Qty = i64;

// ==========================================
// 时间粒度 (Granularity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Monthly, // 月
    Weekly,  // 周
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Monthly => write!(f, "MONTHLY"),
            Granularity::Weekly => write!(f, "WEEKLY"),
        }
    }
}

impl Granularity {
    /// 从字符串解析粒度（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MONTHLY" | "MONTH" | "M" => Some(Granularity::Monthly),
            "WEEKLY" | "WEEK" | "W" => Some(Granularity::Weekly),
            _ => None,
        }
    }
}

// ==========================================
// 供应类型 (Supply Type)
// ==========================================
// 红线: 在途 (IN_TRANSIT) 固定在到货桶，不可提前
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyType {
    OnHand,         // 现有库存（期初）
    InTransit,      // 在途
    Planned,        // 已计划到货
    PoolAllocation, // 共享供应池分配
}

impl fmt::Display for SupplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyType::OnHand => write!(f, "ON_HAND"),
            SupplyType::InTransit => write!(f, "IN_TRANSIT"),
            SupplyType::Planned => write!(f, "PLANNED"),
            SupplyType::PoolAllocation => write!(f, "POOL_ALLOCATION"),
        }
    }
}

impl SupplyType {
    /// 从字符串解析供应类型
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ON_HAND" | "ONHAND" => Some(SupplyType::OnHand),
            "IN_TRANSIT" | "INTRANSIT" => Some(SupplyType::InTransit),
            "PLANNED" | "PLANNED_RECEIPT" => Some(SupplyType::Planned),
            "POOL_ALLOCATION" => Some(SupplyType::PoolAllocation),
            _ => None,
        }
    }
}

// ==========================================
// 月→周 分摊规则 (Distribution Rule)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "rule", content = "weights")]
pub enum DistributionRule {
    /// 每个重叠周等分
    Uniform,
    /// 按周覆盖该月的天数加权（默认）
    WeightedByDays,
    /// 显式权重：第 k 个重叠周取 weights[k]，缺省位置权重为 0
    ExplicitWeights(Vec<f64>),
}

impl Default for DistributionRule {
    fn default() -> Self {
        DistributionRule::WeightedByDays
    }
}

impl fmt::Display for DistributionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionRule::Uniform => write!(f, "UNIFORM"),
            DistributionRule::WeightedByDays => write!(f, "WEIGHTED_BY_DAYS"),
            DistributionRule::ExplicitWeights(_) => write!(f, "EXPLICIT_WEIGHTS"),
        }
    }
}

// ==========================================
// 同优先级配给规则 (Equal Priority Rule)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EqualPriorityRule {
    ProRata,    // 按需求量比例分摊（默认）
    InputOrder, // 按输入顺序先到先得
}

impl Default for EqualPriorityRule {
    fn default() -> Self {
        EqualPriorityRule::ProRata
    }
}

impl fmt::Display for EqualPriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EqualPriorityRule::ProRata => write!(f, "PRO_RATA"),
            EqualPriorityRule::InputOrder => write!(f, "INPUT_ORDER"),
        }
    }
}

// ==========================================
// 风险等级 (Risk Level)
// ==========================================
// 顺序: Green < Yellow < Orange < Red
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Green,  // 正常
    Yellow, // 覆盖偏低 / 超储
    Orange, // 低于安全库存
    Red,    // 缺货
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Green => write!(f, "GREEN"),
            RiskLevel::Yellow => write!(f, "YELLOW"),
            RiskLevel::Orange => write!(f, "ORANGE"),
            RiskLevel::Red => write!(f, "RED"),
        }
    }
}

// ==========================================
// ABC 分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbcClass::A => write!(f, "A"),
            AbcClass::B => write!(f, "B"),
            AbcClass::C => write!(f, "C"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_type_parse_accepts_spec_spellings() {
        assert_eq!(SupplyType::parse("on-hand"), Some(SupplyType::OnHand));
        assert_eq!(SupplyType::parse("IN_TRANSIT"), Some(SupplyType::InTransit));
        assert_eq!(SupplyType::parse("planned"), Some(SupplyType::Planned));
        assert_eq!(SupplyType::parse("backorder"), None);
    }

    #[test]
    fn test_distribution_rule_serde_roundtrip() {
        let rule = DistributionRule::ExplicitWeights(vec![1.0, 2.0]);
        let json = serde_json::to_string(&rule).unwrap();
        let back: DistributionRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
        assert_eq!(DistributionRule::default(), DistributionRule::WeightedByDays);
    }
}
