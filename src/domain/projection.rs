// ==========================================
// S&OP 运营计划引擎 - 库存投影领域模型
// ==========================================
// 红线: ending = beginning + receipts − expired_waste − constrained_demand
// 红线: ending ≥ 0（短缺通过约束需求解决，不允许负库存）
// ==========================================

use crate::domain::planning::PlanningKey;
use crate::domain::types::Qty;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Coverage - 覆盖度（桶数）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coverage {
    /// 期末库存 ÷ 前瞻平均需求
    Buckets(f64),
    /// 前瞻平均需求为 0
    Unbounded,
}

impl Coverage {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Coverage::Buckets(v) => Some(*v),
            Coverage::Unbounded => None,
        }
    }

    /// 是否低于阈值（无界永不低于）
    pub fn is_below(&self, threshold: f64) -> bool {
        match self {
            Coverage::Buckets(v) => *v < threshold,
            Coverage::Unbounded => false,
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::Buckets(v) => write!(f, "{:.2}", v),
            Coverage::Unbounded => write!(f, "UNBOUNDED"),
        }
    }
}

// ==========================================
// ProjectionRow - 投影结果行（计划单元 × 桶）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub key: PlanningKey,
    pub bucket: usize,
    pub bucket_start: NaiveDate,

    // ===== 流量 =====
    pub beginning: Qty,          // 期初
    pub receipts: Qty,           // 本桶到货（在途 + 计划 + 池分配 + DRP 订单）
    pub expired_waste: Qty,      // 本桶过期报废
    pub total_demand: Qty,       // 总需求
    pub constrained_demand: Qty, // 约束后需求（实际满足）
    pub ending: Qty,             // 期末

    // ===== 指标 =====
    pub coverage: Coverage,
}

impl ProjectionRow {
    /// 未满足需求
    pub fn unmet_demand(&self) -> Qty {
        self.total_demand - self.constrained_demand
    }

    /// 不约束需求时的净余额（可为负）
    pub fn net_balance(&self) -> Qty {
        self.beginning + self.receipts - self.expired_waste - self.total_demand
    }

    /// 守恒校验：期初 + 到货 = 期末 + 约束需求 + 过期报废
    pub fn is_balanced(&self) -> bool {
        self.beginning + self.receipts
            == self.ending + self.constrained_demand + self.expired_waste
            && self.ending >= 0
    }

    /// 服务水平（%），无需求时为 100
    pub fn service_level_pct(&self) -> f64 {
        if self.total_demand == 0 {
            100.0
        } else {
            self.constrained_demand as f64 * 100.0 / self.total_demand as f64
        }
    }
}
