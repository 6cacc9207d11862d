// ==========================================
// S&OP 运营计划引擎 - 需求配给领域模型
// ==========================================
// 红线: sum(per_line_constrained) == total_constrained
//       == min(available, sum(requested))
// ==========================================

use crate::domain::planning::PlanningKey;
use crate::domain::types::Qty;
use serde::{Deserialize, Serialize};

/// 单行配给结果（下标对应输入顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAllocation {
    pub line_index: usize,
    pub requested: Qty,
    pub constrained: Qty,
    pub unmet: Qty,
}

/// 一次配给的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub total_constrained: Qty,
    pub lines: Vec<LineAllocation>, // 与输入需求行同序
}

impl Allocation {
    pub fn total_requested(&self) -> Qty {
        self.lines.iter().map(|l| l.requested).sum()
    }

    pub fn total_unmet(&self) -> Qty {
        self.lines.iter().map(|l| l.unmet).sum()
    }
}

/// 配给明细表行（计划单元 × 桶 × 需求行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDetail {
    pub key: PlanningKey,
    pub bucket: usize,
    pub line_id: String,
    pub channel: String,
    pub priority: Option<u32>,
    pub requested: Qty,
    pub constrained: Qty,
    pub unmet: Qty,
}
