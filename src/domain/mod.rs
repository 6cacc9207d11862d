// ==========================================
// S&OP 运营计划引擎 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含计算逻辑
// ==========================================

pub mod allocation;
pub mod calendar;
pub mod order;
pub mod planning;
pub mod policy;
pub mod projection;
pub mod types;

// 重导出核心实体
pub use allocation::{Allocation, AllocationDetail, LineAllocation};
pub use calendar::{Calendar, Series, TimeBucket};
pub use order::ReplenishmentOrder;
pub use planning::{DemandLine, DemandRow, PlanningKey, PoolSupplyRow, SupplyRecord, SupplyRow};
pub use policy::{Policy, PolicyRow, PolicyTable};
pub use projection::{Coverage, ProjectionRow};
pub use types::{
    AbcClass, DistributionRule, EqualPriorityRule, Granularity, Qty, RiskLevel, SupplyType,
};
