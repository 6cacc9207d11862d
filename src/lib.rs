// ==========================================
// S&OP 运营计划引擎 - 核心库
// ==========================================
// 职责: 滚动计划期内的库存投影、DRP 补货、短缺时的需求配给
// 系统定位: 决策支持系统 (计划员最终确认)
// 红线: 每次计划运行是输入与策略的纯函数，不跨运行保存状态
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 统一错误类型
pub mod error;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 报表层 - 结果输出
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AbcClass, DistributionRule, EqualPriorityRule, Granularity, Qty, RiskLevel, SupplyType,
};

// 领域实体
pub use domain::{
    Allocation, AllocationDetail, Calendar, Coverage, DemandLine, PlanningKey, Policy,
    PolicyTable, ProjectionRow, ReplenishmentOrder, Series, SupplyRecord, TimeBucket,
};

// 引擎
pub use engine::{
    DemandAllocator, InventoryProjector, PlanningInput, PlanningOrchestrator, PlanningRun,
    ReplenishmentPlanner, RiskEngine, ScenarioRunner, ShelfLifeTracker, TemporalConverter,
};

// 错误
pub use error::{IssueKind, PlanIssue, PlanningError, PlanningResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "S&OP 运营计划引擎";
