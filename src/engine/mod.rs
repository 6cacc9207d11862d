// ==========================================
// S&OP 运营计划引擎 - 引擎层
// ==========================================
// 职责: 库存投影、需求配给、DRP 补货等业务规则
// 依赖顺序: temporal / shelf_life → allocator → projector → drp
//           → risk → orchestrator → scenario
// 红线: 引擎不做 I/O，所有输入在运行前物化
// ==========================================

pub mod allocator;
pub mod drp;
pub mod orchestrator;
pub mod projector;
pub mod risk;
pub mod scenario;
pub mod shelf_life;
pub mod temporal;

// 重导出核心引擎
pub use allocator::DemandAllocator;
pub use drp::{KeyPlan, ReplenishmentPlanner};
pub use orchestrator::{PlanningInput, PlanningOrchestrator, PlanningRun};
pub use projector::{InventoryProjector, KeyInput, KeyProjection};
pub use risk::{AbcRecord, DrpMetrics, RiskEngine, RowRisk};
pub use scenario::{ScenarioRunner, ScenarioSummary};
pub use shelf_life::{Batch, BatchDraw, BatchLedger, ShelfLifeSplit, ShelfLifeTracker};
pub use temporal::TemporalConverter;
