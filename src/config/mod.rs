// ==========================================
// S&OP 运营计划引擎 - 配置层
// ==========================================
// 职责: 系统配置管理,运行开始时生成不可变快照
// 存储: JSON 对象文件 (key-value)
// ==========================================

pub mod config_manager;
pub mod planning_config;
pub mod scenario_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager};
pub use planning_config::{PlanningConfig, PlanningConfigReader};
pub use scenario_profile::ScenarioProfile;
