// ==========================================
// S&OP 运营计划引擎 - 报表层
// ==========================================
// 职责: 计划运行结果输出（投影表 / 订单表 / 配给明细 / 问题表）
// ==========================================

pub mod csv_writer;

pub use csv_writer::{ReportError, ReportResult, ReportWriter};
