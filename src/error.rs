// ==========================================
// S&OP 运营计划引擎 - 统一错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================
// 传播规则:
// - 日历级错误 (粒度/日历不连续) 整个计划运行失败
// - 单行数据错误 (数量/策略缺失) 只拒绝受影响的计划单元
// - 内部不变式违反 (配给不一致/收敛违反) 一律视为缺陷,运行失败
// ==========================================

use crate::domain::planning::PlanningKey;
use crate::domain::types::{Granularity, Qty};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 计划引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    // ===== 日历级错误（运行致命） =====
    #[error("无效的粒度转换: from={from} to={to}")]
    InvalidGranularity { from: Granularity, to: Granularity },

    #[error("日历不连续 (position={position}): {message}")]
    NonContiguousCalendar { position: usize, message: String },

    // ===== 单行数据错误（按计划单元隔离） =====
    #[error("无效数量 (key={key}, bucket={bucket:?}, field={field}): {value}")]
    InvalidQuantity {
        key: String,
        bucket: Option<usize>,
        field: String,
        value: f64,
    },

    #[error("策略缺失 (key={key}): 缺少字段 {field}")]
    PolicyMissing { key: String, field: String },

    // ===== 内部缺陷（运行致命） =====
    #[error("配给不一致 (key={key}, bucket={bucket}): expected={expected}, actual={actual}")]
    AllocationInconsistency {
        key: String,
        bucket: usize,
        expected: Qty,
        actual: Qty,
    },

    #[error("DRP 收敛违反 (key={key}, bucket={bucket}, iteration={iteration}): {message}")]
    ConvergenceViolation {
        key: String,
        bucket: usize,
        iteration: usize,
        message: String,
    },
}

impl PlanningError {
    /// 构造数量错误
    pub fn invalid_quantity(
        key: &PlanningKey,
        bucket: Option<usize>,
        field: &str,
        value: f64,
    ) -> Self {
        PlanningError::InvalidQuantity {
            key: key.to_string(),
            bucket,
            field: field.to_string(),
            value,
        }
    }

    /// 构造策略缺失错误
    pub fn policy_missing(key: &PlanningKey, field: &str) -> Self {
        PlanningError::PolicyMissing {
            key: key.to_string(),
            field: field.to_string(),
        }
    }

    /// 错误分类（用于问题表）
    pub fn kind(&self) -> IssueKind {
        match self {
            PlanningError::InvalidGranularity { .. } => IssueKind::InvalidGranularity,
            PlanningError::NonContiguousCalendar { .. } => IssueKind::NonContiguousCalendar,
            PlanningError::InvalidQuantity { .. } => IssueKind::InvalidQuantity,
            PlanningError::PolicyMissing { .. } => IssueKind::PolicyMissing,
            PlanningError::AllocationInconsistency { .. } => IssueKind::AllocationInconsistency,
            PlanningError::ConvergenceViolation { .. } => IssueKind::ConvergenceViolation,
        }
    }

    /// 是否导致整个计划运行失败
    pub fn is_run_fatal(&self) -> bool {
        !matches!(
            self,
            PlanningError::InvalidQuantity { .. } | PlanningError::PolicyMissing { .. }
        )
    }

    /// 出错的计划单元（若有）
    pub fn key(&self) -> Option<&str> {
        match self {
            PlanningError::InvalidQuantity { key, .. }
            | PlanningError::PolicyMissing { key, .. }
            | PlanningError::AllocationInconsistency { key, .. }
            | PlanningError::ConvergenceViolation { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    /// 出错的时间桶（若有）
    pub fn bucket(&self) -> Option<usize> {
        match self {
            PlanningError::InvalidQuantity { bucket, .. } => *bucket,
            PlanningError::AllocationInconsistency { bucket, .. }
            | PlanningError::ConvergenceViolation { bucket, .. } => Some(*bucket),
            PlanningError::NonContiguousCalendar { position, .. } => Some(*position),
            _ => None,
        }
    }
}

// ==========================================
// IssueKind - 问题分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    InvalidGranularity,
    NonContiguousCalendar,
    InvalidQuantity,
    PolicyMissing,
    AllocationInconsistency,
    ConvergenceViolation,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::InvalidGranularity => write!(f, "INVALID_GRANULARITY"),
            IssueKind::NonContiguousCalendar => write!(f, "NON_CONTIGUOUS_CALENDAR"),
            IssueKind::InvalidQuantity => write!(f, "INVALID_QUANTITY"),
            IssueKind::PolicyMissing => write!(f, "POLICY_MISSING"),
            IssueKind::AllocationInconsistency => write!(f, "ALLOCATION_INCONSISTENCY"),
            IssueKind::ConvergenceViolation => write!(f, "CONVERGENCE_VIOLATION"),
        }
    }
}

// ==========================================
// PlanIssue - 问题表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanIssue {
    pub key: Option<String>,
    pub bucket: Option<usize>,
    pub kind: IssueKind,
    pub message: String,
}

impl From<&PlanningError> for PlanIssue {
    fn from(err: &PlanningError) -> Self {
        PlanIssue {
            key: err.key().map(|k| k.to_string()),
            bucket: err.bucket(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
