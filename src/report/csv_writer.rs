// ==========================================
// S&OP 运营计划引擎 - 报表输出
// ==========================================
// 职责: 计划运行结果 → CSV/JSON 文件
// 文件: projection.csv / orders.csv / allocation.csv / issues.csv /
//       abc.csv / metrics.json
// 红线: 先在内存中渲染全部文件，再写临时文件并逐个改名；
//       渲染失败时不触碰输出目录中已有的结果
// ==========================================

use crate::domain::calendar::Calendar;
use crate::engine::orchestrator::PlanningRun;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub const PROJECTION_FILE: &str = "projection.csv";
pub const ORDERS_FILE: &str = "orders.csv";
pub const ALLOCATION_FILE: &str = "allocation.csv";
pub const ISSUES_FILE: &str = "issues.csv";
pub const ABC_FILE: &str = "abc.csv";
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报表写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 渲染失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 渲染失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV 缓冲区刷新失败: {0}")]
    Buffer(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

// ==========================================
// 输出行
// ==========================================

#[derive(Debug, Serialize)]
struct ProjectionOut<'a> {
    sku: &'a str,
    location: &'a str,
    bucket: usize,
    bucket_start: NaiveDate,
    beginning: i64,
    receipts: i64,
    expired_waste: i64,
    total_demand: i64,
    constrained_demand: i64,
    unmet_demand: i64,
    ending: i64,
    coverage: String,
    risk_level: String,
}

#[derive(Debug, Serialize)]
struct OrderOut<'a> {
    sku: &'a str,
    location: &'a str,
    order_bucket: i64,
    order_date: Option<NaiveDate>,
    due_bucket: usize,
    due_date: Option<NaiveDate>,
    quantity: i64,
    shortfall: i64,
    past_due_issue: bool,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct AllocationOut<'a> {
    sku: &'a str,
    location: &'a str,
    bucket: usize,
    line_id: &'a str,
    channel: &'a str,
    priority: Option<u32>,
    requested: i64,
    constrained: i64,
    unmet: i64,
}

#[derive(Debug, Serialize)]
struct AbcOut<'a> {
    sku: &'a str,
    location: &'a str,
    total_demand: i64,
    share: f64,
    cumulative_share: f64,
    class: String,
}

#[derive(Debug, Serialize)]
struct MetricsOut<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    metrics: &'a crate::engine::risk::DrpMetrics,
}

// ==========================================
// ReportWriter - 报表输出器
// ==========================================
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// 写出全部报表
    ///
    /// # 返回
    /// 写出的文件路径
    pub fn write(&self, run: &PlanningRun, calendar: &Calendar) -> ReportResult<Vec<PathBuf>> {
        // 1. 内存渲染
        let rendered = render(run, calendar)?;

        // 2. 临时文件
        fs::create_dir_all(&self.output_dir)?;
        let mut staged = Vec::with_capacity(rendered.len());
        for (name, bytes) in &rendered {
            let tmp = self.output_dir.join(format!(".{}.{}.tmp", name, run.run_id));
            fs::write(&tmp, bytes)?;
            staged.push((tmp, self.output_dir.join(name)));
        }

        // 3. 改名
        let mut written = Vec::with_capacity(staged.len());
        for (tmp, target) in staged {
            fs::rename(&tmp, &target)?;
            written.push(target);
        }

        info!(
            output_dir = %self.output_dir.display(),
            files = written.len(),
            run_id = %run.run_id,
            "报表写出完成"
        );
        Ok(written)
    }
}

/// 渲染全部报表内容（文件名, 字节）
pub fn render(run: &PlanningRun, calendar: &Calendar) -> ReportResult<Vec<(&'static str, Vec<u8>)>> {
    let risk_levels: HashMap<(&str, &str, usize), String> = run
        .risks
        .iter()
        .map(|r| {
            (
                (r.key.sku.as_str(), r.key.location.as_str(), r.bucket),
                r.level.to_string(),
            )
        })
        .collect();

    let projection = to_csv(run.projections.iter().map(|r| ProjectionOut {
        sku: &r.key.sku,
        location: &r.key.location,
        bucket: r.bucket,
        bucket_start: r.bucket_start,
        beginning: r.beginning,
        receipts: r.receipts,
        expired_waste: r.expired_waste,
        total_demand: r.total_demand,
        constrained_demand: r.constrained_demand,
        unmet_demand: r.unmet_demand(),
        ending: r.ending,
        coverage: r.coverage.to_string(),
        risk_level: risk_levels
            .get(&(r.key.sku.as_str(), r.key.location.as_str(), r.bucket))
            .cloned()
            .unwrap_or_default(),
    }))?;

    let bucket_date = |index: i64| -> Option<NaiveDate> {
        usize::try_from(index)
            .ok()
            .and_then(|i| calendar.bucket(i))
            .map(|b| b.start)
    };
    let orders = to_csv(run.orders.iter().map(|o| OrderOut {
        sku: &o.key.sku,
        location: &o.key.location,
        order_bucket: o.order_bucket,
        order_date: bucket_date(o.order_bucket),
        due_bucket: o.due_bucket,
        due_date: bucket_date(o.due_bucket as i64),
        quantity: o.quantity,
        shortfall: o.shortfall,
        past_due_issue: o.past_due_issue,
        reason: &o.reason,
    }))?;

    let allocation = to_csv(run.allocations.iter().map(|a| AllocationOut {
        sku: &a.key.sku,
        location: &a.key.location,
        bucket: a.bucket,
        line_id: &a.line_id,
        channel: &a.channel,
        priority: a.priority,
        requested: a.requested,
        constrained: a.constrained,
        unmet: a.unmet,
    }))?;

    let issues = to_csv(run.issues.iter())?;

    let abc = to_csv(run.abc.iter().map(|r| AbcOut {
        sku: &r.key.sku,
        location: &r.key.location,
        total_demand: r.total_demand,
        share: r.share,
        cumulative_share: r.cumulative_share,
        class: r.class.to_string(),
    }))?;

    let metrics = serde_json::to_vec_pretty(&MetricsOut {
        run_id: run.run_id,
        generated_at: run.generated_at,
        metrics: &run.metrics,
    })?;

    Ok(vec![
        (PROJECTION_FILE, projection),
        (ORDERS_FILE, orders),
        (ALLOCATION_FILE, allocation),
        (ISSUES_FILE, issues),
        (ABC_FILE, abc),
        (METRICS_FILE, metrics),
    ])
}

fn to_csv<T, I>(rows: I) -> ReportResult<Vec<u8>>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| ReportError::Buffer(e.to_string()))
}
