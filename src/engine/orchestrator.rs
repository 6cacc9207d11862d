// ==========================================
// S&OP 运营计划引擎 - 计划编排器
// ==========================================
// 用途: 协调各引擎完成一次完整计划运行
// ==========================================
// 流程:
// 0) 日历校验 + 输入行日期定位到桶（日历级错误 → 运行失败）
// 1) 按计划单元归一化：策略解析、数量取整、需求粒度转换
//    （单行错误 → 仅拒绝该计划单元，记入问题表）
// 2) 共享供应池：每个 (池, 桶) 合并成员需求，一次性配给
// 3) 各计划单元并行执行 DRP（投影 + 补货），互不共享可变状态
// 4) 汇总：风险标记、DRP 指标、ABC 分类
// 红线: 运行要么完整返回，要么失败；不返回部分结果
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::allocation::AllocationDetail;
use crate::domain::calendar::{Calendar, Series};
use crate::domain::order::ReplenishmentOrder;
use crate::domain::planning::{
    to_qty, DemandLine, DemandRow, PlanningKey, PoolSupplyRow, SupplyRecord, SupplyRow,
};
use crate::domain::policy::{Policy, PolicyTable};
use crate::domain::projection::ProjectionRow;
use crate::domain::types::{Qty, SupplyType};
use crate::engine::allocator::DemandAllocator;
use crate::engine::drp::{KeyPlan, ReplenishmentPlanner};
use crate::engine::projector::KeyInput;
use crate::engine::risk::{AbcRecord, DrpMetrics, RiskEngine, RowRisk};
use crate::engine::temporal::TemporalConverter;
use crate::error::{PlanIssue, PlanningError, PlanningResult};
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PlanningInput - 计划运行输入（运行前已全部物化）
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanningInput {
    /// 计划日历
    pub calendar: Calendar,
    /// 需求数据所在日历（与计划日历不同时先做粒度转换）
    pub demand_calendar: Option<Calendar>,
    pub demand: Vec<DemandRow>,
    pub supply: Vec<SupplyRow>,
    pub pool_supply: Vec<PoolSupplyRow>,
    pub policies: PolicyTable,
}

impl PlanningInput {
    pub fn new(calendar: Calendar, policies: PolicyTable) -> Self {
        Self {
            calendar,
            demand_calendar: None,
            demand: Vec::new(),
            supply: Vec::new(),
            pool_supply: Vec::new(),
            policies,
        }
    }
}

// ==========================================
// PlanningRun - 计划运行结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct PlanningRun {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub projections: Vec<ProjectionRow>,     // 按 (计划单元, 桶) 排序
    pub orders: Vec<ReplenishmentOrder>,     // 按 (计划单元, 到货桶) 排序
    pub allocations: Vec<AllocationDetail>,  // 按 (计划单元, 桶, 输入顺序) 排序
    pub issues: Vec<PlanIssue>,
    pub risks: Vec<RowRisk>,
    pub metrics: DrpMetrics,
    pub abc: Vec<AbcRecord>,
}

impl PlanningRun {
    pub fn projection_for(&self, key: &PlanningKey) -> Vec<&ProjectionRow> {
        self.projections.iter().filter(|r| &r.key == key).collect()
    }

    pub fn orders_for(&self, key: &PlanningKey) -> Vec<&ReplenishmentOrder> {
        self.orders.iter().filter(|o| &o.key == key).collect()
    }
}

// 已定位到桶的输入行
struct BucketedDemand<'a> {
    bucket: usize,
    row: &'a DemandRow,
}

struct BucketedSupply<'a> {
    bucket: usize,
    expiry_bucket: Option<i64>,
    row: &'a SupplyRow,
}

// ==========================================
// PlanningOrchestrator - 计划编排器
// ==========================================
pub struct PlanningOrchestrator {
    config: PlanningConfig,
    converter: TemporalConverter,
    allocator: DemandAllocator,
    planner: ReplenishmentPlanner,
    risk: RiskEngine,
}

impl PlanningOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - config: 配置快照（整个运行期间不变）
    pub fn new(config: PlanningConfig) -> Self {
        Self {
            converter: TemporalConverter::new(config.distribution_rule.clone()),
            allocator: DemandAllocator::new(config.equal_priority_rule),
            planner: ReplenishmentPlanner::new(&config),
            risk: RiskEngine::new(config.low_coverage_threshold),
            config,
        }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// 执行计划运行
    pub fn run(&self, input: &PlanningInput) -> PlanningResult<PlanningRun> {
        self.run_with(input, |policy| policy)
    }

    /// 执行计划运行，策略解析后先经过 `adjust`（情景模拟使用）
    ///
    /// # 错误
    /// 日历级错误与内部缺陷直接返回；单行错误只进入问题表
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub fn run_with<F>(&self, input: &PlanningInput, adjust: F) -> PlanningResult<PlanningRun>
    where
        F: Fn(Policy) -> Policy,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let calendar = &input.calendar;

        info!(
            buckets = calendar.len(),
            granularity = %calendar.granularity(),
            demand_rows = input.demand.len(),
            supply_rows = input.supply.len(),
            policies = input.policies.len(),
            "开始计划运行"
        );

        // ==========================================
        // 步骤0: 日历校验与日期定位
        // ==========================================
        calendar.validate()?;
        let demand_calendar = match &input.demand_calendar {
            Some(c) if c != calendar => {
                c.validate()?;
                Some(c)
            }
            _ => None,
        };
        let demand = bucket_demand(input, demand_calendar.unwrap_or(calendar))?;
        let supply = bucket_supply(input)?;
        let pool_supply = bucket_pool_supply(input)?;

        // ==========================================
        // 步骤1: 按计划单元归一化
        // ==========================================
        let mut keys: BTreeSet<PlanningKey> = input.policies.keys().cloned().collect();
        keys.extend(demand.keys().cloned());
        keys.extend(supply.keys().cloned());

        let mut issues: Vec<PlanIssue> = Vec::new();
        let mut rejected: BTreeSet<PlanningKey> = BTreeSet::new();
        let mut inputs: Vec<KeyInput> = Vec::with_capacity(keys.len());

        for key in &keys {
            let result = self.normalise_key(
                key,
                input,
                demand_calendar,
                demand.get(key).map(Vec::as_slice).unwrap_or(&[]),
                supply.get(key).map(Vec::as_slice).unwrap_or(&[]),
                &adjust,
            );
            match result {
                Ok(key_input) => inputs.push(key_input),
                Err(e) => self.reject_or_fail(key, e, &mut issues, &mut rejected)?,
            }
        }

        // ==========================================
        // 步骤2: 共享供应池配给
        // ==========================================
        self.allocate_pools(calendar, &pool_supply, &mut inputs, &mut issues, &mut rejected)?;
        inputs.retain(|i| !rejected.contains(&i.key));

        // ==========================================
        // 步骤3: 并行执行各计划单元
        // ==========================================
        debug!(keys = inputs.len(), "并行执行计划单元");
        let results: Vec<PlanningResult<KeyPlan>> = inputs
            .par_iter()
            .map(|key_input| self.planner.plan(calendar, key_input))
            .collect();

        let mut plans: Vec<(&KeyInput, KeyPlan)> = Vec::with_capacity(inputs.len());
        for (key_input, result) in inputs.iter().zip(results) {
            match result {
                Ok(plan) => plans.push((key_input, plan)),
                Err(e) => self.reject_or_fail(&key_input.key, e, &mut issues, &mut rejected)?,
            }
        }

        // ==========================================
        // 步骤4: 汇总
        // ==========================================
        let mut projections = Vec::new();
        let mut orders = Vec::new();
        let mut allocations = Vec::new();
        let mut risks = Vec::new();
        let mut totals: Vec<(PlanningKey, Qty)> = Vec::with_capacity(plans.len());

        for (key_input, plan) in plans.iter() {
            risks.extend(self.risk.assess(&plan.projection.rows, &key_input.policy));
            totals.push((
                key_input.key.clone(),
                plan.projection.rows.iter().map(|r| r.total_demand).sum(),
            ));
            projections.extend(plan.projection.rows.iter().cloned());
            orders.extend(plan.orders.iter().cloned());
            allocations.extend(plan.projection.allocations.iter().cloned());
        }

        let metrics = self
            .risk
            .metrics(&projections, &orders, &risks, plans.len(), rejected.len());
        let abc = self.risk.classify_abc(
            &totals,
            self.config.abc_a_threshold,
            self.config.abc_b_threshold,
        );

        info!(
            keys_planned = metrics.keys_planned,
            keys_rejected = metrics.keys_rejected,
            orders = metrics.total_orders,
            order_quantity = metrics.total_order_quantity,
            past_due = metrics.past_due_orders,
            service_level = metrics.avg_service_level,
            issues = issues.len(),
            "计划运行完成"
        );

        Ok(PlanningRun {
            run_id,
            generated_at: Utc::now(),
            projections,
            orders,
            allocations,
            issues,
            risks,
            metrics,
            abc,
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 单个计划单元归一化
    fn normalise_key<F>(
        &self,
        key: &PlanningKey,
        input: &PlanningInput,
        demand_calendar: Option<&Calendar>,
        demand: &[BucketedDemand],
        supply: &[BucketedSupply],
        adjust: &F,
    ) -> PlanningResult<KeyInput>
    where
        F: Fn(Policy) -> Policy,
    {
        let policy = adjust(input.policies.policy_for(key)?);
        let mut key_input = KeyInput::new(key.clone(), policy);

        // 需求行
        key_input.demand = match demand_calendar {
            None => demand
                .iter()
                .enumerate()
                .map(|(n, d)| -> PlanningResult<DemandLine> {
                    let qty = to_qty(key, Some(d.bucket), "demand.quantity", d.row.quantity)?;
                    let mut line = DemandLine::new(&format!("{}#{}", key, n), key.clone(), d.bucket, qty)
                        .with_channel(&d.row.channel);
                    line.priority = d.row.priority;
                    Ok(line)
                })
                .collect::<PlanningResult<Vec<_>>>()?,
            Some(source) => self.convert_demand(key, source, &input.calendar, demand)?,
        };

        // 供应记录
        for (n, s) in supply.iter().enumerate() {
            let qty = to_qty(key, Some(s.bucket), "supply.quantity", s.row.quantity)?;
            let mut record = SupplyRecord::new(
                &format!("{}#S{}", key, n),
                key.clone(),
                s.bucket,
                qty,
                s.row.supply_type,
            );
            record.expiry_bucket = s.expiry_bucket;
            key_input.supply.push(record);
        }

        Ok(key_input)
    }

    /// 需求流（优先级, 渠道）按源日历汇总后转换到计划日历
    fn convert_demand(
        &self,
        key: &PlanningKey,
        source: &Calendar,
        target: &Calendar,
        demand: &[BucketedDemand],
    ) -> PlanningResult<Vec<DemandLine>> {
        // 流顺序 = 首次出现顺序
        let mut streams: Vec<((Option<u32>, String), Vec<Qty>)> = Vec::new();
        for d in demand {
            let qty = to_qty(key, Some(d.bucket), "demand.quantity", d.row.quantity)?;
            let stream_key = (d.row.priority, d.row.channel.clone());
            let position = match streams.iter().position(|(k, _)| k == &stream_key) {
                Some(p) => p,
                None => {
                    streams.push((stream_key, vec![0; source.len()]));
                    streams.len() - 1
                }
            };
            streams[position].1[d.bucket] += qty;
        }

        let mut lines = Vec::new();
        for (n, ((priority, channel), values)) in streams.into_iter().enumerate() {
            let series = Series::new(source.clone(), values)?;
            let converted = self.converter.convert(&series, target)?;
            for (t, &qty) in converted.values.iter().enumerate() {
                if qty == 0 {
                    continue;
                }
                let mut line = DemandLine::new(&format!("{}#{}-{}", key, n, t), key.clone(), t, qty)
                    .with_channel(&channel);
                line.priority = priority;
                lines.push(line);
            }
        }
        // 同桶多行保持流顺序
        lines.sort_by_key(|l| l.bucket);
        Ok(lines)
    }

    /// 共享供应池：按 (池, 桶) 原子配给，结果写入成员的 POOL_ALLOCATION 到货
    fn allocate_pools(
        &self,
        calendar: &Calendar,
        pool_supply: &BTreeMap<String, Vec<(usize, &PoolSupplyRow)>>,
        inputs: &mut [KeyInput],
        issues: &mut Vec<PlanIssue>,
        rejected: &mut BTreeSet<PlanningKey>,
    ) -> PlanningResult<()> {
        for (pool_id, rows) in pool_supply {
            let members: Vec<usize> = inputs
                .iter()
                .enumerate()
                .filter(|(_, i)| i.policy.supply_pool.as_deref() == Some(pool_id.as_str()))
                .map(|(n, _)| n)
                .collect();
            if members.is_empty() {
                warn!(pool_id = %pool_id, "共享供应池没有成员计划单元，忽略");
                continue;
            }

            // 池每桶可用量；数量无效时拒绝全部成员
            let mut available = vec![0 as Qty; calendar.len()];
            let mut invalid: Option<(usize, f64)> = None;
            for (bucket, row) in rows {
                if !row.quantity.is_finite() || row.quantity < 0.0 {
                    invalid = Some((*bucket, row.quantity));
                    break;
                }
                available[*bucket] += row.quantity.round() as Qty;
            }
            if let Some((bucket, value)) = invalid {
                for &m in &members {
                    let err = PlanningError::InvalidQuantity {
                        key: inputs[m].key.to_string(),
                        bucket: Some(bucket),
                        field: format!("pool_supply[{}].quantity", pool_id),
                        value,
                    };
                    self.reject_or_fail(&inputs[m].key, err, issues, rejected)?;
                }
                continue;
            }

            for (bucket, &pool_qty) in available.iter().enumerate() {
                if pool_qty <= 0 {
                    continue;
                }
                let demands: Vec<(PlanningKey, Vec<DemandLine>)> = members
                    .iter()
                    .map(|&m| {
                        let lines = inputs[m]
                            .demand
                            .iter()
                            .filter(|l| l.bucket == bucket)
                            .cloned()
                            .collect();
                        (inputs[m].key.clone(), lines)
                    })
                    .collect();

                let shares = self
                    .allocator
                    .allocate_shared(pool_id, bucket, pool_qty, &demands)?;
                for &m in &members {
                    let share = shares
                        .get(&inputs[m].key)
                        .map(|a| a.total_constrained)
                        .unwrap_or(0);
                    if share > 0 {
                        let record = SupplyRecord::new(
                            &format!("POOL-{}-{}", pool_id, bucket),
                            inputs[m].key.clone(),
                            bucket,
                            share,
                            SupplyType::PoolAllocation,
                        );
                        inputs[m].supply.push(record);
                    }
                }
            }
        }
        Ok(())
    }

    /// 运行致命错误直接返回；其余记入问题表并拒绝该计划单元
    fn reject_or_fail(
        &self,
        key: &PlanningKey,
        err: PlanningError,
        issues: &mut Vec<PlanIssue>,
        rejected: &mut BTreeSet<PlanningKey>,
    ) -> PlanningResult<()> {
        if err.is_run_fatal() {
            error!(key = %key, kind = %err.kind(), error = %err, "计划运行失败");
            return Err(err);
        }
        warn!(key = %key, kind = %err.kind(), error = %err, "计划单元被拒绝");
        issues.push(PlanIssue::from(&err));
        rejected.insert(key.clone());
        Ok(())
    }
}

// ==========================================
// 日期定位
// ==========================================

fn bucket_demand<'a>(
    input: &'a PlanningInput,
    calendar: &Calendar,
) -> PlanningResult<BTreeMap<PlanningKey, Vec<BucketedDemand<'a>>>> {
    let mut grouped: BTreeMap<PlanningKey, Vec<BucketedDemand>> = BTreeMap::new();
    for row in &input.demand {
        let bucket = calendar.require_index(row.period)?;
        grouped
            .entry(row.key())
            .or_default()
            .push(BucketedDemand { bucket, row });
    }
    Ok(grouped)
}

fn bucket_supply(input: &PlanningInput) -> PlanningResult<BTreeMap<PlanningKey, Vec<BucketedSupply>>> {
    let calendar = &input.calendar;
    let mut grouped: BTreeMap<PlanningKey, Vec<BucketedSupply>> = BTreeMap::new();
    for row in &input.supply {
        let bucket = calendar.require_index(row.period)?;
        let expiry_bucket = row.expiry.map(|date| expiry_bucket(calendar, date));
        grouped.entry(row.key()).or_default().push(BucketedSupply {
            bucket,
            expiry_bucket,
            row,
        });
    }
    Ok(grouped)
}

fn bucket_pool_supply(
    input: &PlanningInput,
) -> PlanningResult<BTreeMap<String, Vec<(usize, &PoolSupplyRow)>>> {
    let mut grouped: BTreeMap<String, Vec<(usize, &PoolSupplyRow)>> = BTreeMap::new();
    for row in &input.pool_supply {
        let bucket = input.calendar.require_index(row.period)?;
        grouped
            .entry(row.pool_id.clone())
            .or_default()
            .push((bucket, row));
    }
    Ok(grouped)
}

/// 到期日 → 到期桶位置
///
/// 计划期内为桶下标；计划期外按首/末桶长度外推（起点之前为负，终点之后 ≥ 计划期长度）
fn expiry_bucket(calendar: &Calendar, date: NaiveDate) -> i64 {
    if let Some(index) = calendar.index_of(date) {
        return index as i64;
    }
    let buckets = calendar.buckets();
    match (buckets.first(), buckets.last()) {
        (Some(first), Some(_)) if date < first.start => {
            let length = first.days().max(1);
            let before = (first.start - date).num_days();
            -((before + length - 1) / length)
        }
        (Some(_), Some(last)) => {
            let length = last.days().max(1);
            let after = (date - last.end).num_days();
            calendar.len() as i64 + after / length
        }
        _ => 0,
    }
}
