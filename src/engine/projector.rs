// ==========================================
// S&OP 运营计划引擎 - 库存投影器
// ==========================================
// 职责: 单个计划单元逐桶滚动库存
// 输入: 计划单元输入（策略 + 需求行 + 供应记录）+ 已下达的 DRP 订单
// 输出: 投影行 + 配给明细 + 写回约束量的需求行
// ==========================================
// 每桶步骤（严格从左到右折叠，不重排）:
// 1) 期初 = 上桶期末（首桶 = 在手库存）
// 2) 到货 = 在途 + 计划到货 + 池分配 + 到期 DRP 订单
// 3) 报废 = 批次账中不满足剩余寿命要求的批次 + 到货中的过期批次
// 4) 可用 = 期初 + 到货 − 报废
// 5) 可用 < 总需求 → 调用需求配给器
// 6) 按 FEFO 消耗约束后需求，期末 = 可用 − 约束需求
// 7) 覆盖度 = 期末 ÷ 前瞻窗口平均需求
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::allocation::{Allocation, AllocationDetail, LineAllocation};
use crate::domain::calendar::Calendar;
use crate::domain::order::ReplenishmentOrder;
use crate::domain::planning::{DemandLine, PlanningKey, SupplyRecord};
use crate::domain::policy::Policy;
use crate::domain::projection::{Coverage, ProjectionRow};
use crate::domain::types::{Qty, SupplyType};
use crate::engine::allocator::DemandAllocator;
use crate::engine::shelf_life::{Batch, BatchLedger, ShelfLifeTracker};
use crate::error::{PlanningError, PlanningResult};
use serde::Serialize;
use tracing::{debug, trace};

// ==========================================
// KeyInput - 单个计划单元的投影输入
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub key: PlanningKey,
    pub policy: Policy,
    pub demand: Vec<DemandLine>,    // 同桶多行按输入顺序
    pub supply: Vec<SupplyRecord>,  // 在手 / 在途 / 计划 / 池分配
}

impl KeyInput {
    pub fn new(key: PlanningKey, policy: Policy) -> Self {
        Self {
            key,
            policy,
            demand: Vec::new(),
            supply: Vec::new(),
        }
    }

    /// 每桶总需求
    pub fn demand_by_bucket(&self, horizon: usize) -> Vec<Qty> {
        let mut totals = vec![0 as Qty; horizon];
        for line in &self.demand {
            if let Some(slot) = totals.get_mut(line.bucket) {
                *slot += line.quantity;
            }
        }
        totals
    }
}

// ==========================================
// KeyProjection - 单个计划单元的投影结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyProjection {
    pub key: PlanningKey,
    pub rows: Vec<ProjectionRow>,
    pub allocations: Vec<AllocationDetail>,
    pub demand: Vec<DemandLine>, // constrained_quantity 已写回
}

impl KeyProjection {
    pub fn endings(&self) -> Vec<Qty> {
        self.rows.iter().map(|r| r.ending).collect()
    }
}

// ==========================================
// InventoryProjector - 库存投影器
// ==========================================
pub struct InventoryProjector {
    allocator: DemandAllocator,
    shelf_life: ShelfLifeTracker,
    coverage_window: usize,
}

impl InventoryProjector {
    pub fn new(config: &PlanningConfig) -> Self {
        Self {
            allocator: DemandAllocator::new(config.equal_priority_rule),
            shelf_life: ShelfLifeTracker::new(),
            coverage_window: config.coverage_window_buckets,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 投影单个计划单元
    ///
    /// # 参数
    /// - `calendar`: 计划日历
    /// - `input`: 计划单元输入
    /// - `orders`: 已生成的 DRP 订单（按到货桶计入到货）
    ///
    /// # 错误
    /// - `InvalidQuantity`: 需求/供应/订单数量为负
    /// - `NonContiguousCalendar`: 需求或供应所在桶不在日历内
    /// - `AllocationInconsistency`: 配给结果不守恒
    pub fn project(
        &self,
        calendar: &Calendar,
        input: &KeyInput,
        orders: &[ReplenishmentOrder],
    ) -> PlanningResult<KeyProjection> {
        let horizon = calendar.len();
        validate_input(input, horizon)?;

        let key = &input.key;
        let shelf_life_buckets = input.policy.shelf_life_buckets.unwrap_or(0);
        let demand_totals = input.demand_by_bucket(horizon);

        // 在手库存 = 首桶期初批次
        let mut ledger = BatchLedger::new();
        for record in input
            .supply
            .iter()
            .filter(|r| r.supply_type == SupplyType::OnHand)
        {
            ledger.receive(Batch::from(record));
        }

        let mut rows = Vec::with_capacity(horizon);
        let mut allocations = Vec::with_capacity(input.demand.len());
        let mut demand = input.demand.clone();

        for t in 0..horizon {
            // 1. 期初
            let beginning = ledger.on_hand();

            // 2. 到货
            let arrivals = arrivals_at(input, orders, t);
            let receipts: Qty = arrivals.iter().map(|r| r.quantity).sum();

            // 3. 报废
            let split = self.shelf_life.usable_supply(&arrivals, t, shelf_life_buckets);
            let written_off: Qty = ledger
                .write_off(t, shelf_life_buckets)
                .iter()
                .map(|b| b.quantity)
                .sum();
            let expired_waste = written_off + split.waste_quantity();
            for record in &split.usable {
                ledger.receive(Batch::from(record));
            }

            // 4. 可用
            let available = ledger.on_hand();

            // 5. 配给
            let line_indexes: Vec<usize> = demand
                .iter()
                .enumerate()
                .filter(|(_, l)| l.bucket == t)
                .map(|(i, _)| i)
                .collect();
            let lines: Vec<DemandLine> = line_indexes.iter().map(|&i| demand[i].clone()).collect();
            let total_demand = demand_totals[t];

            let allocation = if available >= total_demand {
                full_service(&lines)
            } else {
                debug!(
                    key = %key,
                    bucket = t,
                    available = available,
                    total_demand = total_demand,
                    "可用量不足，执行需求配给"
                );
                self.allocator.allocate(available, &lines)?
            };

            for (line, result) in lines.iter().zip(allocation.lines.iter()) {
                allocations.push(AllocationDetail {
                    key: key.clone(),
                    bucket: t,
                    line_id: line.line_id.clone(),
                    channel: line.channel.clone(),
                    priority: line.priority,
                    requested: result.requested,
                    constrained: result.constrained,
                    unmet: result.unmet,
                });
            }
            for (&i, result) in line_indexes.iter().zip(allocation.lines.iter()) {
                demand[i].constrained_quantity = Some(result.constrained);
            }

            // 6. FEFO 出库
            let constrained_demand = allocation.total_constrained;
            let drawn: Qty = ledger.consume(constrained_demand).iter().map(|d| d.quantity).sum();
            if drawn != constrained_demand {
                return Err(PlanningError::AllocationInconsistency {
                    key: key.to_string(),
                    bucket: t,
                    expected: constrained_demand,
                    actual: drawn,
                });
            }
            let ending = ledger.on_hand();

            trace!(
                key = %key,
                bucket = t,
                beginning,
                receipts,
                expired_waste,
                total_demand,
                constrained_demand,
                ending,
                "桶投影"
            );

            rows.push(ProjectionRow {
                key: key.clone(),
                bucket: t,
                bucket_start: calendar.buckets()[t].start,
                beginning,
                receipts,
                expired_waste,
                total_demand,
                constrained_demand,
                ending,
                coverage: Coverage::Unbounded,
            });
        }

        // 7. 覆盖度
        for row in rows.iter_mut() {
            row.coverage = coverage(row.ending, row.bucket, &demand_totals, self.coverage_window);
        }

        Ok(KeyProjection {
            key: key.clone(),
            rows,
            allocations,
            demand,
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 输入校验：数量非负，桶在日历内
fn validate_input(input: &KeyInput, horizon: usize) -> PlanningResult<()> {
    for line in &input.demand {
        if line.quantity < 0 {
            return Err(PlanningError::invalid_quantity(
                &input.key,
                Some(line.bucket),
                "demand.quantity",
                line.quantity as f64,
            ));
        }
        if line.bucket >= horizon {
            return Err(out_of_calendar(&input.key, "需求行", &line.line_id, line.bucket));
        }
    }
    for record in &input.supply {
        if record.quantity < 0 {
            return Err(PlanningError::invalid_quantity(
                &input.key,
                Some(record.bucket),
                "supply.quantity",
                record.quantity as f64,
            ));
        }
        if record.supply_type != SupplyType::OnHand && record.bucket >= horizon {
            return Err(out_of_calendar(&input.key, "供应记录", &record.record_id, record.bucket));
        }
    }
    Ok(())
}

fn out_of_calendar(key: &PlanningKey, what: &str, id: &str, bucket: usize) -> PlanningError {
    PlanningError::NonContiguousCalendar {
        position: bucket,
        message: format!("{} {} ({}) 所在桶 {} 不在计划日历内", what, id, key, bucket),
    }
}

/// 本桶到货：非在手供应 + 到期 DRP 订单
fn arrivals_at(input: &KeyInput, orders: &[ReplenishmentOrder], bucket: usize) -> Vec<SupplyRecord> {
    let mut arrivals: Vec<SupplyRecord> = input
        .supply
        .iter()
        .filter(|r| r.supply_type != SupplyType::OnHand && r.bucket == bucket)
        .cloned()
        .collect();

    arrivals.extend(
        orders
            .iter()
            .enumerate()
            .filter(|(_, o)| o.due_bucket == bucket && o.quantity > 0)
            .map(|(i, o)| {
                SupplyRecord::new(
                    &format!("DRP-{}-{}", bucket, i),
                    input.key.clone(),
                    bucket,
                    o.quantity,
                    SupplyType::Planned,
                )
            }),
    );
    arrivals
}

/// 可用量充足时全额满足
fn full_service(lines: &[DemandLine]) -> Allocation {
    let lines: Vec<LineAllocation> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| LineAllocation {
            line_index: i,
            requested: l.quantity,
            constrained: l.quantity,
            unmet: 0,
        })
        .collect();
    Allocation {
        total_constrained: lines.iter().map(|l| l.constrained).sum(),
        lines,
    }
}

/// 覆盖度：期末 ÷ (t+1..=t+window) 平均需求；窗口越过计划期时截断，
/// 截断后为空则使用本桶需求
pub fn coverage(ending: Qty, bucket: usize, demand_totals: &[Qty], window: usize) -> Coverage {
    let from = (bucket + 1).min(demand_totals.len());
    let to = (bucket + 1 + window).min(demand_totals.len());
    let slice = if from < to {
        &demand_totals[from..to]
    } else {
        &demand_totals[bucket..bucket + 1]
    };

    let average = slice.iter().sum::<Qty>() as f64 / slice.len() as f64;
    if average <= 0.0 {
        Coverage::Unbounded
    } else {
        Coverage::Buckets(ending as f64 / average)
    }
}

#[cfg(test)]
mod tests;
