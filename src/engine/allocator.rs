// ==========================================
// S&OP 运营计划引擎 - 需求配给器
// ==========================================
// 职责: 可用量不足时，按优先级在需求行间配给
// 输入: 可用量 + 需求行（输入顺序）
// 输出: 总满足量 + 每行满足量/未满足量
// ==========================================
// 规则:
// 1) 按 (优先级升序, 输入顺序) 排序；无优先级排在最后
// 2) 逐级全额满足，直到某一级无法全额满足
// 3) 该级在同级所有行间按需求量比例分摊剩余量（最大余数法取整）
// 4) 更低优先级全部为 0
// 红线: sum(行满足量) == 总满足量 == min(可用量, 总需求)
// ==========================================

use crate::domain::allocation::{Allocation, LineAllocation};
use crate::domain::planning::{DemandLine, PlanningKey};
use crate::domain::types::{EqualPriorityRule, Qty};
use crate::error::{PlanningError, PlanningResult};
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// DemandAllocator - 需求配给器
// ==========================================
pub struct DemandAllocator {
    rule: EqualPriorityRule,
}

impl DemandAllocator {
    pub fn new(rule: EqualPriorityRule) -> Self {
        Self { rule }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 在需求行间配给可用量
    ///
    /// # 参数
    /// - `available`: 可用量
    /// - `lines`: 同一桶的需求行（输入顺序即同级平局顺序）
    ///
    /// # 返回
    /// 与 `lines` 同序的配给结果
    ///
    /// # 错误
    /// - `AllocationInconsistency`: 配给总量与期望不符（内部缺陷）
    pub fn allocate(&self, available: Qty, lines: &[DemandLine]) -> PlanningResult<Allocation> {
        let requests: Vec<(Option<u32>, Qty)> =
            lines.iter().map(|l| (l.priority, l.quantity)).collect();
        let allocation = self.allocate_requests(available, &requests);

        let (key, bucket) = lines
            .first()
            .map(|l| (l.key.to_string(), l.bucket))
            .unwrap_or_default();
        verify(&allocation, available, &key, bucket)?;
        Ok(allocation)
    }

    /// 共享供应池配给：合并所有成员单元的需求后一次性配给
    ///
    /// # 参数
    /// - `pool_id`: 供应池ID（仅用于日志与错误定位）
    /// - `bucket`: 桶下标
    /// - `available`: 池在该桶的可用量
    /// - `demands`: 各计划单元在该桶的需求行（顺序决定同级平局顺序）
    ///
    /// # 返回
    /// 计划单元 → 该单元需求行的配给结果
    pub fn allocate_shared(
        &self,
        pool_id: &str,
        bucket: usize,
        available: Qty,
        demands: &[(PlanningKey, Vec<DemandLine>)],
    ) -> PlanningResult<BTreeMap<PlanningKey, Allocation>> {
        let requests: Vec<(Option<u32>, Qty)> = demands
            .iter()
            .flat_map(|(_, lines)| lines.iter().map(|l| (l.priority, l.quantity)))
            .collect();
        let merged = self.allocate_requests(available, &requests);
        verify(&merged, available, &format!("pool:{}", pool_id), bucket)?;

        let mut result = BTreeMap::new();
        let mut offset = 0;
        for (key, lines) in demands {
            let slice = &merged.lines[offset..offset + lines.len()];
            let per_key: Vec<LineAllocation> = slice
                .iter()
                .enumerate()
                .map(|(i, l)| LineAllocation {
                    line_index: i,
                    ..*l
                })
                .collect();
            let total_constrained = per_key.iter().map(|l| l.constrained).sum();
            result.insert(
                key.clone(),
                Allocation {
                    total_constrained,
                    lines: per_key,
                },
            );
            offset += lines.len();
        }

        debug!(
            pool_id = pool_id,
            bucket = bucket,
            available = available,
            members = demands.len(),
            allocated = merged.total_constrained,
            "共享供应池配给完成"
        );
        Ok(result)
    }

    /// 纯配给计算（不校验）
    pub fn allocate_requests(&self, available: Qty, requests: &[(Option<u32>, Qty)]) -> Allocation {
        let mut constrained = vec![0 as Qty; requests.len()];

        // 1. 排序：显式优先级在前，同级保持输入顺序（稳定排序）
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by_key(|&i| tier_key(requests[i].0));

        // 2. 逐级满足
        let mut remaining = available.max(0);
        let mut start = 0;
        while start < order.len() {
            let tier = tier_key(requests[order[start]].0);
            let end = start
                + order[start..]
                    .iter()
                    .take_while(|&&i| tier_key(requests[i].0) == tier)
                    .count();
            let members = &order[start..end];
            let tier_total: Qty = members.iter().map(|&i| requests[i].1.max(0)).sum();

            if tier_total <= remaining {
                for &i in members {
                    constrained[i] = requests[i].1.max(0);
                }
                remaining -= tier_total;
            } else {
                // 3. 该级无法全额满足：同级分摊后，更低优先级全部为 0
                match self.rule {
                    EqualPriorityRule::ProRata => {
                        split_pro_rata(remaining, tier_total, members, requests, &mut constrained)
                    }
                    EqualPriorityRule::InputOrder => {
                        split_in_order(remaining, members, requests, &mut constrained)
                    }
                }
                break;
            }
            start = end;
        }

        let lines: Vec<LineAllocation> = requests
            .iter()
            .enumerate()
            .map(|(i, &(_, requested))| {
                let requested = requested.max(0);
                LineAllocation {
                    line_index: i,
                    requested,
                    constrained: constrained[i],
                    unmet: requested - constrained[i],
                }
            })
            .collect();
        let total_constrained = lines.iter().map(|l| l.constrained).sum();

        Allocation {
            total_constrained,
            lines,
        }
    }
}

impl Default for DemandAllocator {
    fn default() -> Self {
        Self::new(EqualPriorityRule::ProRata)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 优先级排序键：(无优先级, 优先级值)
fn tier_key(priority: Option<u32>) -> (bool, u32) {
    (priority.is_none(), priority.unwrap_or(0))
}

/// 按比例分摊（最大余数法；余数相同时按输入顺序）
fn split_pro_rata(
    remaining: Qty,
    tier_total: Qty,
    members: &[usize],
    requests: &[(Option<u32>, Qty)],
    constrained: &mut [Qty],
) {
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(members.len());
    let mut assigned: Qty = 0;

    for &i in members {
        let numerator = remaining as i128 * requests[i].1.max(0) as i128;
        let share = (numerator / tier_total as i128) as Qty;
        constrained[i] = share;
        assigned += share;
        remainders.push((i, numerator % tier_total as i128));
    }

    // members 已按输入顺序排列，稳定排序保持平局顺序
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    let leftover = (remaining - assigned) as usize;
    for &(i, _) in remainders.iter().take(leftover) {
        constrained[i] += 1;
    }
}

/// 按输入顺序先到先得
fn split_in_order(
    remaining: Qty,
    members: &[usize],
    requests: &[(Option<u32>, Qty)],
    constrained: &mut [Qty],
) {
    let mut left = remaining;
    for &i in members {
        let take = requests[i].1.max(0).min(left);
        constrained[i] = take;
        left -= take;
    }
}

/// 配给不变式校验
fn verify(allocation: &Allocation, available: Qty, key: &str, bucket: usize) -> PlanningResult<()> {
    let expected = available.max(0).min(allocation.total_requested());
    let line_sum: Qty = allocation.lines.iter().map(|l| l.constrained).sum();
    let line_ok = allocation
        .lines
        .iter()
        .all(|l| l.constrained >= 0 && l.constrained <= l.requested);

    if allocation.total_constrained != expected || line_sum != expected || !line_ok {
        return Err(PlanningError::AllocationInconsistency {
            key: key.to_string(),
            bucket,
            expected,
            actual: line_sum,
        });
    }
    Ok(())
}
