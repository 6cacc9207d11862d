// ==========================================
// S&OP 运营计划引擎 - 时间粒度转换器
// ==========================================
// 职责: 月↔周 序列转换，总量守恒
// 输入: 源序列（带日历）+ 目标日历 + 分摊规则
// 输出: 目标日历上的序列
// ==========================================
// 红线: 每个源桶的数量在重叠目标桶间分摊后总和不变
//       取整误差（向下取整的余数）计入最后一个重叠目标桶
// ==========================================

use crate::domain::calendar::{Calendar, Series, TimeBucket};
use crate::domain::types::{DistributionRule, Granularity, Qty};
use crate::error::{PlanningError, PlanningResult};
use tracing::{debug, instrument};

// ==========================================
// TemporalConverter - 时间粒度转换器
// ==========================================
pub struct TemporalConverter {
    rule: DistributionRule,
}

impl TemporalConverter {
    pub fn new(rule: DistributionRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &DistributionRule {
        &self.rule
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 将序列转换到目标日历
    ///
    /// # 参数
    /// - `series`: 源序列（粒度取自其日历）
    /// - `target`: 目标日历（粒度即目标粒度）
    ///
    /// # 错误
    /// - `InvalidGranularity`: 源/目标粒度相同
    /// - `InvalidQuantity`: 源序列含负数
    /// - `NonContiguousCalendar`: 任一日历不连续，或源桶有数量却没有重叠的目标桶
    #[instrument(skip(self, series, target), fields(
        from = %series.calendar.granularity(),
        to = %target.granularity(),
        rule = %self.rule
    ))]
    pub fn convert(&self, series: &Series, target: &Calendar) -> PlanningResult<Series> {
        series.calendar.validate()?;
        target.validate()?;
        if let Some((i, &value)) = series.values.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(PlanningError::InvalidQuantity {
                key: "series".to_string(),
                bucket: Some(i),
                field: "series.values".to_string(),
                value: value as f64,
            });
        }

        let from = series.calendar.granularity();
        let to = target.granularity();
        let disaggregate = match (from, to) {
            (Granularity::Monthly, Granularity::Weekly) => true,
            (Granularity::Weekly, Granularity::Monthly) => false,
            _ => return Err(PlanningError::InvalidGranularity { from, to }),
        };

        let mut values = vec![0 as Qty; target.len()];
        for (i, (source, &quantity)) in series
            .calendar
            .buckets()
            .iter()
            .zip(series.values.iter())
            .enumerate()
        {
            if quantity == 0 {
                continue;
            }

            let overlapping: Vec<(usize, &TimeBucket)> = target
                .buckets()
                .iter()
                .enumerate()
                .filter(|(_, t)| source.overlap_days(t) > 0)
                .collect();
            if overlapping.is_empty() {
                return Err(PlanningError::NonContiguousCalendar {
                    position: i,
                    message: format!(
                        "源桶 [{}, {}) 没有重叠的目标桶",
                        source.start, source.end
                    ),
                });
            }

            let weights = self.weights(source, &overlapping, disaggregate);
            for (j, share) in split_quantity(quantity, &weights) {
                values[overlapping[j].0] += share;
            }
        }

        debug!(
            source_total = series.total(),
            target_total = values.iter().sum::<Qty>(),
            "粒度转换完成"
        );
        Series::new(target.clone(), values)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 计算源桶在各重叠目标桶上的权重
    fn weights(
        &self,
        source: &TimeBucket,
        overlapping: &[(usize, &TimeBucket)],
        disaggregate: bool,
    ) -> Vec<f64> {
        let by_days: Vec<f64> = overlapping
            .iter()
            .map(|(_, t)| source.overlap_days(t) as f64)
            .collect();

        match &self.rule {
            DistributionRule::Uniform => vec![1.0; overlapping.len()],
            DistributionRule::WeightedByDays => by_days,
            // 显式权重只描述月→周方向；周→月按天数反向分配
            DistributionRule::ExplicitWeights(explicit) if disaggregate => {
                let weights: Vec<f64> = (0..overlapping.len())
                    .map(|k| explicit.get(k).copied().unwrap_or(0.0))
                    .collect();
                let valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0)
                    && weights.iter().sum::<f64>() > 0.0;
                if valid {
                    weights
                } else {
                    by_days
                }
            }
            DistributionRule::ExplicitWeights(_) => by_days,
        }
    }
}

/// 按权重拆分数量：各份向下取整，余数计入最后一份
///
/// 返回 (权重下标, 份额)；份额之和严格等于 `quantity`。
pub fn split_quantity(quantity: Qty, weights: &[f64]) -> Vec<(usize, Qty)> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() {
        return Vec::new();
    }
    if total <= 0.0 {
        let last = weights.len() - 1;
        return vec![(last, quantity)];
    }

    let mut shares: Vec<(usize, Qty)> = weights
        .iter()
        .enumerate()
        .map(|(j, w)| {
            let exact = quantity as f64 * w / total;
            let share = ((exact + 1e-9).floor() as Qty).clamp(0, quantity.max(0));
            (j, share)
        })
        .collect();

    let assigned: Qty = shares.iter().map(|(_, s)| s).sum();
    let residual = quantity - assigned;
    if let Some(last) = shares.last_mut() {
        last.1 += residual;
    }
    shares
}
