// ==========================================
// S&OP 运营计划引擎 - 计划日历领域模型
// ==========================================
// 时间桶: 半开区间 [start, end)，带粒度标记
// 红线: 桶序列连续、不重叠、按时间升序
// ==========================================

use crate::domain::types::{Granularity, Qty};
use crate::error::{PlanningError, PlanningResult};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// TimeBucket - 时间桶
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: NaiveDate,         // 起始日（含）
    pub end: NaiveDate,           // 结束日（不含）
    pub granularity: Granularity, // 粒度
}

impl TimeBucket {
    pub fn new(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Self {
        Self {
            start,
            end,
            granularity,
        }
    }

    /// 桶长度（天）
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// 与另一个桶重叠的天数
    pub fn overlap_days(&self, other: &TimeBucket) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).num_days().max(0)
    }

    /// 日期是否落在本桶内
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

// ==========================================
// Calendar - 计划日历
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    granularity: Granularity,
    buckets: Vec<TimeBucket>,
}

impl Calendar {
    /// 构造并校验日历
    ///
    /// # 错误
    /// - `NonContiguousCalendar`: 空日历、桶长度非正、相邻桶有缺口或重叠
    /// - `InvalidGranularity`: 桶粒度与日历粒度不一致
    pub fn new(granularity: Granularity, buckets: Vec<TimeBucket>) -> PlanningResult<Self> {
        let calendar = Self {
            granularity,
            buckets,
        };
        calendar.validate()?;
        Ok(calendar)
    }

    /// 校验连续性（供转换器在计算前复核）
    pub fn validate(&self) -> PlanningResult<()> {
        if self.buckets.is_empty() {
            return Err(PlanningError::NonContiguousCalendar {
                position: 0,
                message: "日历为空".to_string(),
            });
        }

        for (i, bucket) in self.buckets.iter().enumerate() {
            if bucket.granularity != self.granularity {
                return Err(PlanningError::InvalidGranularity {
                    from: self.granularity,
                    to: bucket.granularity,
                });
            }
            if bucket.start >= bucket.end {
                return Err(PlanningError::NonContiguousCalendar {
                    position: i,
                    message: format!("桶长度非正: [{}, {})", bucket.start, bucket.end),
                });
            }
            if let Some(next) = self.buckets.get(i + 1) {
                if bucket.end != next.start {
                    return Err(PlanningError::NonContiguousCalendar {
                        position: i + 1,
                        message: format!(
                            "相邻桶不连续: 前桶结束 {} != 后桶开始 {}",
                            bucket.end, next.start
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// 构造从指定月份开始的连续月日历
    pub fn monthly(year: i32, month: u32, count: usize) -> PlanningResult<Self> {
        let mut start = first_of_month(year, month)?;
        let mut buckets = Vec::with_capacity(count);
        for _ in 0..count {
            let end = next_month_start(start)?;
            buckets.push(TimeBucket::new(start, end, Granularity::Monthly));
            start = end;
        }
        Self::new(Granularity::Monthly, buckets)
    }

    /// 构造从指定日期开始的连续 7 天周日历
    pub fn weekly(start: NaiveDate, count: usize) -> PlanningResult<Self> {
        let buckets = (0..count)
            .map(|i| {
                let s = start + Duration::days(7 * i as i64);
                TimeBucket::new(s, s + Duration::days(7), Granularity::Weekly)
            })
            .collect();
        Self::new(Granularity::Weekly, buckets)
    }

    /// 由月日历派生周日历：在周一与月边界处切分
    ///
    /// 每个周桶只落在一个月内，月→周→月往返可精确还原。
    pub fn weekly_within_months(monthly: &Calendar) -> PlanningResult<Self> {
        if monthly.granularity != Granularity::Monthly {
            return Err(PlanningError::InvalidGranularity {
                from: monthly.granularity,
                to: Granularity::Weekly,
            });
        }

        let mut buckets = Vec::new();
        for month in &monthly.buckets {
            let mut cur = month.start;
            while cur < month.end {
                let to_monday = 7 - cur.weekday().num_days_from_monday() as i64;
                let next = (cur + Duration::days(to_monday)).min(month.end);
                buckets.push(TimeBucket::new(cur, next, Granularity::Weekly));
                cur = next;
            }
        }
        Self::new(Granularity::Weekly, buckets)
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn buckets(&self) -> &[TimeBucket] {
        &self.buckets
    }

    pub fn bucket(&self, index: usize) -> Option<&TimeBucket> {
        self.buckets.get(index)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// 日期所在桶的下标
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.buckets.partition_point(|b| b.end <= date);
        match self.buckets.get(idx) {
            Some(bucket) if bucket.contains(date) => Some(idx),
            _ => None,
        }
    }

    /// 日期所在桶的下标；不在日历内时返回 `NonContiguousCalendar`
    pub fn require_index(&self, date: NaiveDate) -> PlanningResult<usize> {
        self.index_of(date)
            .ok_or_else(|| PlanningError::NonContiguousCalendar {
                position: self.buckets.len(),
                message: format!(
                    "日期 {} 不在计划日历 [{}, {}) 内",
                    date,
                    self.horizon_start(),
                    self.horizon_end()
                ),
            })
    }

    /// 计划期起点
    pub fn horizon_start(&self) -> NaiveDate {
        self.buckets
            .first()
            .map(|b| b.start)
            .unwrap_or(NaiveDate::MIN)
    }

    /// 计划期终点（不含）
    pub fn horizon_end(&self) -> NaiveDate {
        self.buckets.last().map(|b| b.end).unwrap_or(NaiveDate::MIN)
    }
}

fn first_of_month(year: i32, month: u32) -> PlanningResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| PlanningError::NonContiguousCalendar {
        position: 0,
        message: format!("无效的月份: {}-{}", year, month),
    })
}

fn next_month_start(date: NaiveDate) -> PlanningResult<NaiveDate> {
    if date.month() == 12 {
        first_of_month(date.year() + 1, 1)
    } else {
        first_of_month(date.year(), date.month() + 1)
    }
}

// ==========================================
// Series - 时间序列（单一计划单元的数量序列）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub calendar: Calendar,
    pub values: Vec<Qty>,
}

impl Series {
    pub fn new(calendar: Calendar, values: Vec<Qty>) -> PlanningResult<Self> {
        if calendar.len() != values.len() {
            return Err(PlanningError::NonContiguousCalendar {
                position: values.len().min(calendar.len()),
                message: format!(
                    "序列长度 {} 与日历长度 {} 不一致",
                    values.len(),
                    calendar.len()
                ),
            });
        }
        Ok(Self { calendar, values })
    }

    /// 全零序列
    pub fn zeros(calendar: Calendar) -> Self {
        let values = vec![0; calendar.len()];
        Self { calendar, values }
    }

    pub fn total(&self) -> Qty {
        self.values.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_calendar_crosses_year_end() {
        let cal = Calendar::monthly(2024, 11, 3).unwrap();
        assert_eq!(cal.len(), 3);
        assert_eq!(cal.bucket(1).unwrap().start, d(2024, 12, 1));
        assert_eq!(cal.bucket(2).unwrap().start, d(2025, 1, 1));
        assert_eq!(cal.horizon_end(), d(2025, 2, 1));
    }

    #[test]
    fn test_gap_is_rejected() {
        let buckets = vec![
            TimeBucket::new(d(2024, 1, 1), d(2024, 1, 8), Granularity::Weekly),
            TimeBucket::new(d(2024, 1, 9), d(2024, 1, 16), Granularity::Weekly),
        ];
        let err = Calendar::new(Granularity::Weekly, buckets).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::NonContiguousCalendar { position: 1, .. }
        ));
    }

    #[test]
    fn test_weekly_within_months_splits_at_month_boundary() {
        // 2024-01-01 是周一；1 月 29 日那一周跨入 2 月
        let months = Calendar::monthly(2024, 1, 2).unwrap();
        let weeks = Calendar::weekly_within_months(&months).unwrap();
        let jan_weeks: Vec<_> = weeks
            .buckets()
            .iter()
            .filter(|b| b.start.month() == 1)
            .collect();
        assert_eq!(jan_weeks.len(), 5);
        assert_eq!(jan_weeks[4].start, d(2024, 1, 29));
        assert_eq!(jan_weeks[4].end, d(2024, 2, 1));
        let total_days: i64 = weeks.buckets().iter().map(|b| b.days()).sum();
        assert_eq!(total_days, 31 + 29);
    }

    #[test]
    fn test_index_of_uses_half_open_interval() {
        let cal = Calendar::weekly(d(2024, 1, 1), 2).unwrap();
        assert_eq!(cal.index_of(d(2024, 1, 7)), Some(0));
        assert_eq!(cal.index_of(d(2024, 1, 8)), Some(1));
        assert_eq!(cal.index_of(d(2024, 1, 15)), None);
        assert!(cal.require_index(d(2023, 12, 31)).is_err());
    }
}
