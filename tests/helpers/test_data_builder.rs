// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{Duration, NaiveDate};
use sop_drp_planner::domain::calendar::Calendar;
use sop_drp_planner::domain::planning::{DemandRow, PoolSupplyRow, SupplyRow};
use sop_drp_planner::domain::policy::{PolicyRow, PolicyTable};
use sop_drp_planner::domain::types::SupplyType;
use sop_drp_planner::engine::PlanningInput;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 周日历起点（周一）
pub const WEEK0: (i32, u32, u32) = (2024, 1, 1);

/// 第 n 周的周一
pub fn week(n: i64) -> NaiveDate {
    d(WEEK0.0, WEEK0.1, WEEK0.2) + Duration::days(7 * n)
}

// ==========================================
// PolicyRow 构建器
// ==========================================

pub struct PolicyBuilder {
    row: PolicyRow,
}

impl PolicyBuilder {
    /// 默认: 安全库存 0 / 再订货点 0 / 批量 1 / 最小订货量 0 / 提前期 0
    pub fn new(sku: &str, location: &str) -> Self {
        Self {
            row: PolicyRow {
                sku: sku.to_string(),
                location: location.to_string(),
                safety_stock: Some(0.0),
                reorder_point: Some(0.0),
                lot_size: Some(1.0),
                min_order_qty: Some(0.0),
                lead_time_buckets: Some(0.0),
                ..Default::default()
            },
        }
    }

    pub fn safety_stock(mut self, v: f64) -> Self {
        self.row.safety_stock = Some(v);
        self
    }

    pub fn reorder_point(mut self, v: f64) -> Self {
        self.row.reorder_point = Some(v);
        self
    }

    pub fn lot_size(mut self, v: f64) -> Self {
        self.row.lot_size = Some(v);
        self
    }

    pub fn min_order_qty(mut self, v: f64) -> Self {
        self.row.min_order_qty = Some(v);
        self
    }

    pub fn lead_time(mut self, buckets: f64) -> Self {
        self.row.lead_time_buckets = Some(buckets);
        self
    }

    pub fn shelf_life(mut self, buckets: f64) -> Self {
        self.row.shelf_life_buckets = Some(buckets);
        self
    }

    pub fn max_stock(mut self, v: f64) -> Self {
        self.row.max_stock = Some(v);
        self
    }

    pub fn pool(mut self, pool_id: &str) -> Self {
        self.row.supply_pool = Some(pool_id.to_string());
        self
    }

    pub fn without_lot_size(mut self) -> Self {
        self.row.lot_size = None;
        self
    }

    pub fn build(self) -> PolicyRow {
        self.row
    }
}

// ==========================================
// PlanningInput 构建器
// ==========================================

pub struct PlanningInputBuilder {
    calendar: Calendar,
    demand_calendar: Option<Calendar>,
    policies: Vec<PolicyRow>,
    demand: Vec<DemandRow>,
    supply: Vec<SupplyRow>,
    pool_supply: Vec<PoolSupplyRow>,
}

impl PlanningInputBuilder {
    pub fn weekly(weeks: usize) -> Self {
        Self::with_calendar(Calendar::weekly(week(0), weeks).unwrap())
    }

    pub fn with_calendar(calendar: Calendar) -> Self {
        Self {
            calendar,
            demand_calendar: None,
            policies: Vec::new(),
            demand: Vec::new(),
            supply: Vec::new(),
            pool_supply: Vec::new(),
        }
    }

    pub fn demand_calendar(mut self, calendar: Calendar) -> Self {
        self.demand_calendar = Some(calendar);
        self
    }

    pub fn policy(mut self, policy: PolicyBuilder) -> Self {
        self.policies.push(policy.build());
        self
    }

    pub fn demand(self, sku: &str, period: NaiveDate, quantity: f64) -> Self {
        self.demand_line(sku, period, quantity, None, "RETAIL")
    }

    pub fn demand_line(
        mut self,
        sku: &str,
        period: NaiveDate,
        quantity: f64,
        priority: Option<u32>,
        channel: &str,
    ) -> Self {
        self.demand.push(DemandRow {
            sku: sku.to_string(),
            location: "DC1".to_string(),
            period,
            quantity,
            priority,
            channel: channel.to_string(),
        });
        self
    }

    pub fn supply(mut self, sku: &str, period: NaiveDate, quantity: f64, supply_type: SupplyType) -> Self {
        self.supply.push(SupplyRow {
            sku: sku.to_string(),
            location: "DC1".to_string(),
            period,
            quantity,
            supply_type,
            expiry: None,
        });
        self
    }

    pub fn on_hand(self, sku: &str, quantity: f64) -> Self {
        self.supply(sku, week(0), quantity, SupplyType::OnHand)
    }

    pub fn expiring(mut self, sku: &str, period: NaiveDate, quantity: f64, expiry: NaiveDate) -> Self {
        self.supply.push(SupplyRow {
            sku: sku.to_string(),
            location: "DC1".to_string(),
            period,
            quantity,
            supply_type: SupplyType::OnHand,
            expiry: Some(expiry),
        });
        self
    }

    pub fn pool_supply(mut self, pool_id: &str, period: NaiveDate, quantity: f64) -> Self {
        self.pool_supply.push(PoolSupplyRow {
            pool_id: pool_id.to_string(),
            period,
            quantity,
        });
        self
    }

    pub fn build(self) -> PlanningInput {
        let mut input = PlanningInput::new(self.calendar, PolicyTable::new(self.policies));
        input.demand_calendar = self.demand_calendar;
        input.demand = self.demand;
        input.supply = self.supply;
        input.pool_supply = self.pool_supply;
        input
    }
}
