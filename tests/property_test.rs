// ==========================================
// 性质测试 (proptest)
// ==========================================
// 测试目标: 随机输入下的不变式
// - 配给: 总满足量 = min(可用量, 总需求)，优先级严格分级
// - 投影: 每桶守恒、期末非负
// - DRP: 收敛后每桶净余额不低于再订货点
// - 粒度转换: 月→周→月往返还原
// ==========================================

mod helpers;

use helpers::test_data_builder::{week, PlanningInputBuilder, PolicyBuilder};
use proptest::prelude::*;
use sop_drp_planner::config::PlanningConfig;
use sop_drp_planner::domain::calendar::{Calendar, Series};
use sop_drp_planner::domain::planning::{DemandLine, PlanningKey, SupplyRecord};
use sop_drp_planner::domain::policy::Policy;
use sop_drp_planner::domain::types::{DistributionRule, EqualPriorityRule, SupplyType};
use sop_drp_planner::engine::{
    DemandAllocator, InventoryProjector, KeyInput, PlanningOrchestrator, TemporalConverter,
};

// ==========================================
// 生成策略
// ==========================================

fn arb_requests() -> impl Strategy<Value = Vec<(Option<u32>, i64)>> {
    prop::collection::vec((prop::option::of(1u32..=3), 0i64..=200), 1..8)
}

fn arb_rule() -> impl Strategy<Value = EqualPriorityRule> {
    prop_oneof![
        Just(EqualPriorityRule::ProRata),
        Just(EqualPriorityRule::InputOrder),
    ]
}

fn key() -> PlanningKey {
    PlanningKey::new("SKU001", "DC1")
}

fn flat_policy() -> Policy {
    Policy {
        safety_stock: 0,
        reorder_point: 0,
        lot_size: 1,
        min_order_qty: 0,
        lead_time_buckets: 0,
        shelf_life_buckets: None,
        max_stock: None,
        supply_pool: None,
    }
}

/// 排序用优先级：无优先级排最后
fn rank(priority: Option<u32>) -> u32 {
    priority.unwrap_or(u32::MAX)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // ==========================================
    // 配给
    // ==========================================

    #[test]
    fn allocation_total_is_min_of_available_and_demand(
        requests in arb_requests(),
        available in 0i64..=1000,
        rule in arb_rule(),
    ) {
        let result = DemandAllocator::new(rule).allocate_requests(available, &requests);
        let total: i64 = requests.iter().map(|r| r.1).sum();

        prop_assert_eq!(result.total_constrained, available.min(total));
        prop_assert_eq!(
            result.lines.iter().map(|l| l.constrained).sum::<i64>(),
            result.total_constrained
        );
        for (line, request) in result.lines.iter().zip(requests.iter()) {
            prop_assert!(line.constrained >= 0);
            prop_assert!(line.constrained <= request.1);
            prop_assert_eq!(line.unmet, request.1 - line.constrained);
        }
    }

    #[test]
    fn lower_priority_waits_for_higher(
        requests in arb_requests(),
        available in 0i64..=1000,
    ) {
        let result = DemandAllocator::default().allocate_requests(available, &requests);

        // 某行有未满足量时，任何更低优先级的行都不应分到数量
        for (i, a) in requests.iter().enumerate() {
            if result.lines[i].unmet == 0 {
                continue;
            }
            for (j, b) in requests.iter().enumerate() {
                if rank(b.0) > rank(a.0) {
                    prop_assert_eq!(result.lines[j].constrained, 0);
                }
            }
        }
    }

    // ==========================================
    // 投影
    // ==========================================

    #[test]
    fn projection_is_balanced_and_non_negative(
        on_hand in 0i64..=500,
        demand in prop::collection::vec(0i64..=150, 6),
        in_transit in prop::collection::vec(0i64..=100, 6),
    ) {
        let calendar = Calendar::weekly(week(0), 6).unwrap();
        let mut input = KeyInput::new(key(), flat_policy());
        input.supply.push(SupplyRecord::new("OH", key(), 0, on_hand, SupplyType::OnHand));
        for (t, (&d, &s)) in demand.iter().zip(in_transit.iter()).enumerate() {
            input.demand.push(DemandLine::new(&format!("D{}", t), key(), t, d));
            input.supply.push(SupplyRecord::new(&format!("IT{}", t), key(), t, s, SupplyType::InTransit));
        }

        let projection = InventoryProjector::new(&PlanningConfig::default())
            .project(&calendar, &input, &[])
            .unwrap();

        let mut previous_ending = on_hand;
        for row in &projection.rows {
            prop_assert!(row.is_balanced());
            prop_assert!(row.ending >= 0);
            prop_assert!(row.constrained_demand <= row.total_demand);
            prop_assert_eq!(row.beginning, previous_ending);
            previous_ending = row.ending;
        }

        let receipts: i64 = projection.rows.iter().map(|r| r.receipts).sum();
        let served: i64 = projection.rows.iter().map(|r| r.constrained_demand).sum();
        prop_assert_eq!(on_hand + receipts, previous_ending + served);
    }

    // ==========================================
    // DRP
    // ==========================================

    #[test]
    fn drp_keeps_net_balance_above_reorder_point(
        on_hand in 0.0f64..=200.0,
        demand in prop::collection::vec(0.0f64..=80.0, 8),
        reorder_point in 0.0f64..=60.0,
        safety_stock in 0.0f64..=40.0,
        lot_size in 1.0f64..=50.0,
        lead_time in 0.0f64..=4.0,
    ) {
        let reorder_point = reorder_point.round();
        let mut builder = PlanningInputBuilder::weekly(8)
            .policy(
                PolicyBuilder::new("SKU001", "DC1")
                    .reorder_point(reorder_point)
                    .safety_stock(safety_stock.round())
                    .lot_size(lot_size.round())
                    .lead_time(lead_time.round()),
            )
            .on_hand("SKU001", on_hand.round());
        for (w, qty) in demand.iter().enumerate() {
            builder = builder.demand("SKU001", week(w as i64), qty.round());
        }

        let run = PlanningOrchestrator::new(PlanningConfig::default())
            .run(&builder.build())
            .unwrap();

        for row in run.projection_for(&key()) {
            prop_assert!(row.net_balance() >= reorder_point as i64);
            prop_assert_eq!(row.unmet_demand(), 0);
        }
        for order in &run.orders {
            prop_assert!(order.quantity >= order.shortfall);
        }
    }

    // ==========================================
    // 粒度转换
    // ==========================================

    #[test]
    fn month_week_round_trip(values in prop::collection::vec(0i64..=10_000, 1..6)) {
        let months = Calendar::monthly(2024, 1, values.len()).unwrap();
        let weeks = Calendar::weekly_within_months(&months).unwrap();
        let series = Series::new(months.clone(), values.clone()).unwrap();

        let converter = TemporalConverter::new(DistributionRule::WeightedByDays);
        let weekly = converter.convert(&series, &weeks).unwrap();
        prop_assert_eq!(weekly.total(), series.total());

        let back = converter.convert(&weekly, &months).unwrap();
        prop_assert_eq!(back.values, values);
    }
}
