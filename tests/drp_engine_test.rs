// ==========================================
// ReplenishmentPlanner (DRP) 引擎集成测试
// ==========================================
// 测试目标: 验证补货触发、批量取整、提前期偏移、迭代收敛
// ==========================================

mod helpers;

use helpers::test_data_builder::{week, PlanningInputBuilder, PolicyBuilder};
use sop_drp_planner::config::PlanningConfig;
use sop_drp_planner::domain::planning::PlanningKey;
use sop_drp_planner::engine::PlanningOrchestrator;
use sop_drp_planner::error::IssueKind;

fn key() -> PlanningKey {
    PlanningKey::new("SKU001", "DC1")
}

fn orchestrator() -> PlanningOrchestrator {
    PlanningOrchestrator::new(PlanningConfig::default())
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_lot_size_and_moq_rounding() {
    println!("\n=== 测试：批量取整 ===");

    let input = PlanningInputBuilder::weekly(2)
        .policy(PolicyBuilder::new("SKU001", "DC1").lot_size(25.0).min_order_qty(10.0))
        .demand("SKU001", week(0), 37.0)
        .build();

    let run = orchestrator().run(&input).unwrap();
    let orders = run.orders_for(&key());

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].shortfall, 37);
    assert_eq!(orders[0].quantity, 50);
    assert_eq!(orders[0].due_bucket, 0);
    assert_eq!(run.projection_for(&key())[0].ending, 13);

    println!("✓ 缺口 37 → 订单 {}", orders[0].quantity);
}

#[test]
fn test_lead_time_offsets_order_bucket() {
    println!("\n=== 测试：提前期偏移 ===");

    let input = PlanningInputBuilder::weekly(12)
        .policy(PolicyBuilder::new("SKU001", "DC1").lead_time(3.0))
        .demand("SKU001", week(10), 40.0)
        .build();

    let run = orchestrator().run(&input).unwrap();
    let orders = run.orders_for(&key());

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].due_bucket, 10);
    assert_eq!(orders[0].order_bucket, 7);
    assert!(!orders[0].past_due_issue);
    assert_eq!(run.metrics.past_due_orders, 0);
}

#[test]
fn test_past_due_order_is_flagged_not_dropped() {
    println!("\n=== 测试：过期下单标记 ===");

    let input = PlanningInputBuilder::weekly(4)
        .policy(PolicyBuilder::new("SKU001", "DC1").lead_time(3.0))
        .demand("SKU001", week(1), 20.0)
        .build();

    let run = orchestrator().run(&input).unwrap();
    let orders = run.orders_for(&key());

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_bucket, -2);
    assert!(orders[0].past_due_issue);
    assert_eq!(run.metrics.past_due_orders, 1);
    // 订单仍计入到货
    assert_eq!(run.projection_for(&key())[1].receipts, 20);
    assert!(run
        .issues
        .iter()
        .all(|i| i.kind != IssueKind::ConvergenceViolation));
}

#[test]
fn test_repeated_triggers_restore_target_level() {
    println!("\n=== 测试：多次触发补至目标水位 ===");

    let mut builder = PlanningInputBuilder::weekly(8)
        .policy(
            PolicyBuilder::new("SKU001", "DC1")
                .reorder_point(20.0)
                .safety_stock(30.0),
        )
        .on_hand("SKU001", 100.0);
    for w in 0..8 {
        builder = builder.demand("SKU001", week(w), 25.0);
    }
    let run = orchestrator().run(&builder.build()).unwrap();

    let orders = run.orders_for(&key());
    let due: Vec<usize> = orders.iter().map(|o| o.due_bucket).collect();
    assert_eq!(due, vec![3, 5, 7]);
    assert!(orders.iter().all(|o| o.quantity == 50));

    let endings: Vec<i64> = run.projection_for(&key()).iter().map(|r| r.ending).collect();
    assert_eq!(endings, vec![75, 50, 25, 50, 25, 50, 25, 50]);

    // 收敛后每桶净余额不低于再订货点
    for row in run.projection_for(&key()) {
        assert!(row.net_balance() >= 20, "桶 {} 仍低于再订货点", row.bucket);
        assert_eq!(row.unmet_demand(), 0);
    }
    assert_eq!(run.metrics.total_order_quantity, 150);

    println!("✓ 订单到货桶: {:?}", due);
}

#[test]
fn test_no_orders_when_supply_covers_reorder_point() {
    println!("\n=== 测试：供应充足不下单 ===");

    let input = PlanningInputBuilder::weekly(4)
        .policy(PolicyBuilder::new("SKU001", "DC1").reorder_point(10.0))
        .on_hand("SKU001", 100.0)
        .demand("SKU001", week(0), 20.0)
        .demand("SKU001", week(3), 20.0)
        .build();

    let run = orchestrator().run(&input).unwrap();
    assert!(run.orders.is_empty());
    assert_eq!(run.projection_for(&key())[3].ending, 60);
}
