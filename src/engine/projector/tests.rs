use super::*;
use chrono::NaiveDate;

fn calendar(weeks: usize) -> Calendar {
    Calendar::weekly(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), weeks).unwrap()
}

fn key() -> PlanningKey {
    PlanningKey::new("SKU001", "DC1")
}

fn policy() -> Policy {
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

fn projector() -> InventoryProjector {
    InventoryProjector::new(&PlanningConfig::default())
}

fn on_hand(qty: Qty) -> SupplyRecord {
    SupplyRecord::new("OH", key(), 0, qty, SupplyType::OnHand)
}

#[test]
fn test_rolls_ending_into_next_beginning() {
    let mut input = KeyInput::new(key(), policy());
    input.supply.push(on_hand(100));
    input.demand.push(DemandLine::new("D0", key(), 0, 30));
    input.demand.push(DemandLine::new("D1", key(), 1, 50));

    let result = projector().project(&calendar(3), &input, &[]).unwrap();
    assert_eq!(result.endings(), vec![70, 20, 20]);
    assert_eq!(result.rows[1].beginning, 70);
    assert!(result.rows.iter().all(|r| r.is_balanced()));
}

#[test]
fn test_in_transit_arrives_in_pinned_bucket() {
    let mut input = KeyInput::new(key(), policy());
    input.supply.push(on_hand(10));
    input
        .supply
        .push(SupplyRecord::new("IT1", key(), 2, 40, SupplyType::InTransit));
    for t in 0..3 {
        input.demand.push(DemandLine::new(&format!("D{}", t), key(), t, 10));
    }

    let result = projector().project(&calendar(3), &input, &[]).unwrap();
    assert_eq!(result.rows[1].constrained_demand, 0);
    assert_eq!(result.rows[1].unmet_demand(), 10);
    assert_eq!(result.rows[2].receipts, 40);
    assert_eq!(result.rows[2].ending, 30);
}

#[test]
fn test_shortage_constrains_demand_by_priority() {
    let mut input = KeyInput::new(key(), policy());
    input.supply.push(on_hand(50));
    input
        .demand
        .push(DemandLine::new("LOW", key(), 0, 40).with_priority(2));
    input
        .demand
        .push(DemandLine::new("HIGH", key(), 0, 40).with_priority(1));

    let result = projector().project(&calendar(1), &input, &[]).unwrap();
    assert_eq!(result.rows[0].constrained_demand, 50);
    assert_eq!(result.rows[0].ending, 0);
    assert_eq!(result.demand[0].constrained_quantity, Some(10));
    assert_eq!(result.demand[1].constrained_quantity, Some(40));
    assert_eq!(result.allocations.len(), 2);
    assert_eq!(result.allocations[0].unmet, 30);
}

#[test]
fn test_expired_batches_become_waste() {
    let mut p = policy();
    p.shelf_life_buckets = Some(1);
    let mut input = KeyInput::new(key(), p);
    input.supply.push(on_hand(30).with_expiry(1));
    input
        .supply
        .push(SupplyRecord::new("FRESH", key(), 0, 20, SupplyType::OnHand).with_expiry(9));
    input.demand.push(DemandLine::new("D0", key(), 0, 10));

    let result = projector().project(&calendar(2), &input, &[]).unwrap();
    // 桶 0: expiry 1 < 0 + 1 不成立 → 可用；FEFO 先消耗 OH
    assert_eq!(result.rows[0].expired_waste, 0);
    assert_eq!(result.rows[0].ending, 40);
    // 桶 1: expiry 1 < 1 + 1 → OH 剩余 20 报废
    assert_eq!(result.rows[1].expired_waste, 20);
    assert_eq!(result.rows[1].ending, 20);
    assert!(result.rows.iter().all(|r| r.is_balanced()));
}

#[test]
fn test_orders_are_counted_as_receipts() {
    let input = KeyInput::new(key(), policy());
    let order = ReplenishmentOrder::new(key(), 1, 0, 25, 25, String::new());
    let result = projector().project(&calendar(2), &input, &[order]).unwrap();
    assert_eq!(result.rows[1].receipts, 25);
    assert_eq!(result.rows[1].ending, 25);
}

#[test]
fn test_coverage_uses_forward_window() {
    let mut input = KeyInput::new(key(), policy());
    input.supply.push(on_hand(100));
    for t in 1..3 {
        input.demand.push(DemandLine::new(&format!("D{}", t), key(), t, 20));
    }

    let result = projector().project(&calendar(3), &input, &[]).unwrap();
    // 桶 0 窗口为桶 1..=2，平均 20
    assert_eq!(result.rows[0].coverage, Coverage::Buckets(5.0));
    // 最后一桶窗口为空，使用本桶需求
    assert_eq!(result.rows[2].coverage, Coverage::Buckets(3.0));
}

#[test]
fn test_zero_forward_demand_is_unbounded() {
    let mut input = KeyInput::new(key(), policy());
    input.supply.push(on_hand(5));
    let result = projector().project(&calendar(2), &input, &[]).unwrap();
    assert_eq!(result.rows[0].coverage, Coverage::Unbounded);
}

#[test]
fn test_negative_quantity_is_rejected() {
    let mut input = KeyInput::new(key(), policy());
    input.demand.push(DemandLine::new("BAD", key(), 0, -1));
    assert!(matches!(
        projector().project(&calendar(1), &input, &[]),
        Err(PlanningError::InvalidQuantity { .. })
    ));
}

#[test]
fn test_demand_outside_calendar_is_rejected() {
    let mut input = KeyInput::new(key(), policy());
    input.demand.push(DemandLine::new("LATE", key(), 5, 1));
    assert!(matches!(
        projector().project(&calendar(2), &input, &[]),
        Err(PlanningError::NonContiguousCalendar { position: 5, .. })
    ));
}
