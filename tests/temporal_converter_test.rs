// ==========================================
// TemporalConverter 集成测试
// ==========================================
// 测试目标: 月↔周转换守恒，需求日历驱动的运行
// ==========================================

mod helpers;

use helpers::test_data_builder::{d, week, PlanningInputBuilder, PolicyBuilder};
use sop_drp_planner::config::PlanningConfig;
use sop_drp_planner::domain::calendar::{Calendar, Series};
use sop_drp_planner::domain::planning::PlanningKey;
use sop_drp_planner::domain::types::DistributionRule;
use sop_drp_planner::engine::{PlanningOrchestrator, TemporalConverter};
use sop_drp_planner::error::PlanningError;

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_month_to_week_weighted_by_days() {
    println!("\n=== 测试：月→周按天数分摊 ===");

    let months = Calendar::monthly(2024, 1, 1).unwrap();
    let weeks = Calendar::weekly_within_months(&months).unwrap();
    let series = Series::new(months, vec![310]).unwrap();

    let converted = TemporalConverter::new(DistributionRule::WeightedByDays)
        .convert(&series, &weeks)
        .unwrap();

    // 2024-01 切分为 7/7/7/7/3 天
    assert_eq!(converted.values, vec![70, 70, 70, 70, 30]);
    assert_eq!(converted.total(), 310);

    println!("✓ 周序列: {:?}", converted.values);
}

#[test]
fn test_round_trip_restores_monthly_totals() {
    println!("\n=== 测试：月→周→月往返 ===");

    let months = Calendar::monthly(2024, 1, 3).unwrap();
    let weeks = Calendar::weekly_within_months(&months).unwrap();
    let series = Series::new(months.clone(), vec![101, 57, 333]).unwrap();

    let converter = TemporalConverter::new(DistributionRule::WeightedByDays);
    let weekly = converter.convert(&series, &weeks).unwrap();
    let back = converter.convert(&weekly, &months).unwrap();

    assert_eq!(back.values, vec![101, 57, 333]);
}

#[test]
fn test_same_granularity_rejected() {
    println!("\n=== 测试：相同粒度转换被拒绝 ===");

    let weeks = Calendar::weekly(week(0), 4).unwrap();
    let series = Series::zeros(weeks.clone());

    let err = TemporalConverter::new(DistributionRule::Uniform)
        .convert(&series, &weeks)
        .unwrap_err();
    assert!(matches!(err, PlanningError::InvalidGranularity { .. }));
}

#[test]
fn test_monthly_demand_feeds_weekly_plan() {
    println!("\n=== 测试：月需求驱动周计划 ===");

    let months = Calendar::monthly(2024, 1, 1).unwrap();
    let weeks = Calendar::weekly_within_months(&months).unwrap();

    let input = PlanningInputBuilder::with_calendar(weeks)
        .demand_calendar(months)
        .policy(PolicyBuilder::new("SKU001", "DC1"))
        .on_hand("SKU001", 310.0)
        .demand("SKU001", d(2024, 1, 15), 310.0)
        .build();

    let run = PlanningOrchestrator::new(PlanningConfig::default())
        .run(&input)
        .unwrap();
    let key = PlanningKey::new("SKU001", "DC1");
    let rows = run.projection_for(&key);

    let demand: Vec<i64> = rows.iter().map(|r| r.total_demand).collect();
    assert_eq!(demand, vec![70, 70, 70, 70, 30]);
    assert_eq!(rows[4].ending, 0);
    assert!(run.orders.is_empty());
}
