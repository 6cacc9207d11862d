// ==========================================
// S&OP 运营计划引擎 - 命令行入口
// ==========================================
// 用法: sop-drp-planner <data_dir> [output_dir] [config.json] [--scenarios] [--json-logs]
// - data_dir:    输入 CSV 目录
// - output_dir:  报表输出目录（默认 <data_dir>/output）
// - config.json: 配置文件（JSON 对象，缺省时使用默认值）
// - --scenarios: 额外运行预设情景并输出对比
// - --json-logs: JSON 格式日志
// ==========================================

use anyhow::{bail, Context, Result};
use sop_drp_planner::config::{ConfigManager, PlanningConfig, ScenarioProfile};
use sop_drp_planner::engine::{PlanningOrchestrator, ScenarioRunner};
use sop_drp_planner::importer::FeedReader;
use sop_drp_planner::logging::{self, LogFormat};
use sop_drp_planner::report::ReportWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    logging::init_with(LogFormat::from_args(&args));
    args.retain(|a| a != "--json-logs");

    let with_scenarios = match args.iter().position(|a| a == "--scenarios") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    if args.is_empty() {
        bail!("用法: sop-drp-planner <data_dir> [output_dir] [config.json] [--scenarios] [--json-logs]");
    }

    let data_dir = PathBuf::from(&args[0]);
    let output_dir = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("output"));

    info!("==================================================");
    info!("{} v{}", sop_drp_planner::APP_NAME, sop_drp_planner::VERSION);
    info!("==================================================");

    // 配置快照
    let manager = match args.get(2) {
        Some(path) => ConfigManager::from_json_file(Path::new(path))
            .with_context(|| format!("读取配置文件失败: {}", path))?,
        None => ConfigManager::new(),
    };
    let config = PlanningConfig::load(&manager);
    info!(config = ?config, "配置快照");

    // 输入
    let input = FeedReader::new(&data_dir)
        .read_input()
        .with_context(|| format!("读取输入数据失败: {}", data_dir.display()))?;

    // 计划运行
    let run = PlanningOrchestrator::new(config.clone())
        .run(&input)
        .context("计划运行失败")?;
    for issue in &run.issues {
        warn!(
            key = issue.key.as_deref().unwrap_or("-"),
            kind = %issue.kind,
            "{}",
            issue.message
        );
    }

    // 报表
    let written = ReportWriter::new(&output_dir)
        .write(&run, &input.calendar)
        .with_context(|| format!("写出报表失败: {}", output_dir.display()))?;
    for path in &written {
        info!(file = %path.display(), "已写出");
    }

    // 情景对比
    if with_scenarios {
        let summaries = ScenarioRunner::new(config)
            .run(&input, &ScenarioProfile::presets())
            .context("情景模拟失败")?;
        for s in &summaries {
            info!(
                scenario = %s.scenario,
                service_level = s.service_level,
                target = s.service_level_target,
                target_met = s.target_met,
                orders = s.total_orders,
                order_quantity = s.total_order_quantity,
                stockout_periods = s.stockout_periods,
                "情景结果"
            );
        }
    }

    Ok(())
}
