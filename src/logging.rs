// ==========================================
// S&OP 运营计划引擎 - 日志系统初始化
// ==========================================
// 工具: tracing + tracing-subscriber
// 级别: RUST_LOG（默认 info）
// 格式: 文本（交互）/ JSON（批处理采集）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器
const DEFAULT_FILTER: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 从命令行参数判定（含 `--json-logs` 时为 JSON）
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        if args.iter().any(|a| a.as_ref() == "--json-logs") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// 初始化文本日志
///
/// # 示例
/// ```no_run
/// use sop_drp_planner::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with(LogFormat::Text);
}

/// 按格式初始化日志
///
/// 例如: RUST_LOG=debug 或 RUST_LOG=sop_drp_planner::engine::drp=trace
pub fn init_with(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true);

    // 重复初始化时忽略
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
}

/// 测试日志：debug 级别，输出到测试捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_args() {
        assert_eq!(LogFormat::from_args(&["data", "--json-logs"]), LogFormat::Json);
        assert_eq!(LogFormat::from_args(&["data"]), LogFormat::Text);
    }
}
