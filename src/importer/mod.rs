// ==========================================
// S&OP 运营计划引擎 - 导入层
// ==========================================
// 职责: 外部 CSV 数据 → 计划运行输入
// ==========================================

pub mod error;
pub mod feed_reader;
pub mod file_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use feed_reader::FeedReader;
pub use file_parser::{CsvParser, RawRecord};
