// ==========================================
// S&OP 运营计划引擎 - 输入数据读取器
// ==========================================
// 职责: 从数据目录读取 CSV，映射为计划运行输入
// 文件:
// - calendar.csv           start,end,granularity（end 不含）
// - demand_calendar.csv    可选，需求数据所在日历，格式同上
// - demand.csv             sku,location,period,quantity,priority,channel
// - supply.csv             sku,location,period,quantity,supply_type,expiry
// - policy.csv             sku,location,safety_stock,reorder_point,lot_size,
//                          min_order_qty,lead_time_buckets,shelf_life_buckets,
//                          max_stock,supply_pool
// - pool_supply.csv        可选，pool_id,period,quantity
// ==========================================
// 红线: 这里只做格式校验；数量合法性（负数等）由引擎按计划单元隔离处理
// ==========================================

use crate::domain::calendar::{Calendar, TimeBucket};
use crate::domain::planning::{DemandRow, PoolSupplyRow, SupplyRow};
use crate::domain::policy::{PolicyRow, PolicyTable};
use crate::domain::types::{Granularity, SupplyType};
use crate::engine::orchestrator::PlanningInput;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRecord};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CALENDAR_FILE: &str = "calendar.csv";
pub const DEMAND_CALENDAR_FILE: &str = "demand_calendar.csv";
pub const DEMAND_FILE: &str = "demand.csv";
pub const SUPPLY_FILE: &str = "supply.csv";
pub const POLICY_FILE: &str = "policy.csv";
pub const POOL_SUPPLY_FILE: &str = "pool_supply.csv";

// ==========================================
// FeedReader - 输入数据读取器
// ==========================================
pub struct FeedReader {
    data_dir: PathBuf,
    parser: CsvParser,
}

impl FeedReader {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            parser: CsvParser,
        }
    }

    /// 读取完整计划输入
    pub fn read_input(&self) -> ImportResult<PlanningInput> {
        let calendar = self.read_calendar(CALENDAR_FILE)?;
        let demand_calendar = if self.path(DEMAND_CALENDAR_FILE).exists() {
            Some(self.read_calendar(DEMAND_CALENDAR_FILE)?)
        } else {
            None
        };

        let mut input = PlanningInput::new(calendar, self.read_policies()?);
        input.demand_calendar = demand_calendar;
        input.demand = self.read_demand()?;
        input.supply = self.read_supply()?;
        input.pool_supply = if self.path(POOL_SUPPLY_FILE).exists() {
            self.read_pool_supply()?
        } else {
            Vec::new()
        };

        info!(
            data_dir = %self.data_dir.display(),
            buckets = input.calendar.len(),
            demand_rows = input.demand.len(),
            supply_rows = input.supply.len(),
            pool_rows = input.pool_supply.len(),
            policies = input.policies.len(),
            "输入数据读取完成"
        );
        Ok(input)
    }

    // ==========================================
    // 各文件读取
    // ==========================================

    pub fn read_calendar(&self, file: &str) -> ImportResult<Calendar> {
        let records = self.records(file)?;
        let mut buckets = Vec::with_capacity(records.len());
        let mut granularity = None;

        for r in &records {
            let start = required_date(file, r, "start")?;
            let end = required_date(file, r, "end")?;
            let g = parse_granularity(file, r)?;
            granularity.get_or_insert(g);
            buckets.push(TimeBucket::new(start, end, g));
        }

        Calendar::new(granularity.unwrap_or(Granularity::Monthly), buckets).map_err(|source| {
            ImportError::CalendarError {
                file: file.to_string(),
                source,
            }
        })
    }

    pub fn read_demand(&self) -> ImportResult<Vec<DemandRow>> {
        let file = DEMAND_FILE;
        self.records(file)?
            .iter()
            .map(|r| -> ImportResult<DemandRow> {
                Ok(DemandRow {
                    sku: required(file, r, "sku")?.to_string(),
                    location: required(file, r, "location")?.to_string(),
                    period: required_date(file, r, "period")?,
                    quantity: required_f64(file, r, "quantity")?,
                    priority: optional_u32(file, r, "priority")?,
                    channel: r.get("channel").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    pub fn read_supply(&self) -> ImportResult<Vec<SupplyRow>> {
        let file = SUPPLY_FILE;
        self.records(file)?
            .iter()
            .map(|r| -> ImportResult<SupplyRow> {
                let raw_type = required(file, r, "supply_type")?;
                let supply_type =
                    SupplyType::parse(raw_type).ok_or_else(|| ImportError::TypeConversionError {
                        file: file.to_string(),
                        row: r.row,
                        field: "supply_type".to_string(),
                        message: format!("未知供应类型 {}", raw_type),
                    })?;
                Ok(SupplyRow {
                    sku: required(file, r, "sku")?.to_string(),
                    location: required(file, r, "location")?.to_string(),
                    period: required_date(file, r, "period")?,
                    quantity: required_f64(file, r, "quantity")?,
                    supply_type,
                    expiry: optional_date(file, r, "expiry")?,
                })
            })
            .collect()
    }

    pub fn read_policies(&self) -> ImportResult<PolicyTable> {
        let file = POLICY_FILE;
        let rows = self
            .records(file)?
            .iter()
            .map(|r| -> ImportResult<PolicyRow> {
                Ok(PolicyRow {
                    sku: required(file, r, "sku")?.to_string(),
                    location: required(file, r, "location")?.to_string(),
                    safety_stock: optional_f64(file, r, "safety_stock")?,
                    reorder_point: optional_f64(file, r, "reorder_point")?,
                    lot_size: optional_f64(file, r, "lot_size")?,
                    min_order_qty: optional_f64(file, r, "min_order_qty")?,
                    lead_time_buckets: optional_f64(file, r, "lead_time_buckets")?,
                    shelf_life_buckets: optional_f64(file, r, "shelf_life_buckets")?,
                    max_stock: optional_f64(file, r, "max_stock")?,
                    supply_pool: r.get("supply_pool").map(|s| s.to_string()),
                })
            })
            .collect::<ImportResult<Vec<_>>>()?;
        Ok(PolicyTable::new(rows))
    }

    pub fn read_pool_supply(&self) -> ImportResult<Vec<PoolSupplyRow>> {
        let file = POOL_SUPPLY_FILE;
        self.records(file)?
            .iter()
            .map(|r| -> ImportResult<PoolSupplyRow> {
                Ok(PoolSupplyRow {
                    pool_id: required(file, r, "pool_id")?.to_string(),
                    period: required_date(file, r, "period")?,
                    quantity: required_f64(file, r, "quantity")?,
                })
            })
            .collect()
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn records(&self, file: &str) -> ImportResult<Vec<RawRecord>> {
        let records = self.parser.parse_to_raw_records(&self.path(file))?;
        debug!(file = file, rows = records.len(), "读取 CSV");
        Ok(records)
    }
}

// ==========================================
// 字段解析
// ==========================================

fn required<'a>(file: &str, r: &'a RawRecord, field: &str) -> ImportResult<&'a str> {
    r.get(field).ok_or_else(|| ImportError::FieldMissing {
        file: file.to_string(),
        row: r.row,
        field: field.to_string(),
    })
}

fn parse_f64(file: &str, r: &RawRecord, field: &str, value: &str) -> ImportResult<f64> {
    value
        .parse::<f64>()
        .map_err(|e| ImportError::TypeConversionError {
            file: file.to_string(),
            row: r.row,
            field: field.to_string(),
            message: format!("{} ({})", e, value),
        })
}

fn required_f64(file: &str, r: &RawRecord, field: &str) -> ImportResult<f64> {
    parse_f64(file, r, field, required(file, r, field)?)
}

fn optional_f64(file: &str, r: &RawRecord, field: &str) -> ImportResult<Option<f64>> {
    r.get(field).map(|v| parse_f64(file, r, field, v)).transpose()
}

fn optional_u32(file: &str, r: &RawRecord, field: &str) -> ImportResult<Option<u32>> {
    r.get(field)
        .map(|v| {
            v.parse::<u32>().map_err(|e| ImportError::TypeConversionError {
                file: file.to_string(),
                row: r.row,
                field: field.to_string(),
                message: format!("{} ({})", e, v),
            })
        })
        .transpose()
}

fn parse_date(file: &str, r: &RawRecord, field: &str, value: &str) -> ImportResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|_| ImportError::DateFormatError {
            file: file.to_string(),
            row: r.row,
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn required_date(file: &str, r: &RawRecord, field: &str) -> ImportResult<NaiveDate> {
    parse_date(file, r, field, required(file, r, field)?)
}

fn optional_date(file: &str, r: &RawRecord, field: &str) -> ImportResult<Option<NaiveDate>> {
    r.get(field).map(|v| parse_date(file, r, field, v)).transpose()
}

fn parse_granularity(file: &str, r: &RawRecord) -> ImportResult<Granularity> {
    let raw = required(file, r, "granularity")?;
    Granularity::parse(raw).ok_or_else(|| ImportError::TypeConversionError {
        file: file.to_string(),
        row: r.row,
        field: "granularity".to_string(),
        message: format!("未知粒度 {}", raw),
    })
}
