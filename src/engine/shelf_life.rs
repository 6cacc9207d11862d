// ==========================================
// S&OP 运营计划引擎 - 保质期跟踪器
// ==========================================
// 职责: 过滤即将过期的批次，按 FEFO 顺序消耗库存
// 判定: expiry < as_of + shelf_life_buckets 的批次不可用，计入过期报废
// 红线: 同桶多批次时先到期先出 (FEFO)，不是 FIFO
// ==========================================

use crate::domain::planning::SupplyRecord;
use crate::domain::types::Qty;
use serde::{Deserialize, Serialize};

// ==========================================
// ShelfLifeTracker - 保质期跟踪器
// ==========================================
pub struct ShelfLifeTracker {
    // 无状态引擎
}

/// 可用性拆分结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShelfLifeSplit {
    pub usable: Vec<SupplyRecord>,        // 可用批次（FEFO 顺序）
    pub expired_waste: Vec<SupplyRecord>, // 过期报废
}

impl ShelfLifeSplit {
    pub fn usable_quantity(&self) -> Qty {
        self.usable.iter().map(|r| r.quantity).sum()
    }

    pub fn waste_quantity(&self) -> Qty {
        self.expired_waste.iter().map(|r| r.quantity).sum()
    }
}

impl ShelfLifeTracker {
    pub fn new() -> Self {
        Self {}
    }

    /// 批次在 as_of 桶是否已不可用
    ///
    /// 到期位置为负（计划起点前已过期）时任何桶都不可用。
    pub fn is_expired(expiry_bucket: Option<i64>, as_of_bucket: usize, shelf_life_buckets: usize) -> bool {
        match expiry_bucket {
            Some(expiry) => expiry < as_of_bucket as i64 + shelf_life_buckets as i64,
            None => false,
        }
    }

    /// 过滤可用供应
    ///
    /// # 参数
    /// - `records`: 候选供应记录
    /// - `as_of_bucket`: 判定桶
    /// - `shelf_life_buckets`: 最短剩余寿命要求
    ///
    /// # 返回
    /// 可用记录（按到期升序，无到期日排最后，同到期保持输入顺序）与过期记录
    pub fn usable_supply(
        &self,
        records: &[SupplyRecord],
        as_of_bucket: usize,
        shelf_life_buckets: usize,
    ) -> ShelfLifeSplit {
        let (mut usable, expired_waste): (Vec<SupplyRecord>, Vec<SupplyRecord>) = records
            .iter()
            .cloned()
            .partition(|r| !Self::is_expired(r.expiry_bucket, as_of_bucket, shelf_life_buckets));

        usable.sort_by_key(|r| fefo_key(r.expiry_bucket));

        ShelfLifeSplit {
            usable,
            expired_waste,
        }
    }
}

impl Default for ShelfLifeTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn fefo_key(expiry_bucket: Option<i64>) -> i64 {
    expiry_bucket.unwrap_or(i64::MAX)
}

// ==========================================
// BatchLedger - 批次账（FEFO）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub quantity: Qty,
    pub expiry_bucket: Option<i64>,
}

impl From<&SupplyRecord> for Batch {
    fn from(record: &SupplyRecord) -> Self {
        Batch {
            batch_id: record.record_id.clone(),
            quantity: record.quantity,
            expiry_bucket: record.expiry_bucket,
        }
    }
}

/// 单次出库明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDraw {
    pub batch_id: String,
    pub quantity: Qty,
    pub expiry_bucket: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchLedger {
    batches: Vec<Batch>, // 始终保持 FEFO 顺序
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入库（零数量忽略）
    pub fn receive(&mut self, batch: Batch) {
        if batch.quantity <= 0 {
            return;
        }
        let key = fefo_key(batch.expiry_bucket);
        let pos = self
            .batches
            .partition_point(|b| fefo_key(b.expiry_bucket) <= key);
        self.batches.insert(pos, batch);
    }

    /// 当前在库数量
    pub fn on_hand(&self) -> Qty {
        self.batches.iter().map(|b| b.quantity).sum()
    }

    /// 报废 as_of 桶已不可用的批次
    pub fn write_off(&mut self, as_of_bucket: usize, shelf_life_buckets: usize) -> Vec<Batch> {
        let (expired, kept): (Vec<Batch>, Vec<Batch>) = self.batches.drain(..).partition(|b| {
            ShelfLifeTracker::is_expired(b.expiry_bucket, as_of_bucket, shelf_life_buckets)
        });
        self.batches = kept;
        expired
    }

    /// 按 FEFO 出库；请求超过在库量时取完为止
    pub fn consume(&mut self, quantity: Qty) -> Vec<BatchDraw> {
        let mut remaining = quantity.max(0);
        let mut draws = Vec::new();

        for batch in self.batches.iter_mut() {
            if remaining == 0 {
                break;
            }
            let take = batch.quantity.min(remaining);
            if take == 0 {
                continue;
            }
            batch.quantity -= take;
            remaining -= take;
            draws.push(BatchDraw {
                batch_id: batch.batch_id.clone(),
                quantity: take,
                expiry_bucket: batch.expiry_bucket,
            });
        }

        self.batches.retain(|b| b.quantity > 0);
        draws
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }
}
