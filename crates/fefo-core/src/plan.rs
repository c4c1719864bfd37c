//! 分配計劃模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 分配明細（批次 → 數量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// 批次ID
    pub batch_id: String,

    /// 分配數量
    pub quantity: Decimal,

    /// 批次效期（無效期物料為 None）
    pub expiry_date: Option<NaiveDate>,
}

impl AllocationLine {
    /// 創建新的分配明細
    pub fn new(batch_id: impl Into<String>, quantity: Decimal, expiry_date: Option<NaiveDate>) -> Self {
        Self {
            batch_id: batch_id.into(),
            quantity,
            expiry_date,
        }
    }
}

/// 批次排除原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// 無庫存
    Empty,
    /// 已過期
    Expired,
    /// 剩餘效期不足
    ShortDated,
}

/// 被排除的批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedBatch {
    pub batch_id: String,
    pub reason: ExclusionReason,
}

impl ExcludedBatch {
    pub fn new(batch_id: impl Into<String>, reason: ExclusionReason) -> Self {
        Self {
            batch_id: batch_id.into(),
            reason,
        }
    }
}

/// 分配結果
///
/// `fulfilled + shortfall` 恆等於請求數量；`shortfall > 0` 表示庫存不足，
/// 屬於正常結果而非錯誤。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// 依效期排序的分配明細
    pub plan: Vec<AllocationLine>,

    /// 已分配數量
    pub fulfilled: Decimal,

    /// 短缺數量
    pub shortfall: Decimal,

    /// 被排除的批次（依輸入順序）
    pub excluded: Vec<ExcludedBatch>,
}

impl AllocationResult {
    /// 創建空的分配結果（全部短缺）
    pub fn empty(requested_qty: Decimal) -> Self {
        Self {
            plan: Vec::new(),
            fulfilled: Decimal::ZERO,
            shortfall: requested_qty,
            excluded: Vec::new(),
        }
    }

    /// 添加分配明細
    pub fn add_line(&mut self, line: AllocationLine) {
        self.fulfilled += line.quantity;
        self.shortfall -= line.quantity;
        self.plan.push(line);
    }

    /// 添加排除記錄
    pub fn add_excluded(&mut self, excluded: ExcludedBatch) {
        self.excluded.push(excluded);
    }

    /// 請求數量
    pub fn requested_qty(&self) -> Decimal {
        self.fulfilled + self.shortfall
    }

    /// 檢查是否完全滿足
    pub fn is_fulfilled(&self) -> bool {
        self.shortfall == Decimal::ZERO
    }

    /// 檢查是否部分滿足
    pub fn is_partial(&self) -> bool {
        self.shortfall > Decimal::ZERO && self.fulfilled > Decimal::ZERO
    }

    /// 查詢某批次的分配數量
    pub fn quantity_for(&self, batch_id: &str) -> Decimal {
        self.plan
            .iter()
            .filter(|line| line.batch_id == batch_id)
            .map(|line| line.quantity)
            .sum()
    }
}

/// 過帳時庫存已不足的明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleLine {
    /// 批次ID
    pub batch_id: String,

    /// 計劃扣減數量
    pub requested_qty: Decimal,

    /// 過帳當下的可用數量
    pub available_qty: Decimal,
}

impl StaleLine {
    pub fn new(batch_id: String, requested_qty: Decimal, available_qty: Decimal) -> Self {
        Self {
            batch_id,
            requested_qty,
            available_qty,
        }
    }

    /// 不足數量
    pub fn missing_qty(&self) -> Decimal {
        (self.requested_qty - self.available_qty).max(Decimal::ZERO)
    }
}
