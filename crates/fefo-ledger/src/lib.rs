//! # FEFO Ledger
//!
//! 庫存查詢/過帳介面、記憶體庫存帳與發藥流程

pub mod ledger;
pub mod workflow;

// Re-export 主要類型
pub use ledger::InMemoryLedger;
pub use workflow::{DispenseOutcome, DispenseWorkflow, PendingDispense, ShortfallDecision};

use chrono::{DateTime, Utc};
use fefo_core::{AllocationLine, Batch};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 庫存查詢服務
pub trait StockQuery {
    /// 取得某物料在某庫位的所有批次（查詢當下的快照）
    fn batches_for(&self, item_id: &str, location_id: &str) -> fefo_core::Result<Vec<Batch>>;
}

/// 庫存過帳服務
pub trait StockPosting {
    /// 過帳出庫
    ///
    /// 必須在寫入當下重新檢查每個批次的可用數量；任一明細不足時
    /// 回傳 `StaleAllocation` 並且不寫入任何明細。
    fn post_issue(&self, issue: &StockIssue) -> fefo_core::Result<PostingReceipt>;
}

impl<T: StockQuery + ?Sized> StockQuery for &T {
    fn batches_for(&self, item_id: &str, location_id: &str) -> fefo_core::Result<Vec<Batch>> {
        (**self).batches_for(item_id, location_id)
    }
}

impl<T: StockPosting + ?Sized> StockPosting for &T {
    fn post_issue(&self, issue: &StockIssue) -> fefo_core::Result<PostingReceipt> {
        (**self).post_issue(issue)
    }
}

/// 出庫單（依分配計劃扣減）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockIssue {
    /// 物料ID
    pub item_id: String,

    /// 庫位
    pub location_id: String,

    /// 扣減明細
    pub lines: Vec<AllocationLine>,

    /// 來源單據
    pub source_ref: Option<String>,
}

impl StockIssue {
    /// 創建新的出庫單
    pub fn new(
        item_id: impl Into<String>,
        location_id: impl Into<String>,
        lines: Vec<AllocationLine>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            location_id: location_id.into(),
            lines,
            source_ref: None,
        }
    }

    /// 建構器模式：設置來源單據
    pub fn with_source_ref(mut self, source_ref: Option<String>) -> Self {
        self.source_ref = source_ref;
        self
    }

    /// 出庫總數量
    pub fn total_qty(&self) -> Decimal {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// 過帳回執
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingReceipt {
    /// 過帳ID
    pub id: Uuid,

    /// 已過帳的出庫單
    pub issue: StockIssue,

    /// 過帳時間
    pub posted_at: DateTime<Utc>,
}

impl PostingReceipt {
    pub fn new(issue: StockIssue) -> Self {
        Self {
            id: Uuid::new_v4(),
            issue,
            posted_at: Utc::now(),
        }
    }

    /// 已過帳數量
    pub fn posted_qty(&self) -> Decimal {
        self.issue.total_qty()
    }
}
