//! 記憶體庫存帳

use fefo_core::{Batch, FefoError, StaleLine};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::{PostingReceipt, StockIssue, StockPosting, StockQuery};

/// 記憶體庫存帳
///
/// 以批次ID為鍵保存批次庫存，出庫過帳在寫鎖內完成檢查與扣減，
/// 因此同一批次的並行出庫不會扣成負數。
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    batches: RwLock<BTreeMap<String, Batch>>,
}

impl InMemoryLedger {
    /// 創建空的庫存帳
    pub fn new() -> Self {
        Self::default()
    }

    /// 以批次清單建立庫存帳
    pub fn with_batches(batches: Vec<Batch>) -> fefo_core::Result<Self> {
        let ledger = Self::new();
        for batch in batches {
            ledger.receive(batch)?;
        }
        Ok(ledger)
    }

    /// 驗收入庫（GRN 過帳）
    ///
    /// 批次已存在時累加數量，物料、庫位或效期不符則失敗。
    pub fn receive(&self, batch: Batch) -> fefo_core::Result<()> {
        batch.validate()?;

        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        match batches.get_mut(&batch.batch_id) {
            Some(existing) => {
                if !existing.belongs_to(&batch.item_id, &batch.location_id) {
                    return Err(FefoError::invalid_batch(
                        &batch.batch_id,
                        format!(
                            "批次已存在於 {}@{}",
                            existing.item_id, existing.location_id
                        ),
                    ));
                }
                if !existing.same_expiry(&batch) {
                    return Err(FefoError::invalid_batch(
                        &batch.batch_id,
                        format!(
                            "效期不符：現有 {:?}，入庫 {:?}",
                            existing.expiry_date, batch.expiry_date
                        ),
                    ));
                }
                existing.receive(batch.on_hand_qty)?;
                tracing::debug!(
                    "批次 {} 入庫 {}，現有 {}",
                    batch.batch_id,
                    batch.on_hand_qty,
                    existing.on_hand_qty
                );
            }
            None => {
                tracing::debug!("新批次 {} 入庫 {}", batch.batch_id, batch.on_hand_qty);
                batches.insert(batch.batch_id.clone(), batch);
            }
        }
        Ok(())
    }

    /// 查詢批次現有庫存
    pub fn on_hand(&self, batch_id: &str) -> Option<Decimal> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(batch_id)
            .map(|b| b.on_hand_qty)
    }

    /// 查詢某物料在某庫位的總庫存
    pub fn total_on_hand(&self, item_id: &str, location_id: &str) -> fefo_core::Result<Decimal> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|b| b.belongs_to(item_id, location_id))
            .try_fold(Decimal::ZERO, |total, b| {
                total
                    .checked_add(b.on_hand_qty)
                    .ok_or_else(|| FefoError::invalid_batch(&b.batch_id, "庫存合計溢位"))
            })
    }

    /// 檢查出庫單的每一筆明細，回傳不足的明細
    fn find_stale_lines(batches: &BTreeMap<String, Batch>, issue: &StockIssue) -> Vec<StaleLine> {
        // 同一批次可能出現多筆明細，先合計
        let mut requested: BTreeMap<&str, Decimal> = BTreeMap::new();
        for line in &issue.lines {
            let total = requested.entry(line.batch_id.as_str()).or_default();
            *total = total.saturating_add(line.quantity);
        }

        requested
            .into_iter()
            .filter_map(|(batch_id, quantity)| {
                let available = batches
                    .get(batch_id)
                    .filter(|b| b.belongs_to(&issue.item_id, &issue.location_id))
                    .map(|b| b.on_hand_qty)
                    .unwrap_or(Decimal::ZERO);
                (quantity > available).then(|| {
                    StaleLine::new(batch_id.to_string(), quantity, available)
                })
            })
            .collect()
    }
}

impl StockQuery for InMemoryLedger {
    fn batches_for(&self, item_id: &str, location_id: &str) -> fefo_core::Result<Vec<Batch>> {
        Ok(self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|b| b.belongs_to(item_id, location_id))
            .cloned()
            .collect())
    }
}

impl StockPosting for InMemoryLedger {
    fn post_issue(&self, issue: &StockIssue) -> fefo_core::Result<PostingReceipt> {
        if let Some(line) = issue.lines.iter().find(|l| l.quantity <= Decimal::ZERO) {
            return Err(FefoError::InvalidRequest(format!(
                "批次 {} 的出庫數量必須大於 0",
                line.batch_id
            )));
        }

        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);

        let stale = Self::find_stale_lines(&batches, issue);
        if !stale.is_empty() {
            tracing::warn!(
                "出庫過帳失敗：{} 筆明細庫存不足 ({}@{})",
                stale.len(),
                issue.item_id,
                issue.location_id
            );
            return Err(FefoError::StaleAllocation { lines: stale });
        }

        for line in &issue.lines {
            if let Some(batch) = batches.get_mut(&line.batch_id) {
                batch.deduct(line.quantity)?;
            }
        }

        tracing::info!(
            "出庫過帳完成：{}@{}，{} 筆明細，數量 {}",
            issue.item_id,
            issue.location_id,
            issue.lines.len(),
            issue.total_qty()
        );
        Ok(PostingReceipt::new(issue.clone()))
    }
}
