//! 發藥/調撥流程：建議 → 確認 → 過帳

use chrono::NaiveDate;
use fefo_calc::FefoAllocator;
use fefo_core::{AllocationRequest, AllocationResult, FefoError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PostingReceipt, StockIssue, StockPosting, StockQuery};

/// 庫存不足時的操作決定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortfallDecision {
    /// 以現有庫存部分出庫
    ProceedPartial,
    /// 取消出庫
    Cancel,
}

/// 待確認的分配建議
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDispense {
    /// 原始請求
    pub request: AllocationRequest,

    /// 計算時使用的基準日
    pub as_of: NaiveDate,

    /// 分配結果
    pub result: AllocationResult,
}

impl PendingDispense {
    /// 是否需要操作人員決定（庫存不足）
    pub fn needs_decision(&self) -> bool {
        !self.result.is_fulfilled()
    }

    /// 轉為出庫單
    pub fn to_issue(&self) -> StockIssue {
        StockIssue::new(
            self.request.item_id.clone(),
            self.request.location_id.clone(),
            self.result.plan.clone(),
        )
        .with_source_ref(self.request.source_ref.clone())
    }
}

/// 出庫結果
#[derive(Debug, Clone, PartialEq)]
pub enum DispenseOutcome {
    /// 已過帳
    Committed(PostingReceipt),
    /// 庫存不足且操作人員取消
    Cancelled { shortfall: Decimal },
    /// 沒有任何可分配庫存
    NoStock { shortfall: Decimal },
}

impl DispenseOutcome {
    /// 過帳回執（僅 Committed）
    pub fn receipt(&self) -> Option<&PostingReceipt> {
        match self {
            DispenseOutcome::Committed(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// 發藥流程
pub struct DispenseWorkflow<S> {
    /// 庫存服務
    stock: S,

    /// FEFO 分配器
    allocator: FefoAllocator,
}

impl<S> DispenseWorkflow<S>
where
    S: StockQuery + StockPosting,
{
    /// 創建新的發藥流程
    pub fn new(stock: S, allocator: FefoAllocator) -> Self {
        Self { stock, allocator }
    }

    /// 取得庫存服務
    pub fn stock(&self) -> &S {
        &self.stock
    }

    /// 取得最新快照並產生分配建議（不寫入庫存）
    pub fn suggest(
        &self,
        request: &AllocationRequest,
        as_of: NaiveDate,
    ) -> fefo_core::Result<PendingDispense> {
        request.validate()?;

        let snapshot = self
            .stock
            .batches_for(&request.item_id, &request.location_id)?;
        let result = self.allocator.suggest(request, &snapshot, as_of)?;

        Ok(PendingDispense {
            request: request.clone(),
            as_of,
            result,
        })
    }

    /// 確認並過帳分配建議
    ///
    /// 過帳時庫存已被其他出庫扣減則回傳 `StaleAllocation`，呼叫端應重新建議。
    pub fn commit(
        &self,
        pending: &PendingDispense,
        decision: ShortfallDecision,
    ) -> fefo_core::Result<DispenseOutcome> {
        let shortfall = pending.result.shortfall;

        if pending.result.plan.is_empty() {
            tracing::info!(
                "{}@{} 無可分配庫存，短缺 {}",
                pending.request.item_id,
                pending.request.location_id,
                shortfall
            );
            return Ok(DispenseOutcome::NoStock { shortfall });
        }

        if pending.needs_decision() && decision == ShortfallDecision::Cancel {
            tracing::info!(
                "{}@{} 庫存不足 {}，取消出庫",
                pending.request.item_id,
                pending.request.location_id,
                shortfall
            );
            return Ok(DispenseOutcome::Cancelled { shortfall });
        }

        let receipt = self.stock.post_issue(&pending.to_issue())?;
        Ok(DispenseOutcome::Committed(receipt))
    }

    /// 建議並過帳，過帳失敗（計劃過期）時重新建議
    ///
    /// # 參數
    /// * `max_attempts` - 最多嘗試次數（至少 1 次）
    pub fn dispense(
        &self,
        request: &AllocationRequest,
        as_of: NaiveDate,
        decision: ShortfallDecision,
        max_attempts: u32,
    ) -> fefo_core::Result<DispenseOutcome> {
        if max_attempts == 0 {
            return Err(FefoError::InvalidRequest(
                "嘗試次數必須至少為 1".to_string(),
            ));
        }

        let mut attempt = 1;
        loop {
            let pending = self.suggest(request, as_of)?;
            match self.commit(&pending, decision) {
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        "第 {} 次過帳失敗，重新計算分配：{}",
                        attempt,
                        error
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
