//! FEFO 分配器

use chrono::NaiveDate;
use fefo_core::{
    AllocationLine, AllocationPolicy, AllocationRequest, AllocationResult, Batch, FefoError,
};
use rust_decimal::Decimal;

use crate::eligibility::EligibilityFilter;
use crate::ordering::FefoOrdering;

/// FEFO 分配器
///
/// 純函數：只讀取輸入的批次快照，不修改庫存、不讀取系統時間。
#[derive(Debug, Clone, Default)]
pub struct FefoAllocator {
    /// 分配策略
    policy: AllocationPolicy,
}

impl FefoAllocator {
    /// 創建新的分配器
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    /// 取得分配策略
    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// 主分配入口
    ///
    /// # 參數
    /// * `batches` - 目標物料、庫位的全部批次
    /// * `requested_qty` - 請求數量（必須大於 0）
    /// * `as_of` - 判斷過期的基準日
    ///
    /// 庫存不足時回傳 `shortfall > 0` 的結果，而非錯誤。
    pub fn plan_allocation(
        &self,
        batches: &[Batch],
        requested_qty: Decimal,
        as_of: NaiveDate,
    ) -> fefo_core::Result<AllocationResult> {
        fefo_core::validate_requested_quantity(requested_qty)?;

        tracing::info!(
            "開始 FEFO 分配：批次 {} 筆，請求數量 {}，基準日 {}",
            batches.len(),
            requested_qty,
            as_of
        );

        // Step 1: 篩選可分配批次
        tracing::debug!("Step 1: 批次篩選");
        let eligibility = EligibilityFilter::apply(batches, &self.policy, as_of)?;
        let mut eligible = eligibility.eligible;
        tracing::debug!(
            "可分配批次 {} 筆，排除 {} 筆",
            eligible.len(),
            eligibility.excluded.len()
        );

        // Step 2: 依效期排序
        tracing::debug!("Step 2: FEFO 排序");
        FefoOrdering::sort(&mut eligible);

        // Step 3: 逐批次分配，直到滿足請求數量
        tracing::debug!("Step 3: 逐批次分配");
        let mut result = AllocationResult::empty(requested_qty);
        for candidate in &eligible {
            if result.shortfall <= Decimal::ZERO {
                break;
            }

            let take = candidate.batch.on_hand_qty.min(result.shortfall);
            tracing::debug!(
                "批次 {} (效期 {:?})：現有 {}，分配 {}",
                candidate.batch.batch_id,
                candidate.expiry,
                candidate.batch.on_hand_qty,
                take
            );
            result.add_line(AllocationLine::new(
                candidate.batch.batch_id.clone(),
                take,
                candidate.expiry,
            ));
        }

        for excluded in eligibility.excluded {
            result.add_excluded(excluded);
        }

        if result.is_fulfilled() {
            tracing::info!("FEFO 分配完成：{} 個批次", result.plan.len());
        } else {
            tracing::info!(
                "FEFO 分配完成：{} 個批次，短缺 {}",
                result.plan.len(),
                result.shortfall
            );
        }

        Ok(result)
    }

    /// 依分配請求建議批次
    ///
    /// 與 [`plan_allocation`](Self::plan_allocation) 相同，但會先檢查請求本身，
    /// 並要求每個批次都屬於請求的物料與庫位。
    pub fn suggest(
        &self,
        request: &AllocationRequest,
        batches: &[Batch],
        as_of: NaiveDate,
    ) -> fefo_core::Result<AllocationResult> {
        request.validate()?;

        if let Some(foreign) = batches
            .iter()
            .find(|b| !b.belongs_to(&request.item_id, &request.location_id))
        {
            return Err(FefoError::invalid_batch(
                &foreign.batch_id,
                format!(
                    "批次屬於 {}@{}，與請求的 {}@{} 不符",
                    foreign.item_id, foreign.location_id, request.item_id, request.location_id
                ),
            ));
        }

        self.plan_allocation(batches, request.requested_qty, as_of)
    }
}
