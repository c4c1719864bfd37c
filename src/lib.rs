//! # FEFO
//!
//! 藥局先到期先出（FEFO）批次分配：核心模型、分配引擎與發藥流程

pub use fefo_calc::{DocumentPlanner, FefoAllocator};
pub use fefo_core::wire::{ErrorResponse, SuggestRequest, SuggestResponse};
pub use fefo_core::{
    AllocationLine, AllocationPolicy, AllocationRequest, AllocationResult, Batch, FefoError,
    Result,
};
pub use fefo_ledger::{
    DispenseOutcome, DispenseWorkflow, InMemoryLedger, PendingDispense, PostingReceipt,
    ShortfallDecision, StockIssue, StockPosting, StockQuery,
};

use chrono::NaiveDate;

/// 處理一筆 FEFO 建議請求（JSON 進、JSON 出）
///
/// 回傳 HTTP 狀態碼與回應內容，供嵌入的 HTTP 端點直接使用。
/// `today` 為請求未帶 `as_of_date` 時的基準日。
pub fn handle_suggest<Q: StockQuery>(
    stock: &Q,
    allocator: &FefoAllocator,
    body: &str,
    today: NaiveDate,
) -> (u16, String) {
    match suggest_json(stock, allocator, body, today) {
        Ok(response) => (200, to_json(&response)),
        Err(error) => (error.http_status(), to_json(&ErrorResponse::from(&error))),
    }
}

fn suggest_json<Q: StockQuery>(
    stock: &Q,
    allocator: &FefoAllocator,
    body: &str,
    today: NaiveDate,
) -> Result<SuggestResponse> {
    let wire = SuggestRequest::from_json(body)?;
    let request = wire.to_request()?;
    let snapshot = stock.batches_for(&request.item_id, &request.location_id)?;
    let result = allocator.suggest(&request, &snapshot, wire.as_of_or(today))?;
    Ok(SuggestResponse::from(&result))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        serde_json::json!({
            "status": 500,
            "code": "serialization_error",
            "message": e.to_string(),
        })
        .to_string()
    })
}
