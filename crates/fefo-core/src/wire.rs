//! 對外介面的請求/回應結構（JSON）
//!
//! 供嵌入 HTTP 端點（如 `/stock/fefo`、`/dispenses/{id}/fefo-suggest`）使用，
//! 本 crate 不處理傳輸本身。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AllocationRequest, AllocationResult, FefoError, Result, StaleLine};

/// FEFO 建議請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub item_id: String,
    pub location_id: String,

    /// 請求數量（基本單位）
    #[serde(alias = "qty_base")]
    pub requested_quantity: f64,

    /// 基準日，未提供時由呼叫端決定（通常為當天）
    #[serde(default)]
    pub as_of_date: Option<NaiveDate>,
}

impl SuggestRequest {
    /// 解析 JSON 請求
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FefoError::InvalidRequest(format!("無法解析請求: {}", e)))
    }

    /// 轉換為分配請求
    pub fn to_request(&self) -> Result<AllocationRequest> {
        AllocationRequest::from_f64(
            self.item_id.clone(),
            self.location_id.clone(),
            self.requested_quantity,
        )
    }

    /// 取得基準日
    pub fn as_of_or(&self, default: NaiveDate) -> NaiveDate {
        self.as_of_date.unwrap_or(default)
    }
}

/// 回應中的分配明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestLine {
    pub batch_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

/// FEFO 建議回應
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub plan: Vec<SuggestLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub fulfilled: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shortfall: Decimal,
}

impl From<&AllocationResult> for SuggestResponse {
    fn from(result: &AllocationResult) -> Self {
        Self {
            plan: result
                .plan
                .iter()
                .map(|line| SuggestLine {
                    batch_id: line.batch_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            fulfilled: result.fulfilled,
            shortfall: result.shortfall,
        }
    }
}

/// 錯誤回應
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP 狀態碼
    pub status: u16,

    /// 錯誤代碼
    pub code: String,

    /// 錯誤訊息
    pub message: String,

    /// 過帳時庫存不足的明細（僅 StaleAllocation）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_lines: Vec<StaleLine>,
}

impl From<&FefoError> for ErrorResponse {
    fn from(error: &FefoError) -> Self {
        let code = match error {
            FefoError::InvalidRequest(_) => "invalid_request",
            FefoError::InvalidBatch { .. } => "invalid_batch",
            FefoError::StaleAllocation { .. } => "stale_allocation",
            FefoError::InvalidDate(_) => "invalid_date",
            FefoError::Config(_) => "config_error",
        };
        let stale_lines = match error {
            FefoError::StaleAllocation { lines } => lines.clone(),
            _ => Vec::new(),
        };

        Self {
            status: error.http_status(),
            code: code.to_string(),
            message: error.to_string(),
            stale_lines,
        }
    }
}
