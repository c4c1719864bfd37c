//! # FEFO Core
//!
//! 批次分配的核心資料模型與類型定義

pub mod batch;
pub mod config;
pub mod expiry;
pub mod plan;
pub mod request;
pub mod wire;

// Re-export 主要類型
pub use batch::Batch;
pub use config::AllocationPolicy;
pub use plan::{AllocationLine, AllocationResult, ExcludedBatch, ExclusionReason, StaleLine};
pub use request::AllocationRequest;

use rust_decimal::Decimal;

/// FEFO 錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FefoError {
    #[error("無效的分配請求: {0}")]
    InvalidRequest(String),

    #[error("無效的批次 {batch_id}: {reason}")]
    InvalidBatch { batch_id: String, reason: String },

    #[error("分配計劃已過期：{} 個批次庫存不足", .lines.len())]
    StaleAllocation { lines: Vec<StaleLine> },

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl FefoError {
    /// 建立批次錯誤
    pub fn invalid_batch(batch_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBatch {
            batch_id: batch_id.into(),
            reason: reason.into(),
        }
    }

    /// 對應的 HTTP 狀態碼
    pub fn http_status(&self) -> u16 {
        match self {
            FefoError::InvalidRequest(_) | FefoError::InvalidDate(_) => 400,
            FefoError::InvalidBatch { .. } => 422,
            FefoError::StaleAllocation { .. } => 409,
            FefoError::Config(_) => 500,
        }
    }

    /// 重新取得庫存快照後是否可重試
    pub fn is_retryable(&self) -> bool {
        matches!(self, FefoError::StaleAllocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, FefoError>;

/// 檢查請求數量（必須為正數）
pub fn validate_requested_quantity(quantity: Decimal) -> Result<Decimal> {
    if quantity <= Decimal::ZERO {
        return Err(FefoError::InvalidRequest(format!(
            "請求數量必須大於 0，實際為 {}",
            quantity
        )));
    }
    Ok(quantity)
}
