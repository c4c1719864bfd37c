//! 分配請求模型

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FefoError, Result};

/// 分配請求（單一物料、單一庫位）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// 物料ID
    pub item_id: String,

    /// 庫位/藥局
    pub location_id: String,

    /// 請求數量（基本單位）
    pub requested_qty: Decimal,

    /// 來源單據（如發藥單號、調撥單號）
    pub source_ref: Option<String>,
}

impl AllocationRequest {
    /// 創建新的分配請求
    pub fn new(
        item_id: impl Into<String>,
        location_id: impl Into<String>,
        requested_qty: Decimal,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            location_id: location_id.into(),
            requested_qty,
            source_ref: None,
        }
    }

    /// 由浮點數量建立請求（外部介面常以 JSON number 傳入）
    pub fn from_f64(
        item_id: impl Into<String>,
        location_id: impl Into<String>,
        requested_qty: f64,
    ) -> Result<Self> {
        if !requested_qty.is_finite() {
            return Err(FefoError::InvalidRequest(format!(
                "請求數量必須為有限數值，實際為 {}",
                requested_qty
            )));
        }
        let quantity = Decimal::from_f64(requested_qty).ok_or_else(|| {
            FefoError::InvalidRequest(format!("請求數量超出範圍：{}", requested_qty))
        })?;
        if requested_qty > 0.0 && quantity.is_zero() {
            return Err(FefoError::InvalidRequest(format!(
                "請求數量 {:e} 低於支援的精度",
                requested_qty
            )));
        }

        let request = Self::new(item_id, location_id, quantity.normalize());
        request.validate()?;
        Ok(request)
    }

    /// 建構器模式：設置來源單據
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// 檢查請求是否合法
    pub fn validate(&self) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(FefoError::InvalidRequest("缺少物料ID".to_string()));
        }
        if self.location_id.trim().is_empty() {
            return Err(FefoError::InvalidRequest("缺少庫位ID".to_string()));
        }
        crate::validate_requested_quantity(self.requested_qty)?;
        Ok(())
    }

    /// 物料與庫位組合鍵
    pub fn stock_key(&self) -> (&str, &str) {
        (&self.item_id, &self.location_id)
    }
}
