//! 批次（批號）庫存模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plan::StaleLine;
use crate::{FefoError, Result};

/// 批次庫存快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// 批次ID（同一物料、庫位、批號唯一）
    pub batch_id: String,

    /// 物料ID
    pub item_id: String,

    /// 庫位/藥局
    pub location_id: String,

    /// 有效期限（庫存服務回傳的原始字串，無效期物料為 None）
    pub expiry_date: Option<String>,

    /// 現有庫存（基本單位）
    pub on_hand_qty: Decimal,

    /// 入庫時間（同效期時的排序鍵）
    pub received_at: Option<DateTime<Utc>>,

    /// 批次序號（同效期時的排序鍵）
    pub lot_sequence: Option<u64>,
}

impl Batch {
    /// 創建新的批次記錄
    pub fn new(
        batch_id: impl Into<String>,
        item_id: impl Into<String>,
        location_id: impl Into<String>,
        on_hand_qty: Decimal,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            item_id: item_id.into(),
            location_id: location_id.into(),
            expiry_date: None,
            on_hand_qty,
            received_at: None,
            lot_sequence: None,
        }
    }

    /// 建構器模式：設置有效期限
    pub fn with_expiry_date(mut self, expiry_date: impl Into<String>) -> Self {
        self.expiry_date = Some(expiry_date.into());
        self
    }

    /// 建構器模式：設置入庫時間
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    /// 建構器模式：設置批次序號
    pub fn with_lot_sequence(mut self, lot_sequence: u64) -> Self {
        self.lot_sequence = Some(lot_sequence);
        self
    }

    /// 檢查批次是否已無庫存
    pub fn is_empty(&self) -> bool {
        self.on_hand_qty == Decimal::ZERO
    }

    /// 檢查是否屬於指定物料與庫位
    pub fn belongs_to(&self, item_id: &str, location_id: &str) -> bool {
        self.item_id == item_id && self.location_id == location_id
    }

    /// 解析有效期限
    ///
    /// 無效期物料回傳 `Ok(None)`；格式錯誤回傳 `InvalidBatch`。
    pub fn parsed_expiry(&self) -> Result<Option<NaiveDate>> {
        match self.expiry_date.as_deref() {
            None => Ok(None),
            Some(raw) => crate::expiry::parse_expiry(raw)
                .map(Some)
                .map_err(|e| FefoError::invalid_batch(&self.batch_id, e.to_string())),
        }
    }

    /// 檢查庫存數量是否合法
    pub fn validate(&self) -> Result<()> {
        if self.on_hand_qty < Decimal::ZERO {
            return Err(FefoError::invalid_batch(
                &self.batch_id,
                format!("現有庫存不可為負數：{}", self.on_hand_qty),
            ));
        }
        Ok(())
    }

    /// 檢查是否足以扣減
    pub fn can_cover(&self, quantity: Decimal) -> bool {
        quantity <= self.on_hand_qty
    }

    /// 扣減庫存（發藥/調撥過帳）
    pub fn deduct(&mut self, quantity: Decimal) -> Result<()> {
        if !self.can_cover(quantity) {
            return Err(FefoError::StaleAllocation {
                lines: vec![StaleLine::new(
                    self.batch_id.clone(),
                    quantity,
                    self.on_hand_qty,
                )],
            });
        }
        self.on_hand_qty -= quantity;
        Ok(())
    }

    /// 入庫（驗收過帳）
    pub fn receive(&mut self, quantity: Decimal) -> Result<()> {
        self.on_hand_qty = self.on_hand_qty.checked_add(quantity).ok_or_else(|| {
            FefoError::invalid_batch(
                &self.batch_id,
                format!("入庫後數量溢位：{} + {}", self.on_hand_qty, quantity),
            )
        })?;
        Ok(())
    }

    /// 是否與另一批次效期相同
    ///
    /// 可解析時比較日期（`2025-01` 與 `2025-01-31` 視為相同），否則比較原始字串。
    pub fn same_expiry(&self, other: &Batch) -> bool {
        match (self.parsed_expiry(), other.parsed_expiry()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.expiry_date == other.expiry_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_batch() {
        let batch = Batch::new("B-001", "AMOX-500", "MAIN-PHARM", Decimal::from(100))
            .with_expiry_date("2026-03-31")
            .with_lot_sequence(7);

        assert_eq!(batch.batch_id, "B-001");
        assert_eq!(batch.on_hand_qty, Decimal::from(100));
        assert_eq!(batch.lot_sequence, Some(7));
        assert!(!batch.is_empty());
        assert!(batch.belongs_to("AMOX-500", "MAIN-PHARM"));
        assert!(!batch.belongs_to("AMOX-500", "WARD-3"));
        assert_eq!(
            batch.parsed_expiry().unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31)
        );
    }

    #[test]
    fn test_batch_without_expiry() {
        let batch = Batch::new("B-002", "GAUZE", "MAIN-PHARM", Decimal::from(10));
        assert_eq!(batch.parsed_expiry().unwrap(), None);
    }

    #[test]
    fn test_malformed_expiry_is_invalid_batch() {
        let batch = Batch::new("B-003", "AMOX-500", "MAIN-PHARM", Decimal::from(10))
            .with_expiry_date("soon");

        match batch.parsed_expiry() {
            Err(FefoError::InvalidBatch { batch_id, .. }) => assert_eq!(batch_id, "B-003"),
            other => panic!("預期 InvalidBatch，實際為 {:?}", other),
        }
    }

    #[test]
    fn test_negative_on_hand_is_invalid() {
        let batch = Batch::new("B-004", "AMOX-500", "MAIN-PHARM", Decimal::from(-1));
        assert!(matches!(batch.validate(), Err(FefoError::InvalidBatch { .. })));
    }

    #[test]
    fn test_batch_deduct_and_receive() {
        let mut batch = Batch::new("B-005", "PCM-500", "WARD-3", Decimal::from(20));

        assert!(batch.deduct(Decimal::from(15)).is_ok());
        assert_eq!(batch.on_hand_qty, Decimal::from(5));

        // 超量扣減應該失敗且不改變庫存
        match batch.deduct(Decimal::from(6)) {
            Err(FefoError::StaleAllocation { lines }) => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].available_qty, Decimal::from(5));
            }
            other => panic!("預期 StaleAllocation，實際為 {:?}", other),
        }
        assert_eq!(batch.on_hand_qty, Decimal::from(5));

        batch.receive(Decimal::from(10)).unwrap();
        assert_eq!(batch.on_hand_qty, Decimal::from(15));
    }

    #[test]
    fn test_receive_overflow_is_invalid() {
        let mut batch = Batch::new("B-006", "NS-1000", "MAIN-PHARM", Decimal::MAX);

        assert!(matches!(
            batch.receive(Decimal::ONE),
            Err(FefoError::InvalidBatch { .. })
        ));
        assert_eq!(batch.on_hand_qty, Decimal::MAX);
    }

    #[test]
    fn test_same_expiry_compares_dates() {
        let base = Batch::new("B-007", "AMOX-500", "MAIN-PHARM", Decimal::ONE);

        assert!(base
            .clone()
            .with_expiry_date("2025-01")
            .same_expiry(&base.clone().with_expiry_date("2025-01-31")));
        assert!(!base
            .clone()
            .with_expiry_date("2023-01-01")
            .same_expiry(&base.clone().with_expiry_date("2030-01-01")));
        assert!(!base.same_expiry(&base.clone().with_expiry_date("2025-01-01")));
        assert!(base.same_expiry(&base.clone()));
    }
}
