//! 分配策略配置

use serde::{Deserialize, Serialize};

use crate::{FefoError, Result};

/// 最短剩餘效期上限（天）
const MAX_SHELF_LIFE_DAYS: u32 = 3650;

/// FEFO 分配策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    /// 是否排除已過期批次（預設排除）
    ///
    /// 銷毀/退貨流程可關閉此選項以取得過期批次。
    pub exclude_expired: bool,

    /// 最短剩餘效期（天）
    /// - 0: 只排除已過期批次（預設）
    /// - N: 效期早於「基準日 + N 天」的批次一併排除
    ///
    /// 僅在 `exclude_expired` 為 true 時生效。
    pub min_shelf_life_days: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            exclude_expired: true,
            min_shelf_life_days: 0,
        }
    }
}

impl AllocationPolicy {
    /// 創建預設策略
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置是否排除過期批次
    ///
    /// # 範例
    /// ```
    /// # use fefo_core::AllocationPolicy;
    /// let policy = AllocationPolicy::new().with_exclude_expired(false); // 銷毀流程
    /// assert!(!policy.exclude_expired);
    /// ```
    pub fn with_exclude_expired(mut self, exclude: bool) -> Self {
        self.exclude_expired = exclude;
        self
    }

    /// 建構器模式：設置最短剩餘效期
    pub fn with_min_shelf_life_days(mut self, days: u32) -> Self {
        self.min_shelf_life_days = days;
        self
    }

    /// 從 JSON 載入策略
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| FefoError::Config(format!("無法解析分配策略: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    /// 檢查策略是否合法
    pub fn validate(&self) -> Result<()> {
        if self.min_shelf_life_days > MAX_SHELF_LIFE_DAYS {
            return Err(FefoError::Config(format!(
                "最短剩餘效期不可超過 {} 天，實際為 {}",
                MAX_SHELF_LIFE_DAYS, self.min_shelf_life_days
            )));
        }
        Ok(())
    }

    /// 是否需要解析效期
    pub fn requires_expiry(&self) -> bool {
        self.exclude_expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = AllocationPolicy::default();

        assert!(policy.exclude_expired);
        assert_eq!(policy.min_shelf_life_days, 0);
        assert!(policy.requires_expiry());
    }

    #[test]
    fn test_policy_builder() {
        let policy = AllocationPolicy::new()
            .with_exclude_expired(false)
            .with_min_shelf_life_days(30);

        assert!(!policy.exclude_expired);
        assert_eq!(policy.min_shelf_life_days, 30);
        assert!(!policy.requires_expiry());
    }

    #[test]
    fn test_policy_from_json() {
        let policy = AllocationPolicy::from_json(r#"{"min_shelf_life_days": 14}"#).unwrap();
        assert!(policy.exclude_expired);
        assert_eq!(policy.min_shelf_life_days, 14);

        let policy = AllocationPolicy::from_json(r#"{"exclude_expired": false}"#).unwrap();
        assert!(!policy.exclude_expired);
    }

    #[test]
    fn test_policy_from_json_rejects_invalid() {
        assert!(matches!(
            AllocationPolicy::from_json("not json"),
            Err(FefoError::Config(_))
        ));
        assert!(matches!(
            AllocationPolicy::from_json(r#"{"min_shelf_life_days": 99999}"#),
            Err(FefoError::Config(_))
        ));
    }
}
