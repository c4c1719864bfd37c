//! 批次資格篩選

use chrono::NaiveDate;
use fefo_core::expiry;
use fefo_core::{AllocationPolicy, Batch, ExcludedBatch, ExclusionReason, FefoError};
use std::collections::HashSet;

/// 可分配的批次
#[derive(Debug, Clone)]
pub struct EligibleBatch<'a> {
    /// 原始批次快照
    pub batch: &'a Batch,
    /// 解析後的效期（無效期物料為 None）
    pub expiry: Option<NaiveDate>,
}

/// 篩選結果
#[derive(Debug, Clone)]
pub struct Eligibility<'a> {
    /// 可分配批次（依輸入順序）
    pub eligible: Vec<EligibleBatch<'a>>,
    /// 被排除批次（依輸入順序）
    pub excluded: Vec<ExcludedBatch>,
}

/// 批次資格篩選器
pub struct EligibilityFilter;

impl EligibilityFilter {
    /// 篩選可分配批次
    ///
    /// 先驗證整份快照（負庫存、重複批次ID、效期格式），任何一筆不合法即失敗；
    /// 再排除無庫存、已過期及短效期批次。
    ///
    /// 效期格式錯誤只在 `exclude_expired` 為 true 時視為錯誤，
    /// 否則該批次視為無效期物料。
    pub fn apply<'a>(
        batches: &'a [Batch],
        policy: &AllocationPolicy,
        as_of: NaiveDate,
    ) -> fefo_core::Result<Eligibility<'a>> {
        let parsed = Self::validate(batches, policy)?;

        let mut eligible = Vec::with_capacity(parsed.len());
        let mut excluded = Vec::new();

        for (batch, expiry) in parsed {
            match Self::exclusion_reason(batch, expiry, policy, as_of) {
                Some(reason) => {
                    tracing::debug!("排除批次 {}: {:?}", batch.batch_id, reason);
                    excluded.push(ExcludedBatch::new(batch.batch_id.clone(), reason));
                }
                None => eligible.push(EligibleBatch { batch, expiry }),
            }
        }

        Ok(Eligibility { eligible, excluded })
    }

    /// 驗證快照並解析效期
    fn validate<'a>(
        batches: &'a [Batch],
        policy: &AllocationPolicy,
    ) -> fefo_core::Result<Vec<(&'a Batch, Option<NaiveDate>)>> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(batches.len());
        let mut parsed = Vec::with_capacity(batches.len());

        for batch in batches {
            batch.validate()?;

            if !seen.insert(batch.batch_id.as_str()) {
                return Err(FefoError::invalid_batch(
                    &batch.batch_id,
                    "同一快照中批次ID重複",
                ));
            }

            let expiry = if policy.requires_expiry() {
                batch.parsed_expiry()?
            } else {
                batch.parsed_expiry().ok().flatten()
            };

            parsed.push((batch, expiry));
        }

        Ok(parsed)
    }

    /// 判斷批次是否需要排除
    fn exclusion_reason(
        batch: &Batch,
        expiry_date: Option<NaiveDate>,
        policy: &AllocationPolicy,
        as_of: NaiveDate,
    ) -> Option<ExclusionReason> {
        if batch.is_empty() {
            return Some(ExclusionReason::Empty);
        }

        if !policy.exclude_expired {
            return None;
        }

        // 無效期物料永不過期
        let expiry_date = expiry_date?;

        if expiry::is_expired(expiry_date, as_of) {
            Some(ExclusionReason::Expired)
        } else if policy.min_shelf_life_days > 0
            && expiry::is_short_dated(expiry_date, as_of, policy.min_shelf_life_days)
        {
            tracing::debug!(
                "批次 {} 剩餘效期 {} 天，低於 {} 天",
                batch.batch_id,
                expiry::days_until_expiry(expiry_date, as_of),
                policy.min_shelf_life_days
            );
            Some(ExclusionReason::ShortDated)
        } else {
            None
        }
    }
}
