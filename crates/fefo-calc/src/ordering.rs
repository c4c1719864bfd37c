//! FEFO 排序

use std::cmp::Ordering;

use crate::eligibility::EligibleBatch;

/// FEFO 排序器
///
/// 排序鍵依序為：
/// 1. 效期（早者優先，無效期物料排最後）
/// 2. 入庫時間（有值者優先）
/// 3. 批次序號（有值者優先）
/// 4. 批次ID（皆為數字時按數值，否則按字典序）
///
/// 最後一層以批次ID決定，快照內批次ID唯一，因此結果與輸入順序無關。
pub struct FefoOrdering;

impl FefoOrdering {
    /// 依 FEFO 規則排序
    pub fn sort(batches: &mut [EligibleBatch<'_>]) {
        batches.sort_by(Self::compare);
    }

    /// 比較兩個批次的分配先後
    pub fn compare(a: &EligibleBatch<'_>, b: &EligibleBatch<'_>) -> Ordering {
        present_first(a.expiry, b.expiry)
            .then_with(|| present_first(a.batch.received_at, b.batch.received_at))
            .then_with(|| present_first(a.batch.lot_sequence, b.batch.lot_sequence))
            .then_with(|| compare_batch_ids(&a.batch.batch_id, &b.batch.batch_id))
    }
}

/// 有值者在前，皆有值時升冪
fn present_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 比較批次ID
///
/// 兩者皆為純數字時按數值比較（"9" < "10"），否則按字典序。
pub fn compare_batch_ids(a: &str, b: &str) -> Ordering {
    let is_numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());

    if is_numeric(a) && is_numeric(b) {
        let a_digits = a.trim_start_matches('0');
        let b_digits = b.trim_start_matches('0');
        a_digits
            .len()
            .cmp(&b_digits.len())
            .then_with(|| a_digits.cmp(b_digits))
            .then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}
