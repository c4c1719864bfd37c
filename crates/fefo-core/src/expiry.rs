//! 有效期限解析與判斷

use chrono::{DateTime, Days, NaiveDate};

use crate::{FefoError, Result};

/// 解析有效期限字串
///
/// 支援格式：
/// - `YYYY-MM-DD`
/// - RFC 3339 時間戳（取日期部分）
/// - `YYYY-MM` 或 `MM/YYYY`（藥品包裝常見標示，視為該月最後一天）
pub fn parse_expiry(raw: &str) -> Result<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FefoError::InvalidDate("有效期限為空字串".to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.date_naive());
    }

    if let Some((year, month)) = parse_month_precision(text) {
        return last_day_of_month(year, month)
            .ok_or_else(|| FefoError::InvalidDate(format!("無法解析的有效期限: {}", raw)));
    }

    Err(FefoError::InvalidDate(format!("無法解析的有效期限: {}", raw)))
}

/// 解析月份精度的效期（`YYYY-MM` / `MM/YYYY`）
fn parse_month_precision(text: &str) -> Option<(i32, u32)> {
    let (year, month) = if let Some((y, m)) = text.split_once('-') {
        (y, m)
    } else if let Some((m, y)) = text.split_once('/') {
        (y, m)
    } else {
        return None;
    };

    if year.len() != 4 || !(1..=2).contains(&month.len()) {
        return None;
    }
    if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// 取得某月最後一天
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    first_of_next.pred_opt()
}

/// 檢查是否已過期（效期早於基準日）
///
/// 效期當天仍可使用。
pub fn is_expired(expiry: NaiveDate, as_of: NaiveDate) -> bool {
    expiry < as_of
}

/// 檢查是否為短效期批次（剩餘效期不足 `min_shelf_life_days` 天）
pub fn is_short_dated(expiry: NaiveDate, as_of: NaiveDate, min_shelf_life_days: u32) -> bool {
    match as_of.checked_add_days(Days::new(u64::from(min_shelf_life_days))) {
        Some(cutoff) => expiry < cutoff,
        None => true,
    }
}

/// 計算剩餘效期天數（已過期為負數）
pub fn days_until_expiry(expiry: NaiveDate, as_of: NaiveDate) -> i64 {
    (expiry - as_of).num_days()
}
