//! 發藥 FEFO 分配示例

use chrono::NaiveDate;
use fefo::{
    handle_suggest, AllocationRequest, Batch, DispenseOutcome, DispenseWorkflow, FefoAllocator,
    InMemoryLedger, ShortfallDecision,
};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== 發藥 FEFO 分配示例 ===\n");

    // 建立藥局庫存
    let ledger = InMemoryLedger::with_batches(vec![
        Batch::new("AMX-2401", "AMOX-500", "MAIN-PHARM", Decimal::from(10))
            .with_expiry_date("2025-01-01"),
        Batch::new("AMX-2312", "AMOX-500", "MAIN-PHARM", Decimal::from(5))
            .with_expiry_date("06/2024"),
        Batch::new("AMX-2206", "AMOX-500", "MAIN-PHARM", Decimal::from(8))
            .with_expiry_date("2023-12-31"),
    ])?;
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("合法日期");

    // JSON 介面
    let body = r#"{"item_id": "AMOX-500", "location_id": "MAIN-PHARM", "qty_base": 8}"#;
    let (status, response) = handle_suggest(&ledger, &FefoAllocator::default(), body, today);
    println!("POST /stock/fefo {}\n  → {} {}\n", body, status, response);

    // 建議 → 確認 → 過帳
    let workflow = DispenseWorkflow::new(ledger, FefoAllocator::default());
    let request = AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(20))
        .with_source_ref("DISP-2024-0001");

    let pending = workflow.suggest(&request, today)?;
    println!("分配建議:");
    for line in &pending.result.plan {
        println!(
            "  - 批次: {}, 數量: {}, 效期: {:?}",
            line.batch_id, line.quantity, line.expiry_date
        );
    }
    for excluded in &pending.result.excluded {
        println!("  × 排除批次: {} ({:?})", excluded.batch_id, excluded.reason);
    }
    println!(
        "已分配 {}，短缺 {}\n",
        pending.result.fulfilled, pending.result.shortfall
    );

    match workflow.commit(&pending, ShortfallDecision::ProceedPartial)? {
        DispenseOutcome::Committed(receipt) => {
            println!("過帳完成 {}：數量 {}", receipt.id, receipt.posted_qty())
        }
        DispenseOutcome::Cancelled { shortfall } => println!("已取消，短缺 {}", shortfall),
        DispenseOutcome::NoStock { shortfall } => println!("無庫存，短缺 {}", shortfall),
    }

    println!(
        "剩餘可用庫存: {}",
        workflow.stock().total_on_hand("AMOX-500", "MAIN-PHARM")?
    );

    Ok(())
}
