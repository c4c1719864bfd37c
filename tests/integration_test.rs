//! 集成測試

use chrono::NaiveDate;
use fefo::{
    handle_suggest, AllocationPolicy, AllocationRequest, Batch, DispenseOutcome,
    DispenseWorkflow, DocumentPlanner, FefoAllocator, InMemoryLedger, ShortfallDecision,
    StockIssue, StockPosting, StockQuery,
};
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::thread;

/// 直接回傳固定快照的庫存服務（可含不合法資料）
struct Snapshot(Vec<Batch>);

impl StockQuery for Snapshot {
    fn batches_for(&self, item_id: &str, location_id: &str) -> fefo::Result<Vec<Batch>> {
        Ok(self
            .0
            .iter()
            .filter(|b| b.belongs_to(item_id, location_id))
            .cloned()
            .collect())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn batch(id: &str, qty: i64, expiry: &str) -> Batch {
    Batch::new(id, "AMOX-500", "MAIN-PHARM", Decimal::from(qty)).with_expiry_date(expiry)
}

fn suggest(batches: Vec<Batch>, qty: Value) -> (u16, Value) {
    let body = json!({
        "item_id": "AMOX-500",
        "location_id": "MAIN-PHARM",
        "qty_base": qty,
        "as_of_date": "2024-01-01"
    })
    .to_string();

    let (status, response) = handle_suggest(
        &Snapshot(batches),
        &FefoAllocator::default(),
        &body,
        today(),
    );
    (status, serde_json::from_str(&response).unwrap())
}

#[rstest]
#[case::earliest_expiry_first(
    vec![batch("B1", 10, "2025-01-01"), batch("B2", 5, "2024-06-01")],
    8,
    json!({"plan": [{"batch_id": "B2", "quantity": 5.0}, {"batch_id": "B1", "quantity": 3.0}], "fulfilled": 8.0, "shortfall": 0.0})
)]
#[case::partial_fulfilment(
    vec![batch("B1", 3, "2024-06-01")],
    10,
    json!({"plan": [{"batch_id": "B1", "quantity": 3.0}], "fulfilled": 3.0, "shortfall": 7.0})
)]
#[case::expired_excluded(
    vec![batch("B1", 5, "2023-01-01")],
    5,
    json!({"plan": [], "fulfilled": 0.0, "shortfall": 5.0})
)]
#[case::no_batches(
    vec![],
    4,
    json!({"plan": [], "fulfilled": 0.0, "shortfall": 4.0})
)]
#[case::same_expiry_smaller_id_first(
    vec![batch("B2", 5, "2025-01-01"), batch("B1", 5, "2025-01-01")],
    6,
    json!({"plan": [{"batch_id": "B1", "quantity": 5.0}, {"batch_id": "B2", "quantity": 1.0}], "fulfilled": 6.0, "shortfall": 0.0})
)]
fn test_suggest_endpoint_scenarios(
    #[case] batches: Vec<Batch>,
    #[case] qty: i64,
    #[case] expected: Value,
) {
    let (status, response) = suggest(batches, json!(qty));

    assert_eq!(status, 200);
    assert_eq!(response, expected);
}

#[test]
fn test_suggest_endpoint_zero_quantity_is_400() {
    let (status, response) = suggest(vec![batch("B1", 5, "2025-01-01")], json!(0));

    assert_eq!(status, 400);
    assert_eq!(response["code"], "invalid_request");
}

#[test]
fn test_suggest_endpoint_negative_on_hand_is_422() {
    let (status, response) = suggest(vec![batch("B1", -1, "2025-01-01")], json!(3));

    assert_eq!(status, 422);
    assert_eq!(response["code"], "invalid_batch");
}

#[test]
fn test_suggest_endpoint_defaults_as_of_to_today() {
    let body = r#"{"item_id": "AMOX-500", "location_id": "MAIN-PHARM", "requested_quantity": 2}"#;
    let stock = Snapshot(vec![batch("OLD", 5, "2024-03-01"), batch("NEW", 5, "2025-03-01")]);

    // 基準日 2024-06-01：OLD 已過期
    let (status, response) = handle_suggest(
        &stock,
        &FefoAllocator::default(),
        body,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    );
    let response: Value = serde_json::from_str(&response).unwrap();

    assert_eq!(status, 200);
    assert_eq!(response["plan"][0]["batch_id"], "NEW");
}

#[test]
fn test_concurrent_dispenses_never_oversell() {
    let ledger = InMemoryLedger::with_batches(vec![
        batch("B1", 6, "2024-06-01"),
        batch("B2", 4, "2025-01-01"),
    ])
    .unwrap();

    let outcomes: Vec<DispenseOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = &ledger;
                scope.spawn(move || {
                    let workflow = DispenseWorkflow::new(ledger, FefoAllocator::default());
                    let request =
                        AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(4))
                            .with_source_ref(format!("DISP-{}", i));
                    workflow
                        .dispense(&request, today(), ShortfallDecision::ProceedPartial, 5)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let posted: Decimal = outcomes
        .iter()
        .filter_map(|o| o.receipt())
        .map(|r| r.posted_qty())
        .sum();

    assert_eq!(posted, Decimal::from(10));
    assert_eq!(
        ledger.total_on_hand("AMOX-500", "MAIN-PHARM").unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn test_document_plan_then_post() {
    let ledger = InMemoryLedger::with_batches(vec![
        batch("A1", 6, "2024-06-01"),
        batch("A2", 10, "2025-01-01"),
        Batch::new("P1", "PCM-500", "MAIN-PHARM", Decimal::from(30)).with_expiry_date("2026-01"),
    ])
    .unwrap();
    let lines = vec![
        AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(4)),
        AllocationRequest::new("PCM-500", "MAIN-PHARM", Decimal::from(12)),
        AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(4)),
    ];

    let mut snapshot = ledger.batches_for("AMOX-500", "MAIN-PHARM").unwrap();
    snapshot.extend(ledger.batches_for("PCM-500", "MAIN-PHARM").unwrap());

    let allocator = FefoAllocator::default();
    let results = DocumentPlanner::new(&allocator)
        .plan(&lines, &snapshot, today())
        .unwrap();

    for (line, result) in lines.iter().zip(&results) {
        assert!(result.is_fulfilled());
        ledger
            .post_issue(&StockIssue::new(
                line.item_id.clone(),
                line.location_id.clone(),
                result.plan.clone(),
            ))
            .unwrap();
    }

    assert_eq!(ledger.on_hand("A1"), Some(Decimal::ZERO));
    assert_eq!(ledger.on_hand("A2"), Some(Decimal::from(8)));
    assert_eq!(ledger.on_hand("P1"), Some(Decimal::from(18)));
}

#[test]
fn test_destruction_workflow_takes_expired_stock() {
    let ledger = InMemoryLedger::with_batches(vec![
        batch("EXP", 5, "2023-06-01"),
        batch("OK", 5, "2025-06-01"),
    ])
    .unwrap();
    let allocator = FefoAllocator::new(AllocationPolicy::new().with_exclude_expired(false));
    let workflow = DispenseWorkflow::new(ledger, allocator);
    let request = AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(5))
        .with_source_ref("DESTROY-0001");

    let outcome = workflow
        .dispense(&request, today(), ShortfallDecision::Cancel, 1)
        .unwrap();

    let receipt = outcome.receipt().unwrap();
    assert_eq!(receipt.issue.lines[0].batch_id, "EXP");
    assert_eq!(workflow.stock().on_hand("EXP"), Some(Decimal::ZERO));
    assert_eq!(workflow.stock().on_hand("OK"), Some(Decimal::from(5)));
}

#[test]
fn test_short_dated_policy_from_json() {
    let policy = AllocationPolicy::from_json(r#"{"min_shelf_life_days": 90}"#).unwrap();
    let ledger = InMemoryLedger::with_batches(vec![
        batch("SOON", 5, "2024-02-15"),
        batch("LATER", 5, "2024-12-31"),
    ])
    .unwrap();
    let workflow = DispenseWorkflow::new(ledger, FefoAllocator::new(policy));

    let pending = workflow
        .suggest(
            &AllocationRequest::new("AMOX-500", "MAIN-PHARM", Decimal::from(3)),
            today(),
        )
        .unwrap();

    assert_eq!(pending.result.plan[0].batch_id, "LATER");
    assert_eq!(pending.result.excluded[0].batch_id, "SOON");
}
