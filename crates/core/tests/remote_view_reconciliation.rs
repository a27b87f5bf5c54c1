//! Integration tests for `RemoteBatchView`
//!
//! Covers count reconciliation, forward-only status reconciliation and the
//! handling of batches the server no longer knows.

mod support;

use leadflow_core::{RemoteBatchView, SharedRegistry};
use leadflow_domain::{
    Batch, BatchPatch, BatchStatus, HistoryEntry, HistoryPage, HistoryQuery, Lead, LeadFlowError,
    LeadPage, LeadQuery, LeadStatus,
};
use support::{memory_registry, product, receipt, summary, FakeLeadApi};

fn seeded(status: BatchStatus, valid: Option<u64>) -> SharedRegistry {
    let registry = memory_registry();
    {
        let mut reg = registry.lock();
        reg.add(Batch::uploaded(&receipt("B1", 30), &product("P1"))).unwrap();
        if status >= BatchStatus::Processed {
            reg.update(
                "B1",
                BatchPatch { valid_count: valid, ..BatchPatch::status(BatchStatus::Processed) },
            );
        }
        if status == BatchStatus::Sent {
            reg.update("B1", BatchPatch::status(BatchStatus::Sent));
        }
    }
    registry
}

fn lead(id: &str, status: LeadStatus) -> Lead {
    Lead {
        id: id.into(),
        candidate_id: format!("cand-{id}"),
        name: "Joao".into(),
        phone: "44988887777".into(),
        status,
        cpf: None,
        course: Some("MBA".into()),
        campus: None,
        enrolled_by: None,
        payment_status: None,
        filter_reason: None,
        crm_lead_id: None,
        consultant_id: None,
        sent_at: None,
        send_error: None,
    }
}

#[tokio::test]
async fn summary_overwrites_cached_counts() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Processed, Some(10));
    let view = RemoteBatchView::new(api.clone(), registry.clone());
    api.push_summary(Ok(summary("B1", 12)));

    let fetched = view.fetch_summary("B1").await.unwrap();
    assert_eq!(fetched.valid_count, 12);

    let reg = registry.lock();
    let batch = reg.get("B1").unwrap();
    assert_eq!(batch.valid_count, Some(12));
    assert_eq!(batch.total_records, Some(32));
    assert_eq!(batch.status, BatchStatus::Processed);
}

#[tokio::test]
async fn summary_advances_status_one_step_at_a_time() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Uploaded, None);
    let view = RemoteBatchView::new(api.clone(), registry.clone());

    let mut sent = summary("B1", 12);
    sent.awaiting_dispatch = 0;
    sent.sent = 11;
    sent.errors = 1;
    api.push_summary(Ok(sent));

    view.fetch_summary("B1").await.unwrap();
    assert_eq!(registry.lock().get("B1").map(|b| b.status), Some(BatchStatus::Sent));
}

#[tokio::test]
async fn summary_never_moves_status_backwards() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Sent, Some(12));
    let view = RemoteBatchView::new(api.clone(), registry.clone());

    let mut pending = summary("B1", 14);
    pending.pending = 3;
    api.push_summary(Ok(pending));

    view.fetch_summary("B1").await.unwrap();
    let reg = registry.lock();
    assert_eq!(reg.get("B1").map(|b| b.status), Some(BatchStatus::Sent));
    assert_eq!(reg.get("B1").and_then(|b| b.valid_count), Some(14));
}

#[tokio::test]
async fn not_found_keeps_local_entry() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Processed, Some(10));
    let view = RemoteBatchView::new(api.clone(), registry.clone());
    api.push_summary(Err(LeadFlowError::NotFound("Lote nao encontrado".into())));

    let err = view.fetch_summary("B1").await.unwrap_err();
    assert!(matches!(err, LeadFlowError::NotFound(_)));
    assert!(!err.is_retryable());
    assert_eq!(registry.lock().get("B1").and_then(|b| b.valid_count), Some(10));
}

#[tokio::test]
async fn network_failure_is_distinct_and_leaves_cache() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Processed, Some(10));
    let view = RemoteBatchView::new(api.clone(), registry.clone());
    api.push_summary(Err(LeadFlowError::Network("timed out".into())));

    let err = view.fetch_summary("B1").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(registry.lock().get("B1").and_then(|b| b.valid_count), Some(10));
}

#[tokio::test]
async fn summary_for_unregistered_batch_is_returned_untouched() {
    let api = FakeLeadApi::new();
    let registry = memory_registry();
    let view = RemoteBatchView::new(api.clone(), registry.clone());
    api.push_summary(Ok(summary("B9", 4)));

    let fetched = view.fetch_summary("B9").await.unwrap();
    assert_eq!(fetched.batch_id, "B9");
    assert!(registry.lock().is_empty());
}

#[tokio::test]
async fn truncated_lead_page_reports_coverage_against_known_total() {
    let api = FakeLeadApi::new();
    let registry = seeded(BatchStatus::Processed, Some(10));
    let view = RemoteBatchView::new(api.clone(), registry);
    api.push_leads(Ok(LeadPage {
        leads: vec![lead("1", LeadStatus::Processed), lead("2", LeadStatus::Duplicate)],
        total: 2,
    }));

    let page = view.fetch_leads("B1", LeadQuery::default()).await.unwrap();
    let known = view.known_total("B1", None);
    assert_eq!(known, Some(30));
    assert_eq!(page.coverage_hint(known).as_deref(), Some("showing 2 of 30"));
    assert_eq!(view.known_total("B1", Some(LeadStatus::Sent)), None);
}

#[tokio::test]
async fn history_is_passed_through() {
    let api = FakeLeadApi::new();
    let view = RemoteBatchView::new(api.clone(), memory_registry());
    api.push_history(Ok(HistoryPage {
        entries: vec![HistoryEntry {
            candidate_id: "cand-1".into(),
            product_id: Some("P1".into()),
            batch_id: Some("B1".into()),
            sent_at: None,
        }],
        total: 1,
    }));

    let page = view.fetch_history(HistoryQuery::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.entries[0].candidate_id, "cand-1");
    assert_eq!(api.calls(), ["history:0"]);
}
