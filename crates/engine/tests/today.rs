mod common;

use common::{Scripted, credit, date, debit, ledger};
use engine::{
    MoneyCents, Phase, TransactionType, WriteError, memory::MemoryLedger, today::TodayLedgerView,
};

fn today() -> chrono::NaiveDate {
    date(2024, 1, 15)
}

async fn loaded_view(ledger: &MemoryLedger) -> TodayLedgerView {
    let mut view = TodayLedgerView::new(today(), "cash");
    view.load_options(ledger).await.unwrap();
    view.refresh(ledger, today()).await;
    view
}

#[tokio::test]
async fn debit_edited_into_credit_moves_between_pipelines() {
    let ledger = ledger();
    let stationery = ledger
        .record(
            TransactionType::Debit,
            "misc",
            "cash",
            MoneyCents::from_major(500),
            today(),
            "stationery",
        )
        .unwrap();
    credit(&ledger, 200, today());

    let mut view = loaded_view(&ledger).await;
    assert_eq!(view.debit().total(), MoneyCents::from_major(500));
    assert_eq!(view.credit().total(), MoneyCents::from_major(200));

    view.begin_edit(&ledger, TransactionType::Debit, &stationery.id)
        .await
        .unwrap();
    view.set_draft_kind(&ledger, Some(TransactionType::Credit))
        .await;
    assert_eq!(
        view.draft().category.as_ref().map(|c| c.id.as_str()),
        Some("misc")
    );
    view.submit(&ledger, today()).await.unwrap();

    assert!(view.debit().find(&stationery.id).is_none());
    assert_eq!(view.debit().total(), MoneyCents::ZERO);
    assert!(view.credit().find(&stationery.id).is_some());
    assert_eq!(view.credit().total(), MoneyCents::from_major(700));
    assert!(view.editing().is_none());
}

#[tokio::test]
async fn new_entry_is_created_with_cash_preselected() {
    let ledger = ledger();
    let mut view = loaded_view(&ledger).await;
    assert_eq!(view.draft().payment_method.as_deref(), Some("cash"));

    view.set_draft_kind(&ledger, Some(TransactionType::Debit))
        .await;
    let rent = view
        .categories()
        .categories()
        .iter()
        .find(|c| c.id == "rent")
        .cloned();
    let draft = view.draft_mut();
    draft.set_category(rent).unwrap();
    draft.set_amount(MoneyCents::from_major(120)).unwrap();
    draft.remarks = "  January rent ".to_string();

    let saved = view.submit(&ledger, today()).await.unwrap();
    assert_eq!(saved.remarks, "January rent");
    assert_eq!(saved.payment_method.name, "Cash");
    assert_eq!(ledger.len(), 1);
    assert_eq!(view.debit().entries().len(), 1);
    assert_eq!(view.debit().total(), MoneyCents::from_major(120));
    // Ready for the next entry.
    assert_eq!(view.draft().kind, None);
    assert_eq!(view.draft().payment_method.as_deref(), Some("cash"));
}

#[tokio::test]
async fn rejected_write_keeps_draft_and_totals() {
    let ledger = ledger();
    let rent = debit(&ledger, 80, today());
    let flaky = Scripted::new(&ledger);

    let mut view = TodayLedgerView::new(today(), "cash");
    view.refresh(&flaky, today()).await;
    view.begin_edit(&flaky, TransactionType::Debit, &rent.id)
        .await
        .unwrap();
    view.draft_mut()
        .set_amount(MoneyCents::from_major(95))
        .unwrap();
    let draft = view.draft().clone();

    flaky.fail_writes.set(true);
    let err = view.submit(&flaky, today()).await.unwrap_err();
    assert!(matches!(err, WriteError::Query(_)));
    assert_eq!(view.draft(), &draft);
    assert!(view.editing().is_some());
    assert_eq!(view.debit().total(), MoneyCents::from_major(80));
}

#[tokio::test]
async fn incomplete_draft_is_rejected_locally() {
    let ledger = ledger();
    let mut view = loaded_view(&ledger).await;
    assert!(matches!(
        view.submit(&ledger, today()).await,
        Err(WriteError::Validation(_))
    ));
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn cancelled_delete_leaves_everything_in_place() {
    let ledger = ledger();
    let rent = debit(&ledger, 500, today());
    let mut view = loaded_view(&ledger).await;

    view.request_delete(TransactionType::Debit, &rent.id)
        .unwrap();
    assert_eq!(
        view.pending().target().map(|t| t.id.as_str()),
        Some(rent.id.as_str())
    );
    view.cancel_delete();

    assert!(view.pending().is_none());
    assert_eq!(ledger.len(), 1);
    assert_eq!(view.debit().total(), MoneyCents::from_major(500));
    assert!(matches!(
        view.confirm_delete(&ledger, today()).await,
        Err(WriteError::NothingPending)
    ));
}

#[tokio::test]
async fn failed_delete_stays_pending_until_confirmed() {
    let ledger = ledger();
    let rent = debit(&ledger, 500, today());
    credit(&ledger, 50, today());
    let flaky = Scripted::new(&ledger);
    let mut view = TodayLedgerView::new(today(), "cash");
    view.refresh(&flaky, today()).await;

    view.request_delete(TransactionType::Debit, &rent.id)
        .unwrap();
    flaky.fail_writes.set(true);
    assert!(view.confirm_delete(&flaky, today()).await.is_err());
    assert!(!view.pending().is_none());
    assert_eq!(ledger.len(), 2);

    flaky.fail_writes.set(false);
    view.confirm_delete(&flaky, today()).await.unwrap();
    assert!(view.pending().is_none());
    assert_eq!(ledger.len(), 1);
    assert!(view.debit().entries().is_empty());
    assert_eq!(view.debit().total(), MoneyCents::ZERO);
    assert_eq!(view.credit().total(), MoneyCents::from_major(50));
}

#[tokio::test]
async fn pipelines_only_show_the_requested_day() {
    let ledger = ledger();
    debit(&ledger, 10, today().pred_opt().unwrap());
    debit(&ledger, 30, today());

    let view = loaded_view(&ledger).await;
    assert_eq!(view.debit().phase(), Phase::Ready);
    assert_eq!(view.debit().entries().len(), 1);
    assert_eq!(view.debit().date(), Some(today()));
    assert_eq!(view.debit().total(), MoneyCents::from_major(30));
}
