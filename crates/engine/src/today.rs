//! Today's ledger: independent credit and debit pipelines plus the shared
//! draft used to add, edit and delete entries.
//!
//! Totals are always the server's aggregates from the latest refresh. A
//! mutation never adjusts them locally; it refreshes both pipelines instead,
//! since an edit may move an entry from one side to the other.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    CategoryCascade, LedgerCommands, LedgerQueryService, MoneyCents, PaymentMethod, QueryError,
    Transaction, TransactionType, WriteError,
    form::TransactionDraft,
    pending::{DeleteTarget, PendingAction},
    ports::TodayPage,
    tag::{Applied, Phase, Sequencer, Tag},
};

#[derive(Clone, Debug)]
pub struct TodayTicket {
    tag: Tag,
    kind: TransactionType,
    date: NaiveDate,
}

impl TodayTicket {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug)]
pub struct TodayPipeline {
    kind: TransactionType,
    entries: Vec<Transaction>,
    total: MoneyCents,
    date: Option<NaiveDate>,
    phase: Phase,
    error: Option<QueryError>,
    seq: Sequencer,
}

impl TodayPipeline {
    pub fn new(kind: TransactionType) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            total: MoneyCents::ZERO,
            date: None,
            phase: Phase::Idle,
            error: None,
            seq: Sequencer::default(),
        }
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Server-reported total of [`Self::entries`].
    pub fn total(&self) -> MoneyCents {
        self.total
    }

    /// Day the entries were loaded for.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.entries.iter().find(|tx| tx.id == id)
    }

    pub fn begin(&mut self, date: NaiveDate) -> TodayTicket {
        self.phase = Phase::Loading;
        TodayTicket {
            tag: self.seq.issue(),
            kind: self.kind,
            date,
        }
    }

    pub fn complete(
        &mut self,
        ticket: TodayTicket,
        outcome: Result<TodayPage, QueryError>,
    ) -> Applied {
        if !self.seq.is_current(ticket.tag) || ticket.kind != self.kind {
            return Applied::Superseded;
        }
        let checked = outcome.and_then(|page| {
            match page
                .transactions
                .iter()
                .find(|tx| tx.kind != self.kind || tx.date != ticket.date)
            {
                Some(stray) => Err(QueryError::Inconsistent(format!(
                    "{} is not a {} entry of {}",
                    stray.id, self.kind, ticket.date
                ))),
                None => Ok(page),
            }
        });
        match checked {
            Ok(page) => {
                tracing::debug!(
                    kind = %self.kind,
                    rows = page.transactions.len(),
                    "today pipeline refreshed"
                );
                self.entries = page.transactions;
                self.total = page.total;
                self.date = Some(ticket.date);
                self.error = None;
                self.phase = Phase::Ready;
            }
            Err(err) => {
                tracing::warn!(kind = %self.kind, "today pipeline refresh failed: {err}");
                self.error = Some(err);
                self.phase = Phase::Failed;
            }
        }
        Applied::Committed
    }
}

/// Which entry the shared draft is editing, and through which pipeline the
/// update is dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditTarget {
    pub id: String,
    pub pipeline: TransactionType,
}

#[derive(Debug)]
pub struct TodayLedgerView {
    credit: TodayPipeline,
    debit: TodayPipeline,
    draft: TransactionDraft,
    editing: Option<EditTarget>,
    categories: CategoryCascade,
    payment_methods: Vec<PaymentMethod>,
    default_method: String,
    pending: PendingAction,
}

impl TodayLedgerView {
    pub fn new(today: NaiveDate, default_method: impl Into<String>) -> Self {
        Self {
            credit: TodayPipeline::new(TransactionType::Credit),
            debit: TodayPipeline::new(TransactionType::Debit),
            draft: TransactionDraft::new(today),
            editing: None,
            categories: CategoryCascade::default(),
            payment_methods: Vec::new(),
            default_method: default_method.into(),
            pending: PendingAction::None,
        }
    }

    pub fn pipeline(&self, kind: TransactionType) -> &TodayPipeline {
        match kind {
            TransactionType::Credit => &self.credit,
            TransactionType::Debit => &self.debit,
        }
    }

    pub fn credit(&self) -> &TodayPipeline {
        &self.credit
    }

    pub fn debit(&self) -> &TodayPipeline {
        &self.debit
    }

    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    /// Direct access for plain fields (amount, remarks, date, method). Type
    /// changes go through [`Self::set_draft_kind`] so categories follow.
    pub fn draft_mut(&mut self) -> &mut TransactionDraft {
        &mut self.draft
    }

    pub fn editing(&self) -> Option<&EditTarget> {
        self.editing.as_ref()
    }

    pub fn pending(&self) -> &PendingAction {
        &self.pending
    }

    pub fn categories(&self) -> &CategoryCascade {
        &self.categories
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    /// Loads payment methods and the categories of the draft's type together.
    pub async fn load_options<S: LedgerQueryService>(
        &mut self,
        service: &S,
    ) -> Result<(), QueryError> {
        let ticket = self.categories.begin(self.draft.kind);
        let categories = async {
            match &ticket {
                Some(ticket) => Some(service.list_categories(ticket.kind()).await),
                None => None,
            }
        };
        let (methods, categories) = tokio::join!(service.list_payment_methods(), categories);

        if let (Some(ticket), Some(outcome)) = (ticket, categories) {
            self.categories.apply(ticket, outcome);
            self.sync_draft_category();
        }
        self.payment_methods = methods?;
        self.draft
            .preselect_payment_method(&self.payment_methods, &self.default_method);
        Ok(())
    }

    pub async fn set_draft_kind<S: LedgerQueryService>(
        &mut self,
        service: &S,
        kind: Option<TransactionType>,
    ) {
        self.draft.set_kind(kind);
        if self.categories.resolve(service, kind).await.is_committed() {
            self.sync_draft_category();
        }
    }

    /// Replaces the draft's category by the resolved one (real affinity), or
    /// drops it when the resolved set no longer offers it.
    fn sync_draft_category(&mut self) {
        if !self.categories.is_selectable() {
            return;
        }
        if let Some(selected) = &self.draft.category {
            self.draft.category = self
                .categories
                .categories()
                .iter()
                .find(|c| c.id == selected.id)
                .cloned();
        }
    }

    /// Fetches both pipelines for `today`, concurrently.
    pub async fn refresh<S: LedgerQueryService>(&mut self, service: &S, today: NaiveDate) {
        let credit = self.credit.begin(today);
        let debit = self.debit.begin(today);
        let (credit_page, debit_page) = tokio::join!(
            service.query_today(TransactionType::Credit, today),
            service.query_today(TransactionType::Debit, today),
        );
        self.credit.complete(credit, credit_page);
        self.debit.complete(debit, debit_page);
    }

    /// Pre-fills the draft from an entry of the `kind` pipeline and loads the
    /// categories of its type.
    pub async fn begin_edit<S: LedgerQueryService>(
        &mut self,
        service: &S,
        kind: TransactionType,
        id: &str,
    ) -> Result<(), WriteError> {
        let tx = self
            .pipeline(kind)
            .find(id)
            .ok_or_else(|| WriteError::NotFound(id.to_string()))?;
        let draft = TransactionDraft::from_transaction(tx);
        let draft_kind = draft.kind;
        self.draft = draft;
        self.editing = Some(EditTarget {
            id: id.to_string(),
            pipeline: kind,
        });
        self.set_draft_kind(service, draft_kind).await;
        Ok(())
    }

    pub fn cancel_edit(&mut self, today: NaiveDate) {
        self.editing = None;
        self.reset_draft(today);
    }

    fn reset_draft(&mut self, today: NaiveDate) {
        self.draft = TransactionDraft::new(today);
        self.draft
            .preselect_payment_method(&self.payment_methods, &self.default_method);
        self.categories.begin(None);
    }

    /// Creates a new entry, or updates the edited one through its today
    /// pipeline. On rejection the draft is left as is and nothing refreshes.
    pub async fn submit<S>(&mut self, service: &S, today: NaiveDate) -> Result<Transaction, WriteError>
    where
        S: LedgerQueryService + LedgerCommands,
    {
        let mut input = self.draft.validate()?;
        let saved = match &self.editing {
            Some(target) => {
                service
                    .update_today_transaction(target.pipeline, &target.id, &input)
                    .await?
            }
            None => {
                input.idempotency_key = Some(Uuid::new_v4().to_string());
                service.create_transaction(&input).await?
            }
        };

        self.editing = None;
        self.reset_draft(today);
        self.refresh(service, today).await;
        Ok(saved)
    }

    pub fn request_delete(&mut self, kind: TransactionType, id: &str) -> Result<(), WriteError> {
        if self.pipeline(kind).find(id).is_none() {
            return Err(WriteError::NotFound(id.to_string()));
        }
        self.pending = PendingAction::PendingDelete(DeleteTarget {
            id: id.to_string(),
            kind,
        });
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending = PendingAction::None;
    }

    /// Issues the pending delete. A rejected delete stays pending so it can
    /// be retried or cancelled.
    pub async fn confirm_delete<S>(&mut self, service: &S, today: NaiveDate) -> Result<(), WriteError>
    where
        S: LedgerQueryService + LedgerCommands,
    {
        let target = self.pending.take().ok_or(WriteError::NothingPending)?;
        if let Err(err) = service
            .delete_today_transaction(target.kind, &target.id)
            .await
        {
            self.pending = PendingAction::PendingDelete(target);
            return Err(err);
        }
        if self.editing.as_ref().is_some_and(|e| e.id == target.id) {
            self.cancel_edit(today);
        }
        self.refresh(service, today).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityRef, memory::MemoryLedger};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn entry(id: &str, kind: TransactionType, day: NaiveDate) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            category: EntityRef {
                id: "c".to_string(),
                name: "C".to_string(),
            },
            amount: MoneyCents::from_major(10),
            payment_method: EntityRef {
                id: "p".to_string(),
                name: "P".to_string(),
            },
            date: day,
            remarks: String::new(),
        }
    }

    #[test]
    fn pipeline_rejects_rows_of_other_type_or_day() {
        let mut pipeline = TodayPipeline::new(TransactionType::Debit);
        let ticket = pipeline.begin(date());
        pipeline.complete(
            ticket,
            Ok(TodayPage {
                transactions: vec![entry("x", TransactionType::Credit, date())],
                total: MoneyCents::from_major(10),
            }),
        );
        assert_eq!(pipeline.phase(), Phase::Failed);
        assert!(pipeline.entries().is_empty());

        let ticket = pipeline.begin(date());
        let yesterday = date().pred_opt().unwrap();
        pipeline.complete(
            ticket,
            Ok(TodayPage {
                transactions: vec![entry("y", TransactionType::Debit, yesterday)],
                total: MoneyCents::from_major(10),
            }),
        );
        assert_eq!(pipeline.phase(), Phase::Failed);
    }

    #[test]
    fn pipeline_keeps_only_latest_refresh() {
        let mut pipeline = TodayPipeline::new(TransactionType::Credit);
        let old = pipeline.begin(date());
        let new = pipeline.begin(date());
        let page = |id: &str, major| TodayPage {
            transactions: vec![entry(id, TransactionType::Credit, date())],
            total: MoneyCents::from_major(major),
        };
        assert_eq!(pipeline.complete(new, Ok(page("new", 20))), Applied::Committed);
        assert_eq!(pipeline.complete(old, Ok(page("old", 10))), Applied::Superseded);
        assert_eq!(pipeline.total(), MoneyCents::from_major(20));
        assert_eq!(pipeline.entries()[0].id, "new");
    }

    #[tokio::test]
    async fn unknown_entries_cannot_be_edited_or_deleted() {
        let ledger = MemoryLedger::new();
        let mut view = TodayLedgerView::new(date(), "cash");
        assert!(matches!(
            view.begin_edit(&ledger, TransactionType::Debit, "nope").await,
            Err(WriteError::NotFound(_))
        ));
        assert!(view.editing().is_none());
        assert!(view.request_delete(TransactionType::Debit, "nope").is_err());
        assert!(view.pending().is_none());
    }
}
