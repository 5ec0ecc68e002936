//! Transaction management: a filtered report whose rows can be edited or
//! deleted through the general transaction endpoints.

use chrono::NaiveDate;

use crate::{
    CategoryCascade, LedgerCommands, LedgerQueryService, Transaction, TransactionType, WriteError,
    form::TransactionDraft,
    pending::{DeleteTarget, PendingAction},
    view::ReportView,
};

#[derive(Debug)]
pub struct SettingsView {
    report: ReportView,
    draft: TransactionDraft,
    editing: Option<String>,
    categories: CategoryCascade,
    pending: PendingAction,
}

impl SettingsView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            report: ReportView::new(today),
            draft: TransactionDraft::new(today),
            editing: None,
            categories: CategoryCascade::default(),
            pending: PendingAction::None,
        }
    }

    pub fn report(&self) -> &ReportView {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut ReportView {
        &mut self.report
    }

    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TransactionDraft {
        &mut self.draft
    }

    /// Id of the row being edited.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn categories(&self) -> &CategoryCascade {
        &self.categories
    }

    pub fn pending(&self) -> &PendingAction {
        &self.pending
    }

    fn find(&self, id: &str) -> Result<&Transaction, WriteError> {
        self.report
            .report()
            .and_then(|r| r.find(id))
            .ok_or_else(|| WriteError::NotFound(id.to_string()))
    }

    /// Pre-fills the draft from a report row and loads the categories of
    /// its type.
    pub async fn begin_edit<S: LedgerQueryService>(
        &mut self,
        service: &S,
        id: &str,
    ) -> Result<(), WriteError> {
        let draft = TransactionDraft::from_transaction(self.find(id)?);
        let kind = draft.kind;
        self.draft = draft;
        self.editing = Some(id.to_string());
        self.set_draft_kind(service, kind).await;
        Ok(())
    }

    pub async fn set_draft_kind<S: LedgerQueryService>(
        &mut self,
        service: &S,
        kind: Option<TransactionType>,
    ) {
        self.draft.set_kind(kind);
        if self.categories.resolve(service, kind).await.is_committed()
            && self.categories.is_selectable()
        {
            if let Some(selected) = &self.draft.category {
                self.draft.category = self
                    .categories
                    .categories()
                    .iter()
                    .find(|c| c.id == selected.id)
                    .cloned();
            }
        }
    }

    pub fn cancel_edit(&mut self, today: NaiveDate) {
        self.editing = None;
        self.draft = TransactionDraft::new(today);
        self.categories.begin(None);
    }

    /// Saves the edited row, then rebuilds the report with the current
    /// criteria. A rejected update keeps the draft.
    pub async fn submit<S>(&mut self, service: &S, today: NaiveDate) -> Result<Transaction, WriteError>
    where
        S: LedgerQueryService + LedgerCommands,
    {
        let id = self.editing.clone().ok_or(WriteError::NothingPending)?;
        let input = self.draft.validate()?;
        let saved = service.update_transaction(&id, &input).await?;

        self.cancel_edit(today);
        self.rebuild(service).await;
        Ok(saved)
    }

    pub fn request_delete(&mut self, id: &str) -> Result<(), WriteError> {
        let kind = self.find(id)?.kind;
        self.pending = PendingAction::PendingDelete(DeleteTarget {
            id: id.to_string(),
            kind,
        });
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending = PendingAction::None;
    }

    pub async fn confirm_delete<S>(&mut self, service: &S, today: NaiveDate) -> Result<(), WriteError>
    where
        S: LedgerQueryService + LedgerCommands,
    {
        let target = self.pending.take().ok_or(WriteError::NothingPending)?;
        if let Err(err) = service.delete_transaction(&target.id).await {
            self.pending = PendingAction::PendingDelete(target);
            return Err(err);
        }
        if self.editing.as_deref() == Some(target.id.as_str()) {
            self.cancel_edit(today);
        }
        self.rebuild(service).await;
        Ok(())
    }

    async fn rebuild<S: LedgerQueryService>(&mut self, service: &S) {
        self.report.invalidate_opening();
        self.report.build(service).await;
    }
}
