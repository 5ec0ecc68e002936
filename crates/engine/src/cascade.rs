//! Category lookup that follows the selected transaction type.

use crate::{
    CascadeError, Category, LedgerQueryService, QueryError, TransactionType,
    filter::valid_categories_for,
    tag::{Applied, Sequencer, Tag},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeStatus {
    /// No type selected, so there is nothing to choose from.
    NoType,
    /// A lookup is in flight; the current set is stale and not selectable.
    Loading,
    /// The set belongs to the selected type (it may be empty).
    Loaded,
    /// The last lookup failed; the previous set is kept but not selectable.
    Failed(CascadeError),
}

/// Handle for one in-flight lookup.
#[derive(Clone, Debug)]
pub struct CascadeTicket {
    tag: Tag,
    kind: TransactionType,
}

impl CascadeTicket {
    pub fn kind(&self) -> TransactionType {
        self.kind
    }
}

#[derive(Debug)]
pub struct CategoryCascade {
    kind: Option<TransactionType>,
    categories: Vec<Category>,
    status: CascadeStatus,
    seq: Sequencer,
}

impl Default for CategoryCascade {
    fn default() -> Self {
        Self {
            kind: None,
            categories: Vec::new(),
            status: CascadeStatus::NoType,
            seq: Sequencer::default(),
        }
    }
}

impl CategoryCascade {
    pub fn status(&self) -> &CascadeStatus {
        &self.status
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    /// The displayed set. Check [`Self::is_selectable`] before offering it.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_loading(&self) -> bool {
        self.status == CascadeStatus::Loading
    }

    pub fn is_selectable(&self) -> bool {
        self.status == CascadeStatus::Loaded
    }

    pub fn offers(&self, category: &Category) -> bool {
        self.is_selectable() && self.categories.iter().any(|c| c.id == category.id)
    }

    /// Starts resolving `kind`. With no type the set empties at once and no
    /// lookup is needed; otherwise the caller fetches and hands the outcome
    /// to [`Self::apply`].
    pub fn begin(&mut self, kind: Option<TransactionType>) -> Option<CascadeTicket> {
        let tag = self.seq.issue();
        self.kind = kind;
        match kind {
            None => {
                self.categories.clear();
                self.status = CascadeStatus::NoType;
                None
            }
            Some(kind) => {
                self.status = CascadeStatus::Loading;
                Some(CascadeTicket { tag, kind })
            }
        }
    }

    pub fn apply(
        &mut self,
        ticket: CascadeTicket,
        outcome: Result<Vec<Category>, QueryError>,
    ) -> Applied {
        if !self.seq.is_current(ticket.tag) {
            tracing::debug!(kind = %ticket.kind, "dropping superseded category lookup");
            return Applied::Superseded;
        }
        match outcome {
            Ok(all) => {
                self.categories = valid_categories_for(Some(ticket.kind), &all);
                self.status = CascadeStatus::Loaded;
            }
            Err(err) => {
                tracing::warn!(kind = %ticket.kind, "category lookup failed: {err}");
                self.status = CascadeStatus::Failed(err.into());
            }
        }
        Applied::Committed
    }

    /// `begin` + fetch + `apply` in one step.
    pub async fn resolve<S: LedgerQueryService>(
        &mut self,
        service: &S,
        kind: Option<TransactionType>,
    ) -> Applied {
        match self.begin(kind) {
            None => Applied::Committed,
            Some(ticket) => {
                let outcome = service.list_categories(ticket.kind).await;
                self.apply(ticket, outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Affinity;

    fn category(id: &str, affinity: Affinity) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_string(),
            affinity,
        }
    }

    #[test]
    fn empty_type_is_distinct_from_loaded_empty() {
        let mut cascade = CategoryCascade::default();
        assert!(cascade.begin(None).is_none());
        assert_eq!(cascade.status(), &CascadeStatus::NoType);

        let ticket = cascade.begin(Some(TransactionType::Credit)).unwrap();
        cascade.apply(ticket, Ok(Vec::new()));
        assert_eq!(cascade.status(), &CascadeStatus::Loaded);
        assert!(cascade.categories().is_empty());
    }

    #[test]
    fn loading_keeps_previous_set_but_blocks_selection() {
        let mut cascade = CategoryCascade::default();
        let ticket = cascade.begin(Some(TransactionType::Debit)).unwrap();
        cascade.apply(ticket, Ok(vec![category("rent", Affinity::Debit)]));
        let rent = category("rent", Affinity::Debit);
        assert!(cascade.offers(&rent));

        let _pending = cascade.begin(Some(TransactionType::Credit)).unwrap();
        assert!(cascade.is_loading());
        assert_eq!(cascade.categories().len(), 1);
        assert!(!cascade.offers(&rent));
    }

    #[test]
    fn failure_keeps_previous_set() {
        let mut cascade = CategoryCascade::default();
        let ticket = cascade.begin(Some(TransactionType::Debit)).unwrap();
        cascade.apply(ticket, Ok(vec![category("rent", Affinity::Debit)]));

        let ticket = cascade.begin(Some(TransactionType::Debit)).unwrap();
        cascade.apply(ticket, Err(QueryError::Transport("down".to_string())));

        assert!(matches!(cascade.status(), CascadeStatus::Failed(_)));
        assert_eq!(cascade.categories().len(), 1);
        assert!(!cascade.is_selectable());
    }

    #[test]
    fn late_lookup_for_old_type_is_dropped() {
        let mut cascade = CategoryCascade::default();
        let debit = cascade.begin(Some(TransactionType::Debit)).unwrap();
        let credit = cascade.begin(Some(TransactionType::Credit)).unwrap();

        let applied = cascade.apply(credit, Ok(vec![category("sales", Affinity::Credit)]));
        assert_eq!(applied, Applied::Committed);
        let applied = cascade.apply(debit, Ok(vec![category("rent", Affinity::Debit)]));
        assert_eq!(applied, Applied::Superseded);

        assert_eq!(cascade.kind(), Some(TransactionType::Credit));
        assert_eq!(cascade.categories()[0].id, "sales");
    }

    #[test]
    fn rows_with_wrong_affinity_are_filtered() {
        let mut cascade = CategoryCascade::default();
        let ticket = cascade.begin(Some(TransactionType::Credit)).unwrap();
        cascade.apply(
            ticket,
            Ok(vec![
                category("sales", Affinity::Credit),
                category("rent", Affinity::Debit),
                category("misc", Affinity::Both),
            ]),
        );
        let ids: Vec<_> = cascade.categories().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["sales", "misc"]);
    }
}
