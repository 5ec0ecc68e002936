//! The report screen: criteria, category cascade, payment methods and the
//! aggregated report with its optional opening balance.

use chrono::NaiveDate;

use crate::{
    CategoryCascade, ExportError, FilterError, LedgerQueryService, MoneyCents, OpeningWindow,
    PaymentMethod, QueryError, TransactionType,
    aggregator::ReportAggregator,
    export::Document,
    filter::{FilterChange, FilterCriteria, FilterField, FilterState},
    ports::ReportExporter,
    report::ReportResult,
    tag::{Applied, Phase},
};

#[derive(Debug)]
pub struct ReportView {
    filter: FilterState,
    cascade: CategoryCascade,
    payment_methods: Vec<PaymentMethod>,
    aggregator: ReportAggregator,
}

impl ReportView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            filter: FilterState::new(today),
            cascade: CategoryCascade::default(),
            payment_methods: Vec::new(),
            aggregator: ReportAggregator::default(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        self.filter.criteria()
    }

    pub fn cascade(&self) -> &CategoryCascade {
        &self.cascade
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn aggregator(&self) -> &ReportAggregator {
        &self.aggregator
    }

    pub fn report(&self) -> Option<&ReportResult> {
        self.aggregator.report()
    }

    /// Payment methods and the categories of the selected type, fetched
    /// together.
    pub async fn load_options<S: LedgerQueryService>(
        &mut self,
        service: &S,
    ) -> Result<(), QueryError> {
        let ticket = self.cascade.begin(self.filter.criteria().kind);
        let categories = async {
            match &ticket {
                Some(ticket) => Some(service.list_categories(ticket.kind()).await),
                None => None,
            }
        };
        let (methods, categories) = tokio::join!(service.list_payment_methods(), categories);

        if let (Some(ticket), Some(outcome)) = (ticket, categories) {
            if self.cascade.apply(ticket, outcome).is_committed() && self.cascade.is_selectable() {
                self.filter.reconcile(self.cascade.categories());
            }
        }
        self.payment_methods = methods?;
        Ok(())
    }

    /// Applies one criterion edit. A category must be one the cascade
    /// currently offers; a type change re-resolves the cascade before
    /// returning.
    pub async fn set_field<S: LedgerQueryService>(
        &mut self,
        service: &S,
        field: FilterField,
    ) -> Result<FilterChange, FilterError> {
        if let FilterField::Category(Some(category)) = &field {
            if let Some(kind) = self.filter.criteria().kind {
                if !self.cascade.is_selectable() {
                    return Err(FilterError::CategoriesUnavailable);
                }
                if !self.cascade.offers(category) {
                    return Err(FilterError::CategoryTypeMismatch {
                        category: category.name.clone(),
                        kind,
                    });
                }
            }
        }

        let change = self.filter.set_field(field)?;
        if let FilterChange::TypeChanged { kind, .. } = &change {
            let kind = *kind;
            self.follow_type(service, kind).await;
        }
        Ok(change)
    }

    async fn follow_type<S: LedgerQueryService>(
        &mut self,
        service: &S,
        kind: Option<TransactionType>,
    ) {
        if self.cascade.resolve(service, kind).await.is_committed() && self.cascade.is_selectable()
        {
            self.filter.reconcile(self.cascade.categories());
        }
    }

    pub async fn reset<S: LedgerQueryService>(
        &mut self,
        service: &S,
        today: NaiveDate,
    ) -> FilterChange {
        let change = self.filter.reset(today);
        if let FilterChange::TypeChanged { kind, .. } = &change {
            let kind = *kind;
            self.follow_type(service, kind).await;
        }
        change
    }

    /// Builds the report for the current criteria, then refetches the opening
    /// balance for its window when inclusion is on. Every successful build
    /// refetches it: rows dated before the window may have changed as well.
    pub async fn build<S: LedgerQueryService>(&mut self, service: &S) -> Applied {
        let criteria = self.filter.criteria().clone();
        let applied = self.aggregator.build_report(service, &criteria).await;
        if applied.is_committed() && self.aggregator.phase() == Phase::Ready {
            if let Some(window) = self.opening_target() {
                self.aggregator.refresh_opening_balance(service, window).await;
            }
        }
        applied
    }

    /// Turning inclusion on fetches the opening only when no figure for the
    /// displayed window is known or on its way.
    pub async fn set_include_opening<S: LedgerQueryService>(
        &mut self,
        service: &S,
        include: bool,
    ) {
        self.aggregator.opening_mut().set_include(include);
        let Some(window) = self.opening_target() else {
            return;
        };
        if self.aggregator.opening().needs_fetch(&window) {
            self.aggregator.refresh_opening_balance(service, window).await;
        }
    }

    /// Window of the displayed report, when inclusion is on and the criteria
    /// still describe that report.
    fn opening_target(&self) -> Option<OpeningWindow> {
        if !self.aggregator.opening().include() {
            return None;
        }
        let window = self.aggregator.report()?.criteria().opening_window();
        (window == self.filter.criteria().opening_window()).then_some(window)
    }

    /// Forgets the cached opening figure so the next build fetches it again.
    pub(crate) fn invalidate_opening(&mut self) {
        self.aggregator.opening_mut().invalidate();
    }

    pub fn including_opening(&self) -> Option<MoneyCents> {
        self.aggregator.including_opening(self.filter.criteria())
    }

    pub fn export<E: ReportExporter>(&self, exporter: &E) -> Result<Document, ExportError> {
        let snapshot = self.aggregator.export_snapshot(self.filter.criteria())?;
        exporter.export(&snapshot)
    }
}
