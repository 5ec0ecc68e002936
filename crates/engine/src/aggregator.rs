//! Report builds with last-issued-wins arbitration.
//!
//! A build is split in two halves so several can be in flight at once:
//! [`ReportAggregator::begin_build`] tags the request and flips the state to
//! loading, [`ReportAggregator::complete_build`] commits the response only if
//! no newer build was issued in the meantime. Rows and totals always come
//! from the same response.

use crate::{
    ExportError, LedgerQueryService, MoneyCents, OpeningWindow, QueryError,
    export::ExportSnapshot,
    filter::FilterCriteria,
    opening::{OpeningBalanceResolver, compose},
    ports::LedgerPage,
    report::ReportResult,
    tag::{Applied, Phase, Sequencer, Tag},
};

#[derive(Clone, Debug)]
pub struct BuildTicket {
    tag: Tag,
    criteria: FilterCriteria,
}

impl BuildTicket {
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }
}

#[derive(Debug, Default)]
pub struct ReportAggregator {
    seq: Sequencer,
    phase: Phase,
    report: Option<ReportResult>,
    error: Option<QueryError>,
    opening: OpeningBalanceResolver,
}

impl ReportAggregator {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Last committed report. Survives later failures.
    pub fn report(&self) -> Option<&ReportResult> {
        self.report.as_ref()
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn opening(&self) -> &OpeningBalanceResolver {
        &self.opening
    }

    pub fn opening_mut(&mut self) -> &mut OpeningBalanceResolver {
        &mut self.opening
    }

    pub fn begin_build(&mut self, criteria: &FilterCriteria) -> BuildTicket {
        let tag = self.seq.issue();
        tracing::debug!(build = tag.value(), "report build issued");
        self.phase = Phase::Loading;
        self.error = None;
        BuildTicket {
            tag,
            criteria: criteria.clone(),
        }
    }

    pub fn complete_build(
        &mut self,
        ticket: BuildTicket,
        outcome: Result<LedgerPage, QueryError>,
    ) -> Applied {
        if !self.seq.is_current(ticket.tag) {
            tracing::debug!(build = ticket.tag.value(), "report build superseded");
            return Applied::Superseded;
        }

        match outcome.and_then(|page| ReportResult::from_page(ticket.criteria, page)) {
            Ok(report) => {
                tracing::debug!(
                    build = ticket.tag.value(),
                    rows = report.transactions().len(),
                    "report build applied"
                );
                self.report = Some(report);
                self.phase = Phase::Ready;
            }
            Err(err) => {
                tracing::warn!(build = ticket.tag.value(), "report build failed: {err}");
                self.error = Some(err);
                self.phase = Phase::Failed;
            }
        }
        Applied::Committed
    }

    pub async fn build_report<S: LedgerQueryService>(
        &mut self,
        service: &S,
        criteria: &FilterCriteria,
    ) -> Applied {
        let ticket = self.begin_build(criteria);
        let outcome = service.query_ledger(&ticket.criteria).await;
        self.complete_build(ticket, outcome)
    }

    pub async fn refresh_opening_balance<S: LedgerQueryService>(
        &mut self,
        service: &S,
        window: OpeningWindow,
    ) -> Applied {
        let applied = self.opening.refresh(service, window).await;
        if applied.is_committed() {
            self.check_opening(&window);
        }
        applied
    }

    /// Rejects an opening total that overflows when added to the report
    /// balance of the same window.
    pub fn check_opening(&mut self, window: &OpeningWindow) {
        let Some(report) = &self.report else {
            return;
        };
        if report.criteria().opening_window() != *window {
            return;
        }
        let Some(opening) = self.opening.opening_total(window) else {
            return;
        };
        let balance = report.total_balance();
        if compose(balance, opening).is_none() {
            self.opening.reject(QueryError::Inconsistent(format!(
                "opening {opening} overflows balance {balance}"
            )));
        }
    }

    /// Window the displayed figures belong to: the current criteria must
    /// still describe the report that is on screen.
    fn active_window(&self, current: &FilterCriteria) -> Option<OpeningWindow> {
        let report = self.report.as_ref()?;
        let window = report.criteria().opening_window();
        (window == current.opening_window()).then_some(window)
    }

    /// Balance including opening, if inclusion is on and the opening total was
    /// fetched for the window of both the report and `current`.
    pub fn including_opening(&self, current: &FilterCriteria) -> Option<MoneyCents> {
        let report = self.report.as_ref()?;
        let window = self.active_window(current)?;
        self.opening
            .including_opening(report.total_balance(), &window)
    }

    /// Freezes the current report for export. Refused while anything is in
    /// flight, after a failure, or when the opening figure is requested but
    /// not resolved for the active window.
    pub fn export_snapshot(&self, current: &FilterCriteria) -> Result<ExportSnapshot, ExportError> {
        match self.phase {
            Phase::Loading => return Err(ExportError::NotReady("report is loading".to_string())),
            Phase::Failed => return Err(ExportError::NotReady("last build failed".to_string())),
            Phase::Idle | Phase::Ready => {}
        }
        let report = self
            .report
            .as_ref()
            .ok_or_else(|| ExportError::NotReady("no report built yet".to_string()))?;

        let including_opening = if self.opening.include() {
            if self.opening.is_loading() {
                return Err(ExportError::NotReady(
                    "opening balance is loading".to_string(),
                ));
            }
            let figure = self
                .including_opening(current)
                .ok_or_else(|| match self.opening.error() {
                    Some(QueryError::Inconsistent(msg)) => ExportError::Inconsistent(msg.clone()),
                    _ => ExportError::NotReady(
                        "opening balance not resolved for this window".to_string(),
                    ),
                })?;
            Some(figure)
        } else {
            None
        };

        ExportSnapshot::new(report, including_opening)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::TransactionType;

    fn criteria(kind: Option<TransactionType>) -> FilterCriteria {
        FilterCriteria {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            kind,
            ..FilterCriteria::default()
        }
    }

    fn page(debit: i64, credit: i64) -> LedgerPage {
        LedgerPage {
            transactions: Vec::new(),
            total_debit: MoneyCents::from_major(debit),
            total_credit: MoneyCents::from_major(credit),
            total_balance: MoneyCents::from_major(credit - debit),
        }
    }

    #[test]
    fn later_issue_wins_regardless_of_arrival() {
        let mut agg = ReportAggregator::default();
        let first = agg.begin_build(&criteria(None));
        let second = agg.begin_build(&criteria(Some(TransactionType::Debit)));

        assert_eq!(agg.complete_build(second, Ok(page(500, 0))), Applied::Committed);
        assert_eq!(agg.complete_build(first, Ok(page(500, 300))), Applied::Superseded);

        let report = agg.report().unwrap();
        assert_eq!(report.criteria().kind, Some(TransactionType::Debit));
        assert_eq!(report.total_balance(), MoneyCents::from_major(-500));
        assert_eq!(agg.phase(), Phase::Ready);
    }

    #[test]
    fn failure_keeps_previous_report() {
        let mut agg = ReportAggregator::default();
        let ticket = agg.begin_build(&criteria(None));
        agg.complete_build(ticket, Ok(page(100, 250)));

        let ticket = agg.begin_build(&criteria(None));
        assert!(agg.is_loading());
        agg.complete_build(ticket, Err(QueryError::Server("boom".to_string())));

        assert_eq!(agg.phase(), Phase::Failed);
        assert!(agg.error().is_some());
        assert_eq!(
            agg.report().unwrap().total_credit(),
            MoneyCents::from_major(250)
        );
    }

    #[test]
    fn inconsistent_totals_fail_the_build() {
        let mut agg = ReportAggregator::default();
        let mut bad = page(100, 100);
        bad.total_balance = MoneyCents::from_major(7);
        let ticket = agg.begin_build(&criteria(None));
        agg.complete_build(ticket, Ok(bad));
        assert_eq!(agg.phase(), Phase::Failed);
        assert!(agg.report().is_none());
    }

    #[test]
    fn export_refused_while_loading() {
        let mut agg = ReportAggregator::default();
        let ticket = agg.begin_build(&criteria(None));
        agg.complete_build(ticket, Ok(page(1, 2)));
        let _inflight = agg.begin_build(&criteria(None));
        assert!(matches!(
            agg.export_snapshot(&criteria(None)),
            Err(ExportError::NotReady(_))
        ));
    }

    #[test]
    fn export_refused_while_opening_loads() {
        let mut agg = ReportAggregator::default();
        let c = criteria(None);
        let ticket = agg.begin_build(&c);
        agg.complete_build(ticket, Ok(page(1, 2)));
        agg.opening_mut().set_include(true);
        let _inflight = agg.opening_mut().begin(c.opening_window());

        assert!(matches!(agg.export_snapshot(&c), Err(ExportError::NotReady(_))));
    }

    #[test]
    fn including_opening_requires_matching_criteria_window() {
        let mut agg = ReportAggregator::default();
        let c = criteria(None);
        let ticket = agg.begin_build(&c);
        agg.complete_build(ticket, Ok(page(500, 0)));
        agg.opening_mut().set_include(true);
        let ticket = agg.opening_mut().begin(c.opening_window()).unwrap();
        agg.opening_mut()
            .complete(ticket, Ok(MoneyCents::from_major(1000)));

        assert_eq!(agg.including_opening(&c), Some(MoneyCents::from_major(500)));

        let mut moved = c.clone();
        moved.end_date = NaiveDate::from_ymd_opt(2024, 1, 20);
        assert_eq!(agg.including_opening(&moved), None);
    }

    #[test]
    fn overflowing_opening_is_rejected_and_blocks_export() {
        let mut agg = ReportAggregator::default();
        let c = criteria(None);
        let ticket = agg.begin_build(&c);
        agg.complete_build(ticket, Ok(page(0, 10)));
        agg.opening_mut().set_include(true);
        let ticket = agg.opening_mut().begin(c.opening_window()).unwrap();
        agg.opening_mut()
            .complete(ticket, Ok(MoneyCents::new(i64::MAX)));
        agg.check_opening(&c.opening_window());

        assert_eq!(agg.opening().phase(), Phase::Failed);
        assert!(matches!(
            agg.opening().error(),
            Some(QueryError::Inconsistent(_))
        ));
        assert_eq!(agg.including_opening(&c), None);
        assert!(matches!(
            agg.export_snapshot(&c),
            Err(ExportError::Inconsistent(_))
        ));
    }
}
