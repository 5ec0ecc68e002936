//! Owns every view over one ledger service and keeps them consistent.
//!
//! Each successful mutation bumps the ledger revision. Views remember the
//! revision they were loaded at; [`Bookkeeper::refresh_stale`] reloads the
//! ones that fell behind, so an edit on the today screen cannot leave stale
//! totals on the report screen.

use crate::{
    Clock, FilterError, LedgerCommands, LedgerQueryService, QueryError, Transaction,
    TransactionType, WriteError, YearMonth,
    dashboard::DashboardView,
    filter::{FilterChange, FilterField},
    settings::SettingsView,
    tag::Applied,
    today::TodayLedgerView,
    view::ReportView,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Report,
    Today,
    Settings,
    Dashboard,
}

#[derive(Debug)]
struct Tracked<T> {
    view: T,
    loaded_at: Option<u64>,
}

impl<T> Tracked<T> {
    fn new(view: T) -> Self {
        Self {
            view,
            loaded_at: None,
        }
    }

    fn is_behind(&self, revision: u64) -> bool {
        self.loaded_at.is_some_and(|at| at < revision)
    }
}

#[derive(Debug)]
pub struct Bookkeeper<S, C> {
    service: S,
    clock: C,
    revision: u64,
    report: Tracked<ReportView>,
    today: Tracked<TodayLedgerView>,
    settings: Tracked<SettingsView>,
    dashboard: Tracked<DashboardView>,
    month: Option<YearMonth>,
}

impl<S, C> Bookkeeper<S, C>
where
    S: LedgerQueryService + LedgerCommands,
    C: Clock,
{
    pub fn new(service: S, clock: C, default_payment_method: &str) -> Self {
        let today = clock.today();
        Self {
            report: Tracked::new(ReportView::new(today)),
            today: Tracked::new(TodayLedgerView::new(today, default_payment_method)),
            settings: Tracked::new(SettingsView::new(today)),
            dashboard: Tracked::new(DashboardView::default()),
            month: None,
            revision: 0,
            service,
            clock,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn report(&self) -> &ReportView {
        &self.report.view
    }

    pub fn today(&self) -> &TodayLedgerView {
        &self.today.view
    }

    /// For draft edits that need no round-trip.
    pub fn today_mut(&mut self) -> &mut TodayLedgerView {
        &mut self.today.view
    }

    pub fn settings(&self) -> &SettingsView {
        &self.settings.view
    }

    pub fn settings_mut(&mut self) -> &mut SettingsView {
        &mut self.settings.view
    }

    pub fn dashboard(&self) -> &DashboardView {
        &self.dashboard.view
    }

    /// Views loaded at an older revision than the current one.
    pub fn stale_views(&self) -> Vec<ViewKind> {
        let mut stale = Vec::new();
        if self.report.is_behind(self.revision) {
            stale.push(ViewKind::Report);
        }
        if self.today.is_behind(self.revision) || self.today_rolled_over() {
            stale.push(ViewKind::Today);
        }
        if self.settings.is_behind(self.revision) {
            stale.push(ViewKind::Settings);
        }
        if self.dashboard.is_behind(self.revision) {
            stale.push(ViewKind::Dashboard);
        }
        stale
    }

    /// Either pipeline still shows a day other than the clock's. A pipeline
    /// whose last refresh failed keeps the day it last loaded.
    fn today_rolled_over(&self) -> bool {
        let today = self.clock.today();
        let view = &self.today.view;
        self.today.loaded_at.is_some()
            && [view.credit(), view.debit()]
                .iter()
                .any(|pipeline| pipeline.date().is_some_and(|date| date != today))
    }

    fn committed(&mut self, by: ViewKind) {
        self.revision += 1;
        tracing::info!(revision = self.revision, by = ?by, "ledger changed");
    }

    /// Reloads every stale view. Returns what was reloaded.
    pub async fn refresh_stale(&mut self) -> Vec<ViewKind> {
        let stale = self.stale_views();
        for kind in &stale {
            match kind {
                ViewKind::Report => {
                    self.report.view.invalidate_opening();
                    self.build_report().await;
                }
                ViewKind::Today => self.refresh_today().await,
                ViewKind::Settings => {
                    self.settings.view.report_mut().invalidate_opening();
                    self.build_settings().await;
                }
                ViewKind::Dashboard => {
                    if let Some(month) = self.month {
                        self.load_dashboard(month).await;
                    }
                }
            }
        }
        stale
    }

    pub async fn load_report_options(&mut self) -> Result<(), QueryError> {
        self.report.view.load_options(&self.service).await
    }

    pub async fn set_report_field(&mut self, field: FilterField) -> Result<FilterChange, FilterError> {
        self.report.view.set_field(&self.service, field).await
    }

    pub async fn reset_report(&mut self) -> FilterChange {
        let today = self.clock.today();
        self.report.view.reset(&self.service, today).await
    }

    pub async fn set_include_opening(&mut self, include: bool) {
        self.report
            .view
            .set_include_opening(&self.service, include)
            .await;
    }

    pub async fn build_report(&mut self) -> Applied {
        let revision = self.revision;
        let applied = self.report.view.build(&self.service).await;
        if applied.is_committed() {
            self.report.loaded_at = Some(revision);
        }
        applied
    }

    pub async fn load_today_options(&mut self) -> Result<(), QueryError> {
        self.today.view.load_options(&self.service).await
    }

    pub async fn set_today_draft_kind(&mut self, kind: Option<TransactionType>) {
        self.today.view.set_draft_kind(&self.service, kind).await;
    }

    pub async fn begin_today_edit(
        &mut self,
        kind: TransactionType,
        id: &str,
    ) -> Result<(), WriteError> {
        self.today.view.begin_edit(&self.service, kind, id).await
    }

    pub async fn refresh_today(&mut self) {
        let revision = self.revision;
        let today = self.clock.today();
        self.today.view.refresh(&self.service, today).await;
        self.today.loaded_at = Some(revision);
    }

    pub async fn submit_today(&mut self) -> Result<Transaction, WriteError> {
        let today = self.clock.today();
        let saved = self.today.view.submit(&self.service, today).await?;
        self.committed(ViewKind::Today);
        self.today.loaded_at = Some(self.revision);
        Ok(saved)
    }

    pub async fn confirm_today_delete(&mut self) -> Result<(), WriteError> {
        let today = self.clock.today();
        self.today.view.confirm_delete(&self.service, today).await?;
        self.committed(ViewKind::Today);
        self.today.loaded_at = Some(self.revision);
        Ok(())
    }

    pub async fn load_settings_options(&mut self) -> Result<(), QueryError> {
        self.settings
            .view
            .report_mut()
            .load_options(&self.service)
            .await
    }

    pub async fn set_settings_field(
        &mut self,
        field: FilterField,
    ) -> Result<FilterChange, FilterError> {
        self.settings
            .view
            .report_mut()
            .set_field(&self.service, field)
            .await
    }

    pub async fn build_settings(&mut self) -> Applied {
        let revision = self.revision;
        let applied = self.settings.view.report_mut().build(&self.service).await;
        if applied.is_committed() {
            self.settings.loaded_at = Some(revision);
        }
        applied
    }

    pub async fn begin_settings_edit(&mut self, id: &str) -> Result<(), WriteError> {
        self.settings.view.begin_edit(&self.service, id).await
    }

    pub async fn set_settings_draft_kind(&mut self, kind: Option<TransactionType>) {
        self.settings
            .view
            .set_draft_kind(&self.service, kind)
            .await;
    }

    pub async fn submit_settings(&mut self) -> Result<Transaction, WriteError> {
        let today = self.clock.today();
        let saved = self.settings.view.submit(&self.service, today).await?;
        self.committed(ViewKind::Settings);
        self.settings.loaded_at = Some(self.revision);
        Ok(saved)
    }

    pub async fn confirm_settings_delete(&mut self) -> Result<(), WriteError> {
        let today = self.clock.today();
        self.settings
            .view
            .confirm_delete(&self.service, today)
            .await?;
        self.committed(ViewKind::Settings);
        self.settings.loaded_at = Some(self.revision);
        Ok(())
    }

    pub async fn load_dashboard(&mut self, month: YearMonth) -> Applied {
        let revision = self.revision;
        self.month = Some(month);
        let applied = self.dashboard.view.load(&self.service, month).await;
        if applied.is_committed() {
            self.dashboard.loaded_at = Some(revision);
        }
        applied
    }

    /// Dashboard for the clock's current month.
    pub async fn load_current_dashboard(&mut self) -> Applied {
        let month = YearMonth::of(self.clock.today());
        self.load_dashboard(month).await
    }
}
