//! Opening balance: what the ledger carried into a report window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    LedgerQueryService, MoneyCents, QueryError,
    tag::{Applied, Phase, Sequencer, Tag},
};

/// The window an opening fetch was issued for. It doubles as the fetch tag:
/// a value is only ever used against the exact window it was computed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpeningWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// `window balance + opening total`, `None` on overflow.
pub fn compose(total_balance: MoneyCents, opening_total: MoneyCents) -> Option<MoneyCents> {
    total_balance.checked_add(opening_total)
}

#[derive(Clone, Debug)]
pub struct OpeningTicket {
    tag: Tag,
    window: OpeningWindow,
}

impl OpeningTicket {
    pub fn window(&self) -> &OpeningWindow {
        &self.window
    }
}

/// Runs its own `idle -> loading -> {ready, failed}` machine, independent of
/// the report it augments.
#[derive(Debug, Default)]
pub struct OpeningBalanceResolver {
    include: bool,
    phase: Phase,
    seq: Sequencer,
    resolved: Option<(OpeningWindow, MoneyCents)>,
    error: Option<QueryError>,
}

impl OpeningBalanceResolver {
    pub fn include(&self) -> bool {
        self.include
    }

    pub fn set_include(&mut self, include: bool) {
        self.include = include;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Opening total, but only when it was fetched for `window`.
    pub fn opening_total(&self, window: &OpeningWindow) -> Option<MoneyCents> {
        match &self.resolved {
            Some((resolved_for, total)) if resolved_for == window => Some(*total),
            _ => None,
        }
    }

    /// Whether a fresh fetch is needed to show the figure for `window`.
    pub fn needs_fetch(&self, window: &OpeningWindow) -> bool {
        self.opening_total(window).is_none() && !self.is_loading()
    }

    /// Starts a fetch for `window`. An unbounded start carries nothing
    /// forward, so it resolves to zero immediately and returns `None`.
    pub fn begin(&mut self, window: OpeningWindow) -> Option<OpeningTicket> {
        let tag = self.seq.issue();
        self.error = None;
        if window.start_date.is_none() {
            self.resolved = Some((window, MoneyCents::ZERO));
            self.phase = Phase::Ready;
            return None;
        }
        self.phase = Phase::Loading;
        Some(OpeningTicket { tag, window })
    }

    pub fn complete(
        &mut self,
        ticket: OpeningTicket,
        outcome: Result<MoneyCents, QueryError>,
    ) -> Applied {
        if !self.seq.is_current(ticket.tag) {
            tracing::debug!(
                end_date = ?ticket.window.end_date,
                "dropping opening balance fetched for a previous window"
            );
            return Applied::Superseded;
        }
        match outcome {
            Ok(total) => {
                self.resolved = Some((ticket.window, total));
                self.phase = Phase::Ready;
            }
            Err(err) => {
                tracing::warn!("opening balance fetch failed: {err}");
                self.error = Some(err);
                self.phase = Phase::Failed;
            }
        }
        Applied::Committed
    }

    /// Rejects the figure resolved for the current window, e.g. one that
    /// cannot be composed with the report it belongs to.
    pub fn reject(&mut self, err: QueryError) {
        tracing::warn!("opening balance rejected: {err}");
        self.resolved = None;
        self.error = Some(err);
        self.phase = Phase::Failed;
    }

    /// Drops the cached figure after a ledger mutation. Any fetch still in
    /// flight is superseded.
    pub fn invalidate(&mut self) {
        self.seq.issue();
        self.resolved = None;
        self.error = None;
        self.phase = Phase::Idle;
    }

    pub async fn refresh<S: LedgerQueryService>(
        &mut self,
        service: &S,
        window: OpeningWindow,
    ) -> Applied {
        match self.begin(window) {
            None => Applied::Committed,
            Some(ticket) => {
                let outcome = service.query_opening_balance(&ticket.window).await;
                self.complete(ticket, outcome)
            }
        }
    }

    /// `total_balance + opening` when inclusion is on and the opening total
    /// belongs to `window`; `None` otherwise.
    pub fn including_opening(
        &self,
        total_balance: MoneyCents,
        window: &OpeningWindow,
    ) -> Option<MoneyCents> {
        if !self.include {
            return None;
        }
        self.opening_total(window)
            .and_then(|opening| compose(total_balance, opening))
    }

    /// The balance to show: window-only when inclusion is off, composed when
    /// on, `None` while the composed figure is not available for `window`.
    pub fn displayed_balance(
        &self,
        total_balance: MoneyCents,
        window: &OpeningWindow,
    ) -> Option<MoneyCents> {
        if self.include {
            self.including_opening(total_balance, window)
        } else {
            Some(total_balance)
        }
    }
}
