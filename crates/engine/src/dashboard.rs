//! Monthly analytics dashboard.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    LedgerQueryService, MoneyCents, QueryError,
    tag::{Applied, Phase, Sequencer, Tag},
};

/// A calendar month, written `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("\"{s}\" is not a YYYY-MM month");
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyAnalytics {
    pub total_credits: MoneyCents,
    pub total_debits: MoneyCents,
    pub total_transactions: u64,
    pub debit_by_category: Vec<CategoryAmount>,
    pub credit_by_category: Vec<CategoryAmount>,
}

impl MonthlyAnalytics {
    /// Credits minus debits of the same response; `None` on overflow, which
    /// [`DashboardView`] never commits.
    pub fn balance(&self) -> Option<MoneyCents> {
        self.total_credits.checked_sub(self.total_debits)
    }
}

#[derive(Clone, Debug)]
pub struct DashboardTicket {
    tag: Tag,
    month: YearMonth,
}

#[derive(Debug, Default)]
pub struct DashboardView {
    seq: Sequencer,
    phase: Phase,
    analytics: Option<(YearMonth, MonthlyAnalytics)>,
    error: Option<QueryError>,
}

impl DashboardView {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Last good analytics and the month they cover.
    pub fn analytics(&self) -> Option<(YearMonth, &MonthlyAnalytics)> {
        self.analytics.as_ref().map(|(month, a)| (*month, a))
    }

    pub fn begin(&mut self, month: YearMonth) -> DashboardTicket {
        self.phase = Phase::Loading;
        DashboardTicket {
            tag: self.seq.issue(),
            month,
        }
    }

    pub fn complete(
        &mut self,
        ticket: DashboardTicket,
        outcome: Result<MonthlyAnalytics, QueryError>,
    ) -> Applied {
        if !self.seq.is_current(ticket.tag) {
            return Applied::Superseded;
        }
        let checked = outcome.and_then(|analytics| match analytics.balance() {
            Some(_) => Ok(analytics),
            None => Err(QueryError::Inconsistent(format!(
                "credits {} minus debits {} overflows",
                analytics.total_credits, analytics.total_debits
            ))),
        });
        match checked {
            Ok(analytics) => {
                tracing::debug!(month = %ticket.month, "dashboard loaded");
                self.analytics = Some((ticket.month, analytics));
                self.error = None;
                self.phase = Phase::Ready;
            }
            Err(err) => {
                tracing::warn!(month = %ticket.month, "dashboard load failed: {err}");
                self.error = Some(err);
                self.phase = Phase::Failed;
            }
        }
        Applied::Committed
    }

    pub async fn load<S: LedgerQueryService>(&mut self, service: &S, month: YearMonth) -> Applied {
        let ticket = self.begin(month);
        let outcome = service.query_monthly_analytics(month).await;
        self.complete(ticket, outcome)
    }
}
