//! Plain-text output of the views.

use std::fmt::Write;

use engine::{
    Category, MoneyCents, MonthlyAnalytics, PaymentMethod, Transaction, YearMonth,
    report::ReportResult,
    today::{TodayLedgerView, TodayPipeline},
};

pub struct Renderer<'a> {
    symbol: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(symbol: &'a str) -> Self {
        Self { symbol }
    }

    fn money(&self, amount: MoneyCents) -> String {
        amount.display_with(self.symbol)
    }

    fn rows(&self, out: &mut String, transactions: &[Transaction]) {
        for tx in transactions {
            let _ = writeln!(
                out,
                "{}  {:<6}  {:<20}  {:<12}  {:>14}  {}",
                tx.date,
                tx.kind,
                tx.category.name,
                tx.payment_method.name,
                self.money(tx.amount),
                tx.remarks
            );
        }
    }

    pub fn report(&self, report: &ReportResult, including_opening: Option<MoneyCents>) -> String {
        let mut out = String::new();
        let criteria = report.criteria();
        let bound = |d: Option<chrono::NaiveDate>| d.map_or("…".to_string(), |d| d.to_string());
        let _ = writeln!(
            out,
            "Report {} to {}",
            bound(criteria.start_date),
            bound(criteria.end_date)
        );
        if report.is_empty() {
            out.push_str("no transactions\n");
        }
        self.rows(&mut out, report.transactions());
        let _ = writeln!(out, "total debit:   {}", self.money(report.total_debit()));
        let _ = writeln!(out, "total credit:  {}", self.money(report.total_credit()));
        let _ = writeln!(out, "total balance: {}", self.money(report.total_balance()));
        if let Some(balance) = including_opening {
            let _ = writeln!(out, "balance including opening: {}", self.money(balance));
        }

        let breakdown = report.breakdown();
        for (title, groups) in [
            ("debit by account head", &breakdown.debit),
            ("credit by account head", &breakdown.credit),
        ] {
            if groups.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{title}:");
            for group in groups {
                let _ = writeln!(
                    out,
                    "  {:<20} {:>14} ({})",
                    group.category,
                    self.money(group.total),
                    group.count
                );
            }
        }
        out
    }

    fn pipeline(&self, out: &mut String, title: &str, pipeline: &TodayPipeline) {
        let _ = writeln!(out, "{title}: {}", self.money(pipeline.total()));
        if let Some(err) = pipeline.error() {
            let _ = writeln!(out, "  unavailable: {err}");
            return;
        }
        self.rows(out, pipeline.entries());
    }

    pub fn today(&self, view: &TodayLedgerView) -> String {
        let mut out = String::new();
        self.pipeline(&mut out, "credits", view.credit());
        self.pipeline(&mut out, "debits", view.debit());
        out
    }

    pub fn dashboard(&self, month: YearMonth, analytics: &MonthlyAnalytics) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dashboard {month}");
        let _ = writeln!(out, "credits:      {}", self.money(analytics.total_credits));
        let _ = writeln!(out, "debits:       {}", self.money(analytics.total_debits));
        if let Some(balance) = analytics.balance() {
            let _ = writeln!(out, "balance:      {}", self.money(balance));
        }
        let _ = writeln!(out, "transactions: {}", analytics.total_transactions);
        for (title, rows) in [
            ("debit by account head", &analytics.debit_by_category),
            ("credit by account head", &analytics.credit_by_category),
        ] {
            if rows.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{title}:");
            for row in rows {
                let _ = writeln!(out, "  {:<20} {:>14}", row.category, self.money(row.total));
            }
        }
        out
    }
}

pub fn categories(categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        let _ = writeln!(
            out,
            "{:<12} {:<24} {:?}",
            category.id, category.name, category.affinity
        );
    }
    out
}

pub fn payment_methods(methods: &[PaymentMethod]) -> String {
    let mut out = String::new();
    for method in methods {
        let _ = writeln!(out, "{:<12} {}", method.id, method.name);
    }
    out
}
