//! Contracts the engine consumes. The ledger store, its transport and the
//! document renderer live behind these traits.
//!
//! The engine drives everything on one logical thread, so the futures carry no
//! `Send` bound.
#![allow(async_fn_in_trait)]

use chrono::NaiveDate;

use crate::{
    Category, ExportError, MoneyCents, MonthlyAnalytics, OpeningWindow, PaymentMethod,
    QueryError, Transaction, TransactionInput, TransactionType, WriteError, YearMonth,
    export::{Document, ExportSnapshot},
    filter::FilterCriteria,
};

/// Rows and aggregates of one `query_ledger` call, as reported by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerPage {
    pub transactions: Vec<Transaction>,
    pub total_debit: MoneyCents,
    pub total_credit: MoneyCents,
    pub total_balance: MoneyCents,
}

/// Today's entries of one type with their server-side total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodayPage {
    pub transactions: Vec<Transaction>,
    pub total: MoneyCents,
}

pub trait LedgerQueryService {
    async fn query_ledger(&self, criteria: &FilterCriteria) -> Result<LedgerPage, QueryError>;

    /// Balance of every transaction dated strictly before `window.start_date`.
    async fn query_opening_balance(&self, window: &OpeningWindow)
    -> Result<MoneyCents, QueryError>;

    async fn list_categories(&self, kind: TransactionType) -> Result<Vec<Category>, QueryError>;

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, QueryError>;

    async fn query_today(
        &self,
        kind: TransactionType,
        date: NaiveDate,
    ) -> Result<TodayPage, QueryError>;

    async fn query_monthly_analytics(
        &self,
        month: YearMonth,
    ) -> Result<MonthlyAnalytics, QueryError>;
}

pub trait LedgerCommands {
    async fn create_transaction(&self, input: &TransactionInput)
    -> Result<Transaction, WriteError>;

    async fn update_transaction(
        &self,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError>;

    async fn delete_transaction(&self, id: &str) -> Result<(), WriteError>;

    /// Update scoped to the today sub-resource of `kind`.
    async fn update_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError>;

    async fn delete_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
    ) -> Result<(), WriteError>;
}

/// Renders a resolved report into a durable document.
pub trait ReportExporter {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<Document, ExportError>;
}
