#![allow(dead_code)]

use std::{cell::Cell, cell::RefCell, collections::VecDeque, time::Duration};

use chrono::NaiveDate;
use engine::{
    Affinity, Category, LedgerCommands, LedgerPage, LedgerQueryService, MoneyCents,
    MonthlyAnalytics, OpeningWindow, PaymentMethod, QueryError, TodayPage, Transaction,
    TransactionInput, TransactionType, WriteError, YearMonth, filter::FilterCriteria,
    memory::MemoryLedger,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ledger() -> MemoryLedger {
    MemoryLedger::new()
        .with_category("rent", "Rent", Affinity::Debit)
        .with_category("salary", "Salary", Affinity::Credit)
        .with_category("misc", "Misc", Affinity::Both)
        .with_payment_method("bank", "Bank")
        .with_payment_method("cash", "Cash")
}

pub fn debit(ledger: &MemoryLedger, major: i64, day: NaiveDate) -> Transaction {
    ledger
        .record(
            TransactionType::Debit,
            "rent",
            "cash",
            MoneyCents::from_major(major),
            day,
            "",
        )
        .unwrap()
}

pub fn credit(ledger: &MemoryLedger, major: i64, day: NaiveDate) -> Transaction {
    ledger
        .record(
            TransactionType::Credit,
            "salary",
            "bank",
            MoneyCents::from_major(major),
            day,
            "",
        )
        .unwrap()
}

pub fn category(id: &str, name: &str, affinity: Affinity) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        affinity,
    }
}

/// Wraps a ledger with scripted latency and failures. Each delay queue is
/// consumed one call at a time; an empty queue means no delay.
pub struct Scripted<'a> {
    pub inner: &'a MemoryLedger,
    pub ledger_delays: RefCell<VecDeque<Duration>>,
    pub opening_delays: RefCell<VecDeque<Duration>>,
    pub fail_ledger: Cell<bool>,
    pub fail_opening: Cell<bool>,
    pub fail_categories: Cell<bool>,
    pub fail_writes: Cell<bool>,
    pub fail_today: Cell<Option<TransactionType>>,
    pub ledger_calls: Cell<usize>,
    pub opening_calls: Cell<usize>,
}

impl<'a> Scripted<'a> {
    pub fn new(inner: &'a MemoryLedger) -> Self {
        Self {
            inner,
            ledger_delays: RefCell::default(),
            opening_delays: RefCell::default(),
            fail_ledger: Cell::new(false),
            fail_opening: Cell::new(false),
            fail_categories: Cell::new(false),
            fail_writes: Cell::new(false),
            fail_today: Cell::new(None),
            ledger_calls: Cell::new(0),
            opening_calls: Cell::new(0),
        }
    }

    pub fn delay_ledger(&self, millis: &[u64]) {
        self.ledger_delays
            .borrow_mut()
            .extend(millis.iter().map(|ms| Duration::from_millis(*ms)));
    }

    pub fn delay_opening(&self, millis: &[u64]) {
        self.opening_delays
            .borrow_mut()
            .extend(millis.iter().map(|ms| Duration::from_millis(*ms)));
    }

    fn write_guard(&self) -> Result<(), WriteError> {
        if self.fail_writes.get() {
            return Err(QueryError::Transport("connection reset".to_string()).into());
        }
        Ok(())
    }
}

async fn pause(queue: &RefCell<VecDeque<Duration>>) {
    let delay = queue.borrow_mut().pop_front();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

impl LedgerQueryService for Scripted<'_> {
    async fn query_ledger(&self, criteria: &FilterCriteria) -> Result<LedgerPage, QueryError> {
        self.ledger_calls.set(self.ledger_calls.get() + 1);
        pause(&self.ledger_delays).await;
        if self.fail_ledger.get() {
            return Err(QueryError::Server("500 internal".to_string()));
        }
        self.inner.query_ledger(criteria).await
    }

    async fn query_opening_balance(
        &self,
        window: &OpeningWindow,
    ) -> Result<MoneyCents, QueryError> {
        self.opening_calls.set(self.opening_calls.get() + 1);
        pause(&self.opening_delays).await;
        if self.fail_opening.get() {
            return Err(QueryError::Transport("timeout".to_string()));
        }
        self.inner.query_opening_balance(window).await
    }

    async fn list_categories(&self, kind: TransactionType) -> Result<Vec<Category>, QueryError> {
        if self.fail_categories.get() {
            return Err(QueryError::Transport("timeout".to_string()));
        }
        self.inner.list_categories(kind).await
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, QueryError> {
        self.inner.list_payment_methods().await
    }

    async fn query_today(
        &self,
        kind: TransactionType,
        date: NaiveDate,
    ) -> Result<TodayPage, QueryError> {
        if self.fail_today.get() == Some(kind) {
            return Err(QueryError::Transport("timeout".to_string()));
        }
        self.inner.query_today(kind, date).await
    }

    async fn query_monthly_analytics(
        &self,
        month: YearMonth,
    ) -> Result<MonthlyAnalytics, QueryError> {
        self.inner.query_monthly_analytics(month).await
    }
}

impl LedgerCommands for Scripted<'_> {
    async fn create_transaction(
        &self,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.write_guard()?;
        self.inner.create_transaction(input).await
    }

    async fn update_transaction(
        &self,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.write_guard()?;
        self.inner.update_transaction(id, input).await
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), WriteError> {
        self.write_guard()?;
        self.inner.delete_transaction(id).await
    }

    async fn update_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.write_guard()?;
        self.inner.update_today_transaction(kind, id, input).await
    }

    async fn delete_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
    ) -> Result<(), WriteError> {
        self.write_guard()?;
        self.inner.delete_today_transaction(kind, id).await
    }
}
