//! In-memory ledger implementing both ports.
//!
//! Rows are kept in ledger (insertion) order. Queries return them ordered by
//! date with ties in ledger order, and every aggregate is computed from the
//! rows the query matched.

use std::{cell::RefCell, collections::HashMap};

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

use crate::{
    Affinity, Category, EntityRef, LedgerCommands, LedgerQueryService, MoneyCents,
    MonthlyAnalytics, OpeningWindow, PaymentMethod, QueryError, Transaction, TransactionInput,
    TransactionType, WriteError, YearMonth,
    dashboard::CategoryAmount,
    filter::FilterCriteria,
    ports::{LedgerPage, TodayPage},
};

#[derive(Debug, Default)]
struct State {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    payment_methods: Vec<PaymentMethod>,
    next_id: u64,
    /// Idempotency key to the id of the row it created.
    created: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RefCell<State>,
}

fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

fn matches(tx: &Transaction, criteria: &FilterCriteria, needle: Option<&str>) -> bool {
    criteria.start_date.is_none_or(|start| tx.date >= start)
        && criteria.end_date.is_none_or(|end| tx.date <= end)
        && criteria.kind.is_none_or(|kind| tx.kind == kind)
        && criteria.category_id().is_none_or(|id| tx.category.id == id)
        && criteria
            .payment_method
            .as_deref()
            .is_none_or(|id| tx.payment_method.id == id)
        && needle.is_none_or(|needle| normalize(&tx.remarks).contains(needle))
}

fn overflow(what: &str) -> QueryError {
    QueryError::Inconsistent(format!("{what} overflows"))
}

fn sum(rows: &[&Transaction], kind: TransactionType) -> Result<MoneyCents, QueryError> {
    let amounts = rows.iter().filter(|tx| tx.kind == kind).map(|tx| tx.amount);
    MoneyCents::checked_sum(amounts).ok_or_else(|| overflow(&format!("total {kind}")))
}

fn by_category(rows: &[&Transaction], kind: TransactionType) -> Vec<CategoryAmount> {
    let mut totals: Vec<CategoryAmount> = Vec::new();
    for tx in rows.iter().filter(|tx| tx.kind == kind) {
        match totals.iter_mut().find(|c| c.category == tx.category.name) {
            // Bounded by the checked per-kind sum.
            Some(entry) => entry.total += tx.amount,
            None => totals.push(CategoryAmount {
                category: tx.category.name.clone(),
                total: tx.amount,
            }),
        }
    }
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(self, id: &str, name: &str, affinity: Affinity) -> Self {
        self.state.borrow_mut().categories.push(Category {
            id: id.to_string(),
            name: name.to_string(),
            affinity,
        });
        self
    }

    pub fn with_payment_method(self, id: &str, name: &str) -> Self {
        self.state.borrow_mut().payment_methods.push(PaymentMethod {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Appends a row, validated like any create.
    pub fn record(
        &self,
        kind: TransactionType,
        category_id: &str,
        payment_method_id: &str,
        amount: MoneyCents,
        date: NaiveDate,
        remarks: &str,
    ) -> Result<Transaction, WriteError> {
        self.insert(&TransactionInput {
            kind,
            category_id: category_id.to_string(),
            amount,
            payment_method_id: payment_method_id.to_string(),
            remarks: remarks.to_string(),
            date,
            idempotency_key: None,
        })
    }

    /// Rows in ledger order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, input: &TransactionInput) -> Result<Transaction, WriteError> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = input
            .idempotency_key
            .as_ref()
            .and_then(|key| state.created.get(key))
        {
            if let Some(existing) = state.transactions.iter().find(|tx| &tx.id == id) {
                tracing::debug!(id = %existing.id, "replayed create");
                return Ok(existing.clone());
            }
        }

        state.next_id += 1;
        let id = format!("tx-{}", state.next_id);
        let tx = state.resolve(id, input)?;
        if let Some(key) = &input.idempotency_key {
            state.created.insert(key.clone(), tx.id.clone());
        }
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    fn replace(
        &self,
        id: &str,
        scope: Option<TransactionType>,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        let mut state = self.state.borrow_mut();
        let position = state.position(id, scope)?;
        let tx = state.resolve(id.to_string(), input)?;
        state.transactions[position] = tx.clone();
        Ok(tx)
    }

    fn remove(&self, id: &str, scope: Option<TransactionType>) -> Result<(), WriteError> {
        let mut state = self.state.borrow_mut();
        let position = state.position(id, scope)?;
        state.transactions.remove(position);
        Ok(())
    }
}

impl State {
    fn position(&self, id: &str, scope: Option<TransactionType>) -> Result<usize, WriteError> {
        self.transactions
            .iter()
            .position(|tx| tx.id == id && scope.is_none_or(|kind| tx.kind == kind))
            .ok_or_else(|| WriteError::NotFound(id.to_string()))
    }

    fn resolve(&self, id: String, input: &TransactionInput) -> Result<Transaction, WriteError> {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == input.category_id)
            .ok_or_else(|| {
                WriteError::Validation(format!("unknown account head {}", input.category_id))
            })?;
        if !category.permits(input.kind) {
            return Err(WriteError::Validation(format!(
                "account head {} does not apply to {} transactions",
                category.name, input.kind
            )));
        }
        let method = self
            .payment_methods
            .iter()
            .find(|m| m.id == input.payment_method_id)
            .ok_or_else(|| {
                WriteError::Validation(format!(
                    "unknown payment method {}",
                    input.payment_method_id
                ))
            })?;
        if input.amount.is_negative() || input.amount.is_zero() {
            return Err(WriteError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        Ok(Transaction {
            id,
            kind: input.kind,
            category: EntityRef {
                id: category.id.clone(),
                name: category.name.clone(),
            },
            amount: input.amount,
            payment_method: EntityRef {
                id: method.id.clone(),
                name: method.name.clone(),
            },
            date: input.date,
            remarks: input.remarks.clone(),
        })
    }
}

impl LedgerQueryService for MemoryLedger {
    async fn query_ledger(&self, criteria: &FilterCriteria) -> Result<LedgerPage, QueryError> {
        let state = self.state.borrow();
        let needle = criteria.search.as_deref().map(normalize);
        let mut rows: Vec<&Transaction> = state
            .transactions
            .iter()
            .filter(|tx| matches(tx, criteria, needle.as_deref()))
            .collect();
        rows.sort_by_key(|tx| tx.date);

        let total_debit = sum(&rows, TransactionType::Debit)?;
        let total_credit = sum(&rows, TransactionType::Credit)?;
        let total_balance = total_credit
            .checked_sub(total_debit)
            .ok_or_else(|| overflow("total balance"))?;
        Ok(LedgerPage {
            transactions: rows.into_iter().cloned().collect(),
            total_debit,
            total_credit,
            total_balance,
        })
    }

    async fn query_opening_balance(
        &self,
        window: &OpeningWindow,
    ) -> Result<MoneyCents, QueryError> {
        let Some(start) = window.start_date else {
            return Ok(MoneyCents::ZERO);
        };
        let state = self.state.borrow();
        let amounts = state
            .transactions
            .iter()
            .filter(|tx| tx.date < start)
            .map(Transaction::signed_amount);
        MoneyCents::checked_sum(amounts).ok_or_else(|| overflow("opening balance"))
    }

    async fn list_categories(&self, kind: TransactionType) -> Result<Vec<Category>, QueryError> {
        Ok(self
            .state
            .borrow()
            .categories
            .iter()
            .filter(|c| c.permits(kind))
            .cloned()
            .collect())
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, QueryError> {
        Ok(self.state.borrow().payment_methods.clone())
    }

    async fn query_today(
        &self,
        kind: TransactionType,
        date: NaiveDate,
    ) -> Result<TodayPage, QueryError> {
        let state = self.state.borrow();
        let transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|tx| tx.kind == kind && tx.date == date)
            .cloned()
            .collect();
        let total = MoneyCents::checked_sum(transactions.iter().map(|tx| tx.amount))
            .ok_or_else(|| overflow(&format!("today {kind} total")))?;
        Ok(TodayPage {
            transactions,
            total,
        })
    }

    async fn query_monthly_analytics(
        &self,
        month: YearMonth,
    ) -> Result<MonthlyAnalytics, QueryError> {
        let state = self.state.borrow();
        let rows: Vec<&Transaction> = state
            .transactions
            .iter()
            .filter(|tx| month.contains(tx.date))
            .collect();
        Ok(MonthlyAnalytics {
            total_credits: sum(&rows, TransactionType::Credit)?,
            total_debits: sum(&rows, TransactionType::Debit)?,
            total_transactions: rows.len() as u64,
            debit_by_category: by_category(&rows, TransactionType::Debit),
            credit_by_category: by_category(&rows, TransactionType::Credit),
        })
    }
}

impl LedgerCommands for MemoryLedger {
    async fn create_transaction(
        &self,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.insert(input)
    }

    async fn update_transaction(
        &self,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.replace(id, None, input)
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), WriteError> {
        self.remove(id, None)
    }

    async fn update_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, WriteError> {
        self.replace(id, Some(kind), input)
    }

    async fn delete_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
    ) -> Result<(), WriteError> {
        self.remove(id, Some(kind))
    }
}
