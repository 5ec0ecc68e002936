//! The immutable result of one successful report query.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    MoneyCents, QueryError, Transaction, TransactionType, filter::FilterCriteria,
    ports::LedgerPage,
};

/// Rows and totals from the same response, plus the criteria they answer.
///
/// Built only through [`ReportResult::from_page`], which refuses totals that
/// do not reconcile. Replaced wholesale on every committed build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportResult {
    criteria: FilterCriteria,
    transactions: Vec<Transaction>,
    total_debit: MoneyCents,
    total_credit: MoneyCents,
    total_balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: MoneyCents,
    pub count: usize,
}

/// Per-account-head totals, split by direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub debit: Vec<CategoryTotal>,
    pub credit: Vec<CategoryTotal>,
}

impl ReportResult {
    pub fn from_page(criteria: FilterCriteria, page: LedgerPage) -> Result<Self, QueryError> {
        let LedgerPage {
            mut transactions,
            total_debit,
            total_credit,
            total_balance,
        } = page;

        if total_credit.checked_sub(total_debit) != Some(total_balance) {
            return Err(QueryError::Inconsistent(format!(
                "balance {total_balance} != credit {total_credit} - debit {total_debit}"
            )));
        }
        if let Some(tx) = transactions.iter().find(|tx| tx.amount.is_negative()) {
            return Err(QueryError::Inconsistent(format!(
                "transaction {} has a negative amount",
                tx.id
            )));
        }

        for kind in TransactionType::ALL {
            let amounts = transactions
                .iter()
                .filter(|tx| tx.kind == kind)
                .map(|tx| tx.amount);
            if MoneyCents::checked_sum(amounts).is_none() {
                return Err(QueryError::Inconsistent(format!(
                    "{kind} rows overflow their total"
                )));
            }
        }

        // Stable: same-day rows keep ledger order.
        transactions.sort_by_key(|tx| tx.date);

        Ok(Self {
            criteria,
            transactions,
            total_debit,
            total_credit,
            total_balance,
        })
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn total_debit(&self) -> MoneyCents {
        self.total_debit
    }

    pub fn total_credit(&self) -> MoneyCents {
        self.total_credit
    }

    pub fn total_balance(&self) -> MoneyCents {
        self.total_balance
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// Groups rows by account head, largest total first (name breaks ties).
    pub fn breakdown(&self) -> CategoryBreakdown {
        let mut debit: HashMap<&str, CategoryTotal> = HashMap::new();
        let mut credit: HashMap<&str, CategoryTotal> = HashMap::new();

        for tx in &self.transactions {
            let bucket = match tx.kind {
                TransactionType::Debit => &mut debit,
                TransactionType::Credit => &mut credit,
            };
            let entry = bucket
                .entry(tx.category.name.as_str())
                .or_insert_with(|| CategoryTotal {
                    category: tx.category.name.clone(),
                    total: MoneyCents::ZERO,
                    count: 0,
                });
            // Cannot overflow: `from_page` checked every per-kind sum.
            entry.total += tx.amount;
            entry.count += 1;
        }

        CategoryBreakdown {
            debit: sorted(debit),
            credit: sorted(credit),
        }
    }
}

fn sorted(bucket: HashMap<&str, CategoryTotal>) -> Vec<CategoryTotal> {
    let mut totals: Vec<_> = bucket.into_values().collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}
