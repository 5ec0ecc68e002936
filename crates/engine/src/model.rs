//! Read projections of ledger entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Credit, TransactionType::Debit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Signed contribution of `amount` to a balance.
    pub fn signed(self, amount: MoneyCents) -> MoneyCents {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Which transaction types a category may classify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    Credit,
    Debit,
    Both,
}

impl Affinity {
    pub fn permits(self, kind: TransactionType) -> bool {
        matches!(
            (self, kind),
            (Self::Both, _)
                | (Self::Credit, TransactionType::Credit)
                | (Self::Debit, TransactionType::Debit)
        )
    }
}

impl From<TransactionType> for Affinity {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Credit => Self::Credit,
            TransactionType::Debit => Self::Debit,
        }
    }
}

/// An account head.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub affinity: Affinity,
}

impl Category {
    pub fn permits(&self, kind: TransactionType) -> bool {
        self.affinity.permits(kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
}

/// Id plus display name, as embedded in a transaction row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionType,
    pub category: EntityRef,
    /// Never negative; the direction comes from `kind`.
    pub amount: MoneyCents,
    pub payment_method: EntityRef,
    pub date: NaiveDate,
    pub remarks: String,
}

impl Transaction {
    pub fn signed_amount(&self) -> MoneyCents {
        self.kind.signed(self.amount)
    }
}

/// A validated draft, ready to be sent to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub kind: TransactionType,
    pub category_id: String,
    pub amount: MoneyCents,
    pub payment_method_id: String,
    pub remarks: String,
    pub date: NaiveDate,
    /// Set on creates so a retried request is not booked twice.
    pub idempotency_key: Option<String>,
}
