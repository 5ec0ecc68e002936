//! Wire types exchanged with the ledger service.
//!
//! Field names follow the service's camelCase JSON. Amounts travel as integer
//! minor units (`*_minor`), dates as `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body returned by the service alongside any non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Credit,
        Debit,
    }

    impl TransactionKind {
        /// Plural path segment used by the today sub-resource (`credits`, `debits`).
        pub fn collection(self) -> &'static str {
            match self {
                Self::Credit => "credits",
                Self::Debit => "debits",
            }
        }
    }

    /// Id/name pair embedded in a transaction row.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NamedRef {
        pub id: String,
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category: NamedRef,
        pub amount_minor: i64,
        pub payment_method: NamedRef,
        pub date: NaiveDate,
        #[serde(default)]
        pub remarks: String,
    }

    /// Body for create and update calls.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionDraft {
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category: String,
        pub amount_minor: i64,
        pub payment_method: String,
        pub remarks: String,
        pub date: NaiveDate,
        /// Optional idempotency key for safely retrying the same create request.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub idempotency_key: Option<String>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryAffinity {
        Credit,
        Debit,
        Both,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Category {
        pub id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub affinity: CategoryAffinity,
    }
}

pub mod payment_method {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PaymentMethod {
        pub id: String,
        pub name: String,
    }
}

pub mod report {
    use super::*;
    use crate::transaction::{TransactionKind, TransactionView};

    /// Query string of `GET reports`. Absent fields are not sent.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReportQuery {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub payment_method: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReportResponse {
        pub transactions: Vec<TransactionView>,
        pub total_debit_minor: i64,
        pub total_credit_minor: i64,
        pub total_balance_minor: i64,
    }

    /// Query string of `GET reports/opening-balance`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OpeningBalanceQuery {
        pub start_date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
    }

    /// Balance of every transaction dated strictly before `startDate`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OpeningBalanceResponse {
        pub opening_total_minor: i64,
    }

    /// Query string of `GET today-reports/{credits|debits}/today`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TodayQuery {
        pub date: NaiveDate,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TodayResponse {
        pub transactions: Vec<TransactionView>,
        pub total_minor: i64,
    }
}

pub mod dashboard {
    use super::*;

    /// Query string of `GET dashboard/analytics/monthly`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MonthlyQuery {
        pub year: i32,
        pub month: u32,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryTotal {
        pub category: String,
        pub total_minor: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MonthlyAnalytics {
        pub total_credits_minor: i64,
        pub total_debits_minor: i64,
        pub total_transactions: u64,
        pub debit_by_category: Vec<CategoryTotal>,
        pub credit_by_category: Vec<CategoryTotal>,
    }
}
