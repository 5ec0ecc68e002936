use api_types::{
    ErrorBody,
    category::{Category as WireCategory, CategoryAffinity},
    dashboard::{MonthlyAnalytics as WireAnalytics, MonthlyQuery},
    payment_method::PaymentMethod as WirePaymentMethod,
    report::{
        OpeningBalanceQuery, OpeningBalanceResponse, ReportQuery, ReportResponse, TodayQuery,
        TodayResponse,
    },
    transaction::{NamedRef, TransactionDraft, TransactionKind, TransactionView},
};
use chrono::NaiveDate;
use engine::{
    Affinity, Category, CategoryAmount, EntityRef, LedgerCommands, LedgerPage, LedgerQueryService,
    MoneyCents, MonthlyAnalytics, OpeningWindow, PaymentMethod, QueryError, TodayPage, Transaction,
    TransactionInput, TransactionType, WriteError, YearMonth, filter::FilterCriteria,
};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// Ledger service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    base_url: Url,
    http: reqwest::Client,
}

fn kind_to_wire(kind: TransactionType) -> TransactionKind {
    match kind {
        TransactionType::Credit => TransactionKind::Credit,
        TransactionType::Debit => TransactionKind::Debit,
    }
}

fn kind_from_wire(kind: TransactionKind) -> TransactionType {
    match kind {
        TransactionKind::Credit => TransactionType::Credit,
        TransactionKind::Debit => TransactionType::Debit,
    }
}

fn entity(named: NamedRef) -> EntityRef {
    EntityRef {
        id: named.id,
        name: named.name,
    }
}

fn transaction(view: TransactionView) -> Transaction {
    Transaction {
        id: view.id,
        kind: kind_from_wire(view.kind),
        category: entity(view.category),
        amount: MoneyCents::new(view.amount_minor),
        payment_method: entity(view.payment_method),
        date: view.date,
        remarks: view.remarks,
    }
}

fn draft(input: &TransactionInput) -> TransactionDraft {
    TransactionDraft {
        kind: kind_to_wire(input.kind),
        category: input.category_id.clone(),
        amount_minor: input.amount.cents(),
        payment_method: input.payment_method_id.clone(),
        remarks: input.remarks.clone(),
        date: input.date,
        idempotency_key: input.idempotency_key.clone(),
    }
}

fn transport(err: reqwest::Error) -> QueryError {
    if err.is_decode() {
        QueryError::Inconsistent(err.to_string())
    } else {
        QueryError::Transport(err.to_string())
    }
}

async fn error_body(res: Response) -> (StatusCode, String) {
    let status = res.status();
    let body = res
        .json::<ErrorBody>()
        .await
        .map(|err| err.error)
        .unwrap_or_else(|_| "unknown error".to_string());
    (status, body)
}

fn query_failure(status: StatusCode, body: String) -> QueryError {
    match status.as_u16() {
        404 => QueryError::NotFound(body),
        _ => QueryError::Server(format!("{status}: {body}")),
    }
}

fn write_failure(status: StatusCode, body: String) -> WriteError {
    match status.as_u16() {
        400 | 409 | 422 => WriteError::Validation(body),
        404 => WriteError::NotFound(body),
        _ => WriteError::Query(QueryError::Server(format!("{status}: {body}"))),
    }
}

impl HttpLedger {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| AppError::Setting(format!("invalid base_url: {err}")))?;
        // `join` replaces the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, QueryError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| QueryError::Transport(format!("invalid endpoint {path}: {err}")))?;
        tracing::debug!(%url, "ledger request");
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, QueryError> {
        let res = request.send().await.map_err(transport)?;
        if res.status().is_success() {
            return res.json::<T>().await.map_err(transport);
        }
        let (status, body) = error_body(res).await;
        tracing::debug!(%status, "ledger read rejected: {body}");
        Err(query_failure(status, body))
    }

    async fn write(&self, request: RequestBuilder) -> std::result::Result<Response, WriteError> {
        let res = request.send().await.map_err(transport)?;
        if res.status().is_success() {
            return Ok(res);
        }
        let (status, body) = error_body(res).await;
        tracing::debug!(%status, "ledger write rejected: {body}");
        Err(write_failure(status, body))
    }

    async fn write_transaction(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<Transaction, WriteError> {
        let res = self.write(request).await?;
        let view = res.json::<TransactionView>().await.map_err(transport)?;
        Ok(transaction(view))
    }

    fn today_path(kind: TransactionType, id: Option<&str>) -> String {
        let collection = kind_to_wire(kind).collection();
        match id {
            Some(id) => format!("today-reports/{collection}/today/{id}"),
            None => format!("today-reports/{collection}/today"),
        }
    }
}

impl LedgerQueryService for HttpLedger {
    async fn query_ledger(
        &self,
        criteria: &FilterCriteria,
    ) -> std::result::Result<LedgerPage, QueryError> {
        let query = ReportQuery {
            start_date: criteria.start_date,
            end_date: criteria.end_date,
            kind: criteria.kind.map(kind_to_wire),
            category: criteria.category_id().map(str::to_string),
            payment_method: criteria.payment_method.clone(),
            search: criteria.search.clone(),
        };
        let endpoint = self.endpoint("reports")?;
        let res: ReportResponse = self.read(self.http.get(endpoint).query(&query)).await?;
        Ok(LedgerPage {
            transactions: res.transactions.into_iter().map(transaction).collect(),
            total_debit: MoneyCents::new(res.total_debit_minor),
            total_credit: MoneyCents::new(res.total_credit_minor),
            total_balance: MoneyCents::new(res.total_balance_minor),
        })
    }

    async fn query_opening_balance(
        &self,
        window: &OpeningWindow,
    ) -> std::result::Result<MoneyCents, QueryError> {
        let Some(start_date) = window.start_date else {
            return Ok(MoneyCents::ZERO);
        };
        let query = OpeningBalanceQuery {
            start_date,
            end_date: window.end_date,
        };
        let endpoint = self.endpoint("reports/opening-balance")?;
        let res: OpeningBalanceResponse =
            self.read(self.http.get(endpoint).query(&query)).await?;
        Ok(MoneyCents::new(res.opening_total_minor))
    }

    async fn list_categories(
        &self,
        kind: TransactionType,
    ) -> std::result::Result<Vec<Category>, QueryError> {
        let endpoint = self.endpoint(&format!("categories/type/{}", kind.as_str()))?;
        let res: Vec<WireCategory> = self.read(self.http.get(endpoint)).await?;
        Ok(res
            .into_iter()
            .map(|c| Category {
                id: c.id,
                name: c.name,
                affinity: match c.affinity {
                    CategoryAffinity::Credit => Affinity::Credit,
                    CategoryAffinity::Debit => Affinity::Debit,
                    CategoryAffinity::Both => Affinity::Both,
                },
            })
            .collect())
    }

    async fn list_payment_methods(&self) -> std::result::Result<Vec<PaymentMethod>, QueryError> {
        let endpoint = self.endpoint("payment-methods")?;
        let res: Vec<WirePaymentMethod> = self.read(self.http.get(endpoint)).await?;
        Ok(res
            .into_iter()
            .map(|m| PaymentMethod {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    async fn query_today(
        &self,
        kind: TransactionType,
        date: NaiveDate,
    ) -> std::result::Result<TodayPage, QueryError> {
        let endpoint = self.endpoint(&Self::today_path(kind, None))?;
        let res: TodayResponse = self
            .read(self.http.get(endpoint).query(&TodayQuery { date }))
            .await?;
        Ok(TodayPage {
            transactions: res.transactions.into_iter().map(transaction).collect(),
            total: MoneyCents::new(res.total_minor),
        })
    }

    async fn query_monthly_analytics(
        &self,
        month: YearMonth,
    ) -> std::result::Result<MonthlyAnalytics, QueryError> {
        let query = MonthlyQuery {
            year: month.year(),
            month: month.month(),
        };
        let endpoint = self.endpoint("dashboard/analytics/monthly")?;
        let res: WireAnalytics = self.read(self.http.get(endpoint).query(&query)).await?;
        let amounts = |rows: Vec<api_types::dashboard::CategoryTotal>| {
            rows.into_iter()
                .map(|row| CategoryAmount {
                    category: row.category,
                    total: MoneyCents::new(row.total_minor),
                })
                .collect()
        };
        Ok(MonthlyAnalytics {
            total_credits: MoneyCents::new(res.total_credits_minor),
            total_debits: MoneyCents::new(res.total_debits_minor),
            total_transactions: res.total_transactions,
            debit_by_category: amounts(res.debit_by_category),
            credit_by_category: amounts(res.credit_by_category),
        })
    }
}

impl LedgerCommands for HttpLedger {
    async fn create_transaction(
        &self,
        input: &TransactionInput,
    ) -> std::result::Result<Transaction, WriteError> {
        let endpoint = self.endpoint("transactions")?;
        self.write_transaction(self.http.post(endpoint).json(&draft(input)))
            .await
    }

    async fn update_transaction(
        &self,
        id: &str,
        input: &TransactionInput,
    ) -> std::result::Result<Transaction, WriteError> {
        let endpoint = self.endpoint(&format!("transactions/{id}"))?;
        self.write_transaction(self.http.put(endpoint).json(&draft(input)))
            .await
    }

    async fn delete_transaction(&self, id: &str) -> std::result::Result<(), WriteError> {
        let endpoint = self.endpoint(&format!("transactions/{id}"))?;
        self.write(self.http.delete(endpoint)).await?;
        Ok(())
    }

    async fn update_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
        input: &TransactionInput,
    ) -> std::result::Result<Transaction, WriteError> {
        let endpoint = self.endpoint(&Self::today_path(kind, Some(id)))?;
        self.write_transaction(self.http.put(endpoint).json(&draft(input)))
            .await
    }

    async fn delete_today_transaction(
        &self,
        kind: TransactionType,
        id: &str,
    ) -> std::result::Result<(), WriteError> {
        let endpoint = self.endpoint(&Self::today_path(kind, Some(id)))?;
        self.write(self.http.delete(endpoint)).await?;
        Ok(())
    }
}
