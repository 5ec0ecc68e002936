//! CSV statements.

use csv::Writer;
use engine::{
    ExportError, ReportExporter,
    export::{Document, ExportSnapshot},
};
use serde::Serialize;

#[derive(Serialize)]
struct StatementRow<'a> {
    date: String,
    #[serde(rename = "type")]
    kind: &'a str,
    account_head: &'a str,
    payment_method: &'a str,
    amount: String,
    remarks: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    fn file_name(snapshot: &ExportSnapshot) -> String {
        let bound = |date: Option<chrono::NaiveDate>| {
            date.map_or_else(|| "all".to_string(), |d| d.format("%Y%m%d").to_string())
        };
        format!(
            "statement_{}_{}.csv",
            bound(snapshot.criteria.start_date),
            bound(snapshot.criteria.end_date)
        )
    }
}

fn render(err: impl std::fmt::Display) -> ExportError {
    ExportError::Render(err.to_string())
}

impl ReportExporter for CsvExporter {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<Document, ExportError> {
        snapshot.ensure_consistent()?;

        let mut writer = Writer::from_writer(vec![]);
        for tx in &snapshot.transactions {
            writer
                .serialize(StatementRow {
                    date: tx.date.to_string(),
                    kind: tx.kind.as_str(),
                    account_head: &tx.category.name,
                    payment_method: &tx.payment_method.name,
                    amount: tx.amount.to_string(),
                    remarks: &tx.remarks,
                })
                .map_err(render)?;
        }
        if snapshot.transactions.is_empty() {
            // No row was serialized, so no header either.
            writer
                .write_record([
                    "date",
                    "type",
                    "account_head",
                    "payment_method",
                    "amount",
                    "remarks",
                ])
                .map_err(render)?;
        }

        let mut summary = vec![
            ("total debit", snapshot.total_debit),
            ("total credit", snapshot.total_credit),
            ("total balance", snapshot.total_balance),
        ];
        if let Some(including_opening) = snapshot.including_opening {
            summary.push(("balance including opening", including_opening));
        }
        for (label, amount) in summary {
            writer
                .write_record(["", "", "", label, amount.to_string().as_str(), ""])
                .map_err(render)?;
        }

        let bytes = writer.into_inner().map_err(render)?;
        tracing::debug!(
            rows = snapshot.transactions.len(),
            size = bytes.len(),
            "statement rendered"
        );
        Ok(Document {
            file_name: Self::file_name(snapshot),
            content_type: "text/csv".to_string(),
            bytes,
        })
    }
}
