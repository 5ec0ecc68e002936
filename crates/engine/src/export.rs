//! Input and output of a report export.

use serde::Serialize;

use crate::{ExportError, MoneyCents, Transaction, filter::FilterCriteria, report::ReportResult};

/// A frozen, fully resolved report ready to be rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportSnapshot {
    pub criteria: FilterCriteria,
    pub transactions: Vec<Transaction>,
    pub total_debit: MoneyCents,
    pub total_credit: MoneyCents,
    pub total_balance: MoneyCents,
    /// Present only when the opening balance was requested and resolved.
    pub including_opening: Option<MoneyCents>,
}

impl ExportSnapshot {
    pub fn new(
        report: &ReportResult,
        including_opening: Option<MoneyCents>,
    ) -> Result<Self, ExportError> {
        let snapshot = Self {
            criteria: report.criteria().clone(),
            transactions: report.transactions().to_vec(),
            total_debit: report.total_debit(),
            total_credit: report.total_credit(),
            total_balance: report.total_balance(),
            including_opening,
        };
        snapshot.ensure_consistent()?;
        Ok(snapshot)
    }

    /// Renderers call this before writing anything.
    pub fn ensure_consistent(&self) -> Result<(), ExportError> {
        if self.total_credit.checked_sub(self.total_debit) != Some(self.total_balance) {
            return Err(ExportError::Inconsistent(format!(
                "balance {} != credit {} - debit {}",
                self.total_balance, self.total_credit, self.total_debit
            )));
        }
        Ok(())
    }
}

/// A rendered document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
