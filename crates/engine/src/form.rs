//! Editable transaction draft shared by the create and edit flows.

use chrono::NaiveDate;

use crate::{
    Affinity, Category, MoneyCents, PaymentMethod, Transaction, TransactionInput,
    TransactionType, WriteError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: Option<TransactionType>,
    pub category: Option<Category>,
    pub amount: MoneyCents,
    pub payment_method: Option<String>,
    pub remarks: String,
    pub date: NaiveDate,
}

impl TransactionDraft {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            kind: None,
            category: None,
            amount: MoneyCents::ZERO,
            payment_method: None,
            remarks: String::new(),
            date: today,
        }
    }

    /// Pre-fills from a ledger row. The row's category is known to fit the
    /// row's type, which is all the affinity the row tells us.
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            kind: Some(tx.kind),
            category: Some(Category {
                id: tx.category.id.clone(),
                name: tx.category.name.clone(),
                affinity: Affinity::from(tx.kind),
            }),
            amount: tx.amount,
            payment_method: Some(tx.payment_method.id.clone()),
            remarks: tx.remarks.clone(),
            date: tx.date,
        }
    }

    /// Changes the type, dropping a category that does not fit it.
    pub fn set_kind(&mut self, kind: Option<TransactionType>) {
        self.kind = kind;
        let fits = match (&self.category, kind) {
            (Some(category), Some(kind)) => category.permits(kind),
            _ => false,
        };
        if !fits {
            self.category = None;
        }
    }

    pub fn set_category(&mut self, category: Option<Category>) -> Result<(), WriteError> {
        if let Some(category) = &category {
            let kind = self
                .kind
                .ok_or_else(|| WriteError::Validation("select a type first".to_string()))?;
            if !category.permits(kind) {
                return Err(WriteError::Validation(format!(
                    "category {} does not apply to {kind} transactions",
                    category.name
                )));
            }
        }
        self.category = category;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: MoneyCents) -> Result<(), WriteError> {
        if amount.is_negative() {
            return Err(WriteError::Validation(
                "amount must not be negative".to_string(),
            ));
        }
        self.amount = amount;
        Ok(())
    }

    /// Amount as typed by a person: `.` or `,` separator, at most two
    /// decimals. A rejected input leaves the previous amount in place.
    pub fn set_amount_text(&mut self, text: &str) -> Result<(), WriteError> {
        self.set_amount(text.parse()?)
    }

    /// Picks the method whose name matches `name` (case-insensitive), unless
    /// one is already chosen.
    pub fn preselect_payment_method(&mut self, methods: &[PaymentMethod], name: &str) {
        if self.payment_method.is_some() {
            return;
        }
        self.payment_method = methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
            .map(|m| m.id.clone());
    }

    pub fn validate(&self) -> Result<TransactionInput, WriteError> {
        let invalid = |msg: &str| WriteError::Validation(msg.to_string());

        let kind = self.kind.ok_or_else(|| invalid("type is required"))?;
        let category = self
            .category
            .as_ref()
            .ok_or_else(|| invalid("account head is required"))?;
        if !category.permits(kind) {
            return Err(invalid("account head does not match the type"));
        }
        let payment_method = self
            .payment_method
            .as_ref()
            .ok_or_else(|| invalid("payment method is required"))?;
        if self.amount.is_negative() || self.amount.is_zero() {
            return Err(invalid("amount must be greater than zero"));
        }

        Ok(TransactionInput {
            kind,
            category_id: category.id.clone(),
            amount: self.amount,
            payment_method_id: payment_method.clone(),
            remarks: self.remarks.trim().to_string(),
            date: self.date,
            idempotency_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn rent() -> Category {
        Category {
            id: "rent".to_string(),
            name: "Rent".to_string(),
            affinity: Affinity::Debit,
        }
    }

    fn filled() -> TransactionDraft {
        let mut draft = TransactionDraft::new(today());
        draft.set_kind(Some(TransactionType::Debit));
        draft.set_category(Some(rent())).unwrap();
        draft.set_amount(MoneyCents::from_major(500)).unwrap();
        draft.payment_method = Some("cash".to_string());
        draft
    }

    #[test]
    fn complete_draft_validates() {
        let input = filled().validate().unwrap();
        assert_eq!(input.kind, TransactionType::Debit);
        assert_eq!(input.category_id, "rent");
        assert_eq!(input.date, today());
    }

    #[test]
    fn missing_fields_are_reported() {
        let draft = TransactionDraft::new(today());
        assert!(matches!(draft.validate(), Err(WriteError::Validation(_))));

        let mut zero = filled();
        zero.amount = MoneyCents::ZERO;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn switching_type_drops_category() {
        let mut draft = filled();
        draft.set_kind(Some(TransactionType::Credit));
        assert!(draft.category.is_none());
        assert!(draft.set_category(Some(rent())).is_err());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut draft = filled();
        assert!(draft.set_amount(MoneyCents::new(-1)).is_err());
        assert_eq!(draft.amount, MoneyCents::from_major(500));
    }

    #[test]
    fn typed_amount_is_parsed() {
        let mut draft = filled();
        draft.set_amount_text("12,5").unwrap();
        assert_eq!(draft.amount, MoneyCents::new(1250));

        assert!(draft.set_amount_text("12.345").is_err());
        assert!(draft.set_amount_text("-3").is_err());
        assert!(draft.set_amount_text("ten").is_err());
        assert_eq!(draft.amount, MoneyCents::new(1250));
    }

    #[test]
    fn cash_is_preselected() {
        let methods = vec![
            PaymentMethod {
                id: "p1".to_string(),
                name: "Bank".to_string(),
            },
            PaymentMethod {
                id: "p2".to_string(),
                name: "CASH".to_string(),
            },
        ];
        let mut draft = TransactionDraft::new(today());
        draft.preselect_payment_method(&methods, "cash");
        assert_eq!(draft.payment_method.as_deref(), Some("p2"));

        draft.payment_method = Some("p1".to_string());
        draft.preselect_payment_method(&methods, "cash");
        assert_eq!(draft.payment_method.as_deref(), Some("p1"));
    }
}
