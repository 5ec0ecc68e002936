//! Report criteria and the rules that keep them consistent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Category, FilterError, OpeningWindow, TransactionType, clock::default_window};

/// One report window: date range plus the optional narrowing criteria.
///
/// Date bounds are inclusive; an absent bound is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub category: Option<Category>,
    pub payment_method: Option<String>,
    /// Substring matched against remarks.
    pub search: Option<String>,
}

impl FilterCriteria {
    /// Everything unset except the default one-month window ending `today`.
    pub fn default_window(today: NaiveDate) -> Self {
        let (start, end) = default_window(today);
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn opening_window(&self) -> OpeningWindow {
        OpeningWindow {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }
}

/// A single criterion edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterField {
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
    Type(Option<TransactionType>),
    Category(Option<Category>),
    PaymentMethod(Option<String>),
    Search(Option<String>),
}

/// Outcome of an accepted edit, consumed synchronously by the category cascade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterChange {
    Unchanged,
    Updated,
    TypeChanged {
        kind: Option<TransactionType>,
        category_cleared: bool,
    },
}

/// Categories that may be selected for `kind`. No type means no categories.
pub fn valid_categories_for(kind: Option<TransactionType>, all: &[Category]) -> Vec<Category> {
    match kind {
        None => Vec::new(),
        Some(kind) => all.iter().filter(|c| c.permits(kind)).cloned().collect(),
    }
}

/// Active criteria. Every mutation either succeeds completely or leaves the
/// criteria untouched, so a category never outlives a type it does not fit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    criteria: FilterCriteria,
}

impl FilterState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            criteria: FilterCriteria::default_window(today),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_field(&mut self, field: FilterField) -> Result<FilterChange, FilterError> {
        let criteria = &mut self.criteria;
        match field {
            FilterField::StartDate(start) => {
                check_range(start, criteria.end_date)?;
                Ok(replace(&mut criteria.start_date, start))
            }
            FilterField::EndDate(end) => {
                check_range(criteria.start_date, end)?;
                Ok(replace(&mut criteria.end_date, end))
            }
            FilterField::Type(kind) => {
                if criteria.kind == kind {
                    return Ok(FilterChange::Unchanged);
                }
                criteria.kind = kind;
                let category_cleared = match (&criteria.category, kind) {
                    (Some(category), Some(kind)) => !category.permits(kind),
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if category_cleared {
                    criteria.category = None;
                }
                Ok(FilterChange::TypeChanged {
                    kind,
                    category_cleared,
                })
            }
            FilterField::Category(None) => Ok(replace(&mut criteria.category, None)),
            FilterField::Category(Some(category)) => {
                let kind = criteria.kind.ok_or(FilterError::CategoryWithoutType)?;
                if !category.permits(kind) {
                    return Err(FilterError::CategoryTypeMismatch {
                        category: category.name,
                        kind,
                    });
                }
                Ok(replace(&mut criteria.category, Some(category)))
            }
            FilterField::PaymentMethod(method) => {
                let method = method.filter(|m| !m.trim().is_empty());
                Ok(replace(&mut criteria.payment_method, method))
            }
            FilterField::Search(search) => {
                let search = search
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                Ok(replace(&mut criteria.search, search))
            }
        }
    }

    /// Back to the default window with every other criterion cleared.
    pub fn reset(&mut self, today: NaiveDate) -> FilterChange {
        let previous_kind = self.criteria.kind;
        let had_category = self.criteria.category.is_some();
        self.criteria = FilterCriteria::default_window(today);
        if previous_kind.is_some() {
            FilterChange::TypeChanged {
                kind: None,
                category_cleared: had_category,
            }
        } else {
            FilterChange::Updated
        }
    }

    /// Drops the selected category when it is not in the freshly resolved
    /// set. Returns `true` when something was cleared.
    pub fn reconcile(&mut self, valid: &[Category]) -> bool {
        let keep = match &self.criteria.category {
            None => return false,
            Some(selected) => valid.iter().any(|c| c.id == selected.id),
        };
        if !keep {
            tracing::debug!("clearing category no longer offered for the selected type");
            self.criteria.category = None;
        }
        !keep
    }
}

fn check_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), FilterError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(FilterError::InvalidRange { start, end }),
        _ => Ok(()),
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> FilterChange {
    if *slot == value {
        return FilterChange::Unchanged;
    }
    *slot = value;
    FilterChange::Updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Affinity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn category(id: &str, affinity: Affinity) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            affinity,
        }
    }

    #[test]
    fn new_state_uses_default_window() {
        let state = FilterState::new(date(2024, 2, 15));
        assert_eq!(state.criteria().start_date, Some(date(2024, 1, 15)));
        assert_eq!(state.criteria().end_date, Some(date(2024, 2, 15)));
        assert!(state.criteria().kind.is_none());
    }

    #[test]
    fn category_requires_type() {
        let mut state = FilterState::new(date(2024, 2, 15));
        let err = state
            .set_field(FilterField::Category(Some(category("rent", Affinity::Debit))))
            .unwrap_err();
        assert_eq!(err, FilterError::CategoryWithoutType);
        assert!(state.criteria().category.is_none());
    }

    #[test]
    fn category_must_match_type() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Type(Some(TransactionType::Credit)))
            .unwrap();
        let err = state
            .set_field(FilterField::Category(Some(category("rent", Affinity::Debit))))
            .unwrap_err();
        assert!(matches!(err, FilterError::CategoryTypeMismatch { .. }));
    }

    #[test]
    fn type_change_clears_mismatching_category() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Type(Some(TransactionType::Debit)))
            .unwrap();
        state
            .set_field(FilterField::Category(Some(category("rent", Affinity::Debit))))
            .unwrap();

        let change = state
            .set_field(FilterField::Type(Some(TransactionType::Credit)))
            .unwrap();
        assert_eq!(
            change,
            FilterChange::TypeChanged {
                kind: Some(TransactionType::Credit),
                category_cleared: true,
            }
        );
        assert!(state.criteria().category.is_none());
    }

    #[test]
    fn type_change_keeps_category_valid_for_both() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Type(Some(TransactionType::Debit)))
            .unwrap();
        state
            .set_field(FilterField::Category(Some(category("misc", Affinity::Both))))
            .unwrap();

        state
            .set_field(FilterField::Type(Some(TransactionType::Credit)))
            .unwrap();
        assert_eq!(state.criteria().category_id(), Some("misc"));

        state.set_field(FilterField::Type(None)).unwrap();
        assert!(state.criteria().category.is_none());
    }

    #[test]
    fn inverted_range_is_rejected_without_change() {
        let mut state = FilterState::new(date(2024, 2, 15));
        let before = state.clone();
        let err = state
            .set_field(FilterField::StartDate(Some(date(2024, 3, 1))))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidRange { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn blank_search_is_unset() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Search(Some("  rent ".to_string())))
            .unwrap();
        assert_eq!(state.criteria().search.as_deref(), Some("rent"));
        state
            .set_field(FilterField::Search(Some("   ".to_string())))
            .unwrap();
        assert!(state.criteria().search.is_none());
    }

    #[test]
    fn reset_reports_type_change() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Type(Some(TransactionType::Debit)))
            .unwrap();
        state
            .set_field(FilterField::StartDate(Some(date(2023, 1, 1))))
            .unwrap();

        let change = state.reset(date(2024, 2, 20));
        assert!(matches!(change, FilterChange::TypeChanged { kind: None, .. }));
        assert_eq!(state.criteria(), &FilterCriteria::default_window(date(2024, 2, 20)));
    }

    #[test]
    fn reconcile_drops_unknown_category() {
        let mut state = FilterState::new(date(2024, 2, 15));
        state
            .set_field(FilterField::Type(Some(TransactionType::Debit)))
            .unwrap();
        state
            .set_field(FilterField::Category(Some(category("rent", Affinity::Debit))))
            .unwrap();

        assert!(!state.reconcile(&[category("rent", Affinity::Debit)]));
        assert!(state.reconcile(&[category("food", Affinity::Debit)]));
        assert!(state.criteria().category.is_none());
    }

    #[test]
    fn valid_categories_follow_affinity() {
        let all = vec![
            category("rent", Affinity::Debit),
            category("sales", Affinity::Credit),
            category("misc", Affinity::Both),
        ];
        let ids = |kind| {
            valid_categories_for(kind, &all)
                .into_iter()
                .map(|c| c.id)
                .collect::<Vec<_>>()
        };
        assert!(ids(None).is_empty());
        assert_eq!(ids(Some(TransactionType::Debit)), vec!["rent", "misc"]);
        assert_eq!(ids(Some(TransactionType::Credit)), vec!["sales", "misc"]);
    }
}
