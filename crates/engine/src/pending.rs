//! Two-phase destructive actions: request, then confirm or cancel.

use crate::TransactionType;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: String,
    pub kind: TransactionType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PendingAction {
    #[default]
    None,
    PendingDelete(DeleteTarget),
}

impl PendingAction {
    pub fn target(&self) -> Option<&DeleteTarget> {
        match self {
            Self::None => None,
            Self::PendingDelete(target) => Some(target),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Leaves `None` behind.
    pub fn take(&mut self) -> Option<DeleteTarget> {
        match std::mem::take(self) {
            Self::None => None,
            Self::PendingDelete(target) => Some(target),
        }
    }
}
