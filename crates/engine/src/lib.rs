//! Reporting and bookkeeping core of ledgerbook.
//!
//! The engine owns no storage. It talks to the ledger through the traits in
//! [`ports`] and keeps the view state consistent under overlapping requests:
//! every async result is tagged when issued and only the latest one is ever
//! applied.

pub use cascade::{CascadeStatus, CategoryCascade};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dashboard::{CategoryAmount, DashboardView, MonthlyAnalytics, YearMonth};
pub use error::{CascadeError, ExportError, FilterError, QueryError, WriteError};
pub use model::{
    Affinity, Category, EntityRef, PaymentMethod, Transaction, TransactionInput, TransactionType,
};
pub use money::MoneyCents;
pub use opening::{OpeningBalanceResolver, OpeningWindow};
pub use ports::{LedgerCommands, LedgerPage, LedgerQueryService, ReportExporter, TodayPage};
pub use tag::{Applied, Phase};

pub mod aggregator;
pub mod bookkeeper;
pub mod cascade;
pub mod clock;
pub mod dashboard;
mod error;
pub mod export;
pub mod filter;
pub mod form;
pub mod memory;
mod model;
mod money;
pub mod opening;
pub mod pending;
pub mod ports;
pub mod report;
pub mod settings;
pub mod tag;
pub mod today;
pub mod view;
