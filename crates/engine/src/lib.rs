//! Travel expense engine.
//!
//! Journeys and expenses are owned by accounts; administrators review expenses
//! one by one or in bulk against the distance-based allowance. Every write runs
//! in a database transaction, and journey aggregates are recomputed from the
//! stored expenses after each expense mutation.

pub use accounts::{Account, AccountStatus, Principal, Role};
pub use allowance::{
    AllowanceRate, DEFAULT_RATE_PER_KM_MINOR, DEFAULT_VARIANCE_PERCENT, VarianceDecision,
    VarianceTolerance, ZERO_EXPECTED_VARIANCE,
};
pub use commands::{ExpenseFilter, ExpenseNew, ExpenseUpdate, JourneyNew, JourneyUpdate, RegisterCmd};
pub use credentials::MIN_PASSWORD_LENGTH;
pub use error::EngineError;
pub use expenses::{Expense, ExpenseCategory, ExpenseStatus};
pub use invites::{INVITE_TTL_HOURS, Invite, IssuedInvite};
pub use journeys::{Journey, JourneyStatus};
pub use money::Money;
pub use ops::{
    AdminOverview, ApprovalTarget, BulkApprovalItem, BulkApprovalReport, Engine, EngineBuilder,
    PendingApproval, UserSummary,
};
pub use receipts::{
    ALLOWED_RECEIPT_TYPES, DiskReceiptStore, MAX_RECEIPT_BYTES, ReceiptStore, ReceiptUpload,
};

mod accounts;
mod allowance;
mod bulk_approvals;
mod commands;
mod credentials;
mod error;
mod expenses;
mod invites;
mod journeys;
mod money;
mod ops;
mod receipts;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
