use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{AllowanceRate, EngineError, ReceiptStore, ResultEngine};

mod access;
mod accounts;
mod approvals;
mod expenses;
mod invites;
mod journeys;
mod ledger;
mod statistics;

pub use approvals::{ApprovalTarget, BulkApprovalItem, BulkApprovalReport, PendingApproval};
pub use statistics::{AdminOverview, UserSummary};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    allowance: AllowanceRate,
    receipts: Arc<dyn ReceiptStore>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The allowance rate fixed at build time.
    pub fn allowance_rate(&self) -> AllowanceRate {
        self.allowance
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    allowance: AllowanceRate,
    receipts: Option<Arc<dyn ReceiptStore>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default allowance of 2.00 per km.
    pub fn allowance_rate(mut self, rate: AllowanceRate) -> EngineBuilder {
        self.allowance = rate;
        self
    }

    /// Pass the required receipt storage
    pub fn receipt_store(mut self, store: Arc<dyn ReceiptStore>) -> EngineBuilder {
        self.receipts = Some(store);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let receipts = self
            .receipts
            .ok_or_else(|| EngineError::Internal("receipt store is required".to_string()))?;
        tracing::debug!(
            "engine built with allowance {} per km",
            self.allowance.per_km()
        );
        Ok(Engine {
            database: self.database,
            allowance: self.allowance,
            receipts,
        })
    }
}
