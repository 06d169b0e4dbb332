#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{DiskReceiptStore, Engine, Principal, Role};
use migration::MigratorTrait;
use uuid::Uuid;

pub struct TestEnv {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub receipts_root: PathBuf,
}

impl TestEnv {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        let receipts_root = std::env::temp_dir().join(format!("travel-receipts-{}", Uuid::new_v4()));
        let store = DiskReceiptStore::new(&receipts_root, "/receipts");
        let engine = Engine::builder()
            .database(db.clone())
            .receipt_store(Arc::new(store))
            .build()
            .await
            .unwrap();

        Self {
            engine,
            db,
            receipts_root,
        }
    }

    pub async fn account(&self, email: &str, role: Role) -> Principal {
        self.engine
            .create_account(email, "password", Some("Test Account"), role)
            .await
            .unwrap()
            .principal()
    }

    pub async fn user(&self, email: &str) -> Principal {
        self.account(email, Role::User).await
    }

    pub async fn admin(&self) -> Principal {
        self.account("admin@example.com", Role::Admin).await
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> i64 {
        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(Statement::from_string(
                backend,
                format!("SELECT COUNT(*) AS n FROM {table}"),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i64>("", "n").unwrap()
    }

    /// Files currently held by the receipt store.
    pub fn stored_receipts(&self) -> usize {
        std::fs::read_dir(&self.receipts_root)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.receipts_root);
    }
}
