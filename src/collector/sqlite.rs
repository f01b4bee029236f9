//! Local SQLite collector, one row per saved record.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use tracing::info;

use crate::collector::{Collector, StorageError};
use crate::wizard::record::MoneyFlowRecord;

const COLLECTOR_NAME: &str = "sqlite";

pub struct SqliteCollector {
    conn: Mutex<Connection>,
}

impl SqliteCollector {
    /// In-memory database, used in tests.
    #[cfg(test)]
    pub fn new_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
        let collector = Self { conn: Mutex::new(conn) };
        collector.init_schema();
        collector
    }

    /// Open (or create) the database at the given path.
    pub fn with_path(path: &Path) -> Self {
        let conn = Connection::open(path).expect("Failed to open database");
        let collector = Self { conn: Mutex::new(conn) };
        collector.init_schema();
        info!("Opened records database at {:?}", path);
        collector
    }

    fn init_schema(&self) {
        let conn = self.conn.lock().expect("records db lock poisoned");

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                budget_type TEXT NOT NULL,
                category TEXT NOT NULL,
                value REAL NOT NULL,
                currency TEXT NOT NULL,
                comment TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_date ON records(date);
            CREATE INDEX IF NOT EXISTS idx_records_budget_type ON records(budget_type);
        "#,
        )
        .expect("Failed to initialize records schema");
    }

    #[cfg(test)]
    fn record_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .unwrap_or(0);
        count as usize
    }

    #[cfg(test)]
    fn last_row(&self) -> (String, String, String, f64, String, Option<String>) {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT date, budget_type, category, value, currency, comment
             FROM records ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .unwrap()
    }
}

#[async_trait]
impl Collector for SqliteCollector {
    fn name(&self) -> &str {
        COLLECTOR_NAME
    }

    async fn save(&self, record: &MoneyFlowRecord) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::new(COLLECTOR_NAME, "records db lock poisoned"))?;

        conn.execute(
            "INSERT INTO records (date, budget_type, category, value, currency, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.date.format("%d.%m.%Y").to_string(),
                record.budget.budget_type().label(),
                record.budget.category_label(),
                record.value,
                record.currency.label(),
                record.comment,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| StorageError::new(COLLECTOR_NAME, format!("Failed to insert record: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::record::{Budget, BudgetType, Currency};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn record(value: f64) -> MoneyFlowRecord {
        MoneyFlowRecord {
            budget: Budget::new(BudgetType::Income, "Salary").unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
            value,
            currency: Currency::Rub,
            comment: Some("june".to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let collector = SqliteCollector::new_in_memory();
        collector.save(&record(1500.0)).await.unwrap();

        assert_eq!(collector.record_count(), 1);
        let (date, budget_type, category, value, currency, comment) = collector.last_row();
        assert_eq!(date, "15.06.2026");
        assert_eq!(budget_type, "Income");
        assert_eq!(category, "Salary");
        assert_eq!(value, 1500.0);
        assert_eq!(currency, "RUB");
        assert_eq!(comment.as_deref(), Some("june"));
    }

    #[tokio::test]
    async fn test_overlapping_saves_all_land() {
        let collector = Arc::new(SqliteCollector::new_in_memory());

        let mut handles = Vec::new();
        for i in 0..10 {
            let collector = collector.clone();
            handles.push(tokio::spawn(async move {
                collector.save(&record(i as f64)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(collector.record_count(), 10);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");

        {
            let collector = SqliteCollector::with_path(&path);
            collector.save(&record(9.9)).await.unwrap();
        }

        let reopened = SqliteCollector::with_path(&path);
        assert_eq!(reopened.record_count(), 1);
    }
}
