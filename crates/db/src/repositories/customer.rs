use chrono::Utc;
use sqlx::Row;

use rolodex_core::domain::customer::{Customer, CustomerId, NewCustomer};

use super::RepositoryError;
use crate::DbPool;

/// Counts reported by one import pass over the sample feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: u64,
    pub skipped: u64,
}

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All customers in list-view order. `raw` is deliberately absent from
    /// the projection; ordering uses the store's default text comparison.
    pub async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, name, email, phone FROM customer ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Customer {
                    id: CustomerId(row.try_get("id")?),
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    phone: row.try_get("phone")?,
                })
            })
            .collect()
    }

    /// Insert a feed record unless its email is already present.
    ///
    /// The unique index on `email` is the de-duplication contract, so a
    /// concurrent import losing the insert race lands on the conflict arm
    /// and is counted as skipped.
    pub async fn insert_if_absent(&self, record: &NewCustomer) -> Result<bool, RepositoryError> {
        let raw = serde_json::to_string(&record.raw)
            .map_err(|error| RepositoryError::Decode(format!("raw payload: {error}")))?;

        let result = sqlx::query(
            "INSERT INTO customer (id, name, email, phone, raw, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(email) DO NOTHING",
        )
        .bind(CustomerId::generate().0)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn import_batch(
        &self,
        records: &[NewCustomer],
    ) -> Result<ImportOutcome, RepositoryError> {
        let mut outcome = ImportOutcome::default();
        for record in records {
            if self.insert_if_absent(record).await? {
                outcome.imported += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        Ok(outcome)
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
