use sqlx::Executor;

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Contract for one seeded demo customer.
struct SeedCustomerContract {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    has_phone: bool,
    phone_label: &'static str,
}

/// Canonical demo customers. Kept in lockstep with
/// `config/fixtures/sample_customers.sql` and pinned by the seed contract
/// test.
const SEED_CUSTOMERS: &[SeedCustomerContract] = &[
    SeedCustomerContract {
        id: "seed-cust-001",
        name: "Amos Burton",
        email: "amos.burton@example.test",
        has_phone: true,
        phone_label: "seed-cust-001-phone",
    },
    SeedCustomerContract {
        id: "seed-cust-002",
        name: "Bobbie Draper",
        email: "bobbie.draper@example.test",
        has_phone: true,
        phone_label: "seed-cust-002-phone",
    },
    SeedCustomerContract {
        id: "seed-cust-003",
        name: "Chrisjen Avasarala",
        email: "chrisjen.avasarala@example.test",
        has_phone: false,
        phone_label: "seed-cust-003-phone",
    },
    SeedCustomerContract {
        id: "seed-cust-004",
        name: "James Holden",
        email: "james.holden@example.test",
        has_phone: true,
        phone_label: "seed-cust-004-phone",
    },
    SeedCustomerContract {
        id: "seed-cust-005",
        name: "Naomi Nagata",
        email: "naomi.nagata@example.test",
        has_phone: true,
        phone_label: "seed-cust-005-phone",
    },
];

#[derive(Clone, Copy, Debug)]
pub struct SeedCustomerInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub email: &'static str,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub customers_seeded: Vec<SeedCustomerInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Deterministic demo dataset used by `rolodex seed` and end-to-end tests.
pub struct SampleDataset;

impl SampleDataset {
    /// SQL fixture content. Inserts use `OR IGNORE`, so repeated loads are
    /// no-ops.
    pub const SQL: &str = include_str!("../../../config/fixtures/sample_customers.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let customers_seeded = SEED_CUSTOMERS
            .iter()
            .map(|customer| SeedCustomerInfo {
                id: customer.id,
                name: customer.name,
                email: customer.email,
            })
            .collect();

        Ok(SeedResult { customers_seeded })
    }

    /// Verify that the seeded rows exist and match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for customer in SEED_CUSTOMERS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customer WHERE id = ?1 AND name = ?2 AND email = ?3)",
            )
            .bind(customer.id)
            .bind(customer.name)
            .bind(customer.email)
            .fetch_one(pool)
            .await?;
            checks.push((customer.id, present == 1));

            let phone_matches: i64 = if customer.has_phone {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM customer WHERE id = ?1 AND phone IS NOT NULL)",
                )
                .bind(customer.id)
                .fetch_one(pool)
                .await?
            } else {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM customer WHERE id = ?1 AND phone IS NULL)",
                )
                .bind(customer.id)
                .fetch_one(pool)
                .await?
            };
            checks.push((customer.phone_label, phone_matches == 1));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::SampleDataset;
    use crate::repositories::SqlCustomerRepository;
    use crate::{connect_with_settings, migrations};

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn load_then_verify_passes_all_checks() {
        let pool = pool().await;

        let seeded = SampleDataset::load(&pool).await.expect("load");
        assert_eq!(seeded.customers_seeded.len(), 5);

        let verification = SampleDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let pool = pool().await;

        SampleDataset::load(&pool).await.expect("first load");
        SampleDataset::load(&pool).await.expect("second load");

        let repository = SqlCustomerRepository::new(pool);
        assert_eq!(repository.count().await.expect("count"), 5);
    }

    #[tokio::test]
    async fn verify_fails_on_an_unseeded_database() {
        let pool = pool().await;

        let verification = SampleDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
    }
}
