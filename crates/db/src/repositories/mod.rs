use thiserror::Error;

pub mod customer;

pub use customer::{ImportOutcome, SqlCustomerRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}
