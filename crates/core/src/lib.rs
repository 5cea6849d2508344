pub mod config;
pub mod domain;

pub use domain::customer::{Customer, CustomerId, NewCustomer, PHONE_PLACEHOLDER};
