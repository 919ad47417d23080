pub mod config;
pub mod contacts;
pub mod database;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod integrations;
pub mod jobs;

#[cfg(test)]
pub(crate) mod test_support;

pub use database::Database;
pub use error::{ContactError, ContactResult};
