use super::domain::{Customer, CustomerId, NewCustomer, NewTransaction, StaffId, Transaction};

/// Error enumeration for backend failures surfaced through the repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, backend has {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Customer store abstraction standing in for the external REST backend, so
/// the service can be exercised in isolation.
///
/// `update` is a compare-and-swap on the customer's version: two staff members
/// booking against the same customer race at the backend instead of silently
/// overwriting each other.
pub trait CustomerDirectory: Send + Sync {
    fn create(&self, intake: NewCustomer, created_by: StaffId)
        -> Result<Customer, RepositoryError>;
    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    fn list(&self) -> Result<Vec<Customer>, RepositoryError>;
    fn update(&self, customer: Customer, expected_version: u64)
        -> Result<Customer, RepositoryError>;
}

/// Append-only transaction store. The engine never mutates or deletes rows;
/// administrative deletion, if any, happens behind the backend.
pub trait TransactionLog: Send + Sync {
    fn append(&self, transaction: NewTransaction) -> Result<Transaction, RepositoryError>;
    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError>;
    fn all(&self) -> Result<Vec<Transaction>, RepositoryError>;
}
