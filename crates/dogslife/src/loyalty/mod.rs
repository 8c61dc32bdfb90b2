//! Balance, level progression, and reporting core.
//!
//! Layering, leaves first: [`rules`] holds the static tables, [`progress`]
//! the pure engine, [`booking`] builds transactions, and [`reporting`]
//! aggregates them, with [`service`] composing everything over the
//! [`repository`] traits and [`router`] exposing it over HTTP.

pub mod booking;
pub mod domain;
pub mod progress;
pub mod reporting;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;
pub mod views;

pub use booking::{quote_topup, BookingError, TopupQuote};
pub use progress::{ProgressMap, ProgressionEngine, ProgressionError};
pub use reporting::{real_amount_cents, ReportFilter, ReportPeriod, RevenueReport};
pub use repository::{CustomerDirectory, RepositoryError, TransactionLog};
pub use router::loyalty_router;
pub use rules::Rulebook;
pub use service::{LoyaltyService, ServiceError};
pub use views::{AccountView, LevelOutcomeView};

#[cfg(test)]
mod tests;
