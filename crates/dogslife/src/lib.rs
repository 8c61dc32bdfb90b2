//! Loyalty core for the DogsLife dog training school.
//!
//! The interesting part lives in [`loyalty`]: an injected rulebook, a pure
//! progression engine over the customer's transaction history, booking
//! construction with tiered top-up bonuses, and revenue reporting. Persistence
//! and authentication are owned by external collaborators; this crate only
//! defines the repository traits it consumes.

pub mod config;
pub mod error;
pub mod loyalty;
pub mod telemetry;
