use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Identifier wrapper for staff accounts (admins and trainers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub String);

/// Identifier wrapper for booked transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

/// Trackable unit of progress a transaction can satisfy, e.g. `group_class`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequirementId(pub String);

impl RequirementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// All monetary amounts are integer euro cents. Signed: credits positive,
/// debits negative.
pub type Cents = i64;

/// Render cents as a euro amount for logs and demo output.
pub fn format_eur(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02} €", abs / 100, abs % 100)
}

/// Map from level id to the instant the customer entered that level. Entering
/// level n+1 closes the progress window for level n.
pub type LevelUpHistory = BTreeMap<u8, DateTime<Utc>>;

/// A dog registered to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
}

/// Customer account as served by the external backend.
///
/// `balance_cents` is the sum of all committed transaction amounts; a debit
/// that would drive it negative is rejected before it reaches the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub balance_cents: Cents,
    pub level_id: u8,
    pub is_vip: bool,
    pub is_expert: bool,
    pub level_up_history: LevelUpHistory,
    pub dogs: Vec<DogProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_by: StaffId,
    pub created_at: DateTime<Utc>,
    /// Bumped by the backend on every update; used for optimistic concurrency.
    pub version: u64,
}

impl Customer {
    pub fn dog_name(&self) -> Option<&str> {
        self.dogs.first().map(|dog| dog.name.as_str())
    }
}

/// Balance-changing event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Topup,
    Bonus,
    Debit,
    Event,
}

impl TransactionKind {
    pub const fn label(self) -> &'static str {
        match self {
            TransactionKind::Topup => "Aufladung",
            TransactionKind::Bonus => "Bonus",
            TransactionKind::Debit => "Abbuchung",
            TransactionKind::Event => "Veranstaltung",
        }
    }
}

/// A committed, append-only balance entry.
///
/// Top-ups booked through this crate carry the combined amount (base + bonus)
/// with the granted bonus recorded separately in `bonus_cents`, so reports can
/// recover real revenue exactly. Rows imported from the legacy system have
/// `bonus_cents == 0` and are reversed heuristically instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub customer_id: CustomerId,
    pub booked_by: StaffId,
    pub kind: TransactionKind,
    pub title: String,
    pub amount_cents: Cents,
    pub bonus_cents: Cents,
    pub booked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<RequirementId>,
}

/// A transaction ready to be appended; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub customer_id: CustomerId,
    pub booked_by: StaffId,
    pub kind: TransactionKind,
    pub title: String,
    pub amount_cents: Cents,
    pub bonus_cents: Cents,
    pub booked_at: DateTime<Utc>,
    pub requirement: Option<RequirementId>,
}

/// Intake data for a staff-created customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub dogs: Vec<DogProfile>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}
