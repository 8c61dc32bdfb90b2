use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    format_eur, Cents, Customer, NewTransaction, RequirementId, StaffId, TransactionKind,
};
use super::rules::Rulebook;

/// Quoted breakdown of a top-up before it is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopupQuote {
    pub base_cents: Cents,
    pub bonus_cents: Cents,
    pub total_cents: Cents,
}

/// Rejections raised while constructing a transaction. All of these fire
/// before any repository call is made.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("top-up amount must be positive, got {0}")]
    NonPositiveTopup(Cents),
    #[error("debit amount must be negative, got {0}")]
    NonNegativeDebit(Cents),
    #[error("debit of {attempted_cents} exceeds balance of {balance_cents}")]
    InsufficientBalance {
        balance_cents: Cents,
        attempted_cents: Cents,
    },
    #[error("no preset priced for requirement '{0}'")]
    UnknownPreset(String),
    #[error("custom debit needs a description")]
    MissingDescription,
}

/// Apply the bonus ladder to a base amount. Preset and custom top-ups run
/// through the same table; amounts below the lowest tier earn nothing.
pub fn quote_topup(rulebook: &Rulebook, base_cents: Cents) -> Result<TopupQuote, BookingError> {
    if base_cents <= 0 {
        return Err(BookingError::NonPositiveTopup(base_cents));
    }

    let bonus_cents = rulebook
        .bonus_tiers
        .iter()
        .find(|tier| base_cents >= tier.min_base_cents)
        .map(|tier| tier.bonus_cents)
        .unwrap_or(0);

    Ok(TopupQuote {
        base_cents,
        bonus_cents,
        total_cents: base_cents + bonus_cents,
    })
}

/// Build a combined top-up transaction (base + bonus in one row, split kept in
/// `bonus_cents`).
pub fn build_topup(
    rulebook: &Rulebook,
    customer: &Customer,
    booked_by: StaffId,
    base_cents: Cents,
    now: DateTime<Utc>,
) -> Result<NewTransaction, BookingError> {
    let quote = quote_topup(rulebook, base_cents)?;
    let title = format!("Aufladung {}", format_eur(base_cents));
    Ok(NewTransaction {
        customer_id: customer.id.clone(),
        booked_by,
        kind: TransactionKind::Topup,
        title,
        amount_cents: quote.total_cents,
        bonus_cents: quote.bonus_cents,
        booked_at: now,
        requirement: None,
    })
}

/// Build a debit from the preset catalog, tagged with its requirement so the
/// booking counts toward level progress.
pub fn build_preset_debit(
    rulebook: &Rulebook,
    customer: &Customer,
    booked_by: StaffId,
    requirement: &RequirementId,
    now: DateTime<Utc>,
) -> Result<NewTransaction, BookingError> {
    let preset = rulebook
        .debit_preset(requirement)
        .ok_or_else(|| BookingError::UnknownPreset(requirement.as_str().to_string()))?;

    build_debit(
        customer,
        booked_by,
        preset.title.to_string(),
        preset.amount_cents,
        Some(preset.requirement.clone()),
        now,
    )
}

/// Build a free-form debit. Custom debits carry no requirement tag and never
/// satisfy a level requirement.
pub fn build_custom_debit(
    customer: &Customer,
    booked_by: StaffId,
    title: String,
    amount_cents: Cents,
    now: DateTime<Utc>,
) -> Result<NewTransaction, BookingError> {
    if title.trim().is_empty() {
        return Err(BookingError::MissingDescription);
    }
    build_debit(customer, booked_by, title, amount_cents, None, now)
}

fn build_debit(
    customer: &Customer,
    booked_by: StaffId,
    title: String,
    amount_cents: Cents,
    requirement: Option<RequirementId>,
    now: DateTime<Utc>,
) -> Result<NewTransaction, BookingError> {
    if amount_cents >= 0 {
        return Err(BookingError::NonNegativeDebit(amount_cents));
    }
    if customer.balance_cents + amount_cents < 0 {
        return Err(BookingError::InsufficientBalance {
            balance_cents: customer.balance_cents,
            attempted_cents: amount_cents,
        });
    }

    Ok(NewTransaction {
        customer_id: customer.id.clone(),
        booked_by,
        kind: TransactionKind::Debit,
        title,
        amount_cents,
        bonus_cents: 0,
        booked_at: now,
        requirement,
    })
}

/// Record a zero-cost attendance (e.g. a granted workshop) that still counts
/// toward a requirement.
pub fn build_event(
    customer: &Customer,
    booked_by: StaffId,
    title: String,
    requirement: Option<RequirementId>,
    now: DateTime<Utc>,
) -> NewTransaction {
    NewTransaction {
        customer_id: customer.id.clone(),
        booked_by,
        kind: TransactionKind::Event,
        title,
        amount_cents: 0,
        bonus_cents: 0,
        booked_at: now,
        requirement,
    }
}
