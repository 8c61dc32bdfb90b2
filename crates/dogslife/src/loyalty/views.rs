use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Cents, Customer, RequirementId, Transaction, TransactionKind};
use super::progress::{ProgressMap, ProgressionEngine};
use super::rules::Requirement;

/// Progress toward one requirement, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementProgressView {
    pub requirement_id: RequirementId,
    pub name: &'static str,
    pub achieved: u32,
    pub required: u32,
    pub met: bool,
}

fn requirement_views(requirements: &[Requirement], progress: &ProgressMap) -> Vec<RequirementProgressView> {
    requirements
        .iter()
        .map(|req| {
            let achieved = progress.get(&req.id).copied().unwrap_or(0);
            RequirementProgressView {
                requirement_id: req.id.clone(),
                name: req.name,
                achieved,
                required: req.required,
                met: achieved >= req.required,
            }
        })
        .collect()
}

/// The level card shown on the customer detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelOutcomeView {
    pub level_id: u8,
    pub level_label: &'static str,
    pub display_label: &'static str,
    pub can_advance: bool,
    pub requirements: Vec<RequirementProgressView>,
    pub license_prereqs: Vec<RequirementProgressView>,
}

impl LevelOutcomeView {
    pub fn build(
        engine: &ProgressionEngine,
        customer: &Customer,
        transactions: &[Transaction],
    ) -> Self {
        let rulebook = engine.rulebook();
        let level_progress = engine.level_progress(customer, customer.level_id, transactions);
        let prereq_progress = engine.prereq_progress(&customer.id, transactions, None);

        Self {
            level_id: customer.level_id,
            level_label: rulebook.level_name(customer.level_id).unwrap_or("?"),
            display_label: engine.display_level(customer),
            can_advance: engine.can_advance(customer, transactions),
            requirements: requirement_views(
                rulebook.requirements_for(customer.level_id),
                &level_progress,
            ),
            license_prereqs: requirement_views(&rulebook.license_prereqs, &prereq_progress),
        }
    }
}

/// Transaction row for the balance history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: String,
    pub kind: TransactionKind,
    pub kind_label: &'static str,
    pub title: String,
    pub amount_cents: Cents,
    #[serde(skip_serializing_if = "is_zero")]
    pub bonus_cents: Cents,
    pub booked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<RequirementId>,
}

fn is_zero(cents: &Cents) -> bool {
    *cents == 0
}

impl TransactionView {
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id.0.clone(),
            kind: tx.kind,
            kind_label: tx.kind.label(),
            title: tx.title.clone(),
            amount_cents: tx.amount_cents,
            bonus_cents: tx.bonus_cents,
            booked_at: tx.booked_at,
            requirement_id: tx.requirement.clone(),
        }
    }
}

/// The full account snapshot returned after every read or mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub customer: Customer,
    pub level: LevelOutcomeView,
    pub transactions: Vec<TransactionView>,
}
