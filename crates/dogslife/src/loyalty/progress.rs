use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{Customer, CustomerId, RequirementId, Transaction};
use super::rules::{Rulebook, EXAM, MAX_LEVEL};

/// Per-requirement tally of qualifying transactions.
pub type ProgressMap = BTreeMap<RequirementId, u32>;

/// Errors raised by explicit level/status transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("requirements for level {level_id} are not met yet")]
    RequirementsNotMet { level_id: u8 },
    #[error("customer is already at the highest level")]
    AtMaxLevel,
    #[error("expert status requires level {MAX_LEVEL} with a passed exam")]
    ExpertNotEarned,
    #[error("VIP customers cannot be promoted to expert")]
    VipExcludesExpert,
}

/// Pure rules engine computing level progression from a transaction history.
///
/// All methods are side-effect free over already-fetched data; the engine never
/// reads the wall clock. Callers pass `now` where a transition stamps time.
pub struct ProgressionEngine {
    rulebook: Rulebook,
}

impl ProgressionEngine {
    pub fn new(rulebook: Rulebook) -> Self {
        Self { rulebook }
    }

    pub fn rulebook(&self) -> &Rulebook {
        &self.rulebook
    }

    /// Windowed progress toward completing `level_id`.
    ///
    /// The window opens when the customer entered the level and closes when
    /// they entered the next one, so transactions booked under a previous
    /// level are never double-counted. A level the customer never entered
    /// yields zero progress for every requirement.
    pub fn level_progress(
        &self,
        customer: &Customer,
        level_id: u8,
        transactions: &[Transaction],
    ) -> ProgressMap {
        let requirements = self.rulebook.requirements_for(level_id);
        let mut progress: ProgressMap = requirements
            .iter()
            .map(|req| (req.id.clone(), 0))
            .collect();
        if requirements.is_empty() {
            return progress;
        }

        let Some(window_start) = customer.level_up_history.get(&level_id).copied() else {
            return progress;
        };
        let window_end = customer.level_up_history.get(&(level_id + 1)).copied();

        let in_window = transactions.iter().filter(|tx| {
            tx.customer_id == customer.id
                && tx.requirement.is_some()
                && tx.booked_at >= window_start
                && window_end.map_or(true, |end| tx.booked_at < end)
        });

        for tx in in_window {
            let Some(requirement) = tx.requirement.as_ref() else {
                continue;
            };
            if level_id == MAX_LEVEL {
                // An exam only counts if every license prerequisite was
                // already satisfied at the moment the exam was booked.
                if requirement.as_str() != EXAM {
                    continue;
                }
                if !self.prereqs_met_at(&customer.id, transactions, Some(tx.booked_at)) {
                    continue;
                }
            }
            if let Some(count) = progress.get_mut(requirement) {
                *count += 1;
            }
        }

        progress
    }

    /// Lifetime tally of the six dog-license prerequisites, optionally capped
    /// to transactions booked at or before `until`.
    pub fn prereq_progress(
        &self,
        customer_id: &CustomerId,
        transactions: &[Transaction],
        until: Option<DateTime<Utc>>,
    ) -> ProgressMap {
        let mut progress: ProgressMap = self
            .rulebook
            .license_prereqs
            .iter()
            .map(|req| (req.id.clone(), 0))
            .collect();

        let qualifying = transactions.iter().filter(|tx| {
            tx.customer_id == *customer_id
                && until.map_or(true, |cap| tx.booked_at <= cap)
                && tx
                    .requirement
                    .as_ref()
                    .is_some_and(|req| self.rulebook.is_license_prereq(req))
        });

        for tx in qualifying {
            let Some(requirement) = tx.requirement.as_ref() else {
                continue;
            };
            if let Some(count) = progress.get_mut(requirement) {
                *count += 1;
            }
        }

        progress
    }

    fn prereqs_met_at(
        &self,
        customer_id: &CustomerId,
        transactions: &[Transaction],
        until: Option<DateTime<Utc>>,
    ) -> bool {
        let progress = self.prereq_progress(customer_id, transactions, until);
        self.rulebook
            .license_prereqs
            .iter()
            .all(|req| progress.get(&req.id).copied().unwrap_or(0) >= req.required)
    }

    /// Whether the customer may be unlocked for the next level.
    ///
    /// Level 1 has no gate. Level 5 additionally demands all license
    /// prerequisites, lifetime rather than windowed. Advancement itself stays
    /// a manual staff action.
    pub fn can_advance(&self, customer: &Customer, transactions: &[Transaction]) -> bool {
        if customer.level_id == 1 {
            return true;
        }

        let requirements = self.rulebook.requirements_for(customer.level_id);
        if requirements.is_empty() {
            return false;
        }

        let progress = self.level_progress(customer, customer.level_id, transactions);
        let level_met = requirements
            .iter()
            .all(|req| progress.get(&req.id).copied().unwrap_or(0) >= req.required);

        if customer.level_id == MAX_LEVEL {
            level_met && self.prereqs_met_at(&customer.id, transactions, None)
        } else {
            level_met
        }
    }

    /// Unlock the next level, stamping the entry instant. This closes the
    /// current level's progress window and opens the next one.
    pub fn advance(
        &self,
        customer: &mut Customer,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<u8, ProgressionError> {
        if customer.level_id >= MAX_LEVEL {
            return Err(ProgressionError::AtMaxLevel);
        }
        if !self.can_advance(customer, transactions) {
            return Err(ProgressionError::RequirementsNotMet {
                level_id: customer.level_id,
            });
        }

        let next = customer.level_id + 1;
        customer.level_up_history.insert(next, now);
        customer.level_id = next;
        Ok(next)
    }

    /// Promote a level-5 customer with a passed exam to Expert. Mutually
    /// exclusive with VIP.
    pub fn grant_expert(
        &self,
        customer: &mut Customer,
        transactions: &[Transaction],
    ) -> Result<(), ProgressionError> {
        if customer.is_vip {
            return Err(ProgressionError::VipExcludesExpert);
        }
        if customer.level_id != MAX_LEVEL || !self.can_advance(customer, transactions) {
            return Err(ProgressionError::ExpertNotEarned);
        }
        customer.is_expert = true;
        Ok(())
    }

    pub fn revoke_expert(&self, customer: &mut Customer) {
        customer.is_expert = false;
    }

    /// Toggle VIP at staff discretion. Granting VIP clears Expert.
    pub fn set_vip(&self, customer: &mut Customer, is_vip: bool) {
        customer.is_vip = is_vip;
        if is_vip {
            customer.is_expert = false;
        }
    }

    /// Display name for the customer's badge: overlays trump the numeric level.
    pub fn display_level(&self, customer: &Customer) -> &'static str {
        if customer.is_expert {
            self.rulebook.expert_label
        } else if customer.is_vip {
            self.rulebook.vip_label
        } else {
            self.rulebook.level_name(customer.level_id).unwrap_or("?")
        }
    }
}
