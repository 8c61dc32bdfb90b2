use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::booking::{self, BookingError, TopupQuote};
use super::domain::{
    Cents, Customer, CustomerId, NewCustomer, NewTransaction, RequirementId, StaffId,
};
use super::progress::{ProgressionEngine, ProgressionError};
use super::reporting::{self, AvailablePeriods, ReportFilter, RevenueReport};
use super::repository::{CustomerDirectory, RepositoryError, TransactionLog};
use super::views::{AccountView, LevelOutcomeView, TransactionView};

/// Service composing the repositories with the progression engine.
///
/// Every mutating operation writes through the repositories and then refetches
/// the whole account before answering, mirroring the app's full-refresh
/// discipline: callers never see an optimistic local state.
pub struct LoyaltyService<C, T> {
    directory: Arc<C>,
    log: Arc<T>,
    engine: Arc<ProgressionEngine>,
}

/// Error raised by the loyalty service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("customer not found")]
    UnknownCustomer,
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<C, T> LoyaltyService<C, T>
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    pub fn new(directory: Arc<C>, log: Arc<T>, engine: ProgressionEngine) -> Self {
        Self {
            directory,
            log,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Register a customer. New accounts start at level 1 with a zero balance.
    pub fn create_customer(
        &self,
        intake: NewCustomer,
        created_by: StaffId,
    ) -> Result<AccountView, ServiceError> {
        let customer = self.directory.create(intake, created_by)?;
        info!(customer = %customer.id.0, "customer registered");
        self.account(&customer.id)
    }

    /// Current snapshot: customer, progress card, and full history.
    pub fn account(&self, id: &CustomerId) -> Result<AccountView, ServiceError> {
        let customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let transactions = self.log.for_customer(id)?;
        let level = LevelOutcomeView::build(&self.engine, &customer, &transactions);
        let transactions = transactions
            .iter()
            .map(TransactionView::from_transaction)
            .collect();
        Ok(AccountView {
            customer,
            level,
            transactions,
        })
    }

    /// Quote the bonus for a base amount without booking anything.
    pub fn quote_topup(&self, base_cents: Cents) -> Result<TopupQuote, ServiceError> {
        Ok(booking::quote_topup(self.engine.rulebook(), base_cents)?)
    }

    /// Book a top-up (preset or custom amount) with its tiered bonus.
    pub fn book_topup(
        &self,
        id: &CustomerId,
        booked_by: StaffId,
        base_cents: Cents,
        now: DateTime<Utc>,
    ) -> Result<AccountView, ServiceError> {
        let customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let tx = booking::build_topup(self.engine.rulebook(), &customer, booked_by, base_cents, now)?;
        self.commit(customer, tx)
    }

    /// Book a catalog course debit, tagged for level progress.
    pub fn book_preset_debit(
        &self,
        id: &CustomerId,
        booked_by: StaffId,
        requirement: &RequirementId,
        now: DateTime<Utc>,
    ) -> Result<AccountView, ServiceError> {
        let customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let tx = booking::build_preset_debit(
            self.engine.rulebook(),
            &customer,
            booked_by,
            requirement,
            now,
        )?;
        self.commit(customer, tx)
    }

    /// Book a free-form debit. Never counts toward a requirement.
    pub fn book_custom_debit(
        &self,
        id: &CustomerId,
        booked_by: StaffId,
        title: String,
        amount_cents: Cents,
        now: DateTime<Utc>,
    ) -> Result<AccountView, ServiceError> {
        let customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let tx = booking::build_custom_debit(&customer, booked_by, title, amount_cents, now)?;
        self.commit(customer, tx)
    }

    /// Record a zero-cost attendance that counts toward a requirement.
    pub fn record_event(
        &self,
        id: &CustomerId,
        booked_by: StaffId,
        title: String,
        requirement: Option<RequirementId>,
        now: DateTime<Utc>,
    ) -> Result<AccountView, ServiceError> {
        let customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let tx = booking::build_event(&customer, booked_by, title, requirement, now);
        self.commit(customer, tx)
    }

    /// Unlock the next level for a customer whose requirements are met.
    pub fn advance_level(
        &self,
        id: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<AccountView, ServiceError> {
        let mut customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let transactions = self.log.for_customer(id)?;
        let expected_version = customer.version;

        let next = self.engine.advance(&mut customer, &transactions, now)?;
        self.directory.update(customer, expected_version)?;
        info!(customer = %id.0, level = next, "level unlocked");
        self.account(id)
    }

    /// Toggle the VIP overlay. Granting VIP clears Expert.
    pub fn set_vip(&self, id: &CustomerId, is_vip: bool) -> Result<AccountView, ServiceError> {
        let mut customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let expected_version = customer.version;
        self.engine.set_vip(&mut customer, is_vip);
        self.directory.update(customer, expected_version)?;
        self.account(id)
    }

    /// Grant or revoke the Expert overlay. Granting is gated on the level-5
    /// exam being passed.
    pub fn set_expert(&self, id: &CustomerId, is_expert: bool) -> Result<AccountView, ServiceError> {
        let mut customer = self
            .directory
            .fetch(id)?
            .ok_or(ServiceError::UnknownCustomer)?;
        let expected_version = customer.version;

        if is_expert {
            let transactions = self.log.for_customer(id)?;
            self.engine.grant_expert(&mut customer, &transactions)?;
        } else {
            self.engine.revoke_expert(&mut customer);
        }
        self.directory.update(customer, expected_version)?;
        self.account(id)
    }

    /// Revenue KPIs across all customers for one period and staff selection.
    pub fn revenue_report(&self, filter: &ReportFilter) -> Result<RevenueReport, ServiceError> {
        let transactions = self.log.all()?;
        let customers = self.directory.list()?;
        Ok(reporting::revenue_report(filter, &transactions, &customers))
    }

    /// Periods that carry bookings, for the report period picker.
    pub fn report_periods(&self) -> Result<AvailablePeriods, ServiceError> {
        let transactions = self.log.all()?;
        Ok(reporting::available_periods(&transactions))
    }

    /// Apply the amount to the balance under a version check, then append the
    /// transaction and refetch.
    ///
    /// The version check runs first: a concurrent writer fails the whole
    /// booking before anything reaches the append-only log, so the balance
    /// always equals the sum of logged amounts. If the append itself fails the
    /// balance is rolled back in a compensating update.
    fn commit(
        &self,
        customer: Customer,
        tx: NewTransaction,
    ) -> Result<AccountView, ServiceError> {
        let expected_version = customer.version;
        let id = customer.id.clone();
        let amount = tx.amount_cents;
        let kind = tx.kind.label();

        let mut updated = customer;
        updated.balance_cents += amount;
        let stored = self.directory.update(updated, expected_version)?;

        if let Err(append_err) = self.log.append(tx) {
            let mut reverted = stored;
            reverted.balance_cents -= amount;
            let stored_version = reverted.version;
            if let Err(revert_err) = self.directory.update(reverted, stored_version) {
                warn!(
                    customer = %id.0,
                    error = %revert_err,
                    "balance rollback failed after append error"
                );
            }
            return Err(append_err.into());
        }

        info!(
            customer = %id.0,
            amount,
            kind,
            "transaction booked"
        );
        self.account(&id)
    }
}
