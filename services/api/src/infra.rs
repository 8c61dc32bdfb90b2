use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dogslife::loyalty::domain::{
    Customer, CustomerId, DogProfile, NewCustomer, NewTransaction, RequirementId, StaffId,
    Transaction, TransactionId,
};
use dogslife::loyalty::repository::{CustomerDirectory, RepositoryError, TransactionLog};
use dogslife::loyalty::reporting::ReportPeriod;
use dogslife::loyalty::{LoyaltyService, ServiceError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCustomerDirectory {
    records: Arc<Mutex<HashMap<CustomerId, Customer>>>,
    sequence: Arc<AtomicU64>,
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn create(
        &self,
        intake: NewCustomer,
        created_by: StaffId,
    ) -> Result<Customer, RepositoryError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let customer = Customer {
            id: CustomerId(format!("cust-{seq:04}")),
            name: intake.name,
            balance_cents: 0,
            level_id: 1,
            is_vip: false,
            is_expert: false,
            level_up_history: Default::default(),
            dogs: intake.dogs,
            email: intake.email,
            phone: intake.phone,
            created_by,
            created_at: Utc::now(),
            version: 1,
        };
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        guard.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn update(
        &self,
        mut customer: Customer,
        expected_version: u64,
    ) -> Result<Customer, RepositoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        let current = guard.get(&customer.id).ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }
        customer.version = expected_version + 1;
        guard.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTransactionLog {
    rows: Arc<Mutex<Vec<Transaction>>>,
    sequence: Arc<AtomicU64>,
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, transaction: NewTransaction) -> Result<Transaction, RepositoryError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let committed = Transaction {
            id: TransactionId(format!("tx-{seq:06}")),
            customer_id: transaction.customer_id,
            booked_by: transaction.booked_by,
            kind: transaction.kind,
            title: transaction.title,
            amount_cents: transaction.amount_cents,
            bonus_cents: transaction.bonus_cents,
            booked_at: transaction.booked_at,
            requirement: transaction.requirement,
        };
        let mut guard = self.rows.lock().expect("log mutex poisoned");
        guard.push(committed.clone());
        Ok(committed)
    }

    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError> {
        let guard = self.rows.lock().expect("log mutex poisoned");
        Ok(guard
            .iter()
            .filter(|tx| &tx.customer_id == id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Transaction>, RepositoryError> {
        let guard = self.rows.lock().expect("log mutex poisoned");
        Ok(guard.clone())
    }
}

pub(crate) type DemoService = LoyaltyService<InMemoryCustomerDirectory, InMemoryTransactionLog>;

pub(crate) fn seed_staff() -> StaffId {
    StaffId("user-front-desk".to_string())
}

/// Seed two accounts with recent activity so the report and demo commands
/// have something to show. All bookings go through the service, the stores
/// never see hand-built rows.
pub(crate) fn seed_demo_accounts(service: &DemoService) -> Result<CustomerId, ServiceError> {
    let staff = seed_staff();
    let now = Utc::now();

    let anna = service
        .create_customer(
            NewCustomer {
                name: "Anna-Maria Schoss".to_string(),
                dogs: vec![DogProfile {
                    name: "Banu".to_string(),
                    chip: Some("987000012345678".to_string()),
                }],
                email: Some("anna.schoss@email.de".to_string()),
                phone: None,
            },
            staff.clone(),
        )?
        .customer
        .id;
    service.book_topup(&anna, staff.clone(), 30_000, now - Duration::days(20))?;
    service.advance_level(&anna, now - Duration::days(19))?;
    let group_class = RequirementId::new("group_class");
    for offset in 0..4 {
        service.book_preset_debit(
            &anna,
            staff.clone(),
            &group_class,
            now - Duration::days(16 - offset),
        )?;
    }

    let jonas = service
        .create_customer(
            NewCustomer {
                name: "Jonas Weber".to_string(),
                dogs: vec![DogProfile {
                    name: "Rex".to_string(),
                    chip: None,
                }],
                email: None,
                phone: Some("+49 171 5550123".to_string()),
            },
            staff.clone(),
        )?
        .customer
        .id;
    service.book_topup(&jonas, staff.clone(), 10_000, now - Duration::days(9))?;
    service.book_preset_debit(&jonas, staff, &RequirementId::new("trail"), now - Duration::days(2))?;

    Ok(anna)
}

pub(crate) fn parse_period(raw: &str) -> Result<ReportPeriod, String> {
    ReportPeriod::parse(raw.trim())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY or YYYY-MM"))
}
