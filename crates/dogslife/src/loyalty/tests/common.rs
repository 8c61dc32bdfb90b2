use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::loyalty::domain::{
    Cents, Customer, CustomerId, DogProfile, NewCustomer, NewTransaction, RequirementId, StaffId,
    Transaction, TransactionId, TransactionKind,
};
use crate::loyalty::progress::ProgressionEngine;
use crate::loyalty::repository::{
    CustomerDirectory, RepositoryError, TransactionLog,
};
use crate::loyalty::rules::Rulebook;
use crate::loyalty::service::LoyaltyService;

pub(super) fn engine() -> ProgressionEngine {
    ProgressionEngine::new(Rulebook::standard())
}

pub(super) fn staff() -> StaffId {
    StaffId("user-staff-1".to_string())
}

pub(super) fn admin() -> StaffId {
    StaffId("user-admin-1".to_string())
}

/// Day `n` of a fixed test month, so ordering is explicit in every scenario.
pub(super) fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, n, 12, 0, 0).unwrap()
}

pub(super) fn customer_at_level(level_id: u8, entered_on: DateTime<Utc>) -> Customer {
    let mut level_up_history = std::collections::BTreeMap::new();
    for level in 2..=level_id {
        level_up_history.insert(level, entered_on);
    }
    Customer {
        id: CustomerId("cust-banu".to_string()),
        name: "Anna-Maria Schoss".to_string(),
        balance_cents: 50_000,
        level_id,
        is_vip: false,
        is_expert: false,
        level_up_history,
        dogs: vec![DogProfile {
            name: "Banu".to_string(),
            chip: Some("987000012345678".to_string()),
        }],
        email: Some("anna.schoss@email.de".to_string()),
        phone: None,
        created_by: admin(),
        created_at: Utc.with_ymd_and_hms(2025, 2, 9, 9, 0, 0).unwrap(),
        version: 1,
    }
}

pub(super) fn tagged_debit(
    customer: &Customer,
    requirement: &str,
    amount_cents: Cents,
    booked_at: DateTime<Utc>,
) -> Transaction {
    static SEQUENCE: AtomicU64 = AtomicU64::new(1);
    let id = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    Transaction {
        id: TransactionId(format!("tx-{id:04}")),
        customer_id: customer.id.clone(),
        booked_by: staff(),
        kind: TransactionKind::Debit,
        title: requirement.to_string(),
        amount_cents,
        bonus_cents: 0,
        booked_at,
        requirement: Some(RequirementId::new(requirement)),
    }
}

/// Six group classes and one exam inside the current level window, exactly
/// what levels 2 and 3 demand.
pub(super) fn level_two_completion(customer: &Customer, from: DateTime<Utc>) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = (0..6)
        .map(|offset| {
            tagged_debit(
                customer,
                "group_class",
                -1_500,
                from + chrono::Duration::days(offset),
            )
        })
        .collect();
    transactions.push(tagged_debit(
        customer,
        "exam",
        -1_500,
        from + chrono::Duration::days(7),
    ));
    transactions
}

/// All six license prerequisites booked on the given day.
pub(super) fn all_prereqs(customer: &Customer, booked_at: DateTime<Utc>) -> Vec<Transaction> {
    [
        "lecture_bonding",
        "lecture_hunting",
        "ws_communication",
        "ws_stress",
        "theory_license",
        "first_aid",
    ]
    .iter()
    .map(|req| tagged_debit(customer, req, -1_500, booked_at))
    .collect()
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    customers: Mutex<HashMap<CustomerId, Customer>>,
    sequence: AtomicU64,
}

impl MemoryDirectory {
    pub(super) fn with_customer(customer: Customer) -> Arc<Self> {
        let directory = Self::default();
        directory
            .customers
            .lock()
            .expect("directory mutex poisoned")
            .insert(customer.id.clone(), customer);
        Arc::new(directory)
    }
}

impl CustomerDirectory for MemoryDirectory {
    fn create(
        &self,
        intake: NewCustomer,
        created_by: StaffId,
    ) -> Result<Customer, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let customer = Customer {
            id: CustomerId(format!("cust-{id:04}")),
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
            created_at: day(1),
            version: 1,
        };
        self.customers
            .lock()
            .expect("directory mutex poisoned")
            .insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .customers
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self
            .customers
            .lock()
            .expect("directory mutex poisoned")
            .values()
            .cloned()
            .collect())
    }

    fn update(
        &self,
        mut customer: Customer,
        expected_version: u64,
    ) -> Result<Customer, RepositoryError> {
        let mut guard = self.customers.lock().expect("directory mutex poisoned");
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

#[derive(Default)]
pub(super) struct MemoryLog {
    transactions: Mutex<Vec<Transaction>>,
    sequence: AtomicU64,
}

impl MemoryLog {
    pub(super) fn seeded(transactions: Vec<Transaction>) -> Arc<Self> {
        let log = Self::default();
        *log.transactions.lock().expect("log mutex poisoned") = transactions;
        Arc::new(log)
    }
}

impl TransactionLog for MemoryLog {
    fn append(&self, transaction: NewTransaction) -> Result<Transaction, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let committed = Transaction {
            id: TransactionId(format!("tx-new-{id:04}")),
            customer_id: transaction.customer_id,
            booked_by: transaction.booked_by,
            kind: transaction.kind,
            title: transaction.title,
            amount_cents: transaction.amount_cents,
            bonus_cents: transaction.bonus_cents,
            booked_at: transaction.booked_at,
            requirement: transaction.requirement,
        };
        self.transactions
            .lock()
            .expect("log mutex poisoned")
            .push(committed.clone());
        Ok(committed)
    }

    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError> {
        Ok(self
            .transactions
            .lock()
            .expect("log mutex poisoned")
            .iter()
            .filter(|tx| &tx.customer_id == id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Transaction>, RepositoryError> {
        Ok(self
            .transactions
            .lock()
            .expect("log mutex poisoned")
            .clone())
    }
}

pub(super) fn service_with(
    customer: Customer,
    transactions: Vec<Transaction>,
) -> (
    Arc<MemoryDirectory>,
    Arc<MemoryLog>,
    LoyaltyService<MemoryDirectory, MemoryLog>,
) {
    let directory = MemoryDirectory::with_customer(customer);
    let log = MemoryLog::seeded(transactions);
    let service = LoyaltyService::new(directory.clone(), log.clone(), engine());
    (directory, log, service)
}
