use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Cents, Customer, CustomerId, StaffId, Transaction, TransactionKind};

/// Reporting window: one calendar month or one calendar year, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    Monthly { year: i32, month: u32 },
    Yearly { year: i32 },
}

impl ReportPeriod {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match *self {
            ReportPeriod::Monthly { year, month } => {
                at.year() == year && at.month() == month
            }
            ReportPeriod::Yearly { year } => at.year() == year,
        }
    }

    /// `YYYY-MM` for months, `YYYY` for years; the same keys
    /// [`available_periods`] emits.
    pub fn label(&self) -> String {
        match *self {
            ReportPeriod::Monthly { year, month } => format!("{year}-{month:02}"),
            ReportPeriod::Yearly { year } => format!("{year}"),
        }
    }

    /// Parse a period key back into a period. Accepts `2025` and `2025-11`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.split_once('-') {
            Some((year, month)) => {
                let year = year.parse().ok()?;
                let month: u32 = month.parse().ok()?;
                (1..=12).contains(&month).then_some(ReportPeriod::Monthly { year, month })
            }
            None => raw.parse().ok().map(|year| ReportPeriod::Yearly { year }),
        }
    }
}

/// Periods that actually carry data, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailablePeriods {
    pub monthly: Vec<String>,
    pub yearly: Vec<String>,
}

pub fn available_periods(transactions: &[Transaction]) -> AvailablePeriods {
    let mut monthly: Vec<String> = transactions
        .iter()
        .map(|tx| format!("{}-{:02}", tx.booked_at.year(), tx.booked_at.month()))
        .collect();
    let mut yearly: Vec<String> = transactions
        .iter()
        .map(|tx| tx.booked_at.year().to_string())
        .collect();
    monthly.sort_unstable_by(|a, b| b.cmp(a));
    monthly.dedup();
    yearly.sort_unstable_by(|a, b| b.cmp(a));
    yearly.dedup();
    AvailablePeriods { monthly, yearly }
}

/// Money actually received for a transaction, net of the top-up bonus.
///
/// Debits pass through. Top-ups booked by this system carry the granted bonus
/// on the row and are reversed exactly. Legacy top-ups are reversed by tier
/// heuristics on the combined amount, a lossy inverse: a coincidental credit
/// of exactly 115 € from another source would be misread as 100 € plus bonus.
pub fn real_amount_cents(tx: &Transaction) -> Cents {
    if tx.amount_cents <= 0 {
        return tx.amount_cents;
    }
    if tx.kind != TransactionKind::Topup {
        return tx.amount_cents;
    }
    if tx.bonus_cents > 0 {
        return tx.amount_cents - tx.bonus_cents;
    }

    // Tier thresholds are base + bonus of the booking-side ladder.
    match tx.amount_cents {
        total if total >= 45_000 => total - 15_000,
        total if total >= 18_000 => total - 3_000,
        total if total >= 11_500 => total - 1_500,
        total if total >= 5_500 => total - 500,
        total => total,
    }
}

/// Filter selecting the transactions a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub period: ReportPeriod,
    /// `None` means all staff (admin view); staff accounts see only their own
    /// bookings.
    pub staff: Option<StaffId>,
}

impl ReportFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        self.period.contains(tx.booked_at)
            && self.staff.as_ref().map_or(true, |staff| &tx.booked_by == staff)
    }
}

/// One line of the revenue report, real and booked amounts side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub booked_at: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dog_name: Option<String>,
    pub title: String,
    pub kind_label: &'static str,
    pub real_amount_cents: Cents,
    pub booked_amount_cents: Cents,
    pub booked_by: StaffId,
}

/// Customers ranked by spend within the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomerEntry {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub visits: usize,
    pub spent_cents: Cents,
}

/// Aggregated KPIs for one period and staff selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueReport {
    pub period: String,
    /// Credits net of bonuses, the money actually received.
    pub revenue_cents: Cents,
    /// Gross value of services consumed (absolute sum of debits).
    pub debited_cents: Cents,
    pub rows: Vec<ReportRow>,
    pub top_customers: Vec<TopCustomerEntry>,
}

pub fn revenue_report(
    filter: &ReportFilter,
    transactions: &[Transaction],
    customers: &[Customer],
) -> RevenueReport {
    let by_id: HashMap<&CustomerId, &Customer> =
        customers.iter().map(|customer| (&customer.id, customer)).collect();

    let mut selected: Vec<&Transaction> =
        transactions.iter().filter(|tx| filter.matches(tx)).collect();
    selected.sort_by_key(|tx| tx.booked_at);

    let revenue_cents = selected
        .iter()
        .filter(|tx| tx.amount_cents > 0)
        .map(|tx| real_amount_cents(tx))
        .sum();
    let debited_cents = selected
        .iter()
        .filter(|tx| tx.amount_cents < 0)
        .map(|tx| tx.amount_cents.abs())
        .sum();

    let rows = selected
        .iter()
        .map(|tx| {
            let customer = by_id.get(&tx.customer_id);
            ReportRow {
                booked_at: tx.booked_at,
                customer_id: tx.customer_id.clone(),
                customer_name: customer
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Unbekannt".to_string()),
                dog_name: customer.and_then(|c| c.dog_name().map(str::to_string)),
                title: tx.title.clone(),
                kind_label: tx.kind.label(),
                real_amount_cents: real_amount_cents(tx),
                booked_amount_cents: tx.amount_cents,
                booked_by: tx.booked_by.clone(),
            }
        })
        .collect();

    let mut spending: HashMap<&CustomerId, (usize, Cents)> = HashMap::new();
    for tx in selected.iter().filter(|tx| tx.amount_cents < 0) {
        let entry = spending.entry(&tx.customer_id).or_default();
        entry.0 += 1;
        entry.1 += tx.amount_cents.abs();
    }
    let mut top_customers: Vec<TopCustomerEntry> = spending
        .into_iter()
        .filter_map(|(id, (visits, spent_cents))| {
            by_id.get(id).map(|customer| TopCustomerEntry {
                customer_id: customer.id.clone(),
                customer_name: customer.name.clone(),
                visits,
                spent_cents,
            })
        })
        .collect();
    top_customers.sort_by(|a, b| {
        b.spent_cents
            .cmp(&a.spent_cents)
            .then_with(|| a.customer_name.cmp(&b.customer_name))
    });
    top_customers.truncate(5);

    RevenueReport {
        period: filter.period.label(),
        revenue_cents,
        debited_cents,
        rows,
        top_customers,
    }
}
