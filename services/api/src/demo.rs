use chrono::{Datelike, Utc};
use clap::Args;
use std::sync::Arc;

use dogslife::error::AppError;
use dogslife::loyalty::domain::{format_eur, RequirementId};
use dogslife::loyalty::reporting::ReportPeriod;
use dogslife::loyalty::views::AccountView;
use dogslife::loyalty::{LoyaltyService, ProgressionEngine, ReportFilter, Rulebook, ServiceError};

use crate::infra::{
    seed_demo_accounts, seed_staff, DemoService, InMemoryCustomerDirectory, InMemoryTransactionLog,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Include the full transaction history in the output
    #[arg(long)]
    pub(crate) list_transactions: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RevenueReportArgs {
    /// Reporting period, YYYY or YYYY-MM (defaults to the current month)
    #[arg(long, value_parser = crate::infra::parse_period)]
    pub(crate) period: Option<ReportPeriod>,
    /// Restrict the report to bookings by one staff id
    #[arg(long)]
    pub(crate) staff: Option<String>,
}

fn build_demo_service() -> Arc<DemoService> {
    Arc::new(LoyaltyService::new(
        Arc::new(InMemoryCustomerDirectory::default()),
        Arc::new(InMemoryTransactionLog::default()),
        ProgressionEngine::new(Rulebook::standard()),
    ))
}

fn current_month() -> ReportPeriod {
    let now = Utc::now();
    ReportPeriod::Monthly {
        year: now.year(),
        month: now.month(),
    }
}

fn print_account(account: &AccountView) {
    let dog = account.customer.dog_name().unwrap_or("-");
    println!(
        "- {} (dog: {}) | balance {} | level {} ({})",
        account.customer.name,
        dog,
        format_eur(account.customer.balance_cents),
        account.level.level_id,
        account.level.display_label,
    );
    for row in &account.level.requirements {
        let mark = if row.met { "x" } else { " " };
        println!("    [{mark}] {}: {}/{}", row.name, row.achieved, row.required);
    }
    if account.level.can_advance {
        println!("    ready to unlock the next level");
    }
}

pub(crate) fn run_revenue_report(args: RevenueReportArgs) -> Result<(), AppError> {
    let service = build_demo_service();
    if let Err(err) = seed_demo_accounts(&service) {
        println!("Seed failed: {err}");
        return Ok(());
    }
    print_revenue_report(&service, args);
    Ok(())
}

fn print_revenue_report(service: &DemoService, args: RevenueReportArgs) {
    let filter = ReportFilter {
        period: args.period.unwrap_or_else(current_month),
        staff: args.staff.map(dogslife::loyalty::domain::StaffId),
    };
    let report = match service.revenue_report(&filter) {
        Ok(report) => report,
        Err(err) => {
            println!("Report unavailable: {err}");
            return;
        }
    };

    println!("\nRevenue report {}", report.period);
    println!("- revenue (net of bonuses): {}", format_eur(report.revenue_cents));
    println!("- services consumed:        {}", format_eur(report.debited_cents));
    println!("- bookings in period:       {}", report.rows.len());
    println!("Top customers:");
    for entry in &report.top_customers {
        println!(
            "  - {}: {} across {} visits",
            entry.customer_name,
            format_eur(entry.spent_cents),
            entry.visits
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_demo_service();
    let staff = seed_staff();

    println!("DogsLife booking and progression demo");
    let anna = match seed_demo_accounts(&service) {
        Ok(id) => id,
        Err(err) => {
            println!("Seed failed: {err}");
            return Ok(());
        }
    };

    let walkthrough = || -> Result<AccountView, ServiceError> {
        let account = service.account(&anna)?;
        println!("\nSeeded account:");
        print_account(&account);

        println!("\nBooking the remaining level requirements...");
        let now = Utc::now();
        let group_class = RequirementId::new("group_class");
        service.book_preset_debit(&anna, staff.clone(), &group_class, now)?;
        service.book_preset_debit(&anna, staff.clone(), &group_class, now)?;
        service.book_preset_debit(&anna, staff.clone(), &RequirementId::new("exam"), now)?;

        let account = service.account(&anna)?;
        print_account(&account);

        println!("\nUnlocking the next level...");
        service.advance_level(&anna, now)
    };

    let account = match walkthrough() {
        Ok(account) => account,
        Err(err) => {
            println!("  Walkthrough stopped: {err}");
            return Ok(());
        }
    };
    print_account(&account);

    if args.list_transactions {
        println!("\nTransaction history:");
        for row in &account.transactions {
            println!(
                "  {} | {} | {} | {}",
                row.booked_at.format("%Y-%m-%d"),
                row.kind_label,
                row.title,
                format_eur(row.amount_cents)
            );
        }
    }

    print_revenue_report(
        &service,
        RevenueReportArgs {
            period: None,
            staff: None,
        },
    );
    Ok(())
}
