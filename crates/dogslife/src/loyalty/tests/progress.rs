use super::common::*;
use crate::loyalty::domain::RequirementId;
use crate::loyalty::progress::ProgressionError;

#[test]
fn level_one_customers_can_always_advance() {
    let engine = engine();
    let customer = customer_at_level(1, day(1));

    assert!(engine.can_advance(&customer, &[]));
}

#[test]
fn level_two_requires_six_group_classes_and_one_exam() {
    let engine = engine();
    let customer = customer_at_level(2, day(1));
    let transactions = level_two_completion(&customer, day(2));

    assert!(engine.can_advance(&customer, &transactions));

    // Removing any single group class flips the decision.
    let short_one: Vec<_> = transactions
        .iter()
        .filter(|tx| tx.requirement != Some(RequirementId::new("group_class")))
        .chain(
            transactions
                .iter()
                .filter(|tx| tx.requirement == Some(RequirementId::new("group_class")))
                .take(5),
        )
        .cloned()
        .collect();
    assert!(!engine.can_advance(&customer, &short_one));
}

#[test]
fn progress_is_zero_for_a_level_never_entered() {
    let engine = engine();
    let mut customer = customer_at_level(2, day(1));
    customer.level_up_history.clear();
    let transactions = level_two_completion(&customer, day(2));

    let progress = engine.level_progress(&customer, 2, &transactions);
    assert!(progress.values().all(|count| *count == 0));
    assert!(!engine.can_advance(&customer, &transactions));
}

#[test]
fn transactions_before_level_entry_never_count() {
    let engine = engine();
    let customer = customer_at_level(2, day(10));
    // Booked while the customer was still in level 1.
    let transactions = level_two_completion(&customer, day(2));

    let progress = engine.level_progress(&customer, 2, &transactions);
    assert_eq!(
        progress.get(&RequirementId::new("group_class")).copied(),
        Some(0)
    );
    assert!(!engine.can_advance(&customer, &transactions));
}

#[test]
fn window_closes_when_the_next_level_is_entered() {
    let engine = engine();
    let mut customer = customer_at_level(3, day(1));
    customer.level_up_history.insert(2, day(1));
    customer.level_up_history.insert(3, day(10));
    // All bookings happened during level 2; none may leak into level 3.
    let transactions = level_two_completion(&customer, day(2));

    let level_two = engine.level_progress(&customer, 2, &transactions);
    let level_three = engine.level_progress(&customer, 3, &transactions);
    assert_eq!(
        level_two.get(&RequirementId::new("group_class")).copied(),
        Some(6)
    );
    assert_eq!(
        level_three.get(&RequirementId::new("group_class")).copied(),
        Some(0)
    );
}

#[test]
fn untagged_transactions_are_ignored() {
    let engine = engine();
    let customer = customer_at_level(2, day(1));
    let mut transactions = level_two_completion(&customer, day(2));
    for tx in &mut transactions {
        tx.requirement = None;
    }

    let progress = engine.level_progress(&customer, 2, &transactions);
    assert!(progress.values().all(|count| *count == 0));
}

#[test]
fn other_customers_transactions_never_count() {
    let engine = engine();
    let customer = customer_at_level(2, day(1));
    let mut transactions = level_two_completion(&customer, day(2));
    for tx in &mut transactions {
        tx.customer_id = crate::loyalty::domain::CustomerId("cust-other".to_string());
    }

    assert!(!engine.can_advance(&customer, &transactions));
}

#[test]
fn exam_before_prereqs_does_not_count_for_level_five() {
    let engine = engine();
    let customer = customer_at_level(5, day(1));

    // Exam on day 3, prerequisites completed only on day 5.
    let mut transactions = vec![tagged_debit(&customer, "exam", -1_500, day(3))];
    transactions.extend(all_prereqs(&customer, day(5)));

    let progress = engine.level_progress(&customer, 5, &transactions);
    assert_eq!(progress.get(&RequirementId::new("exam")).copied(), Some(0));
    assert!(!engine.can_advance(&customer, &transactions));
}

#[test]
fn exam_after_prereqs_counts_for_level_five() {
    let engine = engine();
    let customer = customer_at_level(5, day(1));

    let mut transactions = all_prereqs(&customer, day(3));
    transactions.push(tagged_debit(&customer, "exam", -1_500, day(5)));

    let progress = engine.level_progress(&customer, 5, &transactions);
    assert_eq!(progress.get(&RequirementId::new("exam")).copied(), Some(1));
    assert!(engine.can_advance(&customer, &transactions));
}

#[test]
fn prereqs_booked_before_level_five_entry_still_count() {
    let engine = engine();
    let mut customer = customer_at_level(5, day(10));
    // Prerequisites are lifetime achievements; the customer collected them
    // during level 4, then passed the exam after entering level 5.
    customer.level_up_history.insert(5, day(10));
    let mut transactions = all_prereqs(&customer, day(2));
    transactions.push(tagged_debit(&customer, "exam", -1_500, day(12)));

    assert!(engine.can_advance(&customer, &transactions));
}

#[test]
fn prereq_progress_respects_the_until_cap() {
    let engine = engine();
    let customer = customer_at_level(5, day(1));
    let transactions = all_prereqs(&customer, day(5));

    let before = engine.prereq_progress(&customer.id, &transactions, Some(day(4)));
    let at = engine.prereq_progress(&customer.id, &transactions, Some(day(5)));
    assert!(before.values().all(|count| *count == 0));
    assert!(at.values().all(|count| *count == 1));
}

#[test]
fn engine_is_pure_and_idempotent() {
    let engine = engine();
    let customer = customer_at_level(2, day(1));
    let transactions = level_two_completion(&customer, day(2));

    let first = engine.level_progress(&customer, 2, &transactions);
    let second = engine.level_progress(&customer, 2, &transactions);
    assert_eq!(first, second);
    assert_eq!(
        engine.can_advance(&customer, &transactions),
        engine.can_advance(&customer, &transactions)
    );
}

#[test]
fn advance_stamps_the_entry_instant() {
    let engine = engine();
    let mut customer = customer_at_level(2, day(1));
    let transactions = level_two_completion(&customer, day(2));

    let next = engine
        .advance(&mut customer, &transactions, day(20))
        .expect("requirements met");

    assert_eq!(next, 3);
    assert_eq!(customer.level_id, 3);
    assert_eq!(customer.level_up_history.get(&3).copied(), Some(day(20)));
}

#[test]
fn advance_rejects_unmet_requirements() {
    let engine = engine();
    let mut customer = customer_at_level(2, day(1));

    let err = engine
        .advance(&mut customer, &[], day(20))
        .expect_err("no qualifying transactions");
    assert_eq!(err, ProgressionError::RequirementsNotMet { level_id: 2 });
    assert_eq!(customer.level_id, 2);
}

#[test]
fn advance_stops_at_the_top_level() {
    let engine = engine();
    let mut customer = customer_at_level(5, day(1));
    let mut transactions = all_prereqs(&customer, day(2));
    transactions.push(tagged_debit(&customer, "exam", -1_500, day(3)));

    let err = engine
        .advance(&mut customer, &transactions, day(20))
        .expect_err("level 5 is terminal");
    assert_eq!(err, ProgressionError::AtMaxLevel);
}

#[test]
fn expert_requires_a_passed_level_five_exam() {
    let engine = engine();
    let mut customer = customer_at_level(5, day(1));

    let err = engine
        .grant_expert(&mut customer, &[])
        .expect_err("exam not passed");
    assert_eq!(err, ProgressionError::ExpertNotEarned);

    let mut transactions = all_prereqs(&customer, day(2));
    transactions.push(tagged_debit(&customer, "exam", -1_500, day(3)));
    engine
        .grant_expert(&mut customer, &transactions)
        .expect("exam passed");
    assert!(customer.is_expert);
}

#[test]
fn vip_and_expert_are_mutually_exclusive() {
    let engine = engine();
    let mut customer = customer_at_level(5, day(1));
    let mut transactions = all_prereqs(&customer, day(2));
    transactions.push(tagged_debit(&customer, "exam", -1_500, day(3)));

    engine.grant_expert(&mut customer, &transactions).expect("earned");
    engine.set_vip(&mut customer, true);
    assert!(customer.is_vip);
    assert!(!customer.is_expert, "VIP clears Expert");

    let err = engine
        .grant_expert(&mut customer, &transactions)
        .expect_err("VIP excludes Expert");
    assert_eq!(err, ProgressionError::VipExcludesExpert);
}

#[test]
fn display_level_prefers_overlays() {
    let engine = engine();
    let mut customer = customer_at_level(3, day(1));
    assert_eq!(engine.display_level(&customer), "Fortgeschrittene");

    engine.set_vip(&mut customer, true);
    assert_eq!(engine.display_level(&customer), "VIP-Kunde");

    customer.is_vip = false;
    customer.is_expert = true;
    assert_eq!(engine.display_level(&customer), "Experte");
}
