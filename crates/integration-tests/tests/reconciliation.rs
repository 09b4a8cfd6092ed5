//! Integration tests for the reconciliation sweep.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{Duration, NaiveDate};

use caseflow_admin::services::SweepTrigger;
use caseflow_core::{AuditAction, EntityType};
use caseflow_integration_tests::TestContext;

// =============================================================================
// Missing Records
// =============================================================================

#[tokio::test]
async fn test_missing_records_are_created_once() {
    let ctx = TestContext::new();
    let user = ctx.user("new@example.com", Duration::days(1)).await;

    let report = ctx.state.sync().manual_sync().await.unwrap();
    assert_eq!(report.users_checked, 1);

    let created: Vec<_> = report
        .inconsistencies
        .iter()
        .filter(|i| i.issue.starts_with("Missing"))
        .map(|i| i.kind)
        .collect();
    assert_eq!(
        created,
        [
            EntityType::Docket,
            EntityType::WorkPermit,
            EntityType::WorkVisa,
            EntityType::Contract
        ]
    );

    let permit = ctx.store().get_work_permit(user.id).await.unwrap().unwrap();
    assert_eq!(permit.status, "preparation");
    let contract = ctx.store().get_contract(user.id).await.unwrap().unwrap();
    assert_eq!(contract.company_contract_status, "pending");
    assert_eq!(contract.job_offer_status, "pending");

    let second = ctx.state.sync().manual_sync().await.unwrap();
    assert_eq!(second.fixed_count(), 0);
}

#[tokio::test]
async fn test_archived_users_are_swept_too() {
    let ctx = TestContext::new();
    let user = ctx.user("gone@example.com", Duration::days(800)).await;
    ctx.state
        .archive()
        .archive_user(user.id, Some("withdrew"), None)
        .await
        .unwrap();

    ctx.state.sync().manual_sync().await.unwrap();
    assert!(ctx.store().get_docket(user.id).await.unwrap().is_some());
}

// =============================================================================
// Status Repairs
// =============================================================================

#[tokio::test]
async fn test_invalid_statuses_are_reset() {
    let ctx = TestContext::new();
    let user = ctx.user("bad@example.com", Duration::days(3)).await;
    ctx.memory
        .seed_docket(user.id, |d| d.passport_front_url = Some("s3://p/front".into()))
        .await;
    ctx.memory
        .seed_work_permit(user.id, |p| p.status = "approvedd".into())
        .await;
    ctx.memory
        .seed_work_visa(user.id, |v| v.status = "pending".into())
        .await;
    ctx.memory
        .seed_contract(user.id, |c| {
            c.company_contract_status = "signed".into();
            c.job_offer_status = "SIGNED".into();
        })
        .await;

    let report = ctx.state.sync().manual_sync().await.unwrap();
    let issues: Vec<&str> = report.inconsistencies.iter().map(|i| i.issue.as_str()).collect();
    assert_eq!(
        issues,
        [
            "Invalid work permit status \"approvedd\", reset to preparation",
            "Invalid work visa status \"pending\", reset to preparation",
            "Invalid job offer status \"SIGNED\", reset to pending",
        ]
    );
    assert!(report.inconsistencies.iter().all(|i| i.fixed));

    let contract = ctx.store().get_contract(user.id).await.unwrap().unwrap();
    assert_eq!(contract.company_contract_status, "signed");
    assert_eq!(contract.job_offer_status, "pending");
    let visa = ctx.store().get_work_visa(user.id).await.unwrap().unwrap();
    assert_eq!(visa.status, "preparation");

    let updates = ctx
        .memory
        .audit_entries()
        .await
        .into_iter()
        .filter(|e| e.action == AuditAction::Update)
        .count();
    assert_eq!(updates, 3);
}

#[tokio::test]
async fn test_interview_without_slot_is_demoted() {
    let ctx = TestContext::new();
    let user = ctx.user("visa@example.com", Duration::days(3)).await;
    ctx.memory
        .seed_work_visa(user.id, |v| {
            v.status = "interview_scheduled".into();
            v.interview_date = NaiveDate::from_ymd_opt(2026, 11, 2);
        })
        .await;

    let report = ctx.state.sync().manual_sync().await.unwrap();
    let visa_issues: Vec<_> = report
        .inconsistencies
        .iter()
        .filter(|i| i.kind == EntityType::WorkVisa)
        .collect();
    assert_eq!(visa_issues.len(), 1);
    assert!(visa_issues[0].fixed);
    assert_eq!(
        visa_issues[0].issue,
        "Interview scheduled without interview date and time, status set to applied"
    );

    let visa = ctx.store().get_work_visa(user.id).await.unwrap().unwrap();
    assert_eq!(visa.status, "applied");

    // Applied with a date and no time is left for a human
    let again = ctx.state.sync().manual_sync().await.unwrap();
    let flagged: Vec<_> = again
        .inconsistencies
        .iter()
        .filter(|i| i.kind == EntityType::WorkVisa)
        .collect();
    assert_eq!(flagged.len(), 1);
    assert!(!flagged[0].fixed);
    assert_eq!(again.fixed_count(), 0);
}

#[tokio::test]
async fn test_completed_flag_reset_when_docket_missing() {
    let ctx = TestContext::new();
    let user = ctx.user("done@example.com", Duration::days(3)).await;
    ctx.store().set_docket_completed(user.id, true).await.unwrap();

    let report = ctx.state.sync().manual_sync().await.unwrap();
    assert!(report.inconsistencies.iter().any(|i| i.fixed
        && i.kind == EntityType::User
        && i.issue == "Docket marked complete without a docket record, completion flag reset"));
    assert!(!ctx.store().get_user(user.id).await.unwrap().unwrap().docket_completed);
}

// =============================================================================
// Failure Isolation
// =============================================================================

#[tokio::test]
async fn test_one_failing_user_does_not_stop_the_sweep() {
    let ctx = TestContext::new();
    let broken = ctx.user("broken@example.com", Duration::days(2)).await;
    let healthy = ctx.user("healthy@example.com", Duration::days(1)).await;
    ctx.memory.fail_user(broken.id).await;

    let report = ctx.state.sync().manual_sync().await.unwrap();
    assert_eq!(report.users_checked, 2);

    let broken_issues: Vec<_> = report
        .inconsistencies
        .iter()
        .filter(|i| i.user_id == broken.id)
        .collect();
    assert_eq!(broken_issues.len(), 4);
    assert!(broken_issues.iter().all(|i| !i.fixed));
    assert!(broken_issues[0].issue.starts_with("Failed to check docket record"));

    assert!(ctx.store().get_contract(healthy.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_failure_fails_the_sweep() {
    let ctx = TestContext::new();
    ctx.user("a@example.com", Duration::days(1)).await;
    ctx.memory.fail_reads(true);

    assert!(ctx.state.sync().run_sweep(SweepTrigger::Scheduled).await.is_err());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_parallel_sweep_keeps_user_order() {
    let ctx = TestContext::with_env(&[("SYNC_CONCURRENCY", "4")]);
    let mut ids = Vec::new();
    for n in 0..6 {
        ids.push(ctx.user(&format!("u{n}@example.com"), Duration::days(1)).await.id);
    }

    let report = ctx.state.sync().manual_sync().await.unwrap();
    let mut seen = Vec::new();
    for issue in &report.inconsistencies {
        if seen.last() != Some(&issue.user_id) {
            seen.push(issue.user_id);
        }
    }
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn test_overlapping_sweeps_create_no_duplicates() {
    let ctx = TestContext::with_env(&[("SYNC_CONCURRENCY", "2")]);
    for n in 0..3 {
        ctx.user(&format!("o{n}@example.com"), Duration::days(1)).await;
    }

    let sync = ctx.state.sync();
    let (a, b) = tokio::join!(sync.manual_sync(), sync.manual_sync());
    let (a, b) = (a.unwrap(), b.unwrap());

    // Each of the 12 records is claimed by exactly one sweep.
    assert_eq!(a.fixed_count() + b.fixed_count(), 12);
    let creates = ctx
        .memory
        .audit_entries()
        .await
        .iter()
        .filter(|e| e.action == AuditAction::Create)
        .count();
    assert_eq!(creates, 12);

    let third = sync.manual_sync().await.unwrap();
    assert_eq!(third.fixed_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_spawned_sweeps_claim_each_record_once() {
    let ctx = TestContext::with_env(&[("SYNC_CONCURRENCY", "4")]);
    for n in 0..20 {
        ctx.user(&format!("p{n}@example.com"), Duration::days(1)).await;
    }

    let first = ctx.state.sync().clone();
    let second = ctx.state.sync().clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.run_sweep(SweepTrigger::Scheduled).await }),
        tokio::spawn(async move { second.run_sweep(SweepTrigger::Manual).await }),
    );
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

    assert_eq!(a.users_checked, 20);
    assert_eq!(a.fixed_count() + b.fixed_count(), 80);
}
