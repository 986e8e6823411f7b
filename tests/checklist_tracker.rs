//! Checklist flag/resolve protocol and its optimistic-concurrency retry.

mod common;

use common::{TestContext, applicant, bfp_admin, meo_admin, submit_building};
use permiso::application::error::WorkflowError;
use permiso::domain::checklist::ItemKey;
use permiso::domain::types::ApplicationStatus;

fn key(category: &str, item: &str) -> ItemKey {
    ItemKey {
        category: category.to_string(),
        item: item.to_string(),
    }
}

fn clearance() -> ItemKey {
    key("unified_application_forms", "Locational Clearance")
}

fn affidavit() -> ItemKey {
    key("others", "Affidavit of Undertaking")
}

#[tokio::test]
async fn flagging_forces_rejected_and_records_missing_documents() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let updated = ctx
        .state
        .checklist
        .flag_items(
            application.id,
            vec![clearance()],
            Some("Clearance does not match the lot survey".into()),
            &meo_admin(),
        )
        .await
        .expect("flagging succeeds");

    assert_eq!(updated.status, ApplicationStatus::Rejected);
    assert!(!updated.rejection_details.is_resolved);
    assert_eq!(
        updated.rejection_details.missing_documents,
        vec!["Locational Clearance".to_string()]
    );
    assert_eq!(
        updated.rejection_details.comments,
        "Clearance does not match the lot survey"
    );

    let last = updated.workflow_history.last().expect("entry appended");
    assert_eq!(updated.workflow_history.len(), 2);
    assert_eq!(last.status, ApplicationStatus::Rejected);
    assert!(last.comments.starts_with("Checklist items flagged:"));
    assert_eq!(updated.revision, 2);
}

#[tokio::test]
async fn reflagging_the_same_item_changes_nothing() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let first = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &meo_admin())
        .await
        .expect("first flag succeeds");

    let second = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &meo_admin())
        .await
        .expect("second flag is a no-op");

    assert_eq!(second.revision, first.revision);
    assert_eq!(second.workflow_history.len(), first.workflow_history.len());
    assert_eq!(
        second.rejection_details.missing_documents,
        first.rejection_details.missing_documents
    );
}

#[tokio::test]
async fn flagging_an_already_rejected_application_appends_no_history() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let first = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &meo_admin())
        .await
        .expect("first flag succeeds");
    assert_eq!(first.workflow_history.len(), 2);

    let second = ctx
        .state
        .checklist
        .flag_items(application.id, vec![affidavit()], None, &bfp_admin())
        .await
        .expect("second flag succeeds");

    assert_eq!(second.workflow_history.len(), 2);
    assert_eq!(second.rejection_details.missing_documents.len(), 2);
}

#[tokio::test]
async fn resolving_clears_flags_and_rederives_resolution() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    ctx.state
        .checklist
        .flag_items(
            application.id,
            vec![clearance(), affidavit()],
            None,
            &meo_admin(),
        )
        .await
        .expect("flagging succeeds");

    // Resolving one of two flags keeps the application blocked.
    let partial = ctx
        .state
        .checklist
        .resolve_items(application.id, vec![clearance()], &meo_admin())
        .await
        .expect("partial resolve succeeds");
    assert!(!partial.rejection_details.is_resolved);
    assert_eq!(
        partial.rejection_details.missing_documents,
        vec!["Affidavit of Undertaking".to_string()]
    );

    let full = ctx
        .state
        .checklist
        .resolve_items(application.id, vec![affidavit()], &meo_admin())
        .await
        .expect("full resolve succeeds");
    assert!(full.rejection_details.is_resolved);
    assert!(full.rejection_details.missing_documents.is_empty());
    // Resolution never moves the status by itself.
    assert_eq!(full.status, ApplicationStatus::Rejected);

    let resolved_item = full
        .admin_checklist
        .0
        .get("unified_application_forms")
        .and_then(|items| items.iter().find(|item| item.item == "Locational Clearance"))
        .expect("item present");
    assert!(!resolved_item.flagged);
    assert_eq!(resolved_item.resolved_by.as_deref(), Some(meo_admin().id.as_str()));
}

#[tokio::test]
async fn flag_save_retries_through_transient_conflicts() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    // Two lost revision races, then the third attempt lands.
    ctx.applications.inject_checklist_conflicts(2);

    let updated = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &meo_admin())
        .await
        .expect("retry wins eventually");
    assert_eq!(updated.status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn flag_save_gives_up_after_three_attempts() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    ctx.applications.inject_checklist_conflicts(3);

    let result = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &meo_admin())
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::RetryExhausted { attempts: 3 })
    ));

    // Nothing was persisted by the failed attempts.
    let stored = ctx
        .applications
        .snapshot(application.id)
        .await
        .expect("still stored");
    assert_eq!(stored.status, ApplicationStatus::Submitted);
    assert_eq!(stored.revision, 1);
    assert!(stored.rejection_details.missing_documents.is_empty());
}

#[tokio::test]
async fn checklist_updates_are_admin_only() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let flag = ctx
        .state
        .checklist
        .flag_items(application.id, vec![clearance()], None, &applicant())
        .await;
    assert!(matches!(flag, Err(WorkflowError::Forbidden { .. })));

    let resolve = ctx
        .state
        .checklist
        .resolve_items(application.id, vec![clearance()], &applicant())
        .await;
    assert!(matches!(resolve, Err(WorkflowError::Forbidden { .. })));
}

#[tokio::test]
async fn unknown_and_empty_selections_are_rejected() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let empty = ctx
        .state
        .checklist
        .flag_items(application.id, Vec::new(), None, &meo_admin())
        .await;
    assert!(matches!(empty, Err(WorkflowError::Validation(_))));

    let unknown = ctx
        .state
        .checklist
        .flag_items(
            application.id,
            vec![key("unified_application_forms", "Not In The Taxonomy")],
            None,
            &meo_admin(),
        )
        .await;
    assert!(matches!(unknown, Err(WorkflowError::Validation(_))));
}
