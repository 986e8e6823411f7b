//! Document ledger: positional stability, soft-delete replacement, and
//! read-time visibility.

mod common;

use common::{
    TestContext, advance, applicant, meo_admin, other_applicant, submit_building,
    upload_office_document,
};
use permiso::application::documents::DocumentUpload;
use permiso::application::error::WorkflowError;

fn upload(requirement: &str, file: &str) -> DocumentUpload {
    DocumentUpload {
        requirement_name: requirement.to_string(),
        file_name: file.to_string(),
        content_type: "application/pdf".into(),
        content: b"%PDF-1.4".to_vec(),
        notes: None,
    }
}

#[tokio::test]
async fn appends_assign_consecutive_indexes() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    for (position, requirement) in ["Locational Clearance", "Soil Test Report", "PTR Receipts"]
        .iter()
        .enumerate()
    {
        let appended = ctx
            .state
            .documents
            .append(application.id, &applicant(), upload(requirement, "file.pdf"))
            .await
            .expect("append succeeds");
        assert_eq!(appended.original_index, position as i32);
    }

    let listed = ctx
        .state
        .documents
        .list(application.id, &applicant())
        .await
        .expect("listing succeeds");
    let indexes: Vec<_> = listed.iter().map(|doc| doc.original_index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn replacement_keeps_the_original_index() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    ctx.state
        .documents
        .append(application.id, &applicant(), upload("Locational Clearance", "v1.pdf"))
        .await
        .expect("append succeeds");
    ctx.state
        .documents
        .append(application.id, &applicant(), upload("Soil Test Report", "soil.pdf"))
        .await
        .expect("append succeeds");

    let replaced = ctx
        .state
        .documents
        .replace(
            application.id,
            &applicant(),
            upload("Locational Clearance", "v2.pdf"),
        )
        .await
        .expect("replace succeeds");
    assert_eq!(replaced.original_index, 0);
    assert_eq!(replaced.file_name, "v2.pdf");

    // The positional read now yields the replacement.
    let fetched = ctx
        .state
        .documents
        .get_by_index(application.id, 0, &applicant())
        .await
        .expect("index still resolves");
    assert_eq!(fetched.file_name, "v2.pdf");

    // The superseded row is retained inactive; nothing was reindexed.
    let rows = ctx.documents.all_rows(application.id).await;
    assert_eq!(rows.len(), 3);
    let superseded = rows
        .iter()
        .find(|doc| doc.file_name == "v1.pdf")
        .expect("old row kept");
    assert!(!superseded.is_active);
    assert_eq!(superseded.original_index, 0);

    let active = ctx
        .state
        .documents
        .list(application.id, &applicant())
        .await
        .expect("listing succeeds");
    assert_eq!(active.len(), 2);
    assert_eq!(active[1].file_name, "soil.pdf");
    assert_eq!(active[1].original_index, 1);
}

#[tokio::test]
async fn replacing_an_unmatched_requirement_appends_as_new() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    // No document satisfies the requirement yet, so the replacement
    // lands as a fresh ledger row.
    let appended = ctx
        .state
        .documents
        .replace(
            application.id,
            &applicant(),
            upload("Locational Clearance", "v2.pdf"),
        )
        .await
        .expect("replace falls back to append");
    assert_eq!(appended.original_index, 0);
    assert!(appended.is_active);

    let rows = ctx.documents.all_rows(application.id).await;
    assert_eq!(rows.len(), 1);

    // The next one matches by requirement name and supersedes in place.
    let replaced = ctx
        .state
        .documents
        .replace(
            application.id,
            &applicant(),
            upload("Locational Clearance", "v3.pdf"),
        )
        .await
        .expect("replace supersedes the appended row");
    assert_eq!(replaced.original_index, 0);

    let rows = ctx.documents.all_rows(application.id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().filter(|doc| doc.is_active).count(), 1);
}

#[tokio::test]
async fn hidden_documents_read_as_absent() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let office_doc = upload_office_document(&ctx, application.id, &meo_admin()).await;

    // Before approval an applicant cannot see office uploads, and the
    // positional read does not leak their existence.
    let hidden = ctx
        .state
        .documents
        .get_by_index(application.id, office_doc.original_index, &applicant())
        .await;
    assert!(matches!(hidden, Err(WorkflowError::NotFound)));

    let listed = ctx
        .state
        .documents
        .list(application.id, &applicant())
        .await
        .expect("listing succeeds");
    assert!(listed.is_empty());

    advance(&ctx, application.id, "Approved", &meo_admin()).await;

    let visible = ctx
        .state
        .documents
        .get_by_index(application.id, office_doc.original_index, &applicant())
        .await
        .expect("visible after approval");
    assert_eq!(visible.id, office_doc.id);
}

#[tokio::test]
async fn blank_requirement_names_are_rejected() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let result = ctx
        .state
        .documents
        .append(application.id, &applicant(), upload("   ", "file.pdf"))
        .await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));
}

#[tokio::test]
async fn ledger_access_is_limited_to_the_owning_applicant() {
    let ctx = TestContext::new();
    let application = submit_building(&ctx).await;

    let append = ctx
        .state
        .documents
        .append(
            application.id,
            &other_applicant(),
            upload("Locational Clearance", "file.pdf"),
        )
        .await;
    assert!(matches!(append, Err(WorkflowError::Forbidden { .. })));

    let replace = ctx
        .state
        .documents
        .replace(
            application.id,
            &other_applicant(),
            upload("Locational Clearance", "file.pdf"),
        )
        .await;
    assert!(matches!(replace, Err(WorkflowError::Forbidden { .. })));

    let listing = ctx
        .state
        .documents
        .list(application.id, &other_applicant())
        .await;
    assert!(matches!(listing, Err(WorkflowError::Forbidden { .. })));

    // Admin desks are not applicant-scoped.
    ctx.state
        .documents
        .list(application.id, &meo_admin())
        .await
        .expect("admin listing succeeds");
}

#[tokio::test]
async fn uploads_for_a_missing_application_report_not_found() {
    let ctx = TestContext::new();
    let result = ctx
        .state
        .documents
        .append(
            uuid::Uuid::new_v4(),
            &applicant(),
            upload("Locational Clearance", "file.pdf"),
        )
        .await;
    assert!(matches!(result, Err(WorkflowError::NotFound)));
}
