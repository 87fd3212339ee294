//! Sample record lifecycle, client submissions and the status rollback job.

mod common;

use assert_matches::assert_matches;
use sea_orm::EntityTrait;
use tradeflow::{
    entities::{sample_record, sample_submission, CompanyType, OpportunityStatus, SampleStatus, SubmissionStatus},
    errors::ServiceError,
    services::samples::{RollbackReport, SampleService},
};

use common::{
    insert_commodity, insert_company, insert_opportunity, insert_project, insert_sample,
    insert_submission, setup_db,
};

#[tokio::test]
async fn sample_moves_through_internal_review_and_client_decision() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Raw Cashew Nuts").await;
    let vendor = insert_company(&db, "Bouake Cashew Union", CompanyType::Vendor, None).await;
    let client = insert_company(&db, "Quang Nam Processing", CompanyType::Client, None).await;
    let project = insert_project(&db, &commodity, None).await;
    let opportunity =
        insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;
    let service = SampleService::new(db.clone(), None);

    let sample = service
        .request_sample(project.id, vendor.id, "SMP-CIV-01".to_string())
        .await
        .unwrap();
    assert_eq!(sample.status, SampleStatus::Requested);

    let err = service
        .submit_to_client(sample.id, opportunity.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    for next in [
        SampleStatus::Sent,
        SampleStatus::Received,
        SampleStatus::ResultApprovedInternal,
    ] {
        service.advance_sample(sample.id, next).await.unwrap();
    }
    let received = sample_record::Entity::find_by_id(sample.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(received.received_at.is_some());

    let submission = service
        .submit_to_client(sample.id, opportunity.id)
        .await
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);
    let sent = sample_record::Entity::find_by_id(sample.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sent.status, SampleStatus::SentToClient);

    let decided = service
        .record_client_decision(submission.id, SubmissionStatus::ClientApproved, Some("Good outturn".into()))
        .await
        .unwrap();
    assert!(decided.decided_at.is_some());
    let approved = sample_record::Entity::find_by_id(sample.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.status, SampleStatus::ClientApproved);
}

#[tokio::test]
async fn skipping_a_sample_state_is_rejected() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Turmeric").await;
    let vendor = insert_company(&db, "Erode Turmeric Traders", CompanyType::Vendor, None).await;
    let project = insert_project(&db, &commodity, None).await;
    let sample = insert_sample(&db, &project, &vendor, "SMP-T-9", SampleStatus::Requested).await;
    let service = SampleService::new(db.clone(), None);

    let err = service
        .advance_sample(sample.id, SampleStatus::Received)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn client_decision_must_be_a_verdict_and_is_final() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Robusta Coffee").await;
    let vendor = insert_company(&db, "Dak Lak Coffee", CompanyType::Vendor, None).await;
    let client = insert_company(&db, "Antwerp Roastery", CompanyType::Client, None).await;
    let project = insert_project(&db, &commodity, None).await;
    let sample = insert_sample(&db, &project, &vendor, "SMP-VN-2", SampleStatus::SentToClient).await;
    let opportunity =
        insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;
    let submission =
        insert_submission(&db, &sample, &opportunity, SubmissionStatus::Pending).await;
    let service = SampleService::new(db.clone(), None);

    let err = service
        .record_client_decision(submission.id, SubmissionStatus::Pending, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    service
        .record_client_decision(submission.id, SubmissionStatus::ClientRejected, None)
        .await
        .unwrap();
    let err = service
        .record_client_decision(submission.id, SubmissionStatus::ClientApproved, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn rollback_converges_client_facing_samples_and_is_idempotent() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Cashew Kernels W320").await;
    let vendor = insert_company(&db, "Kollam Kernels", CompanyType::Vendor, None).await;
    let client = insert_company(&db, "Rotterdam Nuts BV", CompanyType::Client, None).await;
    let project = insert_project(&db, &commodity, None).await;
    let opportunity =
        insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;

    let approved = insert_sample(&db, &project, &vendor, "SMP-A", SampleStatus::ClientApproved).await;
    let rejected = insert_sample(&db, &project, &vendor, "SMP-B", SampleStatus::ClientRejected).await;
    let sent = insert_sample(&db, &project, &vendor, "SMP-C", SampleStatus::SentToClient).await;
    let internal = insert_sample(&db, &project, &vendor, "SMP-D", SampleStatus::Received).await;

    insert_submission(&db, &approved, &opportunity, SubmissionStatus::ClientApproved).await;
    insert_submission(&db, &rejected, &opportunity, SubmissionStatus::ClientRejected).await;
    insert_submission(&db, &sent, &opportunity, SubmissionStatus::Pending).await;

    let service = SampleService::new(db.clone(), None);
    let first = service.rollback_sample_status().await.unwrap();
    assert_eq!(
        first,
        RollbackReport {
            samples: 3,
            submissions: 2
        }
    );

    let samples = sample_record::Entity::find().all(&*db).await.unwrap();
    for sample in &samples {
        if sample.id == internal.id {
            assert_eq!(sample.status, SampleStatus::Received);
        } else {
            assert_eq!(sample.status, SampleStatus::ResultApprovedInternal);
        }
    }
    let submissions = sample_submission::Entity::find().all(&*db).await.unwrap();
    assert!(submissions
        .iter()
        .all(|s| s.status == SubmissionStatus::Pending && s.decided_at.is_none()));

    let second = service.rollback_sample_status().await.unwrap();
    assert_eq!(second, RollbackReport::default());
    assert_eq!(
        sample_record::Entity::find().all(&*db).await.unwrap(),
        samples
    );
}

#[tokio::test]
async fn rollback_leaves_decisions_on_internal_samples_alone() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Green Cardamom 8mm").await;
    let vendor = insert_company(&db, "Idukki Estates", CompanyType::Vendor, None).await;
    let client = insert_company(&db, "Jeddah Trading Est", CompanyType::Client, None).await;
    let project = insert_project(&db, &commodity, None).await;
    let opportunity =
        insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;

    let mut client_facing = Vec::new();
    for idx in 0..40 {
        let sample = insert_sample(
            &db,
            &project,
            &vendor,
            &format!("SMP-CF-{idx}"),
            SampleStatus::ClientApproved,
        )
        .await;
        insert_submission(&db, &sample, &opportunity, SubmissionStatus::ClientApproved).await;
        client_facing.push(sample.id);
    }
    let internal = insert_sample(
        &db,
        &project,
        &vendor,
        "SMP-INT",
        SampleStatus::ResultApprovedInternal,
    )
    .await;
    let untouched =
        insert_submission(&db, &internal, &opportunity, SubmissionStatus::ClientRejected).await;

    let report = SampleService::new(db.clone(), None)
        .rollback_sample_status()
        .await
        .unwrap();
    assert_eq!(
        report,
        RollbackReport {
            samples: 40,
            submissions: 40
        }
    );

    let submissions = sample_submission::Entity::find().all(&*db).await.unwrap();
    for submission in &submissions {
        if submission.id == untouched.id {
            assert_eq!(submission.status, SubmissionStatus::ClientRejected);
        } else {
            assert!(client_facing.contains(&submission.sample_id));
            assert_eq!(submission.status, SubmissionStatus::Pending);
        }
    }
}
