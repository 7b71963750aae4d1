mod common;

use common::{jpeg, jpeg_upload, TestArchive};
use fampho_core::models::{MetadataUpdate, PhotoState, TriageAction};
use fampho_core::AppError;
use fampho_services::FileOutcome;

#[tokio::test]
async fn upload_dedup_triage_complete() {
    let t = TestArchive::new().await;
    let bytes = jpeg(64, 48, 1);

    let first = t.ingest(vec![jpeg_upload("photoA.jpg", bytes.clone())]).await;
    assert_eq!((first.uploaded, first.duplicates, first.errors), (1, 0, 0));
    let FileOutcome::Success { photo_id, file_id, .. } = first.results[0].outcome else {
        panic!("expected success: {:?}", first.results[0]);
    };

    let photo = t.archive.photos.get(photo_id).await.unwrap();
    assert_eq!(photo.current_state, PhotoState::Triage);

    let second = t
        .ingest(vec![jpeg_upload("photoA_copy.jpg", bytes.clone())])
        .await;
    assert_eq!((second.uploaded, second.duplicates, second.errors), (0, 1, 0));
    assert_eq!(
        second.results[0].outcome,
        FileOutcome::Duplicate {
            existing_photo_id: photo_id,
            existing_file_id: file_id,
        }
    );
    let all = t
        .archive
        .photos
        .list(t.library, None, None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    let kept = t
        .archive
        .workflow
        .triage_action(photo_id, TriageAction::Keep, t.uploader, None, None)
        .await
        .unwrap();
    assert_eq!(kept.current_state, PhotoState::MetadataEntry);

    t.archive
        .photos
        .update_metadata(
            photo_id,
            t.uploader,
            MetadataUpdate {
                date_taken: Some("1994-12-25T08:00:00Z".to_string()),
                location_text: Some("Living room".to_string()),
                description: Some("Christmas morning".to_string()),
            },
        )
        .await
        .unwrap();

    let done = t
        .archive
        .workflow
        .complete_metadata_entry(photo_id, t.uploader)
        .await
        .unwrap();
    assert_eq!(done.current_state, PhotoState::Complete);
    assert_eq!(done.location_text.as_deref(), Some("Living room"));

    let history = t.archive.workflow.history(photo_id).await.unwrap();
    let path: Vec<_> = history.iter().map(|e| (e.from_state, e.to_state)).collect();
    assert_eq!(
        path,
        vec![
            (PhotoState::Uploaded, PhotoState::Triage),
            (PhotoState::Triage, PhotoState::MetadataEntry),
            (PhotoState::MetadataEntry, PhotoState::Complete),
        ]
    );
    assert_eq!(
        history
            .iter()
            .filter(|e| e.to_state == PhotoState::Complete)
            .count(),
        1
    );
}

#[tokio::test]
async fn discard_then_undo_moves_between_queues() {
    let t = TestArchive::new().await;
    let a = t.ingest_one(jpeg_upload("a.jpg", jpeg(20, 20, 1))).await;
    let b = t.ingest_one(jpeg_upload("b.jpg", jpeg(20, 20, 2))).await;

    t.archive
        .workflow
        .triage_action(b, TriageAction::Duplicate, t.uploader, None, Some(a))
        .await
        .unwrap();

    let queues = t.archive.workflow.work_queues(t.library).await.unwrap();
    assert_eq!(queues.triage.count, 1);
    assert_eq!(queues.triage.sample[0].id, a);
    assert_eq!(queues.rejected_count, 1);

    let rejected = t
        .archive
        .workflow
        .rejected_queue(t.library, None, None)
        .await
        .unwrap();
    assert_eq!(rejected.photos[0].id, b);

    t.archive
        .workflow
        .undo_discard(b, t.uploader, None)
        .await
        .unwrap();
    let queues = t.archive.workflow.work_queues(t.library).await.unwrap();
    assert_eq!(queues.triage.count, 2);
    assert_eq!(queues.rejected_count, 0);
}

#[tokio::test]
async fn transition_from_wrong_state_leaves_photo_alone() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("a.jpg", jpeg(16, 16, 3))).await;
    t.archive
        .workflow
        .triage_action(id, TriageAction::Keep, t.uploader, None, None)
        .await
        .unwrap();

    let err = t
        .archive
        .workflow
        .transition(id, PhotoState::Triage, PhotoState::Complete, t.uploader, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::StateConflict {
            expected: PhotoState::Triage,
            actual: PhotoState::MetadataEntry,
            ..
        }
    ));
    assert_eq!(
        t.archive.photos.get(id).await.unwrap().current_state,
        PhotoState::MetadataEntry
    );
    assert_eq!(t.archive.workflow.history(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn deleted_photo_is_gone_everywhere() {
    let t = TestArchive::new().await;
    let bytes = jpeg(16, 16, 9);
    let id = t.ingest_one(jpeg_upload("a.jpg", bytes.clone())).await;

    t.archive.photos.soft_delete(id, t.uploader).await.unwrap();

    assert!(matches!(
        t.archive.photos.get(id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        t.archive.workflow.history(id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        t.archive.derivatives.rotate(id, 90, None).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(
        t.archive
            .workflow
            .work_queues(t.library)
            .await
            .unwrap()
            .triage
            .count,
        0
    );

    // Soft deletion keeps the registry entry, so the bytes are still known.
    let report = t.ingest(vec![jpeg_upload("again.jpg", bytes)]).await;
    assert_eq!((report.uploaded, report.duplicates), (0, 1));
    assert!(matches!(
        report.results[0].outcome,
        FileOutcome::Duplicate { existing_photo_id, .. } if existing_photo_id == id
    ));
}
