mod common;

use common::{jpeg, jpeg_upload, TestArchive};
use fampho_core::models::{PhotoState, TriageAction};
use fampho_core::AppError;
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_completion_has_a_single_winner() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("a.jpg", jpeg(32, 32, 1))).await;
    t.archive
        .workflow
        .triage_action(id, TriageAction::Keep, t.uploader, None, None)
        .await
        .unwrap();

    let attempts = (0..3).map(|_| {
        let workflow = t.archive.workflow.clone();
        let actor = t.uploader;
        tokio::spawn(async move { workflow.complete_metadata_entry(id, actor).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(
                err,
                AppError::StateConflict { .. } | AppError::InvalidState { .. }
            ),
            "unexpected error: {err}"
        );
    }

    assert_eq!(
        t.archive.photos.get(id).await.unwrap().current_state,
        PhotoState::Complete
    );
    let completions = t
        .archive
        .workflow
        .history(id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.to_state == PhotoState::Complete)
        .count();
    assert_eq!(completions, 1);
}

#[tokio::test]
async fn racing_triage_decisions_do_not_overwrite_each_other() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("a.jpg", jpeg(32, 32, 2))).await;

    let keep = t
        .archive
        .workflow
        .triage_action(id, TriageAction::Keep, t.uploader, None, None);
    let discard = t
        .archive
        .workflow
        .triage_action(id, TriageAction::Discard, t.uploader, None, None);
    let (keep, discard) = futures::join!(keep, discard);

    assert!(keep.is_ok() ^ discard.is_ok());
    let loser = keep.err().or(discard.err()).unwrap();
    assert!(loser.is_state_conflict());
    assert_eq!(t.archive.workflow.history(id).await.unwrap().len(), 2);
}
