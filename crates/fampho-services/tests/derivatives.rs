mod common;

use common::{jpeg, jpeg_upload, jpeg_with_exif, png, TestArchive};
use fampho_core::models::FileKind;
use fampho_core::AppError;
use fampho_processing::ImageProcessor;
use fampho_services::UploadedFile;
use fampho_storage::Storage;

#[tokio::test]
async fn rotation_never_mutates_the_source() {
    let t = TestArchive::new().await;
    let data = jpeg(80, 40, 1);
    let id = t.ingest_one(jpeg_upload("p.jpg", data.clone())).await;

    let before = t.archive.photos.files(id).await.unwrap();
    let original = before
        .iter()
        .find(|f| f.kind == FileKind::Original)
        .unwrap()
        .clone();

    let rotated = t.archive.derivatives.rotate(id, 90, None).await.unwrap();
    assert_eq!(rotated.kind, FileKind::Derivative);
    assert_eq!(rotated.derivative_type.as_deref(), Some("rotate_90"));
    assert_eq!(rotated.parent_file_id, Some(original.id));
    assert_eq!((rotated.width, rotated.height), (Some(40), Some(80)));
    assert_eq!(rotated.orientation, 1);
    assert_eq!(rotated.filename, format!("rotate_90_{}.jpg", id));
    assert_ne!(rotated.storage_key, original.storage_key);
    assert_ne!(rotated.sha256, original.sha256);

    let after = t.archive.photos.files(id).await.unwrap();
    let unchanged = after.iter().find(|f| f.id == original.id).unwrap();
    assert_eq!(unchanged, &original);
    assert_eq!(t.storage.get(&original.storage_key).await.unwrap(), data);
    assert_eq!(after.len(), before.len() + 1);
}

#[tokio::test]
async fn rotation_bakes_in_stored_orientation() {
    let t = TestArchive::new().await;
    let id = t
        .ingest_one(jpeg_upload(
            "side.jpg",
            jpeg_with_exif(60, 20, 6, "2010:01:01 00:00:00"),
        ))
        .await;

    let rotated = t.archive.derivatives.rotate(id, 180, None).await.unwrap();
    assert_eq!((rotated.width, rotated.height), (Some(20), Some(60)));

    let stored = t.storage.get(&rotated.storage_key).await.unwrap();
    let info = ImageProcessor::probe(&stored).unwrap();
    assert_eq!((info.width, info.height), (20, 60));
}

#[tokio::test]
async fn png_rotations_stay_png_and_can_chain() {
    let t = TestArchive::new().await;
    let id = t
        .ingest_one(UploadedFile::from_bytes("art.png", "image/png", png(30, 10, 2)))
        .await;

    let first = t.archive.derivatives.rotate(id, 90, None).await.unwrap();
    assert_eq!(first.mime_type, "image/png");
    assert!(first.filename.ends_with(".png"));

    let second = t
        .archive
        .derivatives
        .rotate(id, 270, Some(first.id))
        .await
        .unwrap();
    assert_eq!(second.parent_file_id, Some(first.id));
    assert_eq!((second.width, second.height), (Some(30), Some(10)));
}

#[tokio::test]
async fn rotation_input_errors() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("p.jpg", jpeg(10, 10, 3))).await;
    let other = t.ingest_one(jpeg_upload("q.jpg", jpeg(10, 10, 4))).await;
    let other_file = t.archive.photos.files(other).await.unwrap()[0].id;

    assert!(matches!(
        t.archive.derivatives.rotate(id, 45, None).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        t.archive.derivatives.rotate(id, 90, Some(other_file)).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        t.archive
            .derivatives
            .rotate(uuid::Uuid::new_v4(), 90, None)
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn missing_source_blob_fails_the_rotation() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("p.jpg", jpeg(10, 10, 5))).await;
    let source = t
        .archive
        .derivatives
        .primary_file(id)
        .await
        .unwrap()
        .unwrap();
    t.storage.delete(&source.storage_key).await.unwrap();

    assert!(t.archive.derivatives.rotate(id, 90, None).await.is_err());
    let derived = t
        .archive
        .photos
        .files(id)
        .await
        .unwrap()
        .into_iter()
        .filter(|f| f.kind == FileKind::Derivative)
        .count();
    assert_eq!(derived, 0);
}

#[tokio::test]
async fn preview_fits_bounding_box() {
    let t = TestArchive::new().await;
    let id = t.ingest_one(jpeg_upload("wide.jpg", jpeg(2400, 600, 6))).await;

    let preview = t.archive.derivatives.generate_preview(id, None).await.unwrap();
    assert_eq!(preview.kind, FileKind::Preview);
    assert_eq!((preview.width, preview.height), (Some(1920), Some(480)));
    assert_eq!(preview.filename, format!("preview_{}.jpg", id));
    assert_eq!(preview.mime_type, "image/jpeg");

    let stored = t.storage.get(&preview.storage_key).await.unwrap();
    assert_eq!(preview.bytes, stored.len() as i64);
}
