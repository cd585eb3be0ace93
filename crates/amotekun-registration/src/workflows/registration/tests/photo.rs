use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::common::*;
use crate::workflows::registration::domain::{FieldInputError, FieldName};
use crate::workflows::registration::photo::{
    compress_to_jpeg, decode_data_uri, CompressionOptions, JpegPhotoCompressor, PhotoCompressor, PhotoError,
    PHOTO_FAILURE_MESSAGE,
};
use crate::workflows::registration::policy::RegistrationPolicy;
use crate::workflows::registration::workflow::{PhotoCommit, RegistrationWorkflow, WorkflowError};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) * 255 / (width + height)) as u8,
        ])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("png encodes");
    buffer.into_inner()
}

#[tokio::test]
async fn large_upload_is_downsized_and_reencoded_as_jpeg() {
    let original = png_bytes(1600, 1200);
    let options = CompressionOptions::default();

    let photo = JpegPhotoCompressor
        .compress(original, options)
        .await
        .expect("photo compresses");

    assert!(photo.bytes.len() <= options.max_bytes);
    assert_eq!((photo.width, photo.height), (800, 600));
    assert_eq!(photo.content_type, mime::IMAGE_JPEG);
    assert_eq!(&photo.bytes[..2], &[0xFF_u8, 0xD8]);
    assert!(photo.data_uri().starts_with("data:image/jpeg;base64,"));
}

#[test]
fn small_upload_keeps_its_dimensions() {
    let photo = compress_to_jpeg(&png_bytes(40, 30), CompressionOptions::default())
        .expect("photo compresses");
    assert_eq!((photo.width, photo.height), (40, 30));
}

#[test]
fn unreachable_size_limit_returns_best_effort() {
    let options = CompressionOptions {
        max_bytes: 1,
        max_dimension: 800,
    };
    let photo = compress_to_jpeg(&png_bytes(400, 300), options).expect("best effort result");
    assert!(photo.width.max(photo.height) < 400);
    assert_eq!(&photo.bytes[..2], &[0xFF_u8, 0xD8]);
}

#[test]
fn undecodable_input_is_rejected() {
    assert!(matches!(
        compress_to_jpeg(b"definitely not an image", CompressionOptions::default()),
        Err(PhotoError::UnsupportedFormat)
    ));
    assert!(matches!(
        compress_to_jpeg(&[], CompressionOptions::default()),
        Err(PhotoError::Empty)
    ));
}

#[test]
fn data_uri_decodes_back_to_the_photo_bytes() {
    let photo = small_photo(9);
    assert_eq!(
        decode_data_uri(&photo.data_uri()).expect("valid data uri"),
        photo.bytes
    );

    for invalid in [
        "photo.jpg",
        "data:image/jpeg,rawbytes",
        "data:text/plain;base64,QUJD",
        "data:image/jpeg;base64,@@@",
    ] {
        assert!(
            matches!(decode_data_uri(invalid), Err(PhotoError::InvalidDataUri)),
            "{invalid} should be rejected"
        );
    }
}

#[test]
fn latest_upload_wins_regardless_of_completion_order() {
    let mut workflow = open_workflow();
    let first = workflow.begin_photo().expect("editable");
    let second = workflow.begin_photo().expect("editable");

    assert_eq!(
        workflow
            .commit_photo(second, Ok(small_photo(2)))
            .expect("commit succeeds"),
        PhotoCommit::Applied
    );
    assert_eq!(
        workflow
            .commit_photo(first, Ok(small_photo(1)))
            .expect("stale result is ignored"),
        PhotoCommit::Stale
    );

    let expected = small_photo(2).data_uri();
    assert_eq!(workflow.photo_preview(), Some(expected.as_str()));
    assert_eq!(workflow.draft().passport_photo.as_deref(), Some(expected.as_str()));
}

#[test]
fn earlier_upload_finishing_first_is_still_discarded() {
    let mut workflow = open_workflow();
    let first = workflow.begin_photo().expect("editable");
    let second = workflow.begin_photo().expect("editable");

    assert_eq!(
        workflow
            .commit_photo(first, Ok(small_photo(1)))
            .expect("stale result is ignored"),
        PhotoCommit::Stale
    );
    assert!(workflow.photo_preview().is_none());

    workflow
        .commit_photo(second, Ok(small_photo(2)))
        .expect("commit succeeds");
    assert_eq!(
        workflow.photo_preview(),
        Some(small_photo(2).data_uri().as_str())
    );
}

#[tokio::test]
async fn failed_compression_keeps_previous_photo() {
    let mut workflow = open_workflow();
    workflow
        .attach_photo(vec![1], &FixedCompressor { marker: Some(7) })
        .await
        .expect("first photo attaches");
    let previous = workflow.draft().passport_photo.clone();

    match workflow
        .attach_photo(vec![2], &FixedCompressor { marker: None })
        .await
    {
        Err(WorkflowError::Photo(PhotoError::UnsupportedFormat)) => {}
        other => panic!("expected photo failure, got {other:?}"),
    }

    assert_eq!(workflow.photo_error(), Some(PHOTO_FAILURE_MESSAGE));
    assert_eq!(workflow.draft().passport_photo, previous);
    assert_eq!(workflow.photo_preview(), previous.as_deref());

    workflow
        .attach_photo(vec![3], &FixedCompressor { marker: Some(8) })
        .await
        .expect("next photo attaches");
    assert!(workflow.photo_error().is_none());
}

#[test]
fn result_arriving_after_review_started_is_discarded() {
    let mut workflow = filled_workflow();
    let ticket = workflow.begin_photo().expect("editable");
    workflow.request_review().expect("draft is valid");

    assert_eq!(
        workflow
            .commit_photo(ticket, Ok(small_photo(3)))
            .expect("stale result is ignored"),
        PhotoCommit::Stale
    );
    assert!(workflow.draft().passport_photo.is_none());
}

#[test]
fn photo_cannot_be_set_as_plain_text() {
    let mut workflow = open_workflow();
    match workflow.update_field(FieldName::PassportPhoto, "data:image/png;base64,AAAA") {
        Err(WorkflowError::Input(FieldInputError::ReadOnly { field })) => {
            assert_eq!(field, FieldName::PassportPhoto)
        }
        other => panic!("expected read-only rejection, got {other:?}"),
    }
    assert!(workflow.draft().passport_photo.is_none());
}

#[tokio::test]
async fn attaching_a_photo_clears_its_required_error() {
    let mut policy = RegistrationPolicy::default();
    policy.required_fields.insert(FieldName::PassportPhoto);
    let mut workflow = RegistrationWorkflow::mount(policy, today(), false);

    assert!(workflow.validate().contains(FieldName::PassportPhoto));
    workflow
        .attach_photo(vec![1], &FixedCompressor { marker: Some(1) })
        .await
        .expect("photo attaches");
    assert!(!workflow.errors().contains(FieldName::PassportPhoto));
}
