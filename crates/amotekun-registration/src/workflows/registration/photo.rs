use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use tracing::{debug, warn};

/// Message shown to the applicant whenever a photo cannot be processed.
pub const PHOTO_FAILURE_MESSAGE: &str = "Failed to process photo. Please try a different image.";

const INITIAL_QUALITY: u8 = 85;
const MIN_QUALITY: u8 = 45;
const QUALITY_STEP: u8 = 10;
const MIN_DIMENSION: u32 = 96;

/// Output limits for uploaded passport photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    pub max_bytes: usize,
    pub max_dimension: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_bytes: 200 * 1024,
            max_dimension: 800,
        }
    }
}

/// A photo that fits the configured limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: mime::Mime,
    pub width: u32,
    pub height: u32,
}

impl CompressedPhoto {
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type.essence_str(),
            STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("no image data was provided")]
    Empty,
    #[error("file is not a supported image format")]
    UnsupportedFormat,
    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("image could not be resized: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),
    #[error("compression worker failed: {0}")]
    Worker(String),
    #[error("photo is not a base64 image data URI")]
    InvalidDataUri,
}

/// Reads the image bytes back out of a `data:image/...;base64,` URI, the form
/// in which the photo travels inside a submitted payload.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, PhotoError> {
    let (header, data) = uri
        .trim()
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(PhotoError::InvalidDataUri)?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or(PhotoError::InvalidDataUri)?;
    if !media_type.starts_with("image/") {
        return Err(PhotoError::InvalidDataUri);
    }
    STANDARD
        .decode(data)
        .map_err(|_| PhotoError::InvalidDataUri)
}

/// Shrinks an uploaded photo before it is attached to the draft.
#[async_trait]
pub trait PhotoCompressor: Send + Sync {
    async fn compress(
        &self,
        bytes: Vec<u8>,
        options: CompressionOptions,
    ) -> Result<CompressedPhoto, PhotoError>;
}

/// Compressor backed by the `image` and `fast_image_resize` crates. Work runs
/// on the blocking pool so the caller's executor keeps serving events.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegPhotoCompressor;

#[async_trait]
impl PhotoCompressor for JpegPhotoCompressor {
    async fn compress(
        &self,
        bytes: Vec<u8>,
        options: CompressionOptions,
    ) -> Result<CompressedPhoto, PhotoError> {
        tokio::task::spawn_blocking(move || compress_to_jpeg(&bytes, options))
            .await
            .map_err(|err| PhotoError::Worker(err.to_string()))?
    }
}

/// Decodes, downsizes and re-encodes as JPEG until the output fits
/// `options.max_bytes`. When even the smallest attempt is too large the
/// smallest attempt is returned.
pub fn compress_to_jpeg(
    bytes: &[u8],
    options: CompressionOptions,
) -> Result<CompressedPhoto, PhotoError> {
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    let format = image::guess_format(bytes).map_err(|_| PhotoError::UnsupportedFormat)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let source = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut target = options.max_dimension.max(1);
    let mut smallest: Option<CompressedPhoto> = None;

    loop {
        let resized = resize_within(&source, target)?;

        let mut quality = INITIAL_QUALITY;
        loop {
            let encoded = encode_jpeg(&resized, quality)?;
            debug!(
                width = resized.width(),
                height = resized.height(),
                quality,
                bytes = encoded.len(),
                "photo compression attempt"
            );
            let candidate = CompressedPhoto {
                bytes: encoded,
                content_type: mime::IMAGE_JPEG,
                width: resized.width(),
                height: resized.height(),
            };
            if candidate.bytes.len() <= options.max_bytes {
                return Ok(candidate);
            }
            if smallest
                .as_ref()
                .map_or(true, |best| candidate.bytes.len() < best.bytes.len())
            {
                smallest = Some(candidate);
            }
            if quality <= MIN_QUALITY {
                break;
            }
            quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
        }

        let longest = resized.width().max(resized.height());
        if longest <= MIN_DIMENSION {
            break;
        }
        target = (longest * 3 / 4).max(MIN_DIMENSION);
    }

    warn!(
        max_bytes = options.max_bytes,
        "photo could not be compressed under the size limit; keeping smallest attempt"
    );
    smallest.ok_or(PhotoError::UnsupportedFormat)
}

fn resize_within(source: &DynamicImage, max_dimension: u32) -> Result<DynamicImage, PhotoError> {
    let (src_width, src_height) = (source.width(), source.height());
    let scale = (max_dimension as f32 / src_width.max(src_height) as f32).min(1.0);
    if scale >= 1.0 {
        return Ok(source.clone());
    }

    let dst_width = ((src_width as f32 * scale) as u32).max(1);
    let dst_height = ((src_height as f32 * scale) as u32).max(1);
    let mut resized = DynamicImage::new(dst_width, dst_height, ColorType::Rgb8);

    let mut resizer = fast_image_resize::Resizer::new();
    resizer.resize(
        source,
        &mut resized,
        Some(&fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Convolution(fast_image_resize::FilterType::Lanczos3),
        )),
    )?;

    Ok(resized)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image.write_with_encoder(encoder)?;
    Ok(buffer)
}
