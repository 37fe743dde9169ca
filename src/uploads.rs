//! Cover image processing.
//!
//! Uploaded covers are decoded, downsized when wider than the configured
//! bound, re-encoded as WebP and written to the uploads directory under a
//! generated name. Replaced or orphaned files are never removed.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` with format guessing |
//! | Resize | `image::DynamicImage::resize` with `Lanczos3` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | File name | `uuid` v4 prefix + sanitized original name |

use std::fs;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

use ::image::codecs::webp::WebPEncoder;
use ::image::imageops::FilterType;
use ::image::{DynamicImage, ImageReader};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("could not encode image: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns an uploaded file into a stored image and returns its file name.
pub trait ImageProcessor: Send + Sync {
    fn process(&self, upload: &Upload) -> Result<String, ImageError>;
}

/// Pure Rust WebP processor writing into a local directory.
pub struct WebpProcessor {
    uploads_dir: PathBuf,
    max_width: u32,
}

impl WebpProcessor {
    pub fn new(uploads_dir: impl Into<PathBuf>, max_width: u32) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_width,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}

impl ImageProcessor for WebpProcessor {
    fn process(&self, upload: &Upload) -> Result<String, ImageError> {
        let img = ImageReader::new(Cursor::new(upload.bytes.as_slice()))
            .with_guessed_format()?
            .decode()
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let img = if self.max_width > 0 && img.width() > self.max_width {
            img.resize(self.max_width, img.height(), FilterType::Lanczos3)
        } else {
            img
        };

        fs::create_dir_all(&self.uploads_dir)?;
        let file_name = stored_name(&upload.file_name);
        let path = self.uploads_dir.join(&file_name);

        let writer = BufWriter::new(fs::File::create(&path)?);
        DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(writer))
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        debug!("Stored {}x{} cover at {}", img.width(), img.height(), path.display());
        Ok(file_name)
    }
}

/// `<uuid>-<original name, lowercased and sanitized>.webp`
pub fn stored_name(original: &str) -> String {
    format!("{}-{}.webp", Uuid::new_v4().simple(), sanitize(original))
}

fn sanitize(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
