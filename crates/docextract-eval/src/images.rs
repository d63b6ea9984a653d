//! Page image loading for vision extraction.
//!
//! Scanned documents are expected as one image per page in a directory, named
//! so that lexical order is page order (e.g. `invoice.pdf.Page-001.jpg`,
//! `invoice.pdf.Page-002.jpg`, ...). Each image is sent to the model as a
//! base64 `data:` URI.
//!
//! ```no_run
//! use docextract_eval::images::load_images;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let pages = load_images(Path::new("scans/invoice"))?;
//! let uris: Vec<String> = pages.iter().map(|p| p.data_uri()).collect();
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use base64::Engine;
use std::path::Path;
use tracing::{debug, warn};

/// A page image ready to be sent to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// File name the image was loaded from
    pub file_name: String,
    /// MIME type detected from the image bytes (e.g. `image/jpeg`)
    pub content_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl PageImage {
    /// Build a page image, detecting its content type from magic bytes.
    ///
    /// Returns `None` when the bytes are not a recognised image format.
    #[must_use = "returns the page image if the bytes are an image"]
    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>) -> Option<Self> {
        let kind = infer::get(&data)?;
        if !kind.mime_type().starts_with("image/") {
            return None;
        }

        Some(Self {
            file_name: file_name.into(),
            content_type: kind.mime_type().to_string(),
            data,
        })
    }

    /// Encode the image as a `data:<mime>;base64,<payload>` URI.
    #[must_use = "returns the encoded data URI"]
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{encoded}", self.content_type)
    }

    /// Size in bytes.
    #[inline]
    #[must_use = "returns image size in bytes"]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Load every image in `dir`, ordered by file name.
///
/// Non-image files are skipped. Files that cannot be read are logged and
/// skipped so one bad page does not abort the document.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn load_images(dir: &Path) -> Result<Vec<PageImage>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read image directory {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Error loading image {}: {}", file_name, e);
                continue;
            }
        };

        match PageImage::from_bytes(file_name.clone(), data) {
            Some(image) => {
                debug!("Loaded {} ({}, {} KB)", file_name, image.content_type, image.size() / 1024);
                images.push(image);
            }
            None => debug!("Skipping non-image file {}", file_name),
        }
    }

    Ok(images)
}
