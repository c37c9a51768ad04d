//! Album art thumbnail adapter
//!
//! Turns a borrowed image buffer into the platform's thumbnail reference.
//! The bytes are forwarded as-is; the declared MIME type is only compared
//! against the sniffed content for diagnostics.

use crate::platform::PlatformSession;
use image::ImageFormat;
use nowplay_core::AlbumArt;
use tracing::{debug, warn};

/// Outcome of comparing the declared MIME type with the image content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatCheck {
    Match(ImageFormat),
    Mismatch {
        declared: ImageFormat,
        detected: ImageFormat,
    },
    /// Either the MIME type or the content was not recognised
    Unknown,
}

/// Map a MIME type string to an image format, tolerating case and common aliases
pub fn declared_format(mime_type: &str) -> Option<ImageFormat> {
    let mime = mime_type.trim().to_ascii_lowercase();
    let mime = match mime.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        "image/x-png" => "image/png",
        other => other,
    };
    ImageFormat::from_mime_type(mime)
}

pub fn check_format(art: AlbumArt<'_>) -> FormatCheck {
    let declared = declared_format(art.mime_type);
    let detected = image::guess_format(art.bytes).ok();

    match (declared, detected) {
        (Some(declared), Some(detected)) if declared == detected => FormatCheck::Match(declared),
        (Some(declared), Some(detected)) => FormatCheck::Mismatch { declared, detected },
        _ => FormatCheck::Unknown,
    }
}

/// Build a thumbnail for `art`, or `None` when the buffer is empty or the platform refuses it
pub fn create_thumbnail<S: PlatformSession>(session: &S, art: AlbumArt<'_>) -> Option<S::Thumbnail> {
    if art.is_empty() {
        return None;
    }

    match check_format(art) {
        FormatCheck::Match(format) => debug!("Album art format: {:?}", format),
        FormatCheck::Mismatch { declared, detected } => warn!(
            "Album art declared as {} ({:?}) but content looks like {:?}, passing through unchanged",
            art.mime_type, declared, detected
        ),
        FormatCheck::Unknown => debug!("Album art format not recognised (declared {})", art.mime_type),
    }

    match session.create_thumbnail(art) {
        Ok(thumbnail) => Some(thumbnail),
        Err(e) => {
            warn!("Failed to create thumbnail for album art: {}", e);
            None
        }
    }
}
