//! Inline banner image referenced by the welcome template.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Content-ID the template's `<img src="cid:...">` points at.
pub const BANNER_CID: &str = "orbit_banner";

/// Image bytes loaded once per run and embedded into every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_id: String,
    pub content_type: String,
    pub file_name: String,
    /// Kept for backends that attach by path (desktop client).
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    /// Read the banner at `path`. Returns `None` (with a warning) when it is
    /// missing or unreadable; messages then go out without it.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Banner image not loaded, emails will send without it");
                return None;
            }
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("banner")
            .to_string();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        info!(path = %path.display(), size = bytes.len(), "Banner image loaded");
        Some(Self {
            content_id: BANNER_CID.to_string(),
            content_type: content_type_for(&path).to_string(),
            file_name,
            path,
            bytes,
        })
    }
}

/// MIME type from the file extension; JPEG when unknown.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a/orbit_banner.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a/orbit_banner.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a/banner.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a/banner.gif")), "image/gif");
        assert_eq!(content_type_for(Path::new("a/banner")), "image/jpeg");
    }

    #[test]
    fn missing_banner_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InlineImage::load(&dir.path().join("nope.jpeg")).is_none());
    }

    #[test]
    fn loads_bytes_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbit_banner.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = InlineImage::load(&path).unwrap();
        assert_eq!(image.content_id, BANNER_CID);
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.file_name, "orbit_banner.png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
        assert!(image.path.is_absolute());
    }
}
