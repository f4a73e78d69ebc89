use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions (compared case-insensitively) the classification service accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Looks at the text after the last `.` of the file name, so a bare
/// `.png` counts as a PNG even though `Path::extension` sees no extension.
pub fn has_image_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub path: PathBuf,
}

impl CandidateItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_eligible(&self) -> bool {
        has_image_extension(&self.path)
    }
}
