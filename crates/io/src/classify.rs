//! File classification: image, tabular, or unsupported.
//!
//! Classification is pure and total. Unsupported files are still accepted
//! and stored upstream; they just produce no grid or preview.

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];
const TABULAR_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// What kind of content a file holds, as far as this layer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Tabular,
    Unsupported,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Tabular => "tabular",
            FileKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final dot-separated segment of a filename, lowercased.
/// A name with no dots is its own segment ("csv" has extension "csv").
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Classify by MIME type and filename.
///
/// A `image/*` MIME prefix or an image extension means image; an
/// xlsx/xls/csv extension means tabular; anything else is unsupported.
pub fn classify(filename: &str, mime: Option<&str>) -> FileKind {
    if mime.is_some_and(|m| m.starts_with("image/")) {
        return FileKind::Image;
    }
    let ext = file_extension(filename);
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Image
    } else if TABULAR_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Tabular
    } else {
        FileKind::Unsupported
    }
}
