//! Image preview handles.
//!
//! Previews are spilled to named temp files so external viewers can open
//! them. Every handle is owned by this table, keyed by record identity;
//! replacing or releasing a key deletes the old file immediately, and
//! dropping the whole store deletes whatever is left. Nothing relies on
//! process exit for cleanup.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use custommarket_io::file_extension;
use tempfile::NamedTempFile;

use crate::record::RecordKey;

#[derive(Default)]
pub struct PreviewStore {
    handles: HashMap<RecordKey, NamedTempFile>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write preview bytes for a record, replacing (and deleting) any
    /// previous preview under the same key. The file keeps the source
    /// extension so viewers can recognize the format.
    pub fn acquire(
        &mut self,
        key: RecordKey,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        let ext = file_extension(filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix("cmk-preview-");
        let suffix = format!(".{}", ext);
        if !ext.is_empty() {
            builder.suffix(&suffix);
        }

        let mut handle = builder.tempfile()?;
        handle.write_all(bytes)?;
        handle.flush()?;

        let path = handle.path().to_path_buf();
        // Insert drops the displaced handle, which unlinks its file.
        self.handles.insert(key, handle);
        Ok(path)
    }

    pub fn path(&self, key: RecordKey) -> Option<&Path> {
        self.handles.get(&key).map(|h| h.path())
    }

    /// Delete the preview for a record. Returns whether one existed.
    pub fn release(&mut self, key: RecordKey) -> bool {
        self.handles.remove(&key).is_some()
    }

    /// Move a preview to a new identity (pending record got its server id).
    pub fn rekey(&mut self, from: RecordKey, to: RecordKey) {
        if let Some(handle) = self.handles.remove(&from) {
            self.handles.insert(to, handle);
        }
    }

    /// Delete every preview.
    pub fn clear(&mut self) {
        self.handles.clear();
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
