//! Library records and the per-item upload state machine.
//!
//! Every file the user adds becomes a [`FileRecord`] immediately, before
//! the server has seen it. The record carries a client-generated
//! `local_id` that never changes, so callers can track an item across
//! the whole upload lifecycle even though its server id arrives late.

use custommarket_core::Grid;
use custommarket_io::{classify, FileKind};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Record identity
// ---------------------------------------------------------------------------

/// Stable identity for a record: the server id once one exists, the
/// client-generated id before that. Selection and collapse state are
/// keyed by this, so they survive the pending-to-persisted transition
/// (callers rekey, see `Workbench::reconcile_upload`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Remote(i64),
    Local(Uuid),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Remote(id) => write!(f, "{}", id),
            RecordKey::Local(id) => write!(f, "local:{}", id),
        }
    }
}

// ---------------------------------------------------------------------------
// Upload lifecycle
// ---------------------------------------------------------------------------

/// Per-item upload lifecycle.
///
/// `Added → Uploading → Persisted` is the happy path. `Failed` is
/// terminal for the attempt but not for the record: `begin_upload`
/// accepts it again, so a failed item can be retried in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Present locally, not yet sent.
    Added,
    /// In an outstanding upload request.
    Uploading,
    /// The server owns it.
    Persisted,
    /// The upload attempt did not produce a server record.
    Failed { reason: String },
}

impl UploadState {
    pub fn is_pending(&self) -> bool {
        !matches!(self, UploadState::Persisted)
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadState::Added => write!(f, "added"),
            UploadState::Uploading => write!(f, "uploading"),
            UploadState::Persisted => write!(f, "persisted"),
            UploadState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// One file in the library, local or persisted.
///
/// The grid is the parsed content for tabular files and empty for
/// images and unsupported files. It is never re-derived from the raw
/// bytes after construction; edits mutate it directly.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub local_id: Uuid,
    pub remote_id: Option<i64>,
    pub filename: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub tab_id: Option<i64>,
    pub kind: FileKind,
    pub grid: Grid,
    pub notes: String,
    pub state: UploadState,
}

impl FileRecord {
    /// A freshly added local record, not yet uploaded.
    pub fn pending(
        filename: String,
        mime_type: Option<String>,
        size: u64,
        grid: Grid,
        tab_id: Option<i64>,
    ) -> Self {
        let kind = classify(&filename, mime_type.as_deref());
        FileRecord {
            local_id: Uuid::new_v4(),
            remote_id: None,
            filename,
            mime_type,
            size: Some(size),
            tab_id,
            kind,
            grid,
            notes: String::new(),
            state: UploadState::Added,
        }
    }

    /// A record reported by the server (listing or upload response).
    pub fn from_wire(wire: custommarket_protocol::FileRecord) -> Self {
        let kind = classify(&wire.filename, wire.mime_type.as_deref());
        let grid = match wire.parsed_data {
            Some(rows) => Grid::new(rows),
            None => Grid::empty(),
        };
        FileRecord {
            local_id: Uuid::new_v4(),
            remote_id: Some(wire.id),
            filename: wire.filename,
            mime_type: wire.mime_type,
            size: wire.size,
            tab_id: wire.tab_id,
            kind,
            grid,
            notes: wire.notes,
            state: UploadState::Persisted,
        }
    }

    pub fn key(&self) -> RecordKey {
        match self.remote_id {
            Some(id) => RecordKey::Remote(id),
            None => RecordKey::Local(self.local_id),
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.state, UploadState::Persisted)
    }

    /// Move into `Uploading`. Only `Added` and `Failed` records start an
    /// upload; anything else is left alone and `false` comes back.
    pub fn begin_upload(&mut self) -> bool {
        match self.state {
            UploadState::Added | UploadState::Failed { .. } => {
                self.state = UploadState::Uploading;
                true
            }
            _ => false,
        }
    }

    /// Adopt the server's record for this item. The local grid and notes
    /// are replaced by what the server stored; `local_id` is kept so the
    /// caller can still correlate.
    pub fn mark_persisted(&mut self, wire: custommarket_protocol::FileRecord) {
        self.remote_id = Some(wire.id);
        self.filename = wire.filename;
        self.mime_type = wire.mime_type;
        self.size = wire.size;
        self.tab_id = wire.tab_id;
        self.kind = classify(&self.filename, self.mime_type.as_deref());
        if let Some(rows) = wire.parsed_data {
            self.grid = Grid::new(rows);
        }
        self.notes = wire.notes;
        self.state = UploadState::Persisted;
    }

    pub fn mark_failed(&mut self, reason: String) {
        self.state = UploadState::Failed { reason };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_csv(name: &str) -> FileRecord {
        FileRecord::pending(
            name.to_string(),
            Some("text/csv".to_string()),
            12,
            Grid::new(vec![vec!["h".into()], vec!["1".into()]]),
            None,
        )
    }

    #[test]
    fn pending_record_starts_added_with_local_key() {
        let rec = pending_csv("a.csv");
        assert_eq!(rec.state, UploadState::Added);
        assert_eq!(rec.kind, FileKind::Tabular);
        assert_eq!(rec.key(), RecordKey::Local(rec.local_id));
        assert!(rec.state.is_pending());
    }

    #[test]
    fn happy_path_added_uploading_persisted() {
        let mut rec = pending_csv("a.csv");
        assert!(rec.begin_upload());
        assert_eq!(rec.state, UploadState::Uploading);

        rec.mark_persisted(custommarket_protocol::FileRecord {
            id: 17,
            document_id: String::new(),
            filename: "a.csv".into(),
            storage_path: String::new(),
            mime_type: Some("text/csv".into()),
            size: Some(12),
            tab_id: Some(2),
            parsed_data: Some(vec![vec!["h".into()], vec!["1".into()]]),
            notes: String::new(),
        });

        assert!(rec.is_persisted());
        assert_eq!(rec.key(), RecordKey::Remote(17));
        assert_eq!(rec.tab_id, Some(2));
    }

    #[test]
    fn persisted_record_does_not_restart_upload() {
        let mut rec = pending_csv("a.csv");
        rec.begin_upload();
        rec.mark_persisted(custommarket_protocol::FileRecord {
            id: 1,
            document_id: String::new(),
            filename: "a.csv".into(),
            storage_path: String::new(),
            mime_type: None,
            size: None,
            tab_id: None,
            parsed_data: None,
            notes: String::new(),
        });
        assert!(!rec.begin_upload());
        assert!(rec.is_persisted());
    }

    #[test]
    fn failed_record_is_retryable() {
        let mut rec = pending_csv("a.csv");
        rec.begin_upload();
        rec.mark_failed("connection reset".into());
        assert_eq!(rec.state.to_string(), "failed: connection reset");
        assert!(rec.state.is_pending());

        // Retry re-enters Uploading from Failed.
        assert!(rec.begin_upload());
        assert_eq!(rec.state, UploadState::Uploading);
    }

    #[test]
    fn local_id_survives_persistence() {
        let mut rec = pending_csv("a.csv");
        let id = rec.local_id;
        rec.begin_upload();
        rec.mark_persisted(custommarket_protocol::FileRecord {
            id: 9,
            document_id: String::new(),
            filename: "a.csv".into(),
            storage_path: String::new(),
            mime_type: None,
            size: None,
            tab_id: None,
            parsed_data: None,
            notes: String::new(),
        });
        assert_eq!(rec.local_id, id);
    }

    #[test]
    fn wire_record_without_grid_parses_as_empty() {
        let rec = FileRecord::from_wire(custommarket_protocol::FileRecord {
            id: 3,
            document_id: String::new(),
            filename: "photo.jpeg".into(),
            storage_path: String::new(),
            mime_type: Some("image/jpeg".into()),
            size: Some(1024),
            tab_id: None,
            parsed_data: None,
            notes: "front of store".into(),
        });
        assert_eq!(rec.kind, FileKind::Image);
        assert!(rec.grid.is_empty());
        assert_eq!(rec.notes, "front of store");
    }
}
