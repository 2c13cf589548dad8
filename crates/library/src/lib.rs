//! File library domain model.
//!
//! Everything between "the user picked some files" and "the server owns
//! them": pending records with a per-item upload state machine, positional
//! reconciliation of upload responses, image preview handles with explicit
//! release, and the workbench container that keeps per-file selection and
//! collapse state alive across view teardowns.
//!
//! No HTTP here. Callers fetch and push wire types through
//! `custommarket-client` and feed the results in.

mod previews;
mod reconcile;
mod record;
mod workbench;

pub use previews::PreviewStore;
pub use reconcile::{fail_upload, reconcile_upload, ReconcileOutcome};
pub use record::{FileRecord, RecordKey, UploadState};
pub use workbench::Workbench;
