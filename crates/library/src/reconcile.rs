//! Reconciliation of upload responses against pending records.
//!
//! The server answers a multipart upload with the records it persisted,
//! in the order it persisted them. This module folds that response back
//! into the local record list without disturbing anything that was
//! already persisted.

use custommarket_protocol::FileRecord as WireRecord;

use crate::record::{FileRecord, UploadState};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// In-flight records matched to a server record.
    pub persisted: usize,
    /// In-flight records the response did not cover.
    pub failed: usize,
    /// Server records beyond the in-flight batch, appended as new entries.
    pub appended: usize,
}

/// Fold an upload response into the record list.
///
/// Pairing is positional: the i-th `Uploading` record (in list order)
/// adopts the i-th server record. If the server silently dropped an
/// entry mid-batch, every later pair is misaligned; the response carries
/// no ids for what it rejected, so position is all there is to go on.
/// Records keep their `local_id` precisely so a future server that
/// echoes client ids can pair exactly.
///
/// Surplus server records are appended; uncovered in-flight records are
/// marked failed (retryable). Records not in `Uploading` are never
/// touched.
pub fn reconcile_upload(
    records: &mut Vec<FileRecord>,
    uploaded: Vec<WireRecord>,
) -> ReconcileOutcome {
    let in_flight: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.state == UploadState::Uploading)
        .map(|(i, _)| i)
        .collect();

    let mut outcome = ReconcileOutcome::default();
    let mut responses = uploaded.into_iter();

    for &idx in &in_flight {
        match responses.next() {
            Some(wire) => {
                records[idx].mark_persisted(wire);
                outcome.persisted += 1;
            }
            None => {
                records[idx].mark_failed("not persisted by the server".to_string());
                outcome.failed += 1;
            }
        }
    }

    for wire in responses {
        records.push(FileRecord::from_wire(wire));
        outcome.appended += 1;
    }

    outcome
}

/// Mark every in-flight record failed. For whole-request failures
/// (network error, non-2xx) where no per-item response exists.
pub fn fail_upload(records: &mut [FileRecord], reason: &str) -> usize {
    let mut failed = 0;
    for record in records.iter_mut() {
        if record.state == UploadState::Uploading {
            record.mark_failed(reason.to_string());
            failed += 1;
        }
    }
    failed
}
