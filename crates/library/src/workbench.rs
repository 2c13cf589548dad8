//! The workbench: every file the user is working with, in order.
//!
//! The workbench owns what must outlive any single table view: the
//! record list, the collapse set, one shared selection per file, and
//! the preview handles. A table view for a file is built on demand and
//! thrown away on collapse; because its selection store is borrowed
//! from here, reopening the file shows the same selection.
//!
//! Everything is keyed by [`RecordKey`]. When reconciliation gives a
//! pending record its server id, the key changes and all per-file state
//! migrates with it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use custommarket_core::{Selection, SelectionStore};
use custommarket_protocol::FileRecord as WireRecord;

use crate::previews::PreviewStore;
use crate::reconcile::{self, ReconcileOutcome};
use crate::record::{FileRecord, RecordKey};

#[derive(Default)]
pub struct Workbench {
    records: Vec<FileRecord>,
    collapsed: HashSet<RecordKey>,
    selections: HashMap<RecordKey, Rc<RefCell<Selection>>>,
    previews: PreviewStore,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a workbench from a server file listing, keeping server order.
    pub fn from_wire(records: Vec<WireRecord>) -> Self {
        let mut bench = Self::new();
        for wire in records {
            bench.add(FileRecord::from_wire(wire));
        }
        bench
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, key: RecordKey) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.key() == key)
    }

    pub fn record_mut(&mut self, key: RecordKey) -> Option<&mut FileRecord> {
        self.records.iter_mut().find(|r| r.key() == key)
    }

    /// Append a record and hand back its key.
    pub fn add(&mut self, record: FileRecord) -> RecordKey {
        let key = record.key();
        self.records.push(record);
        key
    }

    /// Drop a record and everything keyed to it: selection, collapse
    /// state, preview file.
    pub fn remove(&mut self, key: RecordKey) -> Option<FileRecord> {
        let idx = self.records.iter().position(|r| r.key() == key)?;
        self.selections.remove(&key);
        self.collapsed.remove(&key);
        self.previews.release(key);
        Some(self.records.remove(idx))
    }

    // ── Upload lifecycle ────────────────────────────────────────────

    /// Move every startable record (added or failed) into `Uploading`.
    /// Returns their keys in list order, which is also the order the
    /// caller must submit them in.
    pub fn begin_upload(&mut self) -> Vec<RecordKey> {
        let mut started = Vec::new();
        for record in &mut self.records {
            if record.begin_upload() {
                started.push(record.key());
            }
        }
        started
    }

    /// Fold an upload response in and migrate per-file state to the new
    /// server-id keys.
    pub fn reconcile_upload(&mut self, uploaded: Vec<WireRecord>) -> ReconcileOutcome {
        let before: Vec<RecordKey> = self.records.iter().map(|r| r.key()).collect();
        let outcome = reconcile::reconcile_upload(&mut self.records, uploaded);
        // reconcile_upload only rewrites in place and appends, so the
        // original indices still line up.
        for (idx, old_key) in before.into_iter().enumerate() {
            let new_key = self.records[idx].key();
            if new_key != old_key {
                self.rekey(old_key, new_key);
            }
        }
        outcome
    }

    /// Mark every in-flight record failed after a whole-request error.
    pub fn fail_upload(&mut self, reason: &str) -> usize {
        reconcile::fail_upload(&mut self.records, reason)
    }

    fn rekey(&mut self, from: RecordKey, to: RecordKey) {
        if let Some(selection) = self.selections.remove(&from) {
            self.selections.insert(to, selection);
        }
        if self.collapsed.remove(&from) {
            self.collapsed.insert(to);
        }
        self.previews.rekey(from, to);
    }

    // ── Per-file view state ─────────────────────────────────────────

    /// Collapse or expand a file's panel. Returns the new collapsed flag.
    pub fn toggle_collapsed(&mut self, key: RecordKey) -> bool {
        if self.collapsed.remove(&key) {
            false
        } else {
            self.collapsed.insert(key);
            true
        }
    }

    pub fn is_collapsed(&self, key: RecordKey) -> bool {
        self.collapsed.contains(&key)
    }

    /// The shared selection store for a file, created empty on first use.
    /// Table views built from this store read and write the same set, so
    /// selection survives the view being torn down and rebuilt.
    pub fn selection_store(&mut self, key: RecordKey) -> SelectionStore {
        let cell = self
            .selections
            .entry(key)
            .or_insert_with(|| Rc::new(RefCell::new(Selection::default())))
            .clone();
        SelectionStore::shared(cell)
    }

    /// Read a file's current selection without creating one.
    pub fn selection_snapshot(&self, key: RecordKey) -> Selection {
        self.selections.get(&key).map(|cell| cell.borrow().clone()).unwrap_or_default()
    }

    pub fn previews(&mut self) -> &mut PreviewStore {
        &mut self.previews
    }
}
