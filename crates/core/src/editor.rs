//! Single-slot cell/header editing with a draft value.
//!
//! Key invariants:
//! - At most one edit is in flight per table instance
//! - Beginning a new edit silently discards the open one, uncommitted
//! - Commit reports an intent; the editor never touches the grid
//! - Cancel discards the draft without reporting anything

/// What is being edited. Cell rows are original data-row indices; the
/// caller translates view positions before beginning an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Cell { row: usize, col: usize },
    Header { col: usize },
}

/// A committed edit, reported upward for the owner to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditIntent {
    pub target: EditTarget,
    pub value: String,
}

/// The in-flight edit, if any, plus its draft text.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    active: Option<(EditTarget, String)>,
}

impl Editor {
    pub fn is_editing(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<EditTarget> {
        self.active.as_ref().map(|(t, _)| *t)
    }

    pub fn draft(&self) -> Option<&str> {
        self.active.as_ref().map(|(_, d)| d.as_str())
    }

    /// Begin editing `target`, seeding the draft with the currently
    /// displayed value. Any open edit is dropped without committing.
    pub fn begin(&mut self, target: EditTarget, current: &str) {
        self.active = Some((target, current.to_string()));
    }

    pub fn set_draft(&mut self, value: String) {
        if let Some((_, draft)) = self.active.as_mut() {
            *draft = value;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some((_, draft)) = self.active.as_mut() {
            draft.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some((_, draft)) = self.active.as_mut() {
            draft.pop();
        }
    }

    /// Commit the draft (blur / Enter). Returns the intent for the owner
    /// to apply; `None` when no edit was open.
    pub fn commit(&mut self) -> Option<EditIntent> {
        self.active.take().map(|(target, value)| EditIntent { target, value })
    }

    /// Cancel the edit (Escape). The draft is discarded; no intent.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_seeds_draft_with_current_value() {
        let mut ed = Editor::default();
        ed.begin(EditTarget::Cell { row: 4, col: 1 }, "old");
        assert!(ed.is_editing());
        assert_eq!(ed.draft(), Some("old"));
        assert_eq!(ed.target(), Some(EditTarget::Cell { row: 4, col: 1 }));
    }

    #[test]
    fn test_commit_reports_target_and_value() {
        let mut ed = Editor::default();
        ed.begin(EditTarget::Cell { row: 2, col: 0 }, "a");
        ed.push_char('b');
        ed.push_char('c');
        let intent = ed.commit().unwrap();
        assert_eq!(intent.target, EditTarget::Cell { row: 2, col: 0 });
        assert_eq!(intent.value, "abc");
        assert!(!ed.is_editing());
        assert!(ed.commit().is_none());
    }

    #[test]
    fn test_new_edit_discards_open_one() {
        let mut ed = Editor::default();
        ed.begin(EditTarget::Cell { row: 0, col: 0 }, "first");
        ed.set_draft("changed".into());
        ed.begin(EditTarget::Header { col: 3 }, "name");
        // the cell draft is gone; only the header edit can commit
        let intent = ed.commit().unwrap();
        assert_eq!(intent.target, EditTarget::Header { col: 3 });
        assert_eq!(intent.value, "name");
    }

    #[test]
    fn test_cancel_reports_nothing() {
        let mut ed = Editor::default();
        ed.begin(EditTarget::Header { col: 1 }, "h");
        ed.push_char('x');
        ed.cancel();
        assert!(!ed.is_editing());
        assert!(ed.commit().is_none());
    }

    #[test]
    fn test_backspace_on_empty_draft() {
        let mut ed = Editor::default();
        ed.begin(EditTarget::Cell { row: 0, col: 0 }, "");
        ed.backspace();
        assert_eq!(ed.draft(), Some(""));
    }
}
