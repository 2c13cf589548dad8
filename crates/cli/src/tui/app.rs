//! Viewer state machine.
//!
//! Pure state, no terminal and no HTTP: key handling mutates the table
//! stack and hands side effects (saves, exports, preview fetches) back
//! to the event loop as [`Effect`]s. That split keeps every keybinding
//! testable without raw mode.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use unicode_width::UnicodeWidthStr;

use custommarket_core::TableState;
use custommarket_io::FileKind;
use custommarket_library::{FileRecord, RecordKey};

/// What the viewer is doing with the keyboard right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    EditCell,
    EditHeader,
    EditSearch,
    /// Editing the filter for one column.
    EditFilter(usize),
    EditNotes,
}

/// A side effect the event loop must carry out. Indexes refer to the
/// entry list and stay valid because entries are never removed while
/// the viewer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The entry's grid changed; persist it if it has a server id.
    SaveGrid(usize),
    /// The entry's notes changed.
    SaveNotes(usize),
    /// Export the entry's current filtered view as CSV.
    ExportCsv(usize),
    /// An image entry became active and its bytes are not spilled yet.
    FetchPreview(usize),
}

/// One open file in the viewer.
pub struct FileEntry {
    pub key: RecordKey,
    pub remote_id: Option<i64>,
    pub filename: String,
    pub kind: FileKind,
    pub size: Option<u64>,
    pub notes: String,
    pub table: TableState,
    pub col_widths: Vec<usize>,
    /// Where the image bytes were spilled, for entries with no grid.
    pub preview: Option<PathBuf>,
    preview_requested: bool,
}

impl FileEntry {
    pub fn new(record: &FileRecord, table: TableState) -> Self {
        let col_widths = column_widths(&table);
        FileEntry {
            key: record.key(),
            remote_id: record.remote_id,
            filename: record.filename.clone(),
            kind: record.kind,
            size: record.size,
            notes: record.notes.clone(),
            table,
            col_widths,
            preview: None,
            preview_requested: false,
        }
    }
}

/// Rendered width per column: longest of header and cell content,
/// clamped so a single verbose cell cannot eat the screen.
fn column_widths(table: &TableState) -> Vec<usize> {
    let mut widths: Vec<usize> = table
        .headers()
        .iter()
        .map(|h| UnicodeWidthStr::width(h.as_str()))
        .collect();
    for row in table.grid().data_rows() {
        for (c, cell) in row.iter().enumerate().take(widths.len()) {
            widths[c] = widths[c].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }
    widths.into_iter().map(|w| w.clamp(3, 40)).collect()
}

pub struct ViewerApp {
    pub(crate) entries: Vec<FileEntry>,
    pub(crate) active: usize,
    /// Cursor position within the current page.
    pub(crate) cursor: usize,
    pub(crate) cursor_col: usize,
    /// First rendered column (horizontal scroll).
    pub(crate) col_offset: usize,
    pub(crate) mode: Mode,
    /// Draft text for search/filter/notes modes.
    pub(crate) input: String,
    input_restore: String,
    pub(crate) status: Option<String>,
    pub(crate) help: bool,
    pub(crate) should_quit: bool,
}

impl ViewerApp {
    pub fn new(entries: Vec<FileEntry>) -> Self {
        ViewerApp {
            entries,
            active: 0,
            cursor: 0,
            cursor_col: 0,
            col_offset: 0,
            mode: Mode::Browse,
            input: String::new(),
            input_restore: String::new(),
            status: None,
            help: false,
            should_quit: false,
        }
    }

    pub fn active_entry(&self) -> &FileEntry {
        &self.entries[self.active]
    }

    pub fn active_entry_mut(&mut self) -> &mut FileEntry {
        &mut self.entries[self.active]
    }

    fn table(&self) -> &TableState {
        &self.entries[self.active].table
    }

    fn table_mut(&mut self) -> &mut TableState {
        &mut self.entries[self.active].table
    }

    fn active_cols(&self) -> usize {
        self.table().grid().column_count()
    }

    /// Original data-row index under the cursor, if the page has rows.
    pub(crate) fn cursor_row(&self) -> Option<usize> {
        self.table().page_rows().get(self.cursor).copied()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Effect owed for the entry that just became active. Image entries
    /// want their bytes spilled once; everything else owes nothing.
    pub fn activation_effect(&mut self) -> Option<Effect> {
        let idx = self.active;
        let entry = &mut self.entries[idx];
        if entry.kind == FileKind::Image
            && entry.preview.is_none()
            && !entry.preview_requested
            && entry.remote_id.is_some()
        {
            entry.preview_requested = true;
            return Some(Effect::FetchPreview(idx));
        }
        None
    }

    // ── Key handling ────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        // Any transient outcome message dies on the next keypress.
        self.status = None;

        if self.help {
            // Any key dismisses help
            self.help = false;
            return None;
        }

        match self.mode {
            Mode::Browse => self.handle_browse(key),
            Mode::EditCell | Mode::EditHeader => self.handle_grid_edit(key),
            Mode::EditSearch => self.handle_search(key),
            Mode::EditFilter(col) => self.handle_filter(key, col),
            Mode::EditNotes => self.handle_notes(key),
        }
    }

    fn handle_browse(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.help = true,

            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1),

            KeyCode::PageDown | KeyCode::Char('n') => {
                self.table_mut().next_page();
                self.clamp_cursor();
            }
            KeyCode::PageUp | KeyCode::Char('p') => {
                self.table_mut().prev_page();
                self.clamp_cursor();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.table_mut().first_page();
                self.cursor = 0;
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.table_mut().last_page();
                self.clamp_cursor();
            }
            KeyCode::Char('+') => {
                self.table_mut().cycle_rows_per_page(true);
                self.clamp_cursor();
            }
            KeyCode::Char('-') => {
                self.table_mut().cycle_rows_per_page(false);
                self.clamp_cursor();
            }
            KeyCode::Char('0') => self.cursor_col = 0,
            KeyCode::Char('$') => {
                let cols = self.active_cols();
                if cols > 0 {
                    self.cursor_col = cols - 1;
                }
            }

            KeyCode::Char('/') => {
                self.input = self.table().search().to_string();
                self.input_restore = self.input.clone();
                self.mode = Mode::EditSearch;
            }
            KeyCode::Char('f') => {
                if self.active_cols() > 0 {
                    let col = self.cursor_col;
                    self.input = self.table().column_filter(col).unwrap_or("").to_string();
                    self.input_restore = self.input.clone();
                    self.mode = Mode::EditFilter(col);
                }
            }
            KeyCode::Char('F') => {
                self.table_mut().clear_filters();
                self.clamp_cursor();
            }

            KeyCode::Char(' ') => {
                if let Some(row) = self.cursor_row() {
                    self.table_mut().toggle_row(row);
                }
            }
            KeyCode::Char('c') => {
                if self.active_cols() > 0 {
                    let col = self.cursor_col;
                    self.table_mut().toggle_column(col);
                }
            }
            KeyCode::Char('a') => self.table_mut().toggle_page_selection(),
            KeyCode::Char('x') => self.table_mut().clear_selection(),

            KeyCode::Enter => {
                if let Some(row) = self.cursor_row() {
                    let col = self.cursor_col;
                    self.table_mut().begin_cell_edit(row, col);
                    self.mode = Mode::EditCell;
                }
            }
            KeyCode::Char('H') => {
                if self.active_cols() > 0 {
                    let col = self.cursor_col;
                    self.table_mut().begin_header_edit(col);
                    self.mode = Mode::EditHeader;
                }
            }
            KeyCode::Char('N') => {
                self.input = self.active_entry().notes.clone();
                self.mode = Mode::EditNotes;
            }

            KeyCode::Char('[') => return self.switch_file(false),
            KeyCode::Char(']') => return self.switch_file(true),
            KeyCode::Char('s') => {
                if !self.table().grid().is_empty() {
                    return Some(Effect::ExportCsv(self.active));
                }
            }
            _ => {}
        }
        None
    }

    fn handle_grid_edit(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => {
                self.table_mut().cancel_edit();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                let idx = self.active;
                if let Some(intent) = self.entries[idx].table.commit_edit() {
                    self.entries[idx].table.apply_edit(&intent);
                    self.entries[idx].col_widths = column_widths(&self.entries[idx].table);
                    // The new value may fall out of an active filter.
                    self.clamp_cursor();
                    return Some(Effect::SaveGrid(idx));
                }
            }
            KeyCode::Backspace => self.table_mut().editor_mut().backspace(),
            KeyCode::Char(c) => self.table_mut().editor_mut().push_char(c),
            _ => {}
        }
        None
    }

    fn handle_search(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => {
                let restore = self.input_restore.clone();
                self.table_mut().set_search(restore);
                self.clamp_cursor();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                self.input.pop();
                self.live_search();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.live_search();
            }
            _ => {}
        }
        None
    }

    fn live_search(&mut self) {
        let text = self.input.clone();
        self.table_mut().set_search(text);
        self.clamp_cursor();
    }

    fn handle_filter(&mut self, key: KeyEvent, col: usize) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => {
                let restore = self.input_restore.clone();
                self.table_mut().set_column_filter(col, restore);
                self.clamp_cursor();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                self.input.pop();
                self.live_filter(col);
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.live_filter(col);
            }
            _ => {}
        }
        None
    }

    fn live_filter(&mut self, col: usize) {
        let text = self.input.clone();
        self.table_mut().set_column_filter(col, text);
        self.clamp_cursor();
    }

    fn handle_notes(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                let idx = self.active;
                self.entries[idx].notes = self.input.clone();
                return Some(Effect::SaveNotes(idx));
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        None
    }

    // ── Cursor and scrolling ────────────────────────────────────────

    /// Vertical movement walks across page boundaries; horizontal
    /// movement clamps at the edges.
    fn move_cursor(&mut self, drow: i32, dcol: i32) {
        if dcol != 0 {
            let cols = self.active_cols();
            if cols > 0 {
                let next = self.cursor_col as i32 + dcol;
                self.cursor_col = next.clamp(0, cols as i32 - 1) as usize;
            }
        }
        if drow > 0 {
            let page_len = self.table().page_rows().len();
            if self.cursor + 1 < page_len {
                self.cursor += 1;
            } else if self.table().current_page() < self.table().total_pages() {
                self.table_mut().next_page();
                self.cursor = 0;
            }
        } else if drow < 0 {
            if self.cursor > 0 {
                self.cursor -= 1;
            } else if self.table().current_page() > 1 {
                self.table_mut().prev_page();
                self.cursor = self.table().page_rows().len().saturating_sub(1);
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let page_len = self.table().page_rows().len();
        self.cursor = if page_len == 0 { 0 } else { self.cursor.min(page_len - 1) };
        let cols = self.active_cols();
        self.cursor_col = if cols == 0 { 0 } else { self.cursor_col.min(cols - 1) };
    }

    fn switch_file(&mut self, forward: bool) -> Option<Effect> {
        let n = self.entries.len();
        if n <= 1 {
            return None;
        }
        self.active = if forward { (self.active + 1) % n } else { (self.active + n - 1) % n };
        // Selection and filters live in the entry's table and survive;
        // the cursor does not.
        self.cursor = 0;
        self.cursor_col = 0;
        self.col_offset = 0;
        self.activation_effect()
    }

    /// Columns that fit into `available` display cells starting at
    /// `start_col`. At least one column is always admitted so a single
    /// over-wide column cannot blank the grid.
    pub(crate) fn visible_columns(&self, start_col: usize, available: usize) -> Vec<usize> {
        let entry = self.active_entry();
        let total = entry.table.grid().column_count();
        let mut cols = Vec::new();
        let mut used = 0usize;
        for c in start_col..total {
            let w = entry.col_widths.get(c).copied().unwrap_or(3) + 1;
            if used + w > available && !cols.is_empty() {
                break;
            }
            used += w;
            cols.push(c);
        }
        cols
    }

    /// Slide the horizontal window until the cursor column is rendered.
    pub(crate) fn ensure_col_visible(&mut self, available: usize) {
        if self.cursor_col < self.col_offset {
            self.col_offset = self.cursor_col;
            return;
        }
        let vis = self.visible_columns(self.col_offset, available);
        let Some(&last) = vis.last() else { return };
        if self.cursor_col <= last {
            return;
        }
        let total = self.active_entry().table.grid().column_count();
        let mut offset = self.col_offset;
        loop {
            let cols = self.visible_columns(offset, available);
            match cols.last() {
                Some(&l) if l < self.cursor_col => {
                    offset += 1;
                    if offset >= total {
                        break;
                    }
                }
                _ => break,
            }
        }
        self.col_offset = offset;
    }

    /// Gutter width for original data-row indexes.
    pub(crate) fn row_num_width(&self) -> usize {
        let max_index = self.active_entry().table.total_data_rows().saturating_sub(1);
        max_index.to_string().len().max(3) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use custommarket_core::Grid;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect())
    }

    fn tabular_entry(name: &str, g: Grid) -> FileEntry {
        let record = FileRecord::pending(name.to_string(), Some("text/csv".to_string()), 10, g, None);
        let table = TableState::new(record.grid.clone());
        FileEntry::new(&record, table)
    }

    fn sample_app() -> ViewerApp {
        let g = grid(&[
            &["name", "city", "rating"],
            &["Initech", "Dallas", "2"],
            &["Globex", "Springfield", "5"],
            &["Umbrella", "Raccoon City", "1"],
        ]);
        ViewerApp::new(vec![tabular_entry("vendors.csv", g)])
    }

    #[test]
    fn cursor_moves_and_clamps() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor_row(), Some(2));
        // Bottom row of the only page: a further Down stays put
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor_row(), Some(2));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('l')));
        assert_eq!(app.cursor_col, 2);
    }

    #[test]
    fn down_walks_onto_the_next_page() {
        let rows: Vec<Vec<String>> = std::iter::once(vec!["n".to_string()])
            .chain((0..30).map(|i| vec![i.to_string()]))
            .collect();
        let mut app = ViewerApp::new(vec![tabular_entry("long.csv", Grid::new(rows))]);
        // Default page size is 25; step to its bottom edge and once more
        for _ in 0..24 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(app.cursor_row(), Some(24));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.active_entry().table.current_page(), 2);
        assert_eq!(app.cursor_row(), Some(25));
        // And back up across the boundary
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.active_entry().table.current_page(), 1);
        assert_eq!(app.cursor_row(), Some(24));
    }

    #[test]
    fn search_is_live_and_esc_restores() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.mode, Mode::EditSearch);
        for c in "glob".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.active_entry().table.visible_len(), 1);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.active_entry().table.visible_len(), 3);
    }

    #[test]
    fn filter_commit_keeps_the_narrowing() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.mode, Mode::EditFilter(0));
        app.handle_key(key(KeyCode::Char('i')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.active_entry().table.filter_active());
        app.handle_key(key(KeyCode::Char('F')));
        assert_eq!(app.active_entry().table.visible_len(), 3);
    }

    #[test]
    fn selection_tracks_original_rows_under_search() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('/')));
        for c in "umbrella".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char(' ')));
        let selection = app.active_entry().table.selection();
        assert!(selection.row_selected(2));
        assert!(!selection.row_selected(0));
    }

    #[test]
    fn cell_edit_commit_mutates_grid_and_requests_save() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Down)); // Globex row
        app.handle_key(key(KeyCode::Char('$')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::EditCell);
        app.handle_key(key(KeyCode::Backspace));
        let effect = {
            app.handle_key(key(KeyCode::Char('4')));
            app.handle_key(key(KeyCode::Enter))
        };
        assert_eq!(effect, Some(Effect::SaveGrid(0)));
        assert_eq!(app.active_entry().table.cell(1, 2), "4");
    }

    #[test]
    fn header_edit_renames_column() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('H')));
        assert_eq!(app.mode, Mode::EditHeader);
        for _ in 0.."name".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        for c in "vendor".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let effect = app.handle_key(key(KeyCode::Enter));
        assert_eq!(effect, Some(Effect::SaveGrid(0)));
        assert_eq!(app.active_entry().table.headers()[0], "vendor");
    }

    #[test]
    fn edit_esc_cancels_cleanly() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('z')));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.active_entry().table.cell(0, 0), "Initech");
    }

    #[test]
    fn notes_commit_updates_entry_and_requests_save() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('N')));
        assert_eq!(app.mode, Mode::EditNotes);
        for c in "call Tuesday".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let effect = app.handle_key(key(KeyCode::Enter));
        assert_eq!(effect, Some(Effect::SaveNotes(0)));
        assert_eq!(app.active_entry().notes, "call Tuesday");
    }

    #[test]
    fn export_requested_for_tabular_entries_only() {
        let mut app = sample_app();
        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), Some(Effect::ExportCsv(0)));

        let record = FileRecord::pending(
            "logo.png".to_string(),
            Some("image/png".to_string()),
            9,
            Grid::empty(),
            None,
        );
        let table = TableState::new(record.grid.clone());
        let mut app = ViewerApp::new(vec![FileEntry::new(&record, table)]);
        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), None);
    }

    #[test]
    fn switching_files_preserves_per_file_selection() {
        let a = tabular_entry("a.csv", grid(&[&["h"], &["1"], &["2"]]));
        let b = tabular_entry("b.csv", grid(&[&["h"], &["x"]]));
        let mut app = ViewerApp::new(vec![a, b]);
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char(']')));
        assert_eq!(app.active, 1);
        app.handle_key(key(KeyCode::Char('[')));
        assert!(app.active_entry().table.selection().row_selected(0));
    }

    #[test]
    fn activation_requests_preview_for_remote_images_once() {
        use custommarket_protocol::FileRecord as Wire;
        let wire = Wire {
            id: 7,
            document_id: "doc-7".to_string(),
            filename: "site.png".to_string(),
            storage_path: "u/1/site.png".to_string(),
            mime_type: Some("image/png".to_string()),
            size: Some(100),
            tab_id: None,
            parsed_data: None,
            notes: String::new(),
        };
        let record = FileRecord::from_wire(wire);
        let table = TableState::new(record.grid.clone());
        let mut app = ViewerApp::new(vec![FileEntry::new(&record, table)]);
        assert_eq!(app.activation_effect(), Some(Effect::FetchPreview(0)));
        // Requested once; asking again is a no-op until the fetch lands
        assert_eq!(app.activation_effect(), None);
    }

    #[test]
    fn help_overlay_swallows_the_next_key() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.help);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.help);
        assert!(!app.should_quit);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = sample_app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
