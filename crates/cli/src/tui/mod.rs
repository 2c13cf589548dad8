pub mod app;

use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use custommarket_client::ApiClient;
use custommarket_core::{EditTarget, Grid, TableState};
use custommarket_io::{classify, parse_tabular, FileKind};
use custommarket_library::{FileRecord, RecordKey, Workbench};

use crate::util;
use crate::{remote_client, CliError};
use app::{Effect, FileEntry, Mode, ViewerApp};

// ── Entry points ────────────────────────────────────────────────────

/// `cmk view <path>`: browse a local file, no account involved.
pub fn cmd_view(path: PathBuf, quiet: bool) -> Result<(), CliError> {
    let bytes = std::fs::read(&path)
        .map_err(|e| CliError::file_read(format!("{}: {}", path.display(), e)))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let kind = classify(&filename, None);
    let grid = if kind == FileKind::Tabular {
        match parse_tabular(&bytes, &filename) {
            Ok(grid) => grid,
            Err(e) => {
                if !quiet {
                    eprintln!("note: {}: {}", filename, e);
                }
                Grid::empty()
            }
        }
    } else {
        Grid::empty()
    };

    let mut workbench = Workbench::new();
    let size = bytes.len() as u64;
    workbench.add(FileRecord::pending(filename, None, size, grid, None));

    let mut entries = build_entries(&mut workbench);
    if let Some(entry) = entries.first_mut() {
        if entry.kind == FileKind::Image {
            // The local file is its own preview.
            entry.preview = Some(path.clone());
        }
    }

    if !atty::is(atty::Stream::Stdout) {
        // Piped output gets a plain table instead of raw-mode chrome.
        return print_plain(&entries[0]);
    }

    let mut app = ViewerApp::new(entries);
    let mut ctx = ViewerCtx { client: None, workbench };
    run_app(&mut app, &mut ctx)
}

/// `cmk open`: fetch remote records into a workbench and browse them.
pub fn cmd_open(
    api_url: Option<String>,
    file_id: Option<i64>,
    tab: Option<i64>,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    let records = match file_id {
        Some(id) => vec![crate::files::find_record(&client, id)?],
        None => crate::files::list_or_empty(&client, tab, quiet)?,
    };
    if records.is_empty() {
        if !quiet {
            eprintln!("Nothing to open");
        }
        return Ok(());
    }

    if !atty::is(atty::Stream::Stdout) {
        return Err(CliError::terminal("open needs an interactive terminal")
            .with_hint("use `cmk ls --json` for machine-readable output"));
    }

    let mut workbench = Workbench::from_wire(records);
    let entries = build_entries(&mut workbench);

    let mut app = ViewerApp::new(entries);
    let mut ctx = ViewerCtx { client: Some(client), workbench };
    if let Some(effect) = app.activation_effect() {
        apply_effect(&mut app, &mut ctx, effect);
    }
    run_app(&mut app, &mut ctx)
}

/// Tables wired to the workbench's per-file selection stores, so state
/// survives `[`/`]` switching and outlives any one view.
fn build_entries(workbench: &mut Workbench) -> Vec<FileEntry> {
    let keys: Vec<RecordKey> = workbench.records().iter().map(|r| r.key()).collect();
    let stores: Vec<_> = keys.iter().map(|&k| workbench.selection_store(k)).collect();
    workbench
        .records()
        .iter()
        .zip(stores)
        .map(|(record, store)| {
            let table = TableState::with_selection_store(record.grid.clone(), store);
            FileEntry::new(record, table)
        })
        .collect()
}

// ── Event loop ──────────────────────────────────────────────────────

/// What the state machine cannot reach: the backend and the workbench
/// that owns records and spilled previews.
struct ViewerCtx {
    client: Option<ApiClient>,
    workbench: Workbench,
}

fn run_app(app: &mut ViewerApp, ctx: &mut ViewerCtx) -> Result<(), CliError> {
    terminal::enable_raw_mode()
        .map_err(|e| CliError::terminal(format!("failed to enable raw mode: {}", e)))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| CliError::terminal(format!("failed to enter alternate screen: {}", e)))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| CliError::terminal(format!("failed to create terminal: {}", e)))?;

    loop {
        let term_size = terminal
            .size()
            .map(|s| Rect::new(0, 0, s.width, s.height))
            .unwrap_or_default();
        let gutter = app.row_num_width() + 2;
        let available = (term_size.width as usize).saturating_sub(gutter);
        app.ensure_col_visible(available);

        terminal
            .draw(|frame| draw(frame, app))
            .map_err(|e| CliError::terminal(format!("draw error: {}", e)))?;

        if event::poll(Duration::from_millis(100))
            .map_err(|e| CliError::terminal(format!("event poll error: {}", e)))?
        {
            if let Event::Key(key) =
                event::read().map_err(|e| CliError::terminal(format!("event read error: {}", e)))?
            {
                if let Some(effect) = app.handle_key(key) {
                    apply_effect(app, ctx, effect);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Carry out one side effect and report the outcome on the status line.
/// The viewer stays up whatever happens; a failed save is a message,
/// not an exit.
fn apply_effect(app: &mut ViewerApp, ctx: &mut ViewerCtx, effect: Effect) {
    match effect {
        Effect::SaveGrid(idx) => {
            let rows = app.entries[idx].table.grid().rows().to_vec();
            let key = app.entries[idx].key;
            let remote = app.entries[idx].remote_id;
            if let Some(record) = ctx.workbench.record_mut(key) {
                record.grid = Grid::new(rows.clone());
            }
            match (remote, ctx.client.as_ref()) {
                (Some(id), Some(client)) => match client.update_parsed_data(id, rows) {
                    Ok(_) => app.set_status("Saved"),
                    Err(e) => app.set_status(format!("save failed: {}", e)),
                },
                _ => app.set_status("Edited locally (no server copy)"),
            }
        }
        Effect::SaveNotes(idx) => {
            let key = app.entries[idx].key;
            let remote = app.entries[idx].remote_id;
            let notes = app.entries[idx].notes.clone();
            if let Some(record) = ctx.workbench.record_mut(key) {
                record.notes = notes.clone();
            }
            match (remote, ctx.client.as_ref()) {
                (Some(id), Some(client)) => match client.update_notes(id, &notes) {
                    Ok(_) => app.set_status("Notes saved"),
                    Err(e) => app.set_status(format!("notes save failed: {}", e)),
                },
                _ => app.set_status("Notes kept locally (no server copy)"),
            }
        }
        Effect::ExportCsv(idx) => {
            let entry = &app.entries[idx];
            let path = export_path(&entry.filename);
            let cols = entry.table.grid().column_count();
            let mut rows: Vec<Vec<String>> = Vec::with_capacity(entry.table.visible_len() + 1);
            rows.push(entry.table.headers());
            for &orig in entry.table.visible_rows() {
                rows.push((0..cols).map(|c| entry.table.cell(orig, c).to_string()).collect());
            }
            let exported = rows.len() - 1;
            match custommarket_io::csv::export_csv(&path, &rows) {
                Ok(()) => {
                    app.set_status(format!("Exported {} row(s) to {}", exported, path.display()))
                }
                Err(e) => app.set_status(format!("export failed: {}", e)),
            }
        }
        Effect::FetchPreview(idx) => {
            let key = app.entries[idx].key;
            let filename = app.entries[idx].filename.clone();
            let (Some(id), Some(client)) = (app.entries[idx].remote_id, ctx.client.as_ref())
            else {
                return;
            };
            match client.download_file(id) {
                Ok(bytes) => match ctx.workbench.previews().acquire(key, &filename, &bytes) {
                    Ok(path) => {
                        app.entries[idx].preview = Some(path);
                        app.set_status("Preview ready");
                    }
                    Err(e) => app.set_status(format!("preview spill failed: {}", e)),
                },
                Err(e) => app.set_status(format!("preview fetch failed: {}", e)),
            }
        }
    }
}

/// `vendors.csv` exports next to the working directory as
/// `vendors-export.csv`.
fn export_path(filename: &str) -> PathBuf {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    PathBuf::from(format!("{}-export.csv", stem))
}

// ── Drawing ─────────────────────────────────────────────────────────

fn draw(frame: &mut Frame, app: &ViewerApp) {
    let area = frame.area();
    let multi = app.entries.len() > 1;
    if multi {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        draw_title(frame, app, chunks[0]);
        draw_file_bar(frame, app, chunks[1]);
        draw_grid(frame, app, chunks[2]);
        draw_status(frame, app, chunks[3]);
    } else {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        draw_title(frame, app, chunks[0]);
        draw_grid(frame, app, chunks[1]);
        draw_status(frame, app, chunks[2]);
    }

    if app.help {
        draw_help(frame, app, area);
    }
}

fn draw_title(frame: &mut Frame, app: &ViewerApp, area: Rect) {
    let entry = app.active_entry();
    let table = &entry.table;

    let row_info = if table.filter_active() {
        format!(
            "{}/{} rows x {} cols",
            table.visible_len(),
            table.total_data_rows(),
            table.grid().column_count()
        )
    } else {
        format!("{} rows x {} cols", table.total_data_rows(), table.grid().column_count())
    };

    let file_info = if app.entries.len() > 1 {
        format!(" | {} files", app.entries.len())
    } else {
        String::new()
    };

    let title =
        format!(" cmk: {} | {} | {}{} ", entry.filename, row_info, entry.kind, file_info);
    let para = Paragraph::new(Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::Cyan));
    frame.render_widget(para, area);
}

fn draw_file_bar(frame: &mut Frame, app: &ViewerApp, area: Rect) {
    let mut spans = Vec::new();
    for (i, entry) in app.entries.iter().enumerate() {
        let label = format!(" {} ", util::clip(&entry.filename, 24));
        if i == app.active {
            spans.push(Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::Gray).bg(Color::DarkGray)));
        }
        spans.push(Span::styled(" ", Style::default().bg(Color::Black)));
    }
    let para = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(para, area);
}

fn draw_grid(frame: &mut Frame, app: &ViewerApp, area: Rect) {
    let entry = app.active_entry();
    let table = &entry.table;

    if table.grid().is_empty() {
        draw_empty(frame, entry, area);
        return;
    }

    let row_num_width = app.row_num_width();
    let grid_available = (area.width as usize).saturating_sub(row_num_width + 2);
    let vis_cols = app.visible_columns(app.col_offset, grid_available);

    let editing = table.editor().target();
    let draft = table.editor().draft().unwrap_or("");

    // Header line; the gutter also leaves room for the selection mark.
    let gutter_blank = " ".repeat(row_num_width + 1);
    let mut header_spans =
        vec![Span::styled(format!("{} ", gutter_blank), Style::default().fg(Color::DarkGray))];
    let headers = table.headers();
    for &c in &vis_cols {
        let w = entry.col_widths.get(c).copied().unwrap_or(3);
        let (text, editing_this) = match editing {
            Some(EditTarget::Header { col }) if col == c => (draft, true),
            _ => (headers.get(c).map(|s| s.as_str()).unwrap_or("?"), false),
        };
        let display = util::pad_cell(text, w);
        let style = if editing_this {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if table.column_selected(c) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if c == app.cursor_col {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        header_spans.push(Span::styled(format!("{} ", display), style));
    }

    let mut lines: Vec<Line> = Vec::with_capacity(table.page_rows().len() + 1);
    lines.push(Line::from(header_spans));

    for (pos, &orig) in table.page_rows().iter().enumerate() {
        let is_cursor_row = pos == app.cursor;
        let row_selected = table.row_selected(orig);

        let mark = if row_selected { '*' } else { ' ' };
        let row_num_style = if is_cursor_row {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if row_selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut spans = vec![Span::styled(
            format!("{:>width$}{} ", orig, mark, width = row_num_width),
            row_num_style,
        )];

        for &c in &vis_cols {
            let w = entry.col_widths.get(c).copied().unwrap_or(3);
            let (text, editing_this) = match editing {
                Some(EditTarget::Cell { row, col }) if row == orig && col == c => (draft, true),
                _ => (table.cell(orig, c), false),
            };
            let display = util::pad_cell(text, w);

            let style = if editing_this {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if is_cursor_row && c == app.cursor_col {
                Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
            } else if row_selected || table.column_selected(c) {
                Style::default().fg(Color::Green)
            } else if is_cursor_row {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };

            spans.push(Span::styled(format!("{} ", display), style));
        }

        lines.push(Line::from(spans));
    }

    let para = Paragraph::new(lines);
    frame.render_widget(para, area);
}

/// Panel for entries with no grid: images and unsupported formats.
fn draw_empty(frame: &mut Frame, entry: &FileEntry, area: Rect) {
    let mut lines: Vec<String> = Vec::new();
    lines.push(String::new());
    match entry.kind {
        FileKind::Image => {
            lines.push(format!("  (image: {})", entry.filename));
            match &entry.preview {
                Some(path) => lines.push(format!("  preview: {}", path.display())),
                None if entry.remote_id.is_some() => {
                    lines.push("  (fetching preview...)".to_string())
                }
                None => lines.push("  (no preview)".to_string()),
            }
        }
        FileKind::Unsupported => {
            lines.push(format!("  (no tabular content: {})", entry.filename));
        }
        FileKind::Tabular => {
            // A tabular file whose parse produced nothing.
            lines.push(format!("  (empty table: {})", entry.filename));
        }
    }
    if let Some(size) = entry.size {
        lines.push(format!("  size: {}", util::format_size(size as i64)));
    }
    if !entry.notes.is_empty() {
        lines.push(String::new());
        lines.push(format!("  notes: {}", entry.notes));
    }

    let text: Vec<Line> = lines
        .into_iter()
        .map(|s| Line::from(Span::styled(s, Style::default().fg(Color::DarkGray))))
        .collect();
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_status(frame: &mut Frame, app: &ViewerApp, area: Rect) {
    let entry = app.active_entry();
    let table = &entry.table;

    let left = if let Some(message) = &app.status {
        format!(" {}", message)
    } else {
        match app.mode {
            Mode::EditSearch => format!(" search: {}_", app.input),
            Mode::EditFilter(col) => {
                let name = table
                    .headers()
                    .get(col)
                    .cloned()
                    .unwrap_or_else(|| format!("col {}", col));
                format!(" filter[{}]: {}_", name, app.input)
            }
            Mode::EditNotes => format!(" notes: {}_", app.input),
            Mode::EditCell | Mode::EditHeader => {
                format!(" edit: {}_", table.editor().draft().unwrap_or(""))
            }
            Mode::Browse => {
                if table.grid().is_empty() {
                    format!(" {}", entry.filename)
                } else {
                    let header = table
                        .headers()
                        .get(app.cursor_col)
                        .cloned()
                        .unwrap_or_else(|| "?".to_string());
                    match app.cursor_row() {
                        Some(orig) => format!(
                            " {}  r{} {} = {:?}  sel {}",
                            entry.filename,
                            orig,
                            header,
                            table.cell(orig, app.cursor_col),
                            table.selected_count()
                        ),
                        None => format!(" {}  (no rows)", entry.filename),
                    }
                }
            }
        }
    };

    let (start, end, total) = table.showing();
    let right = format!(
        "{}-{}/{}  page {}/{}  rpp {}  ?: help ",
        start,
        end,
        total,
        table.current_page(),
        table.total_pages(),
        table.pager().rows_per_page()
    );

    let padding =
        (area.width as usize).saturating_sub(left.chars().count() + right.chars().count());
    let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

    let para = Paragraph::new(Line::from(vec![Span::styled(
        status,
        Style::default().fg(Color::Black).bg(Color::DarkGray),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn draw_help(frame: &mut Frame, app: &ViewerApp, area: Rect) {
    let mut help_lines = vec![
        "",
        "  Navigation",
        "  ----------",
        "  arrows / hjkl     Move cursor",
        "  n / PgDn          Next page",
        "  p / PgUp          Previous page",
        "  g / G             First/last page",
        "  + / -             More/fewer rows per page",
        "  0 / $             First/last column",
        "",
        "  Filter & select",
        "  ---------------",
        "  /                 Edit search text",
        "  f                 Edit cursor column's filter",
        "  F                 Clear search and filters",
        "  Space / c         Toggle row / column",
        "  a                 Toggle all rows on page",
        "  x                 Clear selection",
        "",
        "  Editing",
        "  -------",
        "  Enter             Edit cell (Enter commits, Esc cancels)",
        "  H                 Edit column header",
        "  N                 Edit notes",
        "  s                 Export filtered view as CSV",
    ];

    if app.entries.len() > 1 {
        help_lines.extend_from_slice(&[
            "",
            "  Files",
            "  -----",
            "  [ / ]             Previous/next file",
        ]);
    }

    help_lines.extend_from_slice(&[
        "",
        "  General",
        "  -------",
        "  q / Esc           Quit",
        "  ?                 Toggle this help",
        "",
    ]);

    let help_width: u16 = 52;
    let help_height: u16 = help_lines.len() as u16;

    let x = area.width.saturating_sub(help_width) / 2;
    let y = area.height.saturating_sub(help_height) / 2;
    let popup =
        Rect::new(area.x + x, area.y + y, help_width.min(area.width), help_height.min(area.height));

    let lines: Vec<Line> = help_lines
        .iter()
        .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(Clear, popup);
    let para = Paragraph::new(lines).block(block);
    frame.render_widget(para, popup);
}

// ── Plain fallback ──────────────────────────────────────────────────

/// Print the entry as a plain text table (no TUI, no raw mode). Used
/// when stdout is not a terminal.
fn print_plain(entry: &FileEntry) -> Result<(), CliError> {
    let out = io::stdout();
    let mut w = out.lock();
    let table = &entry.table;

    if table.grid().is_empty() {
        writeln!(w, "(no tabular content: {})", entry.filename)
            .map_err(|e| CliError::file_write(e.to_string()))?;
        return Ok(());
    }

    let row_num_width = 6;
    let headers = table.headers();

    write!(w, "{:>width$} ", "", width = row_num_width)
        .map_err(|e| CliError::file_write(e.to_string()))?;
    for (c, name) in headers.iter().enumerate() {
        let cw = entry.col_widths.get(c).copied().unwrap_or(3);
        write!(w, "{} ", util::pad_cell(name, cw)).map_err(|e| CliError::file_write(e.to_string()))?;
    }
    writeln!(w).map_err(|e| CliError::file_write(e.to_string()))?;

    write!(w, "{:->width$}-", "", width = row_num_width)
        .map_err(|e| CliError::file_write(e.to_string()))?;
    for c in 0..headers.len() {
        let cw = entry.col_widths.get(c).copied().unwrap_or(3);
        write!(w, "{}-", "-".repeat(cw)).map_err(|e| CliError::file_write(e.to_string()))?;
    }
    writeln!(w).map_err(|e| CliError::file_write(e.to_string()))?;

    for &orig in table.visible_rows() {
        write!(w, "{:>width$} ", orig, width = row_num_width)
            .map_err(|e| CliError::file_write(e.to_string()))?;
        for c in 0..headers.len() {
            let cw = entry.col_widths.get(c).copied().unwrap_or(3);
            write!(w, "{} ", util::pad_cell(table.cell(orig, c), cw))
                .map_err(|e| CliError::file_write(e.to_string()))?;
        }
        writeln!(w).map_err(|e| CliError::file_write(e.to_string()))?;
    }

    Ok(())
}
