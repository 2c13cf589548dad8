use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Clip a string to fit within `width` display columns, ending with "…" when cut.
/// Width accounting is Unicode-aware so CJK/emoji columns stay aligned.
pub(crate) fn clip(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        // No room for text plus a marker. Show the first char if it is narrow
        // enough, otherwise just the marker.
        if let Some(ch) = s.chars().next() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if UnicodeWidthStr::width(s) <= 1 {
                return s.to_string();
            }
            if cw <= 1 {
                return "\u{2026}".to_string();
            }
        }
        return String::new();
    }

    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }

    // Walk chars accumulating display width; the marker itself costs one column.
    let budget = width - 1;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}\u{2026}", &s[..end_byte])
}

/// Pad or clip a string to exactly `width` display columns.
pub(crate) fn pad_cell(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw > width {
        let clipped = clip(s, width);
        let cw = UnicodeWidthStr::width(clipped.as_str());
        format!("{}{}", clipped, " ".repeat(width.saturating_sub(cw)))
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Human-readable byte count: 512 -> "512 B", 2048 -> "2.0 KB".
/// Sizes come from the server and may be absent; callers map None to "-".
pub(crate) fn format_size(bytes: i64) -> String {
    if bytes < 0 {
        return "-".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
