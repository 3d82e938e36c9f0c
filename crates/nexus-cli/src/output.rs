use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, w: usize) -> String {
    let fill = w.saturating_sub(width(s));
    format!("{s}{}", " ".repeat(fill))
}

/// Left-aligned table with a dashed rule under the header. Widths count
/// characters, so names with accents line up.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| width(h)).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(width(cell));
        }
    }

    let line = |cells: Vec<String>| println!("{}", cells.join("  ").trim_end());
    line(headers.iter().zip(&widths).map(|(h, &w)| pad(h, w)).collect());
    line(widths.iter().map(|&w| "-".repeat(w)).collect());
    for row in &rows {
        line(row.iter().zip(&widths).map(|(c, &w)| pad(c, w)).collect());
    }
}

/// `label: value` lines with the labels aligned.
pub fn print_fields(fields: &[(&str, String)]) {
    let w = fields.iter().map(|(k, _)| width(k)).max().unwrap_or(0);
    for (k, v) in fields {
        println!("{}  {v}", pad(&format!("{k}:"), w + 1));
    }
}

/// Shorten to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long task title", 10), "a long ...");
    }

    #[test]
    fn pad_counts_chars() {
        assert_eq!(pad("é", 3), "é  ");
        assert_eq!(pad("abcd", 2), "abcd");
    }
}
