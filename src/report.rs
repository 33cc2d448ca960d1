//! Markdown coverage report rendering
//!
//! The body is a signature comment, a heading, a summary line and one table
//! row per file. When a character budget is given, whole rows are dropped
//! from the end of the table and replaced by an omitted-count line.

use crate::coverage::{FileDelta, FileStatus, FileSummary, PercentageDelta, ReportDelta};

pub const DEFAULT_TITLE: &str = "Coverage Report";

/// What the rendered report includes
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Line shown under the heading, e.g. which branches are being merged
    pub subtitle: Option<String>,
    pub show_branches: bool,
    pub show_functions: bool,
    pub show_uncovered: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: None,
            show_branches: true,
            show_functions: true,
            show_uncovered: true,
        }
    }
}

impl RenderOptions {
    fn heading(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            self.title.trim()
        }
    }
}

/// Hidden marker identifying reports posted by this tool for a given title
pub fn signature(title: &str) -> String {
    let title = if title.trim().is_empty() { DEFAULT_TITLE } else { title.trim() };

    // `--` must not appear inside an HTML comment
    let mut safe = title.to_string();
    while safe.contains("--") {
        safe = safe.replace("--", "- -");
    }
    format!("<!-- lcov-reporter: {} -->", safe)
}

/// Render the full report
pub fn render(delta: &ReportDelta, options: &RenderOptions) -> String {
    render_within(delta, options, usize::MAX)
}

/// Render the report in at most `max_chars` characters, dropping trailing rows as needed
pub fn render_within(delta: &ReportDelta, options: &RenderOptions, max_chars: usize) -> String {
    let head = build_head(delta, options);
    let rows: Vec<String> = delta
        .files
        .iter()
        .map(|row| build_row(row, delta.has_baseline(), options))
        .collect();

    if rows.is_empty() {
        return fit_head(head + "_No files to report._\n", max_chars);
    }

    let table_head = build_table_head(delta.has_baseline(), options);
    let head_len = head.chars().count();
    let table_head_len = table_head.chars().count();

    let mut row_lens = Vec::with_capacity(rows.len());
    let mut rows_len = 0usize;
    for row in &rows {
        rows_len += row.chars().count();
        row_lens.push(rows_len);
    }

    if head_len + table_head_len + rows_len <= max_chars {
        return head + &table_head + &rows.concat();
    }

    // largest prefix of rows that still leaves room for the omitted marker
    for keep in (1..rows.len()).rev() {
        let marker = omitted_marker(rows.len() - keep);
        let total = head_len + table_head_len + row_lens[keep - 1] + marker.chars().count();
        if total <= max_chars {
            return head + &table_head + &rows[..keep].concat() + &marker;
        }
    }

    let marker = omitted_marker(rows.len());
    if head_len + marker.chars().count() <= max_chars {
        return head + &marker;
    }

    fit_head(head, max_chars)
}

/// Last resort when not even the heading fits: cut at a line boundary
fn fit_head(head: String, max_chars: usize) -> String {
    if head.chars().count() <= max_chars {
        return head;
    }

    let mut out = String::new();
    let mut used = 0usize;
    for line in head.split_inclusive('\n') {
        let len = line.chars().count();
        if used + len > max_chars {
            break;
        }
        out.push_str(line);
        used += len;
    }
    out
}

fn omitted_marker(count: usize) -> String {
    let noun = if count == 1 { "file" } else { "files" };
    format!("\n_{} {} omitted_\n", count, noun)
}

fn build_head(delta: &ReportDelta, options: &RenderOptions) -> String {
    let mut head = format!("{}\n## {}\n", signature(&options.title), options.heading());

    if let Some(ref subtitle) = options.subtitle {
        head.push_str(&format!("\n{}\n", subtitle));
    }

    let current = &delta.current;
    let totals = delta.delta.as_ref();

    let mut parts = vec![summary_part(
        "Lines",
        current.line_percentage(),
        totals.map(|d| d.lines),
        current.lines_hit,
        current.lines_found,
    )];
    if options.show_branches {
        parts.push(summary_part(
            "Branches",
            current.branch_percentage(),
            totals.map(|d| d.branches),
            current.branches_hit,
            current.branches_found,
        ));
    }
    if options.show_functions {
        parts.push(summary_part(
            "Functions",
            current.function_percentage(),
            totals.map(|d| d.functions),
            current.functions_hit,
            current.functions_found,
        ));
    }

    head.push_str(&format!("\n{}\n\n", parts.join(" · ")));
    head
}

fn summary_part(label: &str, pct: f64, delta: Option<f64>, hit: u64, found: u64) -> String {
    let mut part = format!("**{}:** {} ({}/{})", label, format_pct(pct), hit, found);
    if let Some(d) = delta {
        part.push_str(&format!(" {}", format_delta(d)));
    }
    part
}

fn build_table_head(has_baseline: bool, options: &RenderOptions) -> String {
    let mut titles = vec!["File", "Lines"];
    let mut aligns = vec![":---", "---:"];

    if has_baseline {
        titles.push("Δ Lines");
        aligns.push("---:");
    }
    if options.show_branches {
        titles.push("Branches");
        aligns.push("---:");
    }
    if options.show_functions {
        titles.push("Functions");
        aligns.push("---:");
    }
    if options.show_uncovered {
        titles.push("Uncovered Lines");
        aligns.push(":---");
    }

    format!("| {} |\n|{}|\n", titles.join(" | "), aligns.join("|"))
}

fn build_row(row: &FileDelta, has_baseline: bool, options: &RenderOptions) -> String {
    let current = row.current.as_ref();
    let pct = |f: fn(&FileSummary) -> f64| {
        current.map(|s| format_pct(f(s))).unwrap_or_else(|| "-".to_string())
    };

    let mut cells = vec![escape_cell(&row.path), pct(FileSummary::line_percentage)];

    if has_baseline {
        cells.push(match row.status() {
            FileStatus::New => "new".to_string(),
            FileStatus::Removed => "removed".to_string(),
            FileStatus::Shared => row
                .delta
                .as_ref()
                .map(|d: &PercentageDelta| format_delta(d.lines))
                .unwrap_or_default(),
        });
    }
    if options.show_branches {
        cells.push(pct(FileSummary::branch_percentage));
    }
    if options.show_functions {
        cells.push(pct(FileSummary::function_percentage));
    }
    if options.show_uncovered {
        cells.push(format_ranges(&row.uncovered_lines));
    }

    format!("| {} |\n", cells.join(" | "))
}

fn format_pct(pct: f64) -> String {
    format!("{:.2}%", pct)
}

fn format_delta(delta: f64) -> String {
    let rounded = format!("{:.2}", delta.abs());
    if rounded == "0.00" {
        "→ 0.00%".to_string()
    } else if delta > 0.0 {
        format!("↑ +{}%", rounded)
    } else {
        format!("↓ -{}%", rounded)
    }
}

/// Compress sorted line numbers into ranges: `[3, 4, 5, 9]` -> `3-5, 9`
pub fn format_ranges(lines: &[u32]) -> String {
    let mut ranges: Vec<String> = Vec::new();
    let mut iter = lines.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = end.checked_add(1) {
            if iter.peek() != Some(&next) {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            ranges.push(start.to_string());
        } else {
            ranges.push(format!("{}-{}", start, end));
        }
    }

    ranges.join(", ")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{diff, parse_lcov_string, CoverageModel};

    fn model(files: &[(&str, u32, u32)]) -> CoverageModel {
        let mut text = String::new();
        for (path, found, hit) in files {
            text.push_str(&format!("SF:{}\n", path));
            for line in 1..=*found {
                text.push_str(&format!("DA:{},{}\n", line, u32::from(line <= *hit)));
            }
            text.push_str("end_of_record\n");
        }
        parse_lcov_string(&text)
    }

    fn many_files(n: usize) -> CoverageModel {
        let names: Vec<String> = (0..n).map(|i| format!("src/module_{:03}.js", i)).collect();
        let files: Vec<(&str, u32, u32)> = names.iter().map(|n| (n.as_str(), 10, 7)).collect();
        model(&files)
    }

    #[test]
    fn test_render_with_baseline() {
        let current = model(&[("a.js", 10, 8), ("b.js", 5, 5)]);
        let baseline = model(&[("a.js", 10, 5)]);
        let report = diff(&current, Some(&baseline));

        let body = render(&report, &RenderOptions::default());

        assert!(body.starts_with("<!-- lcov-reporter: Coverage Report -->\n## Coverage Report\n"));
        assert!(body.contains("**Lines:** 86.67% (13/15) ↑ +36.67%"));
        assert!(body
            .contains("| File | Lines | Δ Lines | Branches | Functions | Uncovered Lines |"));
        assert!(body.contains("| a.js | 80.00% | ↑ +30.00% | 100.00% | 100.00% | 9-10 |"));
        assert!(body.contains("| b.js | 100.00% | new | 100.00% | 100.00% |  |"));
    }

    #[test]
    fn test_render_without_baseline_has_no_delta_column() {
        let report = diff(&model(&[("a.js", 4, 1)]), None);
        let options = RenderOptions {
            title: "Frontend".to_string(),
            show_branches: false,
            show_functions: false,
            show_uncovered: false,
            ..Default::default()
        };

        let body = render(&report, &options);

        assert!(body.contains("## Frontend\n"));
        assert!(!body.contains("Δ"));
        assert!(!body.contains("Branches"));
        assert!(body.contains("| File | Lines |\n|:---|---:|\n| a.js | 25.00% |\n"));
    }

    #[test]
    fn test_removed_row() {
        let current = model(&[("a.js", 1, 1)]);
        let baseline = model(&[("a.js", 1, 1), ("old.js", 2, 1)]);
        let report = diff(&current, Some(&baseline));
        let body = render(&report, &RenderOptions::default());
        assert!(body.contains("| old.js | - | removed | - | - |  |"));
        assert!(body.contains("| a.js | 100.00% | → 0.00% |"));
    }

    #[test]
    fn test_truncates_at_row_boundary() {
        let report = diff(&many_files(200), None);
        let options = RenderOptions::default();
        let full = render(&report, &options);
        let budget = full.chars().count() / 3;

        let body = render_within(&report, &options, budget);

        assert!(body.chars().count() <= budget);
        assert!(body.contains("files omitted_"));
        // every table line is a complete row
        for line in body.lines().filter(|l| l.starts_with("| ")) {
            assert!(line.ends_with('|'));
            assert_eq!(line.matches(" | ").count(), 4);
        }

        let kept = body.lines().filter(|l| l.starts_with("| src/")).count();
        assert!(body.contains(&format!("_{} files omitted_", 200 - kept)));
    }

    #[test]
    fn test_fits_unchanged_when_under_budget() {
        let report = diff(&many_files(3), None);
        let options = RenderOptions::default();
        let full = render(&report, &options);

        assert_eq!(render_within(&report, &options, full.chars().count()), full);
    }

    #[test]
    fn test_tiny_budget_never_exceeded() {
        let report = diff(&many_files(5), None);
        let body = render_within(&report, &RenderOptions::default(), 20);
        assert!(body.chars().count() <= 20);
        assert!(!body.contains('|'));
    }

    #[test]
    fn test_empty_rows() {
        let report = diff(&CoverageModel::default(), None);
        let body = render(&report, &RenderOptions::default());
        assert!(body.contains("_No files to report._"));
    }

    #[test]
    fn test_format_ranges() {
        assert_eq!(format_ranges(&[]), "");
        assert_eq!(format_ranges(&[3, 4, 5, 9]), "3-5, 9");
        assert_eq!(format_ranges(&[1, 3, 5, 6]), "1, 3, 5-6");
        assert_eq!(format_ranges(&[u32::MAX - 1, u32::MAX]), "4294967294-4294967295");
        assert_eq!(format_ranges(&[2, u32::MAX]), "2, 4294967295");
    }

    #[test]
    fn test_render_highest_line_number() {
        let report = diff(&parse_lcov_string("SF:a.js\nDA:4294967295,0\nend_of_record\n"), None);
        let body = render(&report, &RenderOptions::default());
        assert!(body.contains("| 4294967295 |"));
    }

    #[test]
    fn test_signature_cannot_close_early() {
        assert_eq!(signature(""), "<!-- lcov-reporter: Coverage Report -->");
        for title in ["a--->b", "x---y", "----", "a-- --b"] {
            let sig = signature(title);
            let inner = &sig["<!-- ".len()..sig.len() - " -->".len()];
            assert!(!inner.contains("--"), "{} -> {}", title, sig);
        }
    }

    #[test]
    fn test_pipes_in_paths_are_escaped() {
        let report = diff(&model(&[("we|ird.js", 1, 1)]), None);
        let body = render(&report, &RenderOptions::default());
        assert!(body.contains("| we\\|ird.js |"));
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(30.0), "↑ +30.00%");
        assert_eq!(format_delta(-2.5), "↓ -2.50%");
        assert_eq!(format_delta(-0.0001), "→ 0.00%");
    }
}
