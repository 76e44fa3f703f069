use std::fmt::Write as _;

use super::pipeline::{BatchOutcome, ResultRow};

pub const TABLE_HEADER: [&str; 3] = ["Filename", "Asset ID", "PlaybackURL"];

/// What the aggregator prints and what it puts on the clipboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub clipboard: String,
    pub summary: String,
}

/// Tab-separated table: header row, then one line per row in the given order.
pub fn tab_table(rows: &[ResultRow]) -> String {
    let mut lines = vec![TABLE_HEADER.join("\t")];
    lines.extend(
        rows.iter()
            .map(|r| format!("{}\t{}\t{}", r.filename, r.asset_id, r.playback_url)),
    );
    lines.join("\n")
}

fn aligned_table(rows: &[ResultRow]) -> String {
    let mut widths = TABLE_HEADER.map(str::len);
    for row in rows {
        widths[0] = widths[0].max(row.filename.chars().count());
        widths[1] = widths[1].max(row.asset_id.chars().count());
        widths[2] = widths[2].max(row.playback_url.chars().count());
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 3]| {
        let _ = writeln!(
            out,
            "  {:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
        );
    };
    line(TABLE_HEADER);
    line([
        &"-".repeat(widths[0]),
        &"-".repeat(widths[1]),
        &"-".repeat(widths[2]),
    ]);
    for row in rows {
        line([&row.filename, &row.asset_id, &row.playback_url]);
    }
    out
}

/// `None` when there is nothing to render. The table form is chosen whenever
/// more than one file was processed, even if only one of them succeeded.
pub fn build_report(outcome: &BatchOutcome) -> Option<Report> {
    let rows = outcome.rows.as_slice();
    match rows {
        [] => None,
        [row] if outcome.total() == 1 => Some(Report {
            clipboard: row.playback_url.clone(),
            summary: format!(
                "Asset {} is ready\n  File:         {}\n  Playback URL: {}\n",
                row.asset_id, row.filename, row.playback_url
            ),
        }),
        _ => Some(Report {
            clipboard: tab_table(rows),
            summary: format!(
                "{} of {} assets ready:\n{}",
                rows.len(),
                outcome.total(),
                aligned_table(rows)
            ),
        }),
    }
}
