use super::format_date;
use crate::block::{self, Column};
use crate::manifest::DocumentControlData;
use crate::model::RevisionEntry;
use crate::pagination::Paginator;
use crate::text::truncate_to_width;
use crate::types::Pt;

fn revision_columns() -> Vec<Column> {
    vec![
        Column::new("Version", 0.8),
        Column::new("Date", 1.2),
        Column::new("Author", 1.6),
        Column::new("Status", 1.0),
        Column::new("Summary", 4.0),
    ]
}

fn revision_row(entry: &RevisionEntry) -> Vec<String> {
    vec![
        format!("v{}", entry.version),
        entry.date.map(format_date).unwrap_or_default(),
        entry.author.clone().unwrap_or_default(),
        entry.status.map(|s| s.label().to_string()).unwrap_or_default(),
        entry.summary.clone(),
    ]
}

/// Number of leading rows that fit in `available`, keeping room for the
/// elision note whenever some rows are dropped.
fn rows_that_fit(header: Pt, heights: &[Pt], available: Pt, note: Pt) -> usize {
    let total: Pt = heights.iter().copied().sum();
    if header + total <= available {
        return heights.len();
    }
    let budget = available - note - header;
    let mut used = Pt::ZERO;
    let mut count = 0;
    for height in heights {
        if used + *height > budget {
            break;
        }
        used += *height;
        count += 1;
    }
    count
}

/// Lead page 2. Field values are cut to one line and the revision table is
/// cut to the rows that fit, so the page never overflows.
pub(super) fn render(pager: &mut Paginator<'_>, data: &DocumentControlData) {
    let config = pager.config();
    pager.new_page();
    block::heading(pager, "Document control", config.heading(), Pt::ZERO);
    block::rule(pager);

    let leading = config.leading(config.body_size);
    let value_width = config.content_width() - config.label_column;
    let body = config.body();
    for field in &data.fields {
        if field.value.trim().is_empty() || !pager.fits(leading * 6) {
            continue;
        }
        let (page, top) = pager.place(leading);
        let y = top - config.body_size;
        page.text(config.left(), y, &field.label, config.body_bold());
        let shown = truncate_to_width(&field.value, value_width, body.size, &body.face);
        page.text(config.left() + config.label_column, y, &shown, body);
        pager.advance(leading);
    }

    pager.space(config.body_size);
    block::heading(pager, "Revision history", config.subheading(), Pt::ZERO);
    if data.revisions.is_empty() {
        block::paragraph(pager, "No revision history recorded.", config.small());
        return;
    }

    let columns = revision_columns();
    let rows: Vec<Vec<String>> = data.revisions.iter().map(revision_row).collect();
    let (header, heights) = block::measure_table(config, &columns, &rows);
    let note_height = config.leading(config.small_size) + Pt::from_i32(8);
    let shown = rows_that_fit(header, &heights, pager.remaining(), note_height);
    if shown > 0 {
        block::table(pager, &columns, &rows[..shown]);
    }
    let hidden = rows.len() - shown;
    if hidden > 0 {
        let plural = if hidden == 1 { "revision" } else { "revisions" };
        let note = format!("+{hidden} earlier {plural} not shown");
        let height = config.leading(config.small_size);
        if pager.fits(height) {
            let (page, top) = pager.place(height);
            page.text(config.left(), top - config.small_size, &note, config.small());
            pager.advance(height);
        }
        pager
            .diagnostics_mut()
            .info("doc_control.revisions_elided", note);
    }
}
