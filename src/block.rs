//! Flowing content blocks. Each block measures its wrapped lines first, then
//! places them one at a time through the paginator, so a block may span
//! pages but a line never does.

use crate::canvas::TextStyle;
use crate::config::ReportConfig;
use crate::pagination::Paginator;
use crate::text::{wrap_text, wrap_text_within};
use crate::types::{Color, Pt};

const CELL_PAD: i32 = 4;
const BOX_PAD: i32 = 8;

/// Wraps text to `width`, honouring explicit line breaks.
pub fn wrap_lines(text: &str, width: Pt, style: TextStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        lines.extend(wrap_text(paragraph, width, style.size, &style.face));
    }
    lines
}

/// [`wrap_lines`] for table cells, where no line may overhang the column.
fn wrap_cell(text: &str, width: Pt, style: TextStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        lines.extend(wrap_text_within(paragraph, width, style.size, &style.face));
    }
    lines
}

/// Places pre-wrapped lines at `x`, one line box per line.
pub fn lines(pager: &mut Paginator<'_>, x: Pt, lines: &[String], style: TextStyle) {
    let height = pager.config().leading(style.size);
    for line in lines {
        let (page, top) = pager.place(height);
        page.text(x, top - style.size, line, style);
        pager.advance(height);
    }
}

pub fn paragraph(pager: &mut Paginator<'_>, text: &str, style: TextStyle) {
    let config = pager.config();
    let wrapped = wrap_lines(text, config.content_width(), style);
    lines(pager, config.left(), &wrapped, style);
    pager.space(style.size.half());
}

/// Heading kept on one page with at least `keep_with` of what follows.
pub fn heading(pager: &mut Paginator<'_>, text: &str, style: TextStyle, keep_with: Pt) {
    let config = pager.config();
    let wrapped = wrap_lines(text, config.content_width(), style);
    let total = config.leading(style.size) * wrapped.len() as i32;
    pager.space(style.size.half());
    pager.ensure_room(total + keep_with);
    lines(pager, config.left(), &wrapped, style);
    pager.advance(style.size / 4);
}

/// Heading listed in the table of contents. Level 0 is underlined.
pub fn section_heading(pager: &mut Paginator<'_>, title: &str, level: u8) {
    let config = pager.config();
    let style = if level == 0 {
        config.heading()
    } else {
        config.subheading()
    };
    pager.mark_section(title, level);
    heading(pager, title, style, config.leading(config.body_size) * 3);
    if level == 0 {
        let (page, top) = pager.place(Pt::from_i32(8));
        page.line(
            (config.left(), top),
            (config.right(), top),
            config.palette.brand,
            Pt::from_f32(0.8),
        );
        pager.advance(Pt::from_i32(8));
    }
}

/// Thin separator across the content width.
pub fn rule(pager: &mut Paginator<'_>) {
    let config = pager.config();
    let (page, top) = pager.place(Pt::from_i32(6));
    let y = top - Pt::from_i32(3);
    page.line(
        (config.left(), y),
        (config.right(), y),
        config.palette.rule,
        Pt::from_f32(0.5),
    );
    pager.advance(Pt::from_i32(6));
}

/// Bold label in the label column, wrapped value beside it. A blank value
/// draws nothing and returns false.
pub fn labeled_field(pager: &mut Paginator<'_>, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    let config = pager.config();
    let label_style = config.body_bold();
    let value_style = config.body();
    let gutter = Pt::from_i32(8);
    let label_lines = wrap_lines(label, config.label_column - gutter, label_style);
    let value_lines = wrap_lines(
        value,
        config.content_width() - config.label_column,
        value_style,
    );
    let height = config.leading(config.body_size);
    let rows = label_lines.len().max(value_lines.len());
    let value_x = config.left() + config.label_column;
    for row in 0..rows {
        let (page, top) = pager.place(height);
        let y = top - config.body_size;
        if let Some(text) = label_lines.get(row) {
            page.text(config.left(), y, text, label_style);
        }
        if let Some(text) = value_lines.get(row) {
            page.text(value_x, y, text, value_style);
        }
        pager.advance(height);
    }
    true
}

/// Hanging-indent list with a dash marker.
pub fn bullet_list(pager: &mut Paginator<'_>, items: &[String], style: TextStyle) {
    let config = pager.config();
    bullets_at(pager, config.left(), config.content_width(), items, style);
}

fn bullets_at(pager: &mut Paginator<'_>, x: Pt, width: Pt, items: &[String], style: TextStyle) {
    let indent = style.size + Pt::from_i32(2);
    let height = pager.config().leading(style.size);
    for item in items {
        let wrapped = wrap_lines(item, width - indent, style);
        for (i, line) in wrapped.iter().enumerate() {
            let (page, top) = pager.place(height);
            let y = top - style.size;
            if i == 0 {
                page.text(x, y, "-", style);
            }
            page.text(x + indent, y, line, style);
            pager.advance(height);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalloutGroup {
    pub heading: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Callout {
    pub title: String,
    pub groups: Vec<CalloutGroup>,
    pub fill: Color,
    pub border: Color,
}

enum CalloutLine {
    Title(String),
    Heading(String),
    Bullet { first: bool, text: String },
    Gap,
}

/// Bordered box sized from its measured contents. A box taller than a whole
/// page is flowed as an unboxed list with an accent bar instead.
pub fn callout(pager: &mut Paginator<'_>, callout: &Callout) {
    let config = pager.config();
    let pad = Pt::from_i32(BOX_PAD);
    let body = config.body();
    let bold = config.body_bold();
    let indent = body.size + Pt::from_i32(2);
    let inner = config.content_width() - pad * 2;
    let leading = config.leading(config.body_size);

    let mut planned = Vec::new();
    for line in wrap_lines(&callout.title, inner, bold) {
        planned.push(CalloutLine::Title(line));
    }
    for group in &callout.groups {
        if group.items.is_empty() {
            continue;
        }
        planned.push(CalloutLine::Gap);
        if let Some(heading) = &group.heading {
            for line in wrap_lines(heading, inner, bold) {
                planned.push(CalloutLine::Heading(line));
            }
        }
        for item in &group.items {
            for (i, line) in wrap_lines(item, inner - indent, body).into_iter().enumerate() {
                planned.push(CalloutLine::Bullet {
                    first: i == 0,
                    text: line,
                });
            }
        }
    }

    let gap = pad.half();
    let content: Pt = planned
        .iter()
        .map(|line| match line {
            CalloutLine::Gap => gap,
            _ => leading,
        })
        .sum();
    let total = content + pad * 2;

    pager.space(Pt::from_i32(4));
    if total > config.content_height() {
        pager
            .diagnostics_mut()
            .info("layout.callout_flowed", format!("'{}' exceeds one page", callout.title));
        flow_callout(pager, &planned, callout.border, indent);
        pager.space(Pt::from_i32(6));
        return;
    }

    let (page, top) = pager.place(total);
    let left = config.left();
    page.fill_rect(left, top - total, config.content_width(), total, callout.fill);
    page.stroke_rect(
        left,
        top - total,
        config.content_width(),
        total,
        callout.border,
        Pt::from_i32(1),
    );
    let x = left + pad;
    let mut y = top - pad;
    for line in &planned {
        match line {
            CalloutLine::Gap => {
                y -= gap;
                continue;
            }
            CalloutLine::Title(text) | CalloutLine::Heading(text) => {
                page.text(x, y - bold.size, text, bold);
            }
            CalloutLine::Bullet { first, text } => {
                if *first {
                    page.text(x, y - body.size, "-", body);
                }
                page.text(x + indent, y - body.size, text, body);
            }
        }
        y -= leading;
    }
    pager.advance(total);
    pager.space(Pt::from_i32(6));
}

fn flow_callout(pager: &mut Paginator<'_>, planned: &[CalloutLine], accent: Color, indent: Pt) {
    let config = pager.config();
    let body = config.body();
    let bold = config.body_bold();
    let leading = config.leading(config.body_size);
    let x = config.left() + Pt::from_i32(BOX_PAD);
    for line in planned {
        if matches!(line, CalloutLine::Gap) {
            pager.space(Pt::from_i32(BOX_PAD / 2));
            continue;
        }
        let (page, top) = pager.place(leading);
        page.fill_rect(config.left(), top - leading, Pt::from_i32(3), leading, accent);
        let y = top - body.size;
        match line {
            CalloutLine::Title(text) | CalloutLine::Heading(text) => {
                page.text(x, y, text, bold);
            }
            CalloutLine::Bullet { first, text } => {
                if *first {
                    page.text(x, y, "-", body);
                }
                page.text(x + indent, y, text, body);
            }
            CalloutLine::Gap => {}
        }
        pager.advance(leading);
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    /// Share of the content width; shares are normalised over all columns.
    pub share: f32,
}

impl Column {
    pub fn new(title: impl Into<String>, share: f32) -> Self {
        Self {
            title: title.into(),
            share,
        }
    }
}

struct TableLayout {
    widths: Vec<Pt>,
    header: Vec<Vec<String>>,
    header_height: Pt,
    rows: Vec<(Vec<Vec<String>>, Pt)>,
}

fn layout_table(config: &ReportConfig, columns: &[Column], rows: &[Vec<String>]) -> TableLayout {
    let widths = column_widths(config.content_width(), columns);
    let (header_style, cell_style) = table_styles(config);
    let pad = Pt::from_i32(CELL_PAD);
    let leading = config.leading(config.small_size);

    let header: Vec<Vec<String>> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| wrap_cell(&c.title, *w - pad * 2, header_style))
        .collect();
    let header_height = row_height(&header, leading, pad);
    let rows = rows
        .iter()
        .map(|row| {
            let cells: Vec<Vec<String>> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    wrap_cell(text, *w - pad * 2, cell_style)
                })
                .collect();
            let height = row_height(&cells, leading, pad);
            (cells, height)
        })
        .collect();
    TableLayout {
        widths,
        header,
        header_height,
        rows,
    }
}

fn table_styles(config: &ReportConfig) -> (TextStyle, TextStyle) {
    (
        TextStyle::new(config.bold(), config.small_size, config.palette.brand),
        TextStyle::new(config.regular(), config.small_size, config.palette.text),
    )
}

/// Header height and per-row heights [`table`] would use, without drawing.
pub fn measure_table(
    config: &ReportConfig,
    columns: &[Column],
    rows: &[Vec<String>],
) -> (Pt, Vec<Pt>) {
    if columns.is_empty() {
        return (Pt::ZERO, vec![Pt::ZERO; rows.len()]);
    }
    let layout = layout_table(config, columns, rows);
    let heights = layout.rows.iter().map(|(_, h)| *h).collect();
    (layout.header_height, heights)
}

/// Table whose header row repeats on every page the table reaches. A row
/// taller than a page flows line by line across pages.
pub fn table(pager: &mut Paginator<'_>, columns: &[Column], rows: &[Vec<String>]) {
    if columns.is_empty() {
        return;
    }
    let config = pager.config();
    let layout = layout_table(config, columns, rows);
    let (header_style, cell_style) = table_styles(config);
    let pad = Pt::from_i32(CELL_PAD);
    let fresh_room = config.content_height() - layout.header_height;
    let first_band = config.leading(cell_style.size) + pad;

    let first = match layout.rows.first() {
        Some((_, h)) if *h <= fresh_room => *h,
        Some(_) => first_band,
        None => Pt::ZERO,
    };
    pager.ensure_room(layout.header_height + first);
    draw_header(pager, &layout, header_style);

    for (cells, height) in &layout.rows {
        if pager.fits(*height) {
            draw_row(pager, &layout.widths, cells, *height, cell_style, false);
        } else if *height <= fresh_room {
            pager.new_page();
            draw_header(pager, &layout, header_style);
            draw_row(pager, &layout.widths, cells, *height, cell_style, false);
        } else {
            flow_row(pager, &layout, cells, header_style, cell_style);
        }
    }
    pager.space(Pt::from_i32(6));
}

fn draw_header(pager: &mut Paginator<'_>, layout: &TableLayout, style: TextStyle) {
    draw_row(pager, &layout.widths, &layout.header, layout.header_height, style, true);
}

/// Draws a row one line band at a time, continuing on a new page (under a
/// repeated header) whenever the next band does not fit.
fn flow_row(
    pager: &mut Paginator<'_>,
    layout: &TableLayout,
    cells: &[Vec<String>],
    header_style: TextStyle,
    style: TextStyle,
) {
    let config = pager.config();
    let leading = config.leading(style.size);
    let pad = Pt::from_i32(CELL_PAD);
    let bands = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);

    for band in 0..bands {
        let lead = if band == 0 { pad.half() } else { Pt::ZERO };
        let tail = if band + 1 == bands { pad.half() } else { Pt::ZERO };
        if !pager.fits(lead + leading + tail) {
            pager.new_page();
            draw_header(pager, layout, header_style);
        }
        let (page, top) = pager.place(lead + leading + tail);
        let y = top - lead - style.size;
        let mut x = config.left();
        for (cell, width) in cells.iter().zip(&layout.widths) {
            if let Some(line) = cell.get(band) {
                page.text(x + pad, y, line, style);
            }
            x += *width;
        }
        pager.advance(lead + leading);
    }

    let (page, top) = pager.place(pad.half());
    let bottom = top - pad.half();
    page.line(
        (config.left(), bottom),
        (config.right(), bottom),
        config.palette.rule,
        Pt::from_f32(0.5),
    );
    pager.advance(pad.half());
}

fn column_widths(total: Pt, columns: &[Column]) -> Vec<Pt> {
    let sum: f32 = columns.iter().map(|c| c.share.max(0.0)).sum();
    if sum <= 0.0 {
        let each = total / columns.len() as i32;
        return vec![each; columns.len()];
    }
    columns
        .iter()
        .map(|c| total * (c.share.max(0.0) / sum))
        .collect()
}

fn row_height(cells: &[Vec<String>], leading: Pt, pad: Pt) -> Pt {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    leading * lines as i32 + pad
}

fn draw_row(
    pager: &mut Paginator<'_>,
    widths: &[Pt],
    cells: &[Vec<String>],
    height: Pt,
    style: TextStyle,
    header: bool,
) {
    let config = pager.config();
    let leading = config.leading(style.size);
    let pad = Pt::from_i32(CELL_PAD);
    let (page, top) = pager.place(height);
    let bottom = top - height;
    if header {
        page.fill_rect(
            config.left(),
            bottom,
            config.content_width(),
            height,
            config.palette.callout_fill,
        );
    }
    let mut x = config.left();
    for (cell, width) in cells.iter().zip(widths) {
        let mut y = top - pad.half() - style.size;
        for line in cell {
            page.text(x + pad, y, line, style);
            y -= leading;
        }
        x += *width;
    }
    page.line(
        (config.left(), bottom),
        (config.right(), bottom),
        config.palette.rule,
        Pt::from_f32(0.5),
    );
    pager.advance(height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentMode;

    fn long_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn long_paragraph_spans_pages_without_splitting_lines() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        paragraph(&mut pager, &long_text(2500), config.body());
        let (registry, _) = pager.finish();
        assert!(registry.len() > 1);
        for page in &registry.pages {
            for cmd in &page.commands {
                if let crate::canvas::Command::DrawString { y, .. } = cmd {
                    assert!(*y >= config.bottom());
                    assert!(*y <= config.top());
                }
            }
        }
    }

    #[test]
    fn blank_labeled_field_is_omitted() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        assert!(!labeled_field(&mut pager, "Owner", "  "));
        assert_eq!(pager.page_count(), 0);
        assert!(labeled_field(&mut pager, "Owner", "Facilities manager"));
        let (registry, _) = pager.finish();
        assert!(registry.pages[0].contains_text("Facilities manager"));
    }

    #[test]
    fn callout_is_boxed_when_it_fits() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        let callout_box = Callout {
            title: "Information gap".to_string(),
            groups: vec![CalloutGroup {
                heading: Some("Reasons".to_string()),
                items: vec!["Alarm test records not seen".to_string()],
            }],
            fill: config.palette.callout_fill,
            border: config.palette.callout_border,
        };
        callout(&mut pager, &callout_box);
        let (registry, _) = pager.finish();
        let page = &registry.pages[0];
        assert!(page
            .commands
            .iter()
            .any(|c| matches!(c, crate::canvas::Command::StrokeRect { .. })));
        assert!(page.contains_text("Alarm test records not seen"));
    }

    #[test]
    fn table_header_repeats_after_a_break() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        let columns = vec![Column::new("Version", 1.0), Column::new("Summary", 4.0)];
        let rows: Vec<Vec<String>> = (0..120)
            .map(|i| vec![i.to_string(), format!("Revision {i}")])
            .collect();
        table(&mut pager, &columns, &rows);
        let (registry, _) = pager.finish();
        assert!(registry.len() >= 2);
        for page in &registry.pages {
            assert!(page.contains_text("Summary"));
        }
    }

    fn strings(page: &crate::canvas::Page) -> Vec<(Pt, Pt, &str)> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                crate::canvas::Command::DrawString { x, y, text } => Some((*x, *y, text.as_str())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn oversized_row_flows_within_the_margins() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        paragraph(&mut pager, "Supporting evidence.", config.body());
        let columns = vec![
            Column::new("Ref", 1.0),
            Column::new("File", 2.0),
            Column::new("Caption", 4.0),
        ];
        let rows = vec![
            vec!["E-001".to_string(), "plan.pdf".to_string(), long_text(900)],
            vec!["E-002".to_string(), "photo.jpg".to_string(), "Rear stair".to_string()],
        ];
        table(&mut pager, &columns, &rows);
        let (registry, _) = pager.finish();
        assert!(registry.len() >= 2);

        let titles = ["Ref", "File", "Caption"];
        let mut words = 0;
        for page in &registry.pages {
            let drawn = strings(page);
            for (_, y, _) in &drawn {
                assert!(*y >= config.bottom());
                assert!(*y <= config.top());
            }
            let body: Vec<&str> = drawn
                .iter()
                .map(|(_, _, text)| *text)
                .filter(|text| !titles.contains(text))
                .collect();
            assert!(!body.is_empty(), "page {} holds only the header", page.index());
            words += body
                .iter()
                .flat_map(|t| t.split_whitespace())
                .filter(|w| w.starts_with("word"))
                .count();
        }
        assert_eq!(words, 900);
        assert!(registry.pages.last().is_some_and(|p| p.contains_text("Rear stair")));
    }

    #[test]
    fn unspaced_cell_text_stays_in_its_column() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        let columns = vec![
            Column::new("Ref", 0.8),
            Column::new("File", 2.2),
            Column::new("Type", 1.6),
            Column::new("Caption", 2.6),
            Column::new("Related to", 2.0),
        ];
        let rows = vec![vec![
            "E-001".to_string(),
            "2026-03-01_rear_stair_core_level2_photo.jpg".to_string(),
            "image/jpeg, 2.5 MB".to_string(),
            "Rear stair core, level 2".to_string(),
            "Means of Escape, A-003".to_string(),
        ]];
        table(&mut pager, &columns, &rows);
        let (registry, _) = pager.finish();

        let (header_style, cell_style) = table_styles(&config);
        let pad = Pt::from_i32(CELL_PAD);
        let widths = column_widths(config.content_width(), &columns);
        let mut edges = Vec::new();
        let mut left = config.left();
        for width in &widths {
            edges.push((left, left + *width));
            left += *width;
        }
        for (x, _, text) in strings(&registry.pages[0]) {
            let style = if columns.iter().any(|c| c.title == text) {
                header_style
            } else {
                cell_style
            };
            let (_, right) = edges
                .iter()
                .copied()
                .find(|(l, r)| x >= *l && x < *r)
                .expect("string starts inside a column");
            assert!(x + style.width_of(text) <= right - pad, "{text} overhangs its column");
        }
        assert!(registry.pages[0].contains_text("2026-03-01_rear"));
    }

    #[test]
    fn measured_heights_match_wrapped_rows() {
        let config = ReportConfig::default();
        let columns = vec![Column::new("Version", 1.0), Column::new("Summary", 1.0)];
        let rows = vec![
            vec!["1".to_string(), "Short".to_string()],
            vec!["2".to_string(), long_text(80)],
        ];
        let (header, heights) = measure_table(&config, &columns, &rows);
        assert!(header > Pt::ZERO);
        assert_eq!(heights.len(), 2);
        assert!(heights[1] > heights[0]);
    }
}
