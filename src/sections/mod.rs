//! One renderer per manifest section. Renderers only draw through the
//! paginator and never fail: missing optional data is omitted or replaced
//! by a placeholder.

mod action_register;
mod assumptions;
mod attachments;
mod cover;
mod doc_control;
mod executive_summary;
mod module_summary;
mod regulatory;

use crate::assets::ImageAsset;
use crate::manifest::Section;
use crate::model::ReportKind;
use crate::pagination::Paginator;
use crate::types::{Color, Pt};
use chrono::NaiveDate;
use tracing::debug;

const CHIP_COLUMN: i32 = 40;

/// Read-only values shared by every renderer of one build.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub kind: ReportKind,
    pub logo: Option<&'a ImageAsset>,
}

pub fn render(pager: &mut Paginator<'_>, section: &Section, ctx: &RenderContext<'_>) {
    let pages_before = pager.page_count();
    match section {
        Section::SimpleCover(data) => cover::simple(pager, data),
        Section::BrandedCover(data) => cover::branded(pager, data, ctx),
        Section::DocumentControl(data) => doc_control::render(pager, data),
        Section::Contents { entries } => contents(pager, *entries),
        Section::ExecutiveSummary(data) => executive_summary::render(pager, data, ctx),
        Section::PartDivider(title) => part_divider(pager, title),
        Section::Regulatory(data) => regulatory::render(pager, data),
        Section::ModuleSummary(data) => module_summary::render(pager, data),
        Section::ActionRegister(entries) => action_register::render(pager, entries),
        Section::Attachments(entries) => attachments::render(pager, entries),
        Section::Assumptions(data) => assumptions::render(pager, data),
    }
    debug!(
        section = section.name(),
        pages_added = pager.page_count() - pages_before,
        "section rendered"
    );
}

fn contents(pager: &mut Paginator<'_>, entries: usize) {
    let config = pager.config();
    pager.new_page();
    crate::block::heading(pager, "Contents", config.heading(), config.body_size * 3);
    pager.reserve_contents(entries);
}

fn part_divider(pager: &mut Paginator<'_>, title: &str) {
    let config = pager.config();
    let height = config.title_size * 2;
    pager.new_page();
    pager.mark_section(title, 0);
    let (page, top) = pager.place(height);
    page.fill_rect(config.left(), top - height, Pt::from_i32(6), height, config.palette.brand);
    page.text(
        config.left() + Pt::from_i32(16),
        top - config.title_size - config.title_size / 4,
        title,
        config.title(),
    );
    pager.advance(height + config.body_size);
}

/// Priority chip, bold heading beside it and wrapped text below the
/// heading. The heading is kept with the first line of text.
pub(super) fn chip_entry(
    pager: &mut Paginator<'_>,
    chip: &str,
    fill: Color,
    heading: &str,
    text: &str,
) {
    let config = pager.config();
    let indent = Pt::from_i32(CHIP_COLUMN);
    let body = config.body();
    let leading = config.leading(config.body_size);
    let row = leading + Pt::from_i32(2);
    let wrapped = crate::block::wrap_lines(text, config.content_width() - indent, body);
    pager.space(Pt::from_i32(4));
    pager.ensure_room(row + leading);
    let (page, top) = pager.place(row);
    page.chip(
        config.left(),
        top - leading,
        chip,
        fill,
        config.chip_label(),
    );
    page.text(config.left() + indent, top - config.body_size, heading, config.body_bold());
    pager.advance(row);
    crate::block::lines(pager, config.left() + indent, &wrapped, body);
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}
