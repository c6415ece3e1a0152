//! Cross-cutting page decoration. The draft watermark is stamped by the
//! paginator as each page is created; the footer, contents and superseded
//! passes run once over the finished registry.

use crate::canvas::{Page, TextStyle};
use crate::config::ReportConfig;
use crate::diagnostics::Diagnostics;
use crate::font::TextMeasure;
use crate::pagination::{OnPageHook, PageContext, PageRegistry};
use crate::text::truncate_to_width;
use crate::types::{Color, Pt, Size};
use std::sync::Arc;

pub const WATERMARK_META: &str = "watermark";
pub const OVERLAY_META: &str = "overlay";
pub const FOOTER_META: &str = "footer.page";

const STAMP_ANGLE: f32 = core::f32::consts::FRAC_PI_4;

/// Rotated low-opacity stamp centred on the page.
fn stamp(page: &mut Page, size: Size, text: &str, style: TextStyle, opacity: f32) {
    page.save_state();
    page.set_opacity(opacity, opacity);
    page.translate(size.width.half(), size.height.half());
    page.rotate(STAMP_ANGLE);
    page.text_centered(Pt::ZERO, -(style.size / 3), text, style);
    page.restore_state();
}

/// Creation-time hook stamping "DRAFT" on every page.
pub fn draft_watermark(config: &ReportConfig) -> OnPageHook {
    let size = config.page_size;
    let style = TextStyle::new(config.bold(), Pt::from_i32(110), config.palette.watermark);
    let opacity = config.draft_opacity;
    Arc::new(move |page: &mut Page, _ctx: &PageContext| {
        page.meta(WATERMARK_META, "draft");
        stamp(page, size, "DRAFT", style, opacity);
    })
}

/// Marks every registered page superseded, lead pages included.
pub fn apply_superseded_overlay(registry: &mut PageRegistry, config: &ReportConfig) {
    let size = config.page_size;
    let stamp_style = TextStyle::new(config.bold(), Pt::from_i32(84), config.palette.superseded);
    let banner_style = TextStyle::new(config.bold(), config.body_size, Color::WHITE);
    let banner_height = Pt::from_i32(22);
    let banner_y = size.height - config.margins.top.half() - banner_height.half();
    for page in &mut registry.pages {
        page.meta(OVERLAY_META, "superseded");
        stamp(page, size, "SUPERSEDED", stamp_style, config.superseded_opacity);
        page.fill_rect(
            config.left(),
            banner_y,
            config.content_width(),
            banner_height,
            config.palette.superseded,
        );
        page.text_centered(
            size.width.half(),
            banner_y + Pt::from_i32(7),
            "SUPERSEDED - this document has been replaced by a later version",
            banner_style,
        );
    }
}

/// Stamps `left` and "Page i of N" on every page from the mode's offset.
/// Lead pages are neither stamped nor counted.
pub fn apply_footer(registry: &mut PageRegistry, config: &ReportConfig, left: &str) {
    let total = registry.footer_total();
    let offset = registry.mode.footer_offset();
    let style = config.small();
    let baseline = config.bottom() - Pt::from_i32(22);
    let rule_y = config.bottom() - Pt::from_i32(10);
    for (index, page) in registry.pages.iter_mut().enumerate().skip(offset) {
        let number = index - offset + 1;
        let right = format!("Page {} of {}", number, total);
        let right_width = style.width_of(&right);
        let available = config.content_width() - right_width - Pt::from_i32(12);
        let left_text = truncate_to_width(left, available, style.size, &style.face);
        page.line(
            (config.left(), rule_y),
            (config.right(), rule_y),
            config.palette.rule,
            Pt::from_f32(0.5),
        );
        page.text(config.left(), baseline, &left_text, style);
        page.text_right(config.right(), baseline, &right, style);
        page.meta(FOOTER_META, number.to_string());
    }
}

/// Writes the contents entries into the reserved slot, numbered as the
/// footer numbers pages. Entries continue onto the following reserved pages;
/// anything beyond the reservation is dropped with a diagnostic.
pub fn fill_contents(
    registry: &mut PageRegistry,
    config: &ReportConfig,
    diagnostics: &mut Diagnostics,
) {
    let Some(slot) = registry.contents else {
        return;
    };
    let entries: Vec<(String, u8, usize)> = registry
        .marks
        .iter()
        .filter_map(|mark| {
            registry
                .footer_number(mark.page_index)
                .map(|number| (mark.title.clone(), mark.level, number))
        })
        .collect();

    let leading = config.contents_leading();
    let leader_style = config.small();
    let dot = leader_style.face.measure(".", leader_style.size);
    let last_page = slot.page_index + slot.pages.max(1) - 1;
    let mut page_index = slot.page_index;
    let mut top = slot.top;
    let mut written = 0usize;
    for (title, level, number) in &entries {
        if top - leading < config.bottom() {
            if page_index >= last_page {
                break;
            }
            page_index += 1;
            top = config.top();
        }
        let Some(page) = registry.pages.get_mut(page_index) else {
            break;
        };
        let style = if *level == 0 {
            config.body_bold()
        } else {
            config.body()
        };
        let indent = Pt::from_i32(14) * i32::from(*level);
        let y = top - config.body_size;
        let number_text = number.to_string();
        let number_width = style.width_of(&number_text);
        let title_room = config.content_width() - indent - number_width - Pt::from_i32(24);
        let title_text = truncate_to_width(title, title_room, style.size, &style.face);
        let title_width = page.text(config.left() + indent, y, &title_text, style);
        page.text_right(config.right(), y, &number_text, style);

        let start = config.left() + indent + title_width + Pt::from_i32(6);
        let end = config.right() - number_width - Pt::from_i32(6);
        if dot > Pt::ZERO && end > start {
            let count = ((end - start).to_milli() / dot.to_milli().max(1)) as usize;
            if count > 0 {
                page.text(start, y, &".".repeat(count), leader_style);
            }
        }
        top -= leading;
        written += 1;
    }
    if written < entries.len() {
        diagnostics.warn_on_page(
            "contents.truncated",
            slot.page_index,
            format!("{} contents entries did not fit", entries.len() - written),
        );
    }
}
