use super::{RenderContext, format_date};
use crate::assets::LOGO_RESOURCE;
use crate::block;
use crate::canvas::{Page, TextStyle};
use crate::config::ReportConfig;
use crate::manifest::CoverData;
use crate::pagination::Paginator;
use crate::text::truncate_to_width;
use crate::types::{Color, Pt};

const BAND_HEIGHT: i32 = 150;
const LOGO_HEIGHT: i32 = 72;
const LOGO_MAX_WIDTH: i32 = 180;
const TITLE_MAX_LINES: usize = 3;

fn cover_rows(data: &CoverData) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Site", data.site_name.clone()),
        ("Address", data.site_address.clone()),
        ("Client", data.client.clone()),
        ("Assessor", data.assessor.clone()),
        ("Reviewer", data.reviewer.clone()),
        ("Assessment date", data.assessment_date.map(format_date)),
        ("Issue date", data.issue_date.map(format_date)),
    ];
    rows.push(("Jurisdiction", Some(data.jurisdiction.display_name().to_string())));
    rows.push(("Document reference", Some(data.document_id.clone())));
    rows.push(("Version", Some(format!("v{}", data.version))));
    rows.into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| (label, v))
        })
        .collect()
}

/// Draft cover: flows like any other section and is counted in the footer.
pub(super) fn simple(pager: &mut Paginator<'_>, data: &CoverData) {
    let config = pager.config();
    pager.new_page();
    block::paragraph(pager, &data.report_name, config.subheading());
    block::heading(pager, &data.title, config.title(), config.body_size * 4);
    let status = format!("{} - not for issue", data.status_label);
    let (page, top) = pager.place(config.body_size * 2);
    page.chip(
        config.left(),
        top - config.body_size - config.small_size,
        &status,
        config.palette.muted,
        config.chip_label(),
    );
    pager.advance(config.body_size * 2);
    block::rule(pager);
    for (label, value) in cover_rows(data) {
        block::labeled_field(pager, label, &value);
    }
    if let Some(organisation) = &data.organisation {
        pager.space(config.body_size);
        block::paragraph(pager, &format!("Prepared by {organisation}"), config.small());
    }
}

/// Lead page 1. Drawn at fixed positions so it always occupies exactly one
/// page; long values are truncated rather than wrapped onto a second page.
pub(super) fn branded(pager: &mut Paginator<'_>, data: &CoverData, ctx: &RenderContext<'_>) {
    let config = pager.config();
    let brand = data.brand.unwrap_or(config.palette.brand);
    pager.new_page();
    let (page, _) = pager.place(Pt::ZERO);

    let size = config.page_size;
    let band = Pt::from_i32(BAND_HEIGHT);
    page.fill_rect(Pt::ZERO, size.height - band, size.width, band, brand);
    let band_middle = size.height - band.half();
    draw_brand_mark(page, config, data, ctx, band_middle);

    let code_style = TextStyle::new(config.bold(), config.subheading_size, Color::WHITE);
    page.text_right(
        config.right(),
        band_middle - config.subheading_size / 3,
        ctx.kind.short_code(),
        code_style,
    );

    let mut y = size.height - band - Pt::from_i32(60);
    page.text(config.left(), y, &data.report_name, config.subheading());
    y -= config.leading(config.title_size) + Pt::from_i32(4);

    let title_style = config.title();
    let mut title_lines = block::wrap_lines(&data.title, config.content_width(), title_style);
    if title_lines.len() > TITLE_MAX_LINES {
        let rest = title_lines.split_off(TITLE_MAX_LINES - 1).join(" ");
        title_lines.push(truncate_to_width(
            &rest,
            config.content_width(),
            title_style.size,
            &title_style.face,
        ));
    }
    for line in &title_lines {
        page.text(config.left(), y, line, title_style);
        y -= config.leading(config.title_size);
    }

    y -= Pt::from_i32(6);
    page.chip(
        config.left(),
        y - config.small_size,
        &data.status_label.to_uppercase(),
        brand,
        config.chip_label(),
    );
    y -= Pt::from_i32(40);

    let leading = config.leading(config.body_size) + Pt::from_i32(4);
    let value_x = config.left() + config.label_column;
    let value_width = config.content_width() - config.label_column;
    let body = config.body();
    for (label, value) in cover_rows(data) {
        if y < config.bottom() + leading * 2 {
            break;
        }
        page.text(config.left(), y, label, config.body_bold());
        let shown = truncate_to_width(&value, value_width, body.size, &body.face);
        page.text(value_x, y, &shown, body);
        y -= leading;
    }

    if let Some(organisation) = &data.organisation {
        let footer = format!("Prepared by {organisation}");
        let style = config.small();
        let shown = truncate_to_width(&footer, config.content_width(), style.size, &style.face);
        page.text(config.left(), config.bottom(), &shown, style);
    }
    let remaining = pager.remaining();
    pager.advance(remaining.max(Pt::from_i32(1)));
}

/// Logo when one was resolved, otherwise the organisation name as text.
fn draw_brand_mark(
    page: &mut Page,
    config: &ReportConfig,
    data: &CoverData,
    ctx: &RenderContext<'_>,
    middle: Pt,
) {
    if let Some(logo) = ctx.logo {
        let height = Pt::from_i32(LOGO_HEIGHT);
        let width = (height * logo.aspect()).min(Pt::from_i32(LOGO_MAX_WIDTH));
        let height = if logo.aspect() > 0.0 {
            (width * (1.0 / logo.aspect())).min(height)
        } else {
            height
        };
        page.image(config.left(), middle - height.half(), width, height, LOGO_RESOURCE);
        return;
    }
    let name = data
        .organisation
        .as_deref()
        .unwrap_or(ctx.kind.display_name());
    let style = TextStyle::new(config.bold(), Pt::from_i32(18), Color::WHITE);
    let shown = truncate_to_width(name, config.content_width().half(), style.size, &style.face);
    page.text(config.left(), middle - Pt::from_i32(6), &shown, style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResolvedAssets;
    use crate::canvas::Command;
    use crate::model::{DocumentMode, Jurisdiction, ReportKind};

    fn data() -> CoverData {
        CoverData {
            report_name: "Fire Risk Assessment".to_string(),
            title: "Riverside Warehouse".to_string(),
            version: 3,
            status_label: "Issued".to_string(),
            document_id: "doc-1".to_string(),
            site_name: Some("Riverside".to_string()),
            site_address: Some("1 Quay Street".to_string()),
            client: None,
            assessor: Some("A. Assessor".to_string()),
            reviewer: Some("  ".to_string()),
            assessment_date: None,
            issue_date: None,
            organisation: Some("Acme Fire Ltd".to_string()),
            brand: None,
            jurisdiction: Jurisdiction::Scotland,
        }
    }

    fn ctx(logo: Option<&crate::assets::ImageAsset>) -> RenderContext<'_> {
        RenderContext {
            kind: ReportKind::Fra,
            logo,
        }
    }

    #[test]
    fn blank_rows_are_omitted() {
        let labels: Vec<&str> = cover_rows(&data()).into_iter().map(|(l, _)| l).collect();
        assert!(!labels.contains(&"Client"));
        assert!(!labels.contains(&"Reviewer"));
        assert!(labels.contains(&"Jurisdiction"));
    }

    #[test]
    fn branded_cover_uses_the_logo_when_resolved() {
        let config = ReportConfig::default();
        let assets = ResolvedAssets::with_default_logo();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        branded(&mut pager, &data(), &ctx(assets.logo.as_ref()));
        let (registry, _) = pager.finish();
        assert_eq!(registry.len(), 1);
        assert!(registry.pages[0].commands.iter().any(|c| matches!(
            c,
            Command::DrawImage { resource_id, .. } if resource_id == LOGO_RESOURCE
        )));
        assert!(registry.pages[0].contains_text("Scotland"));
    }

    #[test]
    fn text_only_cover_names_the_organisation() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        let mut cover = data();
        cover.title = "Very long title ".repeat(40);
        branded(&mut pager, &cover, &ctx(None));
        pager.new_page();
        let (registry, _) = pager.finish();
        assert_eq!(registry.len(), 2);
        assert!(registry.pages[0].contains_text("Acme Fire Ltd"));
        assert!(!registry.pages[0]
            .commands
            .iter()
            .any(|c| matches!(c, Command::DrawImage { .. })));
    }

    #[test]
    fn simple_cover_states_draft_status() {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        let mut cover = data();
        cover.status_label = "Draft".to_string();
        simple(&mut pager, &cover);
        let (registry, _) = pager.finish();
        assert!(registry.pages[0].contains_text("Draft - not for issue"));
        assert!(registry.pages[0].contains_text("Riverside Warehouse"));
    }
}
