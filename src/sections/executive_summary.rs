use super::{RenderContext, chip_entry};
use crate::block::{self, Column};
use crate::manifest::ExecutiveSummaryData;
use crate::model::PriorityBand;
use crate::pagination::Paginator;
use crate::rules::{OutcomeSource, OutcomeStrategy};
use crate::types::Pt;

fn strategy_note(data: &ExecutiveSummaryData) -> &'static str {
    match (data.strategy, data.outcome.source) {
        (OutcomeStrategy::EngineDerived, _) => {
            "Outcome derived from the module findings and the open actions."
        }
        (OutcomeStrategy::AssessorWithFallback, OutcomeSource::Engine) => {
            "No overall rating was entered by the assessor; the outcome shown is derived from the module findings and the open actions."
        }
        (OutcomeStrategy::AssessorWithFallback, OutcomeSource::Assessor) => {
            "Overall rating entered by the assessor, consistent with the module findings."
        }
        (OutcomeStrategy::AssessorWithFallback, OutcomeSource::AssessorOverridden) => {
            "The assessor's overall rating differs from the rating derived from the module findings."
        }
    }
}

pub(super) fn render(
    pager: &mut Paginator<'_>,
    data: &ExecutiveSummaryData,
    ctx: &RenderContext<'_>,
) {
    let config = pager.config();
    pager.new_page();
    block::section_heading(pager, "Executive Summary", 0);

    let row = config.leading(config.body_size) + Pt::from_i32(6);
    pager.ensure_room(row * 2);
    let (page, top) = pager.place(row);
    let y = top - config.body_size - Pt::from_i32(2);
    page.text(config.left(), y, "Overall outcome", config.body_bold());
    let chip_x = config.left() + config.label_column;
    let width = page.chip(
        chip_x,
        y - Pt::from_i32(3),
        &outcome_chip_label(data),
        config.palette.brand,
        config.chip_label(),
    );
    if data.outcome.is_overridden() {
        page.chip(
            chip_x + width + Pt::from_i32(6),
            y - Pt::from_i32(3),
            "OVERRIDDEN",
            config.palette.p1,
            config.chip_label(),
        );
    }
    pager.advance(row);
    if data.outcome.is_overridden() {
        block::labeled_field(pager, "Derived outcome", &data.outcome.engine_label);
    }
    block::paragraph(pager, strategy_note(data), config.small());
    block::labeled_field(pager, "Report type", ctx.kind.display_name());
    block::labeled_field(pager, "Building complexity", data.complexity.label());

    block::heading(pager, "Open actions by priority", config.subheading(), Pt::from_i32(40));
    let mut rows: Vec<Vec<String>> = PriorityBand::ALL
        .iter()
        .map(|band| {
            vec![
                band.label().to_string(),
                band.description().to_string(),
                data.open_by_priority[band.index()].to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        "-".to_string(),
        "Complete or closed".to_string(),
        data.closed.to_string(),
    ]);
    block::table(
        pager,
        &[
            Column::new("Priority", 1.0),
            Column::new("Meaning", 4.0),
            Column::new("Actions", 1.0),
        ],
        &rows,
    );

    block::heading(pager, "Top issues", config.subheading(), Pt::from_i32(30));
    if data.top_issues.is_empty() {
        block::paragraph(pager, "There are no open actions.", config.body());
    }
    for issue in &data.top_issues {
        chip_entry(
            pager,
            issue.priority.label(),
            config.palette.priority(issue.priority),
            &issue.reference,
            &issue.text,
        );
    }
    pager.space(config.body_size);

    if !data.module_outcomes.is_empty() {
        block::heading(pager, "Findings by module", config.subheading(), Pt::from_i32(40));
        let rows: Vec<Vec<String>> = data
            .module_outcomes
            .iter()
            .map(|(title, outcome)| {
                vec![
                    title.clone(),
                    outcome.map(|o| o.label()).unwrap_or("Not assessed").to_string(),
                ]
            })
            .collect();
        block::table(
            pager,
            &[Column::new("Module", 3.0), Column::new("Finding", 2.0)],
            &rows,
        );
    }

    if let Some(commentary) = data.commentary.as_deref().filter(|c| !c.trim().is_empty()) {
        block::heading(pager, "Assessor commentary", config.subheading(), Pt::from_i32(30));
        block::paragraph(pager, commentary, config.body());
    }
}

fn outcome_chip_label(data: &ExecutiveSummaryData) -> String {
    data.outcome.label.to_uppercase()
}
