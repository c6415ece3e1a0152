use crate::block::{self, Callout, CalloutGroup};
use crate::config::ReportConfig;
use crate::manifest::{ModuleGroupData, ResolvedModule};
use crate::model::ModuleOutcome;
use crate::modules::InfoGap;
use crate::pagination::Paginator;
use crate::types::{Color, Pt};

fn outcome_chip(config: &ReportConfig, outcome: Option<ModuleOutcome>) -> (String, Color) {
    let palette = &config.palette;
    match outcome {
        None => ("NOT ASSESSED".to_string(), palette.muted),
        Some(outcome) => {
            let color = match outcome {
                ModuleOutcome::Compliant => palette.good,
                ModuleOutcome::MinorDeficiency => palette.p3,
                ModuleOutcome::MaterialDeficiency => palette.p1,
                ModuleOutcome::InfoGap => palette.p2,
                ModuleOutcome::NotApplicable => palette.muted,
            };
            (outcome.label().to_uppercase(), color)
        }
    }
}

fn info_gap_callout(config: &ReportConfig, gap: &InfoGap) -> Callout {
    Callout {
        title: "Information gap".to_string(),
        groups: vec![
            CalloutGroup {
                heading: Some("Reasons".to_string()),
                items: gap.reasons.clone(),
            },
            CalloutGroup {
                heading: Some("Recommended quick actions".to_string()),
                items: gap
                    .quick_actions
                    .iter()
                    .map(|a| format!("[{}] {}", a.priority.label(), a.text))
                    .collect(),
            },
        ],
        fill: config.palette.callout_fill,
        border: config.palette.callout_border,
    }
}

pub(super) fn render(pager: &mut Paginator<'_>, data: &ModuleGroupData) {
    let config = pager.config();
    if data.level == 0 {
        pager.new_page();
    }
    block::section_heading(pager, &data.heading, data.level);
    if data.modules.is_empty() {
        block::paragraph(pager, "No modules were recorded for this section.", config.body());
        return;
    }
    for (i, module) in data.modules.iter().enumerate() {
        if i > 0 {
            block::rule(pager);
        }
        render_module(pager, module, data.level + 1);
    }
}

fn render_module(pager: &mut Paginator<'_>, module: &ResolvedModule, level: u8) {
    let config = pager.config();
    block::section_heading(pager, &module.title, level);

    let (label, color) = outcome_chip(config, module.outcome);
    let row = config.leading(config.body_size) + Pt::from_i32(4);
    let (page, top) = pager.place(row);
    let width = page.chip(
        config.left(),
        top - row + Pt::from_i32(2),
        &label,
        color,
        config.chip_label(),
    );
    if !module.completed {
        page.text(
            config.left() + width + Pt::from_i32(8),
            top - config.body_size,
            "Module not marked complete",
            config.small(),
        );
    }
    pager.advance(row);

    let mut drawn = 0usize;
    for detail in &module.details {
        if block::labeled_field(pager, &detail.label, &detail.value) {
            drawn += 1;
        }
    }
    if drawn == 0 {
        block::paragraph(pager, "No details recorded.", config.small());
    }
    if !module.actions.is_empty() {
        block::labeled_field(pager, "Actions raised", &module.actions.join(", "));
    }
    if let Some(notes) = module.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        pager.space(Pt::from_i32(4));
        block::heading(
            pager,
            "Assessor notes",
            config.body_bold(),
            config.leading(config.body_size),
        );
        block::paragraph(pager, notes, config.body());
    }
    if let Some(gap) = &module.info_gap {
        block::callout(pager, &info_gap_callout(config, gap));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::model::{DocumentMode, PriorityBand};
    use crate::modules::{KeyDetail, ModuleKind, QuickAction};

    fn module(details: Vec<KeyDetail>, info_gap: Option<InfoGap>) -> ResolvedModule {
        ResolvedModule {
            instance_id: "m1".to_string(),
            kind: ModuleKind::MeansOfEscape,
            title: ModuleKind::MeansOfEscape.title(),
            outcome: Some(ModuleOutcome::InfoGap),
            completed: false,
            details,
            notes: Some("Second stair not inspected.".to_string()),
            info_gap,
            actions: vec!["A-002".to_string()],
        }
    }

    fn render_group(modules: Vec<ResolvedModule>) -> crate::pagination::PageRegistry {
        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        render(
            &mut pager,
            &ModuleGroupData {
                heading: "Module Summary".to_string(),
                level: 0,
                modules,
            },
        );
        pager.finish().0
    }

    #[test]
    fn empty_details_get_a_placeholder() {
        let registry = render_group(vec![module(Vec::new(), None)]);
        let page = &registry.pages[0];
        assert!(page.contains_text("No details recorded."));
        assert!(page.contains_text("Module not marked complete"));
        assert!(page.contains_text("A-002"));
        assert!(registry.marks.iter().any(|m| m.title == "Means of Escape" && m.level == 1));
    }

    #[test]
    fn info_gap_draws_a_bordered_callout() {
        let gap = InfoGap {
            reasons: vec!["Travel distances: not confirmed during the assessment.".to_string()],
            quick_actions: vec![QuickAction {
                priority: PriorityBand::P2,
                text: "Confirm travel distances".to_string(),
            }],
        };
        let details = vec![KeyDetail {
            label: "Escape routes".to_string(),
            value: "Two protected stairs".to_string(),
        }];
        let registry = render_group(vec![module(details, Some(gap))]);
        let page = &registry.pages[0];
        assert!(page.contains_text("Two protected stairs"));
        assert!(page.contains_text("[P2] Confirm travel distances"));
        assert!(page
            .commands
            .iter()
            .any(|c| matches!(c, Command::StrokeRect { .. })));
    }
}
