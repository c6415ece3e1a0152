use crate::block;
use crate::manifest::AssumptionsData;
use crate::model::ReportKind;
use crate::pagination::Paginator;

fn default_assumptions(flavor: ReportKind) -> &'static [&'static str] {
    match flavor {
        ReportKind::Fra | ReportKind::Combined => &[
            "The assessment is based on a non-intrusive inspection of the areas accessible at the time of the visit; concealed spaces were not opened up.",
            "Information provided by the client and site representatives is assumed to be accurate and complete.",
            "Fire safety systems were not tested as part of the assessment; their condition is reported from visual inspection and the records made available.",
            "Structural fire resistance and compartmentation were assessed visually only.",
        ],
        ReportKind::Dsear => &[
            "Substance data is taken from the safety data sheets supplied at the time of the assessment.",
            "Quantities and process conditions are those described by site personnel and may vary in normal operation.",
            "Hazardous area extents are based on the release sources identified; unreported sources are not assessed.",
        ],
        ReportKind::Fsd => &[
            "The strategy is based on the design information issued at the date of this document.",
            "Occupancy figures are derived from the floor space factors in the applicable design guidance unless stated otherwise.",
            "Fire safety provisions are assumed to be installed, commissioned and maintained in accordance with the relevant standards.",
        ],
        ReportKind::Survey => &[
            "The survey records conditions observed on the day of inspection only.",
            "No intrusive investigation or testing was carried out.",
        ],
    }
}

pub(super) fn render(pager: &mut Paginator<'_>, data: &AssumptionsData) {
    let config = pager.config();
    pager.new_page();
    block::section_heading(pager, "Assumptions and Limitations", 0);

    let mut items: Vec<String> = Vec::new();
    for flavor in &data.flavors {
        for item in default_assumptions(*flavor) {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }
    block::heading(pager, "Assumptions", config.subheading(), config.leading(config.body_size));
    block::bullet_list(pager, &items, config.body());

    if let Some(scope) = data.scope.as_deref().filter(|s| !s.trim().is_empty()) {
        block::heading(pager, "Scope", config.subheading(), config.leading(config.body_size));
        block::paragraph(pager, scope, config.body());
    }
    if let Some(limitations) = data.limitations.as_deref().filter(|s| !s.trim().is_empty()) {
        block::heading(pager, "Limitations", config.subheading(), config.leading(config.body_size));
        block::paragraph(pager, limitations, config.body());
    }
}
