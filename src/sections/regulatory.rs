use crate::block;
use crate::manifest::RegulatoryData;
use crate::model::{Jurisdiction, ReportKind};
use crate::pagination::Paginator;

/// Legislative context printed for one flavor in one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boilerplate {
    pub introduction: String,
    pub legislation: Vec<&'static str>,
    pub closing: Option<&'static str>,
}

fn fire_legislation(jurisdiction: Jurisdiction) -> Vec<&'static str> {
    match jurisdiction {
        Jurisdiction::EnglandWales => vec![
            "Regulatory Reform (Fire Safety) Order 2005",
            "Fire Safety Act 2021",
            "Fire Safety (England) Regulations 2022, where the premises are in England",
        ],
        Jurisdiction::Scotland => vec![
            "Fire (Scotland) Act 2005, Part 3",
            "Fire Safety (Scotland) Regulations 2006",
        ],
        Jurisdiction::NorthernIreland => vec![
            "Fire and Rescue Services (Northern Ireland) Order 2006",
            "Fire Safety Regulations (Northern Ireland) 2010",
        ],
        Jurisdiction::RepublicOfIreland => vec![
            "Fire Services Acts 1981 and 2003",
            "Safety, Health and Welfare at Work Act 2005",
        ],
    }
}

fn dsear_legislation(jurisdiction: Jurisdiction) -> Vec<&'static str> {
    match jurisdiction {
        Jurisdiction::EnglandWales | Jurisdiction::Scotland => vec![
            "Dangerous Substances and Explosive Atmospheres Regulations 2002 (DSEAR)",
            "Management of Health and Safety at Work Regulations 1999",
        ],
        Jurisdiction::NorthernIreland => vec![
            "Dangerous Substances and Explosive Atmospheres Regulations (Northern Ireland) 2003",
            "Management of Health and Safety at Work Regulations (Northern Ireland) 2000",
        ],
        Jurisdiction::RepublicOfIreland => vec![
            "Safety, Health and Welfare at Work (General Application) Regulations 2007, explosive atmospheres provisions",
            "Safety, Health and Welfare at Work (Chemical Agents) Regulations 2001",
        ],
    }
}

fn building_legislation(jurisdiction: Jurisdiction) -> Vec<&'static str> {
    match jurisdiction {
        Jurisdiction::EnglandWales => vec![
            "The Building Regulations 2010, Part B (Fire Safety)",
            "Approved Document B, with BS 9999 or BS 9991 where adopted",
        ],
        Jurisdiction::Scotland => vec![
            "Building (Scotland) Regulations 2004",
            "Building Standards Technical Handbook, Section 2 (Fire)",
        ],
        Jurisdiction::NorthernIreland => vec![
            "Building Regulations (Northern Ireland) 2012, Part E",
            "Technical Booklet E (Fire Safety)",
        ],
        Jurisdiction::RepublicOfIreland => vec![
            "Building Regulations 1997 to 2022, Part B (Fire Safety)",
            "Technical Guidance Document B",
        ],
    }
}

fn duty_holder(jurisdiction: Jurisdiction) -> &'static str {
    match jurisdiction {
        Jurisdiction::Scotland => "the duty holder",
        Jurisdiction::NorthernIreland | Jurisdiction::EnglandWales => "the responsible person",
        Jurisdiction::RepublicOfIreland => "the person in control of the premises",
    }
}

pub fn boilerplate(flavor: ReportKind, jurisdiction: Jurisdiction) -> Boilerplate {
    let place = jurisdiction.display_name();
    match flavor {
        ReportKind::Fra | ReportKind::Combined => Boilerplate {
            introduction: format!(
                "This assessment has been carried out to assist {} in meeting their duties under the fire safety legislation applying in {place}:",
                duty_holder(jurisdiction)
            ),
            legislation: fire_legislation(jurisdiction),
            closing: Some(
                "The assessment should be reviewed regularly, and whenever there is reason to suspect it is no longer valid or there has been a significant change to the premises or their use.",
            ),
        },
        ReportKind::Dsear => Boilerplate {
            introduction: format!(
                "Risks from dangerous substances and potentially explosive atmospheres have been assessed with reference to the following legislation applying in {place}:"
            ),
            legislation: dsear_legislation(jurisdiction),
            closing: Some(
                "Hazardous area classification should be reviewed following any change to the process, the substances handled or the plant.",
            ),
        },
        ReportKind::Fsd => Boilerplate {
            introduction: format!(
                "The fire strategy has been developed to demonstrate compliance with the functional requirements of the building regulations applying in {place}:"
            ),
            legislation: building_legislation(jurisdiction),
            closing: Some(
                "The strategy is valid for the design described in this document; any material change in design, use or occupancy requires it to be reviewed.",
            ),
        },
        ReportKind::Survey => Boilerplate {
            introduction: format!(
                "The survey has been undertaken with reference to the following legislation \
                 applying in {place}:"
            ),
            legislation: fire_legislation(jurisdiction),
            closing: None,
        },
    }
}

pub(super) fn render(pager: &mut Paginator<'_>, data: &RegulatoryData) {
    let config = pager.config();
    if data.level == 0 {
        pager.new_page();
    }
    block::section_heading(pager, "Regulatory Framework", data.level);
    let text = boilerplate(data.flavor, data.jurisdiction);
    block::paragraph(pager, &text.introduction, config.body());
    let items: Vec<String> = text.legislation.iter().map(|s| s.to_string()).collect();
    block::bullet_list(pager, &items, config.body());
    pager.space(config.body_size.half());
    if let Some(closing) = text.closing {
        block::paragraph(pager, closing, config.body());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scotland_uses_its_own_fire_legislation() {
        let text = boilerplate(ReportKind::Fra, Jurisdiction::Scotland);
        assert!(text.legislation.iter().any(|l| l.contains("Fire (Scotland) Act 2005")));
        assert!(text.introduction.contains("duty holder"));
    }

    #[test]
    fn dsear_in_great_britain_cites_the_2002_regulations() {
        for jurisdiction in [Jurisdiction::EnglandWales, Jurisdiction::Scotland] {
            let text = boilerplate(ReportKind::Dsear, jurisdiction);
            assert!(text.legislation[0].contains("2002"));
        }
        let ni = boilerplate(ReportKind::Dsear, Jurisdiction::NorthernIreland);
        assert!(ni.legislation[0].contains("(Northern Ireland) 2003"));
    }

    #[test]
    fn fire_strategy_cites_building_regulations() {
        let text = boilerplate(ReportKind::Fsd, Jurisdiction::RepublicOfIreland);
        assert!(text.legislation.iter().any(|l| l.contains("Technical Guidance Document B")));
        assert!(boilerplate(ReportKind::Survey, Jurisdiction::EnglandWales).closing.is_none());
    }
}
