//! Rule evaluators consumed by the assemblers as pure functions.

use crate::model::{ModuleOutcome, PriorityBand, ReportKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplexityBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityBand {
    pub fn label(self) -> &'static str {
        match self {
            ComplexityBand::Low => "Low",
            ComplexityBand::Medium => "Medium",
            ComplexityBand::High => "High",
            ComplexityBand::VeryHigh => "Very high",
        }
    }

    /// Complex premises rank top issues by criticality before age.
    pub fn prefers_criticality(self) -> bool {
        matches!(self, ComplexityBand::High | ComplexityBand::VeryHigh)
    }
}

/// Inputs to the structural complexity score, gathered from module answers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplexityFactors {
    pub storeys: Option<u32>,
    pub max_occupancy: Option<u32>,
    pub sleeping_accommodation: bool,
    pub dangerous_substances: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallOutcome {
    Satisfactory,
    ImprovementRequired,
    SignificantDeficiencies,
    Intolerable,
    Incomplete,
}

impl OverallOutcome {
    pub fn label(self, kind: ReportKind) -> &'static str {
        match kind {
            ReportKind::Fra | ReportKind::Combined => match self {
                OverallOutcome::Satisfactory => "Tolerable",
                OverallOutcome::ImprovementRequired => "Moderate",
                OverallOutcome::SignificantDeficiencies => "Substantial",
                OverallOutcome::Intolerable => "Intolerable",
                OverallOutcome::Incomplete => "Insufficient information",
            },
            ReportKind::Dsear => match self {
                OverallOutcome::Satisfactory => "Risk adequately controlled",
                OverallOutcome::ImprovementRequired => "Further controls recommended",
                OverallOutcome::SignificantDeficiencies => "Further controls required",
                OverallOutcome::Intolerable => "Immediate action required",
                OverallOutcome::Incomplete => "Insufficient information",
            },
            ReportKind::Fsd => match self {
                OverallOutcome::Satisfactory => "Compliant",
                OverallOutcome::ImprovementRequired => "Compliant with departures",
                OverallOutcome::SignificantDeficiencies | OverallOutcome::Intolerable => {
                    "Non-compliant"
                }
                OverallOutcome::Incomplete => "Insufficient information",
            },
            ReportKind::Survey => match self {
                OverallOutcome::Satisfactory => "Satisfactory",
                OverallOutcome::ImprovementRequired => "Improvements recommended",
                OverallOutcome::SignificantDeficiencies => "Significant deficiencies",
                OverallOutcome::Intolerable => "Unsatisfactory",
                OverallOutcome::Incomplete => "Incomplete",
            },
        }
    }
}

/// Severity, priority and complexity evaluation. Implementations must be
/// pure: builds running in parallel share one instance.
pub trait RuleSet: Send + Sync {
    fn priority_for_score(&self, score: u32) -> PriorityBand;

    fn complexity(&self, factors: &ComplexityFactors) -> ComplexityBand;

    /// `open_priorities` lists the resolved band of every open action.
    fn overall_outcome(
        &self,
        outcomes: &[Option<ModuleOutcome>],
        open_priorities: &[PriorityBand],
    ) -> OverallOutcome;

    /// Lower is more critical. Applied to an action category or module key.
    fn criticality_rank(&self, category: Option<&str>) -> u8;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl RuleSet for StandardRules {
    fn priority_for_score(&self, score: u32) -> PriorityBand {
        match score {
            20.. => PriorityBand::P1,
            12..=19 => PriorityBand::P2,
            6..=11 => PriorityBand::P3,
            _ => PriorityBand::P4,
        }
    }

    fn complexity(&self, factors: &ComplexityFactors) -> ComplexityBand {
        let mut score = 0u32;
        match factors.storeys {
            Some(s) if s >= 7 => score += 2,
            Some(s) if s >= 3 => score += 1,
            _ => {}
        }
        match factors.max_occupancy {
            Some(o) if o >= 300 => score += 2,
            Some(o) if o >= 60 => score += 1,
            _ => {}
        }
        if factors.sleeping_accommodation {
            score += 1;
        }
        if factors.dangerous_substances {
            score += 1;
        }
        match score {
            0 | 1 => ComplexityBand::Low,
            2 => ComplexityBand::Medium,
            3 | 4 => ComplexityBand::High,
            _ => ComplexityBand::VeryHigh,
        }
    }

    fn overall_outcome(
        &self,
        outcomes: &[Option<ModuleOutcome>],
        open_priorities: &[PriorityBand],
    ) -> OverallOutcome {
        let count = |wanted: ModuleOutcome| outcomes.iter().filter(|o| **o == Some(wanted)).count();
        let material = count(ModuleOutcome::MaterialDeficiency);
        let minor = count(ModuleOutcome::MinorDeficiency);
        let gaps = count(ModuleOutcome::InfoGap);
        let open_p1 = open_priorities.contains(&PriorityBand::P1);

        if material > 0 && open_p1 {
            OverallOutcome::Intolerable
        } else if material > 0 || open_p1 {
            OverallOutcome::SignificantDeficiencies
        } else if minor > 0 || open_priorities.contains(&PriorityBand::P2) {
            OverallOutcome::ImprovementRequired
        } else if gaps > 0 {
            OverallOutcome::Incomplete
        } else {
            OverallOutcome::Satisfactory
        }
    }

    fn criticality_rank(&self, category: Option<&str>) -> u8 {
        let Some(category) = category else {
            return u8::MAX;
        };
        match category.trim().to_ascii_lowercase().as_str() {
            "means_of_escape" | "evacuation_strategy" => 0,
            "fire_protection" | "detection" | "fire_detection" => 1,
            "compartmentation" | "structural_fire_resistance" | "fire_doors" => 2,
            "hazardous_areas" | "ignition_control" | "dangerous_substances" => 3,
            "emergency_arrangements" | "firefighting_access" => 4,
            "fire_hazards" | "housekeeping" => 5,
            "fire_safety_management" | "management" | "training" => 6,
            _ => 9,
        }
    }
}

/// How the headline outcome of a report is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStrategy {
    /// Always the rule engine's label; any assessor rating is ignored.
    EngineDerived,
    /// The assessor's rating when entered, flagged when it disagrees with
    /// the engine; the engine label otherwise.
    AssessorWithFallback,
}

impl OutcomeStrategy {
    pub fn for_kind(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Fra | ReportKind::Combined => OutcomeStrategy::AssessorWithFallback,
            ReportKind::Dsear | ReportKind::Fsd | ReportKind::Survey => {
                OutcomeStrategy::EngineDerived
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    Engine,
    Assessor,
    AssessorOverridden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutcome {
    pub label: String,
    pub engine_label: String,
    pub source: OutcomeSource,
}

impl ResolvedOutcome {
    pub fn is_overridden(&self) -> bool {
        self.source == OutcomeSource::AssessorOverridden
    }
}

pub fn resolve_outcome(
    strategy: OutcomeStrategy,
    kind: ReportKind,
    engine: OverallOutcome,
    assessor_rating: Option<&str>,
) -> ResolvedOutcome {
    let engine_label = engine.label(kind).to_string();
    let assessor = assessor_rating.map(str::trim).filter(|r| !r.is_empty());
    match (strategy, assessor) {
        (OutcomeStrategy::AssessorWithFallback, Some(rating)) => {
            let source = if rating.eq_ignore_ascii_case(&engine_label) {
                OutcomeSource::Assessor
            } else {
                OutcomeSource::AssessorOverridden
            };
            ResolvedOutcome {
                label: rating.to_string(),
                engine_label,
                source,
            }
        }
        _ => ResolvedOutcome {
            label: engine_label.clone(),
            engine_label,
            source: OutcomeSource::Engine,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_thresholds_map_to_bands() {
        let rules = StandardRules;
        assert_eq!(rules.priority_for_score(25), PriorityBand::P1);
        assert_eq!(rules.priority_for_score(20), PriorityBand::P1);
        assert_eq!(rules.priority_for_score(12), PriorityBand::P2);
        assert_eq!(rules.priority_for_score(6), PriorityBand::P3);
        assert_eq!(rules.priority_for_score(5), PriorityBand::P4);
        assert_eq!(rules.priority_for_score(0), PriorityBand::P4);
    }

    #[test]
    fn complexity_accumulates_factors() {
        let rules = StandardRules;
        assert_eq!(rules.complexity(&ComplexityFactors::default()), ComplexityBand::Low);
        let hotel = ComplexityFactors {
            storeys: Some(8),
            max_occupancy: Some(120),
            sleeping_accommodation: true,
            dangerous_substances: false,
        };
        assert_eq!(rules.complexity(&hotel), ComplexityBand::High);
        let plant = ComplexityFactors {
            max_occupancy: Some(400),
            dangerous_substances: true,
            ..hotel
        };
        assert_eq!(rules.complexity(&plant), ComplexityBand::VeryHigh);
    }

    #[test]
    fn outcome_escalates_with_findings() {
        let rules = StandardRules;
        let material = [Some(ModuleOutcome::MaterialDeficiency), Some(ModuleOutcome::Compliant)];
        assert_eq!(
            rules.overall_outcome(&material, &[PriorityBand::P1]),
            OverallOutcome::Intolerable
        );
        assert_eq!(
            rules.overall_outcome(&material, &[]),
            OverallOutcome::SignificantDeficiencies
        );
        assert_eq!(
            rules.overall_outcome(&[Some(ModuleOutcome::InfoGap), None], &[PriorityBand::P3]),
            OverallOutcome::Incomplete
        );
        assert_eq!(rules.overall_outcome(&[], &[]), OverallOutcome::Satisfactory);
    }

    #[test]
    fn assessor_rating_is_flagged_when_it_disagrees() {
        let resolved = resolve_outcome(
            OutcomeStrategy::AssessorWithFallback,
            ReportKind::Fra,
            OverallOutcome::SignificantDeficiencies,
            Some("Moderate"),
        );
        assert_eq!(resolved.label, "Moderate");
        assert_eq!(resolved.engine_label, "Substantial");
        assert!(resolved.is_overridden());

        let agreed = resolve_outcome(
            OutcomeStrategy::AssessorWithFallback,
            ReportKind::Fra,
            OverallOutcome::SignificantDeficiencies,
            Some("substantial"),
        );
        assert_eq!(agreed.source, OutcomeSource::Assessor);
    }

    #[test]
    fn missing_rating_falls_back_to_engine() {
        let resolved = resolve_outcome(
            OutcomeStrategy::AssessorWithFallback,
            ReportKind::Combined,
            OverallOutcome::Satisfactory,
            Some("  "),
        );
        assert_eq!(resolved.source, OutcomeSource::Engine);
        assert_eq!(resolved.label, "Tolerable");
    }

    #[test]
    fn engine_derived_ignores_assessor() {
        assert_eq!(
            OutcomeStrategy::for_kind(ReportKind::Dsear),
            OutcomeStrategy::EngineDerived
        );
        let resolved = resolve_outcome(
            OutcomeStrategy::EngineDerived,
            ReportKind::Dsear,
            OverallOutcome::Intolerable,
            Some("Risk adequately controlled"),
        );
        assert_eq!(resolved.label, "Immediate action required");
        assert!(!resolved.is_overridden());
    }
}
