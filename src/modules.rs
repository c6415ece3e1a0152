//! Module identifiers, typed answer records and the information-gap predicate.

use crate::model::{ModuleOutcome, PriorityBand, ReportKind};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    // FRA
    BuildingProfile,
    PersonsAtRisk,
    FireSafetyManagement,
    EmergencyArrangements,
    FireHazards,
    MeansOfEscape,
    FireProtection,
    // DSEAR
    DangerousSubstances,
    ReleaseSources,
    HazardousAreas,
    IgnitionControl,
    ExplosionEmergency,
    // FSD
    RegulatoryBasis,
    EvacuationStrategy,
    StructuralFireResistance,
    ExternalFireSpread,
    FirefightingAccess,
    Unknown(String),
}

impl ModuleKind {
    pub const KNOWN: [ModuleKind; 17] = [
        ModuleKind::BuildingProfile,
        ModuleKind::PersonsAtRisk,
        ModuleKind::FireSafetyManagement,
        ModuleKind::EmergencyArrangements,
        ModuleKind::FireHazards,
        ModuleKind::MeansOfEscape,
        ModuleKind::FireProtection,
        ModuleKind::DangerousSubstances,
        ModuleKind::ReleaseSources,
        ModuleKind::HazardousAreas,
        ModuleKind::IgnitionControl,
        ModuleKind::ExplosionEmergency,
        ModuleKind::RegulatoryBasis,
        ModuleKind::EvacuationStrategy,
        ModuleKind::StructuralFireResistance,
        ModuleKind::ExternalFireSpread,
        ModuleKind::FirefightingAccess,
    ];

    pub fn from_key(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase();
        Self::KNOWN
            .iter()
            .find(|kind| kind.key() == key)
            .cloned()
            .unwrap_or(ModuleKind::Unknown(raw.trim().to_string()))
    }

    pub fn key(&self) -> &str {
        match self {
            ModuleKind::BuildingProfile => "building_profile",
            ModuleKind::PersonsAtRisk => "persons_at_risk",
            ModuleKind::FireSafetyManagement => "fire_safety_management",
            ModuleKind::EmergencyArrangements => "emergency_arrangements",
            ModuleKind::FireHazards => "fire_hazards",
            ModuleKind::MeansOfEscape => "means_of_escape",
            ModuleKind::FireProtection => "fire_protection",
            ModuleKind::DangerousSubstances => "dangerous_substances",
            ModuleKind::ReleaseSources => "release_sources",
            ModuleKind::HazardousAreas => "hazardous_areas",
            ModuleKind::IgnitionControl => "ignition_control",
            ModuleKind::ExplosionEmergency => "explosion_emergency",
            ModuleKind::RegulatoryBasis => "regulatory_basis",
            ModuleKind::EvacuationStrategy => "evacuation_strategy",
            ModuleKind::StructuralFireResistance => "structural_fire_resistance",
            ModuleKind::ExternalFireSpread => "external_fire_spread",
            ModuleKind::FirefightingAccess => "firefighting_access",
            ModuleKind::Unknown(key) => key,
        }
    }

    pub fn title(&self) -> String {
        let title = match self {
            ModuleKind::BuildingProfile => "Building Profile",
            ModuleKind::PersonsAtRisk => "Persons at Risk",
            ModuleKind::FireSafetyManagement => "Fire Safety Management",
            ModuleKind::EmergencyArrangements => "Emergency Arrangements",
            ModuleKind::FireHazards => "Fire Hazards and Ignition Sources",
            ModuleKind::MeansOfEscape => "Means of Escape",
            ModuleKind::FireProtection => "Fire Protection Measures",
            ModuleKind::DangerousSubstances => "Dangerous Substances",
            ModuleKind::ReleaseSources => "Sources of Release",
            ModuleKind::HazardousAreas => "Hazardous Area Classification",
            ModuleKind::IgnitionControl => "Control of Ignition Sources",
            ModuleKind::ExplosionEmergency => "Explosion Emergency Measures",
            ModuleKind::RegulatoryBasis => "Regulatory Basis",
            ModuleKind::EvacuationStrategy => "Evacuation Strategy",
            ModuleKind::StructuralFireResistance => "Structural Fire Resistance",
            ModuleKind::ExternalFireSpread => "External Fire Spread",
            ModuleKind::FirefightingAccess => "Access and Facilities for Firefighting",
            ModuleKind::Unknown(key) => return humanize_key(key),
        };
        title.to_string()
    }

    /// Flavor the module belongs to; `None` for unknown modules.
    pub fn flavor(&self) -> Option<ReportKind> {
        match self {
            ModuleKind::BuildingProfile
            | ModuleKind::PersonsAtRisk
            | ModuleKind::FireSafetyManagement
            | ModuleKind::EmergencyArrangements
            | ModuleKind::FireHazards
            | ModuleKind::MeansOfEscape
            | ModuleKind::FireProtection => Some(ReportKind::Fra),
            ModuleKind::DangerousSubstances
            | ModuleKind::ReleaseSources
            | ModuleKind::HazardousAreas
            | ModuleKind::IgnitionControl
            | ModuleKind::ExplosionEmergency => Some(ReportKind::Dsear),
            ModuleKind::RegulatoryBasis
            | ModuleKind::EvacuationStrategy
            | ModuleKind::StructuralFireResistance
            | ModuleKind::ExternalFireSpread
            | ModuleKind::FirefightingAccess => Some(ReportKind::Fsd),
            ModuleKind::Unknown(_) => None,
        }
    }

    /// Follow-up priority for unanswered questions in this module.
    fn gap_priority(&self) -> PriorityBand {
        match self {
            ModuleKind::MeansOfEscape
            | ModuleKind::FireProtection
            | ModuleKind::EmergencyArrangements
            | ModuleKind::HazardousAreas
            | ModuleKind::IgnitionControl
            | ModuleKind::EvacuationStrategy => PriorityBand::P2,
            _ => PriorityBand::P3,
        }
    }
}

/// `fire_doors_ok` -> `Fire doors ok`.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.trim().replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNoUnknown {
    #[serde(alias = "y")]
    Yes,
    #[serde(alias = "n")]
    No,
    #[serde(alias = "unsure", alias = "not_known", alias = "dont_know")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDetail {
    pub label: String,
    pub value: String,
}

impl KeyDetail {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

trait DetailValue {
    fn detail_text(&self) -> Option<String>;

    fn is_unknown(&self) -> bool {
        false
    }
}

impl DetailValue for String {
    fn detail_text(&self) -> Option<String> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl DetailValue for u32 {
    fn detail_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl DetailValue for f64 {
    fn detail_text(&self) -> Option<String> {
        if !self.is_finite() {
            return None;
        }
        if self.fract() == 0.0 {
            Some(format!("{:.0}", self))
        } else {
            Some(format!("{:.1}", self))
        }
    }
}

impl DetailValue for Vec<String> {
    fn detail_text(&self) -> Option<String> {
        let items: Vec<&str> = self
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        (!items.is_empty()).then(|| items.join(", "))
    }
}

impl DetailValue for YesNoUnknown {
    fn detail_text(&self) -> Option<String> {
        let text = match self {
            YesNoUnknown::Yes => "Yes",
            YesNoUnknown::No => "No",
            YesNoUnknown::Unknown => "Not known",
        };
        Some(text.to_string())
    }

    fn is_unknown(&self) -> bool {
        matches!(self, YesNoUnknown::Unknown)
    }
}

// Declares a typed answer record: every field optional, decoded leniently
// (unlisted keys ignored), listed in `details` in declaration order.
macro_rules! answer_record {
    ($name:ident { $($field:ident : $ty:ty => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: Option<$ty>,)+
        }

        impl $name {
            fn details(&self) -> Vec<KeyDetail> {
                let mut out = Vec::new();
                $(
                    if let Some(text) = self.$field.as_ref().and_then(|v| v.detail_text()) {
                        out.push(KeyDetail::new($label, text));
                    }
                )+
                out
            }

            fn unknowns(&self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $(
                    if self.$field.as_ref().is_some_and(|v| v.is_unknown()) {
                        out.push($label);
                    }
                )+
                out
            }
        }
    };
}

answer_record!(BuildingProfile {
    use_class: String => "Use / purpose group",
    storeys: u32 => "Storeys above ground",
    floor_area_m2: f64 => "Gross floor area (m2)",
    construction: String => "Construction",
    year_built: u32 => "Year of construction",
    sleeping_accommodation: YesNoUnknown => "Sleeping accommodation",
});

answer_record!(PersonsAtRisk {
    max_occupancy: u32 => "Maximum occupancy",
    employees: u32 => "Employees",
    occupant_profile: String => "Occupant profile",
    vulnerable_persons: YesNoUnknown => "Vulnerable persons present",
    lone_working: YesNoUnknown => "Lone working",
});

answer_record!(FireSafetyManagement {
    responsible_person: String => "Responsible person",
    fire_policy: YesNoUnknown => "Written fire safety policy",
    training_frequency: String => "Staff training",
    records_kept: YesNoUnknown => "Maintenance records kept",
    previous_assessment: String => "Previous assessment",
});

answer_record!(EmergencyArrangements {
    evacuation_plan: YesNoUnknown => "Emergency evacuation plan",
    drill_frequency: String => "Fire drill frequency",
    assembly_point: String => "Assembly point",
    peeps_in_place: YesNoUnknown => "PEEPs in place",
    fire_wardens: u32 => "Nominated fire wardens",
});

answer_record!(FireHazards {
    ignition_sources: Vec<String> => "Ignition sources",
    fuel_sources: Vec<String> => "Fuel sources",
    arson_risk: String => "Arson risk",
    electrical_testing: YesNoUnknown => "Fixed wiring tested",
    smoking_controlled: YesNoUnknown => "Smoking controlled",
});

answer_record!(MeansOfEscape {
    escape_routes: u32 => "Escape routes",
    travel_distances_ok: YesNoUnknown => "Travel distances adequate",
    routes_clear: YesNoUnknown => "Routes unobstructed",
    final_exits_openable: YesNoUnknown => "Final exits easily openable",
    signage: YesNoUnknown => "Escape signage",
    emergency_lighting: YesNoUnknown => "Emergency lighting",
});

answer_record!(FireProtection {
    detection_system: String => "Detection and alarm system",
    alarm_tested: YesNoUnknown => "Alarm tested weekly",
    extinguishers_serviced: YesNoUnknown => "Extinguishers serviced",
    sprinklers: YesNoUnknown => "Sprinklers",
    compartmentation: String => "Compartmentation",
    fire_doors_ok: YesNoUnknown => "Fire doors in good condition",
});

answer_record!(DangerousSubstances {
    substances: Vec<String> => "Substances",
    max_quantity: String => "Maximum quantity stored",
    flash_point_c: f64 => "Lowest flash point (C)",
    sds_available: YesNoUnknown => "Safety data sheets available",
    storage: String => "Storage arrangements",
});

answer_record!(ReleaseSources {
    sources: Vec<String> => "Release sources",
    release_grade: String => "Grade of release",
    ventilation: String => "Ventilation",
    leak_detection: YesNoUnknown => "Leak detection",
});

answer_record!(HazardousAreas {
    zones: Vec<String> => "Zones",
    zone_drawings: YesNoUnknown => "Zoning drawings available",
    atex_equipment: YesNoUnknown => "ATEX-rated equipment",
    zones_marked: YesNoUnknown => "Zones marked at entry",
});

answer_record!(IgnitionControl {
    hot_work_permits: YesNoUnknown => "Hot work permit system",
    static_control: YesNoUnknown => "Static electricity controls",
    equipment_inspection: String => "Equipment inspection regime",
    portable_electronics: YesNoUnknown => "Portable electronics controlled",
});

answer_record!(ExplosionEmergency {
    emergency_plan: YesNoUnknown => "Explosion emergency plan",
    spill_kits: YesNoUnknown => "Spill kits available",
    isolation_points: String => "Isolation points",
    explosion_relief: String => "Explosion relief",
});

answer_record!(RegulatoryBasis {
    guidance: String => "Design guidance",
    purpose_group: String => "Purpose group",
    building_control_body: String => "Building control body",
    departures: Vec<String> => "Departures from guidance",
    fire_engineered: YesNoUnknown => "Fire-engineered solution",
});

answer_record!(EvacuationStrategy {
    strategy: String => "Evacuation strategy",
    stair_count: u32 => "Protected stairs",
    stair_width_mm: u32 => "Stair width (mm)",
    phases: u32 => "Evacuation phases",
    refuges: YesNoUnknown => "Refuges provided",
});

answer_record!(StructuralFireResistance {
    fire_resistance_minutes: u32 => "Elements of structure (minutes)",
    structural_frame: String => "Structural frame",
    compartment_floors: YesNoUnknown => "Compartment floors",
    cavity_barriers: YesNoUnknown => "Cavity barriers",
});

answer_record!(ExternalFireSpread {
    boundary_distance_m: f64 => "Distance to boundary (m)",
    unprotected_area_pct: f64 => "Unprotected area (%)",
    external_wall_class: String => "External wall classification",
    roof_covering: String => "Roof covering",
});

answer_record!(FirefightingAccess {
    vehicle_access: String => "Fire appliance access",
    firefighting_shafts: u32 => "Firefighting shafts",
    dry_riser: YesNoUnknown => "Dry rising main",
    hydrant_distance_m: f64 => "Nearest hydrant (m)",
    premises_info_box: YesNoUnknown => "Premises information box",
});

/// Decoded answers of one module instance. Renderers only see the fields a
/// record declares; anything else renders through `Generic`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleAnswers {
    BuildingProfile(BuildingProfile),
    PersonsAtRisk(PersonsAtRisk),
    FireSafetyManagement(FireSafetyManagement),
    EmergencyArrangements(EmergencyArrangements),
    FireHazards(FireHazards),
    MeansOfEscape(MeansOfEscape),
    FireProtection(FireProtection),
    DangerousSubstances(DangerousSubstances),
    ReleaseSources(ReleaseSources),
    HazardousAreas(HazardousAreas),
    IgnitionControl(IgnitionControl),
    ExplosionEmergency(ExplosionEmergency),
    RegulatoryBasis(RegulatoryBasis),
    EvacuationStrategy(EvacuationStrategy),
    StructuralFireResistance(StructuralFireResistance),
    ExternalFireSpread(ExternalFireSpread),
    FirefightingAccess(FirefightingAccess),
    Generic(Vec<KeyDetail>),
}

impl ModuleAnswers {
    /// Decodes a raw payload for `kind`. A payload that does not fit the
    /// record of a known kind degrades to the generic rendering and the
    /// decode error is returned alongside for the diagnostics.
    pub fn decode(kind: &ModuleKind, raw: &Value) -> (ModuleAnswers, Option<String>) {
        let payload = if raw.is_null() {
            Value::Object(Default::default())
        } else {
            raw.clone()
        };
        let decoded = match kind {
            ModuleKind::BuildingProfile => typed(payload, ModuleAnswers::BuildingProfile),
            ModuleKind::PersonsAtRisk => typed(payload, ModuleAnswers::PersonsAtRisk),
            ModuleKind::FireSafetyManagement => {
                typed(payload, ModuleAnswers::FireSafetyManagement)
            }
            ModuleKind::EmergencyArrangements => {
                typed(payload, ModuleAnswers::EmergencyArrangements)
            }
            ModuleKind::FireHazards => typed(payload, ModuleAnswers::FireHazards),
            ModuleKind::MeansOfEscape => typed(payload, ModuleAnswers::MeansOfEscape),
            ModuleKind::FireProtection => typed(payload, ModuleAnswers::FireProtection),
            ModuleKind::DangerousSubstances => typed(payload, ModuleAnswers::DangerousSubstances),
            ModuleKind::ReleaseSources => typed(payload, ModuleAnswers::ReleaseSources),
            ModuleKind::HazardousAreas => typed(payload, ModuleAnswers::HazardousAreas),
            ModuleKind::IgnitionControl => typed(payload, ModuleAnswers::IgnitionControl),
            ModuleKind::ExplosionEmergency => typed(payload, ModuleAnswers::ExplosionEmergency),
            ModuleKind::RegulatoryBasis => typed(payload, ModuleAnswers::RegulatoryBasis),
            ModuleKind::EvacuationStrategy => typed(payload, ModuleAnswers::EvacuationStrategy),
            ModuleKind::StructuralFireResistance => {
                typed(payload, ModuleAnswers::StructuralFireResistance)
            }
            ModuleKind::ExternalFireSpread => typed(payload, ModuleAnswers::ExternalFireSpread),
            ModuleKind::FirefightingAccess => typed(payload, ModuleAnswers::FirefightingAccess),
            ModuleKind::Unknown(_) => return (ModuleAnswers::Generic(generic_details(raw)), None),
        };
        match decoded {
            Ok(answers) => (answers, None),
            Err(err) => (
                ModuleAnswers::Generic(generic_details(raw)),
                Some(err.to_string()),
            ),
        }
    }

    pub fn key_details(&self) -> Vec<KeyDetail> {
        match self {
            ModuleAnswers::BuildingProfile(a) => a.details(),
            ModuleAnswers::PersonsAtRisk(a) => a.details(),
            ModuleAnswers::FireSafetyManagement(a) => a.details(),
            ModuleAnswers::EmergencyArrangements(a) => a.details(),
            ModuleAnswers::FireHazards(a) => a.details(),
            ModuleAnswers::MeansOfEscape(a) => a.details(),
            ModuleAnswers::FireProtection(a) => a.details(),
            ModuleAnswers::DangerousSubstances(a) => a.details(),
            ModuleAnswers::ReleaseSources(a) => a.details(),
            ModuleAnswers::HazardousAreas(a) => a.details(),
            ModuleAnswers::IgnitionControl(a) => a.details(),
            ModuleAnswers::ExplosionEmergency(a) => a.details(),
            ModuleAnswers::RegulatoryBasis(a) => a.details(),
            ModuleAnswers::EvacuationStrategy(a) => a.details(),
            ModuleAnswers::StructuralFireResistance(a) => a.details(),
            ModuleAnswers::ExternalFireSpread(a) => a.details(),
            ModuleAnswers::FirefightingAccess(a) => a.details(),
            ModuleAnswers::Generic(details) => details.clone(),
        }
    }

    /// Labels of questions explicitly answered "unknown".
    pub fn unknown_answers(&self) -> Vec<&'static str> {
        match self {
            ModuleAnswers::BuildingProfile(a) => a.unknowns(),
            ModuleAnswers::PersonsAtRisk(a) => a.unknowns(),
            ModuleAnswers::FireSafetyManagement(a) => a.unknowns(),
            ModuleAnswers::EmergencyArrangements(a) => a.unknowns(),
            ModuleAnswers::FireHazards(a) => a.unknowns(),
            ModuleAnswers::MeansOfEscape(a) => a.unknowns(),
            ModuleAnswers::FireProtection(a) => a.unknowns(),
            ModuleAnswers::DangerousSubstances(a) => a.unknowns(),
            ModuleAnswers::ReleaseSources(a) => a.unknowns(),
            ModuleAnswers::HazardousAreas(a) => a.unknowns(),
            ModuleAnswers::IgnitionControl(a) => a.unknowns(),
            ModuleAnswers::ExplosionEmergency(a) => a.unknowns(),
            ModuleAnswers::RegulatoryBasis(a) => a.unknowns(),
            ModuleAnswers::EvacuationStrategy(a) => a.unknowns(),
            ModuleAnswers::StructuralFireResistance(a) => a.unknowns(),
            ModuleAnswers::ExternalFireSpread(a) => a.unknowns(),
            ModuleAnswers::FirefightingAccess(a) => a.unknowns(),
            ModuleAnswers::Generic(_) => Vec::new(),
        }
    }
}

fn typed<T, F>(payload: Value, wrap: F) -> Result<ModuleAnswers, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> ModuleAnswers,
{
    serde_json::from_value(payload).map(wrap)
}

/// Flattens scalar answers in payload order; nested objects contribute
/// `parent / child` labels.
fn generic_details(raw: &Value) -> Vec<KeyDetail> {
    let mut out = Vec::new();
    if let Value::Object(map) = raw {
        for (key, value) in map {
            push_generic(&mut out, &humanize_key(key), value);
        }
    }
    out
}

fn push_generic(out: &mut Vec<KeyDetail>, label: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push(KeyDetail::new(label, if *b { "Yes" } else { "No" })),
        Value::Number(n) => out.push(KeyDetail::new(label, n.to_string())),
        Value::String(s) => {
            if !s.trim().is_empty() {
                out.push(KeyDetail::new(label, s.trim()));
            }
        }
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
                    _ => None,
                })
                .collect();
            if !parts.is_empty() {
                out.push(KeyDetail::new(label, parts.join(", ")));
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                push_generic(out, &format!("{} / {}", label, humanize_key(key)), nested);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAction {
    pub priority: PriorityBand,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoGap {
    pub reasons: Vec<String>,
    pub quick_actions: Vec<QuickAction>,
}

/// Flags a module whose answers are insufficient to support its outcome.
///
/// A gap exists when the assessor recorded `info_gap` or answered any
/// question "unknown". Missing answers are not gaps. `linked_open` holds the
/// open register actions raised against this module; they join the quick
/// actions, which are ordered by priority with ties kept in input order.
pub fn detect_info_gap(
    kind: &ModuleKind,
    outcome: Option<ModuleOutcome>,
    answers: &ModuleAnswers,
    linked_open: &[QuickAction],
) -> Option<InfoGap> {
    let unknown = answers.unknown_answers();
    let flagged = outcome == Some(ModuleOutcome::InfoGap);
    if !flagged && unknown.is_empty() {
        return None;
    }

    let mut reasons = Vec::new();
    if flagged {
        reasons.push(
            "Assessor recorded insufficient information to reach a conclusion.".to_string(),
        );
    }
    reasons.extend(
        unknown
            .iter()
            .map(|label| format!("{label}: not confirmed during the assessment.")),
    );

    let mut quick_actions: Vec<QuickAction> = unknown
        .iter()
        .map(|label| QuickAction {
            priority: kind.gap_priority(),
            text: format!("Confirm {}", label.to_lowercase()),
        })
        .collect();
    if unknown.is_empty() {
        quick_actions.push(QuickAction {
            priority: kind.gap_priority(),
            text: format!("Obtain the outstanding information for {}", kind.title()),
        });
    }
    quick_actions.extend(linked_open.iter().cloned());
    quick_actions.sort_by_key(|a| a.priority);

    Some(InfoGap {
        reasons,
        quick_actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_round_trip_and_unknown_keys_are_kept() {
        for kind in ModuleKind::KNOWN.iter() {
            assert_eq!(&ModuleKind::from_key(kind.key()), kind);
        }
        assert_eq!(ModuleKind::from_key(" Means_Of_Escape "), ModuleKind::MeansOfEscape);
        let unknown = ModuleKind::from_key("lift_inspection");
        assert_eq!(unknown, ModuleKind::Unknown("lift_inspection".to_string()));
        assert_eq!(unknown.title(), "Lift inspection");
        assert_eq!(unknown.flavor(), None);
    }

    #[test]
    fn absent_fields_are_omitted() {
        let (answers, error) = ModuleAnswers::decode(
            &ModuleKind::MeansOfEscape,
            &json!({"escape_routes": 2, "signage": "yes", "extra": true}),
        );
        assert!(error.is_none());
        let details = answers.key_details();
        assert_eq!(
            details,
            vec![
                KeyDetail::new("Escape routes", "2"),
                KeyDetail::new("Escape signage", "Yes"),
            ]
        );
    }

    #[test]
    fn blank_strings_and_empty_lists_are_omitted() {
        let (answers, _) = ModuleAnswers::decode(
            &ModuleKind::FireHazards,
            &json!({"ignition_sources": [" ", ""], "arson_risk": "  "}),
        );
        assert!(answers.key_details().is_empty());
    }

    #[test]
    fn mistyped_payload_degrades_to_generic() {
        let (answers, error) = ModuleAnswers::decode(
            &ModuleKind::MeansOfEscape,
            &json!({"escape_routes": "two", "signage": "yes"}),
        );
        assert!(error.is_some());
        assert!(matches!(answers, ModuleAnswers::Generic(_)));
        let details = answers.key_details();
        assert_eq!(details[0], KeyDetail::new("Escape routes", "two"));
    }

    #[test]
    fn generic_rendering_flattens_nested_objects() {
        let (answers, error) = ModuleAnswers::decode(
            &ModuleKind::from_key("lift_inspection"),
            &json!({"lift": {"last_service": "2026-01-10", "firefighting": false}, "notes": null}),
        );
        assert!(error.is_none());
        assert_eq!(
            answers.key_details(),
            vec![
                KeyDetail::new("Lift / Last service", "2026-01-10"),
                KeyDetail::new("Lift / Firefighting", "No"),
            ]
        );
    }

    #[test]
    fn no_gap_without_flag_or_unknown_answer() {
        let (answers, _) =
            ModuleAnswers::decode(&ModuleKind::FireProtection, &json!({"sprinklers": "no"}));
        assert!(
            detect_info_gap(
                &ModuleKind::FireProtection,
                Some(ModuleOutcome::MinorDeficiency),
                &answers,
                &[]
            )
            .is_none()
        );
    }

    #[test]
    fn unknown_answers_raise_a_gap_with_sorted_quick_actions() {
        let (answers, _) = ModuleAnswers::decode(
            &ModuleKind::FireSafetyManagement,
            &json!({"fire_policy": "unknown", "records_kept": "unsure"}),
        );
        let linked = vec![QuickAction {
            priority: PriorityBand::P1,
            text: "Appoint a competent person".to_string(),
        }];
        let gap = detect_info_gap(
            &ModuleKind::FireSafetyManagement,
            None,
            &answers,
            &linked,
        )
        .expect("gap");
        assert_eq!(gap.reasons.len(), 2);
        let priorities: Vec<PriorityBand> = gap.quick_actions.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![PriorityBand::P1, PriorityBand::P3, PriorityBand::P3]);
        assert_eq!(gap.quick_actions[1].text, "Confirm written fire safety policy");
    }

    #[test]
    fn assessor_flag_alone_raises_a_gap() {
        let (answers, _) = ModuleAnswers::decode(&ModuleKind::MeansOfEscape, &Value::Null);
        let gap = detect_info_gap(
            &ModuleKind::MeansOfEscape,
            Some(ModuleOutcome::InfoGap),
            &answers,
            &[],
        )
        .expect("gap");
        assert_eq!(gap.reasons.len(), 1);
        assert_eq!(gap.quick_actions.len(), 1);
        assert_eq!(gap.quick_actions[0].priority, PriorityBand::P2);
    }
}
