//! Input records for one report build, decoded once at the crate boundary.

use crate::error::ReportError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Draft,
    #[serde(alias = "review")]
    InReview,
    Issued,
    Superseded,
}

impl LifecycleStatus {
    pub fn mode(self) -> DocumentMode {
        match self {
            LifecycleStatus::Draft | LifecycleStatus::InReview => DocumentMode::Draft,
            LifecycleStatus::Issued => DocumentMode::Issued,
            LifecycleStatus::Superseded => DocumentMode::Superseded,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LifecycleStatus::Draft => "Draft",
            LifecycleStatus::InReview => "In review",
            LifecycleStatus::Issued => "Issued",
            LifecycleStatus::Superseded => "Superseded",
        }
    }
}

/// Rendering mode of a build. Decides the prelude, the watermark and the
/// overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentMode {
    Draft,
    Issued,
    Superseded,
}

impl DocumentMode {
    pub const LEAD_PAGES: usize = 2;

    /// Issued and superseded documents open with the branded two-page prelude.
    pub fn has_lead_pages(self) -> bool {
        matches!(self, DocumentMode::Issued | DocumentMode::Superseded)
    }

    /// Number of registry pages the footer pass skips.
    pub fn footer_offset(self) -> usize {
        if self.has_lead_pages() {
            Self::LEAD_PAGES
        } else {
            0
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentMode::Draft => "draft",
            DocumentMode::Issued => "issued",
            DocumentMode::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    #[default]
    #[serde(alias = "england", alias = "wales", alias = "england_and_wales")]
    EnglandWales,
    Scotland,
    NorthernIreland,
    #[serde(alias = "ireland", alias = "roi")]
    RepublicOfIreland,
}

impl Jurisdiction {
    pub fn display_name(self) -> &'static str {
        match self {
            Jurisdiction::EnglandWales => "England & Wales",
            Jurisdiction::Scotland => "Scotland",
            Jurisdiction::NorthernIreland => "Northern Ireland",
            Jurisdiction::RepublicOfIreland => "Republic of Ireland",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Fra,
    Dsear,
    Fsd,
    Combined,
    Survey,
}

impl ReportKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ReportKind::Fra => "Fire Risk Assessment",
            ReportKind::Dsear => "Explosion Risk Assessment (DSEAR)",
            ReportKind::Fsd => "Fire Strategy Document",
            ReportKind::Combined => "Fire Risk Assessment & Fire Strategy",
            ReportKind::Survey => "Survey Report",
        }
    }

    pub fn short_code(self) -> &'static str {
        match self {
            ReportKind::Fra => "FRA",
            ReportKind::Dsear => "DSEAR",
            ReportKind::Fsd => "FSD",
            ReportKind::Combined => "FRA+FSD",
            ReportKind::Survey => "SURVEY",
        }
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub status: LifecycleStatus,
    #[serde(default)]
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub assessor_name: Option<String>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub assessment_date: Option<NaiveDate>,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Date printed in the footer; the build date is used when absent.
    #[serde(default)]
    pub generated_on: Option<NaiveDate>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub limitations: Option<String>,
    #[serde(default)]
    pub executive_commentary: Option<String>,
    #[serde(default)]
    pub assessor_overall_rating: Option<String>,
}

impl DocumentRecord {
    pub fn mode(&self) -> DocumentMode {
        self.status.mode()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleOutcome {
    Compliant,
    MinorDeficiency,
    MaterialDeficiency,
    InfoGap,
    NotApplicable,
}

impl ModuleOutcome {
    pub fn label(self) -> &'static str {
        match self {
            ModuleOutcome::Compliant => "Compliant",
            ModuleOutcome::MinorDeficiency => "Minor deficiency",
            ModuleOutcome::MaterialDeficiency => "Material deficiency",
            ModuleOutcome::InfoGap => "Information gap",
            ModuleOutcome::NotApplicable => "Not applicable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleInstance {
    pub id: String,
    pub module_key: String,
    #[serde(default)]
    pub answers: serde_json::Value,
    #[serde(default)]
    pub outcome: Option<ModuleOutcome>,
    #[serde(default)]
    pub assessor_notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Ordinal urgency, P1 most urgent. `Ord` follows urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum PriorityBand {
    #[serde(alias = "p1")]
    P1,
    #[serde(alias = "p2")]
    P2,
    #[serde(alias = "p3")]
    P3,
    #[serde(alias = "p4")]
    P4,
}

impl PriorityBand {
    pub const ALL: [PriorityBand; 4] = [
        PriorityBand::P1,
        PriorityBand::P2,
        PriorityBand::P3,
        PriorityBand::P4,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PriorityBand::P1 => "P1",
            PriorityBand::P2 => "P2",
            PriorityBand::P3 => "P3",
            PriorityBand::P4 => "P4",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PriorityBand::P1 => "Immediate",
            PriorityBand::P2 => "Urgent",
            PriorityBand::P3 => "Planned",
            PriorityBand::P4 => "Advisory",
        }
    }

    pub fn index(self) -> usize {
        match self {
            PriorityBand::P1 => 0,
            PriorityBand::P2 => 1,
            PriorityBand::P3 => 2,
            PriorityBand::P4 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Complete,
    Closed,
}

impl ActionStatus {
    pub fn is_open(self) -> bool {
        matches!(self, ActionStatus::Open | ActionStatus::InProgress)
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "In progress",
            ActionStatus::Complete => "Complete",
            ActionStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub text: String,
    #[serde(default)]
    pub priority: Option<PriorityBand>,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub module_instance_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionRating {
    pub action_id: String,
    pub likelihood: u32,
    pub impact: u32,
    #[serde(default)]
    pub score: Option<u32>,
    pub rated_at: DateTime<Utc>,
}

impl ActionRating {
    /// Recorded score, or likelihood x impact when the record omits it.
    pub fn score(&self) -> u32 {
        self.score
            .unwrap_or_else(|| self.likelihood.saturating_mul(self.impact))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Organisation {
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    /// `#rrggbb` accent used on the branded cover.
    #[serde(default)]
    pub brand_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub module_instance_ids: Vec<String>,
    #[serde(default)]
    pub action_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RevisionEntry {
    pub version: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: Option<LifecycleStatus>,
}

/// Everything one build reads. Attachments and revision history may be
/// supplied inline or fetched through a [`crate::ReportSource`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportInput {
    pub document: DocumentRecord,
    #[serde(default)]
    pub modules: Vec<ModuleInstance>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub ratings: Vec<ActionRating>,
    #[serde(default)]
    pub organisation: Option<Organisation>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub revisions: Vec<RevisionEntry>,
}

impl ReportInput {
    pub fn from_json(raw: &str) -> Result<Self, ReportError> {
        let input: ReportInput = serde_json::from_str(raw)?;
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.document.id.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "document.id must not be empty".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.id.as_str()) {
                return Err(ReportError::InvalidInput(format!(
                    "duplicate module instance id: {}",
                    module.id
                )));
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> DocumentMode {
        self.document.mode()
    }

    /// Most recent rating for an action; later entries win ties.
    pub fn latest_rating(&self, action_id: &str) -> Option<&ActionRating> {
        self.ratings
            .iter()
            .filter(|r| r.action_id == action_id)
            .fold(None, |best: Option<&ActionRating>, r| match best {
                Some(b) if b.rated_at > r.rated_at => Some(b),
                _ => Some(r),
            })
    }

    pub fn module(&self, id: &str) -> Option<&ModuleInstance> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn organisation_name(&self) -> Option<&str> {
        self.organisation
            .as_ref()
            .map(|o| o.name.trim())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "document": {"id": "doc-1", "title": "Riverside House", "status": "issued"},
        "actions": [
            {"id": "a1", "text": "Repair fire door", "priority": "P2",
             "created_at": "2026-03-01T09:00:00Z"}
        ],
        "ratings": [
            {"action_id": "a1", "likelihood": 3, "impact": 4, "rated_at": "2026-03-01T09:00:00Z"},
            {"action_id": "a1", "likelihood": 4, "impact": 5, "rated_at": "2026-04-01T09:00:00Z"},
            {"action_id": "a1", "likelihood": 1, "impact": 1, "score": 2, "rated_at": "2026-02-01T09:00:00Z"}
        ]
    }"#;

    #[test]
    fn decodes_with_defaults() {
        let input = ReportInput::from_json(MINIMAL).expect("decode");
        assert_eq!(input.document.version, 1);
        assert_eq!(input.document.jurisdiction, Jurisdiction::EnglandWales);
        assert_eq!(input.mode(), DocumentMode::Issued);
        assert_eq!(input.actions[0].status, ActionStatus::Open);
        assert!(input.attachments.is_empty());
    }

    #[test]
    fn latest_rating_is_by_timestamp() {
        let input = ReportInput::from_json(MINIMAL).expect("decode");
        let rating = input.latest_rating("a1").expect("rated");
        assert_eq!(rating.score(), 20);
        assert!(input.latest_rating("missing").is_none());
    }

    #[test]
    fn in_review_renders_as_draft() {
        assert_eq!(LifecycleStatus::InReview.mode(), DocumentMode::Draft);
        assert_eq!(DocumentMode::Superseded.footer_offset(), 2);
        assert_eq!(DocumentMode::Draft.footer_offset(), 0);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let err = ReportInput::from_json(r#"{"document": {"id": " ", "title": "x"}}"#)
            .expect_err("empty id");
        assert!(matches!(err, ReportError::InvalidInput(_)));
        let err = ReportInput::from_json(r#"{"document": {"title": "x"}}"#).expect_err("no id");
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[test]
    fn priority_order_follows_urgency() {
        let mut bands = vec![
            PriorityBand::P3,
            PriorityBand::P1,
            PriorityBand::P4,
            PriorityBand::P2,
        ];
        bands.sort();
        assert_eq!(bands, PriorityBand::ALL.to_vec());
    }
}
