//! The resolved, immutable plan of one report: which sections render, in
//! which order, with which data.

use crate::model::{
    ActionRating, ActionStatus, DocumentMode, Jurisdiction, ModuleOutcome, PriorityBand,
    ReportKind, RevisionEntry,
};
use crate::modules::{InfoGap, KeyDetail, ModuleKind};
use crate::rules::{ComplexityBand, OutcomeStrategy, ResolvedOutcome};
use crate::types::Color;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct CoverData {
    pub report_name: String,
    pub title: String,
    pub version: u32,
    pub status_label: String,
    pub document_id: String,
    pub site_name: Option<String>,
    pub site_address: Option<String>,
    pub client: Option<String>,
    pub assessor: Option<String>,
    pub reviewer: Option<String>,
    pub assessment_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub organisation: Option<String>,
    pub brand: Option<Color>,
    pub jurisdiction: Jurisdiction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentControlData {
    pub fields: Vec<KeyDetail>,
    /// Newest first.
    pub revisions: Vec<RevisionEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopIssue {
    pub reference: String,
    pub text: String,
    pub priority: PriorityBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveSummaryData {
    pub outcome: ResolvedOutcome,
    pub strategy: OutcomeStrategy,
    pub complexity: ComplexityBand,
    pub open_by_priority: [usize; 4],
    pub closed: usize,
    pub top_issues: Vec<TopIssue>,
    pub module_outcomes: Vec<(String, Option<ModuleOutcome>)>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    pub instance_id: String,
    pub kind: ModuleKind,
    pub title: String,
    pub outcome: Option<ModuleOutcome>,
    pub completed: bool,
    pub details: Vec<KeyDetail>,
    pub notes: Option<String>,
    pub info_gap: Option<InfoGap>,
    /// Register references of actions raised against this module.
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleGroupData {
    pub heading: String,
    pub level: u8,
    pub modules: Vec<ResolvedModule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterEntry {
    pub reference: String,
    pub text: String,
    pub priority: PriorityBand,
    /// Priority came from the rating score rather than the action record.
    pub priority_derived: bool,
    pub status: ActionStatus,
    pub owner: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub category: Option<String>,
    pub module_instance_id: Option<String>,
    pub module_title: Option<String>,
    pub latest_rating: Option<ActionRating>,
}

/// Register order: open before closed, then priority, then target date
/// (undated last), then newest first.
pub fn register_order(a: &RegisterEntry, b: &RegisterEntry) -> Ordering {
    let group = |e: &RegisterEntry| if e.status.is_open() { 0u8 } else { 1u8 };
    group(a)
        .cmp(&group(b))
        .then(a.priority.cmp(&b.priority))
        .then_with(|| match (a.target_date, b.target_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentEntry {
    pub reference: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    pub caption: Option<String>,
    pub modules: Vec<String>,
    pub actions: Vec<String>,
}

/// `E-001`, `E-002`, ... in input order.
pub fn attachment_reference(index: usize) -> String {
    format!("E-{:03}", index + 1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegulatoryData {
    pub flavor: ReportKind,
    pub jurisdiction: Jurisdiction,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssumptionsData {
    pub flavors: Vec<ReportKind>,
    pub scope: Option<String>,
    pub limitations: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    SimpleCover(CoverData),
    BrandedCover(CoverData),
    DocumentControl(DocumentControlData),
    /// Contents list sized for `entries` headings.
    Contents { entries: usize },
    ExecutiveSummary(ExecutiveSummaryData),
    PartDivider(String),
    Regulatory(RegulatoryData),
    ModuleSummary(ModuleGroupData),
    ActionRegister(Vec<RegisterEntry>),
    Attachments(Vec<AttachmentEntry>),
    Assumptions(AssumptionsData),
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::SimpleCover(_) => "simple_cover",
            Section::BrandedCover(_) => "branded_cover",
            Section::DocumentControl(_) => "document_control",
            Section::Contents { .. } => "contents",
            Section::ExecutiveSummary(_) => "executive_summary",
            Section::PartDivider(_) => "part_divider",
            Section::Regulatory(_) => "regulatory",
            Section::ModuleSummary(_) => "module_summary",
            Section::ActionRegister(_) => "action_register",
            Section::Attachments(_) => "attachments",
            Section::Assumptions(_) => "assumptions",
        }
    }

    /// Number of headings this section lists in the table of contents.
    pub fn contents_entries(&self) -> usize {
        match self {
            Section::SimpleCover(_)
            | Section::BrandedCover(_)
            | Section::DocumentControl(_)
            | Section::Contents { .. } => 0,
            Section::ModuleSummary(data) => 1 + data.modules.len(),
            Section::ExecutiveSummary(_)
            | Section::PartDivider(_)
            | Section::Regulatory(_)
            | Section::ActionRegister(_)
            | Section::Attachments(_)
            | Section::Assumptions(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportManifest {
    pub kind: ReportKind,
    pub mode: DocumentMode,
    pub title: String,
    pub author: Option<String>,
    pub generated_on: NaiveDate,
    pub footer_left: String,
    pub sections: Vec<Section>,
}

impl ReportManifest {
    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections.iter().map(Section::name).collect()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name() == name)
    }
}

/// Stable sort by position in `order`; kinds not listed keep their input
/// order after every listed kind.
pub fn order_modules(modules: &mut [ResolvedModule], order: &[ModuleKind]) {
    modules.sort_by_key(|m| {
        order
            .iter()
            .position(|kind| *kind == m.kind)
            .unwrap_or(usize::MAX)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn entry(
        reference: &str,
        status: ActionStatus,
        priority: PriorityBand,
        target: Option<NaiveDate>,
        created_day: u32,
    ) -> RegisterEntry {
        RegisterEntry {
            reference: reference.to_string(),
            text: String::new(),
            priority,
            priority_derived: false,
            status,
            owner: None,
            target_date: target,
            created_at: Utc
                .with_ymd_and_hms(2026, 1, created_day, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
            category: None,
            module_instance_id: None,
            module_title: None,
            latest_rating: None,
        }
    }

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 6, day)
    }

    #[test]
    fn register_order_follows_all_four_keys() {
        let mut entries = vec![
            entry("closed-p1", ActionStatus::Closed, PriorityBand::P1, date(1), 1),
            entry("open-p3", ActionStatus::Open, PriorityBand::P3, date(1), 1),
            entry("p1-undated-old", ActionStatus::Open, PriorityBand::P1, None, 1),
            entry("p1-undated-new", ActionStatus::InProgress, PriorityBand::P1, None, 5),
            entry("p1-late", ActionStatus::Open, PriorityBand::P1, date(20), 1),
            entry("p1-early", ActionStatus::Open, PriorityBand::P1, date(2), 1),
            entry("complete-p2", ActionStatus::Complete, PriorityBand::P2, None, 3),
        ];
        entries.sort_by(register_order);
        let order: Vec<&str> = entries.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "p1-early",
                "p1-late",
                "p1-undated-new",
                "p1-undated-old",
                "open-p3",
                "closed-p1",
                "complete-p2",
            ]
        );
    }

    #[test]
    fn unknown_modules_sort_last_in_input_order() {
        let module = |kind: ModuleKind, id: &str| ResolvedModule {
            instance_id: id.to_string(),
            title: kind.title(),
            kind,
            outcome: None,
            completed: true,
            details: Vec::new(),
            notes: None,
            info_gap: None,
            actions: Vec::new(),
        };
        let mut modules = vec![
            module(ModuleKind::Unknown("zeta".to_string()), "u1"),
            module(ModuleKind::FireProtection, "m2"),
            module(ModuleKind::Unknown("alpha".to_string()), "u2"),
            module(ModuleKind::BuildingProfile, "m1"),
        ];
        order_modules(
            &mut modules,
            &[ModuleKind::BuildingProfile, ModuleKind::FireProtection],
        );
        let ids: Vec<&str> = modules.iter().map(|m| m.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "u1", "u2"]);
    }

    fn arb_entry() -> impl Strategy<Value = RegisterEntry> {
        (
            prop_oneof![
                Just(ActionStatus::Open),
                Just(ActionStatus::InProgress),
                Just(ActionStatus::Complete),
                Just(ActionStatus::Closed)
            ],
            0usize..4,
            proptest::option::of(1u32..28),
            1u32..28,
        )
            .prop_map(|(status, p, target, created)| {
                entry("x", status, PriorityBand::ALL[p], target.and_then(date), created)
            })
    }

    proptest! {
        #[test]
        fn prop_register_is_ordered(mut entries in proptest::collection::vec(arb_entry(), 0..40)) {
            entries.sort_by(register_order);
            for pair in entries.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.status.is_open() || !b.status.is_open());
                if a.status.is_open() == b.status.is_open() {
                    prop_assert!(a.priority <= b.priority);
                    if a.priority == b.priority {
                        match (a.target_date, b.target_date) {
                            (Some(x), Some(y)) => prop_assert!(x <= y),
                            (None, Some(_)) => prop_assert!(false, "undated before dated"),
                            _ => {}
                        }
                        if a.target_date == b.target_date {
                            prop_assert!(a.created_at >= b.created_at);
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_attachment_references_are_sequential(count in 0usize..1200) {
            let refs: Vec<String> = (0..count).map(attachment_reference).collect();
            for (i, r) in refs.iter().enumerate() {
                let digits = r.strip_prefix("E-").expect("E- prefix");
                prop_assert!(digits.len() >= 3);
                prop_assert_eq!(digits.parse::<usize>().expect("numeric"), i + 1);
            }
            let shown = refs.len().min(999);
            let mut sorted = refs[..shown].to_vec();
            sorted.sort();
            prop_assert_eq!(&sorted[..], &refs[..shown]);
        }
    }
}
