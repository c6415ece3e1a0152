//! Report recipes. Each report kind is a fixed pipeline of sections plus a
//! module ordering table; the assembler resolves the input into an
//! immutable [`ReportManifest`] and never touches a page.

use crate::assets::ResolvedAssets;
use crate::diagnostics::Diagnostics;
use crate::manifest::{
    AssumptionsData, AttachmentEntry, CoverData, DocumentControlData, ExecutiveSummaryData,
    ModuleGroupData, RegisterEntry, RegulatoryData, ReportManifest, ResolvedModule, Section,
    TopIssue, attachment_reference, order_modules, register_order,
};
use crate::model::{Action, DocumentMode, PriorityBand, ReportInput, ReportKind};
use crate::modules::{
    InfoGap, KeyDetail, ModuleAnswers, ModuleKind, QuickAction, YesNoUnknown, detect_info_gap,
};
use crate::rules::{ComplexityFactors, OutcomeStrategy, RuleSet, resolve_outcome};
use crate::sections::format_date;
use crate::types::Color;
use chrono::NaiveDate;
use std::collections::HashMap;

const TOP_ISSUES: usize = 5;

static FRA_ORDER: [ModuleKind; 7] = [
    ModuleKind::BuildingProfile,
    ModuleKind::PersonsAtRisk,
    ModuleKind::FireSafetyManagement,
    ModuleKind::FireHazards,
    ModuleKind::MeansOfEscape,
    ModuleKind::FireProtection,
    ModuleKind::EmergencyArrangements,
];

static DSEAR_ORDER: [ModuleKind; 7] = [
    ModuleKind::BuildingProfile,
    ModuleKind::PersonsAtRisk,
    ModuleKind::DangerousSubstances,
    ModuleKind::ReleaseSources,
    ModuleKind::HazardousAreas,
    ModuleKind::IgnitionControl,
    ModuleKind::ExplosionEmergency,
];

static FSD_ORDER: [ModuleKind; 7] = [
    ModuleKind::BuildingProfile,
    ModuleKind::PersonsAtRisk,
    ModuleKind::RegulatoryBasis,
    ModuleKind::EvacuationStrategy,
    ModuleKind::StructuralFireResistance,
    ModuleKind::ExternalFireSpread,
    ModuleKind::FirefightingAccess,
];

static SURVEY_ORDER: [ModuleKind; 17] = ModuleKind::KNOWN;

/// Condition under which a pipeline step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum When {
    Always,
    Draft,
    LeadPages,
    HasContents,
    HasAttachments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SimpleCover,
    BrandedCover,
    DocumentControl,
    Contents,
    ExecutiveSummary,
    Body,
    ActionRegister,
    Attachments,
    Assumptions,
}

const PIPELINE: &[(When, Step)] = &[
    (When::Draft, Step::SimpleCover),
    (When::LeadPages, Step::BrandedCover),
    (When::LeadPages, Step::DocumentControl),
    (When::HasContents, Step::Contents),
    (When::Always, Step::ExecutiveSummary),
    (When::Always, Step::Body),
    (When::Always, Step::ActionRegister),
    (When::HasAttachments, Step::Attachments),
    (When::Always, Step::Assumptions),
];

/// One block of modules rendered under a single regulatory framework.
struct Part {
    flavor: ReportKind,
    divider: Option<&'static str>,
    order: &'static [ModuleKind],
    accepts: fn(&ModuleKind) -> bool,
}

struct Recipe {
    contents: bool,
    parts: Vec<Part>,
}

fn any_module(_: &ModuleKind) -> bool {
    true
}

fn not_fire_strategy(kind: &ModuleKind) -> bool {
    kind.flavor() != Some(ReportKind::Fsd)
}

fn fire_strategy(kind: &ModuleKind) -> bool {
    kind.flavor() == Some(ReportKind::Fsd)
}

fn recipe(kind: ReportKind) -> Recipe {
    let single = |flavor, order| Part {
        flavor,
        divider: None,
        order,
        accepts: any_module,
    };
    match kind {
        ReportKind::Fra => Recipe {
            contents: true,
            parts: vec![single(ReportKind::Fra, &FRA_ORDER[..])],
        },
        ReportKind::Dsear => Recipe {
            contents: true,
            parts: vec![single(ReportKind::Dsear, &DSEAR_ORDER[..])],
        },
        ReportKind::Fsd => Recipe {
            contents: true,
            parts: vec![single(ReportKind::Fsd, &FSD_ORDER[..])],
        },
        ReportKind::Combined => Recipe {
            contents: true,
            parts: vec![
                Part {
                    flavor: ReportKind::Fra,
                    divider: Some("Part A: Fire Risk Assessment"),
                    order: &FRA_ORDER[..],
                    accepts: not_fire_strategy,
                },
                Part {
                    flavor: ReportKind::Fsd,
                    divider: Some("Part B: Fire Strategy"),
                    order: &FSD_ORDER[..],
                    accepts: fire_strategy,
                },
            ],
        },
        ReportKind::Survey => Recipe {
            contents: false,
            parts: vec![single(ReportKind::Survey, &SURVEY_ORDER[..])],
        },
    }
}

/// Resolves `input` into the manifest of one build.
pub fn assemble(
    kind: ReportKind,
    input: &ReportInput,
    assets: &ResolvedAssets,
    rules: &dyn RuleSet,
    generated_on: NaiveDate,
) -> (ReportManifest, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mode = input.mode();
    let recipe = recipe(kind);

    let register = build_register(input, rules, &mut diagnostics);
    let modules = resolve_modules(input, &register, &mut diagnostics);
    let attachments = resolve_attachments(input, assets, &modules, &mut diagnostics);

    let mut groups: Vec<(&Part, Vec<ResolvedModule>)> = recipe
        .parts
        .iter()
        .map(|part| {
            let mut members: Vec<ResolvedModule> = modules
                .iter()
                .filter(|m| (part.accepts)(&m.kind))
                .cloned()
                .collect();
            order_modules(&mut members, part.order);
            (part, members)
        })
        .collect();
    if recipe.parts.len() > 1 {
        groups.retain(|(part, members)| !members.is_empty() || part.flavor == ReportKind::Fra);
    }

    let summary = executive_summary(kind, input, rules, &register, &modules, &groups);
    let combined = groups.len() > 1;

    let mut sections = Vec::new();
    for (when, step) in PIPELINE {
        let applies = match when {
            When::Always => true,
            When::Draft => mode == DocumentMode::Draft,
            When::LeadPages => mode.has_lead_pages(),
            When::HasContents => recipe.contents,
            When::HasAttachments => !attachments.is_empty(),
        };
        if !applies {
            continue;
        }
        match step {
            Step::SimpleCover => {
                sections.push(Section::SimpleCover(cover(kind, input, &mut diagnostics)))
            }
            Step::BrandedCover => {
                sections.push(Section::BrandedCover(cover(kind, input, &mut diagnostics)))
            }
            Step::DocumentControl => {
                sections.push(Section::DocumentControl(document_control(input, assets)))
            }
            Step::Contents => sections.push(Section::Contents { entries: 0 }),
            Step::ExecutiveSummary => sections.push(Section::ExecutiveSummary(summary.clone())),
            Step::Body => {
                for (part, members) in &groups {
                    let level = if combined { 1 } else { 0 };
                    if combined {
                        if let Some(divider) = part.divider {
                            sections.push(Section::PartDivider(divider.to_string()));
                        }
                    }
                    sections.push(Section::Regulatory(RegulatoryData {
                        flavor: part.flavor,
                        jurisdiction: input.document.jurisdiction,
                        level,
                    }));
                    sections.push(Section::ModuleSummary(ModuleGroupData {
                        heading: if combined { "Findings" } else { "Module Summary" }.to_string(),
                        level,
                        modules: members.clone(),
                    }));
                }
            }
            Step::ActionRegister => sections.push(Section::ActionRegister(register.clone())),
            Step::Attachments => sections.push(Section::Attachments(attachments.clone())),
            Step::Assumptions => sections.push(Section::Assumptions(AssumptionsData {
                flavors: groups.iter().map(|(part, _)| part.flavor).collect(),
                scope: input.document.scope.clone(),
                limitations: input.document.limitations.clone(),
            })),
        }
    }

    let listed: usize = sections.iter().map(Section::contents_entries).sum();
    for section in &mut sections {
        if let Section::Contents { entries } = section {
            *entries = listed;
        }
    }

    let document = &input.document;
    let manifest = ReportManifest {
        kind,
        mode,
        title: document.title.clone(),
        author: document.assessor_name.clone(),
        generated_on,
        footer_left: format!(
            "{} - {} - v{} - Generated {}",
            kind.display_name(),
            document.title,
            document.version,
            format_date(generated_on)
        ),
        sections,
    };
    (manifest, diagnostics)
}

/// The action's own reference, else `A-###` from its input position.
fn action_reference(index: usize, action: &Action) -> String {
    action
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("A-{:03}", index + 1))
}

/// Register entries in register order. Priority comes from the action,
/// else from its latest rating score, else defaults to P4.
fn build_register(
    input: &ReportInput,
    rules: &dyn RuleSet,
    diagnostics: &mut Diagnostics,
) -> Vec<RegisterEntry> {
    let mut register: Vec<RegisterEntry> = input
        .actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let latest_rating = input.latest_rating(&action.id).cloned();
            let (priority, priority_derived) = match (action.priority, &latest_rating) {
                (Some(band), _) => (band, false),
                (None, Some(rating)) => (rules.priority_for_score(rating.score()), true),
                (None, None) => {
                    diagnostics.warn(
                        "register.priority_defaulted",
                        format!("action {} has no priority or rating; shown as P4", action.id),
                    );
                    (PriorityBand::P4, false)
                }
            };
            let reference = action_reference(i, action);
            let module_title = action
                .module_instance_id
                .as_deref()
                .and_then(|id| input.module(id))
                .map(|m| ModuleKind::from_key(&m.module_key).title());
            RegisterEntry {
                reference,
                text: action.text.clone(),
                priority,
                priority_derived,
                status: action.status,
                owner: action.owner.clone(),
                target_date: action.target_date,
                created_at: action.created_at,
                category: action.category.clone(),
                module_instance_id: action.module_instance_id.clone(),
                module_title,
                latest_rating,
            }
        })
        .collect();
    register.sort_by(register_order);
    register
}

fn resolve_modules(
    input: &ReportInput,
    register: &[RegisterEntry],
    diagnostics: &mut Diagnostics,
) -> Vec<ResolvedModule> {
    input
        .modules
        .iter()
        .map(|instance| {
            let kind = ModuleKind::from_key(&instance.module_key);
            if let ModuleKind::Unknown(key) = &kind {
                diagnostics.info(
                    "module.unknown_kind",
                    format!("module {} has unknown key '{key}'", instance.id),
                );
            }
            let (answers, error) = ModuleAnswers::decode(&kind, &instance.answers);
            if let Some(error) = error {
                diagnostics.warn(
                    "module.decode_fallback",
                    format!("module {} ({}): {error}", instance.id, kind.key()),
                );
            }
            let linked: Vec<&RegisterEntry> = register
                .iter()
                .filter(|e| e.module_instance_id.as_deref() == Some(instance.id.as_str()))
                .collect();
            let linked_open: Vec<QuickAction> = linked
                .iter()
                .filter(|e| e.status.is_open())
                .map(|e| QuickAction {
                    priority: e.priority,
                    text: format!("{}: {}", e.reference, e.text),
                })
                .collect();
            let info_gap: Option<InfoGap> =
                detect_info_gap(&kind, instance.outcome, &answers, &linked_open);
            ResolvedModule {
                instance_id: instance.id.clone(),
                title: kind.title(),
                outcome: instance.outcome,
                completed: instance.completed,
                details: answers.key_details(),
                notes: instance.assessor_notes.clone(),
                info_gap,
                actions: linked.iter().map(|e| e.reference.clone()).collect(),
                kind,
            }
        })
        .collect()
}

fn complexity_factors(input: &ReportInput) -> ComplexityFactors {
    let mut factors = ComplexityFactors::default();
    for instance in &input.modules {
        let kind = ModuleKind::from_key(&instance.module_key);
        if kind.flavor() == Some(ReportKind::Dsear) {
            factors.dangerous_substances = true;
        }
        match ModuleAnswers::decode(&kind, &instance.answers).0 {
            ModuleAnswers::BuildingProfile(profile) => {
                factors.storeys = factors.storeys.max(profile.storeys);
                if profile.sleeping_accommodation == Some(YesNoUnknown::Yes) {
                    factors.sleeping_accommodation = true;
                }
            }
            ModuleAnswers::PersonsAtRisk(persons) => {
                factors.max_occupancy = factors.max_occupancy.max(persons.max_occupancy);
            }
            _ => {}
        }
    }
    factors
}

fn executive_summary(
    kind: ReportKind,
    input: &ReportInput,
    rules: &dyn RuleSet,
    register: &[RegisterEntry],
    modules: &[ResolvedModule],
    groups: &[(&Part, Vec<ResolvedModule>)],
) -> ExecutiveSummaryData {
    let outcomes: Vec<_> = modules.iter().map(|m| m.outcome).collect();
    let open: Vec<&RegisterEntry> = register.iter().filter(|e| e.status.is_open()).collect();
    let open_priorities: Vec<PriorityBand> = open.iter().map(|e| e.priority).collect();
    let engine = rules.overall_outcome(&outcomes, &open_priorities);
    let strategy = OutcomeStrategy::for_kind(kind);
    let outcome = resolve_outcome(
        strategy,
        kind,
        engine,
        input.document.assessor_overall_rating.as_deref(),
    );
    let complexity = rules.complexity(&complexity_factors(input));

    let mut open_by_priority = [0usize; 4];
    for band in &open_priorities {
        open_by_priority[band.index()] += 1;
    }

    let module_keys: HashMap<&str, &str> = modules
        .iter()
        .map(|m| (m.instance_id.as_str(), m.kind.key()))
        .collect();
    let mut ranked = open;
    if complexity.prefers_criticality() {
        ranked.sort_by_key(|e| {
            let category = e.category.as_deref().or_else(|| {
                e.module_instance_id
                    .as_deref()
                    .and_then(|id| module_keys.get(id).copied())
            });
            (e.priority, rules.criticality_rank(category))
        });
    }
    let top_issues = ranked
        .iter()
        .take(TOP_ISSUES)
        .map(|e| TopIssue {
            reference: e.reference.clone(),
            text: e.text.clone(),
            priority: e.priority,
        })
        .collect();

    ExecutiveSummaryData {
        outcome,
        strategy,
        complexity,
        open_by_priority,
        closed: register.len() - open_priorities.len(),
        top_issues,
        module_outcomes: groups
            .iter()
            .flat_map(|(_, members)| members.iter().map(|m| (m.title.clone(), m.outcome)))
            .collect(),
        commentary: input.document.executive_commentary.clone(),
    }
}

fn resolve_attachments(
    input: &ReportInput,
    assets: &ResolvedAssets,
    modules: &[ResolvedModule],
    diagnostics: &mut Diagnostics,
) -> Vec<AttachmentEntry> {
    let list = assets.attachments.as_ref().unwrap_or(&input.attachments);
    let module_titles: HashMap<&str, &str> = modules
        .iter()
        .map(|m| (m.instance_id.as_str(), m.title.as_str()))
        .collect();
    let action_refs: HashMap<&str, String> = input
        .actions
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.as_str(), action_reference(i, a)))
        .collect();

    list.iter()
        .enumerate()
        .map(|(i, attachment)| AttachmentEntry {
            reference: attachment_reference(i),
            filename: attachment.filename.clone(),
            mime_type: attachment.mime_type.clone(),
            size_bytes: attachment.size_bytes,
            caption: attachment.caption.clone(),
            modules: resolve_ids(
                &attachment.module_instance_ids,
                "module",
                |id| module_titles.get(id).map(|t| t.to_string()),
                diagnostics,
            ),
            actions: resolve_ids(
                &attachment.action_ids,
                "action",
                |id| action_refs.get(id).cloned(),
                diagnostics,
            ),
        })
        .collect()
}

/// Cross-references resolved by id; unknown ids are dropped.
fn resolve_ids(
    ids: &[String],
    what: &str,
    found: impl Fn(&str) -> Option<String>,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    ids.iter()
        .filter_map(|id| {
            let resolved = found(id);
            if resolved.is_none() {
                diagnostics.info(
                    "attachments.unresolved_reference",
                    format!("attachment refers to unknown {what} {id}"),
                );
            }
            resolved
        })
        .collect()
}

fn cover(kind: ReportKind, input: &ReportInput, diagnostics: &mut Diagnostics) -> CoverData {
    let document = &input.document;
    let brand = input
        .organisation
        .as_ref()
        .and_then(|o| o.brand_color.as_deref())
        .and_then(|raw| {
            let parsed = Color::from_hex(raw);
            if parsed.is_none() {
                diagnostics.warn(
                    "branding.invalid_color",
                    format!("ignoring brand colour '{raw}'"),
                );
            }
            parsed
        });
    CoverData {
        report_name: kind.display_name().to_string(),
        title: document.title.clone(),
        version: document.version,
        status_label: document.status.label().to_string(),
        document_id: document.id.clone(),
        site_name: document.site_name.clone(),
        site_address: document.site_address.clone(),
        client: document.client_name.clone(),
        assessor: document.assessor_name.clone(),
        reviewer: document.reviewer_name.clone(),
        assessment_date: document.assessment_date,
        issue_date: document.issue_date,
        organisation: input.organisation_name().map(str::to_string),
        brand,
        jurisdiction: document.jurisdiction,
    }
}

fn document_control(input: &ReportInput, assets: &ResolvedAssets) -> DocumentControlData {
    let document = &input.document;
    let field = |label: &str, value: Option<String>| KeyDetail {
        label: label.to_string(),
        value: value.unwrap_or_default(),
    };
    let fields = vec![
        field("Document reference", Some(document.id.clone())),
        field("Title", Some(document.title.clone())),
        field("Version", Some(format!("v{}", document.version))),
        field("Status", Some(document.status.label().to_string())),
        field("Client", document.client_name.clone()),
        field("Site", document.site_name.clone()),
        field("Prepared by", input.organisation_name().map(str::to_string)),
        field("Assessor", document.assessor_name.clone()),
        field("Reviewer", document.reviewer_name.clone()),
        field("Assessment date", document.assessment_date.map(format_date)),
        field("Issue date", document.issue_date.map(format_date)),
        field("Next review", document.review_date.map(format_date)),
        field("Jurisdiction", Some(document.jurisdiction.display_name().to_string())),
    ];
    let mut revisions = assets.revisions.clone().unwrap_or_else(|| input.revisions.clone());
    revisions.sort_by(|a, b| b.version.cmp(&a.version));
    DocumentControlData { fields, revisions }
}
