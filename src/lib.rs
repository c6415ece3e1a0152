mod assembler;
mod assets;
mod block;
mod canvas;
mod config;
mod decorate;
mod diagnostics;
mod error;
mod fetch;
mod font;
mod manifest;
mod metrics;
mod model;
mod modules;
mod pagination;
mod pdf;
mod pdfinspect;
mod rules;
mod sections;
mod text;
mod types;

pub use assembler::assemble;
pub use assets::{
    AlphaMask, ImageAsset, ImageFilter, LOGO_RESOURCE, LogoResolution, ResolvedAssets,
    default_logo_png,
};
pub use canvas::{Command, Document, Page, TextStyle};
pub use config::{Palette, ReportConfig};
pub use decorate::{FOOTER_META, OVERLAY_META, WATERMARK_META};
pub use diagnostics::{DiagnosticEvent, Diagnostics, Level};
pub use error::{FetchError, ReportError};
pub use fetch::{ReportSource, resolve_assets};
pub use font::{FontFace, FontFamily, FontWeight, TextMeasure};
pub use manifest::{ReportManifest, Section, attachment_reference};
pub use metrics::{BuildMetrics, PageMetrics};
pub use model::{
    Action, ActionRating, ActionStatus, Attachment, DocumentMode, DocumentRecord, Jurisdiction,
    LifecycleStatus, ModuleInstance, ModuleOutcome, Organisation, PriorityBand, ReportInput,
    ReportKind, RevisionEntry,
};
pub use modules::{InfoGap, ModuleKind, QuickAction};
pub use pagination::{PageRegistry, Paginator};
pub use pdf::{PdfMeta, document_to_pdf};
pub use pdfinspect::{
    PageInspection, PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes,
    inspect_pdf_path, require_readable_report,
};
pub use rules::{
    ComplexityBand, ComplexityFactors, OutcomeStrategy, OverallOutcome, RuleSet, StandardRules,
};
pub use text::{sanitize, wrap_text};
pub use types::{Color, Margins, Pt, Size};

use chrono::{NaiveDate, Utc};
use diagnostics::DiagnosticsSink;
use sections::RenderContext;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Builds report PDFs against one immutable configuration. Cheap to share:
/// every build owns its own pages, cursor and diagnostics.
pub struct ReportEngine {
    config: Arc<ReportConfig>,
    rules: Arc<dyn RuleSet>,
    sink: Option<DiagnosticsSink>,
}

#[derive(Clone)]
pub struct ReportEngineBuilder {
    config: ReportConfig,
    font_family: Option<String>,
    rules: Option<Arc<dyn RuleSet>>,
    debug_path: Option<std::path::PathBuf>,
}

/// Finished PDF bytes plus everything the build recorded along the way.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub bytes: Vec<u8>,
    pub diagnostics: Diagnostics,
    pub metrics: BuildMetrics,
}

/// Laid-out and decorated pages before serialization.
#[derive(Debug, Clone)]
pub struct LaidOutReport {
    pub document: Document,
    pub manifest: ReportManifest,
    pub diagnostics: Diagnostics,
    /// Pages carrying a footer number; lead pages are not counted.
    pub footer_total: usize,
}

/// One entry of a parallel batch.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub kind: ReportKind,
    pub input: ReportInput,
    pub assets: ResolvedAssets,
}

impl ReportEngine {
    pub fn builder() -> ReportEngineBuilder {
        ReportEngineBuilder::new()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Lays out, decorates and serializes one report. Synchronous and
    /// deterministic for a fixed input, assets and `generated_on` date.
    pub fn build(
        &self,
        kind: ReportKind,
        input: &ReportInput,
        assets: &ResolvedAssets,
    ) -> Result<BuildOutput, ReportError> {
        let started = Instant::now();
        let LaidOutReport {
            document,
            manifest,
            diagnostics,
            ..
        } = self.build_document(kind, input, assets)?;
        let layout_ms = started.elapsed().as_secs_f64() * 1000.0;

        let created = manifest
            .generated_on
            .and_hms_opt(0, 0, 0)
            .map(|at| at.and_utc())
            .unwrap_or_default();
        let meta = PdfMeta {
            title: manifest.title.clone(),
            author: manifest
                .author
                .clone()
                .or_else(|| input.organisation_name().map(str::to_string)),
            subject: Some(kind.display_name().to_string()),
            created,
        };
        let serialize_started = Instant::now();
        let mut metrics = BuildMetrics::default();
        let bytes = pdf::document_to_pdf_with_metrics(
            &document,
            &assets.images(),
            &meta,
            Some(&mut metrics),
        )?;
        metrics.layout_ms = layout_ms;
        metrics.serialize_ms = serialize_started.elapsed().as_secs_f64() * 1000.0;

        info!(
            document = input.document.id.as_str(),
            kind = kind.short_code(),
            mode = manifest.mode.as_str(),
            pages = document.pages.len(),
            bytes = bytes.len(),
            warnings = diagnostics.warnings().count(),
            "report built"
        );
        if let Some(sink) = &self.sink {
            sink.append(
                &diagnostics,
                &format!("{}@v{}", input.document.id, input.document.version),
            );
        }
        Ok(BuildOutput {
            bytes,
            diagnostics,
            metrics,
        })
    }

    /// Every stage up to serialization: assemble, paginate, then the
    /// end-of-build decoration passes.
    pub fn build_document(
        &self,
        kind: ReportKind,
        input: &ReportInput,
        assets: &ResolvedAssets,
    ) -> Result<LaidOutReport, ReportError> {
        input.validate()?;
        let config = self.config.as_ref();
        let generated_on: NaiveDate = input
            .document
            .generated_on
            .unwrap_or_else(|| Utc::now().date_naive());
        let (manifest, mut diagnostics) =
            assemble(kind, input, assets, self.rules.as_ref(), generated_on);
        debug!(sections = ?manifest.section_names(), "manifest assembled");

        let mut pager = Paginator::new(config, manifest.mode);
        if manifest.mode == DocumentMode::Draft {
            pager = pager.with_on_page(decorate::draft_watermark(config));
        }
        let ctx = RenderContext {
            kind,
            logo: assets.logo.as_ref(),
        };
        for section in &manifest.sections {
            sections::render(&mut pager, section, &ctx);
        }
        let (mut registry, layout) = pager.finish();
        diagnostics.merge(layout);
        if registry.is_empty() {
            return Err(ReportError::EmptyDocument);
        }

        decorate::fill_contents(&mut registry, config, &mut diagnostics);
        decorate::apply_footer(&mut registry, config, &manifest.footer_left);
        if manifest.mode == DocumentMode::Superseded {
            decorate::apply_superseded_overlay(&mut registry, config);
        }

        let sanitized: usize = registry.pages.iter().map(Page::sanitized_chars).sum();
        diagnostics.increment("text.sanitized_chars", sanitized as u64);
        diagnostics.merge(assets.diagnostics.clone());

        let footer_total = registry.footer_total();
        Ok(LaidOutReport {
            document: Document {
                page_size: config.page_size,
                pages: registry.pages,
            },
            manifest,
            diagnostics,
            footer_total,
        })
    }

    /// Runs the time-bounded fetch stage, then [`ReportEngine::build`].
    /// Fetch failures only degrade the output.
    pub async fn build_with_source(
        &self,
        kind: ReportKind,
        input: &ReportInput,
        source: &dyn ReportSource,
    ) -> Result<BuildOutput, ReportError> {
        let assets = resolve_assets(source, input, &self.config).await;
        self.build(kind, input, &assets)
    }

    /// Independent builds run concurrently; results keep the job order.
    pub fn build_many_parallel(&self, jobs: &[BuildJob]) -> Vec<Result<BuildOutput, ReportError>> {
        use rayon::prelude::*;

        jobs.par_iter()
            .map(|job| self.build(job.kind, &job.input, &job.assets))
            .collect()
    }
}

impl Default for ReportEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: ReportConfig::default(),
            font_family: None,
            rules: None,
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.config.margins = Margins::all(value);
        self
    }

    /// Resolved at [`ReportEngineBuilder::build`]; unknown families fail
    /// there with [`ReportError::FontUnavailable`].
    pub fn font_family(mut self, name: impl Into<String>) -> Self {
        self.font_family = Some(name.into());
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.config.palette = palette;
        self
    }

    /// Scales the whole type ramp from the body size.
    pub fn body_font_size(mut self, size: f32) -> Self {
        let base = Pt::from_f32(size);
        self.config.body_size = base;
        self.config.small_size = base * 0.8;
        self.config.subheading_size = base * 1.2;
        self.config.heading_size = base * 1.6;
        self.config.title_size = base * 2.4;
        self
    }

    pub fn logo_timeouts(mut self, default_logo: Duration, network: Duration) -> Self {
        self.config.default_logo_timeout = default_logo;
        self.config.network_timeout = network;
        self
    }

    pub fn network_timeout(mut self, timeout: Duration) -> Self {
        self.config.network_timeout = timeout;
        self
    }

    /// Appends every build's diagnostics to a JSONL file.
    pub fn debug_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn rules(mut self, rules: Arc<dyn RuleSet>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(self) -> Result<ReportEngine, ReportError> {
        let mut config = self.config;
        if let Some(name) = &self.font_family {
            config.font_family = FontFamily::parse(name)?;
        }
        config.validate()?;
        let sink = match self.debug_path {
            Some(path) => Some(DiagnosticsSink::open(path)?),
            None => None,
        };
        Ok(ReportEngine {
            config: Arc::new(config),
            rules: self.rules.unwrap_or_else(|| Arc::new(StandardRules)),
            sink,
        })
    }
}
