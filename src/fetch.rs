//! Time-bounded fetch stage run before layout. Nothing here fails a build:
//! every error becomes a fallback plus a diagnostic.

use crate::assets::{ImageAsset, LOGO_RESOURCE, LogoResolution, ResolvedAssets, default_logo_png};
use crate::config::ReportConfig;
use crate::diagnostics::Diagnostics;
use crate::error::FetchError;
use crate::model::{Attachment, ReportInput, RevisionEntry};
use async_trait::async_trait;
use base64::Engine;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_logo(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    /// Bundled fallback logo.
    async fn fetch_default_logo(&self) -> Result<Vec<u8>, FetchError> {
        default_logo_png()
    }

    async fn fetch_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, FetchError>;

    async fn fetch_revision_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<RevisionEntry>, FetchError>;
}

async fn timed<T, F>(what: &str, limit: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            what: what.to_string(),
            millis: limit.as_millis() as u64,
        }),
    }
}

fn record_fallback(diagnostics: &mut Diagnostics, code: &str, what: &str, err: &FetchError) {
    warn!(what, error = %err, "fetch failed, using fallback");
    diagnostics.warn(code, format!("{what}: {err}"));
    diagnostics.increment("fetch.fallback", 1);
}

/// Runs every fetch the build needs, sequentially, each under its own
/// timeout.
pub async fn resolve_assets(
    source: &dyn ReportSource,
    input: &ReportInput,
    config: &ReportConfig,
) -> ResolvedAssets {
    let mut diagnostics = Diagnostics::new();
    let (logo, logo_resolution) = resolve_logo(source, input, config, &mut diagnostics).await;
    let document_id = input.document.id.as_str();

    let attachments = match timed(
        "attachments",
        config.network_timeout,
        source.fetch_attachments(document_id),
    )
    .await
    {
        Ok(list) => Some(list),
        Err(err) => {
            record_fallback(&mut diagnostics, "fetch.attachments_fallback", "attachments", &err);
            None
        }
    };

    let revisions = if input.mode().has_lead_pages() {
        match timed(
            "revision history",
            config.network_timeout,
            source.fetch_revision_history(document_id),
        )
        .await
        {
            Ok(list) => Some(list),
            Err(err) => {
                record_fallback(
                    &mut diagnostics,
                    "fetch.history_fallback",
                    "revision history",
                    &err,
                );
                Some(Vec::new())
            }
        }
    } else {
        None
    };

    debug!(
        document = document_id,
        logo = ?logo_resolution,
        fallbacks = diagnostics.counter("fetch.fallback"),
        "assets resolved"
    );
    ResolvedAssets {
        logo,
        logo_resolution,
        attachments,
        revisions,
        diagnostics,
    }
}

/// Logos stored inline as `data:image/...;base64,` never touch the source.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, FetchError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| FetchError::Undecodable("data uri has no payload".to_string()))?;
    if !header.contains(";base64") {
        return Err(FetchError::Undecodable(
            "only base64 data uris are supported".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim().as_bytes())
        .map_err(|err| FetchError::Undecodable(err.to_string()))
}

async fn resolve_logo(
    source: &dyn ReportSource,
    input: &ReportInput,
    config: &ReportConfig,
    diagnostics: &mut Diagnostics,
) -> (Option<ImageAsset>, LogoResolution) {
    let path = input
        .organisation
        .as_ref()
        .and_then(|o| o.logo_path.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty());
    if let Some(path) = path {
        let bytes = if path.starts_with("data:") {
            decode_data_uri(path)
        } else {
            timed("organisation logo", config.network_timeout, source.fetch_logo(path)).await
        };
        let fetched = bytes.and_then(|bytes| ImageAsset::decode(LOGO_RESOURCE, &bytes));
        match fetched {
            Ok(asset) => return (Some(asset), LogoResolution::Organisation),
            Err(err) => {
                record_fallback(diagnostics, "fetch.logo_fallback", "organisation logo", &err)
            }
        }
    }

    let fetched = timed(
        "default logo",
        config.default_logo_timeout,
        source.fetch_default_logo(),
    )
    .await
    .and_then(|bytes| ImageAsset::decode(LOGO_RESOURCE, &bytes));
    match fetched {
        Ok(asset) => (Some(asset), LogoResolution::BuiltInDefault),
        Err(err) => {
            record_fallback(diagnostics, "fetch.logo_fallback", "default logo", &err);
            (None, LogoResolution::TextOnly)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentMode, LifecycleStatus};

    struct StubSource {
        logo: Result<Vec<u8>, FetchError>,
        default_logo: Option<Result<Vec<u8>, FetchError>>,
        delay: Duration,
        attachments: Result<Vec<Attachment>, FetchError>,
    }

    impl StubSource {
        fn healthy() -> Self {
            Self {
                logo: default_logo_png(),
                default_logo: None,
                delay: Duration::ZERO,
                attachments: Ok(vec![Attachment {
                    id: "att-1".to_string(),
                    filename: "plan.pdf".to_string(),
                    mime_type: Some("application/pdf".to_string()),
                    size_bytes: 2048,
                    caption: None,
                    module_instance_ids: Vec::new(),
                    action_ids: Vec::new(),
                }]),
            }
        }
    }

    #[async_trait]
    impl ReportSource for StubSource {
        async fn fetch_logo(&self, _path: &str) -> Result<Vec<u8>, FetchError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.logo.clone()
        }

        async fn fetch_default_logo(&self) -> Result<Vec<u8>, FetchError> {
            match &self.default_logo {
                Some(result) => result.clone(),
                None => default_logo_png(),
            }
        }

        async fn fetch_attachments(&self, _id: &str) -> Result<Vec<Attachment>, FetchError> {
            self.attachments.clone()
        }

        async fn fetch_revision_history(
            &self,
            _id: &str,
        ) -> Result<Vec<RevisionEntry>, FetchError> {
            Err(FetchError::Unavailable("history service down".to_string()))
        }
    }

    fn input(status: LifecycleStatus) -> ReportInput {
        let mut input = ReportInput::from_json(
            r#"{"document": {"id": "doc-9", "title": "Warehouse"},
                "organisation": {"name": "Acme Fire", "logo_path": "logos/acme.png"}}"#,
        )
        .expect("input");
        input.document.status = status;
        input
    }

    #[tokio::test]
    async fn organisation_logo_is_used_when_available() {
        let config = ReportConfig::default();
        let assets =
            resolve_assets(&StubSource::healthy(), &input(LifecycleStatus::Draft), &config).await;
        assert_eq!(assets.logo_resolution, LogoResolution::Organisation);
        assert_eq!(assets.attachments.as_ref().map(Vec::len), Some(1));
        assert!(assets.revisions.is_none());
        assert_eq!(assets.diagnostics.counter("fetch.fallback"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_logo_times_out_and_falls_back_to_default() {
        let config = ReportConfig::default();
        let source = StubSource {
            delay: Duration::from_secs(30),
            ..StubSource::healthy()
        };
        let assets = resolve_assets(&source, &input(LifecycleStatus::Draft), &config).await;
        assert_eq!(assets.logo_resolution, LogoResolution::BuiltInDefault);
        assert!(assets.diagnostics.has_code("fetch.logo_fallback"));
        let message = &assets.diagnostics.events()[0].message;
        assert!(message.contains("timed out after 5000ms"), "{message}");
    }

    #[tokio::test]
    async fn inline_data_uri_logo_skips_the_source() {
        let config = ReportConfig::default();
        let png = default_logo_png().expect("png");
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let mut input = input(LifecycleStatus::Issued);
        if let Some(org) = input.organisation.as_mut() {
            org.logo_path = Some(uri);
        }
        let source = StubSource {
            logo: Err(FetchError::Unavailable("must not be called".to_string())),
            ..StubSource::healthy()
        };
        let assets = resolve_assets(&source, &input, &config).await;
        assert_eq!(assets.logo_resolution, LogoResolution::Organisation);
        assert!(!assets.diagnostics.has_code("fetch.logo_fallback"));
    }

    #[test]
    fn plain_data_uris_are_rejected() {
        assert!(decode_data_uri("data:image/png,abc").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").ok(), Some(b"hi".to_vec()));
    }

    #[tokio::test]
    async fn every_tier_failing_leaves_text_only() {
        let config = ReportConfig::default();
        let source = StubSource {
            logo: Err(FetchError::NotFound("logos/acme.png".to_string())),
            default_logo: Some(Ok(b"corrupt".to_vec())),
            attachments: Err(FetchError::Unavailable("timeout".to_string())),
            ..StubSource::healthy()
        };
        let assets = resolve_assets(&source, &input(LifecycleStatus::Issued), &config).await;
        assert_eq!(assets.logo_resolution, LogoResolution::TextOnly);
        assert!(assets.logo.is_none());
        assert!(assets.attachments.is_none());
        assert_eq!(assets.revisions, Some(Vec::new()));
        assert_eq!(assets.diagnostics.counter("fetch.fallback"), 4);
        assert_eq!(input(LifecycleStatus::Issued).mode(), DocumentMode::Issued);
    }
}
