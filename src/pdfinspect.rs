use lopdf::Document as LoDocument;
use lopdf::Object as LoObject;
use lopdf::content::Content;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEncryptedUnsupported,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEncryptedUnsupported => "PDF_ENCRYPTED_UNSUPPORTED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

/// What one page's content stream draws, as far as report checks care.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInspection {
    /// `Tj` operands in stream order, decoded as Latin-1.
    pub texts: Vec<String>,
    /// `cm` operators carrying a rotation or skew.
    pub rotations: usize,
    /// `gs` operators (opacity changes).
    pub opacity_changes: usize,
    /// `Do` operators (image placements).
    pub images: usize,
}

impl PageInspection {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub file_size_bytes: usize,
    pub pages: Vec<PageInspection>,
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let mut pages = Vec::new();
    for (_number, page_id) in pdf.get_pages() {
        let raw = pdf.get_page_content(page_id).map_err(|err| PdfInspectError {
            code: PdfInspectErrorCode::PdfParseFailed,
            message: err.to_string(),
        })?;
        let content = Content::decode(&raw).map_err(|err| PdfInspectError {
            code: PdfInspectErrorCode::PdfParseFailed,
            message: err.to_string(),
        })?;
        pages.push(inspect_content(&content));
    }

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        encrypted: pdf.is_encrypted(),
        file_size_bytes: bytes.len(),
        pages,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

fn inspect_content(content: &Content) -> PageInspection {
    let mut page = PageInspection::default();
    for op in &content.operations {
        match op.operator.as_str() {
            "Tj" => {
                if let Some(LoObject::String(bytes, _)) = op.operands.first() {
                    page.texts.push(bytes.iter().map(|&b| b as char).collect());
                }
            }
            "cm" => {
                let skew = |i: usize| {
                    op.operands
                        .get(i)
                        .and_then(|o| o.as_float().ok())
                        .is_some_and(|v| v.abs() > f32::EPSILON)
                };
                if skew(1) || skew(2) {
                    page.rotations += 1;
                }
            }
            "gs" => page.opacity_changes += 1,
            "Do" => page.images += 1,
            _ => {}
        }
    }
    page
}

/// Rejects output a report archive must not accept.
pub fn require_readable_report(report: &PdfInspectReport) -> Result<(), PdfInspectError> {
    if report.encrypted {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEncryptedUnsupported,
            message: "encrypted pdf output is not supported".to_string(),
        });
    }
    if report.page_count == 0 {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEmptyOrNoPages,
            message: "pdf has no pages".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream as LoStream, dictionary};

    fn make_single_page_pdf_bytes(content: &str) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content_id = doc.add_object(LoStream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, LoObject::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    #[test]
    fn collects_text_and_rotations() {
        let bytes = make_single_page_pdf_bytes(
            "q 0.707 0.707 -0.707 0.707 0 0 cm BT /F1 18 Tf 0 0 Td (DRAFT) Tj ET Q \
             1 0 0 1 10 10 cm BT /F1 10 Tf 72 720 Td (r\\351sum\\351) Tj ET",
        );
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        assert!(!report.encrypted);
        assert_eq!(report.file_size_bytes, bytes.len());
        let page = &report.pages[0];
        assert_eq!(page.texts, vec!["DRAFT".to_string(), "r\u{e9}sum\u{e9}".to_string()]);
        assert_eq!(page.rotations, 1);
        assert!(page.contains_text("sum"));
        assert!(require_readable_report(&report).is_ok());
    }

    #[test]
    fn malformed_data_fails_to_parse() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = std::env::temp_dir().join(format!(
            "firebreak_pdfinspect_missing_{}.pdf",
            std::process::id()
        ));
        let err = inspect_pdf_path(&missing).expect_err("missing");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
    }

    #[test]
    fn encrypted_or_empty_reports_are_rejected() {
        let mut report = PdfInspectReport {
            pdf_version: "1.7".to_string(),
            page_count: 1,
            encrypted: true,
            file_size_bytes: 0,
            pages: vec![PageInspection::default()],
        };
        let err = require_readable_report(&report).expect_err("encrypted");
        assert_eq!(err.code, PdfInspectErrorCode::PdfEncryptedUnsupported);
        report.encrypted = false;
        report.page_count = 0;
        let err = require_readable_report(&report).expect_err("empty");
        assert_eq!(err.code, PdfInspectErrorCode::PdfEmptyOrNoPages);
    }
}
