use crate::assets::ImageAsset;
use crate::canvas::{Command, Document, Page};
use crate::error::ReportError;
use crate::font::FontFace;
use crate::metrics::{BuildMetrics, PageMetrics};
use crate::types::{Color, Pt};
use chrono::{DateTime, Utc};
use fixed::types::I32F32;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMeta {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created: DateTime<Utc>,
}

pub fn document_to_pdf(
    document: &Document,
    images: &[&ImageAsset],
    meta: &PdfMeta,
) -> Result<Vec<u8>, ReportError> {
    document_to_pdf_with_metrics(document, images, meta, None)
}

/// Serializes every page against one shared resource dictionary. Output is a
/// pure function of the inputs: no clocks or random ids are read here.
pub fn document_to_pdf_with_metrics(
    document: &Document,
    images: &[&ImageAsset],
    meta: &PdfMeta,
    metrics: Option<&mut BuildMetrics>,
) -> Result<Vec<u8>, ReportError> {
    if document.pages.is_empty() {
        return Err(ReportError::EmptyDocument);
    }

    // Objects 1..=3 are filled in once every other id is known.
    let mut objects: Vec<String> = vec![String::new(); 3];

    let mut font_map: BTreeMap<FontFace, String> = BTreeMap::new();
    let mut font_entries = Vec::new();
    for (index, face) in collect_fonts(document).into_iter().enumerate() {
        let resource = format!("F{}", index + 1);
        let id = push_object(&mut objects, font_object(face.base_font()));
        font_entries.push((resource.clone(), id));
        font_map.insert(face, resource);
    }

    let mut gs_map: HashMap<(u16, u16), String> = HashMap::new();
    let mut gs_entries = Vec::new();
    for (index, (fill, stroke)) in collect_opacities(document).into_iter().enumerate() {
        let resource = format!("GS{}", index + 1);
        let id = push_object(
            &mut objects,
            format!(
                "<< /Type /ExtGState /ca {} /CA {} >>",
                fmt(fill as f32 / 1000.0),
                fmt(stroke as f32 / 1000.0)
            ),
        );
        gs_entries.push((resource.clone(), id));
        gs_map.insert((fill, stroke), resource);
    }

    let mut image_map: HashMap<&str, String> = HashMap::new();
    let mut image_entries = Vec::new();
    for (index, image) in images.iter().enumerate() {
        if image_map.contains_key(image.name.as_str()) {
            continue;
        }
        let smask_id = image.alpha.as_ref().map(|alpha| {
            push_object(
                &mut objects,
                image_smask_object(alpha.width, alpha.height, &alpha.data),
            )
        });
        let id = push_object(&mut objects, image_object(image, smask_id));
        let resource = format!("Im{}", index + 1);
        image_entries.push((resource.clone(), id));
        image_map.insert(image.name.as_str(), resource);
    }

    let size = document.page_size;
    let mut page_ids = Vec::with_capacity(document.pages.len());
    let mut content_sizes = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = render_page(page, &font_map, &gs_map, &image_map);
        content_sizes.push(content.len());
        let content_id = push_object(&mut objects, stream_object(&content));
        let page_id = push_object(
            &mut objects,
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
                PDF_PAGES_ID,
                fmt_pt(size.width),
                fmt_pt(size.height),
                PDF_RESOURCES_ID,
                content_id
            ),
        );
        page_ids.push(page_id);
    }
    let info_id = push_object(&mut objects, info_object(meta));

    objects[PDF_CATALOG_ID - 1] = format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID);
    objects[PDF_PAGES_ID - 1] = format!(
        "<< /Type /Pages /Count {} /Kids [{}] >>",
        page_ids.len(),
        page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ")
    );
    objects[PDF_RESOURCES_ID - 1] = format!(
        "<< /ProcSet [/PDF /Text /ImageB /ImageC] /Font {} /ExtGState {} /XObject {} >>",
        resource_dict(&font_entries),
        resource_dict(&gs_entries),
        resource_dict(&image_entries)
    );

    let bytes = build_pdf(&objects, PDF_CATALOG_ID, info_id);
    if let Some(metrics) = metrics {
        metrics.total_bytes = bytes.len();
        metrics.pages = document
            .pages
            .iter()
            .zip(content_sizes)
            .enumerate()
            .map(|(index, (page, content_bytes))| PageMetrics {
                page_number: index + 1,
                command_count: page.commands.len(),
                content_bytes,
            })
            .collect();
    }
    Ok(bytes)
}

/// Appends an object body and returns its object number.
fn push_object(objects: &mut Vec<String>, body: String) -> usize {
    objects.push(body);
    objects.len()
}

fn collect_fonts(document: &Document) -> BTreeSet<FontFace> {
    document
        .pages
        .iter()
        .flat_map(|page| page.commands.iter())
        .filter_map(|cmd| match cmd {
            Command::SetFont { face, .. } => Some(*face),
            _ => None,
        })
        .collect()
}

fn opacity_key(fill: f32, stroke: f32) -> (u16, u16) {
    let quantize = |v: f32| ((v * 1000.0).round() as i32).clamp(0, 1000) as u16;
    (quantize(fill), quantize(stroke))
}

fn collect_opacities(document: &Document) -> BTreeSet<(u16, u16)> {
    document
        .pages
        .iter()
        .flat_map(|page| page.commands.iter())
        .filter_map(|cmd| match cmd {
            Command::SetOpacity { fill, stroke } => Some(opacity_key(*fill, *stroke)),
            _ => None,
        })
        .collect()
}

fn render_page(
    page: &Page,
    font_map: &BTreeMap<FontFace, String>,
    gs_map: &HashMap<(u16, u16), String>,
    image_map: &HashMap<&str, String>,
) -> String {
    let mut out = String::new();
    // Font selection lives in the graphics state, so it is saved and
    // restored alongside q/Q.
    let mut font: Option<(&str, Pt)> = None;
    let mut saved: Vec<Option<(&str, Pt)>> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                saved.push(font);
                out.push_str("q\n");
            }
            Command::RestoreState => {
                font = saved.pop().unwrap_or(font);
                out.push_str("Q\n");
            }
            Command::Translate(x, y) => {
                out.push_str(&format!("1 0 0 1 {} {} cm\n", fmt_pt(*x), fmt_pt(*y)));
            }
            Command::Rotate(angle) => {
                let sin = libm::sinf(*angle);
                let cos = libm::cosf(*angle);
                out.push_str(&format!(
                    "{} {} {} {} 0 0 cm\n",
                    fmt(cos),
                    fmt(sin),
                    fmt(-sin),
                    fmt(cos)
                ));
            }
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::SetStrokeColor(color) => out.push_str(&color_to_pdf_stroke(*color)),
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetOpacity { fill, stroke } => {
                if let Some(name) = gs_map.get(&opacity_key(*fill, *stroke)) {
                    out.push_str(&format!("/{} gs\n", name));
                }
            }
            Command::SetFont { face, size } => {
                font = font_map.get(face).map(|name| (name.as_str(), *size));
            }
            Command::DrawString { x, y, text } => {
                let Some((resource, size)) = font else {
                    continue;
                };
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(size)));
                out.push_str(&format!("{} {} Td\n", fmt_pt(*x), fmt_pt(*y)));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::FillRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(*y),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nS\n",
                    fmt_pt(*x),
                    fmt_pt(*y),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::Line { x1, y1, x2, y2 } => {
                out.push_str(&format!(
                    "{} {} m\n{} {} l\nS\n",
                    fmt_pt(*x1),
                    fmt_pt(*y1),
                    fmt_pt(*x2),
                    fmt_pt(*y2)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if let Some(name) = image_map.get(resource_id.as_str()) {
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(*y)
                    ));
                    out.push_str(&format!("/{} Do\n", name));
                    out.push_str("Q\n");
                }
            }
        }
    }
    out
}

fn image_object(image: &ImageAsset, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode {}]{} >>
stream
{}
endstream",
        image.width,
        image.height,
        image.color_space,
        stream_data.len(),
        image.filter.as_pdf_name(),
        smask,
        stream_data
    )
}

fn image_smask_object(width: u32, height: u32, data: &[u8]) -> String {
    let stream_data = encode_stream_data(data);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode /FlateDecode] >>
stream
{}
endstream",
        width,
        height,
        stream_data.len(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 32);
    for (index, byte) in data.iter().enumerate() {
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn font_object(base_font: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
}

fn resource_dict(entries: &[(String, usize)]) -> String {
    let entries: Vec<String> = entries
        .iter()
        .map(|(resource, id)| format!("/{} {} 0 R", resource, id))
        .collect();
    format!("<< {} >>", entries.join(" "))
}

fn stream_object(content: &str) -> String {
    format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content)
}

fn info_object(meta: &PdfMeta) -> String {
    let mut entries = vec![format!("/Title ({})", encode_winansi_pdf_string(&meta.title))];
    if let Some(author) = meta.author.as_deref().filter(|a| !a.trim().is_empty()) {
        entries.push(format!("/Author ({})", encode_winansi_pdf_string(author)));
    }
    if let Some(subject) = meta.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        entries.push(format!("/Subject ({})", encode_winansi_pdf_string(subject)));
    }
    entries.push("/Producer (firebreak)".to_string());
    entries.push(format!(
        "/CreationDate ({})",
        meta.created.format("D:%Y%m%d%H%M%SZ")
    ));
    format!("<< {} >>", entries.join(" "))
}

fn build_pdf(objects: &[String], catalog_id: usize, info_id: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
    }

    // Identical inputs give identical bytes, so the id is a content hash.
    let digest = Sha256::digest(&out);
    let file_id: String = digest.iter().take(16).map(|b| format!("{:02X}", b)).collect();

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /ID [<{}> <{}>] >>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            catalog_id,
            info_id,
            file_id,
            file_id,
            xref_start
        )
        .as_bytes(),
    );
    out
}

/// Encodes text already restricted to Latin-1 as a WinAnsi literal string
/// body. Anything outside the code page becomes `?`.
fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let byte = match ch {
            '\u{0020}'..='\u{007E}' | '\u{00A0}'..='\u{00FF}' => ch as u32 as u8,
            '\n' => b'\n',
            '\r' => b'\r',
            _ => b'?',
        };
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        return format!("{}{}", sign, int_part);
    }
    let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
    while s.ends_with('0') {
        s.pop();
    }
    s
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli())
}

fn color_to_pdf_fill(color: Color) -> String {
    format!("{} {} {} rg\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!("{} {} {} RG\n", fmt(color.r), fmt(color.g), fmt(color.b))
}
