use crate::block::{self, Column};
use crate::manifest::AttachmentEntry;
use crate::pagination::Paginator;

fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KIB {
        format!("{bytes} B")
    } else if value < KIB * KIB {
        format!("{:.1} KB", value / KIB)
    } else {
        format!("{:.1} MB", value / (KIB * KIB))
    }
}

fn related(entry: &AttachmentEntry) -> String {
    entry
        .modules
        .iter()
        .chain(entry.actions.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

fn row(entry: &AttachmentEntry) -> Vec<String> {
    let kind = match entry.mime_type.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(mime) => format!("{mime}, {}", human_size(entry.size_bytes)),
        None => human_size(entry.size_bytes),
    };
    vec![
        entry.reference.clone(),
        entry.filename.clone(),
        kind,
        entry.caption.clone().unwrap_or_default(),
        related(entry),
    ]
}

/// Only scheduled when at least one attachment exists.
pub(super) fn render(pager: &mut Paginator<'_>, entries: &[AttachmentEntry]) {
    let config = pager.config();
    pager.new_page();
    block::section_heading(pager, "Attachments", 0);
    block::paragraph(
        pager,
        "Supporting evidence referenced in this report. References are stable for this version of the document.",
        config.small(),
    );
    let rows: Vec<Vec<String>> = entries.iter().map(row).collect();
    block::table(
        pager,
        &[
            Column::new("Ref", 0.8),
            Column::new("File", 2.2),
            Column::new("Type", 1.6),
            Column::new("Caption", 2.6),
            Column::new("Related to", 2.0),
        ],
        &rows,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AttachmentEntry {
        AttachmentEntry {
            reference: "E-001".to_string(),
            filename: "stair-core.jpg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
            size_bytes: 2_621_440,
            caption: None,
            modules: vec!["Means of Escape".to_string()],
            actions: vec!["A-003".to_string()],
        }
    }

    #[test]
    fn sizes_are_humanised() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(2_621_440), "2.5 MB");
    }

    #[test]
    fn long_captions_and_filenames_stay_on_the_page() {
        use crate::canvas::Command;
        use crate::config::ReportConfig;
        use crate::model::DocumentMode;

        let config = ReportConfig::default();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        let mut first = entry();
        first.filename = "2026-03-01_rear_stair_core_level2_photo.jpg".to_string();
        first.caption = Some(
            (0..900)
                .map(|i| format!("note{i}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
        render(&mut pager, &[first]);
        let (registry, _) = pager.finish();
        assert!(registry.len() >= 2);

        let small = config.small();
        for page in &registry.pages {
            let drawn: Vec<(crate::types::Pt, crate::types::Pt, &str)> = page
                .commands
                .iter()
                .filter_map(|cmd| match cmd {
                    Command::DrawString { x, y, text } => Some((*x, *y, text.as_str())),
                    _ => None,
                })
                .collect();
            let column_x = |title: &str| {
                drawn
                    .iter()
                    .find(|(_, _, text)| *text == title)
                    .map(|(x, _, _)| *x)
            };
            let (Some(file_x), Some(type_x)) = (column_x("File"), column_x("Type")) else {
                panic!("page {} has no table header", page.index());
            };
            for (x, y, text) in &drawn {
                assert!(*y >= config.bottom());
                if *x >= file_x && *x < type_x && *text != "File" {
                    assert!(*x + small.width_of(text) < type_x, "{text} runs into the Type column");
                }
            }
        }
    }

    #[test]
    fn row_joins_cross_references() {
        let cells = row(&entry());
        assert_eq!(cells[0], "E-001");
        assert_eq!(cells[2], "image/jpeg, 2.5 MB");
        assert_eq!(cells[3], "");
        assert_eq!(cells[4], "Means of Escape, A-003");
    }
}
