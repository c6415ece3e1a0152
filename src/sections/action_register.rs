use super::{CHIP_COLUMN, chip_entry, format_date};
use crate::block;
use crate::manifest::RegisterEntry;
use crate::pagination::Paginator;
use crate::types::Pt;

fn meta_line(entry: &RegisterEntry) -> String {
    let mut parts = Vec::new();
    if let Some(owner) = entry.owner.as_deref().filter(|o| !o.trim().is_empty()) {
        parts.push(format!("Owner: {owner}"));
    }
    if let Some(date) = entry.target_date {
        parts.push(format!("Target: {}", format_date(date)));
    }
    if let Some(rating) = &entry.latest_rating {
        parts.push(format!(
            "Rating: L{} x I{} = {}",
            rating.likelihood,
            rating.impact,
            rating.score()
        ));
    }
    if let Some(module) = &entry.module_title {
        parts.push(format!("Module: {module}"));
    }
    if entry.priority_derived {
        parts.push("Priority derived from rating".to_string());
    }
    parts.join("  |  ")
}

/// Entries arrive already in register order.
pub(super) fn render(pager: &mut Paginator<'_>, entries: &[RegisterEntry]) {
    let config = pager.config();
    pager.new_page();
    block::section_heading(pager, "Action Register", 0);
    if entries.is_empty() {
        block::paragraph(pager, "No actions have been recorded.", config.body());
        return;
    }
    let open = entries.iter().filter(|e| e.status.is_open()).count();
    block::paragraph(
        pager,
        &format!(
            "{} open, {} complete or closed. Open actions are listed first, most urgent first.",
            open,
            entries.len() - open
        ),
        config.small(),
    );

    let indent = Pt::from_i32(CHIP_COLUMN);
    let small = config.small();
    for entry in entries {
        chip_entry(
            pager,
            entry.priority.label(),
            config.palette.priority(entry.priority),
            &format!("{}   {}", entry.reference, entry.status.label()),
            &entry.text,
        );
        let meta = meta_line(entry);
        if !meta.is_empty() {
            let wrapped = block::wrap_lines(&meta, config.content_width() - indent, small);
            block::lines(pager, config.left() + indent, &wrapped, small);
        }
    }
}
