use crate::canvas::Page;
use crate::config::ReportConfig;
use crate::diagnostics::Diagnostics;
use crate::model::DocumentMode;
use crate::types::Pt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct PageContext {
    pub index: usize,
    pub mode: DocumentMode,
}

/// Runs once on every page as it is created, before any content lands.
pub type OnPageHook = Arc<dyn Fn(&mut Page, &PageContext) + Send + Sync>;

/// Where a table-of-contents visible section starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMark {
    pub title: String,
    pub level: u8,
    pub page_index: usize,
}

/// Pages reserved for the contents list and the cursor where entries begin.
/// Entries continue from the top margin of each following reserved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentsSlot {
    pub page_index: usize,
    pub top: Pt,
    pub pages: usize,
}

/// Every page of one build, in creation order, with the positions recorded
/// while they were filled.
#[derive(Debug, Clone)]
pub struct PageRegistry {
    pub pages: Vec<Page>,
    pub marks: Vec<SectionMark>,
    pub mode: DocumentMode,
    pub contents: Option<ContentsSlot>,
}

impl PageRegistry {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Footer number of a registry index, `None` for skipped lead pages.
    pub fn footer_number(&self, index: usize) -> Option<usize> {
        let offset = self.mode.footer_offset();
        (index >= offset && index < self.pages.len()).then(|| index - offset + 1)
    }

    pub fn footer_total(&self) -> usize {
        self.pages.len().saturating_sub(self.mode.footer_offset())
    }
}

/// Owns the current page and the vertical cursor for one build.
///
/// The cursor starts at the top margin of each page and moves down; all
/// overflow detection goes through [`Paginator::ensure_room`].
pub struct Paginator<'a> {
    config: &'a ReportConfig,
    mode: DocumentMode,
    pages: Vec<Page>,
    cursor: Pt,
    fresh: bool,
    on_page: Option<OnPageHook>,
    marks: Vec<SectionMark>,
    pending_marks: Vec<(String, u8)>,
    contents: Option<ContentsSlot>,
    diagnostics: Diagnostics,
}

impl<'a> Paginator<'a> {
    pub fn new(config: &'a ReportConfig, mode: DocumentMode) -> Self {
        Self {
            config,
            mode,
            pages: Vec::new(),
            cursor: config.top(),
            fresh: true,
            on_page: None,
            marks: Vec::new(),
            pending_marks: Vec::new(),
            contents: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_on_page(mut self, hook: OnPageHook) -> Self {
        self.on_page = Some(hook);
        self
    }

    pub fn config(&self) -> &'a ReportConfig {
        self.config
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    pub fn cursor(&self) -> Pt {
        self.cursor
    }

    pub fn remaining(&self) -> Pt {
        (self.cursor - self.config.bottom()).max(Pt::ZERO)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.pages.len().checked_sub(1)
    }

    /// True when nothing has been placed on the current page yet.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn fits(&self, height: Pt) -> bool {
        !self.pages.is_empty() && self.cursor - height >= self.config.bottom()
    }

    /// Returns the page that has at least `min_height` of room below the
    /// cursor, starting a new page when the current one does not. Content
    /// taller than a whole page is placed on a fresh page regardless.
    pub fn ensure_room(&mut self, min_height: Pt) -> &mut Page {
        if self.pages.is_empty() {
            self.allocate();
        } else if !self.fits(min_height) {
            if self.fresh {
                if let Some(index) = self.current_index() {
                    self.diagnostics.warn_on_page(
                        "layout.oversized_block",
                        index,
                        format!(
                            "block of {:.1}pt exceeds the {:.1}pt content area",
                            min_height.to_f32(),
                            self.remaining().to_f32()
                        ),
                    );
                }
            } else {
                self.diagnostics.increment("pagination.overflow", 1);
                self.allocate();
            }
        }
        self.attach_pending_marks();
        let index = self.pages.len() - 1;
        &mut self.pages[index]
    }

    /// [`Paginator::ensure_room`] plus the cursor the caller draws down from.
    pub fn place(&mut self, min_height: Pt) -> (&mut Page, Pt) {
        self.ensure_room(min_height);
        let cursor = self.cursor;
        let index = self.pages.len() - 1;
        (&mut self.pages[index], cursor)
    }

    /// Moves the cursor down after a draw. Never moves it past the bottom
    /// margin.
    pub fn advance(&mut self, amount: Pt) {
        if amount <= Pt::ZERO {
            return;
        }
        self.fresh = false;
        let bottom = self.config.bottom();
        if self.cursor - amount < bottom {
            self.cursor = bottom;
        } else {
            self.cursor -= amount;
        }
    }

    /// Vertical whitespace. Dropped at the top of a fresh page so sections
    /// start flush with the margin.
    pub fn space(&mut self, amount: Pt) {
        if self.fresh || self.pages.is_empty() {
            return;
        }
        self.advance(amount.min(self.remaining()));
    }

    /// Starts a new page unless the current page is still empty.
    pub fn new_page(&mut self) -> &mut Page {
        if self.pages.is_empty() || !self.fresh {
            self.diagnostics.increment("pagination.break", 1);
            self.allocate();
        }
        self.attach_pending_marks();
        let index = self.pages.len() - 1;
        &mut self.pages[index]
    }

    /// Records a contents entry for the page the next block lands on.
    pub fn mark_section(&mut self, title: impl Into<String>, level: u8) {
        self.pending_marks.push((title.into(), level));
    }

    /// Reserves the rest of the current page, plus as many whole pages as
    /// `entries` needs, for the contents list. The list is filled in once
    /// every section has been placed.
    pub fn reserve_contents(&mut self, entries: usize) {
        let Some(page_index) = self.current_index() else {
            return;
        };
        let line = self.config.contents_leading();
        let first = lines_within(self.remaining(), line);
        let per_page = lines_within(self.config.content_height(), line).max(1);
        let extra = entries.saturating_sub(first).div_ceil(per_page);
        self.contents = Some(ContentsSlot {
            page_index,
            top: self.cursor,
            pages: 1 + extra,
        });
        self.advance(self.remaining());
        for _ in 0..extra {
            self.new_page();
            self.advance(self.remaining());
        }
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn finish(mut self) -> (PageRegistry, Diagnostics) {
        if !self.pending_marks.is_empty() && !self.pages.is_empty() {
            self.attach_pending_marks();
        }
        let registry = PageRegistry {
            pages: self.pages,
            marks: self.marks,
            mode: self.mode,
            contents: self.contents,
        };
        (registry, self.diagnostics)
    }

    fn allocate(&mut self) {
        let index = self.pages.len();
        let mut page = Page::new(index);
        if let Some(hook) = &self.on_page {
            hook(
                &mut page,
                &PageContext {
                    index,
                    mode: self.mode,
                },
            );
        }
        self.pages.push(page);
        self.cursor = self.config.top();
        self.fresh = true;
        self.diagnostics.increment("pages.created", 1);
    }

    fn attach_pending_marks(&mut self) {
        let Some(index) = self.current_index() else {
            return;
        };
        for (title, level) in self.pending_marks.drain(..) {
            self.marks.push(SectionMark {
                title,
                level,
                page_index: index,
            });
        }
    }
}

fn lines_within(room: Pt, line: Pt) -> usize {
    usize::try_from(room.to_milli() / line.to_milli().max(1)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> ReportConfig {
        ReportConfig::default()
    }

    #[test]
    fn first_call_allocates_the_first_page() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        assert_eq!(pager.page_count(), 0);
        pager.ensure_room(Pt::from_i32(14));
        assert_eq!(pager.page_count(), 1);
        assert_eq!(pager.cursor(), config.top());
    }

    #[test]
    fn overflow_starts_a_new_page_and_resets_the_cursor() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        pager.ensure_room(Pt::from_i32(700));
        pager.advance(Pt::from_i32(700));
        let page = pager.ensure_room(Pt::from_i32(100));
        assert_eq!(page.index(), 1);
        assert_eq!(pager.cursor(), config.top());
        assert_eq!(pager.diagnostics_mut().counter("pagination.overflow"), 1);
    }

    #[test]
    fn new_page_on_a_fresh_page_does_not_leave_a_blank() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        pager.new_page();
        pager.new_page();
        assert_eq!(pager.page_count(), 1);
        pager.advance(Pt::from_i32(10));
        pager.new_page();
        assert_eq!(pager.page_count(), 2);
    }

    #[test]
    fn oversized_block_stays_on_a_fresh_page() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        pager.ensure_room(Pt::from_i32(2000));
        pager.ensure_room(Pt::from_i32(2000));
        assert_eq!(pager.page_count(), 1);
        pager.advance(Pt::from_i32(2000));
        assert_eq!(pager.cursor(), config.bottom());
        let (_, diagnostics) = pager.finish();
        assert!(diagnostics.has_code("layout.oversized_block"));
    }

    #[test]
    fn on_page_hook_runs_at_creation() {
        let config = config();
        let hook: OnPageHook = Arc::new(|page: &mut Page, ctx: &PageContext| {
            page.meta("created", ctx.index.to_string());
        });
        let mut pager = Paginator::new(&config, DocumentMode::Draft).with_on_page(hook);
        pager.ensure_room(Pt::from_i32(10));
        pager.advance(Pt::from_i32(10));
        pager.new_page();
        let (registry, _) = pager.finish();
        assert!(registry.pages[0].has_meta("created", "0"));
        assert!(registry.pages[1].has_meta("created", "1"));
    }

    #[test]
    fn section_marks_land_on_the_page_of_the_next_block() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Draft);
        pager.ensure_room(Pt::from_i32(700));
        pager.advance(Pt::from_i32(700));
        pager.mark_section("Action Register", 0);
        pager.ensure_room(Pt::from_i32(60));
        let (registry, _) = pager.finish();
        assert_eq!(registry.marks[0].page_index, 1);
    }

    #[test]
    fn footer_numbers_skip_lead_pages() {
        let config = config();
        let mut pager = Paginator::new(&config, DocumentMode::Issued);
        for _ in 0..5 {
            pager.ensure_room(Pt::from_i32(10));
            pager.advance(Pt::from_i32(10));
            pager.new_page();
        }
        let (registry, _) = pager.finish();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.footer_total(), 4);
        assert_eq!(registry.footer_number(1), None);
        assert_eq!(registry.footer_number(2), Some(1));
        assert_eq!(registry.footer_number(5), Some(4));
    }

    proptest! {
        #[test]
        fn prop_cursor_never_crosses_the_bottom_margin(
            heights in proptest::collection::vec(1i32..300, 1..120),
        ) {
            let config = config();
            let mut pager = Paginator::new(&config, DocumentMode::Draft);
            for h in heights {
                let height = Pt::from_i32(h);
                let before_pages = pager.page_count();
                let would_overflow = before_pages > 0 && pager.cursor() - height < config.bottom();
                pager.ensure_room(height);
                let created = pager.page_count() != before_pages;
                prop_assert_eq!(created, before_pages == 0 || would_overflow);
                prop_assert!(pager.cursor() - height >= config.bottom());
                pager.advance(height);
                prop_assert!(pager.cursor() >= config.bottom());
                prop_assert!(pager.cursor() <= config.top());
            }
        }
    }
}
