#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub page_number: usize,
    pub command_count: usize,
    pub content_bytes: usize,
}

/// Timing and size figures for one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildMetrics {
    pub pages: Vec<PageMetrics>,
    pub layout_ms: f64,
    pub serialize_ms: f64,
    pub total_bytes: usize,
}

impl BuildMetrics {
    pub fn command_count(&self) -> usize {
        self.pages.iter().map(|p| p.command_count).sum()
    }
}
