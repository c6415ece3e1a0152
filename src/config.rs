use crate::canvas::TextStyle;
use crate::error::ReportError;
use crate::font::{FontFace, FontFamily};
use crate::model::PriorityBand;
use crate::types::{Color, Margins, Pt, Size};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub brand: Color,
    pub text: Color,
    pub muted: Color,
    pub rule: Color,
    pub callout_fill: Color,
    pub callout_border: Color,
    pub p1: Color,
    pub p2: Color,
    pub p3: Color,
    pub p4: Color,
    pub good: Color,
    pub watermark: Color,
    pub superseded: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            brand: Color::rgb(0.11, 0.2, 0.36),
            text: Color::rgb(0.13, 0.13, 0.13),
            muted: Color::rgb(0.42, 0.42, 0.45),
            rule: Color::rgb(0.8, 0.8, 0.82),
            callout_fill: Color::rgb(1.0, 0.97, 0.9),
            callout_border: Color::rgb(0.85, 0.6, 0.1),
            p1: Color::rgb(0.75, 0.11, 0.11),
            p2: Color::rgb(0.9, 0.42, 0.05),
            p3: Color::rgb(0.8, 0.65, 0.0),
            p4: Color::rgb(0.2, 0.45, 0.7),
            good: Color::rgb(0.16, 0.5, 0.24),
            watermark: Color::rgb(0.55, 0.55, 0.55),
            superseded: Color::rgb(0.8, 0.05, 0.05),
        }
    }
}

impl Palette {
    pub fn priority(&self, band: PriorityBand) -> Color {
        match band {
            PriorityBand::P1 => self.p1,
            PriorityBand::P2 => self.p2,
            PriorityBand::P3 => self.p3,
            PriorityBand::P4 => self.p4,
        }
    }
}

/// Immutable layout configuration for one engine. Every build reads it and
/// none mutate it, so builds with different geometries can run side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub page_size: Size,
    pub margins: Margins,
    pub font_family: FontFamily,
    pub body_size: Pt,
    pub small_size: Pt,
    pub title_size: Pt,
    pub heading_size: Pt,
    pub subheading_size: Pt,
    pub line_height: f32,
    pub palette: Palette,
    pub draft_opacity: f32,
    pub superseded_opacity: f32,
    pub default_logo_timeout: Duration,
    pub network_timeout: Duration,
    pub label_column: Pt,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all(50.0),
            font_family: FontFamily::Helvetica,
            body_size: Pt::from_i32(10),
            small_size: Pt::from_i32(8),
            title_size: Pt::from_i32(24),
            heading_size: Pt::from_i32(16),
            subheading_size: Pt::from_i32(12),
            line_height: 1.4,
            palette: Palette::default(),
            draft_opacity: 0.12,
            superseded_opacity: 0.22,
            default_logo_timeout: Duration::from_secs(2),
            network_timeout: Duration::from_secs(5),
            label_column: Pt::from_i32(150),
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ReportError> {
        let width = self.page_size.width - self.margins.left - self.margins.right;
        let height = self.page_size.height - self.margins.top - self.margins.bottom;
        if width <= Pt::ZERO || height <= Pt::ZERO {
            return Err(ReportError::InvalidConfiguration(
                "margins leave no content area".to_string(),
            ));
        }
        for (name, size) in [
            ("body_size", self.body_size),
            ("small_size", self.small_size),
            ("title_size", self.title_size),
            ("heading_size", self.heading_size),
            ("subheading_size", self.subheading_size),
        ] {
            if size <= Pt::ZERO {
                return Err(ReportError::InvalidConfiguration(format!(
                    "{name} must be positive"
                )));
            }
        }
        if !self.line_height.is_finite() || self.line_height < 1.0 {
            return Err(ReportError::InvalidConfiguration(
                "line_height must be >= 1.0".to_string(),
            ));
        }
        if self.default_logo_timeout.is_zero() || self.network_timeout.is_zero() {
            return Err(ReportError::InvalidConfiguration(
                "fetch timeouts must be non-zero".to_string(),
            ));
        }
        if self.label_column >= width {
            return Err(ReportError::InvalidConfiguration(
                "label_column must be narrower than the content area".to_string(),
            ));
        }
        Ok(())
    }

    pub fn left(&self) -> Pt {
        self.margins.left
    }

    pub fn right(&self) -> Pt {
        self.page_size.width - self.margins.right
    }

    /// Cursor start position on a fresh page.
    pub fn top(&self) -> Pt {
        self.page_size.height - self.margins.top
    }

    /// Lowest y a line may occupy.
    pub fn bottom(&self) -> Pt {
        self.margins.bottom
    }

    pub fn content_width(&self) -> Pt {
        self.right() - self.left()
    }

    pub fn content_height(&self) -> Pt {
        self.top() - self.bottom()
    }

    pub fn leading(&self, size: Pt) -> Pt {
        size * self.line_height
    }

    /// Height of one table-of-contents entry.
    pub fn contents_leading(&self) -> Pt {
        self.leading(self.body_size) + Pt::from_i32(2)
    }

    pub fn regular(&self) -> FontFace {
        FontFace::regular(self.font_family)
    }

    pub fn bold(&self) -> FontFace {
        FontFace::bold(self.font_family)
    }

    pub fn body(&self) -> TextStyle {
        TextStyle::new(self.regular(), self.body_size, self.palette.text)
    }

    pub fn body_bold(&self) -> TextStyle {
        TextStyle::new(self.bold(), self.body_size, self.palette.text)
    }

    pub fn small(&self) -> TextStyle {
        TextStyle::new(self.regular(), self.small_size, self.palette.muted)
    }

    pub fn heading(&self) -> TextStyle {
        TextStyle::new(self.bold(), self.heading_size, self.palette.brand)
    }

    pub fn subheading(&self) -> TextStyle {
        TextStyle::new(self.bold(), self.subheading_size, self.palette.brand)
    }

    pub fn title(&self) -> TextStyle {
        TextStyle::new(self.bold(), self.title_size, self.palette.brand)
    }

    pub fn chip_label(&self) -> TextStyle {
        TextStyle::new(self.bold(), self.small_size, Color::WHITE)
    }
}
