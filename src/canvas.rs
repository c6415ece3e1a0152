use crate::font::{FontFace, TextMeasure};
use crate::text::{sanitize, sanitized_char_count};
use crate::types::{Color, Pt, Size};
use std::borrow::Cow;

/// Page-space drawing command. Coordinates use the PDF convention: origin at
/// the bottom-left corner, y growing upwards, text positioned by baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    Translate(Pt, Pt),
    Rotate(f32),
    // Non-rendered metadata used for tests and page-aware reporting.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    // Applies both fill and stroke alpha (ca/CA). Values outside 0..1 are clamped.
    SetOpacity {
        fill: f32,
        stroke: f32,
    },
    SetFont {
        face: FontFace,
        size: Pt,
    },
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    FillRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    StrokeRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    Line {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: Pt,
    pub color: Color,
}

impl TextStyle {
    pub fn new(face: FontFace, size: Pt, color: Color) -> Self {
        Self { face, size, color }
    }

    pub fn width_of(&self, text: &str) -> Pt {
        self.face.measure(&sanitize(text), self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font: Option<(FontFace, Pt)>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_i32(1),
            font: None,
        }
    }
}

/// One page's ink surface. Pages are created by the pagination controller
/// and only ever appended to.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    pub commands: Vec<Command>,
    state_stack: Vec<GraphicsState>,
    state: GraphicsState,
    sanitized_chars: usize,
}

impl Page {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            commands: Vec::new(),
            state_stack: Vec::new(),
            state: GraphicsState::default(),
            sanitized_chars: 0,
        }
    }

    /// Characters replaced or stripped from text placed on this page.
    pub fn sanitized_chars(&self) -> usize {
        self.sanitized_chars
    }

    /// Zero-based position in the page registry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.state.clone());
        self.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
            self.commands.push(Command::RestoreState);
        }
    }

    pub fn translate(&mut self, x: Pt, y: Pt) {
        self.commands.push(Command::Translate(x, y));
    }

    pub fn rotate(&mut self, angle_radians: f32) {
        self.commands.push(Command::Rotate(angle_radians));
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_opacity(&mut self, fill: f32, stroke: f32) {
        self.commands.push(Command::SetOpacity {
            fill: fill.clamp(0.0, 1.0),
            stroke: stroke.clamp(0.0, 1.0),
        });
    }

    fn set_font(&mut self, face: FontFace, size: Pt) {
        if self.state.font == Some((face, size)) {
            return;
        }
        self.state.font = Some((face, size));
        self.commands.push(Command::SetFont { face, size });
    }

    /// Places sanitized text with its baseline at `y`. Returns the drawn width.
    pub fn text(&mut self, x: Pt, y: Pt, text: &str, style: TextStyle) -> Pt {
        let clean = sanitize(text);
        if matches!(clean, Cow::Owned(_)) {
            self.sanitized_chars += sanitized_char_count(text);
        }
        if clean.is_empty() {
            return Pt::ZERO;
        }
        let width = style.face.measure(&clean, style.size);
        self.set_fill_color(style.color);
        self.set_font(style.face, style.size);
        self.commands.push(Command::DrawString {
            x,
            y,
            text: clean.into_owned(),
        });
        width
    }

    /// Places text so that it ends at `right`.
    pub fn text_right(&mut self, right: Pt, y: Pt, text: &str, style: TextStyle) -> Pt {
        let width = style.width_of(text);
        self.text(right - width, y, text, style)
    }

    pub fn text_centered(&mut self, center: Pt, y: Pt, text: &str, style: TextStyle) -> Pt {
        let width = style.width_of(text);
        self.text(center - width.half(), y, text, style)
    }

    /// `y` is the bottom edge of the rectangle.
    pub fn fill_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, color: Color) {
        self.set_fill_color(color);
        self.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn stroke_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, color: Color, line: Pt) {
        self.set_stroke_color(color);
        self.set_line_width(line);
        self.commands.push(Command::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn line(&mut self, from: (Pt, Pt), to: (Pt, Pt), color: Color, width: Pt) {
        self.set_stroke_color(color);
        self.set_line_width(width);
        self.commands.push(Command::Line {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
        });
    }

    pub fn image(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, resource_id: impl Into<String>) {
        self.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    /// Filled label box ("chip") with centered text; `y` is the bottom edge.
    pub fn chip(&mut self, x: Pt, y: Pt, label: &str, fill: Color, style: TextStyle) -> Pt {
        let pad = style.size.half();
        let width = style.width_of(label) + pad * 2;
        let height = style.size + pad;
        self.fill_rect(x, y, width, height, fill);
        let baseline = y + pad.half() + style.size / 5;
        self.text(x + pad, baseline, label, style);
        width
    }

    pub fn has_meta(&self, key: &str, value: &str) -> bool {
        self.commands.iter().any(|cmd| {
            matches!(cmd, Command::Meta { key: k, value: v } if k == key && v == value)
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.commands.iter().any(|cmd| match cmd {
            Command::DrawString { text, .. } => text.contains(needle),
            _ => false,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawString { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn command_count(&self) -> usize {
        self.pages.iter().map(|p| p.commands.len()).sum()
    }
}
