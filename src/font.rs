use crate::error::ReportError;
use crate::types::Pt;

/// Glyph advance lookup in 1/1000 em units. Implemented by the built-in
/// faces; tests and callers may supply their own.
pub trait TextMeasure {
    fn advance_units(&self, ch: char) -> u32;

    fn measure_units(&self, text: &str) -> u32 {
        text.chars().map(|ch| self.advance_units(ch)).sum()
    }

    fn measure(&self, text: &str, size: Pt) -> Pt {
        Pt::from_font_units(self.measure_units(text), size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFamily {
    Helvetica,
    Courier,
}

impl FontFamily {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        match raw.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "helvetica" | "arial" | "sans-serif" => Ok(FontFamily::Helvetica),
            "courier" | "monospace" => Ok(FontFamily::Courier),
            _ => Err(ReportError::FontUnavailable(raw.trim().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Courier => "Courier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontFace {
    pub family: FontFamily,
    pub weight: FontWeight,
}

impl FontFace {
    pub fn new(family: FontFamily, weight: FontWeight) -> Self {
        Self { family, weight }
    }

    pub fn regular(family: FontFamily) -> Self {
        Self::new(family, FontWeight::Regular)
    }

    pub fn bold(family: FontFamily) -> Self {
        Self::new(family, FontWeight::Bold)
    }

    /// PostScript name of the standard Type1 face.
    pub fn base_font(&self) -> &'static str {
        match (self.family, self.weight) {
            (FontFamily::Helvetica, FontWeight::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontWeight::Bold) => "Helvetica-Bold",
            (FontFamily::Courier, FontWeight::Regular) => "Courier",
            (FontFamily::Courier, FontWeight::Bold) => "Courier-Bold",
        }
    }
}

impl TextMeasure for FontFace {
    fn advance_units(&self, ch: char) -> u32 {
        match self.family {
            FontFamily::Courier => 600,
            FontFamily::Helvetica => {
                let table = match self.weight {
                    FontWeight::Regular => &HELVETICA_ASCII,
                    FontWeight::Bold => &HELVETICA_BOLD_ASCII,
                };
                helvetica_advance(table, ch)
            }
        }
    }
}

const MISSING_WIDTH: u16 = 556;

fn helvetica_advance(table: &[u16; 95], ch: char) -> u32 {
    let code = ch as u32;
    if (0x20..=0x7e).contains(&code) {
        return table[(code - 0x20) as usize] as u32;
    }
    if (0xa0..=0xbf).contains(&code) {
        return HELVETICA_LATIN1_SYMBOLS[(code - 0xa0) as usize] as u32;
    }
    match ch {
        'Æ' => 1000,
        'æ' => 889,
        'ß' => 611,
        '×' | '÷' => 584,
        'Þ' | 'þ' => 611,
        _ => match fold_latin1_letter(ch) {
            Some(base) => table[(base as u32 - 0x20) as usize] as u32,
            None => MISSING_WIDTH as u32,
        },
    }
}

/// Accented Latin-1 letters share the advance of their base letter.
fn fold_latin1_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ð' => 'o',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

// Advances for U+0020..=U+007E, taken from the standard Type1 metrics.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// U+00A0..=U+00BF.
#[rustfmt::skip]
const HELVETICA_LATIN1_SYMBOLS: [u16; 32] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_standard_metrics() {
        let regular = FontFace::regular(FontFamily::Helvetica);
        let bold = FontFace::bold(FontFamily::Helvetica);
        assert_eq!(regular.advance_units(' '), 278);
        assert_eq!(regular.advance_units('W'), 944);
        assert_eq!(regular.advance_units('i'), 222);
        assert_eq!(bold.advance_units('i'), 278);
        assert_eq!(regular.measure_units("Fire"), 611 + 222 + 333 + 556);
    }

    #[test]
    fn accented_letters_fold_to_base_width() {
        let regular = FontFace::regular(FontFamily::Helvetica);
        assert_eq!(regular.advance_units('é'), regular.advance_units('e'));
        assert_eq!(regular.advance_units('Ö'), regular.advance_units('O'));
    }

    #[test]
    fn courier_is_monospaced() {
        let face = FontFace::bold(FontFamily::Courier);
        assert_eq!(face.measure_units("iW"), 1200);
        assert_eq!(face.base_font(), "Courier-Bold");
    }

    #[test]
    fn unknown_family_is_a_structural_error() {
        assert_eq!(FontFamily::parse("Arial").expect("alias"), FontFamily::Helvetica);
        let err = FontFamily::parse("Garamond").expect_err("not base-14");
        assert!(matches!(err, ReportError::FontUnavailable(name) if name == "Garamond"));
    }
}
