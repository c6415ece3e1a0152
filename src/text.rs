//! Text sanitizing and greedy word wrapping.
//!
//! Every string that reaches a page passes through [`sanitize`] first, so the
//! two-weight Latin faces never receive a code point they cannot encode.

use crate::font::TextMeasure;
use crate::types::Pt;
use std::borrow::Cow;

/// Maps typographic characters to ASCII equivalents, then strips anything
/// outside printable ASCII and the Latin-1 supplement.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    if input.chars().all(is_passthrough) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if is_passthrough(ch) {
            out.push(ch);
            continue;
        }
        if let Some(replacement) = ascii_replacement(ch) {
            out.push_str(replacement);
        }
    }
    Cow::Owned(out)
}

/// Number of input characters that did not survive unchanged.
pub fn sanitized_char_count(input: &str) -> usize {
    input.chars().filter(|ch| !is_passthrough(*ch)).count()
}

fn is_passthrough(ch: char) -> bool {
    let code = ch as u32;
    (0x20..=0x7e).contains(&code) || ((0xa1..=0xff).contains(&code) && !matches!(ch, '×' | '÷'))
}

fn ascii_replacement(ch: char) -> Option<&'static str> {
    let replacement = match ch {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{2022}' | '\u{2023}' | '\u{25CF}' | '\u{25E6}' | '\u{2043}' => "-",
        '\u{00D7}' => "x",
        '\u{00F7}' => "/",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{2248}' => "~",
        '\u{2192}' => "->",
        '\u{2190}' => "<-",
        '\u{20AC}' => "EUR",
        '\u{2122}' => "(TM)",
        '\u{2039}' => "<",
        '\u{203A}' => ">",
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' | '\t' | '\n' | '\r' => {
            " "
        }
        _ => return None,
    };
    Some(replacement)
}

/// Greedy word packing over sanitized text.
///
/// Always yields at least one line; an empty or fully stripped input yields a
/// single empty line. A word wider than `max_width` occupies a line alone.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: Pt,
    font_size: Pt,
    measure: &M,
) -> Vec<String> {
    let clean = sanitize(text);
    let space = measure.advance_units(' ');
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_units = 0u32;

    for word in clean.split_whitespace() {
        let word_units = measure.measure_units(word);
        if current.is_empty() {
            current.push_str(word);
            current_units = word_units;
            continue;
        }
        let next_units = current_units + space + word_units;
        if Pt::from_font_units(next_units, font_size) <= max_width {
            current.push(' ');
            current.push_str(word);
            current_units = next_units;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_units = word_units;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// [`wrap_text`] for fixed-width cells: a word wider than `max_width` is
/// broken between characters rather than overhanging its neighbour.
pub fn wrap_text_within<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: Pt,
    font_size: Pt,
    measure: &M,
) -> Vec<String> {
    let mut out = Vec::new();
    for line in wrap_text(text, max_width, font_size, measure) {
        if measure.measure(&line, font_size) <= max_width {
            out.push(line);
            continue;
        }
        let mut piece = String::new();
        let mut units = 0u32;
        for ch in line.chars() {
            let ch_units = measure.advance_units(ch);
            if !piece.is_empty() && Pt::from_font_units(units + ch_units, font_size) > max_width {
                out.push(std::mem::take(&mut piece));
                units = 0;
            }
            piece.push(ch);
            units += ch_units;
        }
        out.push(piece);
    }
    out
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
pub fn truncate_to_width<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: Pt,
    font_size: Pt,
    measure: &M,
) -> String {
    let clean = sanitize(text);
    if measure.measure(&clean, font_size) <= max_width {
        return clean.into_owned();
    }
    let mut out: String = clean.into_owned();
    while !out.is_empty() {
        out.pop();
        let candidate = format!("{}...", out.trim_end());
        if measure.measure(&candidate, font_size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontFace, FontFamily};
    use proptest::prelude::*;

    fn body() -> FontFace {
        FontFace::regular(FontFamily::Helvetica)
    }

    #[test]
    fn smart_punctuation_becomes_ascii() {
        let input = "\u{201C}Fire door\u{201D} \u{2014} it\u{2019}s 30\u{00D7}2\u{2026} \u{2264}5 \u{2022} \u{20AC}10\u{2122}";
        assert_eq!(sanitize(input), "\"Fire door\" - it's 30x2... <=5 - EUR10(TM)");
    }

    #[test]
    fn latin1_letters_survive_and_others_are_stripped() {
        assert_eq!(sanitize("Café £5 \u{4E2D}\u{1F525}ok"), "Café £5 ok");
        assert!(matches!(sanitize("plain ascii"), Cow::Borrowed(_)));
        assert_eq!(sanitized_char_count("a\u{2013}b\u{1F525}"), 2);
    }

    #[test]
    fn empty_input_yields_one_empty_line() {
        let face = body();
        assert_eq!(wrap_text("", Pt::from_i32(100), Pt::from_i32(10), &face), vec![String::new()]);
        assert_eq!(
            wrap_text("\u{1F525}\u{1F525}", Pt::from_i32(100), Pt::from_i32(10), &face),
            vec![String::new()]
        );
    }

    #[test]
    fn over_wide_word_is_placed_alone() {
        let face = body();
        let lines = wrap_text(
            "a Pneumonoultramicroscopic b",
            Pt::from_i32(40),
            Pt::from_i32(10),
            &face,
        );
        assert_eq!(lines, vec!["a", "Pneumonoultramicroscopic", "b"]);
    }

    #[test]
    fn cell_wrap_breaks_unspaced_words() {
        let face = body();
        let max_width = Pt::from_i32(60);
        let size = Pt::from_i32(8);
        let lines = wrap_text_within(
            "see 2026-03-01_rear_stair_core_level2_photo.jpg attached",
            max_width,
            size,
            &face,
        );
        assert!(lines.len() > 3);
        for line in &lines {
            assert!(face.measure(line, size) <= max_width, "{line}");
        }
        assert_eq!(
            lines.concat().replace(' ', ""),
            "see2026-03-01_rear_stair_core_level2_photo.jpgattached"
        );
    }

    #[test]
    fn truncation_appends_ellipsis() {
        let face = body();
        let out = truncate_to_width(
            "Fire Risk Assessment for the Grand Hotel",
            Pt::from_i32(80),
            Pt::from_i32(10),
            &face,
        );
        assert!(out.ends_with("..."));
        assert!(face.measure(&out, Pt::from_i32(10)) <= Pt::from_i32(80));
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in "\\PC{0,64}") {
            let once = sanitize(&input).into_owned();
            let twice = sanitize(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_wrapped_lines_fit_and_rejoin(
            words in proptest::collection::vec("[A-Za-z\u{2019}\u{00E9}]{1,12}", 0..40),
            width in 60i32..400,
            size in 6i32..18,
        ) {
            let face = body();
            let text = words.join(" ");
            let max_width = Pt::from_i32(width);
            let font_size = Pt::from_i32(size);
            let lines = wrap_text(&text, max_width, font_size, &face);
            prop_assert!(!lines.is_empty());
            for line in &lines {
                if line.contains(' ') {
                    prop_assert!(face.measure(line, font_size) <= max_width);
                }
            }
            let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
            let clean = sanitize(&text);
            let expected: Vec<&str> = clean.split_whitespace().collect();
            prop_assert_eq!(rejoined, expected);
        }
    }
}
