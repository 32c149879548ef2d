//! Text measurement and wrapping for the PDF standard Helvetica faces
//!
//! Widths are the Adobe font metrics for printable ASCII in 1/1000 em.
//! Characters outside ASCII are measured at the width of a digit.
//! Text reaches the PDF as WinAnsiEncoding bytes.

use crate::layout::MM_PER_PT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    /// Standard Type 1 font name
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used inside page content streams
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontFace::Regular => &HELVETICA,
            FontFace::Bold => &HELVETICA_BOLD,
        }
    }
}

/// Width of anything outside the ASCII tables
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica, code points 32..=126
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica-Bold, code points 32..=126
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

pub const ELLIPSIS: &str = "...";

fn char_width(ch: char, face: FontFace) -> u16 {
    match ch as u32 {
        code @ 32..=126 => face.widths()[(code - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in millimetres
pub fn text_width_mm(text: &str, face: FontFace, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, face))).sum();
    units as f32 / 1000.0 * size_pt * MM_PER_PT
}

/// Word-wrap `text` to lines no wider than `max_width_mm`
///
/// Explicit newlines start a new line. Words wider than a full line are
/// split between characters. Empty input gives no lines.
///
/// # Examples
///
/// ```
/// use parcel_slip::core::text::{wrap_text, FontFace};
///
/// let lines = wrap_text("12 Palm St, Springfield", FontFace::Regular, 10.0, 30.0);
/// assert_eq!(lines, vec!["12 Palm St,", "Springfield"]);
/// ```
pub fn wrap_text(text: &str, face: FontFace, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };

            if text_width_mm(&candidate, face, size_pt) <= max_width_mm {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            // A word longer than the line is broken between characters
            for ch in word.chars() {
                line.push(ch);
                if text_width_mm(&line, face, size_pt) > max_width_mm && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, ch.to_string()));
                }
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width_mm`
pub fn ellipsize(text: &str, face: FontFace, size_pt: f32, max_width_mm: f32) -> String {
    if text_width_mm(text, face, size_pt) <= max_width_mm {
        return text.to_string();
    }

    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>().trim_end().to_string() + ELLIPSIS;
        if text_width_mm(&candidate, face, size_pt) <= max_width_mm {
            return candidate;
        }
    }

    ELLIPSIS.to_string()
}

/// Encode text as WinAnsiEncoding bytes
///
/// Latin-1 maps directly; a handful of typographic characters map to their
/// Windows-1252 slots; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{a0}'..='\u{ff}' => ch as u32 as u8,
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}
