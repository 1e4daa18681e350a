//! Invisible character sets and helpers shared by the whitespace and
//! control-character fuzzers.

use apifuzz_types::FieldType;
use serde_json::Value;

/// Unicode whitespace and separator characters.
pub const WHITESPACES: &[&str] = &[
    " ",
    "\u{1680}",
    "\u{2000}",
    "\u{2001}",
    "\u{2002}",
    "\u{2003}",
    "\u{2004}",
    "\u{2005}",
    "\u{2006}",
    "\u{2007}",
    "\u{2008}",
    "\u{2009}",
    "\u{200A}",
    "\u{2028}",
    "\u{2029}",
    "\u{202F}",
    "\u{205F}",
    "\u{3000}",
    "\u{00A0}",
    "\u{0009}",
];

/// C0/C1 controls, zero-width and bidi formatting characters.
pub const CONTROL_CHARS: &[&str] = &[
    "\r\n",
    "\u{0000}",
    "\u{0007}",
    "\u{0008}",
    "\n",
    "\u{000B}",
    "\u{000C}",
    "\r",
    "\u{001B}",
    "\u{007F}",
    "\u{0080}",
    "\u{0085}",
    "\u{200B}",
    "\u{200C}",
    "\u{200D}",
    "\u{200E}",
    "\u{200F}",
    "\u{202A}",
    "\u{202B}",
    "\u{202C}",
    "\u{202D}",
    "\u{202E}",
    "\u{2060}",
    "\u{2061}",
    "\u{2062}",
    "\u{2063}",
    "\u{2064}",
    "\u{FEFF}",
];

/// `U+0007`, `U+000D U+000A`: readable labels for invisible sequences.
pub fn code_points(sequence: &str) -> String {
    sequence
        .chars()
        .map(|c| format!("U+{:04X}", c as u32))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Length a repeated-character replacement should have for `field`.
///
/// The current string length, clamped to the declared length bounds, and
/// never shorter than one character.
pub fn replacement_length(field: &FieldType, current: &Value) -> usize {
    let current_len = current.as_str().map(|s| s.chars().count()).unwrap_or(0);
    let floor = field.min_length.unwrap_or(0).max(1);
    let len = current_len.max(floor);
    match field.max_length {
        Some(max) if max >= floor => len.min(max),
        _ => len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_points() {
        assert_eq!(code_points("\u{0007}"), "U+0007");
        assert_eq!(code_points("\r\n"), "U+000D U+000A");
    }

    #[test]
    fn test_replacement_length_bounds() {
        let plain = FieldType::string();
        assert_eq!(replacement_length(&plain, &json!("hello")), 5);
        assert_eq!(replacement_length(&plain, &json!("")), 1);
        assert_eq!(replacement_length(&plain, &Value::Null), 1);

        let bounded = FieldType::string().with_length(Some(3), Some(4));
        assert_eq!(replacement_length(&bounded, &json!("a")), 3);
        assert_eq!(replacement_length(&bounded, &json!("abcdefgh")), 4);
    }

    #[test]
    fn test_character_sets_are_invisible() {
        for sequence in WHITESPACES.iter().chain(CONTROL_CHARS) {
            assert!(sequence.chars().all(|c| !c.is_alphanumeric()));
            assert!(!sequence.is_empty());
        }
    }
}
