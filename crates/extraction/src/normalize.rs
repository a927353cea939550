//! Matched-value cleanup
//!
//! Raw regex captures arrive with currency signs, smart quotes, stray
//! slashes and placeholder markers; this module reduces them to canonical
//! scalar values.

/// Values treated as "nothing was extracted"
const SENTINELS: &[&str] = &["", "\u{2014}", "nan", "null", "undefined"];

/// Characters stripped from matched values without replacement
const NOISE_CHARS: &[char] = &[
    '\u{2248}', // ≈
    '~',
    '+',
    '$',
    '\u{20AC}', // €
    '\u{A3}',   // £
    '\u{2014}', // —
    '\u{2022}', // •
    '\u{B7}',   // ·
    '"',
    '\'',
    '\u{201C}', // “
    '\u{201D}', // ”
    '\u{2018}', // ‘
    '\u{2019}', // ’
    '\\',
    '/',
];

/// Clean a raw matched value into a canonical scalar, or None when the
/// value amounts to nothing.
pub fn clean_value(raw: &str) -> Option<String> {
    if SENTINELS.contains(&raw) {
        return None;
    }

    let value: String = raw
        .trim()
        .chars()
        .filter(|c| !NOISE_CHARS.contains(c))
        .collect();

    // "12-15" style ranges resolve to their first bound; a leading hyphen
    // is a sign, not a range
    if value.contains('-') && !value.starts_with('-') {
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() == 2 {
            let first = parts[0].trim();
            if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
                return Some(first.to_string());
            }
        }
    }

    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Title-case for entity names: the first letter of every alphabetic run
/// is uppercased, the rest lowercased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_absent() {
        for raw in ["", "\u{2014}", "nan", "null", "undefined"] {
            assert_eq!(clean_value(raw), None, "{:?} should be absent", raw);
        }
    }

    #[test]
    fn test_noise_characters_stripped() {
        assert_eq!(clean_value("$Physics~"), Some("Physics".to_string()));
        assert_eq!(clean_value("\u{2248}45"), Some("45".to_string()));
        assert_eq!(
            clean_value("\u{201C}Grade 10\u{201D}"),
            Some("Grade 10".to_string())
        );
    }

    #[test]
    fn test_numeric_range_takes_first_bound() {
        assert_eq!(clean_value("12-15"), Some("12".to_string()));
        assert_eq!(clean_value(" 12 - 15 "), Some("12".to_string()));
    }

    #[test]
    fn test_leading_hyphen_not_split() {
        assert_eq!(clean_value("-5"), Some("-5".to_string()));
    }

    #[test]
    fn test_non_numeric_hyphen_kept() {
        assert_eq!(
            clean_value("mid-term revision"),
            Some("mid-term revision".to_string())
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            clean_value("  Term   One \t Exam "),
            Some("Term One Exam".to_string())
        );
    }

    #[test]
    fn test_all_noise_is_absent() {
        assert_eq!(clean_value("$~+"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("algebra basics"), "Algebra Basics");
        assert_eq!(title_case("ALGEBRA BASICS"), "Algebra Basics");
        assert_eq!(title_case("grade 10 physics"), "Grade 10 Physics");
        assert_eq!(title_case("o'brien"), "O'Brien");
    }
}
