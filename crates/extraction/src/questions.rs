//! Question counting
//!
//! Detects explicit question numbers and declared ranges, deduplicating
//! both into a single set of ordinals.

use regex_lite::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Largest question ordinal considered plausible
const MAX_QUESTION_NUMBER: u32 = 100;

const NUMBER_PATTERNS: &[&str] = &[
    r"question\s*(\d+)",
    r"q\.?\s*(\d+)",
    r"^\s*(\d+)\.",
    r"\(\s*(\d+)\s*\)",
    r"\[(\d+)\]",
    r"^\s*(\d+)\s+[a-zA-Z]",
];

const RANGE_PATTERNS: &[&str] = &[
    r"questions?\s*(\d+)\s*to\s*(\d+)",
    r"questions?\s*(\d+)\s*-\s*(\d+)",
    r"q\.?\s*(\d+)\s*to\s*(\d+)",
];

/// Count the distinct question numbers declared in the text
pub fn count_questions(text: &str) -> usize {
    let mut numbers: BTreeSet<u32> = BTreeSet::new();

    for source in NUMBER_PATTERNS {
        let Some(regex) = compile(source) else {
            continue;
        };
        for caps in regex.captures_iter(text) {
            let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            if (1..=MAX_QUESTION_NUMBER).contains(&n) {
                numbers.insert(n);
            }
        }
    }

    for source in RANGE_PATTERNS {
        let Some(regex) = compile(source) else {
            continue;
        };
        for caps in regex.captures_iter(text) {
            let start = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let end = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            if let (Some(start), Some(end)) = (start, end) {
                if start >= 1 && start <= end && end <= MAX_QUESTION_NUMBER {
                    numbers.extend(start..=end);
                }
            }
        }
    }

    debug!(count = numbers.len(), "Detected unique questions");
    numbers.len()
}

fn compile(source: &str) -> Option<Regex> {
    match RegexBuilder::new(source)
        .case_insensitive(true)
        .multi_line(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = source, error = %e, "Question pattern failed to compile, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_and_ranges_deduplicate() {
        let text = "Question 1 ...\nQuestion 2 ...\n(3) ...\nAttempt questions 5 to 7.";
        // {1, 2, 3, 5, 6, 7}
        assert_eq!(count_questions(text), 6);
    }

    #[test]
    fn test_overlapping_detections_count_once() {
        let text = "Question 1. Question 1 continued. Q.1 again. (1)";
        assert_eq!(count_questions(text), 1);
    }

    #[test]
    fn test_line_leading_forms() {
        let text = "1. Define energy\n2 State the first law\n[3] Derive it";
        assert_eq!(count_questions(text), 3);
    }

    #[test]
    fn test_hyphen_range_form() {
        assert_eq!(count_questions("Answer questions 4-6 and question 10"), 4);
    }

    #[test]
    fn test_out_of_range_numbers_ignored() {
        assert_eq!(count_questions("Question 0 and question 250"), 0);
        assert_eq!(count_questions("questions 90 to 300"), 0);
    }

    #[test]
    fn test_inverted_range_ignored() {
        assert_eq!(count_questions("questions 9 to 3"), 0);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(count_questions(""), 0);
    }
}
