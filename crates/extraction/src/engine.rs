//! Configured-pattern extraction engine
//!
//! Applies the administrator-defined patterns to extracted text in
//! priority order and scores the run. The engine is pure: failures are
//! carried in the result rather than logged-and-lost.

use crate::normalize::clean_value;
use questforge_common::db::models::{DetectedFields, ExtractionPattern};
use tracing::{debug, warn};

/// Patterns with a priority below this limit may overwrite a field an
/// earlier pattern already filled. The comparison is against this fixed
/// limit, not against the priority that produced the existing value.
pub const PRIORITY_OVERRIDE_LIMIT: i32 = 3;

/// A configured pattern that could not be applied
#[derive(Debug, Clone)]
pub struct PatternFailure {
    pub pattern: String,
    pub message: String,
}

/// Outcome of one extraction run
#[derive(Debug, Clone, Default)]
pub struct FieldExtraction {
    pub fields: DetectedFields,
    /// matched / attempted, in [0, 1]; 0.0 when nothing was attempted
    pub confidence: f64,
    pub matched: usize,
    pub attempted: usize,
    pub failures: Vec<PatternFailure>,
}

/// Run every pattern against the text, in the order given
pub fn extract_fields(text: &str, patterns: &[ExtractionPattern]) -> FieldExtraction {
    let mut out = FieldExtraction::default();

    for pattern in patterns {
        out.attempted += 1;

        let Some(kind) = pattern.kind() else {
            warn!(
                pattern = %pattern.name,
                field_kind = %pattern.field_kind,
                "Unknown field kind, skipping pattern"
            );
            out.failures.push(PatternFailure {
                pattern: pattern.name.clone(),
                message: format!("unknown field kind: {}", pattern.field_kind),
            });
            continue;
        };

        let regex = match pattern.compile() {
            Ok(re) => re,
            Err(e) => {
                warn!(pattern = %pattern.name, error = %e, "Pattern failed to compile, skipping");
                out.failures.push(PatternFailure {
                    pattern: pattern.name.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let Some(caps) = regex.captures(text) else {
            continue;
        };

        // With capture groups, take the first group that has content;
        // without groups, the whole match
        let raw = if caps.len() > 1 {
            (1..caps.len())
                .filter_map(|i| caps.get(i))
                .map(|m| m.as_str())
                .find(|s| !s.trim().is_empty())
                .unwrap_or("")
        } else {
            caps.get(0).map(|m| m.as_str()).unwrap_or("")
        };

        let Some(value) = clean_value(raw) else {
            continue;
        };

        if !out.fields.contains(kind) || pattern.priority < PRIORITY_OVERRIDE_LIMIT {
            debug!(
                field = %kind,
                value = %value,
                pattern = %pattern.name,
                priority = pattern.priority,
                "Field matched"
            );
            out.fields.set(kind, value);
            out.matched += 1;
        }
    }

    out.confidence = if out.attempted > 0 {
        out.matched as f64 / out.attempted as f64
    } else {
        0.0
    };

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_pattern;
    use questforge_common::db::models::FieldKind;

    const TEXT: &str = "--- Page 1 ---\nSubject: Physics Paper Code PHY-101 Grade: 10";

    #[test]
    fn test_single_pattern_extracts_field() {
        let patterns = vec![make_pattern(
            "subject-header",
            FieldKind::Subject,
            r"subject\s*:\s*([a-z]+)",
            1,
        )];

        let out = extract_fields(TEXT, &patterns);
        assert_eq!(out.fields.get(FieldKind::Subject), Some("Physics"));
        assert_eq!(out.matched, 1);
        assert_eq!(out.attempted, 1);
        assert!((out.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_priority_never_overwrites() {
        let patterns = vec![
            make_pattern("primary", FieldKind::Subject, r"subject\s*:\s*([a-z]+)", 1),
            make_pattern("fallback", FieldKind::Subject, r"paper\s*code\s*([a-z]+)", 5),
        ];

        let out = extract_fields(TEXT, &patterns);
        assert_eq!(out.fields.get(FieldKind::Subject), Some("Physics"));
        // the fallback matched but was not allowed to write
        assert_eq!(out.matched, 1);
        assert_eq!(out.attempted, 2);
    }

    #[test]
    fn test_priority_under_limit_overwrites() {
        // applied after the priority-5 pattern has already set the field
        let patterns = vec![
            make_pattern("fallback", FieldKind::Subject, r"paper\s*code\s*([a-z]+)", 5),
            make_pattern("override", FieldKind::Subject, r"subject\s*:\s*([a-z]+)", 2),
        ];

        let out = extract_fields(TEXT, &patterns);
        assert_eq!(out.fields.get(FieldKind::Subject), Some("Physics"));
        assert_eq!(out.matched, 2);
    }

    #[test]
    fn test_invalid_pattern_is_isolated() {
        let patterns = vec![
            make_pattern("broken", FieldKind::Subject, r"subject\s*:\s*([unclosed", 1),
            make_pattern("grade", FieldKind::Grade, r"grade\s*:\s*(\d+)", 2),
        ];

        let out = extract_fields(TEXT, &patterns);
        assert_eq!(out.fields.get(FieldKind::Grade), Some("10"));
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.attempted, 2);
        assert_eq!(out.matched, 1);
        assert!((out.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_field_kind_is_isolated() {
        let mut bogus = make_pattern("bogus", FieldKind::Subject, r"grade", 1);
        bogus.field_kind = "author".to_string();

        let out = extract_fields(TEXT, &[bogus]);
        assert!(out.fields.is_empty());
        assert_eq!(out.failures.len(), 1);
    }

    #[test]
    fn test_first_non_empty_group_wins() {
        let patterns = vec![make_pattern(
            "either-form",
            FieldKind::Grade,
            r"grade\s*:\s*(?:(class\s+\w+)|(\d+))",
            1,
        )];

        let out = extract_fields(TEXT, &patterns);
        assert_eq!(out.fields.get(FieldKind::Grade), Some("10"));
    }

    #[test]
    fn test_matched_value_is_cleaned() {
        let patterns = vec![make_pattern(
            "count-range",
            FieldKind::QuestionCount,
            r"answer\s+(\d+-\d+)\s+questions",
            1,
        )];

        let out = extract_fields("Answer 12-15 questions in total", &patterns);
        assert_eq!(out.fields.get(FieldKind::QuestionCount), Some("12"));
    }

    #[test]
    fn test_empty_pattern_set_scores_zero() {
        let out = extract_fields(TEXT, &[]);
        assert!(out.fields.is_empty());
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let patterns = vec![
            make_pattern("subject", FieldKind::Subject, r"subject\s*:\s*([a-z]+)", 1),
            make_pattern("school", FieldKind::School, r"school\s*:\s*([a-z ]+)", 1),
        ];

        for text in ["", TEXT, "School: Hillview High"] {
            let out = extract_fields(text, &patterns);
            assert!((0.0..=1.0).contains(&out.confidence));
        }
    }
}
