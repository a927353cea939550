//! Heuristic topic detection
//!
//! A fixed, non-configurable pattern list that surfaces topic candidates
//! from section headers and instruction lines, then resolves each against
//! the shared topic table.

use crate::normalize::title_case;
use questforge_common::db::{ReferenceRecord, Store};
use regex_lite::RegexBuilder;
use tracing::{debug, warn};

/// Topic indicator patterns; each captures the candidate phrase
const TOPIC_PATTERNS: &[&str] = &[
    r"section\s*[a-z]\s*[:\-]\s*([^\n]{5,100})",
    r"topic\s*[:\-]\s*([^\n]{5,100})",
    r"part\s*[a-z]\s*[:\-]\s*([^\n]{5,100})",
    r"answer\s*(?:questions?|all)\s*from\s*([^\n]{5,100})",
    r"chapter\s*[:\-]\s*([^\n]{5,100})",
    r"unit\s*[:\-]\s*([^\n]{5,100})",
    r"\[topic\s*[:\-]\s*([^\]]+)\]",
    r"topic\s*name\s*[:\-]\s*([^\n]{5,100})",
];

/// Scan text for topic candidates: cleaned, title-cased and deduplicated,
/// in discovery order
pub fn topic_candidates(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for source in TOPIC_PATTERNS {
        let regex = match RegexBuilder::new(source).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                warn!(pattern = source, error = %e, "Topic pattern failed to compile, skipping");
                continue;
            }
        };

        for caps in regex.captures_iter(text) {
            let Some(matched) = caps.get(1) else {
                continue;
            };
            let Some(candidate) = clean_candidate(matched.as_str()) else {
                continue;
            };
            if !candidates.contains(&candidate) {
                debug!(topic = %candidate, "Detected topic");
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// Strip a raw candidate to letters/digits/space/hyphen/period, collapse
/// whitespace, and reject out-of-range or purely numeric results
fn clean_candidate(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '.')
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let len = collapsed.chars().count();
    if !(3..=100).contains(&len) {
        return None;
    }
    if collapsed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(title_case(&collapsed))
}

/// Resolve or create a topic entity for every candidate in the text.
/// A failure for one candidate does not abort the rest.
pub async fn detect_topics(store: &dyn Store, text: &str) -> Vec<ReferenceRecord> {
    let mut topics: Vec<ReferenceRecord> = Vec::new();

    for candidate in topic_candidates(text) {
        match store.find_or_create_topic(&candidate).await {
            Ok(topic) => {
                if !topics.iter().any(|t| t.id == topic.id) {
                    topics.push(topic);
                }
            }
            Err(e) => {
                warn!(topic = %candidate, error = %e, "Topic resolution failed");
            }
        }
    }

    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[test]
    fn test_section_headers_yield_candidates() {
        let candidates = topic_candidates("Section A: Algebra Basics\nSection B: Geometry");
        assert_eq!(candidates, vec!["Algebra Basics", "Geometry"]);
    }

    #[test]
    fn test_candidates_are_cleaned_and_title_cased() {
        let candidates = topic_candidates("Topic: *organic* chemistry!!\n");
        assert_eq!(candidates, vec!["Organic Chemistry"]);
    }

    #[test]
    fn test_bracketed_topic_form() {
        let candidates = topic_candidates("[topic: wave motion]");
        assert!(candidates.contains(&"Wave Motion".to_string()));
    }

    #[test]
    fn test_numeric_and_short_candidates_rejected() {
        assert!(topic_candidates("Chapter: 12345\n").is_empty());
        assert!(topic_candidates("Unit: ab\n").is_empty());
    }

    #[test]
    fn test_duplicates_across_patterns_collapse() {
        // both the "topic:" and bracketed forms hit the same phrase
        let candidates = topic_candidates("[topic: thermodynamics]");
        assert_eq!(candidates, vec!["Thermodynamics"]);
    }

    #[tokio::test]
    async fn test_detect_topics_creates_entities_once() {
        let store = MemoryStore::new();
        let text = "Section A: Algebra Basics\nSection B: Geometry";

        let first = detect_topics(&store, text).await;
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "Algebra Basics");
        assert_eq!(first[1].name, "Geometry");

        // a second run resolves to the same entities, creating nothing new
        let second = detect_topics(&store, text).await;
        assert_eq!(second, first);
        assert_eq!(store.topic_count(), 2);
    }
}
