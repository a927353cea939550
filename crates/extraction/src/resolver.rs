//! Reference entity resolution
//!
//! Maps extracted scalar values onto subject/grade/term/school rows,
//! creating missing rows with title-cased names. A reference already set
//! on the paper is never overridden.

use crate::normalize::title_case;
use questforge_common::db::models::{DetectedFields, QuestionPaper};
use questforge_common::db::{ReferenceKind, ReferenceRecord, Store};
use questforge_common::errors::Result;
use tracing::{debug, warn};

/// Resolve every extracted reference field onto the paper. A failure for
/// one field is logged and does not abort the others.
pub async fn resolve_references(
    store: &dyn Store,
    paper: &mut QuestionPaper,
    fields: &DetectedFields,
) {
    for kind in ReferenceKind::ALL {
        let Some(value) = fields.get(kind.field_kind()) else {
            continue;
        };

        let slot = match kind {
            ReferenceKind::Subject => &mut paper.subject_id,
            ReferenceKind::Grade => &mut paper.grade_id,
            ReferenceKind::Term => &mut paper.term_id,
            ReferenceKind::School => &mut paper.school_id,
        };
        if slot.is_some() {
            continue;
        }

        match resolve_one(store, kind, value).await {
            Ok(record) => {
                debug!(kind = %kind, name = %record.name, "Assigned reference");
                *slot = Some(record.id);
            }
            Err(e) => {
                warn!(kind = %kind, value = %value, error = %e, "Reference resolution failed");
            }
        }
    }
}

async fn resolve_one(
    store: &dyn Store,
    kind: ReferenceKind,
    value: &str,
) -> Result<ReferenceRecord> {
    if let Some(existing) = store.find_reference_containing(kind, value).await? {
        return Ok(existing);
    }
    store.create_reference(kind, &title_case(value)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{make_paper, MemoryStore};
    use questforge_common::db::models::FieldKind;

    fn detected(pairs: &[(FieldKind, &str)]) -> DetectedFields {
        let mut fields = DetectedFields::default();
        for (kind, value) in pairs {
            fields.set(*kind, value.to_string());
        }
        fields
    }

    #[tokio::test]
    async fn test_creates_missing_references_title_cased() {
        let store = MemoryStore::new();
        let mut paper = make_paper("exam.pdf");
        let fields = detected(&[
            (FieldKind::Subject, "physics"),
            (FieldKind::Grade, "grade 10"),
        ]);

        resolve_references(&store, &mut paper, &fields).await;

        assert!(paper.subject_id.is_some());
        assert!(paper.grade_id.is_some());
        assert_eq!(
            store.reference_names(ReferenceKind::Subject),
            vec!["Physics"]
        );
        assert_eq!(
            store.reference_names(ReferenceKind::Grade),
            vec!["Grade 10"]
        );
    }

    #[tokio::test]
    async fn test_substring_lookup_reuses_existing() {
        let store = MemoryStore::new();
        store
            .create_reference(ReferenceKind::Subject, "Physical Sciences")
            .await
            .unwrap();

        let mut paper = make_paper("exam.pdf");
        let fields = detected(&[(FieldKind::Subject, "physical")]);

        resolve_references(&store, &mut paper, &fields).await;

        assert_eq!(
            store.reference_names(ReferenceKind::Subject),
            vec!["Physical Sciences"]
        );
        assert!(paper.subject_id.is_some());
    }

    #[tokio::test]
    async fn test_preset_reference_not_overridden() {
        let store = MemoryStore::new();
        let preset = store
            .create_reference(ReferenceKind::Term, "Term One")
            .await
            .unwrap();

        let mut paper = make_paper("exam.pdf");
        paper.term_id = Some(preset.id);
        let fields = detected(&[(FieldKind::Term, "term two")]);

        resolve_references(&store, &mut paper, &fields).await;

        assert_eq!(paper.term_id, Some(preset.id));
        assert_eq!(store.reference_names(ReferenceKind::Term), vec!["Term One"]);
    }

    #[tokio::test]
    async fn test_failure_in_one_field_does_not_abort_others() {
        let store = MemoryStore::new();
        store.fail_reference_kind(ReferenceKind::Subject);

        let mut paper = make_paper("exam.pdf");
        let fields = detected(&[
            (FieldKind::Subject, "physics"),
            (FieldKind::School, "hillview high"),
        ]);

        resolve_references(&store, &mut paper, &fields).await;

        assert!(paper.subject_id.is_none());
        assert!(paper.school_id.is_some());
    }
}
