//! The narrow persistence interface consumed by the extraction pipeline
//!
//! The pipeline never talks to SeaORM directly; it sees only this trait.
//! `Repository` implements it against Postgres, and the extraction crate's
//! tests implement it in memory.

use crate::db::models::{ExtractionPattern, FieldKind, QuestionPaper};
use crate::errors::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// The reference tables the resolver can assign to a paper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Subject,
    Grade,
    Term,
    School,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Subject,
        ReferenceKind::Grade,
        ReferenceKind::Term,
        ReferenceKind::School,
    ];

    /// Table name backing this reference kind
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Subject => "subjects",
            ReferenceKind::Grade => "grades",
            ReferenceKind::Term => "terms",
            ReferenceKind::School => "schools",
        }
    }

    /// The extracted field this reference kind is resolved from
    pub fn field_kind(&self) -> FieldKind {
        match self {
            ReferenceKind::Subject => FieldKind::Subject,
            ReferenceKind::Grade => FieldKind::Grade,
            ReferenceKind::Term => FieldKind::Term,
            ReferenceKind::School => FieldKind::School,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Subject => "subject",
            ReferenceKind::Grade => "grade",
            ReferenceKind::Term => "term",
            ReferenceKind::School => "school",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved reference entity row (subject, grade, term, school or topic)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub id: Uuid,
    pub name: String,
}

/// Persistence operations the pipeline consumes
#[async_trait]
pub trait Store: Send + Sync {
    /// Active extraction patterns ordered by ascending priority
    async fn active_patterns(&self) -> Result<Vec<ExtractionPattern>>;

    /// Case-insensitive substring lookup on a reference table's name
    async fn find_reference_containing(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceRecord>>;

    /// Create a reference row (conflict-safe on the unique name)
    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceRecord>;

    /// Resolve or create a topic by exact name
    async fn find_or_create_topic(&self, name: &str) -> Result<ReferenceRecord>;

    /// Load a question paper by id
    async fn find_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>>;

    /// Persist the paper's current in-memory state (repeatable, sole write path)
    async fn save_paper(&self, paper: &QuestionPaper) -> Result<()>;

    /// Associate topics with a paper; already-attached topics are skipped
    async fn attach_topics(&self, paper_id: Uuid, topic_ids: &[Uuid]) -> Result<()>;

    /// Names of the topics attached to a paper, ordered by name
    async fn topic_names(&self, paper_id: Uuid) -> Result<Vec<String>>;
}
