//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations.
//! Implements the narrow [`Store`] interface consumed by the extraction
//! pipeline, plus the administrative operations (pattern management,
//! paper creation, review queries) the rest of the system needs.

use crate::db::models::*;
use crate::db::store::{ReferenceKind, ReferenceRecord, Store};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use uuid::Uuid;

/// Input for creating a question paper
#[derive(Debug, Clone)]
pub struct NewPaper {
    pub file_path: String,
    pub uploaded_by: Option<Uuid>,
    pub complexity_rating: i32,
}

impl NewPaper {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            uploaded_by: None,
            complexity_rating: 3,
        }
    }
}

/// Input for creating an extraction pattern
#[derive(Debug, Clone)]
pub struct NewPattern {
    pub name: String,
    pub kind: FieldKind,
    pub pattern: String,
    pub priority: i32,
    pub description: String,
}

/// Escape LIKE/ILIKE metacharacters in user-derived lookup values
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Extraction Pattern Operations
    // ========================================================================

    /// Create a pattern; the regex source must compile under the engine flags
    pub async fn create_pattern(&self, input: NewPattern) -> Result<ExtractionPattern> {
        let model = ExtractionPattern {
            id: Uuid::new_v4(),
            name: input.name,
            field_kind: input.kind.as_str().to_string(),
            pattern: input.pattern,
            priority: input.priority,
            is_active: true,
            description: input.description,
            created_at: chrono::Utc::now().into(),
        };
        model.validate()?;

        let pattern = ExtractionPatternActiveModel {
            id: Set(model.id),
            name: Set(model.name),
            field_kind: Set(model.field_kind),
            pattern: Set(model.pattern),
            priority: Set(model.priority),
            is_active: Set(model.is_active),
            description: Set(model.description),
            created_at: Set(model.created_at),
        };

        pattern.insert(self.conn()).await.map_err(Into::into)
    }

    /// Replace a pattern's regex source, re-validating compilability
    pub async fn update_pattern_source(&self, id: Uuid, source: String) -> Result<ExtractionPattern> {
        let existing = ExtractionPatternEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "extraction_pattern".to_string(),
                id: id.to_string(),
            })?;

        let mut candidate = existing.clone();
        candidate.pattern = source.clone();
        candidate.validate()?;

        let mut active: ExtractionPatternActiveModel = existing.into();
        active.pattern = Set(source);
        active.update(self.conn()).await.map_err(Into::into)
    }

    /// Soft-enable or soft-disable a pattern
    pub async fn set_pattern_active(&self, id: Uuid, is_active: bool) -> Result<ExtractionPattern> {
        let existing = ExtractionPatternEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "extraction_pattern".to_string(),
                id: id.to_string(),
            })?;

        let mut active: ExtractionPatternActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.update(self.conn()).await.map_err(Into::into)
    }

    /// All patterns, active or not, grouped by field kind then priority
    pub async fn list_patterns(&self) -> Result<Vec<ExtractionPattern>> {
        ExtractionPatternEntity::find()
            .order_by_asc(ExtractionPatternColumn::FieldKind)
            .order_by_asc(ExtractionPatternColumn::Priority)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Active patterns for a specific field kind, ordered by priority
    pub async fn patterns_by_kind(&self, kind: FieldKind) -> Result<Vec<ExtractionPattern>> {
        ExtractionPatternEntity::find()
            .filter(ExtractionPatternColumn::FieldKind.eq(kind.as_str()))
            .filter(ExtractionPatternColumn::IsActive.eq(true))
            .order_by_asc(ExtractionPatternColumn::Priority)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Active patterns at or below the given priority value
    pub async fn high_priority_patterns(&self, threshold: i32) -> Result<Vec<ExtractionPattern>> {
        ExtractionPatternEntity::find()
            .filter(ExtractionPatternColumn::IsActive.eq(true))
            .filter(ExtractionPatternColumn::Priority.lte(threshold))
            .order_by_asc(ExtractionPatternColumn::Priority)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Question Paper Operations
    // ========================================================================

    /// Create a new, unprocessed question paper record
    pub async fn create_paper(&self, input: NewPaper) -> Result<QuestionPaper> {
        let now = chrono::Utc::now();
        let model = QuestionPaper {
            id: Uuid::new_v4(),
            grade_id: None,
            term_id: None,
            school_id: None,
            department_id: None,
            subject_id: None,
            uploaded_by: input.uploaded_by,
            file_path: input.file_path,
            complexity_rating: input.complexity_rating,
            question_count: 0,
            extracted_text: None,
            extraction_confidence: 0.0,
            detected_fields: DetectedFields::default(),
            is_processed: false,
            processing_error: None,
            created_at: now.into(),
            updated_at: now.into(),
        };
        model.validate()?;

        let paper = QuestionPaperActiveModel {
            id: Set(model.id),
            grade_id: Set(model.grade_id),
            term_id: Set(model.term_id),
            school_id: Set(model.school_id),
            department_id: Set(model.department_id),
            subject_id: Set(model.subject_id),
            uploaded_by: Set(model.uploaded_by),
            file_path: Set(model.file_path),
            complexity_rating: Set(model.complexity_rating),
            question_count: Set(model.question_count),
            extracted_text: Set(model.extracted_text),
            extraction_confidence: Set(model.extraction_confidence),
            detected_fields: Set(model.detected_fields),
            is_processed: Set(model.is_processed),
            processing_error: Set(model.processing_error),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        };

        paper.insert(self.conn()).await.map_err(Into::into)
    }

    /// Ids of papers the pipeline has not yet run for, oldest first
    pub async fn unprocessed_papers(&self) -> Result<Vec<Uuid>> {
        let papers = QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::IsProcessed.eq(false))
            .order_by_asc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await?;

        Ok(papers.into_iter().map(|p| p.id).collect())
    }

    /// Papers with extraction confidence at or above the threshold
    pub async fn high_confidence(&self, threshold: f64) -> Result<Vec<QuestionPaper>> {
        QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::ExtractionConfidence.gte(threshold))
            .order_by_desc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Processed papers whose confidence is below the review threshold
    pub async fn needs_review(&self, threshold: f64) -> Result<Vec<QuestionPaper>> {
        QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::IsProcessed.eq(true))
            .filter(QuestionPaperColumn::ExtractionConfidence.lt(threshold))
            .order_by_desc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Papers whose subject name contains the given fragment
    pub async fn papers_by_subject(&self, name: &str) -> Result<Vec<QuestionPaper>> {
        let subjects = self.references_matching(ReferenceKind::Subject, name).await?;
        let ids: Vec<Uuid> = subjects.into_iter().map(|r| r.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::SubjectId.is_in(ids))
            .order_by_desc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Papers matching both a grade-name and a term-name fragment
    pub async fn papers_by_grade_and_term(
        &self,
        grade_name: &str,
        term_name: &str,
    ) -> Result<Vec<QuestionPaper>> {
        let grades = self.references_matching(ReferenceKind::Grade, grade_name).await?;
        let terms = self.references_matching(ReferenceKind::Term, term_name).await?;

        let grade_ids: Vec<Uuid> = grades.into_iter().map(|r| r.id).collect();
        let term_ids: Vec<Uuid> = terms.into_iter().map(|r| r.id).collect();
        if grade_ids.is_empty() || term_ids.is_empty() {
            return Ok(Vec::new());
        }

        QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::GradeId.is_in(grade_ids))
            .filter(QuestionPaperColumn::TermId.is_in(term_ids))
            .order_by_desc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Papers uploaded by a specific user
    pub async fn papers_by_uploader(&self, user_id: Uuid) -> Result<Vec<QuestionPaper>> {
        QuestionPaperEntity::find()
            .filter(QuestionPaperColumn::UploadedBy.eq(user_id))
            .order_by_desc(QuestionPaperColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Reference Entity Helpers
    // ========================================================================

    /// All reference rows whose name contains the fragment, case-insensitive
    async fn references_matching(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Vec<ReferenceRecord>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "SELECT id, name FROM {} WHERE name ILIKE $1 ORDER BY name",
                kind.table()
            ),
            vec![format!("%{}%", escape_like(name)).into()],
        );

        let rows = self.conn().query_all(stmt).await?;
        rows.into_iter()
            .map(|row| {
                Ok(ReferenceRecord {
                    id: row.try_get("", "id")?,
                    name: row.try_get("", "name")?,
                })
            })
            .collect()
    }

    /// Conflict-safe upsert by unique name, returning the surviving row
    async fn upsert_by_name(&self, table: &str, name: &str) -> Result<ReferenceRecord> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "INSERT INTO {} (id, name) VALUES ($1, $2) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id, name",
                table
            ),
            vec![Uuid::new_v4().into(), name.into()],
        );

        let row = self
            .conn()
            .query_one(stmt)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("upsert into {} returned no row", table),
            })?;

        Ok(ReferenceRecord {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
        })
    }
}

#[async_trait]
impl Store for Repository {
    async fn active_patterns(&self) -> Result<Vec<ExtractionPattern>> {
        ExtractionPatternEntity::find()
            .filter(ExtractionPatternColumn::IsActive.eq(true))
            .order_by_asc(ExtractionPatternColumn::Priority)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_reference_containing(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceRecord>> {
        let matches = self.references_matching(kind, name).await?;
        Ok(matches.into_iter().next())
    }

    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceRecord> {
        self.upsert_by_name(kind.table(), name).await
    }

    async fn find_or_create_topic(&self, name: &str) -> Result<ReferenceRecord> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO topics (id, name, description) VALUES ($1, $2, '') \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
            vec![Uuid::new_v4().into(), name.into()],
        );

        let row = self
            .conn()
            .query_one(stmt)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: "topic upsert returned no row".to_string(),
            })?;

        Ok(ReferenceRecord {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
        })
    }

    async fn find_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>> {
        QuestionPaperEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn save_paper(&self, paper: &QuestionPaper) -> Result<()> {
        paper.validate()?;

        let active = QuestionPaperActiveModel {
            id: Set(paper.id),
            grade_id: Set(paper.grade_id),
            term_id: Set(paper.term_id),
            school_id: Set(paper.school_id),
            department_id: Set(paper.department_id),
            subject_id: Set(paper.subject_id),
            uploaded_by: Set(paper.uploaded_by),
            file_path: Set(paper.file_path.clone()),
            complexity_rating: Set(paper.complexity_rating),
            question_count: Set(paper.question_count),
            extracted_text: Set(paper.extracted_text.clone()),
            extraction_confidence: Set(paper.extraction_confidence),
            detected_fields: Set(paper.detected_fields.clone()),
            is_processed: Set(paper.is_processed),
            processing_error: Set(paper.processing_error.clone()),
            created_at: Set(paper.created_at),
            updated_at: Set(chrono::Utc::now().into()),
        };

        active.update(self.conn()).await?;
        Ok(())
    }

    async fn attach_topics(&self, paper_id: Uuid, topic_ids: &[Uuid]) -> Result<()> {
        if topic_ids.is_empty() {
            return Ok(());
        }

        let links: Vec<PaperTopicActiveModel> = topic_ids
            .iter()
            .map(|topic_id| PaperTopicActiveModel {
                paper_id: Set(paper_id),
                topic_id: Set(*topic_id),
            })
            .collect();

        PaperTopicEntity::insert_many(links)
            .on_conflict(
                OnConflict::columns([PaperTopicColumn::PaperId, PaperTopicColumn::TopicId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(())
    }

    async fn topic_names(&self, paper_id: Uuid) -> Result<Vec<String>> {
        let links = PaperTopicEntity::find()
            .filter(PaperTopicColumn::PaperId.eq(paper_id))
            .all(self.conn())
            .await?;

        let topic_ids: Vec<Uuid> = links.into_iter().map(|l| l.topic_id).collect();
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let topics = TopicEntity::find()
            .filter(TopicColumn::Id.is_in(topic_ids))
            .order_by_asc(TopicColumn::Name)
            .all(self.conn())
            .await?;

        Ok(topics.into_iter().map(|t| t.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_new_paper_defaults() {
        let input = NewPaper::new("2024/06/physics.pdf");
        assert_eq!(input.complexity_rating, 3);
        assert!(input.uploaded_by.is_none());
    }
}
