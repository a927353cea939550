//! Question paper entity
//!
//! The central mutable record of the extraction pipeline. A paper is
//! created on upload with `is_processed = false`; the pipeline fills in
//! extracted text, detected fields, confidence and topic links, and
//! always leaves the record in a terminal processed state (with or
//! without `processing_error`).

use super::extraction_pattern::FieldKind;
use crate::errors::AppError;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Auto-detected field values, one optional slot per field kind.
///
/// Values are kept as the cleaned matched strings; typed columns such as
/// `question_count` are parsed out of this record by the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct DetectedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
}

impl DetectedFields {
    fn slot(&self, kind: FieldKind) -> &Option<String> {
        match kind {
            FieldKind::Topic => &self.topic,
            FieldKind::QuestionCount => &self.question_count,
            FieldKind::Subject => &self.subject,
            FieldKind::Grade => &self.grade,
            FieldKind::Complexity => &self.complexity,
            FieldKind::Term => &self.term,
            FieldKind::School => &self.school,
        }
    }

    fn slot_mut(&mut self, kind: FieldKind) -> &mut Option<String> {
        match kind {
            FieldKind::Topic => &mut self.topic,
            FieldKind::QuestionCount => &mut self.question_count,
            FieldKind::Subject => &mut self.subject,
            FieldKind::Grade => &mut self.grade,
            FieldKind::Complexity => &mut self.complexity,
            FieldKind::Term => &mut self.term,
            FieldKind::School => &mut self.school,
        }
    }

    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn set(&mut self, kind: FieldKind, value: String) {
        *self.slot_mut(kind) = Some(value);
    }

    pub fn contains(&self, kind: FieldKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        FieldKind::ALL.iter().filter(|k| self.contains(**k)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Human-readable processing state of a paper
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingStatus {
    Pending,
    /// Carries the first 50 characters of the stored error
    Error(String),
    HighConfidence,
    MediumConfidence,
    LowConfidence,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStatus::Pending => f.write_str("Pending"),
            ProcessingStatus::Error(msg) => write!(f, "Error: {}...", msg),
            ProcessingStatus::HighConfidence => f.write_str("High confidence"),
            ProcessingStatus::MediumConfidence => f.write_str("Medium confidence"),
            ProcessingStatus::LowConfidence => f.write_str("Low confidence - needs review"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question_papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub grade_id: Option<Uuid>,

    pub term_id: Option<Uuid>,

    pub school_id: Option<Uuid>,

    pub department_id: Option<Uuid>,

    pub subject_id: Option<Uuid>,

    /// Uploader account id; accounts live outside this schema
    pub uploaded_by: Option<Uuid>,

    #[sea_orm(column_type = "Text")]
    pub file_path: String,

    /// 1 (easiest) to 5 (hardest)
    pub complexity_rating: i32,

    pub question_count: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub extracted_text: Option<String>,

    /// Ratio of configured patterns that produced a value, in [0, 1]
    pub extraction_confidence: f64,

    #[sea_orm(column_type = "JsonBinary")]
    pub detected_fields: DetectedFields,

    pub is_processed: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub processing_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// File name component of the stored path
    pub fn file_name(&self) -> String {
        std::path::Path::new(&self.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.clone())
    }

    /// Validate the invariants enforced on every write
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.file_path.to_lowercase().ends_with(".pdf") {
            return Err(AppError::validation(
                "file_path",
                "Only PDF files are allowed",
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction_confidence) {
            return Err(AppError::validation(
                "extraction_confidence",
                "Confidence score must be between 0 and 1",
            ));
        }
        if !(1..=5).contains(&self.complexity_rating) {
            return Err(AppError::validation(
                "complexity_rating",
                "Complexity rating must be between 1 and 5",
            ));
        }
        Ok(())
    }

    /// Safely get an auto-detected field value
    pub fn extracted_field(&self, kind: FieldKind) -> Option<&str> {
        self.detected_fields.get(kind)
    }

    /// Get the human-readable processing status
    pub fn processing_status(&self) -> ProcessingStatus {
        if !self.is_processed {
            return ProcessingStatus::Pending;
        }
        if let Some(err) = self.processing_error.as_deref().filter(|e| !e.is_empty()) {
            return ProcessingStatus::Error(err.chars().take(50).collect());
        }
        if self.extraction_confidence > 0.7 {
            ProcessingStatus::HighConfidence
        } else if self.extraction_confidence > 0.4 {
            ProcessingStatus::MediumConfidence
        } else {
            ProcessingStatus::LowConfidence
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grade::Entity",
        from = "Column::GradeId",
        to = "super::grade::Column::Id"
    )]
    Grade,

    #[sea_orm(
        belongs_to = "super::term::Entity",
        from = "Column::TermId",
        to = "super::term::Column::Id"
    )]
    Term,

    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,

    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,

    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,

    #[sea_orm(has_many = "super::paper_topic::Entity")]
    PaperTopics,
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grade.def()
    }
}

impl Related<super::term::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Term.def()
    }
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::paper_topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaperTopics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper() -> Model {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            grade_id: None,
            term_id: None,
            school_id: None,
            department_id: None,
            subject_id: None,
            uploaded_by: None,
            file_path: "2024/06/physics-final.pdf".to_string(),
            complexity_rating: 3,
            question_count: 0,
            extracted_text: None,
            extraction_confidence: 0.0,
            detected_fields: DetectedFields::default(),
            is_processed: false,
            processing_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_rejects_non_pdf() {
        let mut p = paper();
        p.file_path = "paper.docx".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_confidence_bounds() {
        let mut p = paper();
        p.extraction_confidence = 1.2;
        assert!(p.validate().is_err());
        p.extraction_confidence = 1.0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_detected_fields_slots() {
        let mut fields = DetectedFields::default();
        assert!(fields.is_empty());

        fields.set(FieldKind::Subject, "Physics".to_string());
        fields.set(FieldKind::Grade, "10".to_string());

        assert_eq!(fields.get(FieldKind::Subject), Some("Physics"));
        assert!(fields.contains(FieldKind::Grade));
        assert!(!fields.contains(FieldKind::Term));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_detected_fields_json_shape() {
        let mut fields = DetectedFields::default();
        fields.set(FieldKind::QuestionCount, "12".to_string());

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({"question_count": "12"}));

        let back: DetectedFields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_status_pending_until_processed() {
        let p = paper();
        assert_eq!(p.processing_status().to_string(), "Pending");
    }

    #[test]
    fn test_status_error_truncates() {
        let mut p = paper();
        p.is_processed = true;
        p.processing_error = Some("x".repeat(80));
        let status = p.processing_status().to_string();
        assert!(status.starts_with("Error: "));
        assert!(status.ends_with("..."));
        assert!(status.len() < 80);
    }

    #[test]
    fn test_status_confidence_tiers() {
        let mut p = paper();
        p.is_processed = true;

        p.extraction_confidence = 0.9;
        assert_eq!(p.processing_status().to_string(), "High confidence");

        p.extraction_confidence = 0.5;
        assert_eq!(p.processing_status().to_string(), "Medium confidence");

        p.extraction_confidence = 0.2;
        assert_eq!(
            p.processing_status().to_string(),
            "Low confidence - needs review"
        );
    }
}
