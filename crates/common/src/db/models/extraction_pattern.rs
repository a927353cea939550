//! Extraction pattern entity
//!
//! Administrator-editable regex patterns driving field extraction.
//! Patterns are data, not code: they are validated for compilability
//! at write time and soft-disabled via `is_active`, never hard-deleted
//! while processing may still read them.

use crate::errors::AppError;
use regex_lite::{Regex, RegexBuilder};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The field categories a pattern can extract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Topic,
    QuestionCount,
    Subject,
    Grade,
    Complexity,
    Term,
    School,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Topic,
        FieldKind::QuestionCount,
        FieldKind::Subject,
        FieldKind::Grade,
        FieldKind::Complexity,
        FieldKind::Term,
        FieldKind::School,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Topic => "topic",
            FieldKind::QuestionCount => "question_count",
            FieldKind::Subject => "subject",
            FieldKind::Grade => "grade",
            FieldKind::Complexity => "complexity",
            FieldKind::Term => "term",
            FieldKind::School => "school",
        }
    }

    /// Parse the stored text form; unknown values yield None
    pub fn parse(s: &str) -> Option<FieldKind> {
        match s {
            "topic" => Some(FieldKind::Topic),
            "question_count" => Some(FieldKind::QuestionCount),
            "subject" => Some(FieldKind::Subject),
            "grade" => Some(FieldKind::Grade),
            "complexity" => Some(FieldKind::Complexity),
            "term" => Some(FieldKind::Term),
            "school" => Some(FieldKind::School),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extraction_patterns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// Stored text form of [`FieldKind`]
    #[sea_orm(column_type = "Text")]
    pub field_kind: String,

    /// Regex source applied to extracted paper text
    #[sea_orm(column_type = "Text")]
    pub pattern: String,

    /// Lower numbers are considered first and win conflicts
    pub priority: i32,

    pub is_active: bool,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the field kind as an enum
    pub fn kind(&self) -> Option<FieldKind> {
        FieldKind::parse(&self.field_kind)
    }

    /// Compile the pattern with the flags the engine matches under
    pub fn compile(&self) -> Result<Regex, regex_lite::Error> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
    }

    /// Validate that the pattern compiles
    pub fn validate(&self) -> Result<(), AppError> {
        self.compile()
            .map(|_| ())
            .map_err(|e| AppError::InvalidPattern {
                name: self.name.clone(),
                message: e.to_string(),
            })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            field_kind: "subject".to_string(),
            pattern: source.to_string(),
            priority: 1,
            is_active: true,
            description: String::new(),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_field_kind_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FieldKind::parse("bogus"), None);
    }

    #[test]
    fn test_valid_pattern_compiles() {
        let p = pattern(r"subject\s*:\s*([^\n]+)");
        assert!(p.validate().is_ok());
        assert_eq!(p.kind(), Some(FieldKind::Subject));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let p = pattern(r"subject\s*:\s*([unclosed");
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("test"));
    }
}
