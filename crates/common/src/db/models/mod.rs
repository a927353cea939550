//! SeaORM entity models
//!
//! Database entities for QuestForge

mod department;
mod extraction_pattern;
mod grade;
mod paper_topic;
mod question_paper;
mod school;
mod subject;
mod term;
mod topic;

pub use question_paper::{
    Entity as QuestionPaperEntity,
    Model as QuestionPaper,
    ActiveModel as QuestionPaperActiveModel,
    Column as QuestionPaperColumn,
    DetectedFields,
    ProcessingStatus,
};

pub use extraction_pattern::{
    Entity as ExtractionPatternEntity,
    Model as ExtractionPattern,
    ActiveModel as ExtractionPatternActiveModel,
    Column as ExtractionPatternColumn,
    FieldKind,
};

pub use subject::{
    Entity as SubjectEntity,
    Model as Subject,
    ActiveModel as SubjectActiveModel,
    Column as SubjectColumn,
};

pub use grade::{
    Entity as GradeEntity,
    Model as Grade,
    ActiveModel as GradeActiveModel,
    Column as GradeColumn,
};

pub use term::{
    Entity as TermEntity,
    Model as Term,
    ActiveModel as TermActiveModel,
    Column as TermColumn,
};

pub use school::{
    Entity as SchoolEntity,
    Model as School,
    ActiveModel as SchoolActiveModel,
    Column as SchoolColumn,
};

pub use department::{
    Entity as DepartmentEntity,
    Model as Department,
    ActiveModel as DepartmentActiveModel,
    Column as DepartmentColumn,
};

pub use topic::{
    Entity as TopicEntity,
    Model as Topic,
    ActiveModel as TopicActiveModel,
    Column as TopicColumn,
};

pub use paper_topic::{
    Entity as PaperTopicEntity,
    Model as PaperTopic,
    ActiveModel as PaperTopicActiveModel,
    Column as PaperTopicColumn,
};
