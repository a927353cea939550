//! Shared test fixtures: an in-memory `Store` and generated PDFs

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use questforge_common::db::models::{
    DetectedFields, ExtractionPattern, FieldKind, QuestionPaper,
};
use questforge_common::db::{ReferenceKind, ReferenceRecord, Store};
use questforge_common::errors::{AppError, Result};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

pub fn make_pattern(name: &str, kind: FieldKind, source: &str, priority: i32) -> ExtractionPattern {
    ExtractionPattern {
        id: Uuid::new_v4(),
        name: name.to_string(),
        field_kind: kind.as_str().to_string(),
        pattern: source.to_string(),
        priority,
        is_active: true,
        description: String::new(),
        created_at: chrono::Utc::now().into(),
    }
}

pub fn make_paper(file_path: &str) -> QuestionPaper {
    let now = chrono::Utc::now();
    QuestionPaper {
        id: Uuid::new_v4(),
        grade_id: None,
        term_id: None,
        school_id: None,
        department_id: None,
        subject_id: None,
        uploaded_by: None,
        file_path: file_path.to_string(),
        complexity_rating: 3,
        question_count: 0,
        extracted_text: None,
        extraction_confidence: 0.0,
        detected_fields: DetectedFields::default(),
        is_processed: false,
        processing_error: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[derive(Default)]
struct Inner {
    patterns: Vec<ExtractionPattern>,
    references: HashMap<&'static str, Vec<ReferenceRecord>>,
    topics: Vec<ReferenceRecord>,
    papers: HashMap<Uuid, QuestionPaper>,
    paper_topics: Vec<(Uuid, Uuid)>,
    failing_kinds: HashSet<ReferenceKind>,
}

/// In-memory `Store` with the same observable semantics as the
/// Postgres-backed repository.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&self, name: &str, kind: FieldKind, source: &str, priority: i32) {
        self.inner
            .lock()
            .unwrap()
            .patterns
            .push(make_pattern(name, kind, source, priority));
    }

    pub fn insert_paper(&self, file_path: &str) -> QuestionPaper {
        let paper = make_paper(file_path);
        self.inner
            .lock()
            .unwrap()
            .papers
            .insert(paper.id, paper.clone());
        paper
    }

    pub fn paper(&self, id: Uuid) -> Option<QuestionPaper> {
        self.inner.lock().unwrap().papers.get(&id).cloned()
    }

    pub fn topic_count(&self) -> usize {
        self.inner.lock().unwrap().topics.len()
    }

    pub fn attached_topics(&self, paper_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .paper_topics
            .iter()
            .filter(|(p, _)| *p == paper_id)
            .count()
    }

    pub fn reference_names(&self, kind: ReferenceKind) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .references
            .get(kind.table())
            .map(|rows| rows.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Make every lookup/create for a reference kind fail
    pub fn fail_reference_kind(&self, kind: ReferenceKind) {
        self.inner.lock().unwrap().failing_kinds.insert(kind);
    }

    fn check_failure(&self, kind: ReferenceKind) -> Result<()> {
        if self.inner.lock().unwrap().failing_kinds.contains(&kind) {
            return Err(AppError::Internal {
                message: format!("injected failure for {}", kind.as_str()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn active_patterns(&self) -> Result<Vec<ExtractionPattern>> {
        let mut patterns: Vec<ExtractionPattern> = self
            .inner
            .lock()
            .unwrap()
            .patterns
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        patterns.sort_by_key(|p| p.priority);
        Ok(patterns)
    }

    async fn find_reference_containing(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<ReferenceRecord>> {
        self.check_failure(kind)?;

        let needle = name.to_lowercase();
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<&ReferenceRecord> = inner
            .references
            .get(kind.table())
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.name.to_lowercase().contains(&needle))
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(matches.first().map(|r| (*r).clone()))
    }

    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceRecord> {
        self.check_failure(kind)?;

        let mut inner = self.inner.lock().unwrap();
        let rows = inner.references.entry(kind.table()).or_default();
        if let Some(existing) = rows.iter().find(|r| r.name == name) {
            return Ok(existing.clone());
        }

        let record = ReferenceRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_or_create_topic(&self, name: &str) -> Result<ReferenceRecord> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.topics.iter().find(|t| t.name == name) {
            return Ok(existing.clone());
        }

        let record = ReferenceRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        inner.topics.push(record.clone());
        Ok(record)
    }

    async fn find_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>> {
        Ok(self.inner.lock().unwrap().papers.get(&id).cloned())
    }

    async fn save_paper(&self, paper: &QuestionPaper) -> Result<()> {
        paper.validate()?;
        self.inner
            .lock()
            .unwrap()
            .papers
            .insert(paper.id, paper.clone());
        Ok(())
    }

    async fn attach_topics(&self, paper_id: Uuid, topic_ids: &[Uuid]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for topic_id in topic_ids {
            let link = (paper_id, *topic_id);
            if !inner.paper_topics.contains(&link) {
                inner.paper_topics.push(link);
            }
        }
        Ok(())
    }

    async fn topic_names(&self, paper_id: Uuid) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let mut names: Vec<String> = inner
            .paper_topics
            .iter()
            .filter(|(p, _)| *p == paper_id)
            .filter_map(|(_, t)| inner.topics.iter().find(|topic| topic.id == *t))
            .map(|topic| topic.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Build a PDF with one page of Courier text per entry
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode test page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test PDF");
    buf
}

/// Build a structurally valid PDF whose page tree is empty
pub fn empty_pdf_bytes() -> Vec<u8> {
    pdf_bytes(&[])
}

/// Write PDF bytes to a unique temp path, returning the path
pub fn write_temp_pdf(bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("questforge-{}.pdf", Uuid::new_v4()));
    std::fs::write(&path, bytes).expect("write temp pdf");
    path
}
