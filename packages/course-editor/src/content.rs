//! # Course Content Model
//!
//! Nested view of a course's content: modules → lessons → quiz → questions
//! → answers. This is the shape the surrounding application seeds the
//! editor with and the shape [`crate::ContentTree::tree`] hands back.
//!
//! Alongside the entities live two families of input types:
//! - `*Draft`: payload for a new entity, without ids (ids are minted locally)
//! - `*Patch`: partial edit, only the `Some` fields are applied

use crate::ids::{EntityId, LocalIdGenerator};
use serde::{Deserialize, Serialize};

/// Whole content tree of one course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContent {
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: EntityId,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Content kind of a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Markdown,
    Video,
    Quiz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: EntityId,
    pub title: String,
    /// `None` until the author picks a kind
    #[serde(default)]
    pub lesson_type: Option<LessonType>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_url: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: u32,
    pub order: u32,
    /// Previewable without enrollment
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

/// Quiz attached to a lesson; identified by its owning lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub title: String,
    pub passing_score: u32,
    /// Sum of question marks, recomputed by the store
    #[serde(default)]
    pub total_marks: u32,
    #[serde(default)]
    pub quiz_questions: Vec<Question>,
}

impl Quiz {
    /// Empty quiz synthesized when a lesson switches to the quiz kind
    pub fn empty(title: impl Into<String>, passing_score: u32) -> Self {
        Self {
            title: title.into(),
            passing_score,
            total_marks: 0,
            quiz_questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: EntityId,
    pub question_text: String,
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: EntityId,
    pub answer_text: String,
    pub is_correct: bool,
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDraft {
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
}

impl ModuleDraft {
    pub fn new(title: impl Into<String>, order: u32) -> Self {
        Self {
            title: title.into(),
            order,
            lessons: Vec::new(),
        }
    }

    /// Mint ids for the module and everything nested in it
    pub fn into_module(self, ids: &mut LocalIdGenerator) -> Module {
        Module {
            id: ids.next_id(),
            title: self.title,
            order: self.order,
            lessons: self
                .lessons
                .into_iter()
                .map(|lesson| lesson.into_lesson(ids))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub title: String,
    #[serde(default)]
    pub lesson_type: Option<LessonType>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub quiz: Option<QuizDraft>,
}

impl LessonDraft {
    pub fn new(title: impl Into<String>, lesson_type: LessonType) -> Self {
        Self {
            title: title.into(),
            lesson_type: Some(lesson_type),
            ..Default::default()
        }
    }

    pub fn into_lesson(self, ids: &mut LocalIdGenerator) -> Lesson {
        let id = ids.next_id();
        Lesson {
            id,
            title: self.title,
            lesson_type: self.lesson_type,
            content: self.content,
            content_url: self.content_url,
            duration: self.duration,
            order: self.order,
            is_preview: self.is_preview,
            quiz: self.quiz.map(|quiz| quiz.into_quiz(ids)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    pub passing_score: u32,
    #[serde(default)]
    pub quiz_questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    pub fn into_quiz(self, ids: &mut LocalIdGenerator) -> Quiz {
        let quiz_questions: Vec<Question> = self
            .quiz_questions
            .into_iter()
            .map(|question| question.into_question(ids))
            .collect();

        Quiz {
            title: self.title,
            passing_score: self.passing_score,
            total_marks: quiz_questions.iter().map(|q| q.marks).sum(),
            quiz_questions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question_text: String,
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(default)]
    pub answers: Vec<AnswerDraft>,
}

impl QuestionDraft {
    pub fn new(question_text: impl Into<String>, question_type: QuestionType, marks: u32) -> Self {
        Self {
            question_text: question_text.into(),
            question_type,
            marks,
            answers: Vec::new(),
        }
    }

    pub fn into_question(self, ids: &mut LocalIdGenerator) -> Question {
        let id = ids.next_id();
        Question {
            id,
            question_text: self.question_text,
            question_type: self.question_type,
            marks: self.marks,
            answers: self
                .answers
                .into_iter()
                .map(|answer| answer.into_answer(ids))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDraft {
    pub answer_text: String,
    pub is_correct: bool,
}

impl AnswerDraft {
    pub fn new(answer_text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            answer_text: answer_text.into(),
            is_correct,
        }
    }

    pub fn into_answer(self, ids: &mut LocalIdGenerator) -> Answer {
        Answer {
            id: ids.next_id(),
            answer_text: self.answer_text,
            is_correct: self.is_correct,
        }
    }
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// Fields to change on a lesson; `None` leaves a field as it is.
///
/// A patch can only set values. Clearing `content_url` or unsetting
/// `lesson_type` is not expressible and needs a fresh lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<LessonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_preview: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}
